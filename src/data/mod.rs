/// Data layer: loading, schema description, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv (cp949) / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode file → headers + cells
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ schema / model    │  describe header once → RidershipDataset
///   └──────────────────┘
///        │   (per interaction)
///        ▼
///   ┌──────────┐     ┌────────────┐     ┌──────────┐
///   │  filter   │ ──▶ │ aggregate   │ ──▶ │ summary   │ ──▶ ui
///   └──────────┘     └────────────┘     └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod summary;
