use std::collections::BTreeSet;
use std::fmt;

use super::schema::{DataWarning, DatasetSchema, Direction, TimeColumn};

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as decoded by a loader
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.0}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Cell from delimited text. Kept as text so keys such as station codes
    /// keep their leading zeros; counts are parsed on demand.
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            CellValue::Null
        } else {
            CellValue::String(s.to_string())
        }
    }

    /// Text form used for month / line / station keys. `Null` has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Interpret the cell as a head count.
    ///
    /// Missing cells count as zero. `None` means the cell holds something that
    /// is not a non-negative whole number.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            CellValue::Null => Some(0),
            CellValue::Integer(i) => u64::try_from(*i).ok(),
            CellValue::Float(v) => float_to_count(*v),
            CellValue::String(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                if cleaned.is_empty() {
                    return Some(0);
                }
                match cleaned.parse::<u64>() {
                    Ok(n) => Some(n),
                    Err(_) => cleaned.parse::<f64>().ok().and_then(float_to_count),
                }
            }
            CellValue::Bool(_) => None,
        }
    }
}

fn float_to_count(v: f64) -> Option<u64> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// RidershipRecord – one row of the table
// ---------------------------------------------------------------------------

/// One month × line × station row with its hourly counts.
///
/// `ride` and `alight` are indexed by slot position in the dataset's
/// [`SlotSchema`](super::schema::SlotSchema); every record has exactly one
/// entry per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RidershipRecord {
    pub month: Option<String>,
    pub line: Option<String>,
    pub station: Option<String>,
    pub work_date: Option<String>,
    pub ride: Vec<u64>,
    pub alight: Vec<u64>,
}

impl RidershipRecord {
    pub fn count(&self, column: TimeColumn) -> u64 {
        let counts = match column.direction {
            Direction::Ride => &self.ride,
            Direction::Alight => &self.alight,
        };
        counts.get(column.slot).copied().unwrap_or(0)
    }

    /// Sum over the given columns, saturating at `u64::MAX`.
    pub fn total<'a, I>(&self, columns: I) -> u64
    where
        I: IntoIterator<Item = &'a TimeColumn>,
    {
        columns
            .into_iter()
            .fold(0, |acc: u64, c| acc.saturating_add(self.count(*c)))
    }
}

// ---------------------------------------------------------------------------
// RidershipDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset. Read-only once built.
#[derive(Debug, Clone)]
pub struct RidershipDataset {
    pub records: Vec<RidershipRecord>,
    /// Header exactly as found in the source.
    pub headers: Vec<String>,
    pub schema: DatasetSchema,
    /// Problems found while describing the header.
    pub warnings: Vec<DataWarning>,
    pub months: BTreeSet<String>,
    pub lines: BTreeSet<String>,
    pub stations: BTreeSet<String>,
    /// Count cells that were not whole non-negative numbers (read as 0).
    pub invalid_cells: usize,
}

impl RidershipDataset {
    /// Build the dataset from a decoded table: describe the header once, then
    /// project every row onto the typed record.
    pub fn from_table(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let (schema, warnings) = DatasetSchema::describe(&headers);

        let mut months = BTreeSet::new();
        let mut lines = BTreeSet::new();
        let mut stations = BTreeSet::new();
        let mut invalid_cells = 0usize;

        let records: Vec<RidershipRecord> = rows
            .iter()
            .map(|row| {
                let text = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(CellValue::as_text);
                let mut count = |idx: Option<usize>| match idx.and_then(|i| row.get(i)) {
                    None => 0,
                    Some(cell) => cell.as_count().unwrap_or_else(|| {
                        invalid_cells += 1;
                        0
                    }),
                };

                let mut ride = Vec::with_capacity(schema.slots.len());
                let mut alight = Vec::with_capacity(schema.slots.len());
                for slot in schema.slots.slots() {
                    ride.push(count(slot.ride));
                    alight.push(count(slot.alight));
                }

                RidershipRecord {
                    month: text(schema.month),
                    line: text(schema.line),
                    station: text(schema.station),
                    work_date: text(schema.work_date),
                    ride,
                    alight,
                }
            })
            .collect();

        for rec in &records {
            if let Some(m) = &rec.month {
                months.insert(m.clone());
            }
            if let Some(l) = &rec.line {
                lines.insert(l.clone());
            }
            if let Some(s) = &rec.station {
                stations.insert(s.clone());
            }
        }

        RidershipDataset {
            records,
            headers,
            schema,
            warnings,
            months,
            lines,
            stations,
            invalid_cells,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Month choices in ascending order.
    pub fn month_options(&self) -> Vec<String> {
        self.months.iter().cloned().collect()
    }

    pub fn line_options(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[test]
    fn count_parsing_rules() {
        assert_eq!(CellValue::Null.as_count(), Some(0));
        assert_eq!(CellValue::Integer(12).as_count(), Some(12));
        assert_eq!(CellValue::Integer(-1).as_count(), None);
        assert_eq!(CellValue::Float(3.0).as_count(), Some(3));
        assert_eq!(CellValue::Float(3.5).as_count(), None);
        assert_eq!(text("1,234").as_count(), Some(1234));
        assert_eq!(text("  ").as_count(), Some(0));
        assert_eq!(text("n/a").as_count(), None);
    }

    #[test]
    fn integral_month_renders_plainly() {
        assert_eq!(CellValue::Integer(202401).as_text().as_deref(), Some("202401"));
        assert_eq!(CellValue::Float(202401.0).as_text().as_deref(), Some("202401"));
        assert_eq!(CellValue::Null.as_text(), None);
        assert_eq!(CellValue::from_text(" 0150 ").as_text().as_deref(), Some("0150"));
        assert_eq!(CellValue::from_text(""), CellValue::Null);
    }

    #[test]
    fn from_table_projects_rows_onto_slots() {
        let headers: Vec<String> = [
            "사용월",
            "호선명",
            "지하철역",
            "08시-09시 승차인원",
            "07시-08시 승차인원",
            "07시-08시 하차인원",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let rows = vec![
            vec![
                CellValue::Integer(202401),
                text("2호선"),
                text("강남"),
                CellValue::Integer(7),
                CellValue::Integer(10),
                text("oops"),
            ],
            vec![
                CellValue::Integer(202402),
                text("1호선"),
                text("서울역"),
                CellValue::Null,
                CellValue::Integer(4),
                CellValue::Integer(5),
            ],
        ];

        let ds = RidershipDataset::from_table(headers, rows);
        assert_eq!(ds.len(), 2);
        assert!(ds.warnings.is_empty());
        assert_eq!(ds.invalid_cells, 1);

        // slots are ordered 07-08, 08-09 regardless of header order
        assert_eq!(ds.records[0].ride, vec![10, 7]);
        // 08-09 has no alight column at all
        assert_eq!(ds.records[0].alight, vec![0, 0]);
        assert_eq!(ds.records[1].alight, vec![5, 0]);

        assert_eq!(ds.month_options(), vec!["202401", "202402"]);
        assert_eq!(ds.line_options(), vec!["1호선", "2호선"]);
        assert!(ds.stations.contains("강남"));
    }
}
