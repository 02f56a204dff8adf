use std::collections::BTreeSet;
use std::ops::{Range, RangeInclusive};

use super::model::{RidershipDataset, RidershipRecord};
use super::schema::{
    DataWarning, Direction, LINE_COLUMN, MONTH_COLUMN, STATION_COLUMN, SlotSchema, TimeColumn,
};

/// Allowed ranking sizes.
pub const TOP_N_RANGE: RangeInclusive<usize> = 5..=30;
pub const DEFAULT_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Selection value types
// ---------------------------------------------------------------------------

/// Which counts feed the figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Ride,
    Alight,
    /// Ride and alight, kept as two separate column groups.
    Total,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Ride, Metric::Alight, Metric::Total];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Ride => "승차",
            Metric::Alight => "하차",
            Metric::Total => "합계",
        }
    }

    pub fn directions(self) -> &'static [Direction] {
        match self {
            Metric::Ride => &[Direction::Ride],
            Metric::Alight => &[Direction::Alight],
            Metric::Total => &[Direction::Ride, Direction::Alight],
        }
    }
}

/// How the station × slot aggregate is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Heatmap,
    Table,
}

impl ViewMode {
    pub const ALL: [ViewMode; 2] = [ViewMode::Heatmap, ViewMode::Table];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Heatmap => "히트맵",
            ViewMode::Table => "테이블",
        }
    }
}

/// Inclusive range of slot positions, always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    start: usize,
    end: usize,
}

impl SlotRange {
    pub fn new(a: usize, b: usize) -> Self {
        SlotRange {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Every slot of a schema with `len` slots. `None` when there are none.
    pub fn full(len: usize) -> Option<Self> {
        len.checked_sub(1).map(|last| SlotRange::new(0, last))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Contiguous positions covered, clipped to a schema of `len` slots.
    pub fn positions(&self, len: usize) -> Range<usize> {
        self.start.min(len)..self.end.saturating_add(1).min(len)
    }
}

// ---------------------------------------------------------------------------
// FilterSelection
// ---------------------------------------------------------------------------

/// Everything the user picked. Replaced wholesale on every interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub month: Option<String>,
    /// Empty means every line.
    pub lines: BTreeSet<String>,
    /// Empty means every station.
    pub stations: BTreeSet<String>,
    pub metric: Metric,
    /// `None` means the full slot range.
    pub slot_range: Option<SlotRange>,
    pub top_n: usize,
    pub view_mode: ViewMode,
}

impl Default for FilterSelection {
    fn default() -> Self {
        FilterSelection {
            month: None,
            lines: BTreeSet::new(),
            stations: BTreeSet::new(),
            metric: Metric::default(),
            slot_range: None,
            top_n: DEFAULT_TOP_N,
            view_mode: ViewMode::default(),
        }
    }
}

impl FilterSelection {
    /// Starting point after a load: latest month, first line, every station,
    /// full slot range.
    pub fn initial(dataset: &RidershipDataset, top_n: usize) -> Self {
        FilterSelection {
            month: dataset.months.iter().next_back().cloned(),
            lines: dataset.lines.iter().next().cloned().into_iter().collect(),
            stations: BTreeSet::new(),
            slot_range: SlotRange::full(dataset.schema.slots.len()),
            top_n: clamp_top_n(top_n),
            ..FilterSelection::default()
        }
    }

    pub fn set_top_n(&mut self, n: usize) {
        self.top_n = clamp_top_n(n);
    }

    /// Drop selected stations that are no longer offered.
    pub fn prune_stations(&mut self, options: &BTreeSet<String>) {
        self.stations.retain(|s| options.contains(s));
    }
}

pub fn clamp_top_n(n: usize) -> usize {
    n.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end())
}

// ---------------------------------------------------------------------------
// Station options (line → station cascade)
// ---------------------------------------------------------------------------

/// Stations offered for the current line selection. An empty line selection
/// (or a table without a line column) offers every station.
pub fn resolve_station_options(
    dataset: &RidershipDataset,
    selected_lines: &BTreeSet<String>,
) -> BTreeSet<String> {
    if selected_lines.is_empty() || dataset.schema.line.is_none() {
        return dataset.stations.clone();
    }
    dataset
        .records
        .iter()
        .filter(|r| r.line.as_ref().is_some_and(|l| selected_lines.contains(l)))
        .filter_map(|r| r.station.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Rows of a dataset that passed the current selection.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a RidershipDataset,
    indices: Vec<usize>,
    /// Filters that had to be skipped because their column is missing.
    pub warnings: Vec<DataWarning>,
}

impl<'a> FilteredView<'a> {
    #[cfg(test)]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a RidershipRecord> + '_ {
        let records = &self.dataset.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Apply the conjunctive month / line / station filters.
///
/// * `month` set → equality
/// * `lines` non-empty → membership; empty → no restriction
/// * `stations` non-empty → membership; empty → no restriction
///
/// A filter whose column is absent from the table is skipped with a warning.
pub fn apply<'a>(dataset: &'a RidershipDataset, selection: &FilterSelection) -> FilteredView<'a> {
    let schema = &dataset.schema;
    let mut warnings = Vec::new();

    let mut active = |wanted: bool, present: bool, column: &'static str| {
        if wanted && !present {
            log::warn!("filter on '{column}' skipped: column missing");
            warnings.push(DataWarning::MissingColumn(column));
        }
        wanted && present
    };
    let by_month = active(selection.month.is_some(), schema.month.is_some(), MONTH_COLUMN);
    let by_line = active(!selection.lines.is_empty(), schema.line.is_some(), LINE_COLUMN);
    let by_station = active(
        !selection.stations.is_empty(),
        schema.station.is_some(),
        STATION_COLUMN,
    );

    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if by_month && rec.month.as_deref() != selection.month.as_deref() {
                return false;
            }
            if by_line && !rec.line.as_ref().is_some_and(|l| selection.lines.contains(l)) {
                return false;
            }
            if by_station
                && !rec
                    .station
                    .as_ref()
                    .is_some_and(|s| selection.stations.contains(s))
            {
                return false;
            }
            true
        })
        .map(|(i, _)| i)
        .collect();

    FilteredView {
        dataset,
        indices,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Time columns
// ---------------------------------------------------------------------------

/// Count columns selected by slot range and metric, as two separate groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub ride: Vec<TimeColumn>,
    pub alight: Vec<TimeColumn>,
}

impl ResolvedColumns {
    /// Ride columns followed by alight columns.
    pub fn iter(&self) -> impl Iterator<Item = &TimeColumn> {
        self.ride.iter().chain(self.alight.iter())
    }

    pub fn len(&self) -> usize {
        self.ride.len() + self.alight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ride.is_empty() && self.alight.is_empty()
    }

    /// Source header of every column, in [`iter`](Self::iter) order.
    pub fn headers(&self, schema: &SlotSchema) -> Vec<String> {
        self.iter().filter_map(|c| schema.header(*c)).collect()
    }
}

/// Expand the inclusive slot range into its contiguous slots and map them to
/// ride columns, alight columns or both. Slots lacking a column in the source
/// are left out.
pub fn resolve_time_columns(
    schema: &SlotSchema,
    slot_range: Option<SlotRange>,
    metric: Metric,
) -> ResolvedColumns {
    let Some(range) = slot_range.or_else(|| SlotRange::full(schema.len())) else {
        return ResolvedColumns::default();
    };

    let mut resolved = ResolvedColumns::default();
    for &direction in metric.directions() {
        let group = match direction {
            Direction::Ride => &mut resolved.ride,
            Direction::Alight => &mut resolved.alight,
        };
        group.extend(
            range
                .positions(schema.len())
                .map(|slot| TimeColumn { slot, direction })
                .filter(|c| schema.has_column(*c)),
        );
    }
    resolved
}
