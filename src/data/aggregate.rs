use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::filter::{FilteredView, Metric, ResolvedColumns};
use super::model::{RidershipDataset, RidershipRecord};
use super::schema::{LINE_COLUMN, STATION_COLUMN, TimeColumn};

// ---------------------------------------------------------------------------
// Ride / alight split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionTotals {
    pub ride: u64,
    pub alight: u64,
}

impl DirectionTotals {
    /// The headline figure for a metric.
    pub fn headline(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Ride => self.ride,
            Metric::Alight => self.alight,
            Metric::Total => self.ride.saturating_add(self.alight),
        }
    }
}

/// Sum of every resolved ride column and every resolved alight column.
pub fn totals_by_direction(view: &FilteredView<'_>, columns: &ResolvedColumns) -> DirectionTotals {
    view.iter().fold(DirectionTotals::default(), |acc, rec| DirectionTotals {
        ride: acc.ride.saturating_add(rec.total(&columns.ride)),
        alight: acc.alight.saturating_add(rec.total(&columns.alight)),
    })
}

// ---------------------------------------------------------------------------
// Group rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Station,
    Line,
}

impl GroupKey {
    pub fn column(self) -> &'static str {
        match self {
            GroupKey::Station => STATION_COLUMN,
            GroupKey::Line => LINE_COLUMN,
        }
    }

    fn value(self, record: &RidershipRecord) -> Option<&str> {
        match self {
            GroupKey::Station => record.station.as_deref(),
            GroupKey::Line => record.line.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTotal {
    pub key: String,
    pub total: u64,
}

/// Descending by total, ties by ascending key.
fn ranking_order(a_total: u64, a_key: &str, b_total: u64, b_key: &str) -> Ordering {
    b_total.cmp(&a_total).then_with(|| a_key.cmp(b_key))
}

/// Per-row sum over the resolved columns, grouped and summed again.
/// Rows without a value for the key are skipped.
pub fn totals_by_group(
    view: &FilteredView<'_>,
    columns: &ResolvedColumns,
    key: GroupKey,
) -> Vec<GroupTotal> {
    let mut sums: BTreeMap<&str, u64> = BTreeMap::new();
    for rec in view.iter() {
        if let Some(k) = key.value(rec) {
            let sum = sums.entry(k).or_default();
            *sum = sum.saturating_add(rec.total(columns.iter()));
        }
    }

    let mut out: Vec<GroupTotal> = sums
        .into_iter()
        .map(|(k, total)| GroupTotal {
            key: k.to_string(),
            total,
        })
        .collect();
    out.sort_by(|a, b| ranking_order(a.total, &a.key, b.total, &b.key));
    out
}

/// The first `n` entries; all of them when there are fewer.
pub fn top_n<T>(seq: &[T], n: usize) -> &[T] {
    &seq[..n.min(seq.len())]
}

/// Total for one (line, station) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationLineTotal {
    pub line: String,
    pub station: String,
    pub total: u64,
}

/// Like [`totals_by_group`] keyed by (line, station); ties broken by station
/// then line.
pub fn station_line_totals(view: &FilteredView<'_>, columns: &ResolvedColumns) -> Vec<StationLineTotal> {
    let mut sums: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for rec in view.iter() {
        if let (Some(line), Some(station)) = (rec.line.as_deref(), rec.station.as_deref()) {
            let sum = sums.entry((station, line)).or_default();
            *sum = sum.saturating_add(rec.total(columns.iter()));
        }
    }

    let mut out: Vec<StationLineTotal> = sums
        .into_iter()
        .map(|((station, line), total)| StationLineTotal {
            line: line.to_string(),
            station: station.to_string(),
            total,
        })
        .collect();
    out.sort_by(|a, b| {
        ranking_order(a.total, &a.station, b.total, &b.station).then_with(|| a.line.cmp(&b.line))
    });
    out
}

// ---------------------------------------------------------------------------
// Station × slot matrix
// ---------------------------------------------------------------------------

/// Per-station sums of each resolved column, not collapsed across slots.
/// Rows are in ascending station order; columns follow
/// [`ResolvedColumns::iter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMatrix {
    pub stations: Vec<String>,
    pub columns: Vec<TimeColumn>,
    cells: Vec<Vec<u64>>,
}

impl SlotMatrix {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() || self.columns.is_empty()
    }

    fn station_index(&self, station: &str) -> Option<usize> {
        self.stations
            .binary_search_by(|s| s.as_str().cmp(station))
            .ok()
    }

    pub fn row(&self, station: &str) -> Option<&[u64]> {
        self.station_index(station).map(|i| self.cells[i].as_slice())
    }

    pub fn get(&self, station: &str, column: TimeColumn) -> Option<u64> {
        let col = self.columns.iter().position(|c| *c == column)?;
        self.row(station).map(|r| r[col])
    }

    pub fn row_total(&self, station: &str) -> Option<u64> {
        self.row(station).map(|r| r.iter().fold(0, |acc: u64, &v| acc.saturating_add(v)))
    }

    /// Largest single cell, for colour scaling.
    pub fn max_cell(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// `(station, cells)` in heatmap order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.stations
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Table ordering: descending by the last column, ties by station.
    pub fn table_rows(&self) -> Vec<(&str, &[u64])> {
        let mut rows: Vec<(&str, &[u64])> = self.rows().collect();
        rows.sort_by(|a, b| {
            let last = |r: &[u64]| r.last().copied().unwrap_or(0);
            ranking_order(last(a.1), a.0, last(b.1), b.0)
        });
        rows
    }
}

pub fn time_slot_matrix(view: &FilteredView<'_>, columns: &ResolvedColumns) -> SlotMatrix {
    let cols: Vec<TimeColumn> = columns.iter().copied().collect();
    let mut sums: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for rec in view.iter() {
        let Some(station) = rec.station.as_deref() else {
            continue;
        };
        let row = sums
            .entry(station)
            .or_insert_with(|| vec![0; cols.len()]);
        for (cell, col) in row.iter_mut().zip(&cols) {
            *cell = cell.saturating_add(rec.count(*col));
        }
    }

    let (stations, cells): (Vec<String>, Vec<Vec<u64>>) = sums
        .into_iter()
        .map(|(s, row)| (s.to_string(), row))
        .unzip();
    SlotMatrix {
        stations,
        columns: cols,
        cells,
    }
}

// ---------------------------------------------------------------------------
// Last update
// ---------------------------------------------------------------------------

const WORK_DATE_FORMATS: [&str; 3] = ["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d"];

/// Latest `작업일자` in the whole dataset, as `YYYY-MM-DD` when every value
/// parses as a date, else the lexical maximum of the raw text.
pub fn latest_work_date(dataset: &RidershipDataset) -> Option<String> {
    let raw: Vec<&str> = dataset
        .records
        .iter()
        .filter_map(|r| r.work_date.as_deref())
        .collect();

    let parsed: Option<Vec<NaiveDate>> = raw
        .iter()
        .map(|s| {
            let s = s.trim();
            // "20240203" may carry a time part in some exports
            let date_part = s.split_whitespace().next().unwrap_or(s);
            WORK_DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(date_part, f).ok())
        })
        .collect();

    match parsed {
        Some(dates) => dates.into_iter().max().map(|d| d.format("%Y-%m-%d").to_string()),
        None => raw.into_iter().max().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterSelection, SlotRange, apply, resolve_time_columns};
    use crate::data::model::CellValue;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn n(v: i64) -> CellValue {
        CellValue::Integer(v)
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    /// Station A: ride 10 / alight 5, station B: ride 20 / alight 0, one slot.
    fn two_stations() -> RidershipDataset {
        RidershipDataset::from_table(
            headers(&["사용월", "호선명", "지하철역", "07시-08시 승차인원", "07시-08시 하차인원"]),
            vec![
                vec![s("202401"), s("1호선"), s("A"), n(10), n(5)],
                vec![s("202401"), s("1호선"), s("B"), n(20), n(0)],
            ],
        )
    }

    /// Two slots, three stations over two lines; 시청 is served by both.
    fn network() -> RidershipDataset {
        RidershipDataset::from_table(
            headers(&[
                "사용월",
                "호선명",
                "지하철역",
                "07시-08시 승차인원",
                "07시-08시 하차인원",
                "08시-09시 승차인원",
                "08시-09시 하차인원",
                "작업일자",
            ]),
            vec![
                vec![s("202401"), s("1호선"), s("서울역"), n(5), n(1), n(7), n(2), s("20240105")],
                vec![s("202401"), s("1호선"), s("시청"), n(3), n(3), n(1), n(0), s("20240203")],
                vec![s("202401"), s("2호선"), s("시청"), n(4), n(2), n(6), n(1), s("20240110")],
                vec![s("202401"), s("2호선"), s("강남"), n(9), n(9), n(9), n(9), s("20240110")],
            ],
        )
    }

    fn all_rows() -> FilterSelection {
        FilterSelection::default()
    }

    #[test]
    fn two_station_scenario() {
        let ds = two_stations();
        let view = apply(&ds, &all_rows());
        let cols = resolve_time_columns(&ds.schema.slots, None, Metric::Total);

        let totals = totals_by_direction(&view, &cols);
        assert_eq!(totals, DirectionTotals { ride: 30, alight: 5 });
        assert_eq!(totals.headline(Metric::Total), 35);
        assert_eq!(totals.headline(Metric::Ride), 30);
        assert_eq!(totals.headline(Metric::Alight), 5);

        let ranking = totals_by_group(&view, &cols, GroupKey::Station);
        assert_eq!(
            ranking,
            vec![
                GroupTotal { key: "B".into(), total: 20 },
                GroupTotal { key: "A".into(), total: 15 },
            ]
        );
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let ds = RidershipDataset::from_table(
            headers(&["사용월", "호선명", "지하철역", "07시-08시 승차인원", "07시-08시 하차인원"]),
            vec![
                vec![s("202401"), s("1호선"), s("A"), s("18446744073709551615"), n(1)],
                vec![s("202401"), s("1호선"), s("A"), n(1), n(1)],
            ],
        );
        assert_eq!(ds.invalid_cells, 0);
        let view = apply(&ds, &all_rows());

        let ride = resolve_time_columns(&ds.schema.slots, None, Metric::Ride);
        assert_eq!(totals_by_direction(&view, &ride).ride, u64::MAX);

        let total = resolve_time_columns(&ds.schema.slots, None, Metric::Total);
        let totals = totals_by_direction(&view, &total);
        assert_eq!(totals, DirectionTotals { ride: u64::MAX, alight: 2 });
        assert_eq!(totals.headline(Metric::Total), u64::MAX);

        let stations = totals_by_group(&view, &total, GroupKey::Station);
        assert_eq!(stations[0].total, u64::MAX);
        assert_eq!(station_line_totals(&view, &total)[0].total, u64::MAX);

        let matrix = time_slot_matrix(&view, &total);
        assert_eq!(matrix.row("A"), Some(&[u64::MAX, 2][..]));
        assert_eq!(matrix.row_total("A"), Some(u64::MAX));
    }

    #[test]
    fn empty_view_totals_are_zero() {
        let ds = two_stations();
        let sel = FilterSelection {
            month: Some("190001".into()),
            ..all_rows()
        };
        let view = apply(&ds, &sel);
        let cols = resolve_time_columns(&ds.schema.slots, None, Metric::Total);
        assert_eq!(totals_by_direction(&view, &cols), DirectionTotals::default());
        assert!(totals_by_group(&view, &cols, GroupKey::Line).is_empty());
        assert!(time_slot_matrix(&view, &cols).is_empty());
    }

    #[test]
    fn ties_break_by_ascending_key() {
        let ds = RidershipDataset::from_table(
            headers(&["지하철역", "07시-08시 승차인원"]),
            vec![
                vec![s("역삼"), n(4)],
                vec![s("강남"), n(4)],
                vec![s("교대"), n(9)],
            ],
        );
        let view = apply(&ds, &all_rows());
        let cols = resolve_time_columns(&ds.schema.slots, None, Metric::Ride);
        let keys: Vec<String> = totals_by_group(&view, &cols, GroupKey::Station)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["교대", "강남", "역삼"]);
    }

    #[test]
    fn line_ranking_and_station_line_pairs() {
        let ds = network();
        let view = apply(&ds, &all_rows());
        let cols = resolve_time_columns(&ds.schema.slots, None, Metric::Ride);

        let lines = totals_by_group(&view, &cols, GroupKey::Line);
        assert_eq!(
            lines,
            vec![
                GroupTotal { key: "2호선".into(), total: 28 },
                GroupTotal { key: "1호선".into(), total: 16 },
            ]
        );

        let pairs = station_line_totals(&view, &cols);
        let flat: Vec<(&str, &str, u64)> = pairs
            .iter()
            .map(|p| (p.station.as_str(), p.line.as_str(), p.total))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("강남", "2호선", 18),
                ("서울역", "1호선", 12),
                ("시청", "2호선", 10),
                ("시청", "1호선", 4),
            ]
        );
    }

    #[test]
    fn top_n_truncates_or_returns_everything() {
        let seq = vec![1, 2, 3];
        assert_eq!(top_n(&seq, 2), &[1, 2]);
        assert_eq!(top_n(&seq, 10), seq.as_slice());
        assert!(top_n::<u8>(&[], 5).is_empty());
    }

    #[test]
    fn matrix_rows_sum_to_station_totals() {
        let ds = network();
        let view = apply(&ds, &all_rows());
        for metric in Metric::ALL {
            let cols = resolve_time_columns(&ds.schema.slots, None, metric);
            let matrix = time_slot_matrix(&view, &cols);
            for group in totals_by_group(&view, &cols, GroupKey::Station) {
                assert_eq!(matrix.row_total(&group.key), Some(group.total), "{metric:?}");
            }
        }
    }

    #[test]
    fn matrix_keeps_each_column_separate() {
        let ds = network();
        let view = apply(&ds, &all_rows());
        let cols = resolve_time_columns(&ds.schema.slots, Some(SlotRange::new(1, 1)), Metric::Total);
        let matrix = time_slot_matrix(&view, &cols);

        assert_eq!(matrix.stations, vec!["강남", "서울역", "시청"]);
        assert_eq!(matrix.columns.len(), 2);
        // 시청 on both lines: ride 1 + 6, alight 0 + 1
        assert_eq!(matrix.row("시청"), Some(&[7, 1][..]));
        assert_eq!(matrix.get("서울역", cols.alight[0]), Some(2));
        assert_eq!(matrix.max_cell(), 9);
        assert_eq!(matrix.get("없는역", cols.ride[0]), None);
    }

    #[test]
    fn table_rows_sort_by_last_column() {
        let ds = network();
        let view = apply(&ds, &all_rows());
        let cols = resolve_time_columns(&ds.schema.slots, None, Metric::Ride);
        let matrix = time_slot_matrix(&view, &cols);
        let order: Vec<&str> = matrix.table_rows().into_iter().map(|(s, _)| s).collect();
        // last column (08-09 ride): 강남 9, 서울역 7, 시청 7
        assert_eq!(order, vec!["강남", "서울역", "시청"]);
    }

    #[test]
    fn latest_work_date_parses_or_falls_back() {
        assert_eq!(latest_work_date(&network()).as_deref(), Some("2024-02-03"));

        let odd = RidershipDataset::from_table(
            headers(&["작업일자"]),
            vec![vec![s("2024-01-05")], vec![s("unknown")]],
        );
        assert_eq!(latest_work_date(&odd).as_deref(), Some("unknown"));

        assert_eq!(latest_work_date(&two_stations()), None);
    }
}
