use super::aggregate::{
    DirectionTotals, GroupKey, GroupTotal, SlotMatrix, StationLineTotal, station_line_totals,
    time_slot_matrix, top_n, totals_by_direction, totals_by_group,
};
use super::filter::{FilterSelection, Metric, ResolvedColumns, ViewMode, apply, resolve_time_columns};
use super::model::RidershipDataset;
use super::schema::DataWarning;

/// Bars in the "stations coloured by line" chart.
pub const STATION_LINE_CHART_ROWS: usize = 20;

/// Everything the dashboard shows for one selection. Built from scratch per
/// interaction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub metric: Metric,
    pub view_mode: ViewMode,
    pub top_n: usize,
    pub matched_rows: usize,
    pub columns: ResolvedColumns,
    /// Header of each matrix column, e.g. `07시-08시 승차인원`.
    pub column_headers: Vec<String>,
    pub totals: DirectionTotals,
    pub headline: u64,
    pub station_ranking: Vec<GroupTotal>,
    pub line_ranking: Vec<GroupTotal>,
    pub station_line: Vec<StationLineTotal>,
    pub matrix: SlotMatrix,
    /// Dataset-level and filter-level warnings, without duplicates.
    pub warnings: Vec<DataWarning>,
}

impl DashboardSummary {
    /// No rows matched or no time column was resolved: the UI shows a
    /// placeholder instead of charts.
    pub fn is_empty(&self) -> bool {
        self.matched_rows == 0 || self.columns.is_empty()
    }

    pub fn top_stations(&self) -> &[GroupTotal] {
        top_n(&self.station_ranking, self.top_n)
    }

    pub fn top_station_lines(&self) -> &[StationLineTotal] {
        top_n(&self.station_line, STATION_LINE_CHART_ROWS)
    }

    pub fn busiest_station(&self) -> Option<&GroupTotal> {
        self.station_ranking.first()
    }

    pub fn busiest_line(&self) -> Option<&GroupTotal> {
        self.line_ranking.first()
    }
}

/// Run the whole filter → aggregate pipeline for one selection.
pub fn summarize(dataset: &RidershipDataset, selection: &FilterSelection) -> DashboardSummary {
    let view = apply(dataset, selection);
    let columns = resolve_time_columns(&dataset.schema.slots, selection.slot_range, selection.metric);

    let mut warnings = dataset.warnings.clone();
    for w in &view.warnings {
        if !warnings.contains(w) {
            warnings.push(w.clone());
        }
    }

    let ranking = |key: GroupKey| {
        let present = match key {
            GroupKey::Station => dataset.schema.station.is_some(),
            GroupKey::Line => dataset.schema.line.is_some(),
        };
        if present {
            totals_by_group(&view, &columns, key)
        } else {
            log::debug!("no '{}' column, ranking left empty", key.column());
            Vec::new()
        }
    };
    let station_ranking = ranking(GroupKey::Station);
    let line_ranking = ranking(GroupKey::Line);

    let totals = totals_by_direction(&view, &columns);
    let summary = DashboardSummary {
        metric: selection.metric,
        view_mode: selection.view_mode,
        top_n: selection.top_n,
        matched_rows: view.len(),
        column_headers: columns.headers(&dataset.schema.slots),
        headline: totals.headline(selection.metric),
        totals,
        station_ranking,
        line_ranking,
        station_line: station_line_totals(&view, &columns),
        matrix: time_slot_matrix(&view, &columns),
        columns,
        warnings,
    };

    log::debug!(
        "summary: {} rows, {} columns, headline {}",
        summary.matched_rows,
        summary.columns.len(),
        summary.headline
    );
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::SlotRange;
    use crate::data::model::CellValue;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn dataset() -> RidershipDataset {
        let headers = ["사용월", "호선명", "지하철역", "07시-08시 승차인원", "07시-08시 하차인원"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        RidershipDataset::from_table(
            headers,
            vec![
                vec![s("202401"), s("1호선"), s("A"), CellValue::Integer(10), CellValue::Integer(5)],
                vec![s("202401"), s("1호선"), s("B"), CellValue::Integer(20), CellValue::Integer(0)],
            ],
        )
    }

    #[test]
    fn total_metric_headline_and_rankings() {
        let ds = dataset();
        let sel = FilterSelection {
            metric: Metric::Total,
            ..FilterSelection::default()
        };
        let summary = summarize(&ds, &sel);

        assert!(!summary.is_empty());
        assert_eq!(summary.headline, 35);
        assert_eq!(summary.totals, DirectionTotals { ride: 30, alight: 5 });
        let order: Vec<&str> = summary.station_ranking.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
        assert_eq!(summary.busiest_station().map(|g| g.total), Some(20));
        assert_eq!(summary.busiest_line().map(|g| g.total), Some(35));
        assert_eq!(
            summary.column_headers,
            vec!["07시-08시 승차인원", "07시-08시 하차인원"]
        );
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn empty_selection_gives_placeholder_state() {
        let ds = dataset();
        let sel = FilterSelection {
            stations: BTreeSet::from(["Z".to_string()]),
            ..FilterSelection::default()
        };
        let summary = summarize(&ds, &sel);
        assert!(summary.is_empty());
        assert_eq!(summary.headline, 0);
        assert!(summary.station_ranking.is_empty());
        assert!(summary.busiest_station().is_none());
    }

    #[test]
    fn top_stations_respects_top_n() {
        let ds = dataset();
        let sel = FilterSelection {
            top_n: 5,
            slot_range: SlotRange::full(1),
            ..FilterSelection::default()
        };
        let summary = summarize(&ds, &sel);
        assert_eq!(summary.top_stations().len(), 2);
        assert_eq!(summary.top_station_lines().len(), 2);
    }

    #[test]
    fn missing_station_column_is_not_fatal() {
        let headers = vec!["사용월".to_string(), "07시-08시 승차인원".to_string()];
        let ds = RidershipDataset::from_table(
            headers,
            vec![vec![s("202401"), CellValue::Integer(3)]],
        );
        let sel = FilterSelection {
            stations: BTreeSet::from(["A".to_string()]),
            ..FilterSelection::default()
        };
        let summary = summarize(&ds, &sel);
        assert_eq!(summary.headline, 3);
        assert!(summary.station_ranking.is_empty());
        assert!(summary.matrix.is_empty());
        // reported once even though both the schema and the filter noticed it
        let missing_station = summary
            .warnings
            .iter()
            .filter(|w| **w == DataWarning::MissingColumn(crate::data::schema::STATION_COLUMN))
            .count();
        assert_eq!(missing_station, 1);
    }
}
