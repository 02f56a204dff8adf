use std::collections::BTreeSet;

use crate::color::LineColors;
use crate::config::{Settings, Theme};
use crate::data::aggregate::latest_work_date;
use crate::data::filter::{FilterSelection, resolve_station_options};
use crate::data::model::RidershipDataset;
use crate::data::summary::{DashboardSummary, summarize};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset. Read-only between loads.
    pub dataset: Option<RidershipDataset>,

    pub settings: Settings,

    /// The selection the current summary was computed from.
    pub selection: FilterSelection,

    /// Stations offered for the current line selection.
    pub station_options: BTreeSet<String>,

    /// Output of the last pipeline run.
    pub summary: Option<DashboardSummary>,

    /// Latest `작업일자`, if the table has one.
    pub last_updated: Option<String>,

    pub line_colors: LineColors,

    pub theme: Theme,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            dataset: None,
            theme: settings.theme,
            settings,
            selection: FilterSelection::default(),
            station_options: BTreeSet::new(),
            summary: None,
            last_updated: None,
            line_colors: LineColors::default(),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and compute the initial view.
    pub fn set_dataset(&mut self, dataset: RidershipDataset) {
        self.selection = FilterSelection::initial(&dataset, self.settings.default_top_n);
        self.station_options = resolve_station_options(&dataset, &self.selection.lines);
        self.last_updated = latest_work_date(&dataset);
        self.line_colors = LineColors::new(&dataset.lines);
        self.summary = Some(summarize(&dataset, &self.selection));
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Replace the selection. Re-runs the pipeline only when something
    /// changed. Stations outside the new line selection are dropped first.
    pub fn update_selection(&mut self, mut selection: FilterSelection) {
        let Some(ds) = &self.dataset else {
            return;
        };
        if selection.lines != self.selection.lines {
            self.station_options = resolve_station_options(ds, &selection.lines);
        }
        selection.prune_stations(&self.station_options);
        if selection == self.selection {
            return;
        }
        log::debug!("selection changed: {selection:?}");
        self.summary = Some(summarize(ds, &selection));
        self.selection = selection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn dataset() -> RidershipDataset {
        let headers = ["사용월", "호선명", "지하철역", "07시-08시 승차인원", "작업일자"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let row = |l: &str, st: &str, n: i64| {
            vec![
                CellValue::String("202401".into()),
                CellValue::String(l.into()),
                CellValue::String(st.into()),
                CellValue::Integer(n),
                CellValue::String("20240201".into()),
            ]
        };
        RidershipDataset::from_table(
            headers,
            vec![row("1호선", "서울역", 3), row("2호선", "강남", 8)],
        )
    }

    #[test]
    fn set_dataset_initialises_everything() {
        let mut state = AppState::new(Settings::default());
        state.set_dataset(dataset());

        assert_eq!(state.selection.lines.len(), 1);
        assert_eq!(state.station_options, BTreeSet::from(["서울역".to_string()]));
        assert_eq!(state.last_updated.as_deref(), Some("2024-02-01"));
        assert_eq!(state.summary.as_ref().map(|s| s.headline), Some(3));
    }

    #[test]
    fn line_change_prunes_stations_and_recomputes() {
        let mut state = AppState::new(Settings::default());
        state.set_dataset(dataset());

        let mut sel = state.selection.clone();
        sel.stations.insert("서울역".into());
        state.update_selection(sel);
        assert_eq!(state.selection.stations.len(), 1);

        let mut sel = state.selection.clone();
        sel.lines = BTreeSet::from(["2호선".to_string()]);
        state.update_selection(sel);
        assert!(state.selection.stations.is_empty());
        assert_eq!(state.station_options, BTreeSet::from(["강남".to_string()]));
        assert_eq!(state.summary.as_ref().map(|s| s.headline), Some(8));

        // clearing lines offers every station again
        let mut sel = state.selection.clone();
        sel.lines.clear();
        state.update_selection(sel);
        assert_eq!(state.station_options.len(), 2);
        assert_eq!(state.summary.as_ref().map(|s| s.headline), Some(11));
    }

    #[test]
    fn update_without_dataset_is_ignored() {
        let mut state = AppState::new(Settings::default());
        state.update_selection(FilterSelection::default());
        assert!(state.summary.is_none());
    }
}
