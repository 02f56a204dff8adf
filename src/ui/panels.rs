use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::Theme;
use crate::data::filter::{Metric, SlotRange, TOP_N_RANGE, ViewMode};
use crate::data::loader::load_file;
use crate::data::schema::{LINE_COLUMN, MONTH_COLUMN, STATION_COLUMN};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Widgets edit a copy of the selection which
/// replaces the current one at the end of the frame.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("서울시 지하철 이용 분석");
    ui.label(RichText::new("필터를 바꾸면 본문 차트가 함께 갱신됩니다.").small().weak());
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Copy what we need so we can mutate state after the widgets.
    let months = dataset.month_options();
    let lines = dataset.line_options();
    let slot_labels = dataset.schema.slots.labels();
    let has_month = dataset.schema.month.is_some();
    let has_line = dataset.schema.line.is_some();
    let has_station = dataset.schema.station.is_some();
    let stations: Vec<String> = state.station_options.iter().cloned().collect();
    let warnings: Vec<String> = state
        .summary
        .as_ref()
        .map(|s| s.warnings.iter().map(|w| w.to_string()).collect())
        .unwrap_or_default();

    let mut sel = state.selection.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for w in &warnings {
                ui.label(RichText::new(w).color(Color32::from_rgb(0xe0, 0xa0, 0x20)));
            }

            // ---- Month ----
            if has_month {
                ui.strong(MONTH_COLUMN);
                let current = sel.month.clone().unwrap_or_default();
                egui::ComboBox::from_id_salt("month")
                    .selected_text(&current)
                    .show_ui(ui, |ui: &mut Ui| {
                        for m in &months {
                            ui.selectable_value(&mut sel.month, Some(m.clone()), m);
                        }
                    });
            }

            // ---- Lines ----
            if has_line {
                multi_select(ui, LINE_COLUMN, &lines, &mut sel.lines, None);
            }

            // ---- Stations (options depend on lines) ----
            if has_station {
                multi_select(
                    ui,
                    STATION_COLUMN,
                    &stations,
                    &mut sel.stations,
                    Some("역을 선택하지 않으면 전체"),
                );
            }

            ui.separator();

            // ---- Metric ----
            ui.strong("지표");
            ui.horizontal(|ui: &mut Ui| {
                for m in Metric::ALL {
                    ui.radio_value(&mut sel.metric, m, m.label());
                }
            });

            // ---- Time-slot range ----
            if let Some(full) = SlotRange::full(slot_labels.len()) {
                ui.strong("시간대 범위");
                let range = sel.slot_range.unwrap_or(full);
                let (mut start, mut end) = (range.start(), range.end());
                let last = full.end();
                let fmt = |v: f64| slot_labels.get(v as usize).cloned().unwrap_or_default();
                ui.add(
                    egui::Slider::new(&mut start, 0..=last)
                        .text("시작")
                        .custom_formatter(|v, _| fmt(v)),
                );
                ui.add(
                    egui::Slider::new(&mut end, 0..=last)
                        .text("끝")
                        .custom_formatter(|v, _| fmt(v)),
                );
                sel.slot_range = Some(SlotRange::new(start, end));
            }

            ui.separator();

            // ---- View / ranking / theme ----
            ui.strong("표시 형태");
            ui.horizontal(|ui: &mut Ui| {
                for v in ViewMode::ALL {
                    ui.radio_value(&mut sel.view_mode, v, v.label());
                }
            });

            let mut top_n = sel.top_n;
            ui.add(egui::Slider::new(&mut top_n, TOP_N_RANGE).text("Top N (랭킹)"));
            sel.set_top_n(top_n);

            ui.strong("테마");
            egui::ComboBox::from_id_salt("theme")
                .selected_text(state.theme.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for t in Theme::ALL {
                        ui.selectable_value(&mut state.theme, t, t.label());
                    }
                });
        });

    state.update_selection(sel);
}

/// Collapsible checkbox list with All / None buttons.
/// An empty selection means "no restriction".
fn multi_select(
    ui: &mut Ui,
    title: &str,
    options: &[String],
    selected: &mut BTreeSet<String>,
    hint: Option<&str>,
) {
    let header_text = if selected.is_empty() {
        format!("{title}  (전체)")
    } else {
        format!("{title}  ({}/{})", selected.len(), options.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if let Some(hint) = hint {
                ui.label(RichText::new(hint).small().weak());
            }
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    selected.extend(options.iter().cloned());
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                }
            });

            for opt in options {
                let mut checked = selected.contains(opt);
                if ui.checkbox(&mut checked, opt).changed() {
                    if checked {
                        selected.insert(opt.clone());
                    } else {
                        selected.remove(opt);
                    }
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save settings").clicked() {
                save_settings(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let matched = state.summary.as_ref().map_or(0, |s| s.matched_rows);
            ui.label(format!("{} rows loaded, {} matched", ds.len(), matched));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog / settings
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open ridership data")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match load_file(&path, &state.settings.load_options()) {
            Ok(dataset) => {
                state.settings.data_path = Some(path);
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

/// Persist the current theme, ranking size and data file.
fn save_settings(state: &mut AppState) {
    state.settings.theme = state.theme;
    state.settings.default_top_n = state.selection.top_n;
    let path = crate::config::Settings::default_path();
    match state.settings.save(&path) {
        Ok(()) => {
            log::info!("Saved settings to {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to save settings: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
