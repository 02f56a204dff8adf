use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::schema::STATION_COLUMN;
use crate::data::summary::DashboardSummary;
use crate::ui::format_count;

/// Flat station × time-column table, busiest (by the last column) first.
pub fn slot_table(ui: &mut Ui, summary: &DashboardSummary) {
    let rows = summary.matrix.table_rows();
    let headers = &summary.column_headers;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .column(Column::auto().at_least(90.0))
            .columns(Column::auto().at_least(110.0), headers.len())
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong(STATION_COLUMN);
                });
                for h in headers {
                    header.col(|ui| {
                        ui.strong(h);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let (station, cells) = rows[row.index()];
                    row.col(|ui| {
                        ui.label(station);
                    });
                    for &n in cells {
                        row.col(|ui| {
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                ui.label(format_count(n));
                            });
                        });
                    }
                });
            });
    });
}
