use eframe::egui::{self, Align2, Color32, FontId, Rect, RichText, Sense, Ui, vec2};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::{ALIGHT_COLOR, RIDE_COLOR, heat_color};
use crate::config::Theme;
use crate::data::filter::ViewMode;
use crate::data::model::RidershipDataset;
use crate::data::schema::Direction;
use crate::data::summary::{DashboardSummary, STATION_LINE_CHART_ROWS};
use crate::state::AppState;
use crate::ui::{format_count, table};

fn placeholder(ui: &mut Ui, text: &str) {
    ui.add_space(12.0);
    ui.label(RichText::new(text).weak());
}

/// Summary to draw, or `None` after showing the neutral placeholder.
fn ready<'a>(ui: &mut Ui, state: &'a AppState, text: &str) -> Option<(&'a RidershipDataset, &'a DashboardSummary)> {
    match (&state.dataset, &state.summary) {
        (Some(ds), Some(s)) if !s.is_empty() => Some((ds, s)),
        _ => {
            placeholder(ui, text);
            None
        }
    }
}

/// Big-number card.
fn metric_card(ui: &mut Ui, label: &str, value: &str, delta: Option<&str>) {
    egui::Frame::group(ui.style())
        .inner_margin(12.0)
        .show(ui, |ui: &mut Ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(label);
                ui.label(RichText::new(value).size(24.0).strong());
                if let Some(d) = delta {
                    ui.label(RichText::new(d).color(Color32::from_rgb(0x2e, 0xa0, 0x43)));
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Column 1: headline + ride/alight split
// ---------------------------------------------------------------------------

pub fn kpi_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("요약 지표");
    let Some((_, summary)) = ready(ui, state, "좌측 사이드바에서 데이터를 선택하면 지표가 표시됩니다.") else {
        return;
    };

    metric_card(ui, "총 이용객 수", &format!("{} 명", format_count(summary.headline)), None);
    ui.add_space(8.0);

    let totals = summary.totals;
    let sum = totals.ride.saturating_add(totals.alight).max(1) as f64;
    ui.label(RichText::new("승차 vs 하차 비율").strong());
    let bars = vec![
        Bar::new(0.0, totals.ride as f64)
            .name(format!("승차 {:.1}%", totals.ride as f64 / sum * 100.0))
            .fill(RIDE_COLOR),
        Bar::new(1.0, totals.alight as f64)
            .name(format!("하차 {:.1}%", totals.alight as f64 / sum * 100.0))
            .fill(ALIGHT_COLOR),
    ];
    Plot::new("direction_split")
        .height(220.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show_axes([true, false])
        .x_axis_formatter(|mark, _| match mark.value.round() as i64 {
            0 => Direction::Ride.label().to_string(),
            1 => Direction::Alight.label().to_string(),
            _ => String::new(),
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.6));
        });

    ui.horizontal(|ui: &mut Ui| {
        ui.colored_label(RIDE_COLOR, format!("승차 {}", format_count(totals.ride)));
        ui.colored_label(ALIGHT_COLOR, format!("하차 {}", format_count(totals.alight)));
    });
}

// ---------------------------------------------------------------------------
// Column 2: stations by line + time pattern
// ---------------------------------------------------------------------------

pub fn station_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("노선별/역별 시각화");
    let Some((dataset, summary)) = ready(ui, state, "사이드바에서 필터를 선택하면 시각화가 표시됩니다.") else {
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(format!("역별 총 이용객 (Top {STATION_LINE_CHART_ROWS})")).strong());
            station_line_chart(ui, state, summary);

            ui.separator();
            ui.label(RichText::new("시간대별 패턴").size(16.0).strong());
            match summary.view_mode {
                ViewMode::Heatmap => heatmap(ui, dataset, summary, state.theme),
                ViewMode::Table => table::slot_table(ui, summary),
            }
        });
}

/// Horizontal bars, first entry on top; one series per line for the legend.
fn station_line_chart(ui: &mut Ui, state: &AppState, summary: &DashboardSummary) {
    let rows = summary.top_station_lines();
    let names: Vec<String> = rows.iter().map(|r| r.station.clone()).collect();

    let mut per_line: Vec<(&str, Vec<Bar>)> = Vec::new();
    for (i, r) in rows.iter().enumerate() {
        let bar = Bar::new(-(i as f64), r.total as f64).name(format!("{} ({})", r.station, r.line));
        match per_line.iter_mut().find(|(l, _)| *l == r.line) {
            Some((_, bars)) => bars.push(bar),
            None => per_line.push((r.line.as_str(), vec![bar])),
        }
    }

    Plot::new("station_line_chart")
        .height(24.0 * rows.len().max(4) as f32)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .y_axis_formatter(move |mark, _| rank_label(&names, mark.value))
        .show(ui, |plot_ui| {
            for (line, bars) in per_line {
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .horizontal()
                        .width(0.7)
                        .name(line)
                        .color(state.line_colors.color_for(line)),
                );
            }
        });
}

/// Axis label for a bar placed at `-(rank)`.
fn rank_label(names: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded > 0.0 {
        return String::new();
    }
    names.get((-rounded) as usize).cloned().unwrap_or_default()
}

/// Station × time-column heatmap painted cell by cell.
fn heatmap(ui: &mut Ui, dataset: &RidershipDataset, summary: &DashboardSummary, theme: Theme) {
    let matrix = &summary.matrix;
    let ncols = matrix.columns.len();
    let nrows = matrix.stations.len();
    if matrix.is_empty() {
        placeholder(ui, "표시할 데이터가 없습니다.");
        return;
    }

    let label_w = 96.0;
    let header_h = 36.0;
    let cell_h = 18.0;
    let cell_w = ((ui.available_width() - label_w) / ncols as f32).clamp(16.0, 64.0);
    let size = vec2(label_w + cell_w * ncols as f32, header_h + cell_h * nrows as f32);
    let max = matrix.max_cell();
    let text_color = ui.visuals().text_color();

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
        let painter = ui.painter_at(rect);
        let font = FontId::proportional(11.0);

        // column headers: start hour on the first line, direction below
        for (c, col) in matrix.columns.iter().enumerate() {
            let x = rect.left() + label_w + cell_w * (c as f32 + 0.5);
            let hour = dataset
                .schema
                .slots
                .slot(col.slot)
                .map(|s| format!("{:02}시", s.start_hour))
                .unwrap_or_default();
            painter.text(egui::pos2(x, rect.top() + 2.0), Align2::CENTER_TOP, hour, font.clone(), text_color);
            painter.text(
                egui::pos2(x, rect.top() + 18.0),
                Align2::CENTER_TOP,
                col.direction.label(),
                font.clone(),
                text_color,
            );
        }

        for (r, (station, cells)) in matrix.rows().enumerate() {
            let y = rect.top() + header_h + cell_h * r as f32;
            painter.text(
                egui::pos2(rect.left() + label_w - 4.0, y + cell_h * 0.5),
                Align2::RIGHT_CENTER,
                station,
                font.clone(),
                text_color,
            );
            for (c, &value) in cells.iter().enumerate() {
                let min = egui::pos2(rect.left() + label_w + cell_w * c as f32, y);
                let cell = Rect::from_min_size(min, vec2(cell_w - 1.0, cell_h - 1.0));
                painter.rect_filled(cell, 0.0, heat_color(value, max, theme));
            }
        }

        if let Some(pos) = response.hover_pos() {
            let c = ((pos.x - rect.left() - label_w) / cell_w).floor();
            let r = ((pos.y - rect.top() - header_h) / cell_h).floor();
            if c >= 0.0 && r >= 0.0 && (c as usize) < ncols && (r as usize) < nrows {
                let station = &matrix.stations[r as usize];
                let column = matrix.columns[c as usize];
                let header = dataset.schema.slots.header(column).unwrap_or_default();
                let value = matrix.get(station, column).unwrap_or(0);
                let row_total = matrix.row_total(station).unwrap_or(0);
                response.on_hover_text_at_pointer(format!(
                    "{station} · {header}: {} 명\n선택 구간 합계: {} 명",
                    format_count(value),
                    format_count(row_total)
                ));
            }
        }
    });

    ui.label(
        RichText::new(format!("색상: 0 – {} 명", format_count(max)))
            .small()
            .weak(),
    );
}

// ---------------------------------------------------------------------------
// Column 3: rankings + about
// ---------------------------------------------------------------------------

pub fn ranking_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Top 역 / 노선 & About");

    if let Some((_, summary)) = ready(ui, state, "사이드바에서 필터를 선택하면 Top 랭킹과 About 정보가 표시됩니다.") {
        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - 120.0).max(100.0))
            .show(ui, |ui: &mut Ui| rankings(ui, state, summary));
    }

    ui.separator();
    egui::CollapsingHeader::new("About")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label("데이터 출처: 서울열린데이터광장");
            ui.label(
                "월별·호선별·역별·시간대별 승하차 인원 자료를 바탕으로 선택한 시간대의 합계를 사용해 \
                 랭킹과 시각화를 제공합니다.",
            );
            ui.label("사이드바에서 사용월, 호선명, 지하철역, 시간대 범위, 지표를 선택하세요.");
            ui.label("히트맵/테이블 전환 및 Top N 크기를 조절할 수 있습니다.");
            if let Some(date) = &state.last_updated {
                ui.label(RichText::new(format!("최근 작업일자: {date}")).small());
            }
        });
}

fn rankings(ui: &mut Ui, state: &AppState, summary: &DashboardSummary) {
    // ---- stations ----
    match summary.busiest_station() {
        Some(best) => {
            metric_card(
                ui,
                "가장 혼잡한 역(선택 기간)",
                &best.key,
                Some(&format!("{} 명", format_count(best.total))),
            );

            let top = summary.top_stations();
            ui.label(RichText::new(format!("역별 이용객 Top {}", top.len())).strong());
            let names: Vec<String> = top.iter().map(|g| g.key.clone()).collect();
            let bars: Vec<Bar> = top
                .iter()
                .enumerate()
                .map(|(i, g)| Bar::new(-(i as f64), g.total as f64).name(&g.key))
                .collect();
            Plot::new("top_stations")
                .height(22.0 * top.len().max(4) as f32)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .y_axis_formatter(move |mark, _| rank_label(&names, mark.value))
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).horizontal().width(0.7).color(RIDE_COLOR));
                });
        }
        None => placeholder(ui, "역 랭킹을 표시할 수 없습니다."),
    }

    ui.separator();

    // ---- lines ----
    match summary.busiest_line() {
        Some(best) => {
            metric_card(
                ui,
                "가장 혼잡한 노선(선택 기간)",
                &best.key,
                Some(&format!("{} 명", format_count(best.total))),
            );

            ui.label(RichText::new("노선별 총 이용객").strong());
            let names: Vec<String> = summary.line_ranking.iter().map(|g| g.key.clone()).collect();
            let bars: Vec<Bar> = summary
                .line_ranking
                .iter()
                .enumerate()
                .map(|(i, g)| {
                    Bar::new(i as f64, g.total as f64)
                        .name(&g.key)
                        .fill(state.line_colors.color_for(&g.key))
                })
                .collect();
            Plot::new("line_ranking")
                .height(200.0)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .x_axis_formatter(move |mark, _| {
                    let rounded = mark.value.round();
                    if (mark.value - rounded).abs() > 1e-6 || rounded < 0.0 {
                        return String::new();
                    }
                    names.get(rounded as usize).cloned().unwrap_or_default()
                })
                .show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).width(0.6));
                });
        }
        None => placeholder(ui, "노선 랭킹을 표시할 수 없습니다."),
    }
}

#[cfg(test)]
mod tests {
    use super::rank_label;

    #[test]
    fn rank_labels_only_on_bar_positions() {
        let names = vec!["강남".to_string(), "잠실".to_string()];
        assert_eq!(rank_label(&names, 0.0), "강남");
        assert_eq!(rank_label(&names, -1.0), "잠실");
        assert_eq!(rank_label(&names, -0.5), "");
        assert_eq!(rank_label(&names, 1.0), "");
        assert_eq!(rank_label(&names, -2.0), "");
    }
}
