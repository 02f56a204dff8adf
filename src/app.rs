use eframe::egui;

use crate::color;
use crate::config::Theme;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyMetroApp {
    pub state: AppState,
    /// Theme whose visuals are currently installed.
    applied_theme: Option<Theme>,
}

impl RustyMetroApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            applied_theme: None,
        }
    }
}

impl eframe::App for RustyMetroApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.applied_theme != Some(self.state.theme) {
            ctx.set_visuals(color::visuals(self.state.theme));
            self.applied_theme = Some(self.state.theme);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Headline figures ----
        egui::SidePanel::left("kpi_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::kpi_panel(ui, &self.state);
            });

        // ---- Right side panel: rankings ----
        egui::SidePanel::right("ranking_panel")
            .default_width(300.0)
            .resizable(true)
            .show(ctx, |ui| {
                plot::ranking_panel(ui, &self.state);
            });

        // ---- Central panel: stations and time pattern ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::station_panel(ui, &self.state);
        });
    }
}
