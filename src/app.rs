use eframe::egui;

use crate::state::{AppState, View};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct NirScanApp {
    pub state: AppState,
}

impl NirScanApp {
    /// Start with the spectra given on the command line, if any.
    pub fn with_files(paths: &[std::path::PathBuf]) -> Self {
        let mut app = Self::default();
        if !paths.is_empty() {
            app.state.load_paths(paths);
        }
        app
    }
}

impl eframe::App for NirScanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: preprocessing, PCA and filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Spectra => plot::spectral_plot(ui, &self.state),
            View::Scores => plot::score_plot(ui, &self.state),
        });
    }
}
