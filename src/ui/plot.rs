use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::state::AppState;

fn legend_name(state: &AppState, idx: usize) -> String {
    state
        .processed
        .get(idx)
        .and_then(|sp| state.color_value(sp))
        .map(|v| v.to_string())
        .unwrap_or_else(|| format!("spectrum {idx}"))
}

fn color_of(state: &AppState, idx: usize) -> Color32 {
    match (&state.color_map, state.processed.get(idx)) {
        (Some(cm), Some(sp)) => cm.color_for(state.color_value(sp)),
        _ => Color32::LIGHT_BLUE,
    }
}

// ---------------------------------------------------------------------------
// Spectral plot (central panel)
// ---------------------------------------------------------------------------

/// Render the processed spectra against wavelength or wavenumber.
pub fn spectral_plot(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view spectra  (File → Open…)");
        });
        return;
    }

    let x_label = if state.wavenumbers {
        "Wavenumber [cm⁻¹]"
    } else {
        "Wavelength [nm]"
    };
    let y_label = if state.reflectance {
        "Reflectance"
    } else {
        "Absorbance"
    };

    Plot::new("spectral_plot")
        .legend(Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &idx in &state.visible_indices {
                let Some(sp) = state.processed.get(idx) else {
                    continue;
                };

                let x = if state.wavenumbers {
                    sp.wavelengths().as_wavenumbers()
                } else {
                    sp.wavelengths().values().to_vec()
                };
                let y = if state.reflectance {
                    sp.absorbance().as_reflectance()
                } else {
                    sp.absorbance().values().to_vec()
                };

                let points: PlotPoints = x.into_iter().zip(y).map(|(xi, yi)| [xi, yi]).collect();
                let line = Line::new(points)
                    .name(legend_name(state, idx))
                    .color(color_of(state, idx))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Score plot (central panel)
// ---------------------------------------------------------------------------

/// Render the fitted PCA scores, one point per spectrum.
pub fn score_plot(ui: &mut Ui, state: &AppState) {
    let Some(pca) = &state.pca else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Fit a PCA model to view scores  (PCA → Fit on visible spectra)");
        });
        return;
    };
    let Ok(scores) = pca.scores() else {
        return;
    };

    let names = pca.column_names();
    let (cx, cy) = state.score_axes;

    Plot::new("score_plot")
        .legend(Legend::default())
        .x_axis_label(names[cx].as_str())
        .y_axis_label(names[cy].as_str())
        .data_aspect(1.0)
        .show(ui, |plot_ui| {
            // The model was fitted on the visible spectra, in this order.
            for (sample, &idx) in state.visible_indices.iter().enumerate() {
                if sample >= scores.ncols() {
                    break;
                }
                let point = Points::new(vec![[scores[(cx, sample)], scores[(cy, sample)]]])
                    .name(legend_name(state, idx))
                    .color(color_of(state, idx))
                    .radius(4.0);
                plot_ui.points(point);
            }
        });
}
