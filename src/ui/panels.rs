use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, Preprocessing, View};

// ---------------------------------------------------------------------------
// Left side panel – preprocessing, PCA and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.heading("NIR Scan");
        ui.separator();
        ui.label("No spectra loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            preprocessing_section(ui, state);
            ui.separator();
            pca_section(ui, state);
            ui.separator();
            color_section(ui, state);
            ui.separator();
            filter_section(ui, state);
        });
}

fn preprocessing_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Preprocessing");
    let before = (state.preprocessing, state.savgol);

    egui::ComboBox::from_id_salt("preprocessing")
        .selected_text(state.preprocessing.label())
        .show_ui(ui, |ui: &mut Ui| {
            for mode in Preprocessing::ALL {
                ui.selectable_value(&mut state.preprocessing, mode, mode.label());
            }
        });

    if state.preprocessing == Preprocessing::SavitzkyGolay {
        let settings = &mut state.savgol;
        ui.add(
            egui::Slider::new(&mut settings.window, 3..=51)
                .step_by(2.0)
                .text("window"),
        );
        ui.add(egui::Slider::new(&mut settings.order, 0..=5).text("order"));
        ui.add(egui::Slider::new(&mut settings.deriv, 0..=2).text("derivative"));
    }

    if before != (state.preprocessing, state.savgol) {
        state.reprocess();
    }
}

fn pca_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("PCA");
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Slider::new(&mut state.pca_components, 2..=10).text("components"));
    });
    if ui.button("Fit on visible spectra").clicked() {
        state.run_pca();
        state.view = View::Scores;
    }

    let Some(pca) = &state.pca else {
        return;
    };
    let names = pca.column_names();
    if let Ok(ratios) = pca.explained_variance_ratio() {
        for (name, ratio) in names.iter().zip(ratios) {
            ui.label(format!("{name}: {:.1} %", 100.0 * ratio));
        }
    }

    let (mut x, mut y) = state.score_axes;
    for (salt, axis) in [("score_x", &mut x), ("score_y", &mut y)] {
        egui::ComboBox::from_id_salt(salt)
            .selected_text(&names[*axis])
            .show_ui(ui, |ui: &mut Ui| {
                for (i, name) in names.iter().enumerate() {
                    ui.selectable_value(&mut *axis, i, name);
                }
            });
    }
    state.score_axes = (x, y);
}

fn color_section(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let columns = dataset.column_names.clone();

    ui.strong("Color by");
    let current = state.color_column.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("color_by")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &columns {
                if ui.selectable_label(current == *col, col).clicked() {
                    state.set_color_column(col.clone());
                }
            }
        });
}

fn filter_section(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    // Clone what we need so we can mutate state inside the loop.
    let columns = dataset.column_names.clone();
    let unique = dataset.unique_values.clone();

    ui.strong("Filters");
    for col in &columns {
        let Some(all_values) = unique.get(col) else {
            continue;
        };

        let n_selected = state.filters.get(col).map_or(0, |s| s.len());
        let header_text = format!("{col}  ({n_selected}/{})", all_values.len());

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt(col)
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all(col);
                    }
                    if ui.small_button("None").clicked() {
                        state.select_none(col);
                    }
                });

                for val in all_values {
                    let mut text = RichText::new(val.to_string());
                    if let Some(cm) = state.color_map.as_ref().filter(|cm| cm.column == *col) {
                        text = text.color(cm.color_for(Some(val)));
                    }

                    let selected = state.filters.entry(col.clone()).or_default();
                    let mut checked = selected.contains(val);
                    if ui.checkbox(&mut checked, text).changed() {
                        if checked {
                            selected.insert(val.clone());
                        } else {
                            selected.remove(val);
                        }
                    }
                }
            });
    }

    // Recompute visible indices after any checkbox changes.
    state.refilter();
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
        });

        ui.separator();
        ui.selectable_value(&mut state.view, View::Spectra, "Spectra");
        ui.selectable_value(&mut state.view, View::Scores, "Scores");
        ui.separator();

        if state.view == View::Spectra {
            ui.checkbox(&mut state.wavenumbers, "Wavenumbers");
            ui.checkbox(&mut state.reflectance, "Reflectance");
            ui.separator();
        }

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} spectra loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open NIR spectra")
        .add_filter("Supported files", &["csv", "txt", "dat", "json"])
        .add_filter("Instrument export / dataset index", &["csv", "txt", "dat"])
        .add_filter("JSON collection", &["json"])
        .pick_files();

    if let Some(paths) = files {
        state.load_paths(&paths);
    }
}
