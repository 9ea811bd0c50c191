use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use nirscan::data::dataset::{DataReader, DatasetOptions, looks_like_index};
use nirscan::data::filter::{FilterState, filtered_indices, init_filter_state};
use nirscan::data::loader::load_file;
use nirscan::{HeaderValue, NirError, PcaModel, SpectralDataset, Spectrum, savgol, snv};

use crate::color::ColorMap;

/// Preprocessing applied to every spectrum before plotting and PCA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessing {
    None,
    Snv,
    SavitzkyGolay,
}

impl Preprocessing {
    pub const ALL: [Preprocessing; 3] = [
        Preprocessing::None,
        Preprocessing::Snv,
        Preprocessing::SavitzkyGolay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Preprocessing::None => "Raw",
            Preprocessing::Snv => "SNV",
            Preprocessing::SavitzkyGolay => "Savitzky-Golay",
        }
    }
}

/// Savitzky-Golay parameters edited in the side panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavgolSettings {
    pub window: usize,
    pub order: usize,
    pub deriv: usize,
}

impl Default for SavgolSettings {
    fn default() -> Self {
        Self {
            window: 11,
            order: 2,
            deriv: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Spectra,
    Scores,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded spectra (None until user loads a file).
    pub dataset: Option<SpectralDataset>,

    /// `dataset.spectra` after preprocessing, same order.
    pub processed: Vec<Spectrum>,

    /// Per-key filter selections.
    pub filters: FilterState,

    /// Indices of spectra passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which header key is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    pub preprocessing: Preprocessing,
    pub savgol: SavgolSettings,

    /// Plot against wavenumber instead of wavelength.
    pub wavenumbers: bool,
    /// Plot reflectance instead of absorbance.
    pub reflectance: bool,

    pub view: View,

    /// PCA over the visible processed spectra, refitted on demand.
    pub pca: Option<PcaModel>,
    pub pca_components: usize,
    /// Zero-based components on the score plot axes.
    pub score_axes: (usize, usize),

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            processed: Vec::new(),
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            color_column: None,
            color_map: None,
            preprocessing: Preprocessing::None,
            savgol: SavgolSettings::default(),
            wavenumbers: false,
            reflectance: false,
            view: View::Spectra,
            pca: None,
            pca_components: 3,
            score_axes: (0, 1),
            status_message: None,
        }
    }
}

impl AppState {
    /// Load instrument exports, JSON collections or dataset indices and
    /// replace the current dataset with everything they contain.
    pub fn load_paths(&mut self, paths: &[PathBuf]) {
        match read_all(paths) {
            Ok(spectra) => {
                log::info!("Loaded {} spectra from {} file(s)", spectra.len(), paths.len());
                self.set_dataset(SpectralDataset::from_spectra(spectra));
            }
            Err(e) => {
                log::error!("Failed to load files: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, initialise filters and colour.
    pub fn set_dataset(&mut self, dataset: SpectralDataset) {
        self.filters = init_filter_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();

        // Default colour key: the sample name when present.
        self.color_column = dataset
            .column_names
            .iter()
            .find(|c| c.as_str() == "Name")
            .or_else(|| dataset.column_names.first())
            .cloned();
        self.rebuild_color_map(&dataset);

        self.dataset = Some(dataset);
        self.pca = None;
        self.status_message = None;
        self.reprocess();
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, dataset: &SpectralDataset) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    /// Recompute `processed` after a preprocessing change.
    pub fn reprocess(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let result: Result<Vec<Spectrum>, NirError> = ds
            .spectra
            .iter()
            .map(|s| match self.preprocessing {
                Preprocessing::None => Ok(s.clone()),
                Preprocessing::Snv => snv(s, false),
                Preprocessing::SavitzkyGolay => {
                    savgol(s, self.savgol.window, self.savgol.order, self.savgol.deriv)
                }
            })
            .collect();

        match result {
            Ok(processed) => {
                self.processed = processed;
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Preprocessing failed: {e}");
                self.status_message = Some(format!("{}: {e}", self.preprocessing.label()));
                self.preprocessing = Preprocessing::None;
                self.processed = ds.spectra.clone();
            }
        }
        self.pca = None;
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            let visible = filtered_indices(ds, &self.filters);
            if visible != self.visible_indices {
                self.visible_indices = visible;
                self.pca = None;
            }
        }
    }

    /// Set colour key and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(ds) = self.dataset.take() {
            self.rebuild_color_map(&ds);
            self.dataset = Some(ds);
        }
    }

    /// Select all values of a key.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self
            .dataset
            .as_ref()
            .and_then(|ds| ds.unique_values.get(column))
        {
            self.filters.insert(column.to_string(), all_vals.clone());
            self.refilter();
        }
    }

    /// Deselect all values of a key.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }

    /// Header value of the colour key for one spectrum.
    pub fn color_value<'a>(&self, spectrum: &'a Spectrum) -> Option<&'a HeaderValue> {
        self.color_column
            .as_deref()
            .and_then(|col| spectrum.header.get(col))
    }

    /// Fit PCA on the visible processed spectra.
    pub fn run_pca(&mut self) {
        let spectra: Vec<Spectrum> = self
            .visible_indices
            .iter()
            .filter_map(|&i| self.processed.get(i).cloned())
            .collect();

        let mut pca = PcaModel::new(spectra, self.pca_components);
        match pca.run() {
            Ok(()) => {
                self.status_message = None;
                let last = self.pca_components.saturating_sub(1);
                self.score_axes = (self.score_axes.0.min(last), self.score_axes.1.min(last));
                self.pca = Some(pca);
            }
            Err(e) => {
                log::warn!("PCA failed: {e}");
                self.status_message = Some(format!("PCA: {e}"));
                self.pca = None;
            }
        }
    }
}

fn read_all(paths: &[PathBuf]) -> anyhow::Result<Vec<Spectrum>> {
    let options = DatasetOptions::default();
    let mut spectra = Vec::new();
    for path in paths {
        spectra.extend(read_one(path, &options)?);
    }
    Ok(spectra)
}

fn read_one(path: &Path, options: &DatasetOptions) -> anyhow::Result<Vec<Spectrum>> {
    if looks_like_index(path, options) {
        Ok(DataReader::open_with(path, options)?.into_spectra())
    } else {
        load_file(path)
    }
}
