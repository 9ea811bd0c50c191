//! Near-infrared spectroscopy toolkit.
//!
//! Reads instrument exports into [`Spectrum`] values, preprocesses them
//! (SNV, Savitzky-Golay, MSC), reduces them with PCA and classifies query
//! spectra against labelled group centroids.
//!
//! ```no_run
//! use std::path::Path;
//! use nirscan::{CentroidTable, DataReader, PcaModel, PcaTable};
//! use nirscan::{eval_distances, nearest_centroids};
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = DataReader::open(Path::new("fruit/index.csv"))?;
//! let query = data.random_sample().cloned().expect("empty dataset");
//!
//! let mut pca = PcaModel::new(data.into_spectra(), 3);
//! pca.run()?;
//! let scores = PcaTable::from_model(&pca, Some("Name"))?;
//! let centroids = CentroidTable::from_table(&scores, &["PC1", "PC2", "PC3"])?;
//!
//! let ranked = nearest_centroids(&query, &pca, &centroids, 5)?;
//! println!("{:?}", eval_distances(&ranked, &centroids.radii()));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod data;
pub mod error;

pub use analysis::centroid::{
    Centroid, CentroidDistance, CentroidTable, DEFAULT_NEAREST, DISTANCE_BUFFER, eval_distances,
    nearest_centroids,
};
pub use analysis::pca::{DEFAULT_COMPONENTS, PcaModel};
pub use analysis::preprocess::{msc, savgol, snv};
pub use analysis::table::{PcaRow, PcaTable};
pub use data::dataset::{DataReader, DatasetOptions};
pub use data::header::{Header, HeaderValue};
pub use data::loader::{
    ReaderOptions, load_file, read_spectrum, write_json, write_spectrum,
};
pub use data::model::{Absorbance, Signal, SpectralDataset, Spectrum, Wavelength, approx_eq, average};
pub use error::{NirError, Result};
