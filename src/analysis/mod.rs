//! Chemometric analysis: preprocessing, PCA and nearest-centroid classification.
//!
//! ```text
//!   Spectrum ──► preprocess (snv / savgol / msc) ──► Spectrum
//!                                                       │
//!                                                       ▼
//!                                                   PcaModel::run
//!                                                       │
//!                                        PcaTable ◄─────┤ transform
//!                                           │           │
//!                                           ▼           ▼
//!                                    CentroidTable ─► nearest_centroids ─► eval_distances
//! ```
pub mod centroid;
pub mod pca;
pub mod preprocess;
pub mod table;
