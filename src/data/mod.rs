//! Data layer: spectrum types, loading, and filtering.
//!
//! Architecture:
//! ```text
//!  instrument .csv / .json / dataset index
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file(s) → Spectrum (header + axis + absorbance)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────────┐
//!   │ SpectralDataset   │  Vec<Spectrum>, header index
//!   └──────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  apply header predicates → filtered indices
//!   └──────────┘
//! ```
pub mod dataset;
pub mod filter;
pub mod header;
pub mod loader;
pub mod model;
