//! Fitted PCA coordinates as a labelled table, one row per spectrum.

use std::io::Write;
use std::path::Path;

use anyhow::Context;

use super::pca::PcaModel;
use crate::error::{NirError, Result};

/// Name of the label column in exported tables.
pub const LABEL_COLUMN: &str = "Label";

#[derive(Debug, Clone, PartialEq)]
pub struct PcaRow {
    pub scores: Vec<f64>,
    pub label: String,
}

/// Scores of every fitted spectrum plus a label taken from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaTable {
    pub columns: Vec<String>,
    pub rows: Vec<PcaRow>,
}

impl PcaTable {
    /// Build the table from a fitted model. The label of each row is the
    /// spectrum's header value under `label_key`, rendered as text, or an
    /// empty string when the key is missing or no key is given.
    pub fn from_model(pca: &PcaModel, label_key: Option<&str>) -> Result<Self> {
        let scores = pca.scores()?;
        let rows = pca
            .spectra()
            .iter()
            .enumerate()
            .map(|(i, spectrum)| PcaRow {
                scores: scores.column(i).iter().copied().collect(),
                label: label_key
                    .and_then(|key| spectrum.header.get(key))
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            })
            .collect();
        Ok(Self {
            columns: pca.column_names(),
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named score column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| NirError::invalid("column", name, "not a column of the score table"))
    }

    /// Values of one score column in row order.
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r.scores[idx]).collect())
    }

    /// Write the table as CSV with a `PC1,...,PCn,Label` header.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(
            self.columns
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(LABEL_COLUMN)),
        )?;
        for row in &self.rows {
            let mut record: Vec<String> = row.scores.iter().map(|v| v.to_string()).collect();
            record.push(row.label.clone());
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        self.write_csv(file)
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote {} score rows to {}", self.len(), path.display());
        Ok(())
    }
}
