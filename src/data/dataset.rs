use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::StringRecord;
use rand::seq::SliceRandom;

use super::loader::{ReaderOptions, read_spectrum};
use super::model::Spectrum;

/// Header key that receives the sample name from the index.
pub const NAME_KEY: &str = "Name";

// ---------------------------------------------------------------------------
// DatasetOptions
// ---------------------------------------------------------------------------

/// How a dataset index file is laid out.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub delimiter: u8,
    /// Load every referenced instrument export.
    pub read_spectra: bool,
    /// Copy the name column into each spectrum's header under [`NAME_KEY`].
    pub copy_name: bool,
    pub name_column: String,
    pub file_column: String,
    pub reader: ReaderOptions,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            read_spectra: true,
            copy_name: true,
            name_column: "Name".to_string(),
            file_column: "File".to_string(),
            reader: ReaderOptions::default(),
        }
    }
}

/// Sniff whether `path` is a dataset index rather than an instrument export:
/// its first line must split on the index delimiter into columns that
/// include the file column.
pub fn looks_like_index(path: &Path, options: &DatasetOptions) -> bool {
    let Ok(text) = std::fs::read_to_string(path) else {
        return false;
    };
    let first = text.lines().next().unwrap_or("");
    first
        .split(options.delimiter as char)
        .any(|c| c.trim() == options.file_column)
}

// ---------------------------------------------------------------------------
// DataReader – a delimited index of instrument exports
// ---------------------------------------------------------------------------

/// A dataset described by an index file with one row per measurement, e.g.
///
/// ```text
/// File;Name;Group
/// apple_01.csv;apple 1;apple
/// pear_01.csv;pear 1;pear
/// ```
///
/// File paths are resolved against the index file's directory.
#[derive(Debug, Clone)]
pub struct DataReader {
    columns: Vec<String>,
    rows: Vec<StringRecord>,
    /// One entry per row when spectra were read, empty otherwise.
    spectra: Vec<Spectrum>,
    root: PathBuf,
}

impl DataReader {
    pub fn open(index: &Path) -> Result<Self> {
        Self::open_with(index, &DatasetOptions::default())
    }

    pub fn open_with(index: &Path, options: &DatasetOptions) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .trim(csv::Trim::All)
            .from_path(index)
            .with_context(|| format!("opening index {}", index.display()))?;

        let columns: Vec<String> = reader
            .headers()
            .context("reading index headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let rows = reader
            .records()
            .enumerate()
            .map(|(row_no, r)| r.with_context(|| format!("index row {row_no}")))
            .collect::<Result<Vec<_>>>()?;

        let root = index
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut dataset = DataReader {
            columns,
            rows,
            spectra: Vec::new(),
            root,
        };

        if options.read_spectra {
            dataset.read_spectra(options)?;
        }

        log::info!(
            "Loaded index {} with {} rows and columns {:?}",
            index.display(),
            dataset.rows.len(),
            dataset.columns
        );
        Ok(dataset)
    }

    fn read_spectra(&mut self, options: &DatasetOptions) -> Result<()> {
        let file_idx = self.column_index(&options.file_column)?;
        let name_idx = if options.copy_name {
            Some(self.column_index(&options.name_column)?)
        } else {
            None
        };

        let mut spectra = Vec::with_capacity(self.rows.len());
        for (row_no, row) in self.rows.iter().enumerate() {
            let file = row.get(file_idx).unwrap_or("");
            if file.is_empty() {
                bail!("index row {row_no}: empty '{}' value", options.file_column);
            }
            let path = self.root.join(file);
            let mut spectrum = read_spectrum(&path, &options.reader)
                .with_context(|| format!("index row {row_no}"))?;

            if let Some(idx) = name_idx {
                let name = row.get(idx).unwrap_or("");
                spectrum.header.insert(NAME_KEY, name);
            }
            spectra.push(spectrum);
        }
        self.spectra = spectra;
        Ok(())
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .with_context(|| format!("index has no '{name}' column"))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one index column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r.get(idx).unwrap_or("")).collect())
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn into_spectra(self) -> Vec<Spectrum> {
        self.spectra
    }

    /// Spectra whose `group_column` value equals `key`.
    pub fn spectra_by_group(&self, key: &str, group_column: &str) -> Result<Vec<&Spectrum>> {
        let idx = self.column_index(group_column)?;
        Ok(self
            .rows
            .iter()
            .zip(&self.spectra)
            .filter(|(row, _)| row.get(idx) == Some(key))
            .map(|(_, s)| s)
            .collect())
    }

    /// One spectrum chosen uniformly at random, `None` when nothing was read.
    pub fn random_sample(&self) -> Option<&Spectrum> {
        self.spectra.choose(&mut rand::thread_rng())
    }
}
