//! Nearest-centroid classification in PCA space.
//!
//! Each labelled group is summarised by its centroid and an acceptance
//! radius. A query belongs plausibly to every group whose centroid is closer
//! than that group's radius.

use std::collections::BTreeMap;

use super::pca::PcaModel;
use super::table::PcaTable;
use crate::data::model::Spectrum;
use crate::error::{NirError, Result};

/// Weight of the spread of member distances in the acceptance radius.
pub const DISTANCE_BUFFER: f64 = 0.25;

/// Number of groups returned by [`nearest_centroids`] by default.
pub const DEFAULT_NEAREST: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Centroid {
    pub label: String,
    pub center: Vec<f64>,
    /// Distance from `center` within which a sample still counts as a member.
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CentroidDistance {
    pub label: String,
    pub distance: f64,
}

/// Centroids of every group, sorted by label.
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidTable {
    columns: Vec<String>,
    centroids: Vec<Centroid>,
}

impl CentroidTable {
    /// Group the rows of `table` by label and summarise each group over the
    /// named score columns.
    ///
    /// The radius of a group is the largest member-to-centroid distance plus
    /// [`DISTANCE_BUFFER`] times the sample standard deviation of those
    /// distances. A single-member group has radius 0.
    pub fn from_table(table: &PcaTable, columns: &[&str]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|c| table.column_index(c))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: BTreeMap<&str, Vec<Vec<f64>>> = BTreeMap::new();
        for row in &table.rows {
            if row.scores.len() != table.columns.len() {
                return Err(NirError::length_mismatch(
                    "score row",
                    table.columns.len(),
                    row.scores.len(),
                ));
            }
            let point = indices.iter().map(|&i| row.scores[i]).collect();
            groups.entry(row.label.as_str()).or_default().push(point);
        }

        let centroids = groups
            .into_iter()
            .map(|(label, members)| summarise(label, &members))
            .collect::<Vec<_>>();
        log::debug!(
            "Built {} centroids over columns {:?}",
            centroids.len(),
            columns
        );

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            centroids,
        })
    }

    /// Build a table from known centroids. Every centre must have one value
    /// per column.
    pub fn from_centroids(columns: Vec<String>, mut centroids: Vec<Centroid>) -> Result<Self> {
        if let Some(bad) = centroids.iter().find(|c| c.center.len() != columns.len()) {
            return Err(NirError::length_mismatch(
                "centroid",
                columns.len(),
                bad.center.len(),
            ));
        }
        centroids.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(Self { columns, centroids })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn get(&self, label: &str) -> Option<&Centroid> {
        self.centroids.iter().find(|c| c.label == label)
    }

    /// Acceptance radius per label.
    pub fn radii(&self) -> BTreeMap<String, f64> {
        self.centroids
            .iter()
            .map(|c| (c.label.clone(), c.radius))
            .collect()
    }

    /// The `n` centroids closest to `point`, nearest first.
    pub fn nearest(&self, point: &[f64], n: usize) -> Result<Vec<CentroidDistance>> {
        if point.len() != self.columns.len() {
            return Err(NirError::length_mismatch(
                "query point",
                self.columns.len(),
                point.len(),
            ));
        }
        let mut distances: Vec<CentroidDistance> = self
            .centroids
            .iter()
            .map(|c| CentroidDistance {
                label: c.label.clone(),
                distance: euclidean(&c.center, point),
            })
            .collect();
        distances.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        distances.truncate(n);
        Ok(distances)
    }
}

fn summarise(label: &str, members: &[Vec<f64>]) -> Centroid {
    let dims = members.first().map_or(0, Vec::len);
    let count = members.len() as f64;
    let center: Vec<f64> = (0..dims)
        .map(|d| members.iter().map(|m| m[d]).sum::<f64>() / count)
        .collect();

    let distances: Vec<f64> = members.iter().map(|m| euclidean(m, &center)).collect();
    let max = distances.iter().copied().fold(0.0, f64::max);
    let radius = max + DISTANCE_BUFFER * sample_std(&distances);

    Centroid {
        label: label.to_string(),
        center,
        radius,
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Standard deviation with divisor n - 1, zero for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Project `spectrum` with `pca` and rank the centroids of `table` by
/// distance, nearest first, keeping at most `n`.
///
/// Only the components the table was built on take part in the distance.
pub fn nearest_centroids(
    spectrum: &Spectrum,
    pca: &PcaModel,
    table: &CentroidTable,
    n: usize,
) -> Result<Vec<CentroidDistance>> {
    let projected = pca.transform_named(spectrum)?;
    let point = table
        .columns()
        .iter()
        .map(|column| {
            projected
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, v)| *v)
                .ok_or_else(|| {
                    NirError::invalid("column", column, "not a component of the PCA model")
                })
        })
        .collect::<Result<Vec<f64>>>()?;
    table.nearest(&point, n)
}

/// Labels whose distance is strictly below their acceptance radius, in the
/// order of `distances`. Labels without a radius are skipped.
pub fn eval_distances(
    distances: &[CentroidDistance],
    radii: &BTreeMap<String, f64>,
) -> Vec<String> {
    distances
        .iter()
        .filter(|d| {
            radii
                .get(&d.label)
                .is_some_and(|radius| d.distance - radius < 0.0)
        })
        .map(|d| d.label.clone())
        .collect()
}
