//! Principal component analysis over a collection of spectra.

use nalgebra::{DMatrix, DVector};

use crate::data::model::Spectrum;
use crate::error::{NirError, Result};

/// Component count used when none is given.
pub const DEFAULT_COMPONENTS: usize = 5;

/// PCA model over a fixed collection of spectra.
///
/// The model is created unfitted; [`PcaModel::run`] fits it (and may be
/// called again to refit), after which [`PcaModel::transform`] projects any
/// spectrum on the same grid into component space.
#[derive(Debug, Clone)]
pub struct PcaModel {
    spectra: Vec<Spectrum>,
    n_components: usize,
    fit: Option<PcaFit>,
}

#[derive(Debug, Clone)]
struct PcaFit {
    /// Per-wavelength mean of the fitted spectra.
    mean: DVector<f64>,
    /// One loading vector per row, components × wavelengths.
    loadings: DMatrix<f64>,
    /// Fitted coordinates, components × samples.
    scores: DMatrix<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl PcaModel {
    pub fn new(spectra: Vec<Spectrum>, n_components: usize) -> Self {
        Self {
            spectra,
            n_components,
            fit: None,
        }
    }

    pub fn with_default_components(spectra: Vec<Spectrum>) -> Self {
        Self::new(spectra, DEFAULT_COMPONENTS)
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// `["PC1", ..., "PCn"]`.
    pub fn column_names(&self) -> Vec<String> {
        (1..=self.n_components).map(|i| format!("PC{i}")).collect()
    }

    /// The spectra the model is fitted on, in sample order.
    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }

    /// Fit the model on its spectra.
    ///
    /// All spectra must share the first spectrum's wavelength axis. The
    /// absorbance matrix (samples × wavelengths) is mean-centred and
    /// decomposed by SVD. Each retained loading is signed so that its
    /// largest-magnitude entry is positive, which makes refits reproducible.
    pub fn run(&mut self) -> Result<()> {
        let first = self
            .spectra
            .first()
            .ok_or_else(|| NirError::invalid("spectra", 0, "PCA needs at least one spectrum"))?;
        if let Some(pos) = self.spectra.iter().position(|s| !s.same_grid(first)) {
            log::debug!("spectrum {pos} does not share the first spectrum's wavelength axis");
            return Err(NirError::grid_mismatch("PCA input"));
        }

        let m = self.spectra.len();
        let n = first.len();
        let k = self.n_components;
        if k == 0 || k > m.min(n) {
            return Err(NirError::invalid(
                "n_components",
                k,
                format!("must be between 1 and min(samples, wavelengths) = {}", m.min(n)),
            ));
        }

        let data = DMatrix::from_fn(m, n, |i, j| self.spectra[i].absorbance().values()[j]);
        let mean = DVector::from_fn(n, |j, _| data.column(j).mean());
        let centered = DMatrix::from_fn(m, n, |i, j| data[(i, j)] - mean[j]);

        let svd = centered.clone().svd(false, true);
        let v_t = svd.v_t.ok_or_else(|| {
            NirError::invalid("spectra", m, "decomposition produced no right singular vectors")
        })?;
        let singular = svd.singular_values;

        let mut order: Vec<usize> = (0..singular.len()).collect();
        order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

        let mut loadings = DMatrix::<f64>::zeros(k, n);
        for (c, &idx) in order.iter().take(k).enumerate() {
            let mut row = v_t.row(idx).clone_owned();
            if row[largest_magnitude(row.iter())] < 0.0 {
                row.neg_mut();
            }
            loadings.set_row(c, &row);
        }

        let scores = &loadings * centered.transpose();

        let total: f64 = singular.iter().map(|s| s * s).sum();
        let explained_variance_ratio = order
            .iter()
            .take(k)
            .map(|&idx| {
                if total > 0.0 {
                    singular[idx].powi(2) / total
                } else {
                    0.0
                }
            })
            .collect();

        log::info!("Fitted PCA with {k} components on {m} spectra × {n} wavelengths");
        self.fit = Some(PcaFit {
            mean,
            loadings,
            scores,
            explained_variance_ratio,
        });
        Ok(())
    }

    fn fitted(&self) -> Result<&PcaFit> {
        self.fit.as_ref().ok_or(NirError::NotFitted)
    }

    /// Fitted coordinates, components × samples.
    pub fn scores(&self) -> Result<&DMatrix<f64>> {
        Ok(&self.fitted()?.scores)
    }

    /// Loading vectors, components × wavelengths.
    pub fn loadings(&self) -> Result<&DMatrix<f64>> {
        Ok(&self.fitted()?.loadings)
    }

    /// Share of the total variance carried by each retained component.
    pub fn explained_variance_ratio(&self) -> Result<&[f64]> {
        Ok(&self.fitted()?.explained_variance_ratio)
    }

    /// Project a spectrum into component space, one value per component.
    ///
    /// Only the number of points is checked against the fitted spectra, not
    /// the wavelength values themselves.
    pub fn transform(&self, spectrum: &Spectrum) -> Result<Vec<f64>> {
        let fit = self.fitted()?;
        let values = spectrum.absorbance().values();
        if values.len() != fit.mean.len() {
            return Err(NirError::length_mismatch(
                "PCA transform input",
                fit.mean.len(),
                values.len(),
            ));
        }
        let centered = DVector::from_fn(values.len(), |j, _| values[j] - fit.mean[j]);
        Ok((&fit.loadings * centered).iter().copied().collect())
    }

    /// [`PcaModel::transform`] labelled with [`PcaModel::column_names`].
    pub fn transform_named(&self, spectrum: &Spectrum) -> Result<Vec<(String, f64)>> {
        let projected = self.transform(spectrum)?;
        Ok(self.column_names().into_iter().zip(projected).collect())
    }
}

/// Position of the entry with the largest absolute value.
fn largest_magnitude<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    values
        .enumerate()
        .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::header::Header;
    use approx::assert_relative_eq;

    const GRID: [f64; 6] = [900.0, 950.0, 1000.0, 1050.0, 1100.0, 1150.0];

    fn spectrum(values: [f64; 6]) -> Spectrum {
        Spectrum::new(GRID.to_vec().into(), values.to_vec().into(), Header::new()).unwrap()
    }

    fn collection() -> Vec<Spectrum> {
        vec![
            spectrum([0.1, 0.3, 0.5, 0.4, 0.2, 0.1]),
            spectrum([0.2, 0.5, 0.9, 0.7, 0.3, 0.2]),
            spectrum([0.1, 0.2, 0.3, 0.6, 0.8, 0.4]),
            spectrum([0.3, 0.3, 0.4, 0.9, 1.2, 0.6]),
            spectrum([0.2, 0.4, 0.6, 0.5, 0.5, 0.3]),
        ]
    }

    #[test]
    fn accessors_before_fit() {
        let pca = PcaModel::new(collection(), 3);
        assert_eq!(pca.n_components(), 3);
        assert_eq!(pca.column_names(), ["PC1", "PC2", "PC3"]);
        assert!(!pca.is_fitted());
        assert_eq!(pca.scores().unwrap_err(), NirError::NotFitted);
        assert_eq!(
            pca.transform(&collection()[0]).unwrap_err(),
            NirError::NotFitted
        );
    }

    #[test]
    fn scores_are_components_by_samples() {
        let mut pca = PcaModel::new(collection(), 2);
        pca.run().unwrap();
        let scores = pca.scores().unwrap();
        assert_eq!(scores.shape(), (2, 5));
        assert_eq!(pca.loadings().unwrap().shape(), (2, 6));

        // Centred data gives zero-mean scores.
        for c in 0..2 {
            assert_relative_eq!(scores.row(c).sum(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn transform_reproduces_fitted_scores() {
        let spectra = collection();
        let mut pca = PcaModel::new(spectra.clone(), 3);
        pca.run().unwrap();
        let scores = pca.scores().unwrap();
        for (i, s) in spectra.iter().enumerate() {
            let projected = pca.transform(s).unwrap();
            for c in 0..3 {
                assert_relative_eq!(projected[c], scores[(c, i)], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn loadings_are_orthonormal_and_signed() {
        let mut pca = PcaModel::new(collection(), 3);
        pca.run().unwrap();
        let loadings = pca.loadings().unwrap();
        let gram = loadings * loadings.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(gram[(i, j)], expected, epsilon = 1e-10);
            }
            let row = loadings.row(i);
            assert!(row[largest_magnitude(row.iter())] > 0.0);
        }
    }

    #[test]
    fn explained_variance_is_sorted_and_complete() {
        let mut pca = PcaModel::new(collection(), 5);
        pca.run().unwrap();
        let ratio = pca.explained_variance_ratio().unwrap();
        assert!(ratio.windows(2).all(|w| w[0] >= w[1]));
        // Five centred samples have rank at most four, so five components
        // hold everything.
        assert_relative_eq!(ratio.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn refit_is_deterministic() {
        let mut pca = PcaModel::new(collection(), 2);
        pca.run().unwrap();
        let first = pca.scores().unwrap().clone();
        pca.run().unwrap();
        assert_relative_eq!(*pca.scores().unwrap(), first, epsilon = 1e-12);
    }

    #[test]
    fn rejects_mixed_grids() {
        let mut spectra = collection();
        spectra.push(
            Spectrum::new(
                vec![900.0, 950.0, 1000.0, 1050.0, 1100.0, 1160.0].into(),
                vec![0.0; 6].into(),
                Header::new(),
            )
            .unwrap(),
        );
        let mut pca = PcaModel::new(spectra, 2);
        assert!(matches!(
            pca.run().unwrap_err(),
            NirError::DimensionMismatch(_)
        ));
        assert!(!pca.is_fitted());
    }

    #[test]
    fn rejects_bad_component_counts() {
        for k in [0, 6] {
            let mut pca = PcaModel::new(collection(), k);
            assert!(matches!(
                pca.run().unwrap_err(),
                NirError::InvalidParameter { .. }
            ));
        }
        let mut empty = PcaModel::new(Vec::new(), 1);
        assert!(empty.run().is_err());
    }

    #[test]
    fn transform_checks_feature_count() {
        let mut pca = PcaModel::new(collection(), 2);
        pca.run().unwrap();
        let short = Spectrum::new(vec![1.0, 2.0].into(), vec![0.1, 0.2].into(), Header::new())
            .unwrap();
        assert!(matches!(
            pca.transform(&short).unwrap_err(),
            NirError::DimensionMismatch(_)
        ));
    }

    #[test]
    fn named_projection_uses_column_names() {
        let mut pca = PcaModel::new(collection(), 2);
        pca.run().unwrap();
        let named = pca.transform_named(&collection()[1]).unwrap();
        assert_eq!(named[0].0, "PC1");
        assert_eq!(named[1].0, "PC2");
    }
}
