use std::collections::{BTreeMap, BTreeSet};

use super::header::{Header, HeaderValue};
use crate::error::{NirError, Result};

// ---------------------------------------------------------------------------
// Approximate equality – the "same grid" test
// ---------------------------------------------------------------------------

/// Relative tolerance of [`approx_eq`].
pub const RELATIVE_TOLERANCE: f64 = 1e-5;
/// Absolute tolerance of [`approx_eq`].
pub const ABSOLUTE_TOLERANCE: f64 = 1e-8;

/// Elementwise approximate equality: `|a - b| <= atol + rtol * |b|` for every
/// pair. Sequences of different length are never equal.
pub fn approx_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b.iter())
            .all(|(&x, &y)| (x - y).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * y.abs())
}

// ---------------------------------------------------------------------------
// Wavelength / Absorbance / Signal – typed value arrays
// ---------------------------------------------------------------------------

macro_rules! value_array {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Vec<f64>);

        impl $name {
            pub fn new(values: Vec<f64>) -> Self {
                Self(values)
            }

            pub fn values(&self) -> &[f64] {
                &self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Smallest value, `None` when empty.
            pub fn min(&self) -> Option<f64> {
                self.0.iter().copied().reduce(f64::min)
            }

            /// Largest value, `None` when empty.
            pub fn max(&self) -> Option<f64> {
                self.0.iter().copied().reduce(f64::max)
            }

            /// See [`approx_eq`].
            pub fn approx_eq(&self, other: &Self) -> bool {
                approx_eq(&self.0, &other.0)
            }

            pub fn into_inner(self) -> Vec<f64> {
                self.0
            }
        }

        impl From<Vec<f64>> for $name {
            fn from(values: Vec<f64>) -> Self {
                Self(values)
            }
        }

        impl From<&[f64]> for $name {
            fn from(values: &[f64]) -> Self {
                Self(values.to_vec())
            }
        }
    };
}

value_array!(
    /// Wavelength axis in nm.
    Wavelength
);
value_array!(
    /// Absorbance values, one per wavelength.
    Absorbance
);
value_array!(
    /// Raw detector signal (reference or sample scan).
    Signal
);

impl Wavelength {
    /// Wavenumbers in cm⁻¹.
    pub fn as_wavenumbers(&self) -> Vec<f64> {
        self.0.iter().map(|&nm| 1e7 / nm).collect()
    }
}

impl Absorbance {
    /// Reflectance `10^-A`.
    pub fn as_reflectance(&self) -> Vec<f64> {
        self.0.iter().map(|&a| 10f64.powf(-a)).collect()
    }

    /// All-zero absorbance on the given axis.
    pub fn zeros_like(wavelength: &Wavelength) -> Self {
        Self(vec![0.0; wavelength.len()])
    }
}

// ---------------------------------------------------------------------------
// Spectrum – axis, absorbance, optional raw signals and header
// ---------------------------------------------------------------------------

/// A single NIR measurement.
///
/// Wavelength and absorbance always have the same length. Axis and data are
/// read-only after construction; the header stays mutable so callers can
/// attach labels such as a sample name.
#[derive(Debug, Clone)]
pub struct Spectrum {
    wavelength: Wavelength,
    absorbance: Absorbance,
    reference_signal: Option<Signal>,
    sample_signal: Option<Signal>,
    pub header: Header,
}

impl Spectrum {
    /// Build a spectrum without raw signals.
    pub fn new(wavelength: Wavelength, absorbance: Absorbance, header: Header) -> Result<Self> {
        Self::with_signals(wavelength, absorbance, None, None, header)
    }

    pub fn with_signals(
        wavelength: Wavelength,
        absorbance: Absorbance,
        reference_signal: Option<Signal>,
        sample_signal: Option<Signal>,
        header: Header,
    ) -> Result<Self> {
        if wavelength.len() != absorbance.len() {
            return Err(NirError::length_mismatch(
                "absorbance vs wavelength",
                wavelength.len(),
                absorbance.len(),
            ));
        }
        Ok(Self {
            wavelength,
            absorbance,
            reference_signal,
            sample_signal,
            header,
        })
    }

    pub fn wavelengths(&self) -> &Wavelength {
        &self.wavelength
    }

    pub fn absorbance(&self) -> &Absorbance {
        &self.absorbance
    }

    pub fn reference_signal(&self) -> Option<&Signal> {
        self.reference_signal.as_ref()
    }

    pub fn sample_signal(&self) -> Option<&Signal> {
        self.sample_signal.as_ref()
    }

    /// Number of wavelength points.
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// True when both spectra sit on the same wavelength grid.
    pub fn same_grid(&self, other: &Spectrum) -> bool {
        self.wavelength.approx_eq(&other.wavelength)
    }

    /// Copy of this spectrum's axis and header around new absorbance values.
    pub(crate) fn with_absorbance(&self, absorbance: Vec<f64>) -> Result<Self> {
        Spectrum::new(
            self.wavelength.clone(),
            Absorbance::new(absorbance),
            self.header.clone(),
        )
    }
}

/// Elementwise mean absorbance of spectra that share one wavelength axis.
///
/// The result takes the first spectrum's axis and has an empty header and
/// no raw signals.
pub fn average(spectra: &[Spectrum]) -> Result<Spectrum> {
    let first = spectra
        .first()
        .ok_or_else(|| NirError::invalid("spectra", 0, "cannot average an empty collection"))?;

    if let Some(pos) = spectra.iter().position(|s| !s.same_grid(first)) {
        log::debug!("spectrum {pos} does not share the first spectrum's wavelength axis");
        return Err(NirError::grid_mismatch("average"));
    }

    let n = spectra.len() as f64;
    let mut mean = vec![0.0; first.len()];
    for spectrum in spectra {
        for (acc, &a) in mean.iter_mut().zip(spectrum.absorbance().values()) {
            *acc += a;
        }
    }
    mean.iter_mut().for_each(|v| *v /= n);

    Spectrum::new(first.wavelength.clone(), Absorbance::new(mean), Header::new())
}

// ---------------------------------------------------------------------------
// SpectralDataset – loaded spectra plus header indices
// ---------------------------------------------------------------------------

/// A loaded collection with pre-computed header columns.
#[derive(Debug, Clone, Default)]
pub struct SpectralDataset {
    pub spectra: Vec<Spectrum>,
    /// Header keys with scalar values, in first-seen order.
    pub column_names: Vec<String>,
    /// For each of those keys the sorted set of values.
    pub unique_values: BTreeMap<String, BTreeSet<HeaderValue>>,
}

impl SpectralDataset {
    /// Index the scalar header values of `spectra`. Coefficient arrays are
    /// left out; nobody filters on them.
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let mut column_names: Vec<String> = Vec::new();
        let mut unique_values: BTreeMap<String, BTreeSet<HeaderValue>> = BTreeMap::new();

        for sp in &spectra {
            for (key, val) in sp.header.iter() {
                if matches!(val, HeaderValue::FloatArray(_)) {
                    continue;
                }
                if !unique_values.contains_key(key) {
                    column_names.push(key.to_string());
                }
                unique_values
                    .entry(key.to_string())
                    .or_default()
                    .insert(val.clone());
            }
        }
        SpectralDataset {
            spectra,
            column_names,
            unique_values,
        }
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spectrum(wl: &[f64], abs: &[f64]) -> Spectrum {
        Spectrum::new(wl.into(), abs.into(), Header::new()).unwrap()
    }

    #[test]
    fn construction_checks_lengths() {
        let ok = Spectrum::new(
            vec![900.0, 901.0].into(),
            vec![0.1, 0.2].into(),
            Header::new(),
        );
        assert_eq!(ok.unwrap().len(), 2);

        let err = Spectrum::new(vec![900.0, 901.0].into(), vec![0.1].into(), Header::new())
            .unwrap_err();
        assert!(matches!(err, NirError::DimensionMismatch(_)));
    }

    #[test]
    fn approx_eq_tolerates_rounding_but_not_shifts() {
        assert!(approx_eq(&[900.0, 1700.0], &[900.0 + 1e-6, 1700.0]));
        assert!(!approx_eq(&[900.0, 1700.0], &[900.5, 1700.0]));
        assert!(!approx_eq(&[900.0], &[900.0, 901.0]));
    }

    #[test]
    fn derived_views() {
        let wl = Wavelength::new(vec![1000.0, 2000.0]);
        assert_eq!(wl.as_wavenumbers(), vec![10_000.0, 5_000.0]);
        assert_eq!(wl.min(), Some(1000.0));
        assert_eq!(wl.max(), Some(2000.0));

        let abs = Absorbance::new(vec![0.0, 1.0, 2.0]);
        let refl = abs.as_reflectance();
        assert_relative_eq!(refl[0], 1.0);
        assert_relative_eq!(refl[1], 0.1);
        assert_relative_eq!(refl[2], 0.01);

        let zeros = Absorbance::zeros_like(&wl);
        assert_eq!(zeros.values(), &[0.0, 0.0]);
    }

    #[test]
    fn clones_are_independent() {
        let mut s = spectrum(&[1.0, 2.0], &[0.5, 0.6]);
        let copy = s.clone();
        s.header.insert("Name", "changed");
        assert!(copy.header.is_empty());
        assert!(copy.absorbance().approx_eq(s.absorbance()));
    }

    #[test]
    fn average_of_one_is_identity() {
        let mut s = spectrum(&[1.0, 2.0, 3.0], &[0.1, 0.4, 0.9]);
        s.header.insert("Name", "x");
        let avg = average(std::slice::from_ref(&s)).unwrap();
        assert!(avg.absorbance().approx_eq(s.absorbance()));
        assert!(avg.header.is_empty());
        assert!(avg.reference_signal().is_none());
    }

    #[test]
    fn average_is_elementwise_mean() {
        let a = spectrum(&[1.0, 2.0], &[1.0, 3.0]);
        let b = spectrum(&[1.0, 2.0], &[3.0, 5.0]);
        let avg = average(&[a, b]).unwrap();
        assert_eq!(avg.absorbance().values(), &[2.0, 4.0]);
        assert_eq!(avg.wavelengths().values(), &[1.0, 2.0]);
    }

    #[test]
    fn average_rejects_mixed_grids_and_empty_input() {
        let a = spectrum(&[1.0, 2.0], &[1.0, 3.0]);
        let b = spectrum(&[1.0, 2.5], &[3.0, 5.0]);
        assert!(matches!(
            average(&[a, b]).unwrap_err(),
            NirError::DimensionMismatch(_)
        ));
        assert!(matches!(
            average(&[]).unwrap_err(),
            NirError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn dataset_indexes_scalar_header_values() {
        let mut a = spectrum(&[1.0], &[0.1]);
        a.header.insert("Group", "apple");
        a.header.insert("Pixel", vec![1.0, 2.0]);
        let mut b = spectrum(&[1.0], &[0.2]);
        b.header.insert("Scan", 2_i64);
        b.header.insert("Group", "pear");

        let ds = SpectralDataset::from_spectra(vec![a, b]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_names, ["Group", "Scan"]);
        assert_eq!(ds.unique_values["Group"].len(), 2);
        assert!(!ds.unique_values.contains_key("Pixel"));
    }
}
