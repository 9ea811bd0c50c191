//! Spectrum-to-spectrum preprocessing.
//!
//! Every transform returns a new [`Spectrum`] carrying a copy of the input's
//! wavelength axis and header; the input is never modified.

use nalgebra::{DMatrix, DVector};

use crate::data::model::Spectrum;
use crate::error::{NirError, Result};

/// Singular values below this are treated as zero when solving the
/// Savitzky-Golay least-squares problem.
const PINV_EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Standard normal variate
// ---------------------------------------------------------------------------

/// Standard normal variate: `(a - mean) / std` with the population standard
/// deviation. With `norm` set the mean is taken as zero, so the spectrum is
/// only scaled.
///
/// A constant spectrum has zero deviation and comes out as NaN/inf values.
pub fn snv(spectrum: &Spectrum, norm: bool) -> Result<Spectrum> {
    let data = spectrum.absorbance().values();
    let (mean, std) = mean_std(data);
    if std == 0.0 {
        log::warn!("SNV on a spectrum with zero variance, output is not finite");
    }
    let center = if norm { 0.0 } else { mean };
    log::debug!("snv: n={}, mean={mean}, std={std}, norm={norm}", data.len());

    spectrum.with_absorbance(data.iter().map(|&a| (a - center) / std).collect())
}

fn mean_std(data: &[f64]) -> (f64, f64) {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let var = data.iter().map(|&a| (a - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

// ---------------------------------------------------------------------------
// Savitzky-Golay
// ---------------------------------------------------------------------------

/// Savitzky-Golay smoothing or differentiation.
///
/// A polynomial of degree `order` is least-squares fitted over a sliding
/// window of `window` samples and evaluated (or differentiated `deriv` times)
/// at the window centre. The first and last `window / 2` samples are taken
/// from a single polynomial fitted to the first and last full window.
/// Sample spacing is 1.
pub fn savgol(spectrum: &Spectrum, window: usize, order: usize, deriv: usize) -> Result<Spectrum> {
    let data = spectrum.absorbance().values();
    let smoothed = savgol_filter(data, window, order, deriv)?;
    spectrum.with_absorbance(smoothed)
}

/// [`savgol`] on a bare slice.
pub fn savgol_filter(data: &[f64], window: usize, order: usize, deriv: usize) -> Result<Vec<f64>> {
    if window % 2 == 0 {
        return Err(NirError::invalid("window", window, "must be odd"));
    }
    if order >= window {
        return Err(NirError::invalid(
            "order",
            order,
            format!("must be less than the window length {window}"),
        ));
    }
    if window > data.len() {
        return Err(NirError::invalid(
            "window",
            window,
            format!("exceeds the spectrum length {}", data.len()),
        ));
    }

    let n = data.len();
    if deriv > order {
        return Ok(vec![0.0; n]);
    }
    log::debug!("savgol: n={n}, window={window}, order={order}, deriv={deriv}");

    let fit = LocalFit::new(window, order)?;
    let half = window / 2;
    let mut out = vec![0.0; n];

    let centre = fit.weights(0.0, deriv);
    for i in half..n - half {
        out[i] = dot(&centre, &data[i - half..=i + half]);
    }

    // Edges: evaluate the polynomial of the first/last full window off-centre.
    let head = &data[..window];
    let tail = &data[n - window..];
    for k in 0..half {
        let left = fit.weights(k as f64 - half as f64, deriv);
        out[k] = dot(&left, head);

        let right = fit.weights((k + 1) as f64, deriv);
        out[n - half + k] = dot(&right, tail);
    }

    Ok(out)
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

/// Least-squares polynomial fit over one window of equally spaced samples.
///
/// Positions are centred on the window and scaled into [-1, 1] to keep the
/// Vandermonde matrix well conditioned.
struct LocalFit {
    order: usize,
    scale: f64,
    /// Maps window samples to polynomial coefficients, (order + 1) × window.
    pinv: DMatrix<f64>,
}

impl LocalFit {
    fn new(window: usize, order: usize) -> Result<Self> {
        let half = (window / 2) as f64;
        let scale = half.max(1.0);
        let vandermonde = DMatrix::from_fn(window, order + 1, |i, j| {
            ((i as f64 - half) / scale).powi(j as i32)
        });
        let pinv = vandermonde
            .pseudo_inverse(PINV_EPSILON)
            .map_err(|e| NirError::invalid("order", order, e))?;
        Ok(Self { order, scale, pinv })
    }

    /// Filter weights for the `deriv`-th derivative at offset `x` from the
    /// window centre.
    fn weights(&self, x: f64, deriv: usize) -> Vec<f64> {
        let t = x / self.scale;
        let basis = DVector::from_fn(self.order + 1, |j, _| {
            if j < deriv {
                0.0
            } else {
                let falling: f64 = ((j - deriv + 1)..=j).map(|f| f as f64).product();
                falling * t.powi((j - deriv) as i32)
            }
        });
        let row = self.pinv.tr_mul(&basis);
        let chain = self.scale.powi(deriv as i32);
        row.iter().map(|w| w / chain).collect()
    }
}

// ---------------------------------------------------------------------------
// Multiplicative scatter correction
// ---------------------------------------------------------------------------

/// Multiplicative scatter correction against a reference spectrum.
///
/// Fits `a = slope * ref + intercept` by least squares and returns
/// `(a - intercept) / slope`. Both spectra must share one wavelength axis.
pub fn msc(spectrum: &Spectrum, reference: &Spectrum) -> Result<Spectrum> {
    if !spectrum.same_grid(reference) {
        return Err(NirError::grid_mismatch("msc"));
    }
    let data = spectrum.absorbance().values();
    let (slope, intercept) = linear_fit(reference.absorbance().values(), data)?;
    log::debug!("msc: slope={slope}, intercept={intercept}");

    spectrum.with_absorbance(data.iter().map(|&a| (a - intercept) / slope).collect())
}

/// Ordinary least-squares line through `(x, y)`.
fn linear_fit(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|&xi| (xi - mean_x).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
        .sum();

    if !(sxx > 0.0) {
        return Err(NirError::invalid(
            "reference",
            "constant",
            "reference absorbance has no variance to regress against",
        ));
    }
    let slope = sxy / sxx;
    Ok((slope, mean_y - slope * mean_x))
}
