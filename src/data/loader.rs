use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::Value as JsonValue;

use super::header::{Header, HeaderValue};
use super::model::{Absorbance, Signal, Spectrum, Wavelength};

/// Header keys with one of these prefixes hold calibration coefficient arrays.
const ARRAY_KEY_PREFIXES: [&str; 2] = ["Pixel", "Shift"];

/// Column header written by [`write_spectrum`].
const DATA_COLUMNS: &str =
    "Wavelength (nm),Absorbance (AU),Reference Signal (unitless),Sample Signal (unitless)";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Layout of an instrument export.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderOptions {
    /// Number of `key: value` lines before the column header line.
    pub header_lines: usize,
    /// Separator between a header key and its values.
    pub delimiter: char,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            header_lines: 19,
            delimiter: ',',
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load spectra from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / `.dat` – a single instrument export
/// * `.json` – `[{ "wavelength": [...], "absorbance": [...], ...meta }, ...]`
pub fn load_file(path: &Path) -> Result<Vec<Spectrum>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" | "dat" => Ok(vec![read_spectrum(path, &ReaderOptions::default())?]),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Instrument export
// ---------------------------------------------------------------------------

/// Read one instrument export.
///
/// Layout: `options.header_lines` lines of `key: value[,value...]`, one
/// column header line, then rows of wavelength, absorbance, reference signal
/// and sample signal separated by commas and/or whitespace.
pub fn read_spectrum(path: &Path, options: &ReaderOptions) -> Result<Spectrum> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spectrum = parse_spectrum(BufReader::new(file), options)
        .with_context(|| format!("parsing {}", path.display()))?;
    log::debug!(
        "Read {} with {} points and {} header keys",
        path.display(),
        spectrum.len(),
        spectrum.header.len()
    );
    Ok(spectrum)
}

/// Parse an instrument export from any buffered source.
pub fn parse_spectrum<R: BufRead>(reader: R, options: &ReaderOptions) -> Result<Spectrum> {
    let mut lines = reader.lines().enumerate();

    let mut header = Header::new();
    for _ in 0..options.header_lines {
        let (line_no, line) = lines
            .next()
            .context("file ended inside the header block")?;
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        // Blank lines pad a header with fewer keys than `header_lines`.
        if line.trim().is_empty() {
            continue;
        }
        if is_data_row(&line) {
            bail!(
                "line {}: data row inside the header block, expected {} header lines",
                line_no + 1,
                options.header_lines
            );
        }
        let (key, value) = parse_header_line(&line, options.delimiter)
            .with_context(|| format!("header line {}", line_no + 1))?;
        header.insert(key, value);
    }

    let (line_no, column_names) = lines.next().context("missing column header line")?;
    let column_names = column_names.with_context(|| format!("reading line {}", line_no + 1))?;
    if is_data_row(&column_names) {
        bail!(
            "line {}: expected the column header line, found a data row",
            line_no + 1
        );
    }

    let mut wavelength = Vec::new();
    let mut absorbance = Vec::new();
    let mut reference = Vec::new();
    let mut sample = Vec::new();

    for (line_no, line) in lines {
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        let fields = split_row(&line);
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 4 {
            bail!(
                "line {}: expected 4 columns, found {}",
                line_no + 1,
                fields.len()
            );
        }
        let mut row = [0.0; 4];
        for (slot, field) in row.iter_mut().zip(&fields) {
            *slot = field
                .parse::<f64>()
                .with_context(|| format!("line {}: '{field}' is not a number", line_no + 1))?;
        }
        wavelength.push(row[0]);
        absorbance.push(row[1]);
        reference.push(row[2]);
        sample.push(row[3]);
    }

    let spectrum = Spectrum::with_signals(
        Wavelength::new(wavelength),
        Absorbance::new(absorbance),
        Some(Signal::new(reference)),
        Some(Signal::new(sample)),
        header,
    )?;
    Ok(spectrum)
}

fn split_row(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty())
        .collect()
}

/// A line whose fields are all numbers belongs to the data block.
fn is_data_row(line: &str) -> bool {
    let fields = split_row(line);
    !fields.is_empty() && fields.iter().all(|f| f.parse::<f64>().is_ok())
}

fn parse_header_line(line: &str, delimiter: char) -> Result<(String, HeaderValue)> {
    let mut parts = line.split(delimiter);
    let key = parts.next().unwrap_or("").trim().replace(':', "");
    if key.is_empty() {
        bail!("empty header key in '{line}'");
    }
    let values: Vec<&str> = parts.map(str::trim).filter(|v| !v.is_empty()).collect();

    let value = if ARRAY_KEY_PREFIXES.iter().any(|p| key.starts_with(p)) {
        let floats = values
            .iter()
            .map(|v| {
                v.parse::<f64>()
                    .with_context(|| format!("{key}: '{v}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;
        HeaderValue::FloatArray(floats)
    } else {
        HeaderValue::from_scalar(values.first().copied().unwrap_or(""))
    };
    Ok((key, value))
}

/// Write a spectrum in the instrument export layout read by [`read_spectrum`]
/// with the same `options`.
///
/// The header block is padded with blank lines to `options.header_lines`;
/// a header with more keys than that, or a scalar value containing the
/// delimiter, cannot be read back and is rejected. Float scalars are written
/// with a decimal point and read back as strings. Missing raw signals are
/// written as zeros.
pub fn write_spectrum(path: &Path, spectrum: &Spectrum, options: &ReaderOptions) -> Result<()> {
    let header = &spectrum.header;
    if header.len() > options.header_lines {
        bail!(
            "header has {} keys but the export layout holds {}",
            header.len(),
            options.header_lines
        );
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let delim = options.delimiter;

    for (key, value) in header.iter() {
        let line = match value {
            HeaderValue::FloatArray(values) => {
                let fields: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                fields.join(delim.to_string().as_str())
            }
            scalar => {
                let text = scalar.to_string();
                if text.contains(delim) {
                    bail!("header value of '{key}' contains the delimiter '{delim}'");
                }
                text
            }
        };
        writeln!(out, "{key}:{delim}{line}")?;
    }
    for _ in header.len()..options.header_lines {
        writeln!(out)?;
    }
    writeln!(out, "{DATA_COLUMNS}")?;

    let zeros = vec![0.0; spectrum.len()];
    let reference = spectrum.reference_signal().map_or(&zeros[..], |s| s.values());
    let sample = spectrum.sample_signal().map_or(&zeros[..], |s| s.values());

    for i in 0..spectrum.len() {
        writeln!(
            out,
            "{},{},{},{}",
            spectrum.wavelengths().values()[i],
            spectrum.absorbance().values()[i],
            reference[i],
            sample[i]
        )?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    log::debug!(
        "Wrote {} with {} points and {} header keys",
        path.display(),
        spectrum.len(),
        header.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "wavelength": [901.2, 904.9, ...],
///     "absorbance": [0.31,  0.33,  ...],
///     "Name": "apple-1",
///     "Group": "apple"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub(crate) fn parse_json(text: &str) -> Result<Vec<Spectrum>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let wavelength = json_array_to_f64(obj.get("wavelength"), i, "wavelength")?;
        let absorbance = json_array_to_f64(obj.get("absorbance"), i, "absorbance")?;

        let mut header = Header::new();
        for (key, val) in obj {
            if key == "wavelength" || key == "absorbance" {
                continue;
            }
            header.insert(key.clone(), json_to_header(val));
        }

        let spectrum = Spectrum::new(wavelength.into(), absorbance.into(), header)
            .with_context(|| format!("Row {i}"))?;
        spectra.push(spectrum);
    }

    log::info!("Parsed {} spectra from JSON", spectra.len());
    Ok(spectra)
}

/// One record of a JSON collection; header keys sit next to the arrays.
#[derive(Serialize)]
struct JsonRecord<'a> {
    wavelength: &'a [f64],
    absorbance: &'a [f64],
    #[serde(flatten)]
    header: &'a Header,
}

/// Write spectra as a JSON collection readable by [`load_file`]. Header
/// values keep their type, unlike in the instrument export.
pub fn write_json(path: &Path, spectra: &[Spectrum]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let records: Vec<JsonRecord<'_>> = spectra
        .iter()
        .map(|s| JsonRecord {
            wavelength: s.wavelengths().values(),
            absorbance: s.absorbance().values(),
            header: &s.header,
        })
        .collect();
    serde_json::to_writer_pretty(BufWriter::new(file), &records)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {} spectra to {}", spectra.len(), path.display());
    Ok(())
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_header(val: &JsonValue) -> HeaderValue {
    match val {
        JsonValue::String(s) => HeaderValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                HeaderValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                HeaderValue::Float(f)
            } else {
                HeaderValue::String(n.to_string())
            }
        }
        JsonValue::Array(items) => {
            let floats: Option<Vec<f64>> = items.iter().map(JsonValue::as_f64).collect();
            match floats {
                Some(values) => HeaderValue::FloatArray(values),
                None => HeaderValue::String(val.to_string()),
            }
        }
        JsonValue::Null => HeaderValue::String(String::new()),
        other => HeaderValue::String(other.to_string()),
    }
}
