use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use nirscan::data::dataset::looks_like_index;
use nirscan::{
    Absorbance, CentroidTable, DataReader, DatasetOptions, Header, HeaderValue, PcaModel,
    PcaTable, ReaderOptions, Signal, Spectrum, Wavelength, average, eval_distances, load_file,
    nearest_centroids, read_spectrum, snv, write_spectrum,
};

const GROUPS: [(&str, f64); 3] = [("apple", 1000.0), ("pear", 1200.0), ("banana", 1400.0)];
const REPLICATES: usize = 4;
const HEADER_LINES: usize = 3;

fn grid() -> Vec<f64> {
    (0..60).map(|i| 900.0 + 10.0 * i as f64).collect()
}

fn measurement(group: &str, peak: f64, replicate: usize) -> Spectrum {
    let wl = grid();
    let r = replicate as f64;
    let absorbance: Vec<f64> = wl
        .iter()
        .map(|&x| {
            let band = (-(x - peak).powi(2) / (2.0 * 60.0f64.powi(2))).exp();
            0.2 + band + 0.01 * (r * x / 70.0).sin()
        })
        .collect();
    let reference = vec![1000.0; wl.len()];
    let sample = absorbance
        .iter()
        .map(|a| 1000.0 * 10f64.powf(-a))
        .collect();

    let mut header = Header::new();
    header.insert("Method", "Column 1");
    header.insert("Pixel to Wavelength Coefficients", vec![1.7e3, -2.9, -1.6e-3]);
    header.insert("Group", group);

    Spectrum::with_signals(
        Wavelength::new(wl),
        Absorbance::new(absorbance),
        Some(Signal::new(reference)),
        Some(Signal::new(sample)),
        header,
    )
    .unwrap()
}

fn layout() -> ReaderOptions {
    ReaderOptions {
        header_lines: HEADER_LINES,
        ..Default::default()
    }
}

fn options() -> DatasetOptions {
    DatasetOptions {
        reader: layout(),
        ..Default::default()
    }
}

/// Write every measurement plus a `File;Name;Group` index into `dir`.
fn write_dataset(dir: &Path) {
    let mut index = String::from("File;Name;Group\n");
    for (group, peak) in GROUPS {
        for replicate in 1..=REPLICATES {
            let file = format!("{group}_{replicate}.csv");
            write_spectrum(&dir.join(&file), &measurement(group, peak, replicate), &layout())
                .unwrap();
            index.push_str(&format!("{file};{group} {replicate};{group}\n"));
        }
    }
    fs::write(dir.join("index.csv"), index).unwrap();
}

#[test]
fn written_export_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("apple.csv");
    let original = measurement("apple", 1000.0, 1);
    write_spectrum(&path, &original, &layout()).unwrap();

    let read = read_spectrum(&path, &layout()).unwrap();

    assert!(read.wavelengths().approx_eq(original.wavelengths()));
    assert!(read.absorbance().approx_eq(original.absorbance()));
    assert!(read.sample_signal().unwrap().approx_eq(original.sample_signal().unwrap()));
    assert_eq!(
        read.header.get("Pixel to Wavelength Coefficients"),
        Some(&HeaderValue::FloatArray(vec![1.7e3, -2.9, -1.6e-3]))
    );
    assert_eq!(read.header.get("Group"), Some(&HeaderValue::from("apple")));
    let keys: Vec<&str> = read.header.keys().collect();
    assert_eq!(keys, ["Method", "Pixel to Wavelength Coefficients", "Group"]);
}

#[test]
fn averaged_spectrum_without_header_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mean.csv");
    let replicates: Vec<Spectrum> = (1..=3).map(|r| measurement("apple", 1000.0, r)).collect();
    let mean = average(&replicates).unwrap();
    assert!(mean.header.is_empty());

    let defaults = ReaderOptions::default();
    write_spectrum(&path, &mean, &defaults).unwrap();
    let read = read_spectrum(&path, &defaults).unwrap();

    assert_eq!(read.len(), mean.len());
    assert!(read.header.is_empty());
    assert!(read.wavelengths().approx_eq(mean.wavelengths()));
    assert!(read.absorbance().approx_eq(mean.absorbance()));
}

#[test]
fn export_read_with_a_longer_header_layout_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.csv");
    write_spectrum(&path, &measurement("pear", 1200.0, 1), &layout()).unwrap();

    assert!(read_spectrum(&path, &ReaderOptions::default()).is_err());
}

#[test]
fn index_is_told_apart_from_exports() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());

    assert!(looks_like_index(&dir.path().join("index.csv"), &options()));
    assert!(!looks_like_index(&dir.path().join("pear_1.csv"), &options()));
}

#[test]
fn reader_resolves_files_and_copies_names() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());

    let data = DataReader::open_with(&dir.path().join("index.csv"), &options()).unwrap();
    assert_eq!(data.len(), GROUPS.len() * REPLICATES);
    assert_eq!(data.columns(), ["File", "Name", "Group"]);

    let first = &data.spectra()[0];
    assert_eq!(first.header.get("Name"), Some(&HeaderValue::from("apple 1")));

    let pears = data.spectra_by_group("pear", "Group").unwrap();
    assert_eq!(pears.len(), REPLICATES);
    assert!(pears
        .iter()
        .all(|s| s.header.get("Group") == Some(&HeaderValue::from("pear"))));

    assert!(data.random_sample().is_some());
}

#[test]
fn query_from_a_group_ranks_that_group_first() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let data = DataReader::open_with(&dir.path().join("index.csv"), &options()).unwrap();

    let spectra = data
        .spectra()
        .iter()
        .map(|s| snv(s, false))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let query = spectra[REPLICATES + 1].clone();

    let mut pca = PcaModel::new(spectra, 3);
    pca.run().unwrap();
    let ratios = pca.explained_variance_ratio().unwrap();
    assert!(ratios.windows(2).all(|w| w[0] >= w[1]));

    let scores = PcaTable::from_model(&pca, Some("Group")).unwrap();
    assert_eq!(scores.len(), GROUPS.len() * REPLICATES);

    let centroids = CentroidTable::from_table(&scores, &["PC1", "PC2", "PC3"]).unwrap();
    assert_eq!(centroids.centroids().len(), GROUPS.len());

    let ranked = nearest_centroids(&query, &pca, &centroids, 5).unwrap();
    assert_eq!(ranked.len(), GROUPS.len());
    assert_eq!(ranked[0].label, "pear");
    assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));

    let accepted = eval_distances(&ranked, &centroids.radii());
    assert_eq!(accepted.first().map(String::as_str), Some("pear"));
}

#[test]
fn projection_of_a_training_spectrum_matches_its_scores() {
    let spectra: Vec<Spectrum> = GROUPS
        .iter()
        .flat_map(|&(group, peak)| (1..=REPLICATES).map(move |r| measurement(group, peak, r)))
        .collect();
    let member = spectra[2].clone();

    let mut pca = PcaModel::new(spectra, 2);
    pca.run().unwrap();

    let projected = pca.transform(&member).unwrap();
    let scores = pca.scores().unwrap();
    for (k, value) in projected.iter().enumerate() {
        assert_relative_eq!(*value, scores[(k, 2)], epsilon = 1e-9);
    }
}

#[test]
fn score_table_exports_as_csv() {
    let spectra: Vec<Spectrum> = GROUPS
        .iter()
        .flat_map(|&(group, peak)| (1..=REPLICATES).map(move |r| measurement(group, peak, r)))
        .collect();
    let mut pca = PcaModel::new(spectra, 2);
    pca.run().unwrap();
    let table = PcaTable::from_model(&pca, Some("Group")).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.csv");
    table.save_csv(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("PC1,PC2,Label"));
    assert_eq!(lines.count(), GROUPS.len() * REPLICATES);
}

#[test]
fn json_collection_loads_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fruit.json");
    fs::write(
        &path,
        r#"[
            {"wavelength": [900.0, 910.0, 920.0], "absorbance": [0.1, 0.2, 0.3], "Name": "apple 1", "Scan": 7},
            {"wavelength": [900.0, 910.0, 920.0], "absorbance": [0.3, 0.2, 0.1], "Name": "pear 1", "Scan": 8}
        ]"#,
    )
    .unwrap();

    let spectra = load_file(&path).unwrap();
    assert_eq!(spectra.len(), 2);
    assert_eq!(spectra[1].header.get("Name"), Some(&HeaderValue::from("pear 1")));
    assert_eq!(spectra[0].header.get("Scan"), Some(&HeaderValue::Integer(7)));
    assert!(spectra[0].same_grid(&spectra[1]));
}
