use std::fs;
use std::io::Write;
use std::path::Path;

use nirscan::{Absorbance, Header, ReaderOptions, Signal, Spectrum, Wavelength, write_spectrum};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_absorbance(
    wavelengths: &[f64],
    baseline: f64,
    peaks: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            baseline + signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Lamp and detector response seen through the reference standard.
fn reference_signal(wavelengths: &[f64]) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| 4.0e5 * gaussian(wl, 1250.0, 320.0, 1.0) + 2.0e4)
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// The 19 header lines of an instrument export.
fn instrument_header(scan: usize, group: &str, temperature: f64) -> Header {
    let mut header = Header::new();
    header.insert("Method", "Column 1");
    header.insert("Host Date-Time", format!("2026-10-19 09:{:02}:00", scan % 60));
    header.insert("Header Version", 1_i64);
    header.insert("System Temp (C)", temperature);
    header.insert("Detector Temp (C)", temperature - 4.5);
    header.insert("Humidity (%)", 38.0);
    header.insert("Lamp PD", 2803_i64);
    header.insert("Shift Vector Coefficients", vec![0.0, 0.0, 0.0]);
    header.insert(
        "Pixel to Wavelength Coefficients",
        vec![1.7e3, -2.9, -1.6e-3],
    );
    header.insert("Serial Number", "5100180");
    header.insert("Scan Config Name", "Column 1");
    header.insert("Scan Config Type", "Column");
    header.insert("Section 1 Start Wavelength (nm)", 900_i64);
    header.insert("Section 1 End Wavelength (nm)", 1700_i64);
    header.insert("Section 1 Pattern Width (nm)", 7.03);
    header.insert("Section 1 Exposure Time (ms)", 0.635);
    header.insert("Section 1 Number of Wavelength Points", 228_i64);
    header.insert("Total Measurement Time in sec", 2.4);
    header.insert("Group", group);
    header
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // Wavelengths: 900 → 1700 nm, 228 points
    let n_points = 228;
    let wavelengths: Vec<f64> = (0..n_points)
        .map(|i| 900.0 + 800.0 * i as f64 / (n_points - 1) as f64)
        .collect();
    let reference = reference_signal(&wavelengths);

    // Water, sugar and starch overtone bands in different proportions.
    let groups: [(&str, f64, Vec<(f64, f64, f64)>); 3] = [
        (
            "apple",
            0.30,
            vec![(970.0, 40.0, 0.10), (1200.0, 60.0, 0.15), (1450.0, 55.0, 0.45)],
        ),
        (
            "pear",
            0.35,
            vec![(970.0, 40.0, 0.08), (1180.0, 50.0, 0.22), (1440.0, 60.0, 0.38)],
        ),
        (
            "banana",
            0.25,
            vec![(990.0, 45.0, 0.12), (1230.0, 70.0, 0.10), (1460.0, 50.0, 0.55)],
        ),
    ];
    let replicates = 8;

    let layout = ReaderOptions::default();
    let output_dir = Path::new("sample_data");
    fs::create_dir_all(output_dir).expect("Failed to create output directory");

    let mut index = String::from("File;Name;Group\n");
    let mut scan = 0;
    for (group, baseline, peaks) in &groups {
        for replicate in 1..=replicates {
            // Per-measurement scatter: additive offset and multiplicative gain.
            let offset = rng.gauss(0.0, 0.03);
            let gain = 1.0 + rng.gauss(0.0, 0.05);
            let absorbance: Vec<f64> =
                generate_absorbance(&wavelengths, *baseline, peaks, 0.002, &mut rng)
                    .into_iter()
                    .map(|a| gain * a + offset)
                    .collect();
            let sample: Vec<f64> = reference
                .iter()
                .zip(&absorbance)
                .map(|(r, a)| r * 10f64.powf(-a))
                .collect();

            let temperature = 31.0 + rng.gauss(0.0, 0.5);
            let spectrum = Spectrum::with_signals(
                Wavelength::new(wavelengths.clone()),
                Absorbance::new(absorbance),
                Some(Signal::new(reference.clone())),
                Some(Signal::new(sample)),
                instrument_header(scan, group, temperature),
            )
            .expect("Signals share the wavelength grid");

            let file_name = format!("{group}_{replicate:02}.csv");
            write_spectrum(&output_dir.join(&file_name), &spectrum, &layout)
                .expect("Failed to write spectrum");
            index.push_str(&format!("{file_name};{group} {replicate};{group}\n"));
            scan += 1;
        }
    }

    let index_path = output_dir.join("index.csv");
    let mut file = fs::File::create(&index_path).expect("Failed to create index file");
    file.write_all(index.as_bytes())
        .expect("Failed to write index file");

    println!(
        "Wrote {scan} spectra ({n_points} wavelengths each) and {}",
        index_path.display()
    );
}
