use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

// ---------------------------------------------------------------------------
// Synthetic measurements
// ---------------------------------------------------------------------------

struct CvRow {
    cycle: i64,
    time: f64,
    ewe: f64,
    current: f64,
}

struct EisRow {
    freq: f64,
    z_real: f64,
    z_imag: f64,
    alpha: f64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Triangular sweep -0.2 V → 0.6 V → -0.2 V per cycle; current is a
/// capacitive step plus an oxidation / reduction peak pair that fades slowly.
fn generate_cv(cycles: i64, points_per_cycle: usize, rng: &mut SimpleRng) -> Vec<CvRow> {
    const E_LOW: f64 = -0.2;
    const E_HIGH: f64 = 0.6;
    const SCAN_RATE: f64 = 0.05; // V/s

    let half = points_per_cycle / 2;
    let step = (E_HIGH - E_LOW) / half as f64;
    let dt = step / SCAN_RATE;

    let mut rows = Vec::with_capacity(cycles as usize * points_per_cycle);
    let mut time = 0.0;
    for cycle in 1..=cycles {
        let fade = 1.0 - 0.08 * (cycle - 1) as f64;
        for i in 0..points_per_cycle {
            let (ewe, anodic) = if i < half {
                (E_LOW + i as f64 * step, true)
            } else {
                (E_HIGH - (i - half) as f64 * step, false)
            };
            let capacitive = if anodic { 2.0e-3 } else { -2.0e-3 };
            let faradaic = if anodic {
                gaussian(ewe, 0.25, 0.04, 8.0e-3 * fade)
            } else {
                -gaussian(ewe, 0.18, 0.04, 7.0e-3 * fade)
            };
            rows.push(CvRow {
                cycle,
                time,
                ewe,
                current: capacitive + faradaic + rng.gauss(0.0, 5.0e-5),
            });
            time += dt;
        }
    }
    rows
}

/// Randles cell (Rs + Rct || Cdl) swept from 100 kHz down to 100 mHz.
fn generate_eis(points: usize, rng: &mut SimpleRng) -> Vec<EisRow> {
    const RS: f64 = 12.0;
    const RCT: f64 = 85.0;
    const CDL: f64 = 2.0e-5;

    (0..points)
        .map(|i| {
            let decade = 5.0 - 6.0 * i as f64 / (points - 1) as f64;
            let freq = 10f64.powf(decade);
            let omega = 2.0 * std::f64::consts::PI * freq;
            let wrc = omega * RCT * CDL;
            let denom = 1.0 + wrc * wrc;
            let z_real = RS + RCT / denom + rng.gauss(0.0, 0.05);
            let z_imag = -RCT * wrc / denom + rng.gauss(0.0, 0.05);
            EisRow {
                freq,
                z_real,
                z_imag,
                alpha: z_imag.atan2(z_real).to_degrees(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_txt(path: &Path, rows: &[CvRow]) -> Result<()> {
    let mut out = String::new();
    for r in rows {
        writeln!(out, "{} {:.4} {:.6} {:.6e}", r.cycle, r.time, r.ewe, r.current)?;
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

/// EC-Lab style ASCII export with comma decimal separators.
fn write_mpt(path: &Path, header: &[&str], rows: impl Iterator<Item = Vec<f64>>) -> Result<()> {
    let settings = [
        "",
        "Generated by generate_sample",
        "Electrode material : glassy carbon",
        "",
    ];
    let n_header = 2 + settings.len() + 1;

    let mut out = String::new();
    writeln!(out, "EC-Lab ASCII FILE")?;
    writeln!(out, "Nb header lines : {n_header}")?;
    for line in settings {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}\t", header.join("\t"))?;
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| format!("{v:.6E}").replace('.', ","))
            .collect();
        writeln!(out, "{}\t", cells.join("\t"))?;
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

fn write_parquet(path: &Path, rows: &[CvRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("cycle", DataType::Int64, false),
        Field::new("time", DataType::Float64, false),
        Field::new("Ewe", DataType::Float64, false),
        Field::new("I", DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.cycle))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.time))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.ewe))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.current))),
    ];
    let batch = RecordBatch::try_new(Arc::clone(&schema), columns)?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let cv = generate_cv(3, 400, &mut rng);
    let eis = generate_eis(60, &mut rng);

    write_txt(&out_dir.join("sample_cv.txt"), &cv)?;
    write_parquet(&out_dir.join("sample_cv.parquet"), &cv)?;
    write_mpt(
        &out_dir.join("sample_cv.mpt"),
        &["mode", "time/s", "Ewe/V", "<I>/mA", "cycle number"],
        cv.iter().map(|r| {
            vec![2.0, r.time, r.ewe, r.current * 1.0e3, r.cycle as f64]
        }),
    )?;
    write_mpt(
        &out_dir.join("sample_eis.mpt"),
        &["freq/Hz", "Re(Z)/Ohm", "-Im(Z)/Ohm", "alpha"],
        eis.iter().map(|r| vec![r.freq, r.z_real, -r.z_imag, r.alpha]),
    )?;

    log::info!(
        "Wrote {} CV rows and {} EIS points to {}",
        cv.len(),
        eis.len(),
        out_dir.display()
    );
    println!("Sample data written to {}", out_dir.display());
    Ok(())
}
