use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

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

/// (name, ISO code, 1960 CO₂ kt, yearly growth, 1971 energy kg/capita)
const COUNTRIES: [(&str, &str, f64, f64, f64); 6] = [
    ("China", "CHN", 780_000.0, 0.048, 450.0),
    ("United States", "USA", 2_890_000.0, 0.006, 7_600.0),
    ("India", "IND", 120_000.0, 0.055, 260.0),
    ("Japan", "JPN", 230_000.0, 0.025, 2_600.0),
    ("Germany", "DEU", 810_000.0, -0.001, 4_200.0),
    ("Brazil", "BRA", 47_000.0, 0.042, 650.0),
];

/// Smooth exponential trend with multiplicative noise.
fn trend(base: f64, growth: f64, t: f64, noise: f64, rng: &mut SimpleRng) -> f64 {
    base * (1.0 + growth).powf(t) * (1.0 + rng.gauss(0.0, noise))
}

fn write_csv(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Single-sheet workbook. Integer header labels and numeric body cells are
/// written as numbers, empty cells are left blank.
fn write_workbook(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, label) in headers.iter().enumerate() {
        let col = u16::try_from(col).context("too many columns for a worksheet")?;
        match label.parse::<i32>() {
            Ok(year) => sheet.write_number(0, col, year)?,
            Err(_) if label.is_empty() => continue,
            Err(_) => sheet.write_string(0, col, label)?,
        };
    }
    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r + 1).context("too many rows for a worksheet")?;
        for (col, value) in row.iter().enumerate() {
            let col = u16::try_from(col).context("too many columns for a worksheet")?;
            match value.parse::<f64>() {
                Ok(v) => sheet.write_number(r, col, v)?,
                Err(_) if value.is_empty() => continue,
                Err(_) => sheet.write_string(r, col, value)?,
            };
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Wide CO₂ table in kt with an unnamed identifier header. Recent year
/// labels are float-formatted, as some spreadsheet exports write them.
fn co2_table(rng: &mut SimpleRng) -> (Vec<String>, Vec<Vec<String>>) {
    let years = 1960_i32..=2022;
    let mut headers = vec![String::new()];
    headers.extend(years.clone().map(|y| {
        if y >= 2020 {
            format!("{y}.0")
        } else {
            y.to_string()
        }
    }));

    let rows = COUNTRIES
        .iter()
        .map(|&(name, _, base, growth, _)| {
            let mut row = vec![name.to_string()];
            row.extend(years.clone().map(|y| {
                let kt = trend(base, growth, f64::from(y - 1960), 0.03, rng);
                format!("{kt:.0}")
            }));
            row
        })
        .collect();
    (headers, rows)
}

/// World Bank layout: metadata columns, then one column per year, with gaps.
fn gdp_table(rng: &mut SimpleRng) -> (Vec<String>, Vec<Vec<String>>) {
    let years = 1961_i32..=2022;
    let mut headers: Vec<String> = ["Country Name", "Country Code", "Indicator Name", "Indicator Code"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    headers.extend(years.clone().map(|y| y.to_string()));

    let rows = COUNTRIES
        .iter()
        .map(|&(name, code, _, growth, _)| {
            let mut row = vec![
                name.to_string(),
                code.to_string(),
                "GDP per capita growth (annual %)".to_string(),
                "NY.GDP.PCAP.KD.ZG".to_string(),
            ];
            row.extend(years.clone().map(|_| {
                if rng.next_f64() < 0.03 {
                    String::new()
                } else {
                    format!("{:.2}", rng.gauss(growth * 100.0 + 1.0, 2.5))
                }
            }));
            row
        })
        .collect();
    (headers, rows)
}

/// Tidy annual national mean temperature using the `Temp (°C)` alias.
fn temperature_table(rng: &mut SimpleRng) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec!["Year".to_string(), "Temp (°C)".to_string()];
    let rows = (1951_i32..=2022)
        .map(|y| {
            let warming = 0.025 * f64::from(y - 1951);
            vec![y.to_string(), format!("{:.2}", rng.gauss(7.6 + warming, 0.25))]
        })
        .collect();
    (headers, rows)
}

/// Raw event-level disaster records for several countries.
fn disaster_events(rng: &mut SimpleRng) -> (Vec<String>, Vec<Vec<String>>) {
    let headers: Vec<String> = ["Start Year", "Country", "Disaster Type"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let kinds = ["Flood", "Storm", "Earthquake", "Drought", "Landslide"];
    let mut rows = Vec::new();
    for y in 1970_i32..=2022 {
        for &(name, ..) in COUNTRIES.iter().take(3) {
            let expected = 4.0 + 0.35 * f64::from(y - 1970);
            let n = rng.gauss(expected, expected.sqrt()).round().max(0.0) as usize;
            for _ in 0..n {
                let kind = kinds[(rng.next_u64() % kinds.len() as u64) as usize];
                rows.push(vec![y.to_string(), name.to_string(), kind.to_string()]);
            }
        }
    }
    (headers, rows)
}

/// Wide energy-use table (kg oil-eq. per person) with occasional gaps.
fn energy_table(rng: &mut SimpleRng) -> (Vec<String>, Vec<Vec<String>>) {
    let years = 1971_i32..=2015;
    let mut headers = vec!["country".to_string()];
    headers.extend(years.clone().map(|y| y.to_string()));

    let rows = COUNTRIES
        .iter()
        .map(|&(name, _, _, growth, base)| {
            let mut row = vec![name.to_string()];
            row.extend(years.clone().map(|y| {
                let v = trend(base, growth * 0.8, f64::from(y - 1971), 0.02, rng);
                if rng.next_f64() < 0.02 {
                    String::new()
                } else {
                    format!("{v:.1}")
                }
            }));
            row
        })
        .collect();
    (headers, rows)
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let (h, rows) = co2_table(&mut rng);
    write_workbook(&out_dir.join("yearly_co2_emissions_1000_tonnes (1).xlsx"), &h, &rows)?;

    let (h, rows) = gdp_table(&mut rng);
    write_workbook(&out_dir.join("gdp_per_capita_yearly_growth.xlsx"), &h, &rows)?;

    let (h, rows) = energy_table(&mut rng);
    write_workbook(&out_dir.join("energy_use_per_person.xlsx"), &h, &rows)?;

    let (h, rows) = temperature_table(&mut rng);
    write_csv(&out_dir.join("temperature_china_cleaned.csv"), &h, &rows)?;

    let (h, rows) = disaster_events(&mut rng);
    let n_events = rows.len();
    write_csv(&out_dir.join("natural_disasters_china.csv"), &h, &rows)?;

    println!(
        "Wrote sample data for {} countries ({n_events} disaster events) to {}",
        COUNTRIES.len(),
        out_dir.display()
    );
    Ok(())
}
