//! Writes a deterministic synthetic survey to `sample_salaries.csv` and
//! `sample_salaries.parquet` for trying the dashboard engine.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const YEARS: [i32; 4] = [2022, 2023, 2024, 2025];
const SENIORITIES: [(&str, f64); 4] = [
    ("Junior", 0.6),
    ("Mid", 0.85),
    ("Senior", 1.15),
    ("Executive", 1.6),
];
const COMPANY_SIZES: [&str; 3] = ["S", "M", "L"];
const REMOTE_TYPES: [&str; 3] = ["Remote", "Hybrid", "On-site"];
const COUNTRIES: [(&str, f64); 6] = [
    ("USA", 1.0),
    ("CAN", 0.85),
    ("GBR", 0.8),
    ("DEU", 0.78),
    ("BRA", 0.35),
    ("IND", 0.3),
];
const ROLES: [(&str, f64); 18] = [
    ("Data Analyst", 85_000.0),
    ("Data Scientist", 140_000.0),
    ("Data Engineer", 135_000.0),
    ("Machine Learning Engineer", 160_000.0),
    ("Analytics Engineer", 125_000.0),
    ("BI Developer", 95_000.0),
    ("Research Scientist", 175_000.0),
    ("Data Architect", 165_000.0),
    ("MLOps Engineer", 150_000.0),
    ("Applied Scientist", 180_000.0),
    ("Data Manager", 130_000.0),
    ("Business Analyst", 80_000.0),
    ("Database Administrator", 90_000.0),
    ("AI Engineer", 170_000.0),
    ("Head of Data", 210_000.0),
    ("Data Quality Analyst", 75_000.0),
    ("Statistician", 100_000.0),
    ("Computer Vision Engineer", 155_000.0),
];

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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = (self.next_u64() % items.len() as u64) as usize;
        &items[idx]
    }

    /// Log-normal multiplier around 1.0; salaries are right-skewed.
    fn spread(&mut self, sigma: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        (sigma * z).exp()
    }
}

#[derive(Default)]
struct Columns {
    year: Vec<i64>,
    role: Vec<String>,
    seniority: Vec<String>,
    company_size: Vec<String>,
    remote_type: Vec<String>,
    country: Vec<String>,
    salary_usd: Vec<f64>,
}

fn generate(rows: usize, rng: &mut SimpleRng) -> Columns {
    let mut cols = Columns::default();
    for _ in 0..rows {
        let year = *rng.pick(&YEARS);
        let (role, base) = *rng.pick(&ROLES);
        let (seniority, level) = *rng.pick(&SENIORITIES);
        let (country, cost) = *rng.pick(&COUNTRIES);
        let growth = 1.0 + 0.04 * (year - YEARS[0]) as f64;
        let salary = (base * level * cost * growth * rng.spread(0.25)).round();

        cols.year.push(year as i64);
        cols.role.push(role.to_string());
        cols.seniority.push(seniority.to_string());
        cols.company_size.push(rng.pick(&COMPANY_SIZES).to_string());
        cols.remote_type.push(rng.pick(&REMOTE_TYPES).to_string());
        cols.country.push(country.to_string());
        cols.salary_usd.push(salary);
    }
    cols
}

fn write_csv(path: &str, cols: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([
        "year",
        "role",
        "seniority",
        "company_size",
        "remote_type",
        "residence_country_code",
        "salary_usd",
    ])?;
    for i in 0..cols.year.len() {
        writer.write_record([
            cols.year[i].to_string(),
            cols.role[i].clone(),
            cols.seniority[i].clone(),
            cols.company_size[i].clone(),
            cols.remote_type[i].clone(),
            cols.country[i].clone(),
            cols.salary_usd[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, cols: Columns) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int64, false),
        Field::new("role", DataType::Utf8, false),
        Field::new("seniority", DataType::Utf8, false),
        Field::new("company_size", DataType::Utf8, false),
        Field::new("remote_type", DataType::Utf8, false),
        Field::new("residence_country_code", DataType::Utf8, false),
        Field::new("salary_usd", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.year)),
            Arc::new(StringArray::from(cols.role)),
            Arc::new(StringArray::from(cols.seniority)),
            Arc::new(StringArray::from(cols.company_size)),
            Arc::new(StringArray::from(cols.remote_type)),
            Arc::new(StringArray::from(cols.country)),
            Arc::new(Float64Array::from(cols.salary_usd)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let rows = 2_000;
    let mut rng = SimpleRng::new(42);
    let cols = generate(rows, &mut rng);

    write_csv("sample_salaries.csv", &cols)?;
    write_parquet("sample_salaries.parquet", cols)?;

    log::info!("generated {rows} survey responses");
    println!("Wrote {rows} responses to sample_salaries.csv and sample_salaries.parquet");
    Ok(())
}
