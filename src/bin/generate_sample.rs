//! Sample xDR data generator
//!
//! Writes a CSV in the layout of the cleaned Tellco export so the dashboard
//! can be run without the real dataset.
//!
//! Usage:
//!   cargo run --release --bin generate_sample -- [OPTIONS]
//!
//! Options:
//!   --rows <N>            Number of sessions (default: 20000)
//!   --missing-rate <F>    Probability of blanking a metric cell (default: 0.01)
//!   --seed <N>            Random seed for reproducibility (optional)
//!   --output <PATH>       Output CSV path (default: data/clean_data.csv)

use clap::Parser;
use csv::WriterBuilder;
use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::error::Error;
use std::path::PathBuf;
use tellco_dashboard::loader::{required_source_columns, DEFAULT_DATA_PATH};

/// Sample xDR generator for the dashboard
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Generate a synthetic xDR session table")]
struct Args {
    /// Number of sessions to write
    #[arg(long, default_value = "20000")]
    rows: usize,

    /// Probability of leaving a metric cell empty (0.0 - 1.0)
    #[arg(long, default_value = "0.01")]
    missing_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    output: PathBuf,
}

/// Manufacturers with their handset types and relative market share
const CATALOG: &[(&str, &[&str], u32)] = &[
    ("Apple", &[
        "Apple iPhone 6S (A1688)",
        "Apple iPhone 6 (A1586)",
        "Apple iPhone 7 (A1778)",
        "Apple iPhone Se (A1723)",
        "Apple iPhone 8 (A1905)",
        "Apple iPhone Xr (A2105)",
    ], 40),
    ("Samsung", &[
        "Samsung Galaxy S8 (Sm-G950F)",
        "Samsung Galaxy A5 Sm-A520F",
        "Samsung Galaxy J5 (Sm-J530)",
        "Samsung Galaxy J3 (Sm-J330)",
        "Samsung Galaxy S7 (Sm-G930X)",
    ], 27),
    ("Huawei", &[
        "Huawei B528S-23A",
        "Huawei E5180",
        "Huawei P20 Lite Huawei Nova 3E",
        "Huawei P20",
        "Huawei Y6 2018",
    ], 23),
    ("Sony Mobile Communications Ab", &["Sony Xperia Xa1", "Sony Xperia Xz1"], 1),
    ("Wiko Global Sasu", &["Wiko Lenny 4", "Wiko Tommy 3"], 1),
    ("Xiaomi Communica", &["Xiaomi Redmi Note 5", "Xiaomi Mi A2 Lite"], 1),
    ("Oneplus Technology (Shenzhen) Co Ltd", &["Oneplus 6"], 1),
];

/// Mean byte volume per direction for each application (DL, UL)
const APP_VOLUMES: [(&str, f64, f64); 7] = [
    ("Social Media", 1_800_000.0, 33_000.0),
    ("Google", 5_800_000.0, 2_000_000.0),
    ("Email", 1_800_000.0, 460_000.0),
    ("Youtube", 11_600_000.0, 11_000_000.0),
    ("Netflix", 11_600_000.0, 11_000_000.0),
    ("Gaming", 422_000_000.0, 8_300_000.0),
    ("Other", 421_000_000.0, 8_200_000.0),
];

/// Columns ignored by the loader, included so the file looks like a real export
const EXTRA_COLUMNS: [&str; 3] = ["Start", "End", "Last Location Name"];

fn jitter(mean: f64, rng: &mut impl Rng) -> f64 {
    (mean * rng.gen_range(0.0..2.0)).round()
}

fn maybe_blank(value: f64, missing_rate: f64, rng: &mut impl Rng) -> String {
    if rng.gen::<f64>() < missing_rate {
        String::new()
    } else {
        value.to_string()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("Sample xDR Generator");
    println!("{}", "=".repeat(60));
    println!("Rows:          {}", args.rows);
    println!("Missing rate:  {:.1}%", args.missing_rate * 100.0);
    println!("Output:        {}", args.output.display());
    if let Some(seed) = args.seed {
        println!("Random seed:   {}", seed);
    }
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let share = WeightedIndex::new(CATALOG.iter().map(|(_, _, weight)| *weight))?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let required = required_source_columns();
    let mut header: Vec<&str> = EXTRA_COLUMNS.to_vec();
    header.extend(&required);

    let mut writer = WriterBuilder::new().from_path(&args.output)?;
    writer.write_record(&header)?;

    for i in 0..args.rows {
        let (manufacturer, types, _) = CATALOG[share.sample(&mut rng)];
        let handset = types[rng.gen_range(0..types.len())];
        let day = rng.gen_range(4..=30);

        let mut row: Vec<String> = Vec::with_capacity(header.len());
        for name in &header {
            let cell = match *name {
                "Start" => format!("4/{}/2019 {:02}:{:02}", day, rng.gen_range(0..24), rng.gen_range(0..60)),
                "End" => format!("4/{}/2019 {:02}:{:02}", day + 1, rng.gen_range(0..24), rng.gen_range(0..60)),
                "Last Location Name" => format!("{:X}", rng.gen::<u32>()),
                "Bearer Id" => format!("{}", 13_114_483_460_844_900_000u64 + i as u64),
                "IMSI" => format!("2082{:011}", rng.gen_range(0..100_000_000_000u64)),
                "MSISDN/Number" => format!("336{:08}", rng.gen_range(0..100_000_000u64)),
                "IMEI" => format!("35{:012}", rng.gen_range(0..1_000_000_000_000u64)),
                "Handset Manufacturer" => manufacturer.to_string(),
                "Handset Type" => handset.to_string(),
                "Dur. (ms)" => maybe_blank(jitter(104_000.0, &mut rng), args.missing_rate, &mut rng),
                other => maybe_blank(metric_mean(other, &mut rng), args.missing_rate, &mut rng),
            };
            row.push(cell);
        }
        writer.write_record(&row)?;

        if (i + 1) % 10000 == 0 {
            println!("   Wrote {}/{} sessions...", i + 1, args.rows);
        }
    }

    writer.flush()?;

    println!("\nGeneration complete: {} sessions written to {}", args.rows, args.output.display());
    Ok(())
}

/// Random value for a per-direction metric column
fn metric_mean(column: &str, rng: &mut impl Rng) -> f64 {
    let dl = column.contains("DL");
    for (app, dl_mean, ul_mean) in APP_VOLUMES {
        if column.starts_with(app) {
            return jitter(if dl { dl_mean } else { ul_mean }, rng);
        }
    }

    match column {
        "Avg RTT DL (ms)" => jitter(110.0, rng),
        "Avg RTT UL (ms)" => jitter(17.0, rng),
        "Avg Bearer TP DL (kbps)" => jitter(13_300.0, rng),
        "Avg Bearer TP UL (kbps)" => jitter(1_770.0, rng),
        "TCP DL Retrans. Vol (Bytes)" => jitter(20_800_000.0, rng),
        "TCP UL Retrans. Vol (Bytes)" => jitter(760_000.0, rng),
        "Total DL (Bytes)" => jitter(454_000_000.0, rng),
        "Total UL (Bytes)" => jitter(41_000_000.0, rng),
        _ => 0.0,
    }
}
