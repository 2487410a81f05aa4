//! Synthetic fleet data generator
//!
//! Writes loads, fuel and expense CSVs with the same headers the dispatch and
//! fuel-card exports use, so the report and API server can be tried without
//! real data.
//!
//! Usage:
//!   cargo run --release --bin generate_synthetic -- [OPTIONS]
//!
//! Options:
//!   --loads <N>        Number of loads to generate (default: 500)
//!   --trucks <N>       Fleet size; one driver per truck (default: 8)
//!   --start <DATE>     First ship date (default: 2024-01-01)
//!   --days <N>         Span of ship dates in days (default: 90)
//!   --cancel-rate <F>  Share of cancelled loads (default: 0.05)
//!   --late-rate <F>    Share of late receiver arrivals (default: 0.12)
//!   --serial-dates     Write ship dates as spreadsheet serial numbers
//!   --seed <N>         Random seed for reproducibility (optional)
//!   --output-dir <DIR> Output directory (default: data)

use chrono::{Duration, NaiveDate};
use clap::Parser;
use csv::WriterBuilder;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

/// Synthetic data generator for fleet sheets
#[derive(Parser, Debug)]
#[command(name = "generate_synthetic")]
#[command(about = "Generate synthetic loads, fuel and expense CSVs")]
struct Args {
    /// Number of loads to generate
    #[arg(long, default_value = "500")]
    loads: usize,

    /// Number of trucks (each with one driver)
    #[arg(long, default_value = "8")]
    trucks: usize,

    /// First ship date
    #[arg(long, default_value = "2024-01-01")]
    start: NaiveDate,

    /// Span of ship dates in days
    #[arg(long, default_value = "90")]
    days: i64,

    /// Probability a load is cancelled (0.0 - 1.0)
    #[arg(long, default_value = "0.05")]
    cancel_rate: f64,

    /// Probability a receiver arrival is late (0.0 - 1.0)
    #[arg(long, default_value = "0.12")]
    late_rate: f64,

    /// Write ship dates as spreadsheet serial numbers
    #[arg(long)]
    serial_dates: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "data")]
    output_dir: PathBuf,
}

const CITIES: &[(&str, &str)] = &[
    ("Dallas", "TX"),
    ("Houston", "TX"),
    ("Oklahoma City", "OK"),
    ("Kansas City", "MO"),
    ("Omaha", "NE"),
    ("Memphis", "TN"),
    ("Little Rock", "AR"),
    ("Denver", "CO"),
    ("Albuquerque", "NM"),
    ("Wichita", "KS"),
];

const DRIVERS: &[&str] = &[
    "A. Morales", "B. Chen", "C. Okafor", "D. Novak", "E. Haddad", "F. Lindqvist",
    "G. Petrov", "H. Tanaka", "I. Mensah", "J. Kowalski", "K. Ramirez", "L. Schmidt",
];

const EXPENSE_CATEGORIES: &[(&str, &str, f64, f64)] = &[
    ("Tires", "Love's Truck Care", 350.0, 900.0),
    ("Repairs", "Rush Truck Center", 200.0, 2500.0),
    ("Tolls", "PrePass", 20.0, 140.0),
    ("Insurance", "Progressive Commercial", 900.0, 1400.0),
    ("Permits", "State DOT", 50.0, 300.0),
];

#[derive(Debug, Serialize)]
struct LoadRecord {
    #[serde(rename = "Load #")]
    load_number: String,
    #[serde(rename = "Truck")]
    truck: String,
    #[serde(rename = "Drivers")]
    driver: String,
    #[serde(rename = "Ship Date")]
    ship_date: String,
    #[serde(rename = "Del. Date")]
    delivery_date: String,
    #[serde(rename = "1st Shipper City")]
    shipper_city: String,
    #[serde(rename = "1st Shipper State")]
    shipper_state: String,
    #[serde(rename = "Last Receiver City")]
    receiver_city: String,
    #[serde(rename = "Last Receiver State")]
    receiver_state: String,
    #[serde(rename = "Miles")]
    miles: u32,
    #[serde(rename = "Empty Miles")]
    empty_miles: u32,
    #[serde(rename = "Hauling Fee")]
    hauling_fee: String,
    #[serde(rename = "Load Status")]
    status: String,
    #[serde(rename = "Shipper Arrival Status")]
    shipper_arrival: String,
    #[serde(rename = "Receiver Arrival Status")]
    receiver_arrival: String,
}

#[derive(Debug, Serialize)]
struct FuelRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Unit")]
    unit: String,
    #[serde(rename = "Driver Name")]
    driver: String,
    #[serde(rename = "Item")]
    item: String,
    #[serde(rename = "Gallons")]
    gallons: String,
    #[serde(rename = "Amount")]
    amount: String,
}

#[derive(Debug, Serialize)]
struct ExpenseRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Vendor")]
    vendor: String,
    #[serde(rename = "Driver")]
    driver: String,
    #[serde(rename = "Truck")]
    truck: String,
    #[serde(rename = "Notes")]
    notes: String,
}

/// Spreadsheet day serial (days since 1899-12-30)
fn to_serial(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days()
}

/// Format money the way the sheets do: "$1,234.56"
fn money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${}.{:02}", grouped, cents % 100)
}

/// Rough road miles between two cities in the list
fn lane_miles(a: usize, b: usize, rng: &mut impl Rng) -> u32 {
    let spread = (a as i64 - b as i64).unsigned_abs() as u32;
    180 + spread * 110 + rng.gen_range(0..60)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    println!("🔧 Synthetic Fleet Data Generator");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Loads:            {}", args.loads);
    println!("Trucks:           {}", args.trucks);
    println!("Ship dates:       {} + {} days", args.start, args.days);
    println!("Cancel rate:      {:.1}%", args.cancel_rate * 100.0);
    println!("Late rate:        {:.1}%", args.late_rate * 100.0);
    println!("Serial dates:     {}", args.serial_dates);
    if let Some(seed) = args.seed {
        println!("Random seed:      {}", seed);
    }
    println!("Output dir:       {}", args.output_dir.display());
    println!();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    std::fs::create_dir_all(&args.output_dir)?;

    let fleet: Vec<(String, String)> = (0..args.trucks.max(1))
        .map(|i| (format!("{}", 101 + i), DRIVERS[i % DRIVERS.len()].to_string()))
        .collect();

    // Loads, with a fuel stop for every completed one
    let mut loads = WriterBuilder::new().has_headers(true).from_path(args.output_dir.join("loads.csv"))?;
    let mut fuel = WriterBuilder::new().has_headers(true).from_path(args.output_dir.join("fuel.csv"))?;
    let mut fuel_written = 0;

    for n in 0..args.loads {
        let (truck, driver) = &fleet[rng.gen_range(0..fleet.len())];
        let origin = rng.gen_range(0..CITIES.len());
        let mut dest = rng.gen_range(0..CITIES.len());
        if dest == origin {
            dest = (dest + 1) % CITIES.len();
        }

        let ship = args.start + Duration::days(rng.gen_range(0..args.days.max(1)));
        let miles = lane_miles(origin, dest, &mut rng);
        let delivery = ship + Duration::days(i64::from(miles / 550));
        let empty_miles = if rng.gen_bool(0.6) { rng.gen_range(0..120) } else { 0 };
        let rate = rng.gen_range(1.9..3.4);
        let cancelled = rng.gen::<f64>() < args.cancel_rate;
        let late = rng.gen::<f64>() < args.late_rate;

        let ship_date = if args.serial_dates {
            to_serial(ship).to_string()
        } else {
            ship.format("%m/%d/%Y").to_string()
        };

        loads.serialize(LoadRecord {
            load_number: format!("L{:06}", 100000 + n),
            truck: truck.clone(),
            driver: driver.clone(),
            ship_date,
            delivery_date: delivery.format("%Y-%m-%d").to_string(),
            shipper_city: CITIES[origin].0.to_string(),
            shipper_state: CITIES[origin].1.to_string(),
            receiver_city: CITIES[dest].0.to_string(),
            receiver_state: CITIES[dest].1.to_string(),
            miles,
            empty_miles,
            hauling_fee: money(f64::from(miles) * rate),
            status: if cancelled { "Cancelled" } else { "Completed" }.to_string(),
            shipper_arrival: "On Time".to_string(),
            receiver_arrival: if late { "Late" } else { "On Time" }.to_string(),
        })?;

        if !cancelled {
            let gallons = f64::from(miles + empty_miles) / rng.gen_range(5.8..7.2);
            let price = rng.gen_range(3.6..4.4);
            fuel.serialize(FuelRecord {
                date: delivery.format("%Y-%m-%d").to_string(),
                unit: truck.clone(),
                driver: driver.clone(),
                item: "ULSD".to_string(),
                gallons: format!("{:.1}", gallons),
                amount: money(gallons * price),
            })?;
            fuel_written += 1;

            // Occasional cash advance on the fuel card; the normalizer drops these
            if rng.gen_bool(0.03) {
                fuel.serialize(FuelRecord {
                    date: delivery.format("%Y-%m-%d").to_string(),
                    unit: truck.clone(),
                    driver: driver.clone(),
                    item: "CADV".to_string(),
                    gallons: String::new(),
                    amount: money(100.0),
                })?;
                fuel_written += 1;
            }
        }
    }
    loads.flush()?;
    fuel.flush()?;

    // Roughly one expense per truck per week
    let mut expenses = WriterBuilder::new().has_headers(true).from_path(args.output_dir.join("expenses.csv"))?;
    let mut expenses_written = 0;
    for week in 0..(args.days.max(1) / 7).max(1) {
        for (truck, driver) in &fleet {
            let (category, vendor, lo, hi) = EXPENSE_CATEGORIES[rng.gen_range(0..EXPENSE_CATEGORIES.len())];
            let date = args.start + Duration::days(week * 7 + rng.gen_range(0..7));
            expenses.serialize(ExpenseRecord {
                date: date.format("%Y-%m-%d").to_string(),
                amount: money(rng.gen_range(lo..hi)),
                category: category.to_string(),
                vendor: vendor.to_string(),
                driver: driver.clone(),
                truck: truck.clone(),
                notes: String::new(),
            })?;
            expenses_written += 1;
        }
    }
    expenses.flush()?;

    println!("✅ Generation complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Loads written:     {:>8}", args.loads);
    println!("Fuel rows written: {:>8}", fuel_written);
    println!("Expense rows:      {:>8}", expenses_written);
    println!("Output dir:        {}", args.output_dir.display());

    Ok(())
}
