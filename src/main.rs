//! Fleet report
//!
//! Loads the configured CSV sources and prints lane, finance and KPI tables.
//! Run: ./target/release/fleet_analytics --loads data/loads.csv --fuel data/fuel.csv

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use fleet_analytics::api::service::parse_bound;
use fleet_analytics::config::DataSources;
use fleet_analytics::ingest::load_into_store;
use fleet_analytics::models::{Basis, FinanceRow, Timegrain};
use fleet_analytics::selectors::DashboardViews;
use fleet_analytics::state::DashboardStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fleet_analytics")]
#[command(about = "Print lane and per-truck financial reports from fleet CSVs")]
struct Args {
    #[command(flatten)]
    sources: DataSources,

    /// Which load date drives filtering and bucketing (pickup or delivery)
    #[arg(long, default_value = "pickup", value_parser = parse_basis)]
    basis: Basis,

    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Restrict to these drivers (repeatable)
    #[arg(long = "driver")]
    drivers: Vec<String>,

    /// Restrict finance to these trucks (repeatable)
    #[arg(long = "truck")]
    trucks: Vec<String>,

    /// Finance bucket size: day, week or month
    #[arg(long, default_value = "month", value_parser = parse_timegrain)]
    timegrain: Timegrain,

    /// Number of lanes to print
    #[arg(long, default_value = "20")]
    limit: usize,
}

fn parse_basis(s: &str) -> Result<Basis, String> {
    Basis::parse(s).ok_or_else(|| format!("unknown basis '{}'", s))
}

fn parse_timegrain(s: &str) -> Result<Timegrain, String> {
    Timegrain::parse(s).ok_or_else(|| format!("unknown timegrain '{}'", s))
}

fn parse_date_arg(value: Option<&str>, inclusive_end: bool) -> Result<Option<NaiveDateTime>> {
    value
        .map(|v| parse_bound(v, inclusive_end).with_context(|| format!("invalid date '{}'", v)))
        .transpose()
}

/// Operating ratio cell; the value is already a percentage
fn ratio_cell(operating_ratio: Option<f64>) -> String {
    operating_ratio.map(|v| format!("{:.1}%", v)).unwrap_or_else(|| "-".to_string())
}

fn print_finance_row(row: &FinanceRow) {
    let bucket = row.bucket.map(|b| b.to_string()).unwrap_or_else(|| "all".to_string());
    let rpm = row.rpm.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
    let or = ratio_cell(row.operating_ratio);
    println!("  {:12} {:8} {:>6} {:>12.2} {:>10.0} {:>10.2} {:>10.2} {:>7} {:>12.2} {:>8}",
             bucket, row.truck, row.loads, row.revenue, row.miles_total, row.fuel_cost,
             row.expenses, rpm, row.gross_profit, or);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();
    let start = parse_date_arg(args.start.as_deref(), false)?;
    let end = parse_date_arg(args.end.as_deref(), true)?;

    let store = DashboardStore::new();
    let views = DashboardViews::new(args.sources.column_map()?);
    let counts = load_into_store(&store, &args.sources).await?;
    info!("Loaded sources: {:?}", counts);

    store.update_filters(|f| {
        f.basis = args.basis;
        f.date_range.start = start;
        f.date_range.end = end;
        f.selected_driver_ids = args.drivers.clone();
        f.selected_truck_ids = args.trucks.clone();
    });
    let snap = store.snapshot();

    let lanes = views.lane_view(&snap);
    let finance = views.finance_view(&snap, args.timegrain);
    let kpis = views.kpi_view(&snap);

    println!("\n{}", "=".repeat(100));
    println!("                                  FLEET LANE & FINANCE REPORT");
    println!("{}\n", "=".repeat(100));

    println!("FLEET KPIs");
    println!("{}", "-".repeat(50));
    println!("  Loads:           {:>12}", kpis.loads);
    println!("  Revenue:         {:>12.2}", kpis.revenue);
    println!("  Miles:           {:>12.0}", kpis.miles);
    println!("  Fleet RPM:       {:>12.2}", kpis.fleet_rpm);
    println!("  On-time:         {:>11}%", kpis.on_time_pct);
    println!("  Deadhead:        {:>11}%", kpis.deadhead_pct);
    if let Some(util) = kpis.utilization_pct {
        println!("  Utilization:     {:>11}%", util);
    }

    println!("\n\nTOP {} LANES BY REVENUE (fleet revenue {:.2})", args.limit, lanes.fleet_revenue);
    println!("{}", "-".repeat(100));
    println!("  {:40} {:>6} {:>12} {:>10} {:>8} {:>8} {:>8} {:>7}",
             "Lane", "Loads", "Revenue", "Rev/Load", "Mi/Load", "RPM", "Share", "Cum");
    println!("  {}", "-".repeat(98));
    for lane in lanes.rows.iter().take(args.limit) {
        let marker = if lane.in_pareto_core() { "*" } else { "" };
        println!("  {:40} {:>6} {:>12.2} {:>10.2} {:>8.0} {:>8.2} {:>7.1}% {:>6.1}%{}",
                 lane.lane, lane.loads, lane.total_revenue, lane.avg_revenue_per_load,
                 lane.avg_total_miles_per_load, lane.avg_rpm, lane.pct_of_fleet_revenue,
                 lane.cum_pct_of_fleet_revenue, marker);
    }
    println!("  (* lanes within the top 80% of fleet revenue)");

    println!("\n\nFINANCE BY TRUCK ({:?})", args.timegrain);
    println!("{}", "-".repeat(100));
    println!("  {:12} {:8} {:>6} {:>12} {:>10} {:>10} {:>10} {:>7} {:>12} {:>8}",
             "Bucket", "Truck", "Loads", "Revenue", "Miles", "Fuel", "Expenses", "RPM", "Profit", "OR");
    println!("  {}", "-".repeat(98));
    for row in &finance.by_truck {
        print_finance_row(row);
    }
    println!("  {}", "-".repeat(98));
    print_finance_row(&finance.fleet_totals);
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_cell() {
        assert_eq!(ratio_cell(Some(25.0)), "25.0%");
        assert_eq!(ratio_cell(Some(112.345)), "112.3%");
        assert_eq!(ratio_cell(None), "-");
    }
}
