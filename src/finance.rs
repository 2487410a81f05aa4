//! Per-truck financials
//!
//! Loads, fuel and expenses are filtered independently, folded into
//! (time bucket, truck) rows, and summed into a single fleet row for the
//! whole window. Ratios are derived once, after all accumulation.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Basis, ExpenseRow, FinanceRow, FuelRow, LoadRow, Timegrain};

pub const FLEET_TRUCK: &str = "FLEET";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinanceFilters {
    pub basis: Basis,
    pub range_start: Option<NaiveDateTime>,
    pub range_end: Option<NaiveDateTime>,
    pub trucks: Vec<String>,
    pub drivers: Vec<String>,
}

impl FinanceFilters {
    /// A record passes when its date is usable and inside the range, and
    /// its truck/driver matches any non-empty selection
    fn accepts(&self, date: Option<NaiveDateTime>, truck: &str, driver: &str) -> bool {
        let Some(date) = date else {
            return false;
        };
        if self.range_start.is_some_and(|s| date < s) || self.range_end.is_some_and(|e| date > e) {
            return false;
        }
        (self.trucks.is_empty() || self.trucks.iter().any(|t| t == truck))
            && (self.drivers.is_empty() || self.drivers.iter().any(|d| d == driver))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub by_truck: Vec<FinanceRow>,
    pub fleet_totals: FinanceRow,
}

/// Start of the bucket containing `date`; weeks start on Sunday
///
/// `None` when the week start would fall before the earliest representable
/// date.
pub fn bucket_start(date: NaiveDateTime, grain: Timegrain) -> Option<NaiveDate> {
    let day = date.date();
    match grain {
        Timegrain::Day => Some(day),
        Timegrain::Week => day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_sunday()))),
        Timegrain::Month => day.with_day(1),
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator)
}

impl FinanceRow {
    fn empty(bucket: Option<NaiveDate>, truck: &str) -> Self {
        Self {
            bucket,
            truck: truck.to_string(),
            ..Default::default()
        }
    }

    fn absorb(&mut self, other: &FinanceRow) {
        self.revenue += other.revenue;
        self.miles_loaded += other.miles_loaded;
        self.miles_empty += other.miles_empty;
        self.miles_total += other.miles_total;
        self.loads += other.loads;
        self.fuel_gallons += other.fuel_gallons;
        self.fuel_cost += other.fuel_cost;
        self.expenses += other.expenses;
    }

    /// Fill the ratio fields from the accumulated totals
    pub fn derive(&mut self) {
        self.rpm = ratio(self.revenue, self.miles_total);
        self.fuel_cpm = ratio(self.fuel_cost, self.miles_total);
        self.gross_profit = self.revenue - self.fuel_cost - self.expenses;
        self.operating_ratio = ratio(self.fuel_cost + self.expenses, self.revenue).map(|r| r * 100.0);
    }
}

fn slot<'a>(
    buckets: &'a mut BTreeMap<(NaiveDate, String), FinanceRow>,
    date: NaiveDateTime,
    truck: &str,
    grain: Timegrain,
) -> Option<&'a mut FinanceRow> {
    let bucket = bucket_start(date, grain)?;
    Some(
        buckets
            .entry((bucket, truck.to_string()))
            .or_insert_with(|| FinanceRow::empty(Some(bucket), truck)),
    )
}

/// Join loads, fuel and expenses into bucketed per-truck rows plus a fleet row
///
/// Cancelled loads contribute nothing. `by_truck` is ordered by bucket, then
/// truck name.
pub fn build_finance(
    loads: &[LoadRow],
    fuel: &[FuelRow],
    expenses: &[ExpenseRow],
    filters: &FinanceFilters,
    grain: Timegrain,
) -> FinanceSummary {
    let mut buckets: BTreeMap<(NaiveDate, String), FinanceRow> = BTreeMap::new();

    for load in loads.iter().filter(|l| !l.is_cancelled()) {
        let date = load.basis_date(filters.basis);
        if !filters.accepts(date, &load.truck, &load.driver) {
            continue;
        }
        let Some(date) = date else { continue };
        let Some(row) = slot(&mut buckets, date, &load.truck, grain) else { continue };
        row.revenue += load.revenue;
        row.miles_loaded += load.miles_loaded;
        row.miles_empty += load.miles_empty;
        row.miles_total += load.miles_total();
        row.loads += 1;
    }

    for tx in fuel {
        if !filters.accepts(tx.date, &tx.truck, &tx.driver) {
            continue;
        }
        let Some(date) = tx.date else { continue };
        let Some(row) = slot(&mut buckets, date, &tx.truck, grain) else { continue };
        row.fuel_gallons += tx.gallons;
        row.fuel_cost += tx.amount;
    }

    for exp in expenses {
        if !filters.accepts(exp.date, &exp.truck, &exp.driver) {
            continue;
        }
        let Some(date) = exp.date else { continue };
        if let Some(row) = slot(&mut buckets, date, &exp.truck, grain) {
            row.expenses += exp.amount;
        }
    }

    let mut fleet_totals = FinanceRow::empty(None, FLEET_TRUCK);
    let by_truck: Vec<FinanceRow> = buckets
        .into_values()
        .map(|mut row| {
            fleet_totals.absorb(&row);
            row.derive();
            row
        })
        .collect();
    fleet_totals.derive();

    FinanceSummary { by_truck, fleet_totals }
}
