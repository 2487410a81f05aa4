//! Fleet headline KPIs
//!
//! Run over every non-cancelled load in the driver selection whose basis
//! date is in range, regardless of lane or truck.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Basis, LoadRow};

/// Miles and revenue of a single movement
pub trait Haul {
    fn miles(&self) -> f64;
    fn revenue(&self) -> f64;
}

impl Haul for LoadRow {
    fn miles(&self) -> f64 {
        self.miles_total()
    }

    fn revenue(&self) -> f64 {
        self.revenue
    }
}

impl<H: Haul> Haul for &H {
    fn miles(&self) -> f64 {
        H::miles(*self)
    }

    fn revenue(&self) -> f64 {
        H::revenue(*self)
    }
}

/// Revenue over miles for loads that actually moved
///
/// Ratio of sums over loads with miles; zero-mile loads are ignored on both
/// sides. Returns 0 when nothing moved.
pub fn avg_rpm<H: Haul>(loads: &[H]) -> f64 {
    let (miles, revenue) = loads
        .iter()
        .filter(|l| l.miles() > 0.0)
        .fold((0.0, 0.0), |(m, r), l| (m + l.miles(), r + l.revenue()));
    if miles > 0.0 {
        revenue / miles
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KpiFilters {
    pub basis: Basis,
    pub range_start: Option<NaiveDateTime>,
    pub range_end: Option<NaiveDateTime>,
    pub drivers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetKpis {
    pub loads: u32,
    pub miles: f64,
    pub empty_miles: f64,
    pub revenue: f64,
    pub fleet_rpm: f64,
    pub on_time_pct: u32,
    pub deadhead_pct: u32,
    /// Only computed when both ends of the range are set
    pub utilization_pct: Option<u32>,
}

fn in_window(load: &LoadRow, f: &KpiFilters) -> bool {
    if load.is_cancelled() {
        return false;
    }
    if !f.drivers.is_empty() && !f.drivers.iter().any(|d| *d == load.driver) {
        return false;
    }
    let Some(date) = load.basis_date(f.basis) else {
        return false;
    };
    !(f.range_start.is_some_and(|s| date < s) || f.range_end.is_some_and(|e| date > e))
}

fn pct(part: f64, whole: f64) -> u32 {
    if whole > 0.0 {
        (part / whole * 100.0).round() as u32
    } else {
        0
    }
}

fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Average share of days in the range each driver spent on a load
fn utilization(legs: &[&LoadRow], start: NaiveDateTime, end: NaiveDateTime) -> u32 {
    let total_days = days_between(start.date(), end.date()).count().max(1);
    let mut busy: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();

    for leg in legs {
        let key = if leg.driver.is_empty() { "Unassigned" } else { leg.driver.as_str() };
        let days = busy.entry(key).or_default();
        if let (Some(ship), Some(del)) = (leg.pickup_date, leg.delivery_date) {
            let from = start.max(ship).date();
            let to = end.min(del).date();
            days.extend(days_between(from, to));
        }
    }

    if busy.is_empty() {
        return 0;
    }
    let per_driver: Vec<u32> = busy.values().map(|d| pct(d.len() as f64, total_days as f64)).collect();
    (per_driver.iter().sum::<u32>() as f64 / per_driver.len() as f64).round() as u32
}

pub fn build_kpis(loads: &[LoadRow], filters: &KpiFilters) -> FleetKpis {
    let legs: Vec<&LoadRow> = loads.iter().filter(|l| in_window(l, filters)).collect();

    let miles: f64 = legs.iter().map(|l| l.miles_total()).sum();
    let empty_miles: f64 = legs.iter().map(|l| l.miles_empty).sum();
    let revenue: f64 = legs.iter().map(|l| l.revenue).sum();
    let on_time = legs.iter().filter(|l| l.is_on_time()).count();

    let utilization_pct = match (filters.range_start, filters.range_end) {
        (Some(s), Some(e)) if s <= e => Some(utilization(&legs, s, e)),
        _ => None,
    };

    FleetKpis {
        loads: legs.len() as u32,
        miles,
        empty_miles,
        revenue,
        fleet_rpm: if miles > 0.0 { revenue / miles } else { 0.0 },
        on_time_pct: pct(on_time as f64, legs.len() as f64),
        deadhead_pct: pct(empty_miles, miles),
        utilization_pct,
    }
}
