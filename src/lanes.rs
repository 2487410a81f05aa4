//! Lane profitability
//!
//! Completed loads are grouped into undirected origin/destination lanes so
//! that A→B and B→A traffic lands in one corridor. Lanes are ranked by
//! revenue with their share and running (Pareto) share of fleet revenue, and
//! can be re-ranked by load count.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Basis, LaneRow, LoadRow};

/// Cumulative revenue share that bounds the Pareto core of lanes
pub const PARETO_THRESHOLD_PCT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneOptions {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub basis: Basis,
    pub driver_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneSummary {
    pub rows: Vec<LaneRow>,
    pub fleet_revenue: f64,
}

/// What the share and Pareto columns of a lane ranking are measured in
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RankBy {
    #[default]
    Revenue,
    Loads,
}

impl RankBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revenue" => Some(RankBy::Revenue),
            "loads" => Some(RankBy::Loads),
            _ => None,
        }
    }
}

/// A lane with its share of the ranking total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLane {
    #[serde(flatten)]
    pub lane: LaneRow,
    pub share_pct: f64,
    pub cum_share_pct: f64,
    pub pareto: bool,
}

impl LaneSummary {
    pub fn fleet_loads(&self) -> u32 {
        self.rows.iter().map(|r| r.loads).sum()
    }

    /// Lanes ordered by `rank_by`, descending, with running share
    ///
    /// Ties keep the revenue order. A zero total gives zero shares.
    pub fn ranked(&self, rank_by: RankBy) -> Vec<RankedLane> {
        let mut rows: Vec<&LaneRow> = self.rows.iter().collect();
        let total = match rank_by {
            RankBy::Revenue => self.fleet_revenue,
            RankBy::Loads => {
                rows.sort_by(|a, b| b.loads.cmp(&a.loads));
                f64::from(self.fleet_loads())
            }
        };

        let mut cumulative = 0.0;
        rows.into_iter()
            .map(|lane| {
                let value = match rank_by {
                    RankBy::Revenue => lane.total_revenue,
                    RankBy::Loads => f64::from(lane.loads),
                };
                let share_pct = if total != 0.0 { value / total * 100.0 } else { 0.0 };
                cumulative += share_pct;
                RankedLane {
                    lane: lane.clone(),
                    share_pct,
                    cum_share_pct: cumulative,
                    pareto: cumulative <= PARETO_THRESHOLD_PCT,
                }
            })
            .collect()
    }
}

pub fn normalize_place(s: &str) -> String {
    s.trim().to_uppercase()
}

fn place_label(city: &str, state: &str) -> String {
    match (city.is_empty(), state.is_empty()) {
        (false, false) => format!("{}, {}", city, state),
        (false, true) => city.to_string(),
        (true, false) => state.to_string(),
        (true, true) => "UNKNOWN".to_string(),
    }
}

/// Canonical (left, right) endpoints of the undirected lane a load moves on
///
/// The endpoint whose city sorts first becomes the left side; state breaks
/// ties between same-named cities.
pub fn lane_endpoints(load: &LoadRow) -> (String, String) {
    let origin = (normalize_place(&load.pickup_city), normalize_place(&load.pickup_state));
    let dest = (normalize_place(&load.delivery_city), normalize_place(&load.delivery_state));
    let (left, right) = if dest < origin { (dest, origin) } else { (origin, dest) };
    (place_label(&left.0, &left.1), place_label(&right.0, &right.1))
}

pub fn lane_key(left: &str, right: &str) -> String {
    format!("{} ↔ {}", left, right)
}

impl LaneRow {
    pub fn in_pareto_core(&self) -> bool {
        self.cum_pct_of_fleet_revenue <= PARETO_THRESHOLD_PCT
    }
}

#[derive(Default)]
struct LaneAccum {
    origin: String,
    destination: String,
    loads: u32,
    revenue: f64,
    miles: f64,
    rpm_sum: f64,
    rpm_count: u32,
    last_moved: Option<NaiveDateTime>,
}

fn included(load: &LoadRow, opts: &LaneOptions) -> bool {
    if !load.is_completed() {
        return false;
    }
    let in_range = load
        .basis_date(opts.basis)
        .is_some_and(|d| d >= opts.start && d <= opts.end);
    in_range && (opts.driver_ids.is_empty() || opts.driver_ids.iter().any(|d| *d == load.driver))
}

/// Group completed loads in the window into ranked lane rows
///
/// Average RPM is the mean of per-load RPM over loads that have miles, not
/// lane revenue over lane miles.
pub fn build_lane_rows(rows: &[LoadRow], opts: &LaneOptions) -> LaneSummary {
    let mut lanes: HashMap<String, LaneAccum> = HashMap::new();

    for load in rows.iter().filter(|l| included(l, opts)) {
        let (origin, destination) = lane_endpoints(load);
        let entry = lanes.entry(lane_key(&origin, &destination)).or_insert_with(|| LaneAccum {
            origin,
            destination,
            ..Default::default()
        });

        let miles = load.miles_total();
        entry.loads += 1;
        entry.revenue += load.revenue;
        entry.miles += miles;
        if miles > 0.0 {
            entry.rpm_sum += load.revenue / miles;
            entry.rpm_count += 1;
        }
        if load.delivery_date > entry.last_moved {
            entry.last_moved = load.delivery_date;
        }
    }

    let fleet_revenue: f64 = lanes.values().map(|a| a.revenue).sum();

    let mut ranked: Vec<(String, LaneAccum)> = lanes.into_iter().collect();
    ranked.sort_by(|a, b| b.1.revenue.total_cmp(&a.1.revenue).then_with(|| a.0.cmp(&b.0)));

    let mut cumulative = 0.0;
    let rows = ranked
        .into_iter()
        .map(|(lane, a)| {
            let loads = a.loads as f64;
            let pct = if fleet_revenue != 0.0 { a.revenue / fleet_revenue * 100.0 } else { 0.0 };
            cumulative += pct;
            LaneRow {
                lane,
                origin: a.origin,
                destination: a.destination,
                loads: a.loads,
                total_revenue: a.revenue,
                avg_revenue_per_load: a.revenue / loads,
                avg_total_miles_per_load: a.miles / loads,
                avg_rpm: if a.rpm_count > 0 { a.rpm_sum / a.rpm_count as f64 } else { 0.0 },
                pct_of_fleet_revenue: pct,
                cum_pct_of_fleet_revenue: cumulative,
                last_moved: a.last_moved,
            }
        })
        .collect();

    LaneSummary { rows, fleet_revenue }
}
