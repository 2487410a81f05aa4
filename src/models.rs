use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Raw record handed over by a row source: header name -> cell value
pub type RawRow = serde_json::Map<String, serde_json::Value>;

static CANCELLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cancel+\s*ed|cancelled|canceled").expect("valid regex"));

static LATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)late").expect("valid regex"));

/// True for any of the "cancelled" spellings found in load status columns
pub fn is_cancelled_status(status: &str) -> bool {
    CANCELLED.is_match(status)
}

/// Which load date decides whether a load falls inside a reporting range
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    #[default]
    Pickup,
    Delivery,
}

impl Basis {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pickup" | "ship" => Some(Basis::Pickup),
            "delivery" | "del" => Some(Basis::Delivery),
            _ => None,
        }
    }
}

/// Bucket granularity for finance rows
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Timegrain {
    #[default]
    Day,
    Week,
    Month,
}

impl Timegrain {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Timegrain::Day),
            "week" => Some(Timegrain::Week),
            "month" => Some(Timegrain::Month),
            _ => None,
        }
    }
}

/// One completed or cancelled freight movement
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadRow {
    pub load_number: String,
    pub truck: String,
    pub driver: String,
    pub pickup_date: Option<NaiveDateTime>,
    pub delivery_date: Option<NaiveDateTime>,
    pub pickup_city: String,
    pub pickup_state: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub shipper_name: String,
    pub shipper_address: String,
    pub receiver_name: String,
    pub receiver_address: String,
    pub miles_loaded: f64,
    pub miles_empty: f64,
    pub revenue: f64,
    pub status: String,
    pub shipper_arrival_status: String,
    pub receiver_arrival_status: String,
}

impl LoadRow {
    pub fn miles_total(&self) -> f64 {
        self.miles_loaded + self.miles_empty
    }

    pub fn is_cancelled(&self) -> bool {
        is_cancelled_status(&self.status)
    }

    pub fn is_completed(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("completed")
    }

    /// Late at either stop counts against on-time delivery
    pub fn is_on_time(&self) -> bool {
        !(LATE.is_match(&self.shipper_arrival_status) || LATE.is_match(&self.receiver_arrival_status))
    }

    pub fn basis_date(&self, basis: Basis) -> Option<NaiveDateTime> {
        match basis {
            Basis::Pickup => self.pickup_date,
            Basis::Delivery => self.delivery_date,
        }
    }
}

/// One fuel or fluid transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FuelRow {
    pub date: Option<NaiveDateTime>,
    pub truck: String,
    pub driver: String,
    pub item: String,
    pub gallons: f64,
    pub amount: f64,
}

/// One miscellaneous cost entry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRow {
    pub date: Option<NaiveDateTime>,
    pub amount: f64,
    pub category: String,
    pub vendor: String,
    pub driver: String,
    pub truck: String,
    pub notes: Option<String>,
}

/// Aggregate bucket keyed by (time bucket, truck)
///
/// The fleet-wide total uses the `"FLEET"` pseudo-truck and has no bucket.
/// Ratios are `None` whenever their denominator is zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinanceRow {
    pub bucket: Option<NaiveDate>,
    pub truck: String,
    pub revenue: f64,
    pub miles_loaded: f64,
    pub miles_empty: f64,
    pub miles_total: f64,
    pub loads: u32,
    pub fuel_gallons: f64,
    pub fuel_cost: f64,
    pub expenses: f64,
    pub rpm: Option<f64>,
    pub fuel_cpm: Option<f64>,
    pub gross_profit: f64,
    pub operating_ratio: Option<f64>,
}

/// Aggregate bucket keyed by an undirected origin/destination pair
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LaneRow {
    pub lane: String,
    pub origin: String,
    pub destination: String,
    pub loads: u32,
    pub total_revenue: f64,
    pub avg_revenue_per_load: f64,
    pub avg_total_miles_per_load: f64,
    pub avg_rpm: f64,
    pub pct_of_fleet_revenue: f64,
    pub cum_pct_of_fleet_revenue: f64,
    pub last_moved: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_spellings() {
        for s in ["Cancelled", "CANCELED", "cancell ed", "Load canceled by broker", "cancelllled"] {
            assert!(is_cancelled_status(s), "{s} should be cancelled");
        }
        for s in ["Completed", "", "Cancel pending"] {
            assert!(!is_cancelled_status(s), "{s} should not be cancelled");
        }
    }

    #[test]
    fn test_completed_status() {
        let mut load = LoadRow { status: " Completed ".into(), ..Default::default() };
        assert!(load.is_completed());
        load.status = "completed".into();
        assert!(load.is_completed());
        load.status = "Cancelled".into();
        assert!(!load.is_completed());
        assert!(load.is_cancelled());
    }

    #[test]
    fn test_on_time() {
        let mut load = LoadRow::default();
        assert!(load.is_on_time());
        load.receiver_arrival_status = "Late".into();
        assert!(!load.is_on_time());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!(Basis::parse("Delivery"), Some(Basis::Delivery));
        assert_eq!(Basis::parse("pickup"), Some(Basis::Pickup));
        assert_eq!(Basis::parse("revenue"), None);
        assert_eq!(Timegrain::parse("WEEK"), Some(Timegrain::Week));
        assert_eq!(Timegrain::parse("year"), None);
    }
}
