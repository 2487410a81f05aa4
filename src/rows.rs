//! Raw spreadsheet records -> canonical load, fuel and expense rows
//!
//! Normalization never fails. Rows without a truck or driver are dropped,
//! as are cash advances in fuel exports.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::columns::{resolve, ExpenseColumns, FuelColumns, LoadColumns};
use crate::models::{ExpenseRow, FuelRow, LoadRow, RawRow};
use crate::normalize::{to_date, to_number, to_text};

static CASH_ADVANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CADV|CASH\s*ADV").expect("valid regex"));

pub fn is_cash_advance(item: &str) -> bool {
    CASH_ADVANCE.is_match(item)
}

fn has_identity(truck: &str, driver: &str) -> bool {
    !truck.is_empty() || !driver.is_empty()
}

pub fn normalize_loads(rows: &[RawRow]) -> Vec<LoadRow> {
    normalize_loads_with(rows, &LoadColumns::default())
}

pub fn normalize_loads_with(rows: &[RawRow], cols: &LoadColumns) -> Vec<LoadRow> {
    let out: Vec<LoadRow> = rows
        .iter()
        .map(|row| {
            let text = |names: &[String]| to_text(resolve(row, names));
            let number = |names: &[String]| to_number(resolve(row, names));
            LoadRow {
                load_number: text(&cols.load_number),
                truck: text(&cols.truck),
                driver: text(&cols.driver),
                pickup_date: to_date(resolve(row, &cols.pickup_date)),
                delivery_date: to_date(resolve(row, &cols.delivery_date)),
                pickup_city: text(&cols.pickup_city),
                pickup_state: text(&cols.pickup_state),
                delivery_city: text(&cols.delivery_city),
                delivery_state: text(&cols.delivery_state),
                shipper_name: text(&cols.shipper_name),
                shipper_address: text(&cols.shipper_address),
                receiver_name: text(&cols.receiver_name),
                receiver_address: text(&cols.receiver_address),
                miles_loaded: number(&cols.miles_loaded).max(0.0),
                miles_empty: number(&cols.miles_empty).max(0.0),
                revenue: number(&cols.revenue),
                status: text(&cols.status),
                shipper_arrival_status: text(&cols.shipper_arrival_status),
                receiver_arrival_status: text(&cols.receiver_arrival_status),
            }
        })
        .filter(|l| has_identity(&l.truck, &l.driver))
        .collect();

    debug!("normalized {} of {} load rows", out.len(), rows.len());
    out
}

pub fn normalize_fuel(rows: &[RawRow]) -> Vec<FuelRow> {
    normalize_fuel_with(rows, &FuelColumns::default())
}

pub fn normalize_fuel_with(rows: &[RawRow], cols: &FuelColumns) -> Vec<FuelRow> {
    let out: Vec<FuelRow> = rows
        .iter()
        .map(|row| FuelRow {
            date: to_date(resolve(row, &cols.date)),
            truck: to_text(resolve(row, &cols.truck)),
            driver: to_text(resolve(row, &cols.driver)),
            item: to_text(resolve(row, &cols.item)),
            gallons: to_number(resolve(row, &cols.gallons)),
            amount: to_number(resolve(row, &cols.amount)),
        })
        .filter(|f| has_identity(&f.truck, &f.driver) && !is_cash_advance(&f.item))
        .collect();

    debug!("normalized {} of {} fuel rows", out.len(), rows.len());
    out
}

pub fn normalize_expenses(rows: &[RawRow]) -> Vec<ExpenseRow> {
    normalize_expenses_with(rows, &ExpenseColumns::default())
}

pub fn normalize_expenses_with(rows: &[RawRow], cols: &ExpenseColumns) -> Vec<ExpenseRow> {
    let out: Vec<ExpenseRow> = rows
        .iter()
        .map(|row| {
            let notes = to_text(resolve(row, &cols.notes));
            ExpenseRow {
                date: to_date(resolve(row, &cols.date)),
                amount: to_number(resolve(row, &cols.amount)),
                category: to_text(resolve(row, &cols.category)),
                vendor: to_text(resolve(row, &cols.vendor)),
                driver: to_text(resolve(row, &cols.driver)),
                truck: to_text(resolve(row, &cols.truck)),
                notes: (!notes.is_empty()).then_some(notes),
            }
        })
        .filter(|e| has_identity(&e.truck, &e.driver))
        .collect();

    debug!("normalized {} of {} expense rows", out.len(), rows.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn rows(v: Value) -> Vec<RawRow> {
        v.as_array().unwrap().iter().map(|r| r.as_object().cloned().unwrap()).collect()
    }

    #[test]
    fn test_load_aliases_and_values() {
        let raw = rows(json!([{
            "Load #": "L-1",
            "Truck #": "101",
            "Drivers": " Ann Lee ",
            "Ship Date": 45239,
            "Del. Date": "2023-11-10 08:30",
            "1st Shipper City": "Kansas City",
            "1st Shipper State": "MO",
            "Last Receiver City": "Omaha",
            "Last Receiver State": "NE",
            "Miles": "180",
            "Empty Miles": "20",
            "Carrier Revenue": "$1,100.00",
            "Load Status": "",
            "Status": "Completed"
        }]));
        let loads = normalize_loads(&raw);
        assert_eq!(loads.len(), 1);
        let l = &loads[0];
        assert_eq!(l.load_number, "L-1");
        assert_eq!(l.truck, "101");
        assert_eq!(l.driver, "Ann Lee");
        assert_eq!(l.pickup_date.unwrap().date(), NaiveDate::from_ymd_opt(2023, 11, 9).unwrap());
        assert_eq!(l.delivery_date.unwrap().date(), NaiveDate::from_ymd_opt(2023, 11, 10).unwrap());
        assert_eq!(l.miles_total(), 200.0);
        assert_eq!(l.revenue, 1100.0);
        assert_eq!(l.status, "Completed");
    }

    #[test]
    fn test_loads_without_identity_dropped() {
        let raw = rows(json!([
            {"Truck": "", "Drivers": "", "Revenue": 500},
            {"Truck": "", "Drivers": "Bo", "Revenue": 400},
            {"Truck": "7", "Revenue": 300}
        ]));
        let loads = normalize_loads(&raw);
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].driver, "Bo");
        assert_eq!(loads[1].truck, "7");
    }

    #[test]
    fn test_cancelled_loads_kept_with_status() {
        let raw = rows(json!([{"Truck": "7", "Load Status": "Cancelled"}]));
        let loads = normalize_loads(&raw);
        assert_eq!(loads.len(), 1);
        assert!(loads[0].is_cancelled());
    }

    #[test]
    fn test_negative_miles_clamped() {
        let raw = rows(json!([{"Truck": "7", "Miles": -50, "Empty Miles": "12"}]));
        let loads = normalize_loads(&raw);
        assert_eq!(loads[0].miles_loaded, 0.0);
        assert_eq!(loads[0].miles_empty, 12.0);
    }

    #[test]
    fn test_fuel_excludes_cash_advances() {
        let raw = rows(json!([
            {"Date": "2024-03-01", "Unit": "101", "Item": "ULSD", "Gallons": "100", "Amount": "$389.00"},
            {"Date": "2024-03-01", "Unit": "101", "Item": "DEF", "Gallons": "5", "Amount": "20"},
            {"Date": "2024-03-01", "Unit": "101", "Item": "CADV", "Amount": "200"},
            {"Date": "2024-03-01", "Unit": "101", "Item": "Cash Adv", "Amount": "150"},
            {"Date": "2024-03-01", "Unit": "", "Item": "ULSD", "Amount": "50"}
        ]));
        let fuel = normalize_fuel(&raw);
        assert_eq!(fuel.len(), 2);
        assert_eq!(fuel[0].amount, 389.0);
        assert_eq!(fuel[1].item, "DEF");
    }

    #[test]
    fn test_expenses() {
        let raw = rows(json!([
            {"Date": "03/05/2024", "Amount": "1,250", "Category": "Repair", "Vendor": "Shop", "Truck": "101", "Notes": ""},
            {"Date": "03/06/2024", "Amount": "80", "Category": "Tolls", "Driver": "Ann Lee", "Memo": "I-80"}
        ]));
        let exps = normalize_expenses(&raw);
        assert_eq!(exps.len(), 2);
        assert_eq!(exps[0].amount, 1250.0);
        assert_eq!(exps[0].notes, None);
        assert_eq!(exps[1].notes.as_deref(), Some("I-80"));
        assert_eq!(exps[1].date.unwrap().date(), NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    }

    #[test]
    fn test_custom_columns() {
        let cols = LoadColumns { truck: vec!["Power Unit".into()], ..Default::default() };
        let raw = rows(json!([{"Power Unit": "PU-3"}]));
        assert_eq!(normalize_loads_with(&raw, &cols)[0].truck, "PU-3");
    }
}
