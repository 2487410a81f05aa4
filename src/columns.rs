//! Header aliases per logical field
//!
//! Exports from different dispatch and fuel-card systems name the same
//! column differently. Each field lists the headers it may appear under, in
//! priority order; the first non-empty match wins.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::models::RawRow;

pub type Aliases = Vec<String>;

fn aliases(names: &[&str]) -> Aliases {
    names.iter().map(|s| s.to_string()).collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// First non-empty value among `names`, or `Null`
pub fn resolve<'a>(row: &'a RawRow, names: &[String]) -> &'a Value {
    names
        .iter()
        .filter_map(|name| row.get(name))
        .find(|v| !is_blank(v))
        .unwrap_or(&Value::Null)
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadColumns {
    pub load_number: Aliases,
    pub truck: Aliases,
    pub driver: Aliases,
    pub pickup_date: Aliases,
    pub delivery_date: Aliases,
    pub pickup_city: Aliases,
    pub pickup_state: Aliases,
    pub delivery_city: Aliases,
    pub delivery_state: Aliases,
    pub shipper_name: Aliases,
    pub shipper_address: Aliases,
    pub receiver_name: Aliases,
    pub receiver_address: Aliases,
    pub miles_loaded: Aliases,
    pub miles_empty: Aliases,
    pub revenue: Aliases,
    pub status: Aliases,
    pub shipper_arrival_status: Aliases,
    pub receiver_arrival_status: Aliases,
}

impl Default for LoadColumns {
    fn default() -> Self {
        Self {
            load_number: aliases(&["Load #", "Load Number", "Load ID"]),
            truck: aliases(&["Truck", "Truck #", "Truck Number", "Unit", "Tractor"]),
            driver: aliases(&["Drivers", "Driver", "Driver Name"]),
            pickup_date: aliases(&["Ship Date", "Pickup Date", "PU Date"]),
            delivery_date: aliases(&["Del. Date", "Delivery Date", "DEL Date"]),
            pickup_city: aliases(&["1st Shipper City", "Origin City", "Pickup City"]),
            pickup_state: aliases(&["1st Shipper State", "Origin State", "Pickup State"]),
            delivery_city: aliases(&["Last Receiver City", "Destination City", "Dest City", "Delivery City"]),
            delivery_state: aliases(&["Last Receiver State", "Destination State", "Dest State", "Delivery State"]),
            shipper_name: aliases(&["Shipper", "Shipper Name"]),
            shipper_address: aliases(&["1st Shipper Address", "Shipper Address"]),
            receiver_name: aliases(&["Receiver", "Receiver Name", "Consignee"]),
            receiver_address: aliases(&["Last Receiver Address", "Receiver Address"]),
            miles_loaded: aliases(&["Miles", "Loaded Miles", "Miles Loaded"]),
            miles_empty: aliases(&["Empty Miles", "Deadhead Miles", "Miles Empty"]),
            revenue: aliases(&["Hauling Fee", "Revenue", "Carrier Revenue", "Load Amount", "Carrier Line Haul"]),
            status: aliases(&["Load Status", "Status", "Receiver Arrival Status"]),
            shipper_arrival_status: aliases(&["Shipper Arrival Status"]),
            receiver_arrival_status: aliases(&["Receiver Arrival Status"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuelColumns {
    pub date: Aliases,
    pub truck: Aliases,
    pub driver: Aliases,
    pub item: Aliases,
    pub gallons: Aliases,
    pub amount: Aliases,
}

impl Default for FuelColumns {
    fn default() -> Self {
        Self {
            date: aliases(&["Date", "Transaction Date", "Tran Date", "Purchase Date"]),
            truck: aliases(&["Truck", "Truck #", "Unit", "Unit #"]),
            driver: aliases(&["Driver", "Driver Name", "Drivers"]),
            item: aliases(&["Item", "Product", "Category", "Fuel Type"]),
            gallons: aliases(&["Gallons", "Qty", "Quantity"]),
            amount: aliases(&["Amount", "Total", "Net Amount", "Total Amount"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExpenseColumns {
    pub date: Aliases,
    pub amount: Aliases,
    pub category: Aliases,
    pub vendor: Aliases,
    pub driver: Aliases,
    pub truck: Aliases,
    pub notes: Aliases,
}

impl Default for ExpenseColumns {
    fn default() -> Self {
        Self {
            date: aliases(&["Date", "Expense Date", "Transaction Date"]),
            amount: aliases(&["Amount", "Total", "Cost"]),
            category: aliases(&["Category", "Type", "Expense Type"]),
            vendor: aliases(&["Vendor", "Payee", "Merchant"]),
            driver: aliases(&["Driver", "Driver Name", "Drivers"]),
            truck: aliases(&["Truck", "Truck #", "Unit"]),
            notes: aliases(&["Notes", "Memo", "Description"]),
        }
    }
}

/// Alias tables for all three row kinds
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnMap {
    pub loads: LoadColumns,
    pub fuel: FuelColumns,
    pub expenses: ExpenseColumns,
}

impl ColumnMap {
    /// Read overrides from a JSON file; fields left out keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading column map {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing column map {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> RawRow {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_first_non_empty() {
        let cols = LoadColumns::default();
        let r = row(json!({"Revenue": "", "Carrier Revenue": "1,200", "Load Amount": "900"}));
        assert_eq!(resolve(&r, &cols.revenue), &json!("1,200"));
    }

    #[test]
    fn test_resolve_priority_order() {
        let cols = LoadColumns::default();
        let r = row(json!({"Truck Number": "T-9", "Truck": "T-1"}));
        assert_eq!(resolve(&r, &cols.truck), &json!("T-1"));
    }

    #[test]
    fn test_resolve_missing() {
        let r = row(json!({"Other": 1}));
        assert_eq!(resolve(&r, &FuelColumns::default().gallons), &Value::Null);
    }

    #[test]
    fn test_partial_override() {
        let map: ColumnMap = serde_json::from_value(json!({
            "loads": {"truck": ["Power Unit"]}
        }))
        .unwrap();
        assert_eq!(map.loads.truck, vec!["Power Unit".to_string()]);
        assert_eq!(map.loads.revenue, LoadColumns::default().revenue);
        assert_eq!(map.fuel, FuelColumns::default());
    }
}
