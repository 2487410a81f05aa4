//! Memoized views over a dashboard snapshot
//!
//! A view is recomputed only when the raw row arrays it reads (compared by
//! identity) or its slice of the filters change.

use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::columns::ColumnMap;
use crate::finance::{build_finance, FinanceFilters, FinanceSummary};
use crate::kpi::{build_kpis, FleetKpis, KpiFilters};
use crate::lanes::{build_lane_rows, LaneOptions, LaneSummary};
use crate::models::{RawRow, Timegrain};
use crate::rows::{normalize_expenses_with, normalize_fuel_with, normalize_loads_with};
use crate::state::Snapshot;

/// Row array compared by pointer identity
#[derive(Debug, Clone)]
struct RowsRef(Arc<Vec<RawRow>>);

impl PartialEq for RowsRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Single-slot cache keyed by the last inputs
#[derive(Debug)]
struct Memo<K, V> {
    name: &'static str,
    slot: Mutex<Option<(K, Arc<V>)>>,
}

impl<K: PartialEq, V> Memo<K, V> {
    fn new(name: &'static str) -> Self {
        Self { name, slot: Mutex::new(None) }
    }

    fn get_or_compute(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((cached_key, value)) = slot.as_ref() {
            if *cached_key == key {
                debug!(view = self.name, "memo hit");
                return Arc::clone(value);
            }
        }
        debug!(view = self.name, "memo miss");
        let value = Arc::new(compute());
        *slot = Some((key, Arc::clone(&value)));
        value
    }
}

#[derive(Debug, PartialEq)]
struct LaneKey {
    loads: RowsRef,
    opts: LaneOptions,
}

#[derive(Debug, PartialEq)]
struct FinanceKey {
    loads: RowsRef,
    fuel: RowsRef,
    expenses: RowsRef,
    filters: FinanceFilters,
    grain: Timegrain,
}

#[derive(Debug, PartialEq)]
struct KpiKey {
    loads: RowsRef,
    filters: KpiFilters,
}

/// Lane, finance and KPI views for one dashboard
#[derive(Debug)]
pub struct DashboardViews {
    columns: ColumnMap,
    lanes: Memo<LaneKey, LaneSummary>,
    finance: Memo<FinanceKey, FinanceSummary>,
    kpis: Memo<KpiKey, FleetKpis>,
}

impl Default for DashboardViews {
    fn default() -> Self {
        Self::new(ColumnMap::default())
    }
}

impl DashboardViews {
    pub fn new(columns: ColumnMap) -> Self {
        Self {
            columns,
            lanes: Memo::new("lanes"),
            finance: Memo::new("finance"),
            kpis: Memo::new("kpis"),
        }
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    pub fn lane_view(&self, snap: &Snapshot) -> Arc<LaneSummary> {
        let key = LaneKey {
            loads: RowsRef(Arc::clone(&snap.data.loads_rows)),
            opts: snap.filters.lane_options(),
        };
        self.lanes.get_or_compute(key, || {
            let loads = normalize_loads_with(&snap.data.loads_rows, &self.columns.loads);
            build_lane_rows(&loads, &snap.filters.lane_options())
        })
    }

    pub fn finance_view(&self, snap: &Snapshot, grain: Timegrain) -> Arc<FinanceSummary> {
        let key = FinanceKey {
            loads: RowsRef(Arc::clone(&snap.data.loads_rows)),
            fuel: RowsRef(Arc::clone(&snap.data.fuel_rows)),
            expenses: RowsRef(Arc::clone(&snap.data.expense_rows)),
            filters: snap.filters.finance_filters(),
            grain,
        };
        self.finance.get_or_compute(key, || {
            let loads = normalize_loads_with(&snap.data.loads_rows, &self.columns.loads);
            let fuel = normalize_fuel_with(&snap.data.fuel_rows, &self.columns.fuel);
            let expenses = normalize_expenses_with(&snap.data.expense_rows, &self.columns.expenses);
            build_finance(&loads, &fuel, &expenses, &snap.filters.finance_filters(), grain)
        })
    }

    pub fn kpi_view(&self, snap: &Snapshot) -> Arc<FleetKpis> {
        let key = KpiKey {
            loads: RowsRef(Arc::clone(&snap.data.loads_rows)),
            filters: snap.filters.kpi_filters(),
        };
        self.kpis.get_or_compute(key, || {
            let loads = normalize_loads_with(&snap.data.loads_rows, &self.columns.loads);
            build_kpis(&loads, &snap.filters.kpi_filters())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Basis;
    use crate::state::{DashboardStore, RowKind};
    use serde_json::json;

    fn loads() -> Vec<RawRow> {
        json!([
            {"Truck": "101", "Drivers": "Ann", "Ship Date": "2024-03-04", "Del. Date": "2024-03-05",
             "1st Shipper City": "Omaha", "1st Shipper State": "NE",
             "Last Receiver City": "Kansas City", "Last Receiver State": "MO",
             "Miles": "190", "Hauling Fee": "900", "Load Status": "Completed"},
            {"Truck": "202", "Drivers": "Bo", "Ship Date": "2024-03-06", "Del. Date": "2024-03-07",
             "1st Shipper City": "Kansas City", "1st Shipper State": "MO",
             "Last Receiver City": "Omaha", "Last Receiver State": "NE",
             "Miles": "190", "Hauling Fee": "600", "Load Status": "Completed"}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_object().cloned().unwrap())
        .collect()
    }

    #[test]
    fn test_lane_view_memoized() {
        let store = DashboardStore::new();
        store.set_rows(RowKind::Loads, loads());
        let views = DashboardViews::default();

        let first = views.lane_view(&store.snapshot());
        let second = views.lane_view(&store.snapshot());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.rows.len(), 1);
        assert_eq!(first.rows[0].loads, 2);
        assert_eq!(first.fleet_revenue, 1500.0);
    }

    #[test]
    fn test_filter_change_recomputes() {
        let store = DashboardStore::new();
        store.set_rows(RowKind::Loads, loads());
        let views = DashboardViews::default();

        let all = views.lane_view(&store.snapshot());
        store.update_filters(|f| f.selected_driver_ids = vec!["Bo".into()]);
        let bo = views.lane_view(&store.snapshot());
        assert!(!Arc::ptr_eq(&all, &bo));
        assert_eq!(bo.fleet_revenue, 600.0);
    }

    #[test]
    fn test_unrelated_filter_keeps_lane_cache() {
        let store = DashboardStore::new();
        store.set_rows(RowKind::Loads, loads());
        let views = DashboardViews::default();

        let before = views.lane_view(&store.snapshot());
        store.update_filters(|f| f.selected_truck_ids = vec!["101".into()]);
        let after = views.lane_view(&store.snapshot());
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_finance_view_per_timegrain() {
        let store = DashboardStore::new();
        store.set_rows(RowKind::Loads, loads());
        store.update_filters(|f| f.basis = Basis::Delivery);
        let views = DashboardViews::default();

        let snap = store.snapshot();
        let daily = views.finance_view(&snap, Timegrain::Day);
        let monthly = views.finance_view(&snap, Timegrain::Month);
        assert_eq!(daily.by_truck.len(), 2);
        assert_eq!(monthly.by_truck.len(), 2);
        assert_eq!(monthly.fleet_totals.revenue, 1500.0);
        assert_eq!(monthly.fleet_totals.loads, 2);
    }

    #[test]
    fn test_kpi_view() {
        let store = DashboardStore::new();
        store.set_rows(RowKind::Loads, loads());
        let views = DashboardViews::default();
        let k = views.kpi_view(&store.snapshot());
        assert_eq!(k.loads, 2);
        assert_eq!(k.miles, 380.0);
    }
}
