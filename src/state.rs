//! Dashboard state: filter selection plus the raw rows of each source
//!
//! Each dashboard owns its own store. Updates replace the snapshot and
//! notify every subscriber; readers only ever see whole snapshots.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::finance::FinanceFilters;
use crate::kpi::KpiFilters;
use crate::lanes::LaneOptions;
use crate::models::{Basis, RawRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardFilters {
    pub basis: Basis,
    pub date_range: DateRange,
    pub selected_driver_ids: Vec<String>,
    pub selected_truck_ids: Vec<String>,
}

impl DashboardFilters {
    /// Lane options; an open range end is widened to the extreme date
    pub fn lane_options(&self) -> LaneOptions {
        LaneOptions {
            start: self.date_range.start.unwrap_or(NaiveDateTime::MIN),
            end: self.date_range.end.unwrap_or(NaiveDateTime::MAX),
            basis: self.basis,
            driver_ids: self.selected_driver_ids.clone(),
        }
    }

    pub fn finance_filters(&self) -> FinanceFilters {
        FinanceFilters {
            basis: self.basis,
            range_start: self.date_range.start,
            range_end: self.date_range.end,
            trucks: self.selected_truck_ids.clone(),
            drivers: self.selected_driver_ids.clone(),
        }
    }

    pub fn kpi_filters(&self) -> KpiFilters {
        KpiFilters {
            basis: self.basis,
            range_start: self.date_range.start,
            range_end: self.date_range.end,
            drivers: self.selected_driver_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Loads,
    Fuel,
    Expenses,
}

/// Raw rows per source, shared by reference between snapshots
#[derive(Debug, Clone, Default)]
pub struct CsvData {
    pub loads_rows: Arc<Vec<RawRow>>,
    pub fuel_rows: Arc<Vec<RawRow>>,
    pub expense_rows: Arc<Vec<RawRow>>,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub revision: u64,
    pub filters: DashboardFilters,
    pub data: CsvData,
}

#[derive(Debug)]
pub struct DashboardStore {
    tx: watch::Sender<Snapshot>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that is marked changed on every update
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn update_filters(&self, update: impl FnOnce(&mut DashboardFilters)) {
        self.tx.send_modify(|snap| {
            update(&mut snap.filters);
            snap.revision += 1;
            debug!(revision = snap.revision, "filters updated");
        });
    }

    pub fn set_filters(&self, filters: DashboardFilters) {
        self.update_filters(|f| *f = filters);
    }

    /// Replace one source's rows; untouched sources keep their identity
    pub fn set_rows(&self, kind: RowKind, rows: Vec<RawRow>) {
        let rows = Arc::new(rows);
        self.tx.send_modify(|snap| {
            debug!(?kind, count = rows.len(), "rows replaced");
            match kind {
                RowKind::Loads => snap.data.loads_rows = rows,
                RowKind::Fuel => snap.data.fuel_rows = rows,
                RowKind::Expenses => snap.data.expense_rows = rows,
            }
            snap.revision += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRow {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_updates_bump_revision() {
        let store = DashboardStore::new();
        assert_eq!(store.snapshot().revision, 0);
        store.update_filters(|f| f.basis = Basis::Delivery);
        store.set_rows(RowKind::Loads, vec![raw(json!({"Truck": "1"}))]);
        let snap = store.snapshot();
        assert_eq!(snap.revision, 2);
        assert_eq!(snap.filters.basis, Basis::Delivery);
        assert_eq!(snap.data.loads_rows.len(), 1);
    }

    #[test]
    fn test_set_rows_keeps_other_sources() {
        let store = DashboardStore::new();
        store.set_rows(RowKind::Fuel, vec![raw(json!({"Unit": "1"}))]);
        let before = store.snapshot();
        store.set_rows(RowKind::Loads, vec![]);
        let after = store.snapshot();
        assert!(Arc::ptr_eq(&before.data.fuel_rows, &after.data.fuel_rows));
        assert!(!Arc::ptr_eq(&before.data.loads_rows, &after.data.loads_rows));
    }

    #[test]
    fn test_subscribers_notified() {
        let store = DashboardStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());
        store.update_filters(|f| f.selected_driver_ids = vec!["Ann".into()]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().filters.selected_driver_ids, vec!["Ann".to_string()]);
    }

    #[test]
    fn test_independent_stores() {
        let a = DashboardStore::new();
        let b = DashboardStore::new();
        a.update_filters(|f| f.basis = Basis::Delivery);
        assert_eq!(b.snapshot().filters.basis, Basis::Pickup);
    }

    #[test]
    fn test_open_range_lane_options() {
        let opts = DashboardFilters::default().lane_options();
        assert_eq!(opts.start, NaiveDateTime::MIN);
        assert_eq!(opts.end, NaiveDateTime::MAX);
    }
}
