//! Shared logic behind the REST handlers
//!
//! One service owns one dashboard: its store, its memoized views and the
//! sources it reloads from.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::DataSources;
use crate::finance::FinanceSummary;
use crate::ingest::load_into_store;
use crate::kpi::FleetKpis;
use crate::lanes::{build_lane_rows, LaneOptions, LaneSummary, RankBy};
use crate::models::{Basis, Timegrain};
use crate::rows::normalize_loads_with;
use crate::selectors::DashboardViews;
use crate::state::{DashboardFilters, DashboardStore, RowKind};

/// Rows loaded per source by a reload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReloadSummary {
    pub revision: u64,
    pub loads: Option<usize>,
    pub fuel: Option<usize>,
    pub expenses: Option<usize>,
}

/// Why a lane query was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaneQueryError {
    #[error("missing required parameter '{0}'")]
    Missing(&'static str),
    #[error("invalid date for '{param}': {value}")]
    InvalidDate { param: &'static str, value: String },
    #[error("invalid basis '{0}', expected pickup or delivery")]
    InvalidBasis(String),
    #[error("invalid rank_by '{0}', expected revenue or loads")]
    InvalidRankBy(String),
}

/// A parsed `/api/lanes` query
#[derive(Debug, Clone, PartialEq)]
pub struct LaneQuery {
    pub opts: LaneOptions,
    pub rank_by: RankBy,
}

/// Parse a query date bound; a bare date used as an end covers the whole day
pub fn parse_bound(value: &str, inclusive_end: bool) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if inclusive_end {
            NaiveTime::from_hms_opt(23, 59, 59)?
        } else {
            NaiveTime::MIN
        };
        return Some(date.and_time(time));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Build a lane query from raw query pairs
///
/// `start` and `end` are required. `basis` defaults to pickup and `rank_by`
/// to revenue. Drivers may be repeated as `drivers[]` or `drivers`.
pub fn lane_options_from_query(params: &[(String, String)]) -> Result<LaneQuery, LaneQueryError> {
    let get = |name: &str| params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

    let basis = match get("basis").map(str::trim) {
        None | Some("") | Some("pickup") => Basis::Pickup,
        Some("delivery") => Basis::Delivery,
        Some(other) => return Err(LaneQueryError::InvalidBasis(other.to_string())),
    };

    let rank_by = match get("rank_by").map(str::trim) {
        None | Some("") => RankBy::default(),
        Some(raw) => RankBy::parse(raw).ok_or_else(|| LaneQueryError::InvalidRankBy(raw.to_string()))?,
    };

    let bound = |param: &'static str, inclusive_end: bool| {
        let raw = get(param).filter(|v| !v.trim().is_empty()).ok_or(LaneQueryError::Missing(param))?;
        parse_bound(raw, inclusive_end).ok_or_else(|| LaneQueryError::InvalidDate {
            param,
            value: raw.to_string(),
        })
    };
    let start = bound("start", false)?;
    let end = bound("end", true)?;

    let driver_ids = params
        .iter()
        .filter(|(k, v)| (k == "drivers[]" || k == "drivers") && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
        .collect();

    Ok(LaneQuery {
        opts: LaneOptions { start, end, basis, driver_ids },
        rank_by,
    })
}

pub struct AnalyticsService {
    store: DashboardStore,
    views: DashboardViews,
    sources: DataSources,
}

impl AnalyticsService {
    pub fn new(sources: DataSources) -> Result<Self> {
        let columns = sources.column_map()?;
        Ok(Self {
            store: DashboardStore::new(),
            views: DashboardViews::new(columns),
            sources,
        })
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    pub fn lanes(&self) -> Arc<LaneSummary> {
        self.views.lane_view(&self.store.snapshot())
    }

    pub fn finance(&self, grain: Timegrain) -> Arc<FinanceSummary> {
        self.views.finance_view(&self.store.snapshot(), grain)
    }

    pub fn kpis(&self) -> Arc<FleetKpis> {
        self.views.kpi_view(&self.store.snapshot())
    }

    pub fn filters(&self) -> DashboardFilters {
        self.store.snapshot().filters
    }

    pub fn set_filters(&self, filters: DashboardFilters) -> DashboardFilters {
        self.store.set_filters(filters);
        self.filters()
    }

    /// Lanes for an explicit query, independent of the dashboard filters
    pub fn query_lanes(&self, opts: &LaneOptions) -> LaneSummary {
        let snap = self.store.snapshot();
        let loads = normalize_loads_with(&snap.data.loads_rows, &self.views.columns().loads);
        build_lane_rows(&loads, opts)
    }

    /// Re-read every configured source into the store
    pub async fn reload(&self) -> Result<ReloadSummary> {
        let counts = match load_into_store(&self.store, &self.sources).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!("Reload failed: {:#}", e);
                return Err(e);
            }
        };

        let mut summary = ReloadSummary {
            revision: self.store.snapshot().revision,
            ..Default::default()
        };
        for (kind, count) in counts {
            match kind {
                RowKind::Loads => summary.loads = Some(count),
                RowKind::Fuel => summary.fuel = Some(count),
                RowKind::Expenses => summary.expenses = Some(count),
            }
        }
        info!(revision = summary.revision, "Reloaded data sources");
        Ok(summary)
    }
}
