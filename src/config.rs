//! Runtime configuration shared by the binaries

use anyhow::Result;
use clap::Args;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::columns::ColumnMap;
use crate::state::RowKind;

/// Where a source's rows come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    Url(String),
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_string()))
        } else {
            Ok(DataSource::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => f.write_str(url),
        }
    }
}

/// Source and column options, flattened into each binary's arguments
#[derive(Debug, Clone, Default, Args)]
pub struct DataSources {
    /// Loads CSV file or published CSV link
    #[arg(long, env = "FLEET_LOADS")]
    pub loads: Option<DataSource>,

    /// Fuel transactions CSV file or link
    #[arg(long, env = "FLEET_FUEL")]
    pub fuel: Option<DataSource>,

    /// Expenses CSV file or link
    #[arg(long, env = "FLEET_EXPENSES")]
    pub expenses: Option<DataSource>,

    /// JSON file overriding column header aliases
    #[arg(long, env = "FLEET_COLUMNS")]
    pub columns: Option<PathBuf>,
}

impl DataSources {
    pub fn column_map(&self) -> Result<ColumnMap> {
        match &self.columns {
            Some(path) => ColumnMap::from_json_file(path),
            None => Ok(ColumnMap::default()),
        }
    }

    pub fn configured(&self) -> Vec<(RowKind, &DataSource)> {
        [
            (RowKind::Loads, self.loads.as_ref()),
            (RowKind::Fuel, self.fuel.as_ref()),
            (RowKind::Expenses, self.expenses.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, src)| src.map(|s| (kind, s)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            "https://docs.example.com/pub?output=csv".parse::<DataSource>().unwrap(),
            DataSource::Url("https://docs.example.com/pub?output=csv".into())
        );
        assert_eq!(
            "data/loads.csv".parse::<DataSource>().unwrap(),
            DataSource::File(PathBuf::from("data/loads.csv"))
        );
    }

    #[test]
    fn test_configured_sources() {
        let sources = DataSources {
            loads: Some(DataSource::File("loads.csv".into())),
            expenses: Some(DataSource::File("exp.csv".into())),
            ..Default::default()
        };
        let kinds: Vec<RowKind> = sources.configured().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![RowKind::Loads, RowKind::Expenses]);
    }

    #[test]
    fn test_default_columns() {
        assert_eq!(DataSources::default().column_map().unwrap(), ColumnMap::default());
    }
}
