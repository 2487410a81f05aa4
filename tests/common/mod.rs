//! CSV fixtures shared by the integration tests
#![allow(dead_code)]

use fleet_analytics::config::{DataSource, DataSources};
use std::path::Path;
use tempfile::TempDir;

pub const LOADS_CSV: &str = "\
Load #,Truck,Drivers,Ship Date,Del. Date,1st Shipper City,1st Shipper State,Last Receiver City,Last Receiver State,Miles,Empty Miles,Hauling Fee,Load Status,Receiver Arrival Status
L1,101,Ann,45352,2024-03-02,Dallas,TX,Houston,TX,240,10,\"$1,000.00\",Completed,On Time
L2,101,Ann,03/05/2024,2024-03-06,houston,tx,dallas,tx,250,0,$750.00,Completed,Late
L3,202,Bo,2024-03-07,2024-03-08,Omaha,NE,Denver,CO,500,0,$500.00,Completed,On Time
L4,202,Bo,2024-03-09,2024-03-10,Omaha,NE,Denver,CO,500,0,$900.00,Cancelled,
L5,,,2024-03-09,2024-03-10,Omaha,NE,Denver,CO,500,0,$900.00,Completed,
";

pub const FUEL_CSV: &str = "\
Date,Unit,Item,Gallons,Amount
2024-03-02,101,ULSD,40,$150.00
2024-03-03,101,CADV,,$100.00
2024-03-08,202,ULSD,80,$300.00
";

pub const EXPENSES_CSV: &str = "\
Date,Amount,Category,Vendor,Truck
2024-03-15,$100.00,Tolls,PrePass,101
";

/// Write the three fixture sheets into `dir` and point sources at them
pub fn write_fixture(dir: &Path) -> DataSources {
    let write = |name: &str, body: &str| {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        Some(DataSource::File(path))
    };
    DataSources {
        loads: write("loads.csv", LOADS_CSV),
        fuel: write("fuel.csv", FUEL_CSV),
        expenses: write("expenses.csv", EXPENSES_CSV),
        columns: None,
    }
}

pub fn fixture() -> (TempDir, DataSources) {
    let dir = tempfile::tempdir().unwrap();
    let sources = write_fixture(dir.path());
    (dir, sources)
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
