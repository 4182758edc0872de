/*
 * Copyright © 2024, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
//! simulated upload of a fetched VIIRS radiance table into the warehouse

use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nl_viirs::{default_csv_path, load_viirs_config, NlViirsError, DEFAULT_CONFIG};
use nl_viirs::warehouse::{update_from_csv, DryRunWarehouse, TableRef};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "upload a VIIRS radiance CSV to the warehouse (dry run)")]
pub struct Args {
    /// target table [project.]dataset.table (default from config)
    #[arg(short,long)]
    pub table: Option<String>,

    /// config filename or pathname
    #[arg(short,long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// CSV file to upload (default: <data_dir>/nl_viirs/fetched_viirs.csv as written by fetch_viirs)
    pub csv: Option<PathBuf>,
}

#[tokio::main]
async fn main()->Result<()> {
    nl_build::set_bin_context!();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())  // use RUST_LOG to set max level
        .init();

    let args = Args::parse();
    let config = load_viirs_config( &args.config)?;
    let table: TableRef = args.table.as_ref().unwrap_or( &config.warehouse.table).parse()?;

    let csv = args.csv.unwrap_or_else( || default_csv_path( &nl_build::pkg_data_dir!()));

    let warehouse = DryRunWarehouse::new();
    let n_rows = match update_from_csv( &warehouse, &csv, &table).await {
        Ok(n) => n,
        Err(NlViirsError::NotFoundError(_)) => {
            println!("file not found: {}", csv.display());
            0
        }
        Err(e) => return Err(e.into())
    };

    println!("{} rows would be uploaded to {}", n_rows, table);
    Ok(())
}
