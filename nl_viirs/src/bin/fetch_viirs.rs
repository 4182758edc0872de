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
//! fetch monthly VIIRS nighttime light data for a named location and store it as a radiance table

use std::path::PathBuf;
use anyhow::{anyhow, Result};
use clap::Parser;
use reqwest::Client;
use tracing_subscriber::EnvFilter;

use nl_common::datetime::YearMonth;
use nl_viirs::{default_csv_path, fetch_viirs, load_viirs_config, ViirsProduct, ViirsRequest, ViirsSource, DEFAULT_CONFIG};
use nl_viirs::table::{append_summary, radiance_records, write_records, BrightnessStats, BrightnessSummary};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "retrieve monthly VIIRS nighttime light radiance around a geocoded location")]
pub struct Args {
    /// data source: ee (Google Earth Engine), eog (NOAA/EOG tiles) or laads (NASA Black Marble granules)
    #[arg(short,long, default_value = "ee")]
    pub source: ViirsSource,

    /// radius around location in km (default from config)
    #[arg(short,long)]
    pub buffer_km: Option<f64>,

    /// output CSV pathname (default: <data_dir>/nl_viirs/fetched_viirs.csv)
    #[arg(short,long)]
    pub out: Option<PathBuf>,

    /// summary CSV to append a brightness row to
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// config filename or pathname
    #[arg(short,long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// location name to geocode, e.g. "Paris, France"
    pub location: String,

    pub year: i32,

    pub month: u32,
}

#[tokio::main]
async fn main()->Result<()> {
    nl_build::set_bin_context!();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())  // use RUST_LOG to set max level
        .init();

    let args = Args::parse();
    let config = load_viirs_config( &args.config)?;

    let month = YearMonth::new( args.year, args.month).ok_or_else( || anyhow!("invalid month {}-{}", args.year, args.month))?;
    let request = ViirsRequest {
        location: args.location.clone(),
        month,
        buffer_km: args.buffer_km.unwrap_or( config.buffer_km)
    };

    let data_dir = nl_build::pkg_data_dir!();
    let client = Client::new();
    let res = fetch_viirs( &client, &config, args.source, &request, &data_dir).await?;
    println!("{} ({}) region: {}", res.place.name, res.place.position, res.region);

    match res.product {
        ViirsProduct::Radiance(raster) => {
            let out = args.out.unwrap_or_else( || default_csv_path( &data_dir));
            let n = write_records( &out, &radiance_records( &raster))?;
            println!("saved {} radiance records to {:?}", n, out);

            let stats = BrightnessStats::from_raster( &raster, config.lit_threshold);
            println!("{}", stats);

            if let Some(summary_path) = &args.summary {
                let summary = BrightnessSummary::new( &request.location, res.source, &raster, &stats, month.year(), month.month());
                append_summary( summary_path, &summary)?;
                println!("appended summary to {:?}", summary_path);
            }
        }
        ViirsProduct::Granules(paths) => {
            println!("downloaded {} {} granule(s) for {}:", paths.len(), config.laads.product, month);
            for p in &paths {
                println!("  {}", p.display());
            }
        }
    }

    Ok(())
}
