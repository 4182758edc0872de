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
//! tabular representation of radiance rasters and derived brightness statistics

use std::{fmt, fs::OpenOptions, path::Path};
use serde::{Deserialize, Serialize};
use tracing::info;

use nl_common::{MinMaxAvg, fs::{ensure_parent_dir, file_length}};
use crate::{ViirsSource, errors::Result, raster::Raster};

/// one table row per valid raster pixel
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct RadianceRecord {
    pub row: u32,
    pub col: u32,
    pub lon: f64,
    pub lat: f64,
    pub radiance: f32,
}

pub fn radiance_records (raster: &Raster)->Vec<RadianceRecord> {
    let mut records = Vec::new();
    for row in 0..raster.height {
        for col in 0..raster.width {
            if let Some(radiance) = raster.valid_value( col, row) {
                let p = raster.pixel_center( col, row);
                records.push( RadianceRecord { row: row as u32, col: col as u32, lon: p.lon_deg, lat: p.lat_deg, radiance });
            }
        }
    }
    records
}

pub const RECORD_HEADER: [&str;5] = ["row","col","lon","lat","radiance"];

/// write records as CSV and return number of rows written. The header is also written if there are no records
pub fn write_records<P: AsRef<Path>> (path: P, records: &[RadianceRecord])->Result<usize> {
    ensure_parent_dir( &path)?;
    let mut wtr = csv::WriterBuilder::new().has_headers( false).from_path( path.as_ref())?;
    wtr.write_record( RECORD_HEADER)?;
    for r in records {
        wtr.serialize( r)?;
    }
    wtr.flush()?;

    info!("wrote {} records to {:?}", records.len(), path.as_ref());
    Ok( records.len())
}

pub fn read_records<P: AsRef<Path>> (path: P)->Result<Vec<RadianceRecord>> {
    let mut rdr = csv::Reader::from_path( path.as_ref())?;
    let mut records = Vec::new();
    for res in rdr.deserialize() {
        records.push( res?);
    }
    Ok(records)
}

#[derive(Debug,Clone,PartialEq,Serialize)]
pub struct BrightnessStats {
    pub n_pixels: usize,
    pub n_valid: usize,
    /// valid pixels with radiance above the lit threshold
    pub n_lit: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// sum of lights
    pub sum: f64,
}

impl BrightnessStats {
    pub fn from_raster (raster: &Raster, lit_threshold: f32)->Self {
        let mut acc = MinMaxAvg::new();
        let mut n_lit = 0;

        for &v in raster.data() {
            if raster.is_valid(v) {
                acc.add( v as f64);
                if v > lit_threshold { n_lit += 1 }
            }
        }

        BrightnessStats {
            n_pixels: raster.len(),
            n_valid: acc.n,
            n_lit,
            min: acc.min,
            max: acc.max,
            mean: acc.avg,
            sum: acc.sum
        }
    }

    pub fn lit_fraction (&self)->f64 {
        if self.n_valid > 0 { self.n_lit as f64 / self.n_valid as f64 } else { 0.0 }
    }
}

impl fmt::Display for BrightnessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pixels: {} (valid: {}, lit: {} = {:.1}%), radiance min: {:.3}, max: {:.3}, mean: {:.3}, sum: {:.1}",
            self.n_pixels, self.n_valid, self.n_lit, self.lit_fraction() * 100.0, self.min, self.max, self.mean, self.sum)
    }
}

/// flat summary row that can be accumulated over locations and months
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct BrightnessSummary {
    pub location: String,
    pub year: i32,
    pub month: u32,
    pub source: String,
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub n_valid: usize,
    pub n_lit: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
}

impl BrightnessSummary {
    pub fn new (location: &str, source: ViirsSource, raster: &Raster, stats: &BrightnessStats, year: i32, month: u32)->Self {
        let b = raster.bounds();
        BrightnessSummary {
            location: location.to_string(),
            year, month,
            source: source.to_string(),
            west: b.west, south: b.south, east: b.east, north: b.north,
            n_valid: stats.n_valid,
            n_lit: stats.n_lit,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            sum: stats.sum
        }
    }
}

/// append summary row to CSV file, writing the header only if the file is new or empty
pub fn append_summary<P: AsRef<Path>> (path: P, summary: &BrightnessSummary)->Result<()> {
    let path = path.as_ref();
    ensure_parent_dir( path)?;
    let needs_header = file_length( path).map_or( true, |len| len == 0);

    let file = OpenOptions::new().create(true).append(true).open( path)?;
    let mut wtr = csv::WriterBuilder::new().has_headers( needs_header).from_writer( file);
    wtr.serialize( summary)?;
    wtr.flush()?;
    Ok(())
}

pub fn read_summaries<P: AsRef<Path>> (path: P)->Result<Vec<BrightnessSummary>> {
    let mut rdr = csv::Reader::from_path( path.as_ref())?;
    let mut summaries = Vec::new();
    for res in rdr.deserialize() {
        summaries.push( res?);
    }
    Ok(summaries)
}
