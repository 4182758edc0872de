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
//! Black Marble (VNP46) granules from the NASA LAADS DAAC archive. Granules are HDF5 files on a 10°x10° lat/lon
//! tile grid (`hXXvYY`); we locate and download them but do not decode them

use std::path::{Path,PathBuf};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use nl_build::env_or;
use nl_common::{datetime::YearMonth, geo::GeoRect, net::{self, bearer_headers, join_url}};
use crate::{LaadsConfig, errors::{Result, invalid_argument, no_data}};

pub const TOKEN_ENV: &'static str = "LAADS_TOKEN";
pub const TILE_DEG: f64 = 10.0;
pub const N_H_TILES: u32 = 36;
pub const N_V_TILES: u32 = 18;

#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub struct BlackMarbleTile {
    pub h: u32,
    pub v: u32
}

impl BlackMarbleTile {
    pub fn for_position (lat_deg: f64, lon_deg: f64)->Self {
        let h = ((lon_deg + 180.0) / TILE_DEG).floor().clamp( 0.0, (N_H_TILES-1) as f64) as u32;
        let v = ((90.0 - lat_deg) / TILE_DEG).floor().clamp( 0.0, (N_V_TILES-1) as f64) as u32;
        BlackMarbleTile { h, v }
    }

    /// the tile id as used in granule names, e.g. "h18v04"
    pub fn id (&self)->String { format!("h{:02}v{:02}", self.h, self.v) }

    pub fn bounds (&self)->GeoRect {
        let west = -180.0 + self.h as f64 * TILE_DEG;
        let north = 90.0 - self.v as f64 * TILE_DEG;
        GeoRect::from_wsen( west, north - TILE_DEG, west + TILE_DEG, north)
    }
}

/// all tiles overlapping `region`
pub fn tiles_for (region: &GeoRect)->Vec<BlackMarbleTile> {
    // east and south bounds are exclusive, a region ending exactly on a tile boundary does not reach into the next tile
    let eps = 1e-9;
    let nw = BlackMarbleTile::for_position( region.north - eps, region.west);
    let se = BlackMarbleTile::for_position( region.south + eps, region.east - eps);

    let mut tiles = Vec::new();
    for v in nw.v..=se.v {
        for h in nw.h..=se.h {
            tiles.push( BlackMarbleTile { h, v });
        }
    }
    tiles
}

#[derive(Debug,Clone,Deserialize)]
pub struct LaadsEntry {
    pub name: String,
    #[serde(default)]
    pub last_modified: Option<String>,
}

// LAADS returns either a plain array or an object with a `content` array, depending on API version
#[derive(Debug,Deserialize)]
#[serde(untagged)]
enum LaadsListing {
    Entries(Vec<LaadsEntry>),
    Content { content: Vec<LaadsEntry> },
}

/// archive directory of the month, e.g. https://ladsweb.modaps.eosdis.nasa.gov/archive/allData/5200/VNP46A3/2023/001
pub fn archive_dir_url (config: &LaadsConfig, month: YearMonth)->String {
    let year = month.year().to_string();
    let doy = format!("{:03}", month.first_day_of_year());
    join_url( &config.base_url, &["archive", "allData", &config.collection, &config.product, &year, &doy])
}

pub fn listing_url (config: &LaadsConfig, month: YearMonth)->String {
    format!("{}.json", archive_dir_url( config, month))
}

pub fn parse_listing (bytes: &[u8])->Result<Vec<LaadsEntry>> {
    let listing: LaadsListing = serde_json::from_slice( bytes)?;
    Ok( match listing {
        LaadsListing::Entries(entries) => entries,
        LaadsListing::Content{content} => content,
    })
}

/// entries of granules that belong to any of the given tiles
pub fn select_granules<'a> (entries: &'a [LaadsEntry], tiles: &[BlackMarbleTile])->Vec<&'a LaadsEntry> {
    let ids: Vec<String> = tiles.iter().map( |t| format!(".{}.", t.id())).collect();
    entries.iter().filter( |e| ids.iter().any( |id| e.name.contains( id.as_str()))).collect()
}

/// local path of granule `name` in `out_dir`. Listing entries have to be plain file names
pub fn granule_path (out_dir: &Path, name: &str)->Result<PathBuf> {
    match Path::new( name).file_name() {
        Some(file_name) if file_name == name && name != ".." => Ok( out_dir.join( file_name)),
        _ => Err( invalid_argument( format!("not a granule file name: {name:?}")))
    }
}

/// download all granules of `month` that cover `region` into `out_dir`
pub async fn fetch_granules (client: &Client, config: &LaadsConfig, region: &GeoRect, month: YearMonth, out_dir: &Path)->Result<Vec<PathBuf>> {
    let headers = bearer_headers( &env_or( TOKEN_ENV, &config.access_token))?;
    let tiles = tiles_for( region);
    let tile_ids: Vec<String> = tiles.iter().map( |t| t.id()).collect();
    debug!("region {} maps to tiles {:?}", region, tile_ids);

    let url = listing_url( config, month);
    let response = net::check_response( &url, client.get( &url).headers( headers.clone().unwrap_or_default()).send().await?).await?;
    let entries = parse_listing( &response.bytes().await?)?;

    let granules = select_granules( &entries, &tiles);
    if granules.is_empty() {
        return Err( no_data( format!("no {} granules for tiles {:?} in {}", config.product, tile_ids, month)))
    }

    let dir_url = archive_dir_url( config, month);
    let mut paths = Vec::with_capacity( granules.len());
    for g in granules {
        let path = granule_path( out_dir, &g.name)?;
        let file_url = format!("{dir_url}/{}", g.name);
        info!("loading granule from: {file_url}");
        net::download_url( client, &file_url, &headers, &path).await?;
        paths.push( path);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_for_position () {
        let paris = BlackMarbleTile::for_position( 48.85, 2.35);
        assert_eq!( paris.id(), "h18v04");
        assert_eq!( paris.bounds(), GeoRect::from_wsen( 0.0, 40.0, 10.0, 50.0));

        assert_eq!( BlackMarbleTile::for_position( 90.0, -180.0).id(), "h00v00");
        assert_eq!( BlackMarbleTile::for_position( -90.0, 180.0).id(), "h35v17");
    }

    #[test]
    fn test_tiles_for () {
        let r = GeoRect::from_wsen( 9.5, 49.5, 10.5, 50.5);
        let ids: Vec<String> = tiles_for( &r).iter().map( |t| t.id()).collect();
        assert_eq!( ids, vec!["h18v03", "h19v03", "h18v04", "h19v04"]);

        let r = GeoRect::from_wsen( 0.0, 40.0, 10.0, 50.0); // exactly one tile
        let ids: Vec<String> = tiles_for( &r).iter().map( |t| t.id()).collect();
        assert_eq!( ids, vec!["h18v04"]);
    }

    #[test]
    fn test_granule_path () {
        let dir = Path::new("/tmp/nl");
        let p = granule_path( dir, "VNP46A3.A2023032.h18v04.001.2023065101012.h5").unwrap();
        assert_eq!( p, dir.join("VNP46A3.A2023032.h18v04.001.2023065101012.h5"));

        assert!( granule_path( dir, "../../etc/passwd").is_err());
        assert!( granule_path( dir, "/etc/passwd").is_err());
        assert!( granule_path( dir, "sub/VNP46A3.h5").is_err());
        assert!( granule_path( dir, "..").is_err());
        assert!( granule_path( dir, ".").is_err());
        assert!( granule_path( dir, "").is_err());
    }

    #[test]
    fn test_listing () {
        let month = YearMonth::new( 2023, 2).unwrap();
        let config = LaadsConfig::default();
        assert_eq!( listing_url( &config, month), "https://ladsweb.modaps.eosdis.nasa.gov/archive/allData/5200/VNP46A3/2023/032.json");

        let bare = br#"[{"name":"VNP46A3.A2023032.h18v04.001.2023065101012.h5","last_modified":"2023-03-06 10:10"},
                        {"name":"VNP46A3.A2023032.h19v04.001.2023065101013.h5"}]"#;
        let entries = parse_listing( bare).unwrap();
        assert_eq!( entries.len(), 2);

        let wrapped = br#"{"content":[{"name":"VNP46A3.A2023032.h18v04.001.2023065101012.h5"}]}"#;
        assert_eq!( parse_listing( wrapped).unwrap().len(), 1);

        let tiles = vec![ BlackMarbleTile{ h: 18, v: 4 }];
        let selected = select_granules( &entries, &tiles);
        assert_eq!( selected.len(), 1);
        assert!( selected[0].name.contains("h18v04"));
    }
}
