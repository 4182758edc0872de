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
//! monthly VIIRS DNB composites from the Earth Observation Group (Colorado School of Mines / NOAA) archive.
//! The globe is split into six static 120°x75° tiles. Archive file names carry a processing timestamp we can't
//! compute, hence we have to look them up in the month directory listing

use std::{fs::File, io, path::{Path,PathBuf}};
use flate2::read::GzDecoder;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info};

use nl_build::env_or;
use nl_common::{datetime::YearMonth, geo::GeoRect, net::{self, bearer_headers, join_url}};
use crate::{EogConfig, errors::{NlViirsError, Result, no_data}, geotiff::read_geotiff_window, raster::Raster};

pub const TOKEN_ENV: &'static str = "EOG_TOKEN";

#[derive(Debug,Clone,Copy,PartialEq)]
pub struct EogTile {
    pub name: &'static str,
    pub bounds: GeoRect,
}

const fn tile (name: &'static str, west: f64, south: f64, east: f64, north: f64)->EogTile {
    EogTile { name, bounds: GeoRect { west, south, east, north } }
}

pub const EOG_TILES: [EogTile;6] = [
    tile( "75N180W", -180.0,   0.0, -60.0, 75.0),
    tile( "75N060W",  -60.0,   0.0,  60.0, 75.0),
    tile( "75N060E",   60.0,   0.0, 180.0, 75.0),
    tile( "00N180W", -180.0, -65.0, -60.0,  0.0),
    tile( "00N060W",  -60.0, -65.0,  60.0,  0.0),
    tile( "00N060E",   60.0, -65.0, 180.0,  0.0),
];

/// all tiles that overlap `region`
pub fn tiles_for (region: &GeoRect)->Vec<&'static EogTile> {
    EOG_TILES.iter().filter( |t| t.bounds.intersects( region)).collect()
}

/// e.g. https://eogdata.mines.edu/nighttime_light/monthly/v10/2023/202301/vcmcfg/
pub fn month_dir_url (config: &EogConfig, month: YearMonth)->String {
    let year = month.year().to_string();
    let mut url = join_url( &config.base_url, &[&config.version, &year, &month.compact(), &config.product]);
    url.push('/');
    url
}

/// pattern for archive entries of `tile` in the month directory. This matches both the compressed
/// tarball and the plain band GeoTIFF that some releases provide
pub fn archive_regex (config: &EogConfig, month: YearMonth, tile: &str)->Result<Regex> {
    let start = month.first_day().format("%Y%m%d");
    let end = month.last_day().format("%Y%m%d");
    let pattern = format!( r"SVDNB_npp_{start}-{end}_{tile}_{}_{}_c\d+(?:\.{}\.tif|\.tgz)",
        regex::escape( &config.product), regex::escape( &config.version), regex::escape( &config.band));
    Regex::new( &pattern).map_err( |e| NlViirsError::InvalidArgument( e.to_string()))
}

/// find the archive file name for `tile` in a directory listing. We prefer a plain band GeoTIFF over tarballs,
/// and the latest processing timestamp if there are several candidates
pub fn find_archive_name (listing: &str, re: &Regex)->Option<String> {
    let mut names: Vec<&str> = re.find_iter( listing).map( |m| m.as_str()).collect();
    names.sort();
    names.dedup();

    names.iter().rev().find( |n| n.ends_with(".tif"))
        .or_else( || names.last())
        .map( |n| n.to_string())
}

/// extract the member ending in `.<band>.tif` from a .tgz archive into `dir`
pub fn extract_band_tif (tgz_path: &Path, band: &str, dir: &Path)->Result<PathBuf> {
    let suffix = format!(".{band}.tif");
    let mut archive = tar::Archive::new( GzDecoder::new( File::open( tgz_path)?));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.to_path_buf();
        if let Some(fname) = entry_path.file_name().and_then( |f| f.to_str()) {
            if fname.ends_with( &suffix) {
                let out_path = dir.join( fname);
                let mut out = File::create( &out_path)?;
                io::copy( &mut entry, &mut out)?;
                debug!("extracted {:?}", out_path);
                return Ok(out_path)
            }
        }
    }

    Err( no_data( format!("no {suffix} in {:?}", tgz_path)))
}

/// download the `tile` archive for `month` into `work_dir` and return the path of the band GeoTIFF
pub async fn get_tile_tif (client: &Client, config: &EogConfig, month: YearMonth, tile: &EogTile, work_dir: &Path)->Result<PathBuf> {
    let headers = bearer_headers( &env_or( TOKEN_ENV, &config.access_token))?;
    let dir_url = month_dir_url( config, month);

    let listing = net::get_text( client, &dir_url, &headers).await?;
    let re = archive_regex( config, month, tile.name)?;
    let fname = find_archive_name( &listing, &re)
        .ok_or_else( || no_data( format!("no {} archive for tile {} in {}", config.product, tile.name, dir_url)))?;

    let url = format!("{dir_url}{fname}");
    info!("loading tile {} from: {}", tile.name, url);
    let path = net::get_file( client, &url, &headers, work_dir).await?;

    if fname.ends_with(".tgz") {
        let tif = extract_band_tif( &path, &config.band, work_dir)?;
        std::fs::remove_file( &path)?;
        Ok(tif)
    } else {
        Ok(path)
    }
}

/// the region window of the monthly composite, mosaicked from all tiles the region overlaps
pub async fn load_viirs (client: &Client, config: &EogConfig, region: &GeoRect, month: YearMonth, work_dir: &Path)->Result<Raster> {
    let tiles = tiles_for( region);
    if tiles.is_empty() {
        return Err( no_data( format!("region {region} outside of EOG tile coverage")))
    }

    // archives are large, keep them only while we extract the window
    let tmp_dir = tempfile::tempdir_in( work_dir)?;
    let mut rasters = Vec::with_capacity( tiles.len());
    for tile in tiles {
        let tif = get_tile_tif( client, config, month, tile, tmp_dir.path()).await?;
        let covered = tile.bounds.intersection( region).unwrap_or( *region);
        rasters.push( read_geotiff_window( &tif, &covered)?);
    }

    let raster = Raster::mosaic( &rasters, region)?;
    info!("loaded {}x{} raster for {}", raster.width, raster.height, month);
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_for () {
        let paris = GeoRect::from_wsen( 1.7, 48.4, 3.0, 49.3);
        let names: Vec<&str> = tiles_for( &paris).iter().map( |t| t.name).collect();
        assert_eq!( names, vec!["75N060W"]);

        let quito = GeoRect::from_wsen( -79.0, -0.7, -78.0, 0.3); // straddles the equator
        let names: Vec<&str> = tiles_for( &quito).iter().map( |t| t.name).collect();
        assert_eq!( names, vec!["75N180W", "00N180W"]);
    }

    #[test]
    fn test_month_dir_url () {
        let config = EogConfig::default();
        let month = YearMonth::new( 2023, 1).unwrap();
        assert_eq!( month_dir_url( &config, month), "https://eogdata.mines.edu/nighttime_light/monthly/v10/2023/202301/vcmcfg/");
    }

    #[test]
    fn test_find_archive_name () {
        let config = EogConfig::default();
        let month = YearMonth::new( 2023, 1).unwrap();
        let listing = r#"
            <a href="SVDNB_npp_20230101-20230131_75N060W_vcmcfg_v10_c202302080600.tgz">x</a>
            <a href="SVDNB_npp_20230101-20230131_75N060W_vcmcfg_v10_c202302150600.tgz">x</a>
            <a href="SVDNB_npp_20230101-20230131_75N060E_vcmcfg_v10_c202302080600.tgz">x</a>
            <a href="SVDNB_npp_20230101-20230131_00N060W_vcmcfg_v10_c202302080600.avg_rade9h.tif">x</a>
            <a href="SVDNB_npp_20230101-20230131_00N060W_vcmcfg_v10_c202302080600.tgz">x</a>
        "#;

        let re = archive_regex( &config, month, "75N060W").unwrap();
        assert_eq!( find_archive_name( listing, &re).as_deref(), Some("SVDNB_npp_20230101-20230131_75N060W_vcmcfg_v10_c202302150600.tgz"));

        let re = archive_regex( &config, month, "00N060W").unwrap();
        assert_eq!( find_archive_name( listing, &re).as_deref(), Some("SVDNB_npp_20230101-20230131_00N060W_vcmcfg_v10_c202302080600.avg_rade9h.tif"));

        let re = archive_regex( &config, month, "00N180W").unwrap();
        assert!( find_archive_name( listing, &re).is_none());
    }

    #[test]
    fn test_extract_band_tif () {
        let dir = tempfile::tempdir().unwrap();
        let tgz = dir.path().join("tile.tgz");

        {
            let enc = flate2::write::GzEncoder::new( File::create(&tgz).unwrap(), flate2::Compression::fast());
            let mut builder = tar::Builder::new( enc);
            for (name, content) in [("x.cf_cvg.tif", b"cvg".as_slice()), ("x.avg_rade9h.tif", b"rad".as_slice())] {
                let mut header = tar::Header::new_gnu();
                header.set_size( content.len() as u64);
                header.set_mode( 0o644);
                header.set_cksum();
                builder.append_data( &mut header, name, content).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }

        let out = extract_band_tif( &tgz, "avg_rade9h", dir.path()).unwrap();
        assert_eq!( std::fs::read( &out).unwrap(), b"rad");
        assert!( extract_band_tif( &tgz, "avg_rad_sd", dir.path()).is_err());
    }
}
