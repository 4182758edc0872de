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
//! acquisition of VIIRS day/night band (nighttime light) imagery and derived brightness tables from
//! Google Earth Engine, the NOAA/EOG monthly tile archive and the NASA LAADS archive

use std::{fmt, path::{Path,PathBuf}, str::FromStr};
use serde::{Serialize,Deserialize};
use reqwest::Client;
use tracing::{info, warn};

use nl_build::define_load_config;
use nl_common::{datetime::YearMonth, geo::GeoRect};

pub mod errors;
pub use errors::*;

pub mod raster;
pub mod geotiff;
pub mod geocode;
pub mod earth_engine;
pub mod eog;
pub mod laads;
pub mod table;
pub mod warehouse;

use raster::Raster;
use geocode::Place;

define_load_config!{}

pub const DEFAULT_CONFIG: &'static str = "viirs.ron";

/// name of the radiance table that is written by `fetch_viirs` and read by `update_warehouse`
pub const FETCHED_CSV: &'static str = "fetched_viirs.csv";

/// the radiance table path both CLIs default to, `data_dir` normally being `nl_build::pkg_data_dir!()`
pub fn default_csv_path (data_dir: &Path)->PathBuf {
    data_dir.join( FETCHED_CSV)
}

/* #region config ***************************************************************************************/

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct ViirsConfig {
    /// radius around geocoded location in km
    pub buffer_km: f64,
    /// radiance threshold (nW/cm²/sr) above which a pixel counts as lit
    pub lit_threshold: f32,
    pub geocoder: GeocoderConfig,
    pub earth_engine: EarthEngineConfig,
    pub eog: EogConfig,
    pub laads: LaadsConfig,
    pub warehouse: WarehouseConfig,
}

impl Default for ViirsConfig {
    fn default()->Self {
        ViirsConfig {
            buffer_km: 50.0,
            lit_threshold: 0.5,
            geocoder: GeocoderConfig::default(),
            earth_engine: EarthEngineConfig::default(),
            eog: EogConfig::default(),
            laads: LaadsConfig::default(),
            warehouse: WarehouseConfig::default(),
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default()->Self {
        GeocoderConfig {
            base_url: "https://nominatim.openstreetmap.org".into(),
            user_agent: "nightlight-gee".into(),
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct EarthEngineConfig {
    pub base_url: String,
    /// cloud project used for quota and billing
    pub project: String,
    pub collection: String,
    pub band: String,
    /// nominal pixel size in meters
    pub scale_m: f64,
    /// OAuth2 access token, overridden by `EE_ACCESS_TOKEN`
    pub access_token: Option<String>,
}

impl Default for EarthEngineConfig {
    fn default()->Self {
        EarthEngineConfig {
            base_url: "https://earthengine.googleapis.com".into(),
            project: "fetchviirs".into(),
            collection: "NOAA/VIIRS/DNB/MONTHLY_V1/VCMCFG".into(),
            band: "avg_rad".into(),
            scale_m: 500.0,
            access_token: None,
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct EogConfig {
    pub base_url: String,
    pub version: String,
    /// "vcmcfg" (stray light corrected) or "vcmslcfg"
    pub product: String,
    pub band: String,
    /// overridden by `EOG_TOKEN`
    pub access_token: Option<String>,
}

impl Default for EogConfig {
    fn default()->Self {
        EogConfig {
            base_url: "https://eogdata.mines.edu/nighttime_light/monthly".into(),
            version: "v10".into(),
            product: "vcmcfg".into(),
            band: "avg_rade9h".into(),
            access_token: None,
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct LaadsConfig {
    pub base_url: String,
    pub collection: String,
    pub product: String,
    /// overridden by `LAADS_TOKEN`
    pub access_token: Option<String>,
}

impl Default for LaadsConfig {
    fn default()->Self {
        LaadsConfig {
            base_url: "https://ladsweb.modaps.eosdis.nasa.gov".into(),
            collection: "5200".into(),
            product: "VNP46A3".into(),
            access_token: None,
        }
    }
}

#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct WarehouseConfig {
    pub table: String,
}

impl Default for WarehouseConfig {
    fn default()->Self {
        WarehouseConfig { table: "nightlight_dataset.viirs_brightness".into() }
    }
}

/// load config through the nl_build lookup, falling back to built-in defaults if there is no such file
pub fn load_viirs_config (filename: &str)->Result<ViirsConfig> {
    match load_config::<ViirsConfig>( filename) {
        Ok(config) => Ok(config),
        Err(nl_build::NlBuildError::ResourceNotFoundError(_)) => {
            warn!("no config {filename} found, using defaults");
            Ok( ViirsConfig::default())
        }
        Err(e) => Err(e.into())
    }
}

/* #endregion config */

/* #region fetch ****************************************************************************************/

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub enum ViirsSource {
    EarthEngine,
    Eog,
    Laads
}

impl fmt::Display for ViirsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViirsSource::EarthEngine => "ee",
            ViirsSource::Eog => "eog",
            ViirsSource::Laads => "laads",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ViirsSource {
    type Err = String;

    fn from_str (s: &str)->std::result::Result<Self,Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ee" | "gee" | "earthengine" => Ok(ViirsSource::EarthEngine),
            "eog" | "noaa" => Ok(ViirsSource::Eog),
            "laads" | "nasa" => Ok(ViirsSource::Laads),
            other => Err( format!("unknown VIIRS source {other:?} (expected ee|eog|laads)"))
        }
    }
}

#[derive(Debug,Clone)]
pub struct ViirsRequest {
    pub location: String,
    pub month: YearMonth,
    pub buffer_km: f64,
}

#[derive(Debug)]
pub enum ViirsProduct {
    /// average radiance raster covering the requested region
    Radiance(Raster),
    /// downloaded archive granules (not decoded)
    Granules(Vec<PathBuf>),
}

#[derive(Debug)]
pub struct ViirsResult {
    pub source: ViirsSource,
    pub place: Place,
    pub region: GeoRect,
    pub month: YearMonth,
    pub product: ViirsProduct,
}

/// geocode the requested location and retrieve VIIRS data for it from the given source.
/// Downloads go into `data_dir` (archive granules) or temporary files within it (imagery that is converted to rasters)
pub async fn fetch_viirs (client: &Client, config: &ViirsConfig, source: ViirsSource, request: &ViirsRequest, data_dir: &Path)->Result<ViirsResult> {
    if !(request.buffer_km > 0.0) {
        return Err( invalid_argument( format!("buffer must be positive: {}", request.buffer_km)))
    }
    nl_common::fs::ensure_writable_dir( data_dir)?;

    let (place, region) = geocode::region_for( client, &config.geocoder, &request.location, request.buffer_km).await?;
    info!("fetching {} VIIRS data for {} region {}", source, request.month, region);

    let product = match source {
        ViirsSource::EarthEngine => ViirsProduct::Radiance( earth_engine::load_viirs( client, &config.earth_engine, &region, request.month, data_dir).await?),
        ViirsSource::Eog => ViirsProduct::Radiance( eog::load_viirs( client, &config.eog, &region, request.month, data_dir).await?),
        ViirsSource::Laads => ViirsProduct::Granules( laads::fetch_granules( client, &config.laads, &region, request.month, data_dir).await?),
    };

    Ok( ViirsResult { source, place, region, month: request.month, product })
}

/* #endregion fetch */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_parse () {
        assert_eq!( "ee".parse::<ViirsSource>().unwrap(), ViirsSource::EarthEngine);
        assert_eq!( "EOG".parse::<ViirsSource>().unwrap(), ViirsSource::Eog);
        assert_eq!( "laads".parse::<ViirsSource>().unwrap(), ViirsSource::Laads);
        assert!( "sentinel".parse::<ViirsSource>().is_err());
        assert_eq!( ViirsSource::Eog.to_string(), "eog");
    }

    #[test]
    fn test_default_csv_path () {
        let dir = Path::new("/nightlight/data/nl_viirs");
        assert_eq!( default_csv_path( dir), PathBuf::from("/nightlight/data/nl_viirs/fetched_viirs.csv"));
    }

    #[test]
    fn test_partial_config () {
        let conf: ViirsConfig = ron::from_str( r#"( buffer_km: 25.0, earth_engine: ( project: "my-project" ) )"#).unwrap();
        assert_eq!( conf.buffer_km, 25.0);
        assert_eq!( conf.earth_engine.project, "my-project");
        assert_eq!( conf.earth_engine.band, "avg_rad");
        assert_eq!( conf.eog.version, "v10");
        assert_eq!( conf.warehouse.table, "nightlight_dataset.viirs_brightness");
    }

    #[test]
    fn test_default_config_file () {
        let conf: ViirsConfig = ron::from_str( include_str!("../configs/viirs.ron")).unwrap();
        assert_eq!( conf.earth_engine.collection, ViirsConfig::default().earth_engine.collection);
        assert_eq!( conf.laads.product, "VNP46A3");
        assert!( conf.eog.access_token.is_none());
    }
}
