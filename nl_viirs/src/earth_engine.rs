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
//! VIIRS monthly composites from the Google Earth Engine REST API (v1).
//! We list the images of the configured collection that fall into the requested month, download the
//! configured band of each as GeoTIFF for a lat/lon grid covering the region (`getPixels`) and average them

use std::path::Path;
use reqwest::{Client, header::{HeaderMap, HeaderName, HeaderValue}};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nl_build::env_or;
use nl_common::{datetime::YearMonth, geo::{GeoRect, meters_to_degrees}, net::{self, bearer_headers, join_url}};
use crate::{EarthEngineConfig, errors::{NlViirsError, Result, no_data}, geotiff::read_geotiff, raster::Raster};

pub const TOKEN_ENV: &'static str = "EE_ACCESS_TOKEN";
pub const PUBLIC_ASSETS: &'static str = "projects/earthengine-public/assets";

/// upper limit for grid dimensions we request in one getPixels call
pub const MAX_GRID_DIM: usize = 10_000;

#[derive(Debug,Clone,Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EeImage {
    pub name: String,
    pub id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug,Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListImagesResponse {
    #[serde(default)]
    images: Vec<EeImage>,
    next_page_token: Option<String>,
}

#[derive(Debug,Clone,Serialize,PartialEq)]
pub struct GridDimensions {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug,Clone,Serialize,PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AffineTransform {
    pub scale_x: f64,
    pub shear_x: f64,
    pub translate_x: f64,
    pub shear_y: f64,
    pub scale_y: f64,
    pub translate_y: f64,
}

#[derive(Debug,Clone,Serialize,PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PixelGrid {
    pub dimensions: GridDimensions,
    pub affine_transform: AffineTransform,
    pub crs_code: String,
}

#[derive(Debug,Clone,Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPixelsRequest {
    pub file_format: String,
    pub band_ids: Vec<String>,
    pub grid: PixelGrid,
}

/// request headers with OAuth2 bearer token and quota project
pub fn auth_headers (config: &EarthEngineConfig)->Result<HeaderMap> {
    let token = env_or( TOKEN_ENV, &config.access_token)
        .ok_or_else( || NlViirsError::AuthError( format!("no Earth Engine access token (set {TOKEN_ENV} or config access_token)")))?;

    let mut headers = bearer_headers( &Some(token))?.unwrap_or_default();
    let project = HeaderValue::from_str( &config.project).map_err( |e| NlViirsError::AuthError( e.to_string()))?;
    headers.insert( HeaderName::from_static("x-goog-user-project"), project);
    Ok(headers)
}

pub fn collection_name (config: &EarthEngineConfig)->String {
    if config.collection.starts_with("projects/") {
        config.collection.clone()
    } else {
        format!("{PUBLIC_ASSETS}/{}", config.collection)
    }
}

pub fn list_images_url (config: &EarthEngineConfig)->String {
    format!("{}:listImages", join_url( &config.base_url, &["v1", &collection_name(config)]))
}

pub fn get_pixels_url (config: &EarthEngineConfig, image_name: &str)->String {
    format!("{}:getPixels", join_url( &config.base_url, &["v1", image_name]))
}

/// EPSG:4326 grid covering `region` with pixels of approximately `scale_m` size at the region center
pub fn pixel_grid (region: &GeoRect, scale_m: f64)->Result<PixelGrid> {
    if !(scale_m > 0.0) { return Err( crate::invalid_argument( format!("invalid scale {scale_m}"))) }
    if !(region.width_deg() > 0.0 && region.height_deg() > 0.0) {
        return Err( crate::invalid_argument( format!("empty or antimeridian crossing region {region}")))
    }

    let (dlon, dlat) = meters_to_degrees( scale_m, region.center().lat_deg);
    let width = (region.width_deg() / dlon).ceil().max(1.0) as usize;
    let height = (region.height_deg() / dlat).ceil().max(1.0) as usize;

    if width > MAX_GRID_DIM || height > MAX_GRID_DIM {
        return Err( crate::invalid_argument( format!("grid {width}x{height} too large, use a smaller region or larger scale")))
    }

    Ok( PixelGrid {
        dimensions: GridDimensions { width, height },
        affine_transform: AffineTransform {
            scale_x: dlon, shear_x: 0.0, translate_x: region.west,
            shear_y: 0.0, scale_y: -dlat, translate_y: region.north
        },
        crs_code: "EPSG:4326".into()
    })
}

pub fn get_pixels_request (config: &EarthEngineConfig, grid: PixelGrid)->GetPixelsRequest {
    GetPixelsRequest {
        file_format: "GEO_TIFF".into(),
        band_ids: vec![ config.band.clone() ],
        grid
    }
}

/// list all images of the configured collection that start within `month`
pub async fn list_images (client: &Client, config: &EarthEngineConfig, headers: &HeaderMap, month: YearMonth)->Result<Vec<EeImage>> {
    let url = list_images_url( config);
    let start = month.start_time().to_rfc3339();
    let end = month.end_time().to_rfc3339();
    let mut images = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut req = client.get( &url)
            .headers( headers.clone())
            .query( &[("startTime", start.as_str()), ("endTime", end.as_str())]);
        if let Some(token) = &page_token {
            req = req.query( &[("pageToken", token.as_str())]);
        }

        let response = net::check_response( &url, req.send().await?).await?;
        let page: ListImagesResponse = net::from_json( response).await?;
        images.extend( page.images);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break
        }
    }

    debug!("{} images in {} for {}", images.len(), config.collection, month);
    Ok(images)
}

/// download the configured band of `image_name` for `grid` as GeoTIFF to `path`
pub async fn get_pixels (client: &Client, config: &EarthEngineConfig, headers: &HeaderMap, image_name: &str, grid: &PixelGrid, path: &Path)->Result<u64> {
    let url = get_pixels_url( config, image_name);
    let request = get_pixels_request( config, grid.clone());
    info!("loading image from: {url}");
    Ok( net::download_post_json( client, &url, &Some(headers.clone()), &request, path).await? )
}

/// the mean radiance over all images of `month` for `region`
pub async fn load_viirs (client: &Client, config: &EarthEngineConfig, region: &GeoRect, month: YearMonth, work_dir: &Path)->Result<Raster> {
    let headers = auth_headers( config)?;
    let grid = pixel_grid( region, config.scale_m)?;

    let images = list_images( client, config, &headers, month).await?;
    if images.is_empty() {
        return Err( no_data( format!("no {} images for {}", config.collection, month)))
    }

    let mut rasters = Vec::with_capacity( images.len());
    for image in &images {
        let file = tempfile::Builder::new().suffix(".tif").tempfile_in( work_dir)?;
        get_pixels( client, config, &headers, &image.name, &grid, file.path()).await?;
        rasters.push( read_geotiff( file.path())?);
    }

    let raster = Raster::mean_of( &rasters)?;
    info!("loaded {}x{} raster for {} from {} image(s)", raster.width, raster.height, month, rasters.len());
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls () {
        let config = EarthEngineConfig::default();
        assert_eq!( list_images_url( &config),
            "https://earthengine.googleapis.com/v1/projects/earthengine-public/assets/NOAA/VIIRS/DNB/MONTHLY_V1/VCMCFG:listImages");

        let img = "projects/earthengine-public/assets/NOAA/VIIRS/DNB/MONTHLY_V1/VCMCFG/20230101";
        assert_eq!( get_pixels_url( &config, img), format!("https://earthengine.googleapis.com/v1/{img}:getPixels"));
    }

    #[test]
    fn test_pixel_grid () {
        let region = GeoRect::from_wsen( 10.0, -0.5, 11.0, 0.5);
        let grid = pixel_grid( &region, 500.0).unwrap();
        // about 111km per degree at the equator
        assert_eq!( grid.dimensions, GridDimensions { width: 223, height: 223 });
        assert_eq!( grid.affine_transform.translate_x, 10.0);
        assert_eq!( grid.affine_transform.translate_y, 0.5);
        assert!( grid.affine_transform.scale_y < 0.0);

        assert!( pixel_grid( &region, 0.0).is_err());
        assert!( pixel_grid( &GeoRect::from_wsen( 179.23, -17.0, -179.83, -16.2), 500.0).is_err());
        assert!( pixel_grid( &GeoRect::from_wsen( -180.0, -60.0, 180.0, 60.0), 10.0).is_err());
    }

    #[test]
    fn test_request_json () {
        let config = EarthEngineConfig::default();
        let grid = pixel_grid( &GeoRect::from_wsen( 2.0, 48.0, 3.0, 49.0), 500.0).unwrap();
        let json = serde_json::to_value( get_pixels_request( &config, grid)).unwrap();

        assert_eq!( json["fileFormat"], "GEO_TIFF");
        assert_eq!( json["bandIds"][0], "avg_rad");
        assert_eq!( json["grid"]["crsCode"], "EPSG:4326");
        assert!( json["grid"]["affineTransform"]["scaleX"].as_f64().unwrap() > 0.0);
        assert!( json["grid"]["dimensions"]["width"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_list_response () {
        let json = r#"{"images":[{"type":"IMAGE","name":"projects/earthengine-public/assets/NOAA/VIIRS/DNB/MONTHLY_V1/VCMCFG/20230101",
            "id":"NOAA/VIIRS/DNB/MONTHLY_V1/VCMCFG/20230101","startTime":"2023-01-01T00:00:00Z","endTime":"2023-02-01T00:00:00Z"}]}"#;
        let res: ListImagesResponse = serde_json::from_str( json).unwrap();
        assert_eq!( res.images.len(), 1);
        assert!( res.next_page_token.is_none());
        assert_eq!( res.images[0].start_time.as_deref(), Some("2023-01-01T00:00:00Z"));

        let empty: ListImagesResponse = serde_json::from_str( "{}").unwrap();
        assert!( empty.images.is_empty());
    }

    #[test]
    fn test_missing_token () {
        let config = EarthEngineConfig { access_token: None, ..EarthEngineConfig::default() };
        if std::env::var(TOKEN_ENV).is_err() {
            assert!( matches!( auth_headers( &config), Err(NlViirsError::AuthError(_))));
        }

        let config = EarthEngineConfig { access_token: Some("t0k3n".into()), ..EarthEngineConfig::default() };
        let headers = auth_headers( &config).unwrap();
        assert_eq!( headers.get("x-goog-user-project").unwrap(), "fetchviirs");
        assert!( headers.contains_key( reqwest::header::AUTHORIZATION));
    }
}
