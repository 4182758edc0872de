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
//! place name lookup through the OpenStreetMap Nominatim search API

use reqwest::{Client, header::USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nl_common::{geo::{GeoRect, LatLon}, net::{check_response, join_url}};
use crate::{GeocoderConfig, errors::{NlViirsError, Result, invalid_argument}};

#[derive(Debug,Clone,Serialize)]
pub struct Place {
    pub name: String,
    pub display_name: Option<String>,
    pub position: LatLon
}

// what we need from Nominatim search results. Note that lat/lon are strings
#[derive(Debug,Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>
}

pub fn search_url (config: &GeocoderConfig)->String {
    join_url( &config.base_url, &["search"])
}

/// parse a Nominatim JSON response and return the first (best) match
pub fn parse_search_response (name: &str, bytes: &[u8])->Result<Option<Place>> {
    let places: Vec<NominatimPlace> = serde_json::from_slice( bytes)?;

    if let Some(p) = places.into_iter().next() {
        let lat: f64 = p.lat.trim().parse().map_err( |_| NlViirsError::GeocodeError( format!("invalid latitude {}", p.lat)))?;
        let lon: f64 = p.lon.trim().parse().map_err( |_| NlViirsError::GeocodeError( format!("invalid longitude {}", p.lon)))?;
        Ok( Some( Place { name: name.to_string(), display_name: p.display_name, position: LatLon::new( lat, lon) }))
    } else {
        Ok(None)
    }
}

pub async fn geocode (client: &Client, config: &GeocoderConfig, name: &str)->Result<Place> {
    let url = search_url( config);
    debug!("geocoding {name:?} via {url}");

    let req = client.get( &url)
        .header( USER_AGENT, config.user_agent.as_str())
        .query( &[("q", name), ("format", "json"), ("limit", "1")]);
    let response = check_response( &url, req.send().await?).await?;
    let bytes = response.bytes().await?;

    match parse_search_response( name, &bytes)? {
        Some(place) => {
            info!("geocoded {:?} to {}", name, place.position);
            Ok(place)
        }
        None => Err( NlViirsError::NotFoundError( format!("could not geocode location: {name}")))
    }
}

/// the bounds of a `buffer_km` circle around `place`. Regions that would cross the antimeridian are rejected
/// since neither the EE pixel grid nor the EOG and LAADS tile lookup can represent them
pub fn buffered_region (place: &Place, buffer_km: f64)->Result<GeoRect> {
    let region = GeoRect::from_buffered_point( &place.position, buffer_km * 1000.0);
    if region.crosses_antimeridian() {
        Err( invalid_argument( format!("region {} of {} crosses the antimeridian", region, place.name)))
    } else {
        Ok(region)
    }
}

/// geocode `name` and return the place together with the bounds of a `buffer_km` circle around it
pub async fn region_for (client: &Client, config: &GeocoderConfig, name: &str, buffer_km: f64)->Result<(Place,GeoRect)> {
    let place = geocode( client, config, name).await?;
    let region = buffered_region( &place, buffer_km)?;
    Ok( (place, region) )
}
