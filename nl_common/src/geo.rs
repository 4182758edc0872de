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
//! minimal geodetic types for region-of-interest computation. Positions are WGS84 degrees, distances are
//! haversine distances from the `geo` crate, which is accurate enough for buffer and grid sizing

use std::fmt;
use serde::{Serialize,Deserialize};
use geo::{Destination, Haversine, Intersects, Point, Rect};

#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct LatLon {
    pub lat_deg: f64,
    pub lon_deg: f64
}

impl LatLon {
    pub fn new (lat_deg: f64, lon_deg: f64)->Self { LatLon{ lat_deg, lon_deg } }

    pub fn from_point (p: Point)->Self { LatLon{ lat_deg: p.y(), lon_deg: normalize_lon( p.x()) } }

    pub fn point (&self)->Point { Point::new( self.lon_deg, self.lat_deg) }

    /// great circle destination for given initial bearing (degrees, clockwise from north) and distance in meters
    pub fn destination (&self, bearing_deg: f64, dist_m: f64)->LatLon {
        LatLon::from_point( Haversine.destination( self.point(), bearing_deg, dist_m))
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5},{:.5})", self.lat_deg, self.lon_deg)
    }
}

/// normalize longitude degrees to [-180,180)
pub fn normalize_lon (lon: f64)->f64 {
    let x = (lon + 180.0).rem_euclid( 360.0);
    x - 180.0
}

/// a lat/lon aligned rectangle in degrees. Rectangles that cross the antimeridian have `west > east`, which
/// none of the grid and tile computations support. Use [`GeoRect::crosses_antimeridian`] to reject them
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct GeoRect {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64
}

impl GeoRect {
    pub fn from_wsen (west: f64, south: f64, east: f64, north: f64)->Self {
        GeoRect{ west, south, east, north }
    }

    pub fn from_rect (rect: &Rect)->Self {
        GeoRect{ west: rect.min().x, south: rect.min().y, east: rect.max().x, north: rect.max().y }
    }

    /// the bounds of a circle with radius `buffer_m` around `center`
    pub fn from_buffered_point (center: &LatLon, buffer_m: f64)->Self {
        let n = center.destination(   0.0, buffer_m);
        let e = center.destination(  90.0, buffer_m);
        let s = center.destination( 180.0, buffer_m);
        let w = center.destination( 270.0, buffer_m);

        // cardinal points only - the true longitude extent of the circle is marginally larger away from the equator
        GeoRect {
            west: w.lon_deg,
            south: s.lat_deg.max( -90.0),
            east: e.lon_deg,
            north: n.lat_deg.min( 90.0)
        }
    }

    /// the geo::Rect of this rectangle. Note that Rect normalizes min/max, i.e. this is only meaningful if
    /// the rectangle does not cross the antimeridian
    pub fn rect (&self)->Rect {
        Rect::new( Point::new( self.west, self.south), Point::new( self.east, self.north))
    }

    pub fn crosses_antimeridian (&self)->bool { self.west > self.east }

    pub fn center (&self)->LatLon {
        LatLon::new( (self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn width_deg (&self)->f64 { self.east - self.west }
    pub fn height_deg (&self)->f64 { self.north - self.south }

    /// inclusive of the boundary
    pub fn contains (&self, p: &LatLon)->bool {
        !self.crosses_antimeridian() && self.rect().intersects( &p.point())
    }

    /// strict overlap, rectangles that only touch do not intersect
    pub fn intersects (&self, other: &GeoRect)->bool {
        self.west < other.east && self.east > other.west && self.south < other.north && self.north > other.south
    }

    pub fn intersection (&self, other: &GeoRect)->Option<GeoRect> {
        if self.intersects(other) {
            Some( GeoRect {
                west: self.west.max(other.west),
                south: self.south.max(other.south),
                east: self.east.min(other.east),
                north: self.north.min(other.north)
            })
        } else {
            None
        }
    }
}

impl fmt::Display for GeoRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[w:{:.4}, s:{:.4}, e:{:.4}, n:{:.4}]", self.west, self.south, self.east, self.north)
    }
}

/// lon/lat degree sizes of a `meters` sized step at given latitude
pub fn meters_to_degrees (meters: f64, lat_deg: f64)->(f64,f64) {
    let origin = Point::new( 0.0, lat_deg.clamp( -89.0, 89.0));
    let east = Haversine.destination( origin, 90.0, meters);
    let north = Haversine.destination( origin, 0.0, meters);
    (east.x().abs(), (north.y() - origin.y()).abs())
}
