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
//! single band geo-referenced raster in a north-up lat/lon grid (EPSG:4326). This is what all
//! imagery sources get converted into before we turn it into tables and statistics

use nl_common::geo::{GeoRect, LatLon};
use crate::errors::{Result, raster_error};

/// north-up affine pixel to geo transform. `pixel_height` is positive, rows go south
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,  // west edge of column 0
    pub origin_y: f64,  // north edge of row 0
    pub pixel_width: f64,
    pub pixel_height: f64
}

impl GeoTransform {
    pub fn new (origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64)->Self {
        GeoTransform { origin_x, origin_y, pixel_width, pixel_height }
    }

    pub fn pixel_center (&self, col: usize, row: usize)->LatLon {
        LatLon::new(
            self.origin_y - (row as f64 + 0.5) * self.pixel_height,
            self.origin_x + (col as f64 + 0.5) * self.pixel_width
        )
    }

    /// fractional (col,row) grid position of a geo position
    pub fn grid_position (&self, lon: f64, lat: f64)->(f64,f64) {
        ((lon - self.origin_x) / self.pixel_width, (self.origin_y - lat) / self.pixel_height)
    }

    pub fn bounds (&self, width: usize, height: usize)->GeoRect {
        GeoRect::from_wsen(
            self.origin_x,
            self.origin_y - height as f64 * self.pixel_height,
            self.origin_x + width as f64 * self.pixel_width,
            self.origin_y
        )
    }

    /// the pixel window of a grid with given dimensions that covers `rect`. None if there is no overlap
    pub fn window_for (&self, rect: &GeoRect, width: usize, height: usize)->Option<PixelWindow> {
        let (c0,r0) = self.grid_position( rect.west, rect.north);
        let (c1,r1) = self.grid_position( rect.east, rect.south);

        let col0 = c0.floor().max(0.0) as usize;
        let row0 = r0.floor().max(0.0) as usize;
        let col1 = (c1.ceil().max(0.0) as usize).min(width);
        let row1 = (r1.ceil().max(0.0) as usize).min(height);

        if col1 > col0 && row1 > row0 {
            Some( PixelWindow { col0, row0, width: col1 - col0, height: row1 - row0 })
        } else {
            None
        }
    }

    /// transform of a sub-grid starting at the given pixel
    pub fn shifted (&self, col0: usize, row0: usize)->GeoTransform {
        GeoTransform {
            origin_x: self.origin_x + col0 as f64 * self.pixel_width,
            origin_y: self.origin_y - row0 as f64 * self.pixel_height,
            ..*self
        }
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct PixelWindow {
    pub col0: usize,
    pub row0: usize,
    pub width: usize,
    pub height: usize
}

impl PixelWindow {
    pub fn col1 (&self)->usize { self.col0 + self.width }
    pub fn row1 (&self)->usize { self.row0 + self.height }
}

#[derive(Debug,Clone)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub nodata: Option<f32>,
    data: Vec<f32> // row major
}

impl Raster {
    pub fn new (width: usize, height: usize, transform: GeoTransform, nodata: Option<f32>, data: Vec<f32>)->Result<Self> {
        if data.len() != width * height {
            return Err( raster_error( format!("data length {} does not match {}x{} raster", data.len(), width, height)))
        }
        if !(transform.pixel_width > 0.0 && transform.pixel_height > 0.0) {
            return Err( raster_error( format!("invalid pixel size {}x{}", transform.pixel_width, transform.pixel_height)))
        }
        Ok( Raster { width, height, transform, nodata, data } )
    }

    pub fn data (&self)->&[f32] { &self.data }
    pub fn len (&self)->usize { self.data.len() }
    pub fn is_empty (&self)->bool { self.data.is_empty() }

    #[inline(always)]
    pub fn get (&self, col: usize, row: usize)->f32 { self.data[ row*self.width + col] }

    #[inline]
    pub fn is_valid (&self, v: f32)->bool {
        !v.is_nan() && self.nodata.map_or( true, |nd| v != nd)
    }

    pub fn valid_value (&self, col: usize, row: usize)->Option<f32> {
        let v = self.get( col, row);
        if self.is_valid(v) { Some(v) } else { None }
    }

    /// value at geo position, None if outside or not valid
    pub fn value_at (&self, lon: f64, lat: f64)->Option<f32> {
        let (c,r) = self.transform.grid_position( lon, lat);
        if c >= 0.0 && r >= 0.0 && (c as usize) < self.width && (r as usize) < self.height {
            self.valid_value( c as usize, r as usize)
        } else {
            None
        }
    }

    pub fn bounds (&self)->GeoRect { self.transform.bounds( self.width, self.height) }

    pub fn pixel_center (&self, col: usize, row: usize)->LatLon { self.transform.pixel_center( col, row) }

    pub fn subset (&self, win: &PixelWindow)->Result<Raster> {
        if win.col1() > self.width || win.row1() > self.height {
            return Err( raster_error( format!("window {win:?} outside of {}x{} raster", self.width, self.height)))
        }

        let mut data = Vec::with_capacity( win.width * win.height);
        for row in win.row0..win.row1() {
            let i0 = row * self.width;
            data.extend_from_slice( &self.data[i0 + win.col0 .. i0 + win.col1()]);
        }
        Raster::new( win.width, win.height, self.transform.shifted( win.col0, win.row0), self.nodata, data)
    }

    /// the part of this raster that covers `rect`
    pub fn crop (&self, rect: &GeoRect)->Result<Raster> {
        match self.transform.window_for( rect, self.width, self.height) {
            Some(win) => self.subset( &win),
            None => Err( raster_error( format!("region {rect} does not overlap raster bounds {}", self.bounds())))
        }
    }

    /// pixelwise mean over valid values of same-grid rasters. Pixels without any valid value become NaN
    pub fn mean_of (rasters: &[Raster])->Result<Raster> {
        let first = rasters.first().ok_or_else( || raster_error("no rasters to average"))?;
        if rasters.len() == 1 { return Ok(first.clone()) }

        for r in &rasters[1..] {
            if r.width != first.width || r.height != first.height || r.transform != first.transform {
                return Err( raster_error("cannot average rasters with different grids"))
            }
        }

        let mut data = Vec::with_capacity( first.len());
        for i in 0..first.len() {
            let mut sum = 0.0f64;
            let mut n = 0usize;
            for r in rasters {
                let v = r.data[i];
                if r.is_valid(v) {
                    sum += v as f64;
                    n += 1;
                }
            }
            data.push( if n > 0 { (sum / n as f64) as f32 } else { f32::NAN });
        }

        Raster::new( first.width, first.height, first.transform, None, data)
    }

    /// combine rasters that share pixel size but cover different areas into a single raster for `rect`.
    /// The output grid is aligned to the first raster. Where rasters overlap the first one with a valid value wins
    pub fn mosaic (rasters: &[Raster], rect: &GeoRect)->Result<Raster> {
        let first = rasters.first().ok_or_else( || raster_error("no rasters to mosaic"))?;
        if rasters.len() == 1 { return first.crop(rect) }

        let t0 = &first.transform;
        let pw = t0.pixel_width;
        let ph = t0.pixel_height;
        let col_off = ((rect.west - t0.origin_x) / pw).floor();
        let row_off = ((t0.origin_y - rect.north) / ph).floor();

        let transform = GeoTransform::new( t0.origin_x + col_off * pw, t0.origin_y - row_off * ph, pw, ph);
        let width = ((rect.east - transform.origin_x) / pw).ceil().max(1.0) as usize;
        let height = ((transform.origin_y - rect.south) / ph).ceil().max(1.0) as usize;

        let mut data = Vec::with_capacity( width * height);
        for row in 0..height {
            for col in 0..width {
                let p = transform.pixel_center( col, row);
                let v = rasters.iter().find_map( |r| r.value_at( p.lon_deg, p.lat_deg)).unwrap_or( f32::NAN);
                data.push(v);
            }
        }

        Raster::new( width, height, transform, None, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp (width: usize, height: usize, transform: GeoTransform)->Raster {
        let data: Vec<f32> = (0..width*height).map( |i| i as f32).collect();
        Raster::new( width, height, transform, Some(-1.0), data).unwrap()
    }

    #[test]
    fn test_transform () {
        let t = GeoTransform::new( 10.0, 50.0, 0.5, 0.25);
        let p = t.pixel_center( 0, 0);
        assert_eq!( (p.lon_deg, p.lat_deg), (10.25, 49.875));

        let (c,r) = t.grid_position( 11.0, 49.0);
        assert_eq!( (c,r), (2.0, 4.0));

        let b = t.bounds( 4, 8);
        assert_eq!( b, GeoRect::from_wsen( 10.0, 48.0, 12.0, 50.0));
    }

    #[test]
    fn test_crop () {
        let r = ramp( 10, 10, GeoTransform::new( 0.0, 10.0, 1.0, 1.0));
        let c = r.crop( &GeoRect::from_wsen( 2.5, 5.5, 4.5, 7.5)).unwrap();

        assert_eq!( (c.width, c.height), (3, 3));
        assert_eq!( c.transform.origin_x, 2.0);
        assert_eq!( c.transform.origin_y, 8.0);
        assert_eq!( c.get(0,0), 22.0); // row 2, col 2
        assert_eq!( c.get(2,2), 44.0);

        assert!( r.crop( &GeoRect::from_wsen( 20.0, 20.0, 30.0, 30.0)).is_err());
    }

    #[test]
    fn test_invalid_values () {
        let t = GeoTransform::new( 0.0, 2.0, 1.0, 1.0);
        let r = Raster::new( 2, 2, t, Some(-999.0), vec![ 1.0, -999.0, f32::NAN, 4.0]).unwrap();
        assert_eq!( r.valid_value(0,0), Some(1.0));
        assert_eq!( r.valid_value(1,0), None);
        assert_eq!( r.valid_value(0,1), None);
        assert_eq!( r.value_at( 1.5, 0.5), Some(4.0));
        assert_eq!( r.value_at( 2.5, 0.5), None);

        assert!( Raster::new( 3, 2, t, None, vec![0.0; 4]).is_err());
    }

    #[test]
    fn test_mean () {
        let t = GeoTransform::new( 0.0, 1.0, 1.0, 1.0);
        let a = Raster::new( 2, 1, t, Some(0.0), vec![ 2.0, 0.0]).unwrap();
        let b = Raster::new( 2, 1, t, Some(0.0), vec![ 4.0, 0.0]).unwrap();
        let m = Raster::mean_of( &[a,b]).unwrap();
        assert_eq!( m.get(0,0), 3.0);
        assert!( m.get(1,0).is_nan());

        let c = Raster::new( 1, 1, t, None, vec![1.0]).unwrap();
        let d = Raster::new( 2, 1, t, None, vec![1.0, 2.0]).unwrap();
        assert!( Raster::mean_of( &[c,d]).is_err());
    }

    #[test]
    fn test_mosaic () {
        // two 2x2 tiles side by side, split at lon 2
        let west = Raster::new( 2, 2, GeoTransform::new( 0.0, 2.0, 1.0, 1.0), None, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let east = Raster::new( 2, 2, GeoTransform::new( 2.0, 2.0, 1.0, 1.0), None, vec![5.0, 6.0, 7.0, 8.0]).unwrap();

        let m = Raster::mosaic( &[west,east], &GeoRect::from_wsen( 1.2, 0.5, 2.8, 1.5)).unwrap();
        assert_eq!( (m.width, m.height), (2, 2));
        assert_eq!( m.data(), &[2.0, 5.0, 4.0, 7.0]);
    }
}
