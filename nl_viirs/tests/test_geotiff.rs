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
#![allow(unused)]

use std::{fs::File, path::Path};
use tiff::{encoder::{colortype, TiffEncoder}, tags::Tag};

use nl_common::geo::GeoRect;
use nl_viirs::geotiff::{read_geotiff, read_geotiff_window, GDAL_NODATA_TAG, MODEL_PIXEL_SCALE_TAG, MODEL_TIEPOINT_TAG};

/// tests for reading georeferenced single band GeoTIFFs
/// run with "cargo test --test test_geotiff -- --nocapture"

const NODATA: f32 = -999.0;

// 8x6 grid of 0.5° pixels with origin at 10°E,50°N. Values are row*10 + col, the NW corner pixel is nodata
fn write_test_tif (path: &Path) {
    let (w,h) = (8u32, 6u32);
    let mut data: Vec<f32> = (0..h).flat_map( |r| (0..w).map( move |c| (r*10 + c) as f32)).collect();
    data[0] = NODATA;

    let mut file = File::create( path).unwrap();
    let mut tiff = TiffEncoder::new( &mut file).unwrap();
    let mut image = tiff.new_image::<colortype::Gray32Float>( w, h).unwrap();
    image.rows_per_strip( 2).unwrap(); // 3 strips so that windowed reads skip some

    let scale: [f64;3] = [0.5, 0.5, 0.0];
    let tiepoint: [f64;6] = [0.0, 0.0, 0.0, 10.0, 50.0, 0.0];
    image.encoder().write_tag( Tag::from_u16_exhaustive( MODEL_PIXEL_SCALE_TAG), &scale[..]).unwrap();
    image.encoder().write_tag( Tag::from_u16_exhaustive( MODEL_TIEPOINT_TAG), &tiepoint[..]).unwrap();
    image.encoder().write_tag( Tag::from_u16_exhaustive( GDAL_NODATA_TAG), "-999").unwrap();

    image.write_data( &data).unwrap();
}

#[test]
fn test_read_full () {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.tif");
    write_test_tif( &path);

    let raster = read_geotiff( &path).unwrap();
    println!("bounds: {}", raster.bounds());

    assert_eq!( (raster.width, raster.height), (8, 6));
    assert_eq!( raster.nodata, Some(NODATA));
    assert_eq!( raster.bounds(), GeoRect::from_wsen( 10.0, 47.0, 14.0, 50.0));
    assert_eq!( raster.get( 3, 2), 23.0);
    assert_eq!( raster.valid_value( 0, 0), None);
    assert_eq!( raster.value_at( 13.9, 47.1), Some(57.0));
}

#[test]
fn test_read_window () {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.tif");
    write_test_tif( &path);

    let raster = read_geotiff_window( &path, &GeoRect::from_wsen( 11.0, 48.0, 12.5, 49.0)).unwrap();
    assert_eq!( (raster.width, raster.height), (3, 2));
    assert_eq!( raster.transform.origin_x, 11.0);
    assert_eq!( raster.transform.origin_y, 49.0);
    assert_eq!( raster.data(), &[22.0, 23.0, 24.0, 32.0, 33.0, 34.0]);

    // window straddling the raster edge is clipped
    let raster = read_geotiff_window( &path, &GeoRect::from_wsen( 9.0, 49.0, 11.0, 51.0)).unwrap();
    assert_eq!( (raster.width, raster.height), (2, 2));
    assert_eq!( raster.valid_value( 0, 0), None);
    assert_eq!( raster.get( 1, 1), 11.0);

    assert!( read_geotiff_window( &path, &GeoRect::from_wsen( 20.0, 0.0, 21.0, 1.0)).is_err());
}

#[test]
fn test_not_a_tiff () {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bogus.tif");
    std::fs::write( &path, b"<html>quota exceeded</html>").unwrap();
    assert!( read_geotiff( &path).is_err());
}
