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
//! GeoTIFF support for single band lat/lon rasters. We only need the subset of GeoTIFF that is used by
//! Earth Engine and EOG products: ModelPixelScale + ModelTiepoint (or ModelTransformation) georeferencing
//! and the GDAL_NODATA tag

use std::{fs::File, io::{BufReader, Read, Seek}, path::Path};
use tiff::{
    ColorType,
    decoder::{Decoder, DecodingResult},
    tags::Tag
};
use tracing::debug;

use crate::errors::{Result, raster_error};
use crate::raster::{GeoTransform, PixelWindow, Raster};
use nl_common::geo::GeoRect;

pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
pub const MODEL_TIEPOINT_TAG: u16 = 33922;
pub const MODEL_TRANSFORMATION_TAG: u16 = 34264;
pub const GDAL_NODATA_TAG: u16 = 42113;

fn tag (code: u16)->Tag { Tag::from_u16_exhaustive(code) }

pub fn open_decoder<P: AsRef<Path>> (path: P)->Result<Decoder<BufReader<File>>> {
    let file = File::open( path.as_ref())?;
    let mut decoder = Decoder::new( BufReader::new(file))?;

    match decoder.colortype()? {
        ColorType::Gray(_) => Ok(decoder),
        other => Err( raster_error( format!("not a single band raster: {:?} ({other:?})", path.as_ref())))
    }
}

pub fn read_geo_transform<R: Read + Seek> (decoder: &mut Decoder<R>)->Result<GeoTransform> {
    if let (Ok(scale), Ok(tie)) = (decoder.get_tag_f64_vec( tag(MODEL_PIXEL_SCALE_TAG)), decoder.get_tag_f64_vec( tag(MODEL_TIEPOINT_TAG))) {
        if scale.len() >= 2 && tie.len() >= 6 {
            // tiepoint is [i,j,k, x,y,z] mapping raster (i,j) to model (x,y)
            let origin_x = tie[3] - tie[0] * scale[0];
            let origin_y = tie[4] + tie[1] * scale[1];
            return Ok( GeoTransform::new( origin_x, origin_y, scale[0], scale[1]))
        }
    }

    if let Ok(m) = decoder.get_tag_f64_vec( tag(MODEL_TRANSFORMATION_TAG)) {
        if m.len() >= 8 {
            if m[1] != 0.0 || m[4] != 0.0 {
                return Err( raster_error("rotated rasters not supported"))
            }
            return Ok( GeoTransform::new( m[3], m[7], m[0], -m[5]))
        }
    }

    Err( raster_error("no GeoTIFF georeferencing tags"))
}

pub fn read_nodata<R: Read + Seek> (decoder: &mut Decoder<R>)->Option<f32> {
    decoder.get_tag_ascii_string( tag(GDAL_NODATA_TAG)).ok()
        .and_then( |s| s.trim_matches(char::from(0)).trim().parse::<f32>().ok())
}

fn to_f32_vec (res: DecodingResult)->Result<Vec<f32>> {
    let v = match res {
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::U8(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::U16(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::U32(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map( |x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map( |x| x as f32).collect(),
        #[allow(unreachable_patterns)]
        _ => return Err( raster_error("unsupported sample format"))
    };
    Ok(v)
}

/// read the complete first band of a GeoTIFF
pub fn read_geotiff<P: AsRef<Path>> (path: P)->Result<Raster> {
    let mut decoder = open_decoder( &path)?;
    let (w,h) = decoder.dimensions()?;
    let transform = read_geo_transform( &mut decoder)?;
    let nodata = read_nodata( &mut decoder);
    let data = to_f32_vec( decoder.read_image()?)?;

    debug!("read {}x{} raster from {:?}", w, h, path.as_ref());
    Raster::new( w as usize, h as usize, transform, nodata, data)
}

/// read the part of a GeoTIFF that covers `rect`. Only the strips/tiles that overlap the window get decoded,
/// which matters for continental scale tiles
pub fn read_geotiff_window<P: AsRef<Path>> (path: P, rect: &GeoRect)->Result<Raster> {
    let mut decoder = open_decoder( &path)?;
    let (w,h) = decoder.dimensions()?;
    let (width, height) = (w as usize, h as usize);
    let transform = read_geo_transform( &mut decoder)?;
    let nodata = read_nodata( &mut decoder);

    let win = transform.window_for( rect, width, height)
        .ok_or_else( || raster_error( format!("region {rect} not within {}", transform.bounds( width, height))))?;

    let (cw,ch) = decoder.chunk_dimensions();
    let (cw,ch) = (cw as usize, ch as usize);
    let chunks_across = width.div_ceil(cw);

    let mut data = vec![ f32::NAN; win.width * win.height];

    for cy in (win.row0 / ch)..=((win.row1() - 1) / ch) {
        for cx in (win.col0 / cw)..=((win.col1() - 1) / cw) {
            let chunk_index = (cy * chunks_across + cx) as u32;
            let (dw,_) = decoder.chunk_data_dimensions( chunk_index);
            let chunk = to_f32_vec( decoder.read_chunk( chunk_index)?)?;
            let dw = dw as usize;

            let x0 = cx * cw;
            let y0 = cy * ch;
            let rows = (y0.max(win.row0))..((y0 + chunk.len() / dw).min(win.row1()));
            let cols = (x0.max(win.col0))..((x0 + dw).min(win.col1()));

            for row in rows {
                let src = (row - y0) * dw;
                let dst = (row - win.row0) * win.width;
                for col in cols.clone() {
                    data[ dst + col - win.col0] = chunk[ src + col - x0];
                }
            }
        }
    }

    debug!("read {}x{} window {:?} from {:?}", win.width, win.height, win, path.as_ref());
    Raster::new( win.width, win.height, transform.shifted( win.col0, win.row0), nodata, data)
}
