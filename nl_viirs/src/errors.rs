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
use thiserror::Error;
use nl_common::net::NlNetError;

pub type Result<T> = std::result::Result<T, NlViirsError>;

#[derive(Error, Debug)]
pub enum NlViirsError {
    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("net error {0}")]
    NetError( #[from] NlNetError),

    #[error("Reqwest error {0}")]
    ReqwestError( #[from] reqwest::Error),

    #[error("serde error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("CSV error {0}")]
    CsvError( #[from] csv::Error),

    #[error("TIFF error {0}")]
    TiffError( #[from] tiff::TiffError),

    #[error("config error {0}")]
    ConfigError( #[from] nl_build::NlBuildError),

    #[error("geocoding failed: {0}")]
    GeocodeError( String ),

    #[error("authentication error: {0}")]
    AuthError( String ),

    #[error("no data: {0}")]
    NoDataError( String ),

    #[error("raster error: {0}")]
    RasterError( String ),

    #[error("not found: {0}")]
    NotFoundError( String ),

    #[error("invalid argument: {0}")]
    InvalidArgument( String ),
}

pub fn no_data (msg: impl ToString)->NlViirsError {
    NlViirsError::NoDataError(msg.to_string())
}

pub fn raster_error (msg: impl ToString)->NlViirsError {
    NlViirsError::RasterError(msg.to_string())
}

pub fn invalid_argument (msg: impl ToString)->NlViirsError {
    NlViirsError::InvalidArgument(msg.to_string())
}
