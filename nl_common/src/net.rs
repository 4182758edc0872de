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
//! common utility functions for network operations

use std::{io::Write, path::{Path,PathBuf}};
use reqwest::{header::{HeaderMap,HeaderValue,AUTHORIZATION,CONTENT_TYPE}, Client, RequestBuilder, Response, StatusCode};
use regex::Regex;
use lazy_static::lazy_static;
use serde::{de::DeserializeOwned,Serialize};
use tracing::debug;

use crate::define_error;

const PATH: usize = 5;

lazy_static! {
    // [scheme,user,host,port,path,query]
    static ref URL_RE: Regex = Regex::new( r"(.+)://(?:(.+)@)?([^:/]+)(?::(\d+))?(?:/([^?]+))?(?:\?(.+))?").unwrap();
    static ref FNAME_RE: Regex = Regex::new( r"(?:.*/)?(.+)").unwrap();
}

define_error!{ pub NlNetError =
    IOError(#[from] std::io::Error) : "IO error: {0}",
    NotFoundError(String) : "not found {0}",
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    OpFailed(String) : "operation failed: {0}",
    ParseError(String) : "parse error: {0}"
}

pub type Result<T> = std::result::Result<T, NlNetError>;

/// header map with a `Authorization: Bearer <token>` entry if there is a token
pub fn bearer_headers (token: &Option<String>) -> Result<Option<HeaderMap>> {
    if let Some(token) = token {
        let mut hm = HeaderMap::new();
        let mut v = HeaderValue::from_str( format!("Bearer {token}").as_str()).map_err(|e| NlNetError::OpFailed(e.to_string()))?;
        v.set_sensitive(true);
        hm.insert( AUTHORIZATION, v);
        Ok(Some(hm))
    } else {
        Ok(None)
    }
}

fn with_headers (mut req: RequestBuilder, opt_headers: &Option<HeaderMap>) -> RequestBuilder {
    if let Some(headermap) = opt_headers {
        req = req.headers(headermap.clone())
    }
    req
}

/// turn non-OK responses into errors. The response text is included for diagnostics since the
/// servers we talk to report failure reasons in the body
pub async fn check_response (url: &str, response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::NOT_FOUND => Err( NlNetError::NotFoundError(url.to_string())),
        other => {
            let text = response.text().await.unwrap_or_default();
            Err( NlNetError::OpFailed(format!("response status {other:?}: {}", text.trim())))
        }
    }
}

/// fetch file from URL using HTTP GET method. Retrieve in chunks to support large files
/// Note this requires a full URL
pub async fn get_file (client: &Client, url: &str, opt_headers: &Option<HeaderMap>, dir: impl AsRef<Path>) -> Result<PathBuf>  {
    if let Some(fname) = url_file_name( url) {
        let path = dir.as_ref().join(fname);
        download_url( client, url, opt_headers, &path).await?;
        Ok(path)
    } else {
        Err( NlNetError::OpFailed(format!("not a file URL: {}", url)) )
    }
}

/// download the body of a GET response to `path`.
/// Data is written to a temp file in the target dir first so that partial downloads never become visible
/// under `path`. Returns the number of bytes received
pub async fn download_url (client: &Client, url: &str, opt_headers: &Option<HeaderMap>, path: impl AsRef<Path>) -> Result<u64> {
    let req = with_headers( client.get(url), opt_headers);
    let response = check_response( url, req.send().await?).await?;
    save_response( response, path).await
}

/// POST `data` as JSON and download the response body to `path`
pub async fn download_post_json<T> (client: &Client, url: &str, opt_headers: &Option<HeaderMap>, data: &T, path: impl AsRef<Path>) -> Result<u64> where T: Serialize {
    let req = with_headers( client.post(url), opt_headers)
        .header( CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .json( data);
    let response = check_response( url, req.send().await?).await?;
    save_response( response, path).await
}

async fn save_response (mut response: Response, path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new(".")
    };
    let mut file = tempfile::NamedTempFile::new_in( dir)?;
    let mut len: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        len += chunk.len() as u64;
        file.write_all(&chunk)?;
    }
    file.flush()?;
    file.persist( path).map_err( |e| NlNetError::IOError(e.error))?;

    debug!("downloaded {} bytes to {:?}", len, path);
    Ok(len)
}

pub async fn get_text (client: &Client, url: &str, opt_headers: &Option<HeaderMap>) -> Result<String> {
    let req = with_headers( client.get(url), opt_headers);
    let response = check_response( url, req.send().await?).await?;
    Ok( response.text().await? )
}

pub async fn from_json<T> (response: Response)->Result<T> where T: DeserializeOwned {
    let bytes = response.bytes().await?;
    serde_json::from_slice( &bytes).map_err(|e| NlNetError::ParseError(e.to_string()))
}

/// get filename part (last path element) of complete URL
/// NOTE - this does not work for partial (relative) URLs
pub fn url_file_name<'a> (url: &'a str) -> Option<&'a str> {
    URL_RE.captures( url)
    .and_then( |cap| cap.get( PATH))
    .map( |m| m.as_str())
    .and_then( |p| FNAME_RE.captures( p))
    .and_then( |cap| cap.get(1))
    .map( |m| m.as_str())
}

/// concatenate base URL and path elements making sure there is exactly one '/' between them
pub fn join_url (base: &str, elems: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for e in elems {
        let e = e.trim_matches('/');
        if !e.is_empty() {
            url.push('/');
            url.push_str(e);
        }
    }
    url
}
