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

use mockito::{Matcher, Server};
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::json;

use nl_common::net::{bearer_headers, download_post_json, download_url, get_file, get_text, NlNetError};

/// tests for file downloads against a local mock server
/// run with "cargo test --test test_net -- --nocapture"

fn dir_entries (dir: &std::path::Path)->Vec<String> {
    std::fs::read_dir( dir).unwrap()
        .map( |e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect()
}

#[tokio::test]
async fn test_download_ok () {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", "/archive/granule.h5")
        .match_header( "authorization", "Bearer s3cr3t")
        .with_status(200)
        .with_body("HDF5 content")
        .create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("granule.h5");
    let url = format!("{}/archive/granule.h5", server.url());
    let headers = bearer_headers( &Some("s3cr3t".into())).unwrap();

    let len = download_url( &Client::new(), &url, &headers, &path).await.unwrap();
    mock.assert_async().await;

    assert_eq!( len, 12);
    assert_eq!( std::fs::read_to_string( &path).unwrap(), "HDF5 content");
    assert_eq!( dir_entries( dir.path()), vec!["granule.h5"]); // no temp file left over
}

#[tokio::test]
async fn test_download_not_found () {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", "/missing.tif").with_status(404).create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/missing.tif", server.url());
    let res = download_url( &Client::new(), &url, &None, dir.path().join("missing.tif")).await;
    mock.assert_async().await;

    match res {
        Err(NlNetError::NotFoundError(u)) => assert_eq!( u, url),
        other => panic!("expected NotFoundError, got {other:?}")
    }
    assert!( dir_entries( dir.path()).is_empty());
}

#[tokio::test]
async fn test_download_server_error () {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", "/broken.tif").with_status(500).with_body("boom").create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/broken.tif", server.url());
    let res = download_url( &Client::new(), &url, &None, dir.path().join("broken.tif")).await;
    mock.assert_async().await;

    match res {
        Err(NlNetError::OpFailed(msg)) => {
            assert!( msg.contains("500"));
            assert!( msg.contains("boom"));
        }
        other => panic!("expected OpFailed, got {other:?}")
    }
    assert!( dir_entries( dir.path()).is_empty());
}

#[tokio::test]
async fn test_get_file () {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", "/monthly/v10/tile.tgz").with_status(200).with_body("tgz").create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/monthly/v10/tile.tgz", server.url());
    let path = get_file( &Client::new(), &url, &None, dir.path()).await.unwrap();
    mock.assert_async().await;

    assert_eq!( path, dir.path().join("tile.tgz"));
    assert_eq!( std::fs::read( &path).unwrap(), b"tgz");
}

#[tokio::test]
async fn test_post_json () {
    let mut server = Server::new_async().await;
    let mock = server.mock("POST", "/v1/image:getPixels")
        .match_header( "content-type", "application/json")
        .match_body( Matcher::Json( json!({"fileFormat": "GEO_TIFF", "bandIds": ["avg_rad"]})))
        .with_status(200)
        .with_body("tiff bytes")
        .create_async().await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.tif");
    let url = format!("{}/v1/image:getPixels", server.url());
    let body = json!({"fileFormat": "GEO_TIFF", "bandIds": ["avg_rad"]});

    let len = download_post_json( &Client::new(), &url, &None, &body, &path).await.unwrap();
    mock.assert_async().await;
    assert_eq!( len, 10);
    assert_eq!( std::fs::read_to_string( &path).unwrap(), "tiff bytes");
}

#[tokio::test]
async fn test_get_text () {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", "/listing/").with_status(200).with_body("<a href=\"x.tgz\">x</a>").create_async().await;

    let url = format!("{}/listing/", server.url());
    let text = get_text( &Client::new(), &url, &None).await.unwrap();
    mock.assert_async().await;
    assert!( text.contains("x.tgz"));
}
