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
//! build and runtime environment support for nightlight crates: global root/data dirs,
//! bin context and RON config lookup

use std::{fs, path::{Path,PathBuf}, sync::OnceLock};

mod configs;
pub use configs::*;

mod utils;
pub use utils::*;

mod errors;
pub use errors::*;

/* #region bin globals *******************************************************************/

#[derive(Debug)]
pub struct BinContext {
    pub bin_name: String,
    pub bin_crate: String,
    pub bin_suffix: Option<String>, // optionally set via NIGHTLIGHT_BIN_SUFFIX at runtime
    pub proc_id: Option<u32>,
}

impl BinContext {
    pub fn set(bin_name: &str, bin_crate: &str, bin_suffix: Option<String>, proc_id: Option<u32>) {
        // a second set is ignored - first bin context wins
        let _ = BIN_CONTEXT.set( Self{
            bin_name: bin_name.to_string(),
            bin_crate: bin_crate.to_string(),
            bin_suffix,
            proc_id
        });
    }
}

pub static BIN_CONTEXT: OnceLock<BinContext> = OnceLock::new();

/// this has to be called (once) from the bin source
#[macro_export]
macro_rules! set_bin_context {
    () => {
        {
            // Note that env! looks up the value at compile time, while env::var
            // looks it up at runtime.
            nl_build::BinContext::set( env!("CARGO_BIN_NAME"),
                 env!("CARGO_PKG_NAME"),
                 std::env::var("NIGHTLIGHT_BIN_SUFFIX").ok(),
                 Some(std::process::id()));
        }
    }
}

/// this is mostly for tests and tools that have an explicit config path
pub fn load_config_path<C,P> (path: P) -> Result<C> where C: for <'a> serde::Deserialize<'a>, P: AsRef<Path> {
    let data = file_contents_as_bytes(path.as_ref())?;
    Ok( ron::de::from_bytes( data.as_slice())? )
}

// the global dirs of the application, which are invariant after init
static ROOT_DIR: OnceLock<PathBuf> = OnceLock::new();
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// the global root dir: `NIGHTLIGHT_ROOT`
/// this will try to create the directory if it does not exist and panics if that fails
pub fn root_dir()->&'static PathBuf {
    ROOT_DIR.get_or_init(|| get_or_create_root_dir().expect("failed to locate nightlight root"))
}

/// the global data dir: `NIGHTLIGHT_ROOT/data`
pub fn data_dir()->&'static PathBuf {
    DATA_DIR.get_or_init(|| ensure_dir( root_dir().join("data")))
}

/// the crate data dir of the caller: `NIGHTLIGHT_ROOT/data/<crate>`
/// This is a macro so that it uses the crate name of the caller source
#[macro_export]
macro_rules! pkg_data_dir {
    () => {
        nl_build::ensure_dir( nl_build::data_dir().join( env!("CARGO_PKG_NAME")))
    }
}

/// Note - this panics if the directory does not exist and can't be created
pub fn ensure_dir (dir: PathBuf)->PathBuf {
    if !dir.is_dir() {
        fs::create_dir_all(&dir).unwrap_or_else( |e| panic!("failed to create {dir:?}: {e}"));
    }
    dir
}

/* #endregion bin globals */
