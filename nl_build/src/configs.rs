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
use std::{env,path::{Path,PathBuf}};
use crate::*;

pub const CONFIGS: &'static str = "configs";

/// locate a config file and return its PathBuf.
/// Lookup order is:
///
/// 1. `filename` itself if it is an existing path (e.g. explicitly given on the command line)
/// 2. `$NIGHTLIGHT_ROOT/configs/[<bin-crate>/<bin-name>/]<resource-crate>/<filename>`
/// 3. `<workspace-parent>/configs/..` (first dir outside the source repo)
/// 4. `$HOME/.nightlight/configs/..`
/// 5. `<workspace>/<resource-crate>/configs/<filename>` (defaults within the repo)
pub fn find_config_file (ctx: &Option<&BinContext>, resource_crate: &str, filename: &str) -> Option<PathBuf> {
    let path = Path::new(filename);
    if path.is_file() { return Some(path.to_path_buf()) }

    if let Some(mut path) = get_env_root() {
        if find_external_config( &mut path, ctx, resource_crate, filename) { return Some(path) }
    }

    if let Some(mut path) = get_workspace_parent() {
        if find_external_config( &mut path, ctx, resource_crate, filename) { return Some(path) }
    }

    let mut path = default_root();
    if find_external_config( &mut path, ctx, resource_crate, filename) { return Some(path) }

    if let Some(mut path) = get_workspace_dir() {
        if crate::path_cond!( is_file, &mut path, resource_crate, CONFIGS, filename) { return Some(path) }
    }

    None
}

fn find_external_config (path: &mut PathBuf, bin_ctx: &Option<&BinContext>, resource_crate: &str, filename: &str)->bool {
    // check bin specific override first
    if let Some(ctx) = bin_ctx {
        let bin_crate = ctx.bin_crate.as_str();
        let bin_name = ctx.bin_name.as_str();
        if crate::path_cond!( is_file, path, CONFIGS, bin_crate, bin_name, resource_crate, filename) { return true }
    }

    crate::path_cond!( is_file, path, CONFIGS, resource_crate, filename)
}

/// runtime (crate) part of config management
/// this is the macro that needs to be expanded at the top of crates (lib.rs) that define configs.
/// Config users call the defined `load_config(..)` function to instantiate config structs
#[macro_export]
macro_rules! define_load_config {
    () => {
        mod configs {
            /// load config using nl_build - based lookup mechanism
            pub fn load_config<C> (filename: &str) -> nl_build::Result<C> where C: for <'a> serde::Deserialize<'a> {
                let bin_ctx = nl_build::BIN_CONTEXT.get();
                let resource_crate = env!("CARGO_PKG_NAME");

                if let Some(path) = nl_build::find_config_file( &bin_ctx, resource_crate, filename) {
                    return nl_build::load_config_path( &path)
                }

                Err( nl_build::NlBuildError::ResourceNotFoundError(filename.to_string()) )
            }
        }
        pub use configs::*; // make load_config() visible at the crate level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize,Debug)]
    struct TestConfig {
        name: String,
        buffer_km: f64
    }

    #[test]
    fn test_explicit_config_path () {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.ron");
        write_file( &path, br#"TestConfig( name: "Paris", buffer_km: 25.0 )"#).unwrap();

        let found = find_config_file( &None, "nl_build", path.to_str().unwrap());
        assert_eq!( found.as_ref(), Some(&path));

        let conf: TestConfig = load_config_path( &path).unwrap();
        assert_eq!( conf.name, "Paris");
        assert_eq!( conf.buffer_km, 25.0);
    }

    #[test]
    fn test_missing_config () {
        assert!( find_config_file( &None, "nl_build", "no-such-config-2f9a.ron").is_none());
    }
}
