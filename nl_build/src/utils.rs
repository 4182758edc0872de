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
use std::{io::{Read,Write},path::{Path,PathBuf},fs::{self,File},env};
use crate::errors::Result;

pub const ROOT_ENV: &'static str = "NIGHTLIGHT_ROOT";

pub fn file_contents_as_bytes (path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut contents: Vec<u8> = Vec::with_capacity(len as usize);
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

pub fn write_file (path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let mut file = File::create( path)?;
    Ok( file.write_all(contents)? )
}

/// expand leading `$VAR` path elements from the environment. Unknown vars are kept verbatim
pub fn expand_path (s: &str)->PathBuf {
    let mut res: PathBuf = PathBuf::new();
    for e in Path::new(s).iter() {
        let s = e.to_string_lossy();
        if let Some(var) = s.strip_prefix('$') {
            if let Ok(se) = env::var(var) {
                res.push(se)
            } else { res.push(s.as_ref()) }
        } else { res.push(s.as_ref()) }
    }
    res
}

/// modify path and check if path condition holds. If not revert the path to its previous state
#[macro_export]
macro_rules! path_cond {
    ( $pred:ident, $path_expr:expr, $($e:expr),* ) => {
        {
            let path: &mut PathBuf = $path_expr;
            let n0 = path.components().count();
            $( path.push($e); )*
            if path.$pred() {
                true
            } else {
                // restore path
                let mut n = path.components().count();
                while n > n0 { path.pop(); n -= 1; }
                false
            }
        }
    }
}

#[macro_export]
macro_rules! has_any_path_cond {
    ($pred:ident, $path_expr:expr, $($e:expr),*) => {
        {
            let path: &mut PathBuf = $path_expr;
            let mut holds = |e| { path.push(e); let res=path.$pred(); path.pop(); res };
            $( holds($e) || )* false
        }
    }
}

/// this is the highest parent from the current dir that still has a Cargo.toml
pub fn get_workspace_dir()->Option<PathBuf> {
    if let Ok(mut path) = env::current_dir() {
        if !path.join("Cargo.toml").is_file() { return None }

        while path_cond!( is_file, &mut path, "..", "Cargo.toml") {
            path.pop(); // pops Cargo.toml
            path.pop(); // pops ".."
            if !path.pop() { return None } // no parent
        }
        return Some(path)
    }
    None
}

pub fn get_workspace_parent()->Option<PathBuf> {
    get_workspace_dir().map( |mut p| { p.pop(); p})
}

pub fn get_env_root()->Option<PathBuf> {
    env::var(ROOT_ENV).ok().map( |root| expand_path( root.as_str()))
}

pub fn default_root()->PathBuf {
    let mut path = env::var("HOME").map( |home| PathBuf::from(home)).unwrap_or_else( |_| env::temp_dir());
    path.push( ".nightlight");
    path
}

/// does `dir` have any of the known root subdirs {cache,data,configs}
pub fn is_root_candidate (dir: &Path)->bool {
    let mut path = dir.to_path_buf();
    has_any_path_cond!( is_dir, &mut path, "cache", "data", "configs")
}

/// get the root dir to use. If this returns Ok the path is guaranteed to exist.
/// Lookup is in the following order:
///
/// 1. use $NIGHTLIGHT_ROOT if set
/// 2. workspace parent if it has any of the dirs {cache,data,configs}
/// 3. $HOME/.nightlight
pub fn get_or_create_root_dir()->Result<PathBuf> {
    let path = if let Some(path) = get_env_root() {
        path
    } else {
        match get_workspace_parent() {
            Some(path) if is_root_candidate( &path) => path,
            _ => default_root()
        }
    };

    if !path.is_dir() { fs::create_dir_all(&path)? }
    Ok(path)
}

/// return value of env var `key` if it is set and not empty, otherwise the (optional) fallback
pub fn env_or (key: &str, fallback: &Option<String>)->Option<String> {
    match env::var(key) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_cond () {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all( dir.path().join("configs").join("nl_viirs")).unwrap();
        write_file( dir.path().join("configs").join("nl_viirs").join("viirs.ron"), b"()").unwrap();

        let mut path = dir.path().to_path_buf();
        assert!( !path_cond!( is_file, &mut path, "configs", "nl_viirs", "missing.ron"));
        assert_eq!( path, dir.path()); // restored

        assert!( path_cond!( is_file, &mut path, "configs", "nl_viirs", "viirs.ron"));
        assert!( path.ends_with("configs/nl_viirs/viirs.ron"));

        let mut path = dir.path().to_path_buf();
        assert!( has_any_path_cond!( is_dir, &mut path, "cache", "configs"));
        assert!( !has_any_path_cond!( is_dir, &mut path, "cache", "data"));
    }

    #[test]
    fn test_root_candidate () {
        let dir = tempfile::tempdir().unwrap();
        assert!( !is_root_candidate( dir.path()));

        fs::create_dir_all( dir.path().join("data")).unwrap();
        assert!( is_root_candidate( dir.path()));
    }

    #[test]
    fn test_expand_path () {
        let p = expand_path("$NL_TEST_UNSET_VAR_42/data");
        assert_eq!( p, PathBuf::from("$NL_TEST_UNSET_VAR_42/data"));

        let p = expand_path("/tmp/data");
        assert_eq!( p, PathBuf::from("/tmp/data"));
    }

    #[test]
    fn test_env_or () {
        let fallback = Some("from-config".to_string());
        assert_eq!( env_or("NL_TEST_UNSET_VAR_42", &fallback), fallback);
        assert_eq!( env_or("NL_TEST_UNSET_VAR_42", &None), None);
    }
}
