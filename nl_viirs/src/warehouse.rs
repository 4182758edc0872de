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
//! upload of brightness tables into a data warehouse. The only implementation we have is a dry run that
//! loads and validates the CSV and reports what would be uploaded

use std::{fmt, path::Path, str::FromStr, sync::Mutex};
use async_trait::async_trait;
use tracing::info;

use crate::errors::{NlViirsError, Result, invalid_argument};

/// fully qualified table reference `[project.]dataset.table`
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct TableRef {
    pub project: Option<String>,
    pub dataset: String,
    pub table: String,
}

fn is_valid_id (s: &str)->bool {
    !s.is_empty() && s.chars().all( |c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl FromStr for TableRef {
    type Err = NlViirsError;

    fn from_str (s: &str)->Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if !parts.iter().all( |p| is_valid_id(p)) {
            return Err( invalid_argument( format!("invalid table reference {s:?}")))
        }

        match parts.as_slice() {
            [dataset, table] => Ok( TableRef { project: None, dataset: dataset.to_string(), table: table.to_string() }),
            [project, dataset, table] => Ok( TableRef { project: Some(project.to_string()), dataset: dataset.to_string(), table: table.to_string() }),
            _ => Err( invalid_argument( format!("table reference {s:?} not of form [project.]dataset.table")))
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(project) = &self.project {
            write!(f, "{project}.")?;
        }
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

/// a loaded CSV table
#[derive(Debug,Clone)]
pub struct CsvTable {
    pub headers: csv::StringRecord,
    pub rows: Vec<csv::StringRecord>,
}

impl CsvTable {
    pub fn len (&self)->usize { self.rows.len() }
    pub fn is_empty (&self)->bool { self.rows.is_empty() }
}

pub fn load_csv_table<P: AsRef<Path>> (path: P)->Result<CsvTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err( NlViirsError::NotFoundError( format!("{:?}", path)))
    }

    let mut rdr = csv::Reader::from_path( path)?;
    let headers = rdr.headers()?.clone();
    let mut rows = Vec::new();
    for rec in rdr.records() {
        rows.push( rec?);
    }
    Ok( CsvTable { headers, rows })
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    fn name (&self)->&str;

    /// upload `data` into `table`, returning the number of rows uploaded
    async fn upload (&self, table: &TableRef, data: &CsvTable)->Result<usize>;
}

/// warehouse that does not transmit anything but keeps track of what would have been uploaded
#[derive(Debug,Default)]
pub struct DryRunWarehouse {
    uploads: Mutex<Vec<(TableRef,usize)>>
}

impl DryRunWarehouse {
    pub fn new ()->Self { DryRunWarehouse::default() }

    /// (table, number of rows) for all uploads so far
    pub fn uploads (&self)->Vec<(TableRef,usize)> {
        self.uploads.lock().map( |u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Warehouse for DryRunWarehouse {
    fn name (&self)->&str { "dry-run" }

    async fn upload (&self, table: &TableRef, data: &CsvTable)->Result<usize> {
        let n = data.len();
        info!("{} rows with columns {:?} would be uploaded to {}", n, data.headers.iter().collect::<Vec<_>>(), table);

        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push( (table.clone(), n));
        }
        Ok(n)
    }
}

/// load CSV file and upload it to `table` of `warehouse`. Fails with a NotFoundError if there is no such file
pub async fn update_from_csv (warehouse: &dyn Warehouse, csv_path: &Path, table: &TableRef)->Result<usize> {
    let data = load_csv_table( csv_path)?;
    info!("loaded {} rows from {:?}", data.len(), csv_path);
    warehouse.upload( table, &data).await
}
