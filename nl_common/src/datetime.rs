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
use std::{fmt, str::FromStr};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Serialize,Deserialize};

pub fn naive_utc_date_to_utc_datetime (nd: NaiveDate) -> DateTime<Utc> {
    nd.and_hms_opt(0, 0, 0).map( |ndt| ndt.and_utc()).unwrap_or_default()
}

/// a validated calendar month
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash,Serialize,Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32
}

impl YearMonth {
    pub fn new (year: i32, month: u32)->Option<Self> {
        NaiveDate::from_ymd_opt( year, month, 1).map( |_| YearMonth{ year, month })
    }

    pub fn year (&self)->i32 { self.year }
    pub fn month (&self)->u32 { self.month }

    pub fn first_day (&self)->NaiveDate {
        NaiveDate::from_ymd_opt( self.year, self.month, 1).unwrap_or_default() // checked in ctor
    }

    pub fn next (&self)->YearMonth {
        if self.month == 12 { YearMonth{ year: self.year+1, month: 1 } } else { YearMonth{ year: self.year, month: self.month+1 } }
    }

    /// exclusive end date of this month
    pub fn end_day (&self)->NaiveDate { self.next().first_day() }

    /// inclusive last day of this month
    pub fn last_day (&self)->NaiveDate {
        self.end_day().pred_opt().unwrap_or_default()
    }

    /// 1-based day of year of the first day in this month
    pub fn first_day_of_year (&self)->u32 { self.first_day().ordinal() }

    pub fn start_time (&self)->DateTime<Utc> { naive_utc_date_to_utc_datetime( self.first_day()) }
    pub fn end_time (&self)->DateTime<Utc> { naive_utc_date_to_utc_datetime( self.end_day()) }

    /// "YYYYMM"
    pub fn compact (&self)->String { format!("{:04}{:02}", self.year, self.month) }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// parse "YYYY-MM" or "YYYYMM"
impl FromStr for YearMonth {
    type Err = String;

    fn from_str (s: &str)->Result<Self,Self::Err> {
        let s = s.trim();
        let (y,m) = if let Some((y,m)) = s.split_once('-') {
            (y,m)
        } else if s.len() == 6 {
            s.split_at(4)
        } else {
            return Err( format!("not a year-month: {s}"))
        };

        let year: i32 = y.parse().map_err( |_| format!("invalid year: {y}"))?;
        let month: u32 = m.parse().map_err( |_| format!("invalid month: {m}"))?;
        YearMonth::new( year, month).ok_or_else( || format!("invalid year-month: {s}"))
    }
}
