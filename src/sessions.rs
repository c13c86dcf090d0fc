// src/sessions.rs
//
// Session table extract: one row per (term, session) with its calendar.
// Rows whose term/session does not decode are skipped.

use chrono::NaiveDate;
use serde::Serialize;
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{debug, info};

use crate::error::Result;
use crate::ingest::{normalize_header, read_table};
use crate::term::{resolve, TermCode};

/// Parse `m/d/yyyy`, `m/d/yy` or `yyyy-mm-dd`. Two-digit years are 20xx.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let raw = raw.split_whitespace().next().unwrap_or(raw);
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    let mut parts = raw.split('/');
    let (m, d, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let mut year: i32 = y.parse().ok()?;
    if y.len() <= 2 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, m.parse().ok()?, d.parse().ok()?)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionDates {
    pub term: TermCode,
    pub session_start: Option<NaiveDate>,
    pub session_end: Option<NaiveDate>,
    pub enroll_start: Option<NaiveDate>,
    pub enroll_end: Option<NaiveDate>,
    pub weeks: String,
    pub census: Option<NaiveDate>,
}

/// Session dates keyed by canonical term code.
#[derive(Debug, Default, Serialize)]
pub struct SessionTable {
    pub sessions: BTreeMap<String, SessionDates>,
    /// Query run date of the extract, if it carries one.
    pub sysdate: Option<NaiveDate>,
    pub skipped: usize,
}

impl SessionTable {
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let table = read_table(data, None)?;
        let headers: Vec<String> = table.headers.iter().map(|h| normalize_header(h)).collect();
        let idx = |names: &[&str]| names.iter().find_map(|n| headers.iter().position(|h| h == n));
        let term_i = idx(&["term"]);
        let session_i = idx(&["session"]);
        let start_i = idx(&["session_beginning_date", "session_begin_date"]);
        let end_i = idx(&["session_end_date"]);
        let enroll_start_i = idx(&["first_date_to_enroll"]);
        let enroll_end_i = idx(&["last_date_to_enroll"]);
        let weeks_i = idx(&["weeks_of_instruction"]);
        let census_i = idx(&["census_date"]);
        let sysdate_i = idx(&["sysdate"]);

        let mut out = SessionTable::default();
        for row in &table.rows {
            let cell = |i: Option<usize>| i.and_then(|i| row.get(i)).map_or("", |s| s.trim());
            let (term, session) = (cell(term_i), cell(session_i));
            let term_code = match resolve(term, session) {
                Ok(t) => t,
                Err(e) => {
                    debug!(%e, "skipping session row");
                    out.skipped += 1;
                    continue;
                }
            };
            if let Some(d) = parse_date(cell(sysdate_i)) {
                out.sysdate = Some(d);
            }
            out.sessions.insert(
                term_code.code.clone(),
                SessionDates {
                    term: term_code,
                    session_start: parse_date(cell(start_i)),
                    session_end: parse_date(cell(end_i)),
                    enroll_start: parse_date(cell(enroll_start_i)),
                    enroll_end: parse_date(cell(enroll_end_i)),
                    weeks: cell(weeks_i).to_string(),
                    census: parse_date(cell(census_i)),
                },
            );
        }
        Ok(out)
    }

    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let table = Self::from_csv(&data)?;
        info!(
            sessions = table.sessions.len(),
            skipped = table.skipped,
            "loaded session table"
        );
        Ok(table)
    }

    pub fn end_date(&self, term_code: &str) -> Option<NaiveDate> {
        self.sessions.get(term_code).and_then(|s| s.session_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Institution,Term,Session,Session Beginning Date,Session End Date,First Date to Enroll,Last Date to Enroll,Weeks of Instruction,Census Date,Sysdate
QNS01,1209,1,08/26/2020,12/22/2020,03/30/2020,09/01/2020,15,09/18/2020,9/5/20
QNS01,1209,WIN,01/04/2021,01/29/2021,10/01/2020,01/05/2021,4,01/06/2021,9/5/20
QNS01,1209,ZZZ,08/26/2020,12/22/2020,,,,,9/5/20
";

    #[test]
    fn parses_dates() {
        assert_eq!(parse_date("12/22/2020"), NaiveDate::from_ymd_opt(2020, 12, 22));
        assert_eq!(parse_date("9/5/20"), NaiveDate::from_ymd_opt(2020, 9, 5));
        assert_eq!(parse_date("2021-01-29"), NaiveDate::from_ymd_opt(2021, 1, 29));
        assert_eq!(parse_date("2021-01-29 00:00:00"), NaiveDate::from_ymd_opt(2021, 1, 29));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("13/45/2020"), None);
    }

    #[test]
    fn builds_table_and_skips_unknown_sessions() {
        let table = SessionTable::from_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.sessions.len(), 2);
        assert_eq!(table.skipped, 1);
        assert_eq!(table.sysdate, NaiveDate::from_ymd_opt(2020, 9, 5));
        assert_eq!(
            table.end_date("2020.90"),
            NaiveDate::from_ymd_opt(2020, 12, 22)
        );
        assert_eq!(
            table.end_date("2021.10"),
            NaiveDate::from_ymd_opt(2021, 1, 29)
        );
        assert_eq!(table.sessions["2020.90"].weeks, "15");
        assert_eq!(table.end_date("2020.20"), None);
    }
}
