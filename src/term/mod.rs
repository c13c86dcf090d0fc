//! CUNYfirst term/session decoding.
//!
//! A legacy term is `CYYM`: `C` is the century flag (0 for the 1900s, 1 for
//! the 2000s), `YY` the year within the century and `M` a month group whose
//! meaning depends on the session code:
//!
//! ```text
//!  M  session  TT  name   display
//!  *  WIN      10  WIN    Winter        (M = 9 files Winter under the prior Fall: year + 1)
//!  2  1        20  SPR    Spring
//!  6  4W1      41  SS1    Summer Short I
//!  6  4W2      42  SL1    Summer Long I     (before 2016)
//!                  SS2    Summer Short II   (2016 and later)
//!  6  10W      60  S10    Summer 10 Week
//!  6  6W1      61  SS2    Summer Short II
//!  6  6W2      62  SL2    Summer Long II
//!  9  1        90  FALL   Fall
//! ```
//!
//! Canonical codes are `YYYY.TT`, which sort chronologically as plain strings.

pub mod cache;

use serde::Serialize;
use std::fmt;

use crate::error::{Error, Result};

pub use cache::CachingResolver;

/// First year in which session `4W2` means the second short summer session.
const SESSION_4W2_REDEFINED: u16 = 2016;

/// Sub-period within a year. Discriminants are the `TT` part of the code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubPeriod {
    Winter = 10,
    Spring = 20,
    Summer4W1 = 41,
    Summer4W2 = 42,
    Summer10W = 60,
    Summer6W1 = 61,
    Summer6W2 = 62,
    Fall = 90,
}

impl SubPeriod {
    pub fn number(self) -> u8 {
        self as u8
    }

    fn from_number(n: u8) -> Option<Self> {
        Some(match n {
            10 => SubPeriod::Winter,
            20 => SubPeriod::Spring,
            41 => SubPeriod::Summer4W1,
            42 => SubPeriod::Summer4W2,
            60 => SubPeriod::Summer10W,
            61 => SubPeriod::Summer6W1,
            62 => SubPeriod::Summer6W2,
            90 => SubPeriod::Fall,
            _ => return None,
        })
    }

    /// (abbreviation, long label); `4W2` changed meaning in 2016.
    fn labels(self, year: u16) -> (&'static str, &'static str) {
        match self {
            SubPeriod::Winter => ("WIN", "Winter"),
            SubPeriod::Spring => ("SPR", "Spring"),
            SubPeriod::Summer4W1 => ("SS1", "Summer Short I"),
            SubPeriod::Summer4W2 if year < SESSION_4W2_REDEFINED => ("SL1", "Summer Long I"),
            SubPeriod::Summer4W2 => ("SS2", "Summer Short II"),
            SubPeriod::Summer10W => ("S10", "Summer 10 Week"),
            SubPeriod::Summer6W1 => ("SS2", "Summer Short II"),
            SubPeriod::Summer6W2 => ("SL2", "Summer Long II"),
            SubPeriod::Fall => ("FALL", "Fall"),
        }
    }
}

/// A decoded term. Ordering is chronological.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TermCode {
    #[serde(skip)]
    year: u16,
    #[serde(skip)]
    period: SubPeriod,
    /// Sortable `YYYY.TT`, e.g. `2020.90`.
    pub code: String,
    /// Short form, e.g. `2020.FALL`.
    pub name: String,
    /// Long form, e.g. `Fall 2020`.
    pub display: String,
}

impl TermCode {
    pub fn new(year: u16, period: SubPeriod) -> Self {
        let (abbr, label) = period.labels(year);
        Self {
            year,
            period,
            code: format!("{}.{:02}", year, period.number()),
            name: format!("{}.{}", year, abbr),
            display: format!("{} {}", label, year),
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn period(&self) -> SubPeriod {
        self.period
    }

    /// Rebuild a `TermCode` from its canonical `YYYY.TT` string.
    /// Also accepts the zero-padded `YYYY.042` some older files carry.
    pub fn from_code(code: &str) -> Option<Self> {
        let (year, tt) = code.trim().split_once('.')?;
        if year.len() != 4 {
            return None;
        }
        let year: u16 = year.parse().ok()?;
        let period = SubPeriod::from_number(tt.parse().ok()?)?;
        Some(Self::new(year, period))
    }
}

impl fmt::Display for TermCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Decode a legacy `(term, session)` pair.
pub fn resolve(term: &str, session: &str) -> Result<TermCode> {
    let term_t = term.trim();
    let session_t = session.trim();
    let invalid = || Error::invalid_term(term_t, session_t);

    let digits: Vec<u32> = term_t.chars().filter_map(|c| c.to_digit(10)).collect();
    if term_t.len() != 4 || digits.len() != 4 || digits[0] > 1 {
        return Err(invalid());
    }
    let mut year = (1900 + 100 * digits[0] + 10 * digits[1] + digits[2]) as u16;
    let month = digits[3];

    let period = match (month, session_t) {
        (2, "1") => SubPeriod::Spring,
        (9, "1") => SubPeriod::Fall,
        (_, "WIN") => {
            if month == 9 {
                year += 1;
            }
            SubPeriod::Winter
        }
        (6, "4W1") => SubPeriod::Summer4W1,
        (6, "4W2") => SubPeriod::Summer4W2,
        (6, "10W") => SubPeriod::Summer10W,
        (6, "6W1") => SubPeriod::Summer6W1,
        (6, "6W2") => SubPeriod::Summer6W2,
        _ => return Err(invalid()),
    };

    Ok(TermCode::new(year, period))
}
