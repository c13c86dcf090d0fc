//! General-education reference data: which requirement (RD) a course
//! satisfies, whether it is a STEM variant, and its College Option attributes.

pub mod requirements;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::{collections::HashMap, fs, path::Path};
use tracing::{info, warn};

pub use requirements::{pathways_code, requirement_name, PATHWAYS_REQUIREMENTS, PLAS_REQUIREMENTS};

/// Gen-ed classification of one course. The default is "no classification".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenEd {
    /// Requirement designation abbreviation, e.g. `MQR`; empty if none.
    pub requirement: String,
    /// Course carries extra contact hours or credits.
    pub stem_variant: bool,
    /// College Option attributes, comma separated.
    pub attributes: String,
}

impl GenEd {
    pub fn is_empty(&self) -> bool {
        self.requirement.is_empty() && self.attributes.is_empty()
    }

    /// RD followed by each attribute, blanks dropped.
    pub fn requirement_codes(&self) -> Vec<String> {
        let mut codes = Vec::new();
        if !self.requirement.is_empty() {
            codes.push(self.requirement.clone());
        }
        codes.extend(
            self.attributes
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        );
        codes
    }
}

/// Read-only lookup consulted once per distinct course string.
pub trait GenEdLookup: Sync {
    fn lookup(&self, course: &str) -> Option<GenEd>;
}

/// Lookup that knows no courses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGenEd;

impl GenEdLookup for NoGenEd {
    fn lookup(&self, _course: &str) -> Option<GenEd> {
        None
    }
}

/// In-memory reference table keyed by normalized course string.
#[derive(Debug, Default, Clone)]
pub struct GenEdTable {
    courses: HashMap<String, GenEd>,
}

/// `ENGL  110 ` → `ENGL 110`.
pub fn normalize_course(course: &str) -> String {
    course.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A trailing `*` on a designation marks a STEM variant; system designation
/// codes are mapped to their Pathways abbreviation.
fn parse_designation(raw: &str) -> (String, bool) {
    let raw = raw.trim();
    let (code, stem) = match raw.strip_suffix('*') {
        Some(code) => (code.trim(), true),
        None => (raw, false),
    };
    let code = pathways_code(code).unwrap_or(code);
    (code.to_string(), stem)
}

impl GenEdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, course: &str, gened: GenEd) {
        self.courses.insert(normalize_course(course), gened);
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Parse the hand-edited whitespace listing: `DISC NUM DESIGNATION [ATTR ...]`.
    /// Every token after the designation is an attribute.
    pub fn from_listing(text: &str) -> Self {
        let mut table = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            if tokens.len() < 3 {
                warn!(line = lineno + 1, "gen-ed line has no designation, skipped");
                continue;
            }
            let course = format!("{} {}", tokens[0], tokens[1]);
            let (requirement, stem_variant) = parse_designation(tokens[2]);
            let attributes = tokens[3..]
                .iter()
                .map(|a| a.trim_end_matches(','))
                .collect::<Vec<_>>()
                .join(", ");
            table.insert(
                &course,
                GenEd {
                    requirement,
                    stem_variant,
                    attributes,
                },
            );
        }
        table
    }

    /// Parse `Course,Core,COPT` CSV (optionally with a `STEM Variant` column).
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(data);
        let headers: Vec<String> = rdr
            .headers()
            .context("reading gen-ed CSV header")?
            .iter()
            .map(crate::ingest::normalize_header)
            .collect();
        let find = |names: &[&str]| names.iter().find_map(|n| headers.iter().position(|h| h == n));

        let course_idx = find(&["course"]).context("gen-ed CSV has no `Course` column")?;
        let core_idx = find(&["core", "rd", "designation"]);
        let copt_idx = find(&["copt", "attributes", "gened_attributes"]);
        let stem_idx = find(&["stem_variant", "sv"]);

        let mut table = Self::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("gen-ed CSV record {}", idx))?;
            let cell = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();
            let course = cell(Some(course_idx));
            if course.is_empty() {
                continue;
            }
            let (requirement, starred) = parse_designation(cell(core_idx));
            let stem_flag = matches!(cell(stem_idx), "Y" | "y" | "*" | "true" | "1");
            table.insert(
                course,
                GenEd {
                    requirement,
                    stem_variant: starred || stem_flag,
                    attributes: cell(copt_idx).to_string(),
                },
            );
        }
        Ok(table)
    }

    /// Load by extension: `.csv` as CSV, anything else as the whitespace listing.
    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
        let table = if is_csv {
            Self::from_csv(&data)?
        } else {
            Self::from_listing(&String::from_utf8_lossy(&data))
        };
        info!(courses = table.len(), "loaded gen-ed reference");
        Ok(table)
    }
}

impl GenEdLookup for GenEdTable {
    fn lookup(&self, course: &str) -> Option<GenEd> {
        self.courses.get(&normalize_course(course)).cloned()
    }
}
