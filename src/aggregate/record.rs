use serde::{Serialize, Serializer};
use std::{cmp::Ordering, collections::BTreeSet, fmt};

use crate::gened::GenEd;
use crate::term::TermCode;

/// Placeholder for an empty room, name or role.
pub const BLANK: &str = "—";

/// Identity of one scheduled offering. Serializes as `term#class`, so it
/// can key a JSON object.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassKey {
    pub term_code: String,
    pub class_number: String,
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.term_code, self.class_number)
    }
}

impl Serialize for ClassKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Course attribute marking open educational resources (zero textbook cost).
pub const OER_ATTRIBUTE: &str = "OERS";

pub fn is_oer(attributes: &str) -> bool {
    attributes.contains(OER_ATTRIBUTE)
}

/// `round(100 * enrollment / limit)`, or `None` when the limit is zero.
pub fn percent_filled(enrollment: u64, limit: u64) -> Option<u32> {
    if limit == 0 {
        return None;
    }
    Some((100.0 * enrollment as f64 / limit as f64).round() as u32)
}

/// Percentage for display; an undefined value renders empty.
pub fn format_percent(pct: Option<u32>) -> String {
    pct.map(|p| format!("{}%", p)).unwrap_or_default()
}

/// One instructor assignment, displayed as `Name (Role)`.
/// Ordered PI, SI, TA, then any other role; by name within a role.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instructor {
    pub name: String,
    pub role: String,
}

impl Instructor {
    pub fn new(name: &str, role: &str) -> Self {
        let blank_or = |s: &str| {
            let s = s.trim();
            if s.is_empty() {
                BLANK.to_string()
            } else {
                s.to_string()
            }
        };
        Self {
            name: blank_or(name),
            role: blank_or(role),
        }
    }

    /// Parse the display form. Text without a trailing `(Role)` is all name.
    pub fn parse(display: &str) -> Self {
        let display = display.trim();
        if let Some(open) = display.rfind(" (") {
            if let Some(role) = display[open + 2..].strip_suffix(')') {
                return Self::new(&display[..open], role);
            }
        }
        Self::new(display, "")
    }

    fn tier(&self) -> u8 {
        match self.role.as_str() {
            "PI" => 0,
            "SI" => 1,
            "TA" => 2,
            _ => 3,
        }
    }
}

impl Ord for Instructor {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.tier(), &self.name, &self.role).cmp(&(other.tier(), &other.name, &other.role))
    }
}

impl PartialOrd for Instructor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.role)
    }
}

impl Serialize for Instructor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sort `Name (Role)` strings into display order.
pub fn sort_instructors(instructors: &mut [String]) {
    instructors.sort_by_cached_key(|s| Instructor::parse(s));
}

/// Fields every row of one class must agree on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantField {
    Course,
    Title,
    Section,
    Enrollment,
    Limit,
}

impl fmt::Display for InvariantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvariantField::Course => "course",
            InvariantField::Title => "title",
            InvariantField::Section => "section",
            InvariantField::Enrollment => "enrollment",
            InvariantField::Limit => "limit",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct InvariantFields {
    pub course: String,
    pub title: String,
    pub section: String,
    pub enrollment: u32,
    pub limit: u32,
}

impl InvariantFields {
    fn values(&self) -> [(InvariantField, String); 5] {
        [
            (InvariantField::Course, self.course.clone()),
            (InvariantField::Title, self.title.clone()),
            (InvariantField::Section, self.section.clone()),
            (InvariantField::Enrollment, self.enrollment.to_string()),
            (InvariantField::Limit, self.limit.to_string()),
        ]
    }

    /// (field, ours, theirs) for every field that differs.
    fn diff(&self, other: &Self) -> Vec<(InvariantField, String, String)> {
        self.values()
            .into_iter()
            .zip(other.values())
            .filter(|((_, a), (_, b))| a != b)
            .map(|((field, a), (_, b))| (field, a, b))
            .collect()
    }
}

/// Same class key seen with a different value for an invariant field.
/// The record keeps `kept`; `conflicting` was seen `occurrences` times.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DataInconsistency {
    pub key: ClassKey,
    pub field: InvariantField,
    pub kept: String,
    pub conflicting: String,
    pub occurrences: usize,
}

impl fmt::Display for DataInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} is `{}` but {} row(s) have `{}`",
            self.key, self.field, self.kept, self.occurrences, self.conflicting
        )
    }
}

/// Everything known about one class after all of its rows are absorbed.
#[derive(Clone, Debug, Serialize)]
pub struct ClassRecord {
    pub term: TermCode,
    pub class_number: String,
    pub course: String,
    pub discipline: String,
    pub catalog_number: String,
    pub title: String,
    pub section: String,
    pub status: String,
    pub component: String,
    pub primary_component: String,
    pub career: String,
    pub instruction_mode: String,
    pub fees: String,
    /// Any row carried the OER attribute.
    pub oer: bool,
    pub enrollment: u32,
    pub limit: u32,
    pub schedules: BTreeSet<String>,
    pub instructors: BTreeSet<Instructor>,
    pub gened: GenEd,
    /// Distinct invariant tuples in first-seen order, with row counts.
    /// The first entry is the one the record was seeded from.
    #[serde(skip)]
    pub(crate) observed: Vec<(InvariantFields, usize)>,
}

impl ClassRecord {
    pub fn key(&self) -> ClassKey {
        ClassKey {
            term_code: self.term.code.clone(),
            class_number: self.class_number.clone(),
        }
    }

    pub fn percent_filled(&self) -> Option<u32> {
        percent_filled(self.enrollment as u64, self.limit as u64)
    }

    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }

    /// Instructors as `Name (Role)` strings, in display order.
    pub fn instructor_strings(&self) -> Vec<String> {
        self.instructors.iter().map(ToString::to_string).collect()
    }

    pub(crate) fn observe(&mut self, fields: InvariantFields, count: usize) {
        match self.observed.iter_mut().find(|(seen, _)| *seen == fields) {
            Some((_, n)) => *n += count,
            None => self.observed.push((fields, count)),
        }
    }

    /// Fold another partial record for the same key into this one.
    /// `self` holds earlier rows, so its seed values win.
    pub(crate) fn merge(&mut self, other: ClassRecord) {
        for (fields, count) in other.observed {
            self.observe(fields, count);
        }
        self.schedules.extend(other.schedules);
        self.instructors.extend(other.instructors);
        self.oer |= other.oer;
    }

    /// One warning per distinct conflicting value per field.
    pub(crate) fn inconsistencies(&self) -> Vec<DataInconsistency> {
        let Some(((first, _), rest)) = self.observed.split_first() else {
            return Vec::new();
        };
        let key = self.key();
        let mut out: Vec<DataInconsistency> = Vec::new();
        for (fields, count) in rest {
            for (field, kept, conflicting) in first.diff(fields) {
                match out
                    .iter_mut()
                    .find(|w| w.field == field && w.conflicting == conflicting)
                {
                    Some(w) => w.occurrences += count,
                    None => out.push(DataInconsistency {
                        key: key.clone(),
                        field,
                        kept,
                        conflicting,
                        occurrences: *count,
                    }),
                }
            }
        }
        out.sort_by(|a, b| a.field.cmp(&b.field));
        out
    }
}
