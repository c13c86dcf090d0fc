// src/aggregate/mod.rs
//
// Groups enrollment rows into one record per (term code, class number).
// A class may span several rows (more than one room or instructor), and
// those rows are not guaranteed to be adjacent, so nothing here is valid
// until the whole input has been consumed.

pub mod course;
pub mod order;
pub mod record;
pub mod schedule;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet, HashMap},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::gened::{GenEd, GenEdLookup};
use crate::ingest::RawEnrollmentRow;
use crate::sessions::parse_date;
use crate::term::{CachingResolver, TermCode};

pub use course::{offered_by_requirement, rollup, CourseAggregate};
pub use order::{catalog_numeric_part, course_order};
pub use record::{
    format_percent, is_oer, percent_filled, sort_instructors, ClassKey, ClassRecord,
    DataInconsistency, Instructor, InvariantField, OER_ATTRIBUTE,
};
pub use schedule::schedule_string;

use record::InvariantFields;

/// Component code of message/non-credit rows, which carry no seats.
pub const MESSAGE_COMPONENT: &str = "MSG";

#[derive(Clone, Debug)]
pub struct AggregatorOptions {
    /// Keep only rows of this institution; `None` keeps all.
    pub institution: Option<String>,
    pub message_component: String,
}

impl AggregatorOptions {
    pub fn keeps_institution(&self, institution: &str) -> bool {
        self.institution
            .as_deref()
            .map_or(true, |inst| institution.trim() == inst)
    }
}

/// Query run date of the first kept row that carries one.
pub fn as_of_date(rows: &[RawEnrollmentRow], options: &AggregatorOptions) -> Option<NaiveDate> {
    rows.iter()
        .filter(|r| options.keeps_institution(&r.institution))
        .find_map(|r| parse_date(&r.sysdate))
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            institution: None,
            message_component: MESSAGE_COMPONENT.to_string(),
        }
    }
}

/// Result of one aggregation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Aggregation {
    pub classes: BTreeMap<ClassKey, ClassRecord>,
    pub warnings: Vec<DataInconsistency>,
    /// Rows per class status, before any row is skipped.
    pub status_counts: BTreeMap<String, usize>,
    pub rows_read: usize,
    pub skipped_messages: usize,
    pub skipped_institution: usize,
}

impl Aggregation {
    /// Classes in course-code order.
    pub fn sorted_classes(&self) -> Vec<&ClassRecord> {
        let mut classes: Vec<&ClassRecord> = self.classes.values().collect();
        classes.sort_by(|a, b| course_order(a, b));
        classes
    }

    pub fn terms(&self) -> BTreeSet<TermCode> {
        self.classes.values().map(|c| c.term.clone()).collect()
    }

    /// Course rollup of the Active classes in one term.
    pub fn courses(&self, term_code: &str) -> BTreeMap<String, CourseAggregate> {
        rollup(self.classes.values().filter(|c| c.term.code == term_code))
    }
}

/// Per-run accumulator; partial results from chunks merge into one.
#[derive(Debug, Default)]
struct Partial {
    classes: BTreeMap<ClassKey, ClassRecord>,
    status_counts: BTreeMap<String, usize>,
    rows_read: usize,
    skipped_messages: usize,
    skipped_institution: usize,
}

impl Partial {
    /// `other` covers rows after `self`.
    fn merge(&mut self, other: Partial) {
        for (key, record) in other.classes {
            match self.classes.get_mut(&key) {
                Some(existing) => existing.merge(record),
                None => {
                    self.classes.insert(key, record);
                }
            }
        }
        for (status, n) in other.status_counts {
            *self.status_counts.entry(status).or_default() += n;
        }
        self.rows_read += other.rows_read;
        self.skipped_messages += other.skipped_messages;
        self.skipped_institution += other.skipped_institution;
    }

    fn finish(self) -> Aggregation {
        let warnings: Vec<DataInconsistency> = self
            .classes
            .values()
            .flat_map(ClassRecord::inconsistencies)
            .collect();
        for w in &warnings {
            warn!(
                key = %w.key,
                field = %w.field,
                kept = %w.kept,
                conflicting = %w.conflicting,
                occurrences = w.occurrences,
                "data inconsistency"
            );
        }
        Aggregation {
            classes: self.classes,
            warnings,
            status_counts: self.status_counts,
            rows_read: self.rows_read,
            skipped_messages: self.skipped_messages,
            skipped_institution: self.skipped_institution,
        }
    }
}

/// Empty → 0. Text that is not a count is logged and read as 0.
fn parse_count(raw: &str, what: &str, key: &ClassKey) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    raw.parse::<u32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u32))
        .unwrap_or_else(|| {
            warn!(%key, what, value = raw, "unreadable count, using 0");
            0
        })
}

/// Owns all state of one aggregation run.
pub struct EnrollmentAggregator<'a> {
    gened: &'a dyn GenEdLookup,
    options: AggregatorOptions,
    resolver: CachingResolver,
    gened_cache: HashMap<String, GenEd>,
    partial: Partial,
}

impl<'a> EnrollmentAggregator<'a> {
    pub fn new(gened: &'a dyn GenEdLookup, options: AggregatorOptions) -> Self {
        Self {
            gened,
            options,
            resolver: CachingResolver::new(),
            gened_cache: HashMap::new(),
            partial: Partial::default(),
        }
    }

    fn gened_for(&mut self, course: &str) -> GenEd {
        if let Some(hit) = self.gened_cache.get(course) {
            return hit.clone();
        }
        let found = self.gened.lookup(course).unwrap_or_default();
        self.gened_cache.insert(course.to_string(), found.clone());
        found
    }

    /// Absorb one row. `index` is the zero-based data row number, used in errors.
    fn absorb(&mut self, index: usize, row: &RawEnrollmentRow) -> Result<()> {
        let p = &mut self.partial;
        p.rows_read += 1;

        if !self.options.keeps_institution(&row.institution) {
            p.skipped_institution += 1;
            return Ok(());
        }

        *p.status_counts.entry(row.status.trim().to_string()).or_default() += 1;

        if row.component.trim() == self.options.message_component {
            p.skipped_messages += 1;
            return Ok(());
        }

        let term = self
            .resolver
            .resolve(&row.term, &row.session)
            .map_err(|e| Error::InvalidTermCodeAt {
                row: index + 1,
                source: Box::new(e),
            })?;

        let key = ClassKey {
            term_code: term.code.clone(),
            class_number: row.class_number.trim().to_string(),
        };
        let course = row.course();
        let fields = InvariantFields {
            course: course.clone(),
            title: row.title.trim().to_string(),
            section: row.section.trim().to_string(),
            enrollment: parse_count(&row.enrollment, "enrollment", &key),
            limit: parse_count(&row.limit, "limit", &key),
        };
        let schedule = schedule_string(
            &row.room,
            &row.meeting_days,
            &row.meeting_start,
            &row.meeting_end,
        );
        let instructor = Instructor::new(&row.instructor, &row.role);
        let oer = is_oer(&row.attributes);

        if let Some(existing) = self.partial.classes.get_mut(&key) {
            existing.observe(fields, 1);
            existing.schedules.insert(schedule);
            existing.instructors.insert(instructor);
            existing.oer |= oer;
            return Ok(());
        }

        let gened = self.gened_for(&course);
        let record = ClassRecord {
            term,
            class_number: key.class_number.clone(),
            course,
            discipline: row.subject.trim().to_string(),
            catalog_number: row.catalog_number.trim().to_string(),
            title: fields.title.clone(),
            section: fields.section.clone(),
            status: row.status.trim().to_string(),
            component: row.component.trim().to_string(),
            primary_component: row.primary_component.trim().to_string(),
            career: row.career.trim().to_string(),
            instruction_mode: row.instruction_mode.trim().to_string(),
            fees: row.fees.trim().to_string(),
            oer,
            enrollment: fields.enrollment,
            limit: fields.limit,
            schedules: BTreeSet::from([schedule]),
            instructors: BTreeSet::from([instructor]),
            gened,
            observed: vec![(fields, 1)],
        };
        self.partial.classes.insert(key, record);
        Ok(())
    }

    fn absorb_all<I, R>(&mut self, first_index: usize, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: Borrow<RawEnrollmentRow>,
    {
        for (offset, row) in rows.into_iter().enumerate() {
            self.absorb(first_index + offset, row.borrow())?;
        }
        Ok(())
    }

    /// Consume every row, then build the result. Aborts on the first row
    /// whose term code does not decode.
    pub fn aggregate<I, R>(mut self, rows: I) -> Result<Aggregation>
    where
        I: IntoIterator<Item = R>,
        R: Borrow<RawEnrollmentRow>,
    {
        let start = Instant::now();
        self.absorb_all(0, rows)?;
        debug!(terms = self.resolver.len(), "distinct term/session pairs");
        let result = self.partial.finish();
        log_summary(&result, start);
        Ok(result)
    }

    /// Pre-aggregate `chunk_size` rows per rayon task, then merge the chunks
    /// in input order. Same result as [`aggregate`](Self::aggregate).
    pub fn aggregate_parallel(
        self,
        rows: &[RawEnrollmentRow],
        chunk_size: usize,
    ) -> Result<Aggregation> {
        let start = Instant::now();
        let chunk_size = chunk_size.max(1);
        let gened = self.gened;
        let options = &self.options;

        let partials: Vec<Result<Partial>> = rows
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(i, chunk)| {
                let mut worker = EnrollmentAggregator::new(gened, options.clone());
                worker.absorb_all(i * chunk_size, chunk)?;
                Ok(worker.partial)
            })
            .collect();

        let mut merged = self.partial;
        for partial in partials {
            merged.merge(partial?);
        }
        let result = merged.finish();
        log_summary(&result, start);
        Ok(result)
    }
}

fn log_summary(result: &Aggregation, start: Instant) {
    info!(
        rows = result.rows_read,
        classes = result.classes.len(),
        warnings = result.warnings.len(),
        skipped_messages = result.skipped_messages,
        skipped_institution = result.skipped_institution,
        elapsed = ?start.elapsed(),
        "aggregated enrollments"
    );
    for (status, count) in &result.status_counts {
        info!(status = %status, count, "class status");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gened::{GenEdTable, NoGenEd};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,enrollments::aggregate=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn row(class_number: &str, instructor: &str, role: &str, room: &str) -> RawEnrollmentRow {
        RawEnrollmentRow {
            institution: "QNS01".into(),
            term: "1209".into(),
            session: "1".into(),
            subject: "ENGL".into(),
            catalog_number: "110".into(),
            title: "College Writing 1".into(),
            class_number: class_number.into(),
            section: "01".into(),
            status: "Active".into(),
            component: "LEC".into(),
            enrollment: "24".into(),
            limit: "25".into(),
            room: room.into(),
            meeting_days: [true, false, true, false, false, false, false],
            meeting_start: "9:15:00.000000 AM".into(),
            meeting_end: "10:30:00.000000 AM".into(),
            instructor: instructor.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    fn aggregate(rows: &[RawEnrollmentRow]) -> Aggregation {
        EnrollmentAggregator::new(&NoGenEd, AggregatorOptions::default())
            .aggregate(rows)
            .unwrap()
    }

    #[test]
    fn co_taught_class_in_two_rooms_is_one_record() {
        init_test_logging();
        let rows = vec![
            row("12345", "Doe, Jane", "PI", "KY 101"),
            row("12345", "Lee, Bo", "SI", "KY 102"),
            row("12345", "Lee, Bo", "SI", "KY 102"),
        ];
        let result = aggregate(&rows);

        assert_eq!(result.classes.len(), 1);
        assert!(result.warnings.is_empty());
        let class = result.classes.values().next().unwrap();
        assert_eq!(class.term.code, "2020.90");
        assert_eq!(class.schedules.len(), 2);
        assert_eq!(
            class.instructor_strings(),
            vec!["Doe, Jane (PI)", "Lee, Bo (SI)"]
        );
        assert_eq!(class.percent_filled(), Some(96));
    }

    #[test]
    fn conflicting_enrollment_is_flagged_and_first_value_kept() {
        let mut second = row("12345", "Doe, Jane", "PI", "KY 101");
        second.enrollment = "20".into();
        let mut third = second.clone();
        third.room = "KY 103".into();
        let result = aggregate(&[row("12345", "Doe, Jane", "PI", "KY 101"), second, third]);

        let class = result.classes.values().next().unwrap();
        assert_eq!(class.enrollment, 24);
        assert_eq!(
            result.warnings,
            vec![DataInconsistency {
                key: class.key(),
                field: InvariantField::Enrollment,
                kept: "24".into(),
                conflicting: "20".into(),
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn zero_limit_has_no_percentage() {
        let mut r = row("1", "A", "PI", "R");
        r.limit = "".into();
        r.enrollment = "".into();
        let result = aggregate(&[r]);
        let class = result.classes.values().next().unwrap();
        assert_eq!(class.limit, 0);
        assert_eq!(class.percent_filled(), None);
    }

    #[test]
    fn message_rows_are_skipped_but_counted() {
        let mut msg = row("999", "", "", "");
        msg.component = "MSG".into();
        let mut cancelled = row("2", "A", "PI", "R");
        cancelled.status = "Cancelled".into();
        let result = aggregate(&[msg, cancelled, row("1", "A", "PI", "R")]);

        assert_eq!(result.rows_read, 3);
        assert_eq!(result.skipped_messages, 1);
        assert_eq!(result.classes.len(), 2);
        assert_eq!(result.status_counts.get("Active"), Some(&2));
        assert_eq!(result.status_counts.get("Cancelled"), Some(&1));

        let courses = result.courses("2020.90");
        let engl = &courses["ENGL 110"];
        assert_eq!(engl.enrollment, 24);
        assert_eq!(engl.section_count(), 1);
    }

    #[test]
    fn oer_flag_follows_course_attributes() {
        let mut oer = row("1", "A", "PI", "R");
        oer.attributes = "QNSLIT, OERS".into();
        let plain = row("2", "A", "PI", "R");
        let mut second_room = row("3", "A", "PI", "R1");
        let mut flagged_later = row("3", "A", "PI", "R2");
        second_room.attributes = "".into();
        flagged_later.attributes = "OERS".into();

        let rows = [oer, plain, second_room, flagged_later];
        let result = aggregate(&rows);
        let flags: Vec<(&str, bool)> = result
            .sorted_classes()
            .iter()
            .map(|c| (c.class_number.as_str(), c.oer))
            .collect();
        assert_eq!(flags, vec![("1", true), ("2", false), ("3", true)]);

        let parallel = EnrollmentAggregator::new(&NoGenEd, AggregatorOptions::default())
            .aggregate_parallel(&rows, 1)
            .unwrap();
        assert!(parallel.classes.values().all(|c| c.oer == result.classes[&c.key()].oer));
    }

    #[test]
    fn invalid_term_aborts_with_row_number() {
        let mut bad = row("2", "A", "PI", "R");
        bad.term = "1203".into();
        let err = EnrollmentAggregator::new(&NoGenEd, AggregatorOptions::default())
            .aggregate(&[row("1", "A", "PI", "R"), bad])
            .unwrap_err();
        assert!(err.is_invalid_term_code());
        assert!(matches!(err, Error::InvalidTermCodeAt { row: 2, .. }));
    }

    #[test]
    fn institution_filter() {
        let mut other = row("1", "A", "PI", "R");
        other.institution = "BKL01".into();
        let options = AggregatorOptions {
            institution: Some("QNS01".into()),
            ..Default::default()
        };
        let result = EnrollmentAggregator::new(&NoGenEd, options)
            .aggregate(&[other, row("2", "A", "PI", "R")])
            .unwrap();
        assert_eq!(result.skipped_institution, 1);
        assert_eq!(result.classes.len(), 1);
    }

    #[test]
    fn as_of_date_skips_other_institutions() {
        let mut other = row("1", "A", "PI", "R");
        other.institution = "BKL01".into();
        other.sysdate = "1/2/20".into();
        let mut undated = row("2", "A", "PI", "R");
        undated.sysdate = "".into();
        let mut kept = row("3", "A", "PI", "R");
        kept.sysdate = "9/5/20".into();
        let rows = [other, undated, kept];

        let options = AggregatorOptions {
            institution: Some("QNS01".into()),
            ..Default::default()
        };
        assert_eq!(as_of_date(&rows, &options), NaiveDate::from_ymd_opt(2020, 9, 5));
        assert_eq!(
            as_of_date(&rows, &AggregatorOptions::default()),
            NaiveDate::from_ymd_opt(2020, 1, 2)
        );
        assert_eq!(as_of_date(&rows[..2], &options), None);
    }

    #[test]
    fn gened_lookup_fills_records_and_rollup() {
        let table = GenEdTable::from_listing("ENGL 110 RECR QNSLIT\n");
        let mut math = row("3", "B", "PI", "R");
        math.subject = "MATH".into();
        math.catalog_number = "9500".into();
        let result = EnrollmentAggregator::new(&table, AggregatorOptions::default())
            .aggregate(&[row("1", "A", "PI", "R"), math])
            .unwrap();

        let sorted = result.sorted_classes();
        assert_eq!(sorted[0].gened.requirement, "EC");
        assert!(sorted[1].gened.is_empty());

        let offered = offered_by_requirement(&result.courses("2020.90"));
        assert!(offered["EC"].contains("ENGL 110"));
        assert!(offered["QNSLIT"].contains("ENGL 110"));
        assert_eq!(offered.len(), 2);
    }

    #[test]
    fn output_is_in_course_order() {
        let mut rows = Vec::new();
        for (subject, catalog, class) in [
            ("MATH", "101", "5"),
            ("ENGL", "9500", "4"),
            ("ENGL", "1.5", "3"),
            ("ENGL", "101", "20"),
            ("ENGL", "101", "10"),
        ] {
            let mut r = row(class, "A", "PI", "R");
            r.subject = subject.into();
            r.catalog_number = catalog.into();
            rows.push(r);
        }
        let result = aggregate(&rows);
        let order: Vec<&str> = result
            .sorted_classes()
            .iter()
            .map(|c| c.class_number.as_str())
            .collect();
        assert_eq!(order, vec!["3", "10", "20", "4", "5"]);
    }

    #[test]
    fn parallel_matches_sequential_for_any_chunking() {
        let mut rows = Vec::new();
        for i in 0..40 {
            let class = format!("{}", 100 + i % 7);
            let mut r = row(&class, &format!("Teacher {}", i % 3), "PI", &format!("R{}", i % 2));
            if i % 11 == 5 {
                r.enrollment = "17".into();
            }
            if i % 13 == 4 {
                r.title = "Writing".into();
            }
            rows.push(r);
        }
        let sequential = aggregate(&rows);
        assert!(!sequential.warnings.is_empty());

        for chunk_size in [1, 3, 8, 40, 100] {
            let parallel = EnrollmentAggregator::new(&NoGenEd, AggregatorOptions::default())
                .aggregate_parallel(&rows, chunk_size)
                .unwrap();
            assert_eq!(parallel.warnings, sequential.warnings, "chunk {}", chunk_size);
            assert_eq!(parallel.status_counts, sequential.status_counts);
            assert_eq!(parallel.rows_read, sequential.rows_read);
            assert_eq!(
                serde_json::to_value(&parallel.classes).unwrap(),
                serde_json::to_value(&sequential.classes).unwrap()
            );
        }
    }

    #[test]
    fn parallel_reports_first_invalid_row() {
        let mut rows: Vec<RawEnrollmentRow> = (0..10)
            .map(|i| row(&i.to_string(), "A", "PI", "R"))
            .collect();
        rows[3].session = "XYZ".into();
        rows[8].term = "9999".into();
        let err = EnrollmentAggregator::new(&NoGenEd, AggregatorOptions::default())
            .aggregate_parallel(&rows, 2)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTermCodeAt { row: 4, .. }));
    }
}
