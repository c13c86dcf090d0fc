use anyhow::{Context, Result};
use chrono::NaiveDate;
use enrollments::{
    aggregate::{as_of_date, format_percent, offered_by_requirement, CourseAggregate},
    files::{dated_name, latest_file, modified_date},
    gened::{requirement_name, GenEdTable, NoGenEd, PATHWAYS_REQUIREMENTS, PLAS_REQUIREMENTS},
    ingest::read_extract_path,
    Aggregation, ClassRecord, Config, EnrollmentAggregator, GenEdLookup, TermCode,
};
use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::PathBuf,
    time::Instant,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Serialize)]
struct TermSummary<'a> {
    term: &'a TermCode,
    classes: Vec<ClassSummary<'a>>,
    courses: BTreeMap<String, CourseSummary>,
    offered: Vec<Offered>,
}

#[derive(Serialize)]
struct ClassSummary<'a> {
    #[serde(flatten)]
    class: &'a ClassRecord,
    percent_filled: String,
}

#[derive(Serialize)]
struct CourseSummary {
    #[serde(flatten)]
    course: CourseAggregate,
    percent_filled: String,
}

#[derive(Serialize)]
struct Offered {
    code: String,
    name: Option<&'static str>,
    courses: BTreeSet<String>,
}

/// Pathways, then PLAS, then anything unlisted.
fn in_report_order(mut offered: BTreeMap<String, BTreeSet<String>>) -> Vec<Offered> {
    let mut out = Vec::new();
    for code in PATHWAYS_REQUIREMENTS.iter().chain(PLAS_REQUIREMENTS) {
        if let Some(courses) = offered.remove(*code) {
            out.push(Offered {
                code: code.to_string(),
                name: requirement_name(code),
                courses,
            });
        }
    }
    out.extend(offered.into_iter().map(|(code, courses)| Offered {
        name: requirement_name(&code),
        code,
        courses,
    }));
    out
}

#[derive(Serialize)]
struct Summary<'a> {
    source: String,
    as_of: NaiveDate,
    status_counts: &'a BTreeMap<String, usize>,
    warnings: Vec<String>,
    terms: Vec<TermSummary<'a>>,
}

fn summarize<'a>(result: &'a Aggregation, terms: &'a BTreeSet<TermCode>) -> Vec<TermSummary<'a>> {
    let sorted = result.sorted_classes();
    terms
        .iter()
        .map(|term| {
            let courses = result.courses(&term.code);
            let offered = offered_by_requirement(&courses);
            TermSummary {
                term,
                classes: sorted
                    .iter()
                    .filter(|c| c.term.code == term.code)
                    .map(|&class| ClassSummary {
                        class,
                        percent_filled: format_percent(class.percent_filled()),
                    })
                    .collect(),
                courses: courses
                    .into_iter()
                    .map(|(name, course)| {
                        let percent_filled = format_percent(course.percent_filled());
                        (name, CourseSummary { course, percent_filled })
                    })
                    .collect(),
                offered: in_report_order(offered),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");
    let start = Instant::now();

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::load().context("loading configuration")?;
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    // ─── 3) locate the extract ───────────────────────────────────────
    let input: PathBuf = match &config.input {
        Some(path) => path.clone(),
        None => latest_file(config.search_dirs.as_slice(), &config.input_pattern)?
            .with_context(|| {
                format!(
                    "no file matching '{}' in {:?}",
                    config.input_pattern, config.search_dirs
                )
            })?,
    };
    info!(input = %input.display(), "using extract");

    // ─── 4) gen-ed reference ─────────────────────────────────────────
    let table = match &config.gened_path {
        Some(path) if path.exists() => Some(GenEdTable::load(path)?),
        Some(path) => {
            warn!(path = %path.display(), "gen-ed reference missing; no classifications");
            None
        }
        None => None,
    };
    let gened: &dyn GenEdLookup = match &table {
        Some(t) => t,
        None => &NoGenEd,
    };

    // ─── 5) read + aggregate ─────────────────────────────────────────
    let extract = read_extract_path(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let options = config.aggregator_options();
    let aggregator = EnrollmentAggregator::new(gened, options.clone());
    let result = if config.parallel {
        aggregator.aggregate_parallel(&extract.rows, config.chunk_size)
    } else {
        aggregator.aggregate(&extract.rows)
    }
    .with_context(|| format!("aggregating {}", input.display()))?;

    // ─── 6) write summary ────────────────────────────────────────────
    let as_of = match as_of_date(&extract.rows, &options) {
        Some(d) => d,
        None => modified_date(&input)?,
    };
    let terms = result.terms();
    let summary = Summary {
        source: input.display().to_string(),
        as_of,
        status_counts: &result.status_counts,
        warnings: result.warnings.iter().map(ToString::to_string).collect(),
        terms: summarize(&result, &terms),
    };
    let out_path = config
        .output_dir
        .join(dated_name(as_of, "enrollments", "json"));
    let file = fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    serde_json::to_writer_pretty(file, &summary)
        .with_context(|| format!("writing {}", out_path.display()))?;

    info!(
        output = %out_path.display(),
        terms = terms.len(),
        classes = result.classes.len(),
        elapsed = ?start.elapsed(),
        "all done"
    );
    Ok(())
}
