// src/bin/session_dates.rs
//
// Find the newest session table extract and write its dates as JSON.

use anyhow::{Context, Result};
use enrollments::{
    files::{dated_name, latest_file, modified_date},
    sessions::SessionTable,
    Config,
};
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = Config::load().context("loading configuration")?;

    // 1) newest session table
    let path = latest_file(config.search_dirs.as_slice(), &config.session_pattern)?
        .with_context(|| {
            format!(
                "no file matching '{}' in {:?}",
                config.session_pattern, config.search_dirs
            )
        })?;
    info!(path = %path.display(), "using session table");

    // 2) decode
    let table =
        SessionTable::load(&path).with_context(|| format!("reading {}", path.display()))?;
    for (code, dates) in &table.sessions {
        match dates.session_end {
            Some(end) => info!(%code, name = %dates.term.name, %end, "session"),
            None => info!(%code, name = %dates.term.name, "session without end date"),
        }
    }

    // 3) write
    let as_of = match table.sysdate {
        Some(d) => d,
        None => modified_date(&path)?,
    };
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let out_path = config.output_dir.join(dated_name(as_of, "sessions", "json"));
    let file = fs::File::create(&out_path)
        .with_context(|| format!("creating {}", out_path.display()))?;
    serde_json::to_writer_pretty(file, &table)
        .with_context(|| format!("writing {}", out_path.display()))?;
    info!(output = %out_path.display(), sessions = table.sessions.len(), "all done");
    Ok(())
}
