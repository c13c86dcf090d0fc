// src/files.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use glob::glob;
use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::debug;

/// Most recently modified file matching `pattern` in the first directory
/// that has any match. Later directories are only searched as a fallback.
pub fn latest_file<P: AsRef<Path>>(dirs: &[P], pattern: &str) -> Result<Option<PathBuf>> {
    for dir in dirs {
        let full = format!("{}/{}", dir.as_ref().display(), pattern);
        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in glob(&full).with_context(|| format!("bad glob pattern '{}'", full))? {
            let path = match entry {
                Ok(p) if p.is_file() => p,
                _ => continue,
            };
            let mtime = path
                .metadata()
                .and_then(|m| m.modified())
                .with_context(|| format!("reading mtime of {}", path.display()))?;
            if best.as_ref().map_or(true, |(t, _)| mtime > *t) {
                best = Some((mtime, path));
            }
        }
        if let Some((_, path)) = best {
            debug!(path = %path.display(), "latest match");
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Local date of the file's last modification ("data as of").
pub fn modified_date(path: &Path) -> Result<NaiveDate> {
    let mtime = path
        .metadata()
        .and_then(|m| m.modified())
        .with_context(|| format!("reading mtime of {}", path.display()))?;
    Ok(DateTime::<Local>::from(mtime).date_naive())
}

/// `2020-09-05_enrollments.json` style output name.
pub fn dated_name(date: NaiveDate, stem: &str, ext: &str) -> String {
    format!("{}_{}.{}", date.format("%Y-%m-%d"), stem, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, time::Duration};
    use tempfile::tempdir;

    #[test]
    fn picks_newest_in_first_matching_dir() -> Result<()> {
        let new_files = tempdir()?;
        let archive = tempdir()?;
        fs::write(archive.path().join("2020-01-01_enrollments.csv"), "x")?;

        assert_eq!(
            latest_file(&[new_files.path(), archive.path()], "*enrollments.csv")?,
            Some(archive.path().join("2020-01-01_enrollments.csv"))
        );

        let older = new_files.path().join("a_enrollments.csv");
        fs::write(&older, "x")?;
        fs::File::options()
            .write(true)
            .open(&older)?
            .set_modified(SystemTime::now() - Duration::from_secs(3600))?;
        fs::write(new_files.path().join("b_enrollments.csv"), "x")?;
        fs::write(new_files.path().join("c_other.csv"), "x")?;

        assert_eq!(
            latest_file(&[new_files.path(), archive.path()], "*enrollments.csv")?,
            Some(new_files.path().join("b_enrollments.csv"))
        );
        Ok(())
    }

    #[test]
    fn nothing_found() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(latest_file(&[dir.path()], "*.csv")?, None);
        Ok(())
    }

    #[test]
    fn dated_output_name() {
        let d = NaiveDate::from_ymd_opt(2020, 9, 5).unwrap();
        assert_eq!(dated_name(d, "enrollments", "json"), "2020-09-05_enrollments.json");
    }
}
