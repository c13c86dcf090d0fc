// src/config.rs
//
// Run configuration: defaults, then an optional YAML file named by
// `ENROLLMENTS_CONFIG`, then individual environment overrides.

use serde::Deserialize;
use std::{env, fs, path::PathBuf};

use crate::aggregate::{AggregatorOptions, MESSAGE_COMPONENT};
use crate::error::{Error, Result};

pub const CONFIG_ENV: &str = "ENROLLMENTS_CONFIG";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Searched in order for the newest extract.
    pub search_dirs: Vec<PathBuf>,
    pub input_pattern: String,
    /// Explicit extract; skips the directory search.
    pub input: Option<PathBuf>,
    pub gened_path: Option<PathBuf>,
    pub session_pattern: String,
    pub output_dir: PathBuf,
    pub institution: Option<String>,
    pub parallel: bool,
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("downloads")],
            input_pattern: "QCCV_SR_CLASS_ENRL_LOC_TIME_RD*.csv".into(),
            input: None,
            gened_path: Some(PathBuf::from("gened.csv")),
            session_pattern: "QNS_CV_SESSION_TABLE*".into(),
            output_dir: PathBuf::from("new_files"),
            institution: Some("QNS01".into()),
            parallel: false,
            chunk_size: 10_000,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Defaults, file, environment.
    pub fn load() -> Result<Self> {
        let mut config = match env::var_os(CONFIG_ENV) {
            Some(path) => {
                let text = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("reading {}: {}", PathBuf::from(&path).display(), e))
                })?;
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `ENROLLMENTS_*` overrides from `get`.
    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("ENROLLMENTS_INPUT") {
            self.input = Some(PathBuf::from(v));
        }
        if let Some(v) = get("ENROLLMENTS_GENED") {
            self.gened_path = (!v.is_empty()).then(|| PathBuf::from(v));
        }
        if let Some(v) = get("ENROLLMENTS_INSTITUTION") {
            self.institution = (!v.is_empty() && v != "*").then_some(v);
        }
        if let Some(v) = get("ENROLLMENTS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ENROLLMENTS_PARALLEL") {
            self.parallel = match v.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(Error::Config(format!(
                        "ENROLLMENTS_PARALLEL must be a boolean, got `{}`",
                        other
                    )))
                }
            };
        }
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".into()));
        }
        Ok(())
    }

    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            institution: self.institution.clone(),
            message_component: MESSAGE_COMPONENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn yaml_overrides_defaults() {
        let config = Config::from_yaml(
            "search_dirs: [new_files, archive]\ninput_pattern: '*enrollments.csv'\nparallel: true\n",
        )
        .unwrap();
        assert_eq!(
            config.search_dirs,
            vec![PathBuf::from("new_files"), PathBuf::from("archive")]
        );
        assert!(config.parallel);
        assert_eq!(config.institution.as_deref(), Some("QNS01"));
        assert_eq!(config.chunk_size, 10_000);
    }

    #[test]
    fn bad_yaml_is_a_config_error() {
        assert!(matches!(
            Config::from_yaml("parallel: [1, 2]"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn environment_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ENROLLMENTS_INPUT", "x.csv"),
            ("ENROLLMENTS_GENED", ""),
            ("ENROLLMENTS_INSTITUTION", "*"),
            ("ENROLLMENTS_PARALLEL", "yes"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.input, Some(PathBuf::from("x.csv")));
        assert_eq!(config.gened_path, None);
        assert_eq!(config.institution, None);
        assert!(config.parallel);
        assert!(config.aggregator_options().institution.is_none());

        let err = Config::default()
            .apply_env(|k| (k == "ENROLLMENTS_PARALLEL").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
