use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::grading::{BandScale, GradeBand};

pub const CONFIG_ENV: &str = "SCHOOLBOOKD_CONFIG";
pub const LOG_ENV: &str = "SCHOOLBOOKD_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Validation(String),
}

/// Sidecar settings. Every field is optional in the TOML file.
///
/// ```toml
/// currency = "KES"
/// log_filter = "schoolbookd=debug"
///
/// [[grading_scale]]
/// min_marks = 80
/// grade = "A"
/// points = 12
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Label placed in front of formatted amounts.
    pub currency: String,
    pub log_filter: String,
    /// Replaces the KCSE scale when present.
    pub grading_scale: Option<Vec<GradeBand>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "KES".to_string(),
            log_filter: "info".to_string(),
            grading_scale: None,
        }
    }
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Settings from `$SCHOOLBOOKD_CONFIG`, or defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn grading_scale(&self) -> BandScale {
        match &self.grading_scale {
            Some(bands) => BandScale::new(bands.clone()),
            None => BandScale::kcse(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Validation("currency must not be empty".into()));
        }
        if let Some(bands) = &self.grading_scale {
            if bands.is_empty() {
                return Err(ConfigError::Validation(
                    "grading_scale must list at least one band".into(),
                ));
            }
            if let Some(b) = bands.iter().find(|b| b.points == 0) {
                return Err(ConfigError::Validation(format!(
                    "grading band {} must award at least one point",
                    b.grade
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradingScale;

    #[test]
    fn empty_file_uses_defaults() {
        let s = Settings::from_toml_str("").expect("parse");
        assert_eq!(s, Settings::default());
        assert_eq!(s.grading_scale().bands().len(), 12);
    }

    #[test]
    fn custom_scale_replaces_kcse() {
        let s = Settings::from_toml_str(
            r#"
currency = "UGX"

[[grading_scale]]
min_marks = 50
grade = "Pass"
points = 2

[[grading_scale]]
min_marks = 0
grade = "Fail"
points = 1
"#,
        )
        .expect("parse");
        assert_eq!(s.currency, "UGX");
        let scale = s.grading_scale();
        assert_eq!(scale.grade(49.0).map(|b| b.grade.as_str()), Some("Fail"));
        assert_eq!(scale.grade(75.0).map(|b| b.points), Some(2));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            Settings::from_toml_str("currency = \"  \""),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("grading_scale = []"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            Settings::from_toml_str("currency = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Settings::load(Path::new("/nonexistent/schoolbookd.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/schoolbookd.toml"));
    }
}
