use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dates::{DisplayFormat, DEFAULT_DISPLAY_FORMAT};
use crate::picker::{DatePredicate, PickerOptions};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Dates in the config file are always ISO, whatever the display format.
    #[error("invalid date {value:?} for `{key}` (expected YYYY-MM-DD)")]
    BadDate { key: &'static str, value: String },
}

fn default_theme()  -> String { "catppuccin-mocha".to_owned() }
fn default_format() -> String { DEFAULT_DISPLAY_FORMAT.to_owned() }

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub display_format: String,
    pub placeholder:    Option<String>,
    pub theme:          String,
    pub disabled:       DisabledDates,
    pub fields:         Vec<FieldConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_format: default_format(),
            placeholder:    None,
            theme:          default_theme(),
            disabled:       DisabledDates::default(),
            fields: vec![
                FieldConfig { label: "Start date".into(), value: String::new(), disabled: false },
                FieldConfig { label: "End date".into(),   value: String::new(), disabled: false },
            ],
        }
    }
}

/// Which calendar days cannot be picked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DisabledDates {
    pub weekends: bool,
    pub before:   Option<String>,
    pub after:    Option<String>,
    pub dates:    Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub label:    String,
    #[serde(default)]
    pub value:    String,
    #[serde(default)]
    pub disabled: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_dir().join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        let cfg: AppConfig = toml::from_str(&text)?;
        tracing::info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn display_format(&self) -> DisplayFormat {
        let format = DisplayFormat::new(&self.display_format);
        if !format.is_valid() {
            tracing::warn!("display_format {:?} is not understood; dates will render empty", self.display_format);
        }
        format
    }

    /// Configured placeholder, or the display pattern itself.
    pub fn placeholder(&self) -> String {
        self.placeholder.clone().unwrap_or_else(|| self.display_format.clone())
    }

    pub fn picker_options(&self, field: &FieldConfig) -> Result<PickerOptions, ConfigError> {
        Ok(PickerOptions {
            disabled:         field.disabled,
            placeholder:      self.placeholder(),
            display_format:   self.display_format(),
            is_date_disabled: self.disabled.predicate()?,
        })
    }
}

impl DisabledDates {
    /// `None` when nothing is disabled.
    pub fn predicate(&self) -> Result<Option<DatePredicate>, ConfigError> {
        let before   = self.before.as_deref().map(|v| iso_date("before", v)).transpose()?;
        let after    = self.after.as_deref().map(|v| iso_date("after", v)).transpose()?;
        let dates    = self.dates.iter()
            .map(|v| iso_date("dates", v))
            .collect::<Result<HashSet<_>, _>>()?;
        let weekends = self.weekends;

        if !weekends && before.is_none() && after.is_none() && dates.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(move |d: NaiveDate| {
            (weekends && matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
                || before.is_some_and(|b| d < b)
                || after.is_some_and(|a| d > a)
                || dates.contains(&d)
        })))
    }
}

fn iso_date(key: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ConfigError::BadDate { key, value: value.to_owned() })
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("datepicker")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.display_format, "yyyy/MM/dd");
        assert_eq!(cfg.theme, "catppuccin-mocha");
        assert_eq!(cfg.fields.len(), 2);
        assert_eq!(cfg.placeholder(), "yyyy/MM/dd");
        assert!(cfg.disabled.predicate().unwrap().is_none());
    }

    #[test]
    fn full_file_parses() {
        let cfg: AppConfig = toml::from_str(r#"
            display_format = "dd.MM.yyyy"
            placeholder    = "tt.mm.jjjj"
            theme          = "paper"

            [disabled]
            weekends = true
            before   = "2024-01-10"
            dates    = ["2024-03-05"]

            [[fields]]
            label    = "Due"
            value    = "05.03.2024"

            [[fields]]
            label    = "Locked"
            disabled = true
        "#).unwrap();

        assert_eq!(cfg.placeholder(), "tt.mm.jjjj");
        assert_eq!(cfg.fields[0].value, "05.03.2024");
        assert!(cfg.fields[1].disabled);

        let opts = cfg.picker_options(&cfg.fields[1]).unwrap();
        assert!(opts.disabled);
        assert_eq!(opts.display_format.strftime(), "%d.%m.%Y");
    }

    #[test]
    fn predicate_combines_rules() {
        let rules = DisabledDates {
            weekends: true,
            before:   Some("2024-05-02".into()),
            after:    Some("2024-05-30".into()),
            dates:    vec!["2024-05-15".into()],
        };
        let p = rules.predicate().unwrap().unwrap();
        assert!(p(ymd(2024, 5, 1)));   // before
        assert!(!p(ymd(2024, 5, 2)));
        assert!(p(ymd(2024, 5, 4)));   // Saturday
        assert!(p(ymd(2024, 5, 15)));  // listed
        assert!(!p(ymd(2024, 5, 30)));
        assert!(p(ymd(2024, 5, 31)));  // after
    }

    #[test]
    fn bad_date_is_reported() {
        let rules = DisabledDates { after: Some("31/12/2024".into()), ..Default::default() };
        match rules.predicate() {
            Err(ConfigError::BadDate { key, value }) => {
                assert_eq!(key, "after");
                assert_eq!(value, "31/12/2024");
            }
            other => panic!("unexpected: {:?}", other.map(|p| p.is_some())),
        }
    }

    #[test]
    fn missing_file_is_default() {
        let cfg = AppConfig::load_from(Path::new("/nonexistent/datepicker/config.toml")).unwrap();
        assert_eq!(cfg.fields.len(), 2);
    }
}
