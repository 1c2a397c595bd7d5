//! Parse options.
//!
//! Options can be built in code or loaded from YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! sections: lenient
//! divider_min_dashes: 3
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How to treat an alert that lacks one of its two section headings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPolicy {
    /// A missing heading fails the parse.
    #[default]
    Strict,
    /// A missing heading yields no records for that section.
    Lenient,
}

/// Settings for [`parse_alert_with_options`](crate::parse_alert_with_options).
///
/// # Examples
///
/// ```
/// # use fusion_alert_extract::{ParseOptions, SectionPolicy};
/// let options: ParseOptions = serde_yaml::from_str("sections: lenient").unwrap();
/// assert_eq!(options.sections, SectionPolicy::Lenient);
/// assert_eq!(options.divider_min_dashes, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub sections: SectionPolicy,
    /// Shortest run of `-` that ends a thread record.
    pub divider_min_dashes: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            sections: SectionPolicy::Strict,
            divider_min_dashes: 3,
        }
    }

    /// Tolerates alerts that were cut short or forwarded without one section.
    pub fn lenient() -> Self {
        Self {
            sections: SectionPolicy::Lenient,
            ..Self::strict()
        }
    }

    pub fn is_lenient(&self) -> bool {
        self.sections == SectionPolicy::Lenient
    }

    /// Loads options from a YAML file. Absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let options = serde_yaml::from_reader(reader)?;
        Ok(options)
    }

    /// Saves the options as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written, or
    /// [`ConfigError::Yaml`] if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
