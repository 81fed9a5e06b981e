use std::path::Path;

use serde::{Deserialize, Serialize};

/// How [`find_by_name`](crate::FamilyTree::find_by_name) compares names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    /// The whole name must match the query.
    #[default]
    Exact,
    /// The name must contain the query.
    Substring,
}

/// Where records with no usable date sort relative to records with one.
///
/// Applies to both the birth-date sort and the age sort: a record with no
/// birth date has no sortable date and no computable age.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownDatePolicy {
    /// Unknown dates sort after every known date.
    #[default]
    Last,
    /// Unknown dates sort before every known date.
    First,
}

/// Policy configuration for a family tree store.
///
/// This struct holds the settings that control how records are searched and
/// sorted: the name-matching rule, its case sensitivity, and the placement
/// of records with unknown dates. The defaults are a case-insensitive exact
/// name match with unknown dates sorting last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The name-matching rule used by searches.
    name_match: NameMatch,

    /// Whether name matching ignores letter case.
    ignore_case: bool,

    /// Placement of records with no usable date in date and age sorts.
    unknown_dates: UnknownDatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name_match: NameMatch::default(),
            ignore_case: true,
            unknown_dates: UnknownDatePolicy::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or
    /// if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the configured name-matching rule.
    #[must_use]
    pub const fn name_match(&self) -> NameMatch {
        self.name_match
    }

    /// Returns whether name matching ignores letter case.
    #[must_use]
    pub const fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Returns the placement of records with unknown dates.
    #[must_use]
    pub const fn unknown_dates(&self) -> UnknownDatePolicy {
        self.unknown_dates
    }

    /// Sets the name-matching rule.
    pub const fn set_name_match(&mut self, value: NameMatch) {
        self.name_match = value;
    }

    /// Sets whether name matching ignores letter case.
    pub const fn set_ignore_case(&mut self, value: bool) {
        self.ignore_case = value;
    }

    /// Sets the placement of records with unknown dates.
    pub const fn set_unknown_dates(&mut self, value: UnknownDatePolicy) {
        self.unknown_dates = value;
    }

    /// Checks whether `name` matches `query` under this configuration.
    #[must_use]
    pub fn name_matches(&self, name: &str, query: &str) -> bool {
        if self.ignore_case {
            compare(&name.to_lowercase(), &query.to_lowercase(), self.name_match)
        } else {
            compare(name, query, self.name_match)
        }
    }
}

fn compare(name: &str, query: &str, policy: NameMatch) -> bool {
    match policy {
        NameMatch::Exact => name == query,
        NameMatch::Substring => name.contains(query),
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the
/// domain type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        name_match: NameMatch,

        #[serde(default = "default_ignore_case")]
        ignore_case: bool,

        #[serde(default)]
        unknown_dates: UnknownDatePolicy,
    },
}

const fn default_ignore_case() -> bool {
    true
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                name_match,
                ignore_case,
                unknown_dates,
            } => Self {
                name_match,
                ignore_case,
                unknown_dates,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            name_match: config.name_match,
            ignore_case: config.ignore_case,
            unknown_dates: config.unknown_dates,
        }
    }
}
