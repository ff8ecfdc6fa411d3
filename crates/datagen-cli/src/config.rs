//! `datagen.toml` loading and merging with command-line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use datagen_generate::{GenerateOptions, MAX_RECORDS_PER_TABLE, OutputFormat};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "datagen.toml";

/// Records per table when neither a flag nor the config file sets one.
pub const DEFAULT_COUNT: u64 = 10;

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub seed: Option<u64>,
    pub base_date: Option<NaiveDate>,
    pub locale: Option<String>,
    pub max_records_per_table: Option<u64>,
    pub strict_patterns: Option<bool>,
    pub format: Option<OutputFormat>,
    pub out_dir: Option<PathBuf>,
    pub count: Option<u64>,
    pub counts: BTreeMap<String, u64>,
}

impl FileConfig {
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Read `path`, or `datagen.toml` if it exists when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let content = std::fs::read_to_string(&path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config loaded");
        Self::from_toml(&content)
    }
}

/// Flag values that may override the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub base_date: Option<NaiveDate>,
    pub locale: Option<String>,
    pub strict_patterns: bool,
    pub format: Option<OutputFormat>,
    pub out_dir: Option<PathBuf>,
    pub count: Option<u64>,
    pub counts: BTreeMap<String, u64>,
}

/// Settings for one `generate` invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub options: GenerateOptions,
    pub format: OutputFormat,
    pub out_dir: PathBuf,
    pub default_count: u64,
    pub counts: BTreeMap<String, u64>,
}

impl RunConfig {
    pub fn resolve(file: FileConfig, flags: Overrides) -> Self {
        let defaults = GenerateOptions::default();
        let options = GenerateOptions {
            seed: flags.seed.or(file.seed),
            base_date: flags.base_date.or(file.base_date),
            locale: flags.locale.or(file.locale).unwrap_or(defaults.locale),
            max_records_per_table: file
                .max_records_per_table
                .unwrap_or(MAX_RECORDS_PER_TABLE),
            strict_patterns: flags.strict_patterns || file.strict_patterns.unwrap_or(false),
        };

        let mut counts = file.counts;
        counts.extend(flags.counts);

        Self {
            options,
            format: flags.format.or(file.format).unwrap_or_default(),
            out_dir: flags
                .out_dir
                .or(file.out_dir)
                .unwrap_or_else(|| PathBuf::from("out")),
            default_count: flags.count.or(file.count).unwrap_or(DEFAULT_COUNT),
            counts,
        }
    }

    /// Explicit counts plus the default count for every other table in
    /// `tables`.
    pub fn counts_for<'a>(
        &self,
        tables: impl IntoIterator<Item = &'a String>,
    ) -> BTreeMap<String, u64> {
        let mut counts = self.counts.clone();
        for table in tables {
            counts.entry(table.clone()).or_insert(self.default_count);
        }
        counts
    }
}

/// Parse a `table=count` pair from `--counts`.
pub fn parse_count_entry(entry: &str) -> Result<(String, u64), String> {
    let (table, count) = entry
        .split_once('=')
        .ok_or_else(|| format!("expected TABLE=COUNT, got '{entry}'"))?;
    let table = table.trim();
    if table.is_empty() {
        return Err(format!("missing table name in '{entry}'"));
    }
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|err| format!("invalid count in '{entry}': {err}"))?;
    Ok((table.to_string(), count))
}
