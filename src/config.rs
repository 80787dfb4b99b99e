use crate::fields::FieldVariants;
use crate::report::FieldCatalog;
use crate::topics::{StatusVocabulary, TopicStatus};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "REPORTD_CONFIG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    fields: BTreeMap<String, Vec<String>>,
    topic_fields: Option<Vec<String>>,
    status_vocabulary: VocabularyFile,
    in_progress_substrings: Vec<String>,
    log_filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VocabularyFile {
    completed: Vec<String>,
    in_progress: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub path: Option<PathBuf>,
    pub catalog: FieldCatalog,
    pub vocab: StatusVocabulary,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            catalog: FieldCatalog::default(),
            vocab: StatusVocabulary::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// `--config <path>` wins over the environment variable.
pub fn config_path_from_args<I>(args: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        if a == "--config" {
            return it.next().map(PathBuf::from);
        }
        if let Some(rest) = a.strip_prefix("--config=") {
            return Some(PathBuf::from(rest));
        }
    }
    std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        let mut cfg = Self::from_json(&text)
            .with_context(|| format!("invalid config {}", path.to_string_lossy()))?;
        cfg.path = Some(path.to_path_buf());
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_json::from_str(text).context("failed to parse config json")?;
        let mut cfg = Self::default();

        for (name, variants) in file.fields {
            let v = FieldVariants::new(variants)
                .ok_or_else(|| anyhow!("field {name} has no variants"))?;
            cfg.catalog.upsert(&name, v);
        }
        if let Some(topic_fields) = file.topic_fields {
            cfg.catalog
                .set_topic_fields(topic_fields)
                .map_err(|e| anyhow!(e))?;
        }
        for w in &file.status_vocabulary.completed {
            cfg.vocab.insert(w, TopicStatus::Completed);
        }
        for w in &file.status_vocabulary.in_progress {
            cfg.vocab.insert(w, TopicStatus::InProgress);
        }
        for s in &file.in_progress_substrings {
            cfg.vocab.add_in_progress_substring(s);
        }
        if let Some(f) = file.log_filter.filter(|f| !f.trim().is_empty()) {
            cfg.log_filter = f;
        }
        Ok(cfg)
    }
}
