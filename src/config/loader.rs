use crate::batch::{BatchSettings, Batcher};
use crate::config::schema::{default_user_agent, BatchConfig, OutputConfig};
use crate::error::{Error, Result};
use crate::output::{console::ConsoleReport, csv::CsvReport, json::JsonReport, ReportHandler};
use crate::request::RequestSpec;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<BatchConfig> {
        let path = path.as_ref();
        let mut visited = HashSet::new();
        Self::load_with_inheritance(path, &mut visited, false)
    }

    fn load_with_inheritance(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        is_parent_load: bool,
    ) -> Result<BatchConfig> {
        let path = fs::canonicalize(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if !visited.insert(path.clone()) {
            return Err(Error::Config(format!(
                "Circular inheritance detected involving {}",
                path.display()
            )));
        }

        let config = Self::load_file(&path)?;

        let final_config = if let Some(parent_path_str) = &config.extends {
            let parent_path = path
                .parent()
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Cannot determine parent directory for {}",
                        path.display()
                    ))
                })?
                .join(parent_path_str);

            let parent_config = Self::load_with_inheritance(&parent_path, visited, true)?;
            Self::merge_configs(parent_config, config)
        } else {
            config
        };

        if !is_parent_load {
            final_config.validate()?;
            for (index, spec) in Self::request_specs(&final_config).iter().enumerate() {
                spec.validate(index)?;
            }
        }

        Ok(final_config)
    }

    fn load_file(path: &Path) -> Result<BatchConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }

    fn merge_configs(mut parent: BatchConfig, child: BatchConfig) -> BatchConfig {
        if !child.name.is_empty() {
            parent.name = child.name;
        }
        if !child.requests.is_empty() {
            parent.requests = child.requests;
        }
        if child.concurrency.is_some() {
            parent.concurrency = child.concurrency;
        }
        if child.timeout_ms.is_some() {
            parent.timeout_ms = child.timeout_ms;
        }
        if child.user_agent != default_user_agent() {
            parent.user_agent = child.user_agent;
        }
        if child.output.is_some() {
            parent.output = child.output;
        }

        for (name, value) in child.default_headers {
            parent
                .default_headers
                .retain(|k, _| !k.eq_ignore_ascii_case(&name));
            parent.default_headers.insert(name, value);
        }

        parent.extends = None;
        parent
    }

    /// The config's requests with `default_headers` applied. Header names
    /// compare case-insensitively, and a request's own header wins.
    pub fn request_specs(config: &BatchConfig) -> Vec<RequestSpec> {
        config
            .requests
            .iter()
            .cloned()
            .map(|mut spec| {
                for (name, value) in &config.default_headers {
                    let overridden = spec
                        .options
                        .headers
                        .keys()
                        .any(|k| k.eq_ignore_ascii_case(name));
                    if !overridden {
                        spec.options.headers.insert(name.clone(), value.clone());
                    }
                }
                spec
            })
            .collect()
    }

    pub fn create_batcher(config: &BatchConfig) -> Result<Batcher> {
        let defaults = BatchSettings::default();
        Batcher::new(BatchSettings {
            concurrency: config.concurrency,
            timeout: config
                .timeout_ms
                .map(Duration::from_millis)
                .or(defaults.timeout),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn create_report(
        config: &BatchConfig,
        multi: Option<Arc<indicatif::MultiProgress>>,
    ) -> Result<Box<dyn ReportHandler>> {
        let handler: Box<dyn ReportHandler> = match &config.output {
            Some(OutputConfig::Json { path }) => Box::new(JsonReport::new(PathBuf::from(path))?),
            Some(OutputConfig::Csv { path }) => Box::new(CsvReport::new(PathBuf::from(path))?),
            Some(OutputConfig::Console) | None => Box::new(ConsoleReport::new(multi)),
        };
        Ok(handler)
    }
}
