use std::collections::BTreeMap;

use chrono::Local;

use crate::config::ServiceConfig;
use crate::worker::job::{default_job_name, Job};

/// Parameters of a scan request as received by the boundary layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRequest {
    pub name: Option<String>,
    /// Every other parameter, passed to the settings override parser.
    pub overrides: Vec<(String, String)>,
}

impl JobRequest {
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = Self::default();
        for (key, value) in values {
            let key = key.into();
            let value = value.into();
            if key == "name" {
                request.name = Some(value);
            } else {
                request.overrides.push((key, value));
            }
        }
        request
    }

    /// Parses a flat JSON object. Non-string values are taken by their JSON
    /// text, so `{"resolution": 150}` and `{"resolution": "150"}` agree.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let values: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;
        Ok(Self::from_values(values.into_iter().map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })))
    }

    /// Job base name: today's date, then the requested name or "Document".
    pub fn job_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", Local::now().format("%Y-%m-%d"), name),
            None => default_job_name(),
        }
    }

    /// Builds the job: configured default settings plus request overrides,
    /// named collision-free in the configured output directory.
    pub fn into_job(self, config: &ServiceConfig) -> Job {
        let name = self.job_name();
        let settings = config.defaults.clone().with_overrides(self.overrides);
        Job::new(&config.output_directory, &name, settings)
    }
}
