//! Per-job scan settings and request override parsing.

use log::warn;
use serde::{Deserialize, Serialize};

/// Scanner and post-processing options captured into each job at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Scanner source, e.g. the document feeder side.
    pub source: String,
    /// Color mode passed to the scanner.
    pub mode: String,
    pub resolution: i32,
    pub brightness: i32,
    pub contrast: i32,
    /// Run the image cleanup tool over the scanned pages.
    pub clean: bool,
    /// Assemble the pages into an OCR'd PDF.
    #[serde(alias = "pdf", alias = "produce_pdf")]
    pub produce_pdf: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: "ADF Front".to_string(),
            mode: "Gray".to_string(),
            resolution: 300,
            brightness: 0,
            contrast: 0,
            clean: true,
            produce_pdf: true,
        }
    }
}

impl Settings {
    /// Applies request parameters on top of the current values.
    ///
    /// Unknown keys are ignored. A numeric value that does not parse leaves
    /// the current value in place and is logged. `clean` and `pdf` can only be
    /// switched off, by the literal value `false`.
    pub fn apply_overrides<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in values {
            let key = key.as_ref();
            let value = value.as_ref();
            match key {
                "source" => self.source = value.to_string(),
                "mode" => self.mode = value.to_string(),
                "resolution" => parse_number(key, value, &mut self.resolution),
                "brightness" => parse_number(key, value, &mut self.brightness),
                "contrast" => parse_number(key, value, &mut self.contrast),
                "clean" => {
                    if value == "false" {
                        self.clean = false;
                    }
                }
                "pdf" => {
                    if value == "false" {
                        self.produce_pdf = false;
                    }
                }
                _ => {}
            }
        }
    }

    /// Consuming variant of [`Settings::apply_overrides`].
    pub fn with_overrides<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply_overrides(values);
        self
    }
}

fn parse_number(key: &str, value: &str, current: &mut i32) {
    match value.parse::<i32>() {
        Ok(parsed) => *current = parsed,
        Err(e) => warn!("error parsing {}: {} (keeping {})", key, e, current),
    }
}
