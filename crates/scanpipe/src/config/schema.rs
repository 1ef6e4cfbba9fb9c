use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root under which staging directories and finished PDFs are created.
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,
    #[serde(default = "default_assembly_queue_capacity")]
    pub assembly_queue_capacity: usize,
    /// Capacity of each requester's outgoing status channel.
    #[serde(default = "default_requester_buffer")]
    pub requester_buffer: usize,
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Settings every job starts from before request overrides.
    #[serde(default)]
    pub defaults: Settings,
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("scans")
}

fn default_assembly_queue_capacity() -> usize {
    100
}

fn default_requester_buffer() -> usize {
    256
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            assembly_queue_capacity: default_assembly_queue_capacity(),
            requester_buffer: default_requester_buffer(),
            tools: ToolsConfig::default(),
            defaults: Settings::default(),
        }
    }
}

/// Program names (or paths) of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_scanner")]
    pub scanner: String,
    #[serde(default = "default_cleaner")]
    pub cleaner: String,
    #[serde(default = "default_assembler")]
    pub assembler: String,
    #[serde(default = "default_ocr")]
    pub ocr: String,
}

fn default_scanner() -> String {
    "scanimage".to_string()
}

fn default_cleaner() -> String {
    "noteshrink".to_string()
}

fn default_assembler() -> String {
    "img2pdf".to_string()
}

fn default_ocr() -> String {
    "ocrmypdf".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            scanner: default_scanner(),
            cleaner: default_cleaner(),
            assembler: default_assembler(),
            ocr: default_ocr(),
        }
    }
}
