use crate::config::{ServiceConfig, ToolsConfig};

pub struct PipelineConfig {
    pub tools: ToolsConfig,
    pub assembly_queue_capacity: usize,
}

impl PipelineConfig {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            tools: config.tools.clone(),
            assembly_queue_capacity: config.assembly_queue_capacity,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}
