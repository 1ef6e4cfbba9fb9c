pub mod assembly;
pub mod config;
pub mod error;
pub mod progress;
pub mod scan;

pub use assembly::AssemblyStage;
pub use config::PipelineConfig;
pub use error::StageError;
pub use progress::StatusReporter;
pub use scan::ScanStage;
