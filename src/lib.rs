pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;

pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder, RunSummary};
pub use error::{AppError, ConfigError, FetchError, OutputError, PoseError, SampleError};
