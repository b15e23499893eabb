pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod paralon;
pub mod processor;
#[cfg(feature = "server")]
pub mod server;
pub mod store;

pub use config::{Config, ParalonConfig, StorageConfig};
pub use error::{ParalonError, Result};
pub use models::*;
pub use paralon::{FallbackClient, ImageClient, ParalonClient};
pub use processor::ImageProcessor;
pub use store::ImageStore;
