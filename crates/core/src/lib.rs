//! MedAssist Core Library
//!
//! This crate provides the foundational utilities for the MedAssist CLI:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (LLM, retrieval, pharmacy search)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{
    AppConfig, GenerationSettings, PharmacySettings, ProviderConfig, RetrievalSettings,
    SearchSettings,
};
pub use error::{AppError, AppResult};
pub use logging::LogFormat;
