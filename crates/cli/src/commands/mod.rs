//! Command handlers for the MedAssist CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod advise;
pub mod chat;
pub mod evidence;
pub mod pharmacies;
mod render;

// Re-export command types for convenience
pub use advise::AdviseCommand;
pub use chat::ChatCommand;
pub use evidence::EvidenceCommand;
pub use pharmacies::PharmaciesCommand;
