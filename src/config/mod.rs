//! Configuration module for chronicle
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Settings persistence
//! - Logging preferences

pub mod paths;
pub mod settings;

pub use paths::ChroniclePaths;
pub use settings::{LogSettings, Settings};
