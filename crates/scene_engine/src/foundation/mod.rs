//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and interpolation helpers
//! - Keyed arenas with generation-checked handles
//! - Frame timing and throttling
//! - Logging initialisation

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
