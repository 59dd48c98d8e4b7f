//! # Core Engine Module
//!
//! Shared configuration for every subsystem of the scene engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for simulation, dispatch, surface,
//!   rendering and logging

pub mod config;

// Re-export commonly used config types
pub use config::{
    EngineConfig,
    SimulationConfig,
    DispatchConfig,
    SurfaceConfig,
    RenderConfig,
    LoggingConfig,
    Config,
    ConfigError,
    ConfigFormat,
};
