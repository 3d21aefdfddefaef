//! Telegraft - build-time auto-instrumentation for HTTP clients
//!
//! The build half (`inject`) rewrites an application's source artifacts so
//! that every HTTP-client-builder construction site registers a telemetry
//! observer. The runtime half (`observer`, `services`, `runtime`) is what the
//! injected call reaches: a composite observer that fans events out to every
//! registered telemetry subsystem, and a registry that starts and stops those
//! subsystems in a deterministic order.

pub mod cli;
pub mod config;
pub mod error;
pub mod inject;
pub mod observer;
pub mod resource;
pub mod runtime;
pub mod services;

pub use error::{Result, TelegraftError};
pub use runtime::instrument_builder;
