//! Named service registry - ordered lifecycle for telemetry subsystems
//!
//! A [`Service`] is a long-lived subsystem with start/stop hooks (an
//! exporter flusher, a metrics aggregator, a session tracker). The
//! [`ServiceRegistry`] owns every registered service and drives startup and
//! shutdown in registration order, once each, from a single orchestration
//! thread.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{Result, TelegraftError};

/// A service's start hook failed.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct StartError(#[from] anyhow::Error);

/// A service's stop hook failed.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct StopError(#[from] anyhow::Error);

/// A named, long-lived telemetry subsystem.
///
/// States are linear: constructed, started, stopped. Hooks are invoked at
/// most once each by the registry; re-entrant use is not part of the
/// contract.
pub trait Service: Send {
    /// Unique name, the registry's lookup key.
    fn name(&self) -> &str;

    fn start(&mut self) -> std::result::Result<(), StartError>;

    fn stop(&mut self) -> std::result::Result<(), StopError>;
}

/// Insertion-ordered store of named services.
///
/// The registry owns each service's lifecycle hooks, not its internal
/// resources. Contents must not change after `start` has been called; that
/// is a precondition on the embedding application, not a runtime check.
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<Box<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a service, preserving insertion order for start/stop.
    ///
    /// Fails with [`TelegraftError::DuplicateService`] if the name is taken;
    /// the registry keeps only the first registration.
    pub fn register(&mut self, service: Box<dyn Service>) -> Result<()> {
        let name = service.name();
        if self.services.iter().any(|existing| existing.name() == name) {
            return Err(TelegraftError::DuplicateService(name.to_string()));
        }
        debug!(service = name, "Registered service");
        self.services.push(service);
        Ok(())
    }

    /// Start every service in registration order.
    ///
    /// The first failure propagates to the caller; services started before
    /// it are left running (no rollback).
    pub fn start(&mut self) -> Result<()> {
        for service in &mut self.services {
            info!(service = service.name(), "Starting service");
            service
                .start()
                .map_err(|source| TelegraftError::ServiceStart {
                    name: service.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Stop every service in registration order, best-effort.
    ///
    /// A failing stop hook is logged and shutdown continues with the
    /// remaining services. Returns how many services failed to stop.
    pub fn stop(&mut self) -> usize {
        let mut failed = 0;
        for service in &mut self.services {
            info!(service = service.name(), "Stopping service");
            if let Err(error) = service.stop() {
                warn!(
                    service = service.name(),
                    %error,
                    "Service failed to stop; continuing shutdown"
                );
                failed += 1;
            }
        }
        failed
    }

    /// Fetch a registered service by name.
    pub fn lookup(&self, name: &str) -> Result<&dyn Service> {
        self.services
            .iter()
            .find(|service| service.name() == name)
            .map(|service| service.as_ref())
            .ok_or_else(|| TelegraftError::ServiceNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
