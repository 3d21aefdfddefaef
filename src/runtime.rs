//! Runtime composition root
//!
//! The [`Agent`] is the explicit object the embedding application builds at
//! its entry point: it composes the registered observer factories into one,
//! owns the service registry, and drives startup/shutdown. The only
//! process-wide state is the installed composite factory, because the call
//! the injection pass inserts cannot receive parameters; everything else is
//! threaded explicitly.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::observer::fault::LogFaultSink;
use crate::observer::{compose, FaultSink, ObserverFactory};
use crate::resource::{keys, ResourceAttributes};
use crate::services::{Service, ServiceRegistry};
use crate::Result;

static INSTALLED: OnceLock<Arc<dyn ObserverFactory>> = OnceLock::new();

/// Seam between the composed observer factory and the concrete HTTP client
/// library. The client crate (or a thin adapter over it) implements this for
/// its builder type; `attach` registers the factory as the builder's event
/// listener and returns the builder for further chaining.
pub trait InstrumentableBuilder {
    fn attach(self, factory: Arc<dyn ObserverFactory>) -> Self
    where
        Self: Sized;
}

/// Entry point for injected call sites.
///
/// Wraps a client builder: if an agent has been installed, the composite
/// observer factory is attached; otherwise the builder passes through
/// untouched. Instrumentation failing to initialize must never break the
/// host application's client construction.
pub fn instrument_builder<B: InstrumentableBuilder>(builder: B) -> B {
    match INSTALLED.get() {
        Some(factory) => {
            debug!("Attaching telemetry observer factory to client builder");
            builder.attach(Arc::clone(factory))
        }
        None => builder,
    }
}

/// Static description of the instrumented application.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    service_name: String,
    service_version: String,
    deployment_environment: Option<String>,
    extra_attributes: Vec<(String, String)>,
}

impl AgentConfig {
    pub fn builder(service_name: impl Into<String>) -> AgentConfigBuilder {
        AgentConfigBuilder {
            service_name: service_name.into(),
            service_version: String::new(),
            deployment_environment: None,
            extra_attributes: Vec::new(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn service_version(&self) -> &str {
        &self.service_version
    }

    /// Render the configuration as resource attributes, including the SDK
    /// descriptors.
    pub fn resource_attributes(&self) -> ResourceAttributes {
        let mut builder = ResourceAttributes::builder()
            .put(keys::SERVICE_NAME, &self.service_name)
            .put(keys::SERVICE_VERSION, &self.service_version)
            .put(keys::TELEMETRY_SDK_NAME, "telegraft")
            .put(keys::TELEMETRY_SDK_VERSION, env!("CARGO_PKG_VERSION"))
            .put(keys::TELEMETRY_SDK_LANGUAGE, "rust");
        if let Some(environment) = &self.deployment_environment {
            builder = builder.put(keys::DEPLOYMENT_ENVIRONMENT, environment);
        }
        for (key, value) in &self.extra_attributes {
            builder = builder.put(key, value);
        }
        builder.build()
    }
}

#[derive(Debug)]
pub struct AgentConfigBuilder {
    service_name: String,
    service_version: String,
    deployment_environment: Option<String>,
    extra_attributes: Vec<(String, String)>,
}

impl AgentConfigBuilder {
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn deployment_environment(mut self, environment: impl Into<String>) -> Self {
        self.deployment_environment = Some(environment.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_attributes.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> AgentConfig {
        AgentConfig {
            service_name: self.service_name,
            service_version: self.service_version,
            deployment_environment: self.deployment_environment,
            extra_attributes: self.extra_attributes,
        }
    }
}

/// The assembled runtime: composed observer factory, resource attributes,
/// and the service registry, owned as one value by the application.
pub struct Agent {
    factory: Arc<dyn ObserverFactory>,
    resources: Arc<ResourceAttributes>,
    registry: ServiceRegistry,
}

impl Agent {
    pub fn builder(config: AgentConfig) -> AgentBuilder {
        AgentBuilder {
            config,
            factories: Vec::new(),
            services: Vec::new(),
            fault_sink: None,
        }
    }

    /// The composite factory fanning out to every registered factory.
    pub fn observer_factory(&self) -> Arc<dyn ObserverFactory> {
        Arc::clone(&self.factory)
    }

    pub fn resources(&self) -> Arc<ResourceAttributes> {
        Arc::clone(&self.resources)
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Start every registered service, in registration order.
    pub fn start(&mut self) -> Result<()> {
        info!("Starting telemetry services");
        self.registry.start()
    }

    /// Stop every registered service, best-effort. Returns the number of
    /// services that failed to stop.
    pub fn stop(&mut self) -> usize {
        info!("Stopping telemetry services");
        self.registry.stop()
    }

    /// Make this agent's composite factory reachable from injected call
    /// sites. First installation wins; later calls are no-ops and return
    /// false.
    pub fn install(&self) -> bool {
        INSTALLED.set(Arc::clone(&self.factory)).is_ok()
    }
}

/// Builds an [`Agent`]: observer factories in fan-out order, services in
/// start order, optional fault sink (defaults to logging).
pub struct AgentBuilder {
    config: AgentConfig,
    factories: Vec<Arc<dyn ObserverFactory>>,
    services: Vec<Box<dyn Service>>,
    fault_sink: Option<Arc<dyn FaultSink>>,
}

impl AgentBuilder {
    pub fn add_observer_factory(mut self, factory: Arc<dyn ObserverFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    pub fn add_service(mut self, service: Box<dyn Service>) -> Self {
        self.services.push(service);
        self
    }

    pub fn fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.fault_sink = Some(sink);
        self
    }

    /// Compose the factories and register the services. Fails on duplicate
    /// service names.
    pub fn build(self) -> Result<Agent> {
        let fault_sink = self
            .fault_sink
            .unwrap_or_else(|| Arc::new(LogFaultSink));
        let factory = compose(self.factories, fault_sink);

        let mut registry = ServiceRegistry::new();
        for service in self.services {
            registry.register(service)?;
        }

        let resources = Arc::new(self.config.resource_attributes());
        Ok(Agent {
            factory,
            resources,
            registry,
        })
    }
}
