//! Observer contracts for one observed network call
//!
//! An [`Observer`] receives the lifecycle callbacks of exactly one unit of
//! work (one network call). An [`ObserverFactory`] produces a fresh observer
//! per unit of work and may be invoked concurrently from any thread. The
//! `compose` module combines several factories into one that fans every
//! event out to all children.

pub mod compose;
pub mod fault;

pub use self::compose::compose;
pub use self::fault::{FaultSink, LogFaultSink};

use uuid::Uuid;

/// Identity of one observed network call (one unit of work).
///
/// Created by the instrumented call site when the call begins and handed to
/// every callback for the lifetime of that call. Never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHandle {
    id: Uuid,
    method: String,
    url: String,
}

impl CallHandle {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Error raised by an observer while handling a single event.
///
/// Faults are isolated per child by the composite observer and reported to a
/// [`FaultSink`]; they never reach the instrumented application's call path.
pub type ObserverFault = Box<dyn std::error::Error + Send + Sync>;

pub type ObserverResult = std::result::Result<(), ObserverFault>;

/// Lifecycle callbacks for one network call.
///
/// Every callback defaults to a no-op so implementations only override the
/// events they care about. Callbacks run synchronously on whichever thread
/// issued the network call; any cross-call aggregation an implementation
/// performs must be thread-safe on its side.
pub trait Observer: Send {
    fn on_call_start(&mut self, call: &CallHandle) -> ObserverResult {
        let _ = call;
        Ok(())
    }

    fn on_request_headers_sent(&mut self, call: &CallHandle) -> ObserverResult {
        let _ = call;
        Ok(())
    }

    fn on_request_body_sent(&mut self, call: &CallHandle, bytes: u64) -> ObserverResult {
        let _ = (call, bytes);
        Ok(())
    }

    fn on_response_headers_received(&mut self, call: &CallHandle, status: u16) -> ObserverResult {
        let _ = (call, status);
        Ok(())
    }

    fn on_response_body_received(&mut self, call: &CallHandle, bytes: u64) -> ObserverResult {
        let _ = (call, bytes);
        Ok(())
    }

    /// Terminal event: the call failed before completing normally.
    fn on_call_failed(&mut self, call: &CallHandle, reason: &str) -> ObserverResult {
        let _ = (call, reason);
        Ok(())
    }

    /// Terminal event: the call completed.
    fn on_call_ended(&mut self, call: &CallHandle) -> ObserverResult {
        let _ = call;
        Ok(())
    }
}

/// Produces one [`Observer`] per unit of work.
///
/// Factories are stateless across invocations and may be called from many
/// threads at once, once per in-flight call.
pub trait ObserverFactory: Send + Sync {
    fn create(&self, call: &CallHandle) -> Box<dyn Observer>;
}
