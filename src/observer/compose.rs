//! Observer composition - fan one call's events out to many observers
//!
//! `compose` turns an ordered list of factories into a single factory whose
//! product forwards every event to every child, in registration order, on
//! the calling thread. A child that fails an event is reported to the fault
//! sink and the remaining children still receive the event.

use std::sync::Arc;

use super::fault::FaultSink;
use super::{CallHandle, Observer, ObserverFactory, ObserverResult};

/// Combine an ordered list of factories into one.
///
/// The input may be empty (the product is a no-op observer) and may contain
/// duplicates (each entry is invoked, no deduplication). Forwarding order is
/// exactly the input order and is stable across calls.
pub fn compose(
    factories: Vec<Arc<dyn ObserverFactory>>,
    faults: Arc<dyn FaultSink>,
) -> Arc<dyn ObserverFactory> {
    Arc::new(CompositeObserverFactory { factories, faults })
}

struct CompositeObserverFactory {
    factories: Vec<Arc<dyn ObserverFactory>>,
    faults: Arc<dyn FaultSink>,
}

impl ObserverFactory for CompositeObserverFactory {
    fn create(&self, call: &CallHandle) -> Box<dyn Observer> {
        // Children are created eagerly, one per input factory, in input order.
        let children = self
            .factories
            .iter()
            .map(|factory| factory.create(call))
            .collect();

        Box::new(CompositeObserver {
            children,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Observer that owns the children for one unit of work and fans every
/// event out to them. Discarded with the unit of work, never reused.
struct CompositeObserver {
    children: Vec<Box<dyn Observer>>,
    faults: Arc<dyn FaultSink>,
}

impl CompositeObserver {
    fn fan_out(
        &mut self,
        event: &'static str,
        call: &CallHandle,
        mut deliver: impl FnMut(&mut dyn Observer) -> ObserverResult,
    ) {
        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(fault) = deliver(child.as_mut()) {
                self.faults.child_failed(index, event, call, fault);
            }
        }
    }
}

impl Observer for CompositeObserver {
    fn on_call_start(&mut self, call: &CallHandle) -> ObserverResult {
        self.fan_out("call_start", call, |child| child.on_call_start(call));
        Ok(())
    }

    fn on_request_headers_sent(&mut self, call: &CallHandle) -> ObserverResult {
        self.fan_out("request_headers_sent", call, |child| {
            child.on_request_headers_sent(call)
        });
        Ok(())
    }

    fn on_request_body_sent(&mut self, call: &CallHandle, bytes: u64) -> ObserverResult {
        self.fan_out("request_body_sent", call, |child| {
            child.on_request_body_sent(call, bytes)
        });
        Ok(())
    }

    fn on_response_headers_received(&mut self, call: &CallHandle, status: u16) -> ObserverResult {
        self.fan_out("response_headers_received", call, |child| {
            child.on_response_headers_received(call, status)
        });
        Ok(())
    }

    fn on_response_body_received(&mut self, call: &CallHandle, bytes: u64) -> ObserverResult {
        self.fan_out("response_body_received", call, |child| {
            child.on_response_body_received(call, bytes)
        });
        Ok(())
    }

    fn on_call_failed(&mut self, call: &CallHandle, reason: &str) -> ObserverResult {
        self.fan_out("call_failed", call, |child| {
            child.on_call_failed(call, reason)
        });
        Ok(())
    }

    fn on_call_ended(&mut self, call: &CallHandle) -> ObserverResult {
        self.fan_out("call_ended", call, |child| child.on_call_ended(call));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::fault::CollectingFaultSink;
    use super::*;

    /// Records every event it sees into a shared log, tagged with a label.
    struct RecordingObserver {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Observer for RecordingObserver {
        fn on_call_start(&mut self, _call: &CallHandle) -> ObserverResult {
            self.record("call_start")
        }

        fn on_response_headers_received(
            &mut self,
            _call: &CallHandle,
            _status: u16,
        ) -> ObserverResult {
            self.record("response_headers_received")
        }

        fn on_call_failed(&mut self, _call: &CallHandle, _reason: &str) -> ObserverResult {
            self.record("call_failed")
        }

        fn on_call_ended(&mut self, _call: &CallHandle) -> ObserverResult {
            self.record("call_ended")
        }
    }

    impl RecordingObserver {
        fn record(&mut self, event: &'static str) -> ObserverResult {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, event));
            if self.fail_on == Some(event) {
                return Err(format!("{} refused {}", self.label, event).into());
            }
            Ok(())
        }
    }

    struct RecordingFactory {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
        creations: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ObserverFactory for RecordingFactory {
        fn create(&self, _call: &CallHandle) -> Box<dyn Observer> {
            self.creations.lock().unwrap().push(self.label);
            Box::new(RecordingObserver {
                label: self.label,
                log: Arc::clone(&self.log),
                fail_on: self.fail_on,
            })
        }
    }

    struct Fixture {
        log: Arc<Mutex<Vec<String>>>,
        creations: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
                creations: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn factory(&self, label: &'static str) -> Arc<dyn ObserverFactory> {
            self.factory_failing(label, None)
        }

        fn factory_failing(
            &self,
            label: &'static str,
            fail_on: Option<&'static str>,
        ) -> Arc<dyn ObserverFactory> {
            Arc::new(RecordingFactory {
                label,
                log: Arc::clone(&self.log),
                fail_on,
                creations: Arc::clone(&self.creations),
            })
        }

        fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[test]
    fn creates_one_child_per_factory_in_order() {
        let fx = Fixture::new();
        let composite = compose(
            vec![fx.factory("a"), fx.factory("b"), fx.factory("c")],
            Arc::new(CollectingFaultSink::new()),
        );

        let call = CallHandle::new("GET", "https://example.com/");
        let _observer = composite.create(&call);

        assert_eq!(*fx.creations.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn forwards_events_in_registration_order() {
        let fx = Fixture::new();
        let composite = compose(
            vec![fx.factory("a"), fx.factory("b")],
            Arc::new(CollectingFaultSink::new()),
        );

        let call = CallHandle::new("GET", "https://example.com/");
        let mut observer = composite.create(&call);
        observer.on_call_start(&call).unwrap();
        observer.on_call_ended(&call).unwrap();

        assert_eq!(
            fx.events(),
            vec!["a:call_start", "b:call_start", "a:call_ended", "b:call_ended"]
        );
    }

    #[test]
    fn empty_composition_is_a_no_op() {
        let composite = compose(Vec::new(), Arc::new(CollectingFaultSink::new()));
        let call = CallHandle::new("GET", "https://example.com/");
        let mut observer = composite.create(&call);

        observer.on_call_start(&call).unwrap();
        observer.on_call_ended(&call).unwrap();
    }

    #[test]
    fn duplicate_factories_are_both_invoked() {
        let fx = Fixture::new();
        let dup = fx.factory("dup");
        let composite = compose(
            vec![Arc::clone(&dup), dup],
            Arc::new(CollectingFaultSink::new()),
        );

        let call = CallHandle::new("GET", "https://example.com/");
        let mut observer = composite.create(&call);
        observer.on_call_start(&call).unwrap();

        assert_eq!(fx.events(), vec!["dup:call_start", "dup:call_start"]);
    }

    #[test]
    fn failing_child_does_not_stop_remaining_children() {
        let fx = Fixture::new();
        let faults = Arc::new(CollectingFaultSink::new());
        let composite = compose(
            vec![
                fx.factory("a"),
                fx.factory_failing("b", Some("call_start")),
                fx.factory("c"),
            ],
            Arc::clone(&faults) as Arc<dyn FaultSink>,
        );

        let call = CallHandle::new("GET", "https://example.com/");
        let mut observer = composite.create(&call);

        // Composite never surfaces the child error.
        observer.on_call_start(&call).unwrap();

        assert_eq!(
            fx.events(),
            vec!["a:call_start", "b:call_start", "c:call_start"]
        );

        let recorded = faults.take();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].child_index, 1);
        assert_eq!(recorded[0].event, "call_start");
        assert!(recorded[0].message.contains("b refused call_start"));
    }

    #[test]
    fn failing_child_still_receives_later_events() {
        let fx = Fixture::new();
        let faults = Arc::new(CollectingFaultSink::new());
        let composite = compose(
            vec![fx.factory_failing("a", Some("call_start")), fx.factory("b")],
            Arc::clone(&faults) as Arc<dyn FaultSink>,
        );

        let call = CallHandle::new("GET", "https://example.com/");
        let mut observer = composite.create(&call);
        observer.on_call_start(&call).unwrap();
        observer.on_call_ended(&call).unwrap();

        assert_eq!(
            fx.events(),
            vec!["a:call_start", "b:call_start", "a:call_ended", "b:call_ended"]
        );
        assert_eq!(faults.len(), 1);
    }
}
