//! End-to-end fan-out behavior of composed observers.

use std::sync::{Arc, Mutex};

use telegraft::observer::fault::CollectingFaultSink;
use telegraft::observer::{
    compose, CallHandle, FaultSink, Observer, ObserverFactory, ObserverResult,
};

/// Observer that appends every event it sees to its own sequence.
struct SequenceObserver {
    sequence: Arc<Mutex<Vec<&'static str>>>,
    fail_every_event: bool,
}

impl Observer for SequenceObserver {
    fn on_call_start(&mut self, _call: &CallHandle) -> ObserverResult {
        self.record("start")
    }

    fn on_response_headers_received(&mut self, _call: &CallHandle, _status: u16) -> ObserverResult {
        self.record("headers-received")
    }

    fn on_call_ended(&mut self, _call: &CallHandle) -> ObserverResult {
        self.record("ended")
    }
}

impl SequenceObserver {
    fn record(&mut self, event: &'static str) -> ObserverResult {
        self.sequence.lock().unwrap().push(event);
        if self.fail_every_event {
            return Err(format!("failing on {event}").into());
        }
        Ok(())
    }
}

struct SequenceFactory {
    sequence: Arc<Mutex<Vec<&'static str>>>,
    fail_every_event: bool,
}

impl ObserverFactory for SequenceFactory {
    fn create(&self, _call: &CallHandle) -> Box<dyn Observer> {
        Box::new(SequenceObserver {
            sequence: Arc::clone(&self.sequence),
            fail_every_event: self.fail_every_event,
        })
    }
}

fn factory(
    sequence: &Arc<Mutex<Vec<&'static str>>>,
    fail_every_event: bool,
) -> Arc<dyn ObserverFactory> {
    Arc::new(SequenceFactory {
        sequence: Arc::clone(sequence),
        fail_every_event,
    })
}

#[test]
fn three_children_see_the_emitted_sequence_identically() {
    let sequences: Vec<_> = (0..3).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
    let factories = sequences
        .iter()
        .map(|sequence| factory(sequence, false))
        .collect();

    let composite = compose(factories, Arc::new(CollectingFaultSink::new()));
    let call = CallHandle::new("GET", "https://api.example.com/orders");
    let mut observer = composite.create(&call);

    observer.on_call_start(&call).unwrap();
    observer.on_response_headers_received(&call, 200).unwrap();
    observer.on_call_ended(&call).unwrap();

    let expected = vec!["start", "headers-received", "ended"];
    for sequence in &sequences {
        assert_eq!(*sequence.lock().unwrap(), expected);
    }
}

#[test]
fn persistently_failing_child_never_disturbs_its_siblings() {
    let sequences: Vec<_> = (0..3).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
    // The middle child fails every single event.
    let factories = vec![
        factory(&sequences[0], false),
        factory(&sequences[1], true),
        factory(&sequences[2], false),
    ];

    let faults = Arc::new(CollectingFaultSink::new());
    let composite = compose(factories, Arc::clone(&faults) as Arc<dyn FaultSink>);
    let call = CallHandle::new("GET", "https://api.example.com/orders");
    let mut observer = composite.create(&call);

    observer.on_call_start(&call).unwrap();
    observer.on_response_headers_received(&call, 503).unwrap();
    observer.on_call_ended(&call).unwrap();

    let expected = vec!["start", "headers-received", "ended"];
    for sequence in &sequences {
        assert_eq!(*sequence.lock().unwrap(), expected);
    }

    let recorded = faults.take();
    assert_eq!(recorded.len(), 3);
    assert!(recorded.iter().all(|fault| fault.child_index == 1));
}

#[test]
fn each_unit_of_work_gets_fresh_children() {
    let creations = Arc::new(Mutex::new(0usize));

    struct CountingFactory(Arc<Mutex<usize>>);
    impl ObserverFactory for CountingFactory {
        fn create(&self, _call: &CallHandle) -> Box<dyn Observer> {
            *self.0.lock().unwrap() += 1;
            struct Noop;
            impl Observer for Noop {}
            Box::new(Noop)
        }
    }

    let composite = compose(
        vec![Arc::new(CountingFactory(Arc::clone(&creations))) as Arc<dyn ObserverFactory>],
        Arc::new(CollectingFaultSink::new()),
    );

    for _ in 0..5 {
        let call = CallHandle::new("GET", "https://api.example.com/");
        let _observer = composite.create(&call);
    }

    assert_eq!(*creations.lock().unwrap(), 5);
}
