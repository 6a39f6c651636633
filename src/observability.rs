use biometrics::{Collector, Counter, Moments};

pub(crate) static BACKEND_REQUESTS: Counter = Counter::new("chatdesk.backend.requests");
pub(crate) static BACKEND_TRANSPORT_ERRORS: Counter =
    Counter::new("chatdesk.backend.transport_errors");
pub(crate) static BACKEND_REQUEST_DURATION: Moments =
    Moments::new("chatdesk.backend.request_duration_seconds");

pub(crate) static CLIENT_SENDS: Counter = Counter::new("chatdesk.client.sends");
pub(crate) static CLIENT_EMPTY_SENDS: Counter = Counter::new("chatdesk.client.empty_sends");
pub(crate) static CLIENT_REJECTED_SENDS: Counter = Counter::new("chatdesk.client.rejected_sends");
pub(crate) static CLIENT_ANSWERS: Counter = Counter::new("chatdesk.client.answers");
pub(crate) static CLIENT_BACKEND_ERRORS: Counter = Counter::new("chatdesk.client.backend_errors");
pub(crate) static CLIENT_MALFORMED: Counter = Counter::new("chatdesk.client.malformed");
pub(crate) static CLIENT_FAILURES: Counter = Counter::new("chatdesk.client.failures");
pub(crate) static CLIENT_TIMEOUTS: Counter = Counter::new("chatdesk.client.timeouts");
pub(crate) static CLIENT_CANCELLATIONS: Counter = Counter::new("chatdesk.client.cancellations");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&BACKEND_REQUESTS);
    collector.register_counter(&BACKEND_TRANSPORT_ERRORS);
    collector.register_moments(&BACKEND_REQUEST_DURATION);

    collector.register_counter(&CLIENT_SENDS);
    collector.register_counter(&CLIENT_EMPTY_SENDS);
    collector.register_counter(&CLIENT_REJECTED_SENDS);
    collector.register_counter(&CLIENT_ANSWERS);
    collector.register_counter(&CLIENT_BACKEND_ERRORS);
    collector.register_counter(&CLIENT_MALFORMED);
    collector.register_counter(&CLIENT_FAILURES);
    collector.register_counter(&CLIENT_TIMEOUTS);
    collector.register_counter(&CLIENT_CANCELLATIONS);
}
