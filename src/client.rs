//! The chat client component.
//!
//! [`ChatClient`] owns the UI handles it was built with and runs the
//! per-message sequence: append the user's text, show a placeholder, ask the
//! backend on a spawned task, then swap the placeholder for the reply.
//!
//! Requests complete on their own tasks but are applied to the log only from
//! the client's owner, through [`ChatClient::poll_completions`],
//! [`ChatClient::next_completion`] or [`ChatClient::settle`].  The log is
//! therefore only ever mutated from one place, and final messages appear in
//! completion order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::message::{EntryId, Message, Meta, Sender, THINKING};
use crate::observability::{
    CLIENT_ANSWERS, CLIENT_BACKEND_ERRORS, CLIENT_CANCELLATIONS, CLIENT_EMPTY_SENDS,
    CLIENT_FAILURES, CLIENT_MALFORMED, CLIENT_REJECTED_SENDS, CLIENT_SENDS, CLIENT_TIMEOUTS,
};
use crate::view::{InputField, LogView, UiEvent};
use crate::wire::{ChatReply, ChatRequest};

/// Shown when the backend could not be reached or its reply not decoded.
pub const UNREACHABLE: &str = "Sorry, I couldn't reach the server.";

/// Shown when a request outlives the client's timeout.
pub const TIMED_OUT: &str = "Sorry, the server took too long to respond.";

/// Shown for each request abandoned by [`ChatClient::cancel_pending`].
pub const CANCELLED: &str = "Request cancelled.";

/// Shown under [`ResponsePolicy::Strict`] for replies with bad fields.
pub const MALFORMED: &str = "Error: malformed response from server";

/// Default bound on a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Whether more than one request may be in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendPolicy {
    /// Every send goes out immediately; requests race.
    #[default]
    Concurrent,
    /// Sending is disabled while a request is pending.
    SingleFlight,
}

/// How much the client trusts the shape of a reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponsePolicy {
    /// Render whatever arrives; missing fields show as `undefined`.
    #[default]
    Lenient,
    /// Require well-typed `answer`, `source` and `confidence` fields.
    Strict,
}

/// Identifies one in-flight request.
///
/// Identifiers come from a per-client counter and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The backend answered; the reply was rendered with metadata.
    Answered,
    /// The backend reported an error in its reply body.
    BackendError,
    /// The reply failed strict validation.
    Malformed,
    /// The backend could not be reached or the reply not decoded.
    Failed,
    /// The request outlived the timeout.
    TimedOut,
    /// The request was cancelled.
    Cancelled,
}

/// Counters for one client's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Requests issued.
    pub sent: u64,
    /// Replies rendered as answers.
    pub answered: u64,
    /// Replies carrying a backend error.
    pub backend_errors: u64,
    /// Replies rejected by strict validation.
    pub malformed: u64,
    /// Transport or decoding failures.
    pub failures: u64,
    /// Requests that timed out.
    pub timed_out: u64,
    /// Requests cancelled.
    pub cancelled: u64,
    /// Requests still in flight.
    pub pending: usize,
}

struct Completion {
    id: RequestId,
    outcome: Result<ChatReply>,
}

struct Pending {
    placeholder: EntryId,
    task: JoinHandle<()>,
}

/// A chat client bound to an input field, a log view, and a backend.
pub struct ChatClient<I: InputField, V: LogView> {
    input: I,
    view: V,
    backend: Arc<dyn Backend>,
    send_policy: SendPolicy,
    response_policy: ResponsePolicy,
    timeout: Option<Duration>,
    pending: HashMap<RequestId, Pending>,
    next_request: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    stats: SessionStats,
}

impl<I: InputField, V: LogView> ChatClient<I, V> {
    /// Create a client with the default policies and timeout.
    pub fn new(input: I, view: V, backend: Arc<dyn Backend>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            input,
            view,
            backend,
            send_policy: SendPolicy::default(),
            response_policy: ResponsePolicy::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            pending: HashMap::new(),
            next_request: 0,
            completions_tx,
            completions_rx,
            stats: SessionStats::default(),
        }
    }

    /// Sets the send policy.
    pub fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.send_policy = policy;
        self
    }

    /// Sets the response policy.
    pub fn with_response_policy(mut self, policy: ResponsePolicy) -> Self {
        self.response_policy = policy;
        self
    }

    /// Sets the per-request timeout; `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Changes the timeout for requests sent from now on.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The send policy.
    pub fn send_policy(&self) -> SendPolicy {
        self.send_policy
    }

    /// The response policy.
    pub fn response_policy(&self) -> ResponsePolicy {
        self.response_policy
    }

    /// The input field.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// The input field, for the host to type into.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// The log view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The log view, for host-side redraws.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Number of requests in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// True while `id` has not been resolved.
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains_key(&id)
    }

    /// The placeholder entry shown for `id`, while it is pending.
    pub fn placeholder(&self, id: RequestId) -> Option<EntryId> {
        self.pending.get(&id).map(|pending| pending.placeholder)
    }

    /// Whether the send trigger is currently enabled.
    pub fn is_send_enabled(&self) -> bool {
        match self.send_policy {
            SendPolicy::Concurrent => true,
            SendPolicy::SingleFlight => self.pending.is_empty(),
        }
    }

    /// A snapshot of this client's counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            pending: self.pending.len(),
            ..self.stats.clone()
        }
    }

    /// Render one message at the end of the log and scroll to it.
    ///
    /// Metadata is only drawn for bot messages.
    pub fn append_message(
        &mut self,
        text: impl Into<String>,
        sender: Sender,
        meta: Option<Meta>,
    ) -> EntryId {
        let id = self.view.append(Message {
            text: text.into(),
            sender,
            meta,
        });
        self.view.scroll_to_end();
        id
    }

    /// React to an event from the host's input surface.
    ///
    /// A click or the Enter key sends; anything else is ignored.
    pub fn handle_event(&mut self, event: UiEvent) -> Option<RequestId> {
        if event.triggers_send() {
            self.send_message()
        } else {
            None
        }
    }

    /// Send whatever is in the input field.
    ///
    /// Returns `None` without touching the log or the network when the
    /// trimmed input is empty or sending is disabled.  Must be called from
    /// within a Tokio runtime; the round trip runs on a spawned task.
    pub fn send_message(&mut self) -> Option<RequestId> {
        if !self.is_send_enabled() {
            CLIENT_REJECTED_SENDS.click();
            log::debug!("send ignored: {} request(s) pending", self.pending.len());
            return None;
        }
        let text = self.input.value().trim().to_string();
        if text.is_empty() {
            CLIENT_EMPTY_SENDS.click();
            return None;
        }

        self.append_message(text.clone(), Sender::User, None);
        self.input.clear();

        let id = RequestId(self.next_request);
        self.next_request += 1;
        let placeholder = self.append_message(THINKING, Sender::Bot, None);
        let task = self.spawn_request(id, text);
        self.pending.insert(id, Pending { placeholder, task });

        CLIENT_SENDS.click();
        self.stats.sent += 1;
        log::debug!("{id} sent, placeholder {placeholder}");
        Some(id)
    }

    /// Apply every completion that has already arrived.
    ///
    /// Returns the number of requests resolved.
    pub fn poll_completions(&mut self) -> usize {
        let mut resolved = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.resolve(completion).is_some() {
                resolved += 1;
            }
        }
        resolved
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` immediately when nothing is pending.
    pub async fn next_completion(&mut self) -> Option<(RequestId, Resolution)> {
        while !self.pending.is_empty() {
            let completion = self.completions_rx.recv().await?;
            let id = completion.id;
            if let Some(resolution) = self.resolve(completion) {
                return Some((id, resolution));
            }
        }
        None
    }

    /// Wait until every pending request has been resolved.
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    /// Abandon every pending request.
    ///
    /// Each placeholder is replaced by [`CANCELLED`].  Returns the number of
    /// requests cancelled.
    pub fn cancel_pending(&mut self) -> usize {
        let mut ids: Vec<RequestId> = self.pending.keys().copied().collect();
        ids.sort();
        for id in &ids {
            if let Some(pending) = self.pending.remove(id) {
                pending.task.abort();
                self.finish(*id, pending, Err(Error::cancelled("cancelled by user")));
            }
        }
        ids.len()
    }

    /// Empty the log.  Pending requests still render their replies.
    pub fn clear(&mut self) {
        self.view.clear();
    }

    fn spawn_request(&self, id: RequestId, query: String) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let completions = self.completions_tx.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            let request = ChatRequest::new(query);
            // A panicking backend must still produce a completion.
            let mut ask = AbortOnDrop(tokio::spawn(async move { backend.ask(request).await }));
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, &mut ask.0).await {
                    Ok(joined) => flatten_join(joined),
                    Err(_) => Err(Error::timeout(
                        "no reply from backend",
                        Some(limit.as_secs_f64()),
                    )),
                },
                None => flatten_join((&mut ask.0).await),
            };
            // The client may be gone; then nobody is waiting for this.
            let _ = completions.send(Completion { id, outcome });
        })
    }

    fn resolve(&mut self, completion: Completion) -> Option<Resolution> {
        let Some(pending) = self.pending.remove(&completion.id) else {
            log::debug!("{} already settled; dropping its completion", completion.id);
            return None;
        };
        Some(self.finish(completion.id, pending, completion.outcome))
    }

    fn finish(&mut self, id: RequestId, pending: Pending, outcome: Result<ChatReply>) -> Resolution {
        // The placeholder goes first so it never shares the log with the reply.
        if !self.view.remove(pending.placeholder) {
            log::debug!("{id}: placeholder {} was already gone", pending.placeholder);
        }
        match outcome {
            Ok(reply) => self.render_reply(id, reply),
            Err(err) if err.is_cancelled() => {
                CLIENT_CANCELLATIONS.click();
                self.stats.cancelled += 1;
                log::info!("{id} cancelled");
                self.append_message(CANCELLED, Sender::Bot, None);
                Resolution::Cancelled
            }
            Err(err) if err.is_timeout() => {
                CLIENT_TIMEOUTS.click();
                self.stats.timed_out += 1;
                log::error!("{id} timed out: {err}");
                self.append_message(TIMED_OUT, Sender::Bot, None);
                Resolution::TimedOut
            }
            Err(err) => {
                CLIENT_FAILURES.click();
                self.stats.failures += 1;
                log::error!("{id} failed: {err}");
                self.append_message(UNREACHABLE, Sender::Bot, None);
                Resolution::Failed
            }
        }
    }

    fn render_reply(&mut self, id: RequestId, reply: ChatReply) -> Resolution {
        if let Some(error) = reply.error() {
            CLIENT_BACKEND_ERRORS.click();
            self.stats.backend_errors += 1;
            self.append_message(format!("Error: {error}"), Sender::Bot, None);
            return Resolution::BackendError;
        }
        if self.response_policy == ResponsePolicy::Strict {
            if let Err(err) = reply.validate() {
                CLIENT_MALFORMED.click();
                self.stats.malformed += 1;
                log::warn!("{id} returned a malformed reply: {err}; body: {}", reply.body());
                self.append_message(MALFORMED, Sender::Bot, None);
                return Resolution::Malformed;
            }
        }
        CLIENT_ANSWERS.click();
        self.stats.answered += 1;
        let meta = Meta::new(reply.source(), reply.confidence());
        self.append_message(reply.answer(), Sender::Bot, Some(meta));
        Resolution::Answered
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn flatten_join(joined: std::result::Result<Result<ChatReply>, JoinError>) -> Result<ChatReply> {
    joined.unwrap_or_else(|err| {
        Err(Error::http_client(
            format!("backend task failed: {err}"),
            None,
        ))
    })
}

impl<I: InputField, V: LogView> Drop for ChatClient<I, V> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.task.abort();
        }
    }
}
