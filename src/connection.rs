//! CDP connection core.
//!
//! One [`Connection`] multiplexes many concurrent callers over a single
//! duplex channel. Senders allocate a monotonic correlation id, register a
//! pending [`Promise`] and transmit; a single dispatch-loop task owns all
//! inbound processing, resolving promises for responses and fanning out
//! notifications through the event emitter.
//!
//! # Dispatch Loop
//!
//! The loop is the sole consumer of inbound messages, so responses and
//! notifications are handled in strict arrival order and promise resolution
//! is race-free from the receive side. Per-message faults (malformed
//! documents, unknown notification names, stale response ids) are logged
//! and discarded; only an unrecoverable transport failure ends the loop.
//!
//! # Timeouts
//!
//! A caller timeout ends only that caller's wait. The request stays valid:
//! a late response is still consumed by the loop and discarded. A periodic
//! sweep reclaims table entries once they outlive their deadline plus a
//! grace period, so abandoned requests cannot grow the table forever.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::events::EventEmitter;
use crate::promise::Promise;
use crate::protocol::{self, CdpEvent, CdpEventType, InboundMessage, Response};
use crate::transport::{TransportRx, TransportTx};

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for blocking sends.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between sweeps of the pending-request table.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Extra time an entry may outlive its deadline before reclamation.
const SWEEP_GRACE: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

/// A registered request awaiting its response.
struct PendingRequest {
    /// Resolved exactly once by the dispatch loop, the sweeper or close.
    promise: Promise<Value>,
    /// Registration time, drives sweep reclamation.
    created: Instant,
    /// The caller's deadline for this request.
    deadline: Duration,
}

/// Correlation id to pending request. Producers insert, the dispatch loop
/// removes; removal is always a single take-and-resolve.
type PendingTable = FxHashMap<u64, PendingRequest>;

/// State shared between caller handles and the dispatch loop.
struct Shared {
    /// Connection name, used in logs only.
    name: String,
    /// Monotonic correlation id allocator. Ids are never reused.
    next_id: AtomicU64,
    /// Pending-request table.
    pending: Mutex<PendingTable>,
    /// Notification fan-out registry.
    emitter: EventEmitter<CdpEventType, CdpEvent>,
    /// Set once by `close()` or loop termination; new sends fail fast.
    closed: AtomicBool,
    /// Wakes the dispatch loop for shutdown.
    shutdown: Notify,
}

// ============================================================================
// ResponseFuture
// ============================================================================

/// Handle to an in-flight request, returned by [`Connection::submit`].
///
/// May be awaited later or abandoned; an abandoned request's response is
/// consumed and discarded by the dispatch loop.
#[derive(Debug, Clone)]
pub struct ResponseFuture {
    id: u64,
    promise: Promise<Value>,
}

impl ResponseFuture {
    /// Returns the request's correlation id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` once the request has been resolved.
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.promise.is_settled()
    }

    /// Waits for the response up to `deadline`.
    ///
    /// # Errors
    ///
    /// - [`Error::RequestTimeout`] if the deadline elapses first
    /// - [`Error::Protocol`] if the browser returned an error response
    /// - [`Error::Transport`] if the request never left the process
    /// - [`Error::ConnectionClosed`] if the connection closed while pending
    pub async fn wait(&self, deadline: Duration) -> Result<Value> {
        self.promise.wait(deadline).await.map_err(|e| match e {
            Error::Timeout { timeout_ms, .. } => Error::request_timeout(self.id, timeout_ms),
            other => other,
        })
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A CDP connection over one duplex channel.
///
/// Cloning yields another handle to the same connection. Sends may be
/// issued concurrently from any number of tasks; completion order is driven
/// entirely by browser reply order, correlation is by id.
pub struct Connection {
    shared: Arc<Shared>,
    transport: Arc<dyn TransportTx>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.shared.name)
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Connection {
    /// Opens a connection over an established transport and starts the
    /// dispatch loop.
    ///
    /// The loop task owns `rx` exclusively for the connection's lifetime.
    /// Transport establishment errors surface from the transport's own
    /// connect call before this point. Calling `open` twice over the same
    /// channel is a caller error.
    pub fn open(name: impl Into<String>, tx: impl TransportTx, rx: impl TransportRx) -> Self {
        let shared = Arc::new(Shared {
            name: name.into(),
            next_id: AtomicU64::new(0),
            pending: Mutex::new(PendingTable::default()),
            emitter: EventEmitter::new(),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });
        let transport: Arc<dyn TransportTx> = Arc::new(tx);

        tokio::spawn(dispatch_loop(
            Arc::clone(&shared),
            Arc::clone(&transport),
            rx,
        ));
        debug!(name = %shared.name, "Connection opened");

        Self { shared, transport }
    }

    /// Sends a command and waits for its response up to `deadline`.
    ///
    /// On timeout the request stays in flight; a late response is consumed
    /// and discarded by the dispatch loop.
    ///
    /// # Errors
    ///
    /// Same as [`ResponseFuture::wait`], plus [`Error::Json`] if the
    /// envelope cannot be encoded.
    pub async fn send(&self, method: &str, params: Value, deadline: Duration) -> Result<Value> {
        self.send_with(method, params, None, deadline).await
    }

    /// Sends a command with caller-supplied extra envelope fields.
    ///
    /// Extras are layered beneath the reserved keys: entries named `id`,
    /// `method` or `params` can never alter the transmitted values.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::send`].
    pub async fn send_with(
        &self,
        method: &str,
        params: Value,
        extra: Option<&Map<String, Value>>,
        deadline: Duration,
    ) -> Result<Value> {
        let handle = self.submit_with(method, params, extra, deadline).await?;
        handle.wait(deadline).await
    }

    /// Submits a command without blocking for the response.
    ///
    /// The returned handle may be awaited later or abandoned.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::Json`] if the envelope cannot be encoded
    pub async fn submit(&self, method: &str, params: Value) -> Result<ResponseFuture> {
        self.submit_with(method, params, None, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Submits a command with extra envelope fields and an explicit
    /// deadline used for sweep reclamation.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::submit`].
    pub async fn submit_with(
        &self,
        method: &str,
        params: Value,
        extra: Option<&Map<String, Value>>,
        deadline: Duration,
    ) -> Result<ResponseFuture> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let text = protocol::encode_command(id, method, params, extra)?;

        // Register before transmitting so a response can never arrive for
        // an id that is not yet in the table.
        let promise: Promise<Value> = Promise::new();
        self.shared.pending.lock().insert(
            id,
            PendingRequest {
                promise: promise.clone(),
                created: Instant::now(),
                deadline,
            },
        );

        debug!(name = %self.shared.name, id, method, "==> send");
        if let Err(e) = self.transport.send_raw(text).await {
            // The request never left the process: the table must not
            // retain it.
            self.shared.pending.lock().remove(&id);
            error!(name = %self.shared.name, id, error = %e, "Transmission failed");
            promise.fail(e);
        }

        Ok(ResponseFuture { id, promise })
    }

    /// Registers a listener for a CDP notification type.
    ///
    /// Listeners run synchronously on the dispatch loop, in registration
    /// order; a panicking listener is isolated and logged.
    pub fn on(
        &self,
        event_type: CdpEventType,
        listener: impl Fn(&CdpEvent) + Send + Sync + 'static,
    ) {
        self.shared.emitter.on(event_type, listener);
    }

    /// Returns the connection name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the number of requests currently awaiting a response.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Returns `true` once the connection has been closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Closes the connection.
    ///
    /// Every pending request is failed with
    /// [`Error::ConnectionClosed`] so no caller can block past this call;
    /// the dispatch loop stops and the transport is released. Idempotent.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(name = %self.shared.name, "Closing connection");
        self.shared.fail_all_pending(|| Error::ConnectionClosed);
        self.shared.shutdown.notify_one();
    }
}

// ============================================================================
// Shared - Dispatch
// ============================================================================

impl Shared {
    /// Decodes and routes one inbound document.
    fn dispatch(&self, text: &str) {
        trace!(name = %self.name, message = text, "<== recv");
        match protocol::decode(text) {
            Ok(InboundMessage::Event(event)) => self.dispatch_event(event),
            Ok(InboundMessage::Response(response)) => self.dispatch_response(response),
            // Contained to this message; the connection keeps running.
            Err(e) => warn!(name = %self.name, error = %e, "Discarding inbound message"),
        }
    }

    /// Routes a notification through the emitter.
    fn dispatch_event(&self, event: CdpEvent) {
        let event_type = CdpEventType::from_method(&event.method);
        if event_type.is_unknown() {
            debug!(name = %self.name, method = %event.method, "Discarding unknown event");
            return;
        }
        self.emitter.emit(event_type, &event);
    }

    /// Resolves the pending request matching a response.
    fn dispatch_response(&self, response: Response) {
        // Take-and-resolve: the entry leaves the table and is resolved by
        // exactly one party.
        let Some(entry) = self.pending.lock().remove(&response.id) else {
            warn!(
                name = %self.name,
                id = response.id,
                "Response for unknown or timed-out request"
            );
            return;
        };

        match response.error {
            Some(e) => {
                entry.promise.fail(Error::protocol(e.code, e.message));
            }
            None => {
                entry.promise.fulfill(response.result.unwrap_or(Value::Null));
            }
        }
    }

    /// Reclaims entries that outlived their deadline plus the grace period.
    fn sweep_expired(&self) {
        let now = Instant::now();
        let expired: Vec<(u64, PendingRequest)> = self
            .pending
            .lock()
            .extract_if(|_, entry| {
                now.duration_since(entry.created) > entry.deadline + SWEEP_GRACE
            })
            .collect();

        for (id, entry) in expired {
            warn!(name = %self.name, id, "Reclaiming abandoned request");
            entry
                .promise
                .fail(Error::request_timeout(id, entry.deadline.as_millis() as u64));
        }
    }

    /// Drains the table, failing every pending promise.
    fn fail_all_pending(&self, make_error: impl Fn() -> Error) {
        let drained: Vec<(u64, PendingRequest)> = self.pending.lock().drain().collect();
        let count = drained.len();

        for (_, entry) in drained {
            entry.promise.fail(make_error());
        }

        if count > 0 {
            debug!(name = %self.name, count, "Failed pending requests");
        }
    }
}

// ============================================================================
// Dispatch Loop
// ============================================================================

/// The single sequential worker owning all inbound processing for one
/// connection.
async fn dispatch_loop(
    shared: Arc<Shared>,
    transport: Arc<dyn TransportTx>,
    mut rx: impl TransportRx,
) {
    let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let fatal: Option<Error> = loop {
        tokio::select! {
            () = shared.shutdown.notified() => break None,

            _ = sweep.tick() => shared.sweep_expired(),

            message = rx.next_message() => match message {
                Some(Ok(text)) => shared.dispatch(&text),

                Some(Err(e)) => {
                    error!(name = %shared.name, error = %e, "Transport failure");
                    break Some(e);
                }

                None => {
                    debug!(name = %shared.name, "Inbound channel ended");
                    break None;
                }
            },
        }
    };

    shared.closed.store(true, Ordering::SeqCst);
    match fatal {
        // Distinct from per-message transport errors: the whole connection
        // is gone.
        Some(e) => shared.fail_all_pending(|| Error::connection_lost(e.to_string())),
        None => shared.fail_all_pending(|| Error::ConnectionClosed),
    }
    transport.close().await;

    debug!(name = %shared.name, "Dispatch loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
