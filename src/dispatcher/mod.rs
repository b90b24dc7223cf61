//! The dispatcher: pending-request table, observer set, and the delivery
//! task that completes responses on a fixed execution context.

pub mod channel;
pub mod observers;
mod pending;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec;
use crate::errors::{DeliveryError, DispatchError};
use crate::message::{OperationKind, Payload, ServiceRequest, DATA_KEY};
use crate::observability::{DispatcherMetrics, MetricsCounters};
use crate::service::ServiceEndpoint;
use channel::ResultSender;
use observers::{ObserverSet, ServiceObserver};
use pending::PendingTable;

/// Coordination point between callers and the worker service: owns the
/// pending-request table and the observer set, and fans completed
/// responses out on its delivery task.
///
/// Injectable: construct one with [`new`](Self::new) and share the `Arc`;
/// there is no process-global instance. Lifecycle is `init` then `stop`,
/// and re-init after stop is allowed.
pub struct ServiceDispatcher {
    state: Mutex<DispatcherState>,
    // Atomic and never reset, so ids stay unique for the dispatcher's
    // lifetime even across stop/re-init and concurrent submits.
    next_request_id: AtomicU64,
    counters: MetricsCounters,
}

struct DispatcherState {
    pending: PendingTable,
    observers: ObserverSet,
    session: Option<Session>,
}

/// Everything that exists only between `init` and `stop`.
struct Session {
    endpoint: Arc<dyn ServiceEndpoint>,
    results: ResultSender,
    delivery: JoinHandle<()>,
}

impl ServiceDispatcher {
    /// Fresh dispatcher in the idle state.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DispatcherState {
                pending: PendingTable::new(),
                observers: ObserverSet::new(),
                session: None,
            }),
            next_request_id: AtomicU64::new(0),
            counters: MetricsCounters::default(),
        })
    }

    /// Bind the worker endpoint and start the delivery task.
    ///
    /// Idempotent: while running, further calls are no-ops and the new
    /// endpoint is ignored.
    pub async fn init(self: &Arc<Self>, endpoint: Arc<dyn ServiceEndpoint>) {
        let mut state = self.state.lock().await;
        if state.session.is_some() {
            debug!(target: "svcbridge::dispatch", "init on a running dispatcher; ignored");
            return;
        }
        let (results, results_rx) = channel::result_channel();
        let delivery = tokio::spawn(Arc::clone(self).run_delivery(results_rx));
        state.session = Some(Session { endpoint, results, delivery });
        info!(target: "svcbridge::dispatch", "dispatcher initialized");
    }

    /// Validate, enqueue, and return the new request id without waiting for
    /// completion; the result arrives later through the observers.
    ///
    /// A transport-level send failure is logged and the entry stays
    /// pending: such a request simply never completes.
    pub async fn submit(
        &self,
        operation: OperationKind,
        payload: Payload,
    ) -> Result<u64, DispatchError> {
        validate(operation, &payload)?;
        let (request_id, frame, endpoint, reply) = {
            let mut state = self.state.lock().await;
            let (endpoint, reply) = match state.session.as_ref() {
                Some(session) => (Arc::clone(&session.endpoint), session.results.clone()),
                None => return Err(DispatchError::NotRunning),
            };
            let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
            let request = ServiceRequest::new(request_id, operation, payload);
            let frame = codec::encode_request(&request)?;
            if state.pending.insert(request).is_some() {
                warn!(target: "svcbridge::dispatch", request_id, "pending entry evicted; id reuse");
            }
            (request_id, frame, endpoint, reply)
        };
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(target: "svcbridge::dispatch", request_id, operation = %operation, "request submitted");
        if let Err(error) = endpoint.send(frame, reply).await {
            warn!(
                target: "svcbridge::dispatch",
                request_id,
                %error,
                "endpoint rejected request; entry stays pending"
            );
        }
        Ok(request_id)
    }

    /// True while `request_id` awaits its response. Always false before
    /// `init` and after `stop`.
    pub async fn is_pending(&self, request_id: u64) -> bool {
        self.state.lock().await.pending.contains(request_id)
    }

    /// Number of requests currently awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Register `observer` for completion notifications; re-adding the same
    /// `Arc` is a no-op. Registration works in any lifecycle state and is
    /// cleared by `stop`.
    pub async fn add_observer(&self, observer: Arc<dyn ServiceObserver>) {
        let mut state = self.state.lock().await;
        if !state.observers.add(observer) {
            debug!(target: "svcbridge::dispatch", "observer already registered");
        }
    }

    /// Unregister `observer`; unknown observers are a no-op.
    pub async fn remove_observer(&self, observer: Arc<dyn ServiceObserver>) {
        let mut state = self.state.lock().await;
        state.observers.remove(&observer);
    }

    /// Number of registered observers.
    pub async fn observer_count(&self) -> usize {
        self.state.lock().await.observers.len()
    }

    /// Stop the delivery task, release the endpoint, and clear the pending
    /// table and observer set. Safe to call repeatedly; `submit` fails with
    /// [`DispatchError::NotRunning`] until the next `init`.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let cleared = state.pending.len();
        state.pending.clear();
        state.observers.clear();
        if let Some(session) = state.session.take() {
            session.delivery.abort();
            info!(target: "svcbridge::dispatch", cleared_pending = cleared, "dispatcher stopped");
        }
    }

    /// Point-in-time counters.
    pub fn metrics(&self) -> DispatcherMetrics {
        self.counters.snapshot()
    }

    async fn run_delivery(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>) {
        while let Some(frame) = rx.recv().await {
            if let Err(error) = self.complete_frame(&frame).await {
                match error {
                    DeliveryError::Unmatched { request_id } => {
                        self.counters.dropped_unmatched.fetch_add(1, Ordering::Relaxed);
                        debug!(target: "svcbridge::dispatch", request_id, "unmatched response dropped");
                    }
                    DeliveryError::Frame(_) => {
                        warn!(target: "svcbridge::dispatch", %error, "response frame dropped");
                    }
                }
            }
        }
    }

    /// Decode one response frame, settle its pending entry, and fan out to
    /// a snapshot of the observers. Runs only on the delivery task; the
    /// table mutation happens under the state lock, the callbacks outside
    /// it so they may re-enter the dispatcher.
    async fn complete_frame(&self, frame: &[u8]) -> Result<(), DeliveryError> {
        let response = codec::decode_response(frame)?;
        let observers = {
            let mut state = self.state.lock().await;
            let request = match state.pending.remove(response.request_id) {
                Some(request) => request,
                None => return Err(DeliveryError::Unmatched { request_id: response.request_id }),
            };
            debug!(
                target: "svcbridge::dispatch",
                request_id = request.id,
                operation = %request.operation,
                observers = state.observers.len(),
                "response matched"
            );
            state.observers.snapshot()
        };
        self.counters.delivered.fetch_add(1, Ordering::Relaxed);
        for observer in &observers {
            observer.on_completed(&response);
        }
        Ok(())
    }
}

fn validate(operation: OperationKind, payload: &Payload) -> Result<(), DispatchError> {
    match operation {
        OperationKind::ReverseText => match payload.get_str(DATA_KEY) {
            Some(text) if !text.is_empty() => Ok(()),
            _ => Err(DispatchError::invalid_argument(format!(
                "{operation} requires a non-empty string under '{DATA_KEY}'"
            ))),
        },
    }
}
