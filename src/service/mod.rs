//! Worker-side service: the endpoint boundary and an in-process
//! implementation that drains a job queue with a small pool of worker
//! tasks.

pub mod registry;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::dispatcher::channel::ResultSender;
use crate::errors::EndpointError;
use crate::message::ServiceResponse;
use registry::{HandlerContext, HandlerRegistry};

/// Transport boundary through which encoded request frames reach the
/// worker. The reply path travels with each frame, so endpoints stay
/// stateless.
#[async_trait]
pub trait ServiceEndpoint: Send + Sync {
    /// Queue one encoded request frame. Must not block on the request's
    /// completion.
    async fn send(&self, frame: Vec<u8>, reply: ResultSender) -> Result<(), EndpointError>;
}

/// Tuning knobs for [`InProcessService`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Worker tasks draining the job queue. The default of one processes
    /// requests strictly sequentially.
    pub worker_count: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self { worker_count: 1 }
    }
}

struct Job {
    frame: Vec<u8>,
    reply: ResultSender,
}

/// In-process worker service: decodes request frames, runs the registered
/// handler for the operation, and replies through the job's
/// [`ResultSender`].
pub struct InProcessService {
    jobs_tx: mpsc::UnboundedSender<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl InProcessService {
    /// Spawn the worker tasks and return the endpoint.
    pub fn start(registry: HandlerRegistry, options: ServiceOptions) -> Arc<Self> {
        let worker_count = options.worker_count.max(1);
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));
        let mut workers = Vec::with_capacity(worker_count);
        for worker_index in 0..worker_count {
            let registry = registry.clone();
            let jobs_rx = Arc::clone(&jobs_rx);
            workers.push(tokio::spawn(async move {
                run_worker(worker_index, registry, jobs_rx).await;
            }));
        }
        info!(
            target: "svcbridge::service",
            workers = worker_count,
            operations = registry.len(),
            "in-process service started"
        );
        Arc::new(Self { jobs_tx, workers: Mutex::new(workers) })
    }

    /// Abort the worker tasks. In-flight jobs are abandoned; subsequent
    /// [`send`](ServiceEndpoint::send) calls fail with
    /// [`EndpointError::Closed`] once the queue is gone.
    pub async fn stop(&self) {
        let mut workers = self.workers.lock().await;
        for worker in workers.drain(..) {
            worker.abort();
        }
        info!(target: "svcbridge::service", "in-process service stopped");
    }
}

#[async_trait]
impl ServiceEndpoint for InProcessService {
    async fn send(&self, frame: Vec<u8>, reply: ResultSender) -> Result<(), EndpointError> {
        self.jobs_tx.send(Job { frame, reply }).map_err(|_| EndpointError::Closed)
    }
}

async fn run_worker(
    worker_index: usize,
    registry: HandlerRegistry,
    jobs_rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>,
) {
    debug!(target: "svcbridge::service", worker_index, "worker started");
    loop {
        // The receive lock is held only while waiting; workers process
        // jobs in parallel once they hold one.
        let job = { jobs_rx.lock().await.recv().await };
        match job {
            Some(job) => process_job(worker_index, &registry, job).await,
            None => {
                debug!(target: "svcbridge::service", worker_index, "job queue closed; worker exiting");
                break;
            }
        }
    }
}

async fn process_job(worker_index: usize, registry: &HandlerRegistry, job: Job) {
    let request = match codec::decode_request(&job.frame) {
        Ok(request) => request,
        Err(error) => {
            warn!(target: "svcbridge::service", worker_index, %error, "dropping undecodable request frame");
            return;
        }
    };
    let request_id = request.id;
    let operation = request.operation;
    let handler = match registry.get(operation) {
        Some(handler) => handler,
        None => {
            // Unrecognized kind: reply with an empty payload rather than
            // dropping the reply, so the pending entry still clears.
            debug!(
                target: "svcbridge::service",
                worker_index,
                request_id,
                %operation,
                "no handler registered; replying with empty payload"
            );
            job.reply.deliver(&ServiceResponse::empty(request_id));
            return;
        }
    };
    let started = Instant::now();
    match handler.invoke(HandlerContext::new(request_id, operation), request.payload).await {
        Ok(payload) => {
            debug!(
                target: "svcbridge::service",
                worker_index,
                request_id,
                %operation,
                duration_ms = started.elapsed().as_millis() as u64,
                "operation completed"
            );
            job.reply.deliver(&ServiceResponse::new(request_id, payload));
        }
        Err(error) => {
            error!(
                target: "svcbridge::service",
                worker_index,
                request_id,
                %operation,
                duration_ms = started.elapsed().as_millis() as u64,
                %error,
                "operation failed; no response will be delivered"
            );
        }
    }
}
