#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use svcbridge::{
    sample_registry, DispatchError, EndpointError, HandlerContext, HandlerRegistry,
    InProcessService, OperationKind, Payload, ResultSender, ServiceDispatcher, ServiceEndpoint,
    ServiceObserver, ServiceOptions, ServiceResponse, DATA_KEY,
};
use tokio::sync::Semaphore;

/// Dispatcher wired to an in-process service.
pub struct Harness {
    pub dispatcher: Arc<ServiceDispatcher>,
    pub service: Arc<InProcessService>,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(sample_registry(), ServiceOptions::default()).await
    }

    pub async fn start_with(registry: HandlerRegistry, options: ServiceOptions) -> Self {
        let service = InProcessService::start(registry, options);
        let dispatcher = ServiceDispatcher::new();
        dispatcher.init(service.clone()).await;
        Self { dispatcher, service }
    }

    pub async fn submit_text(&self, text: &str) -> Result<u64, DispatchError> {
        self.dispatcher
            .submit(OperationKind::ReverseText, Payload::new().with_str(DATA_KEY, text))
            .await
    }

    pub async fn shutdown(&self) {
        self.dispatcher.stop().await;
        self.service.stop().await;
    }
}

/// Observer that records every response it sees.
#[derive(Default)]
pub struct RecordingObserver {
    responses: Mutex<Vec<ServiceResponse>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn responses(&self) -> Vec<ServiceResponse> {
        self.responses.lock().unwrap().clone()
    }

    pub fn count_for(&self, request_id: u64) -> usize {
        self.responses.lock().unwrap().iter().filter(|r| r.responds_to(request_id)).count()
    }

    /// Poll until a response for `request_id` arrives; `None` on timeout.
    pub async fn wait_for_response(&self, request_id: u64, timeout_ms: u64) -> Option<ServiceResponse> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let found = self
                .responses
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.responds_to(request_id))
                .cloned();
            if let Some(response) = found {
                return Some(response);
            }
            if Instant::now() > deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl ServiceObserver for RecordingObserver {
    fn on_completed(&self, response: &ServiceResponse) {
        self.responses.lock().unwrap().push(response.clone());
    }
}

/// Registry whose reverse handler waits for a gate permit before replying,
/// so tests can observe the pending state deterministically.
pub fn gated_registry() -> (HandlerRegistry, Arc<Semaphore>) {
    let release = Arc::new(Semaphore::new(0));
    let gate = release.clone();
    let registry = HandlerRegistry::builder()
        .register(OperationKind::ReverseText, move |_ctx: HandlerContext, payload: Payload| {
            let gate = gate.clone();
            async move {
                gate.acquire().await.expect("gate is never closed").forget();
                let text = payload.get_str(DATA_KEY).unwrap_or_default();
                let reversed: String = text.chars().rev().collect();
                Ok(Payload::new().with_str(DATA_KEY, reversed))
            }
        })
        .build();
    (registry, release)
}

/// Endpoint that swallows frames and keeps the latest reply sender, so a
/// test can inject responses by hand.
#[derive(Default)]
pub struct CapturingEndpoint {
    reply: Mutex<Option<ResultSender>>,
}

impl CapturingEndpoint {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take_reply(&self) -> ResultSender {
        self.reply.lock().unwrap().take().expect("a request was sent first")
    }
}

#[async_trait]
impl ServiceEndpoint for CapturingEndpoint {
    async fn send(&self, _frame: Vec<u8>, reply: ResultSender) -> Result<(), EndpointError> {
        *self.reply.lock().unwrap() = Some(reply);
        Ok(())
    }
}

/// Poll `predicate` every 5 ms until it holds; false on timeout.
pub async fn wait_until<F>(predicate: F, timeout_ms: u64) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if predicate() {
            return true;
        }
        if Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Poll until `request_id` is no longer pending; false on timeout.
pub async fn wait_not_pending(dispatcher: &ServiceDispatcher, request_id: u64, timeout_ms: u64) -> bool {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if !dispatcher.is_pending(request_id).await {
            return true;
        }
        if Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
