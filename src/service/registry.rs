//! Operation handlers and the registry the worker resolves them from.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::message::{OperationKind, Payload, DATA_KEY};

/// Per-request context handed to handlers, mainly for logging.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    request_id: u64,
    operation: OperationKind,
}

impl HandlerContext {
    pub(crate) fn new(request_id: u64, operation: OperationKind) -> Self {
        Self { request_id, operation }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }
}

/// One operation implementation. An `Err` aborts the unit of work: no
/// response is delivered and the dispatcher's pending entry stays until an
/// explicit stop.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn invoke(&self, ctx: HandlerContext, payload: Payload) -> Result<Payload, String>;
}

/// Adapter to register plain async closures as handlers.
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> OperationHandler for FnHandler<F>
where
    F: Fn(HandlerContext, Payload) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Payload, String>> + Send + 'static,
{
    async fn invoke(&self, ctx: HandlerContext, payload: Payload) -> Result<Payload, String> {
        (self.0)(ctx, payload).await
    }
}

/// Immutable mapping from operation kind to handler, built once at service
/// startup. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<HashMap<OperationKind, Arc<dyn OperationHandler>>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    pub fn get(&self, operation: OperationKind) -> Option<Arc<dyn OperationHandler>> {
        self.handlers.get(&operation).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<OperationKind, Arc<dyn OperationHandler>>,
}

impl HandlerRegistryBuilder {
    /// Register an async closure for `operation`.
    ///
    /// # Panics
    /// Panics if the operation already has a handler.
    pub fn register<F, Fut>(self, operation: OperationKind, f: F) -> Self
    where
        F: Fn(HandlerContext, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, String>> + Send + 'static,
    {
        self.register_handler(operation, Arc::new(FnHandler(f)))
    }

    /// Register a prebuilt handler for `operation`.
    ///
    /// # Panics
    /// Panics if the operation already has a handler.
    pub fn register_handler(
        mut self,
        operation: OperationKind,
        handler: Arc<dyn OperationHandler>,
    ) -> Self {
        if self.handlers.insert(operation, handler).is_some() {
            panic!("duplicate handler registered for operation {operation}");
        }
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry { handlers: Arc::new(self.handlers) }
    }
}

/// Registry for the sample worker: just the text-reversal operation.
pub fn sample_registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .register(OperationKind::ReverseText, |ctx: HandlerContext, payload: Payload| async move {
            let text = payload
                .get_str(DATA_KEY)
                .ok_or_else(|| format!("request {} has no '{DATA_KEY}' string", ctx.request_id()))?;
            let reversed: String = text.chars().rev().collect();
            debug!(
                target: "svcbridge::service",
                request_id = ctx.request_id(),
                operation = %ctx.operation(),
                chars = reversed.chars().count(),
                "reversed text"
            );
            Ok(Payload::new().with_str(DATA_KEY, reversed))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_registry_reverses_characters() {
        let registry = sample_registry();
        let handler = registry.get(OperationKind::ReverseText).expect("registered");
        let out = handler
            .invoke(
                HandlerContext::new(1, OperationKind::ReverseText),
                Payload::new().with_str(DATA_KEY, "reverse this text"),
            )
            .await
            .unwrap();
        assert_eq!(out.get_str(DATA_KEY), Some("txet siht esrever"));
    }

    #[tokio::test]
    async fn sample_handler_reverses_multibyte_text_by_char() {
        let registry = sample_registry();
        let handler = registry.get(OperationKind::ReverseText).expect("registered");
        let out = handler
            .invoke(
                HandlerContext::new(2, OperationKind::ReverseText),
                Payload::new().with_str(DATA_KEY, "aéz"),
            )
            .await
            .unwrap();
        assert_eq!(out.get_str(DATA_KEY), Some("zéa"));
    }

    #[tokio::test]
    async fn missing_data_key_is_a_handler_error() {
        let registry = sample_registry();
        let handler = registry.get(OperationKind::ReverseText).expect("registered");
        let err = handler
            .invoke(HandlerContext::new(3, OperationKind::ReverseText), Payload::new())
            .await
            .unwrap_err();
        assert!(err.contains("no 'data' string"));
    }

    #[test]
    fn handler_context_exposes_request_metadata() {
        let ctx = HandlerContext::new(7, OperationKind::ReverseText);
        assert_eq!(ctx.request_id(), 7);
        assert_eq!(ctx.operation(), OperationKind::ReverseText);
    }

    #[test]
    #[should_panic(expected = "duplicate handler")]
    fn duplicate_registration_panics() {
        let _ = HandlerRegistry::builder()
            .register(OperationKind::ReverseText, |_ctx, payload: Payload| async move { Ok(payload) })
            .register(OperationKind::ReverseText, |_ctx, payload: Payload| async move { Ok(payload) });
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = HandlerRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.get(OperationKind::ReverseText).is_none());
    }
}
