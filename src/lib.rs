//! Asynchronous request/response dispatch between an application and a
//! background worker service.
//!
//! Callers submit an operation to the [`ServiceDispatcher`] and get a
//! request id back immediately; the request crosses the worker boundary as
//! an encoded frame, a registered handler produces the response, and the
//! dispatcher fans it out to the current [`ServiceObserver`]s on a fixed
//! delivery task. Nothing ever blocks waiting for a result.
//!
//! ```no_run
//! use svcbridge::{
//!     observer_fn, sample_registry, InProcessService, OperationKind, Payload,
//!     ServiceDispatcher, ServiceOptions, DATA_KEY,
//! };
//!
//! # async fn run() -> Result<(), svcbridge::DispatchError> {
//! let service = InProcessService::start(sample_registry(), ServiceOptions::default());
//! let dispatcher = ServiceDispatcher::new();
//! dispatcher.init(service.clone()).await;
//!
//! dispatcher
//!     .add_observer(observer_fn(|response| {
//!         println!("request {} completed", response.request_id);
//!     }))
//!     .await;
//!
//! let id = dispatcher
//!     .submit(
//!         OperationKind::ReverseText,
//!         Payload::new().with_str(DATA_KEY, "reverse this text"),
//!     )
//!     .await?;
//! println!("submitted request {id}");
//!
//! dispatcher.stop().await;
//! service.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod dispatcher;
pub mod errors;
pub mod message;
pub mod observability;
pub mod service;

pub use dispatcher::channel::ResultSender;
pub use dispatcher::observers::{observer_fn, ServiceObserver};
pub use dispatcher::ServiceDispatcher;
pub use errors::{CodecError, DispatchError, EndpointError};
pub use message::{OperationKind, Payload, ServiceRequest, ServiceResponse, DATA_KEY};
pub use observability::{init_logging, DispatcherMetrics, LogFormat, ObservabilityConfig};
pub use service::registry::{
    sample_registry, HandlerContext, HandlerRegistry, HandlerRegistryBuilder, OperationHandler,
};
pub use service::{InProcessService, ServiceEndpoint, ServiceOptions};
