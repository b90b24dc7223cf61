//! Demo: submit one reverse request and print the observed response.
//!
//! Run with `RUST_LOG=svcbridge=debug` to watch the frames move.

use std::sync::Arc;

use svcbridge::{
    observer_fn, sample_registry, InProcessService, ObservabilityConfig, OperationKind, Payload,
    ServiceDispatcher, ServiceOptions, DATA_KEY,
};
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = svcbridge::init_logging(&ObservabilityConfig::default());

    let service = InProcessService::start(sample_registry(), ServiceOptions::default());
    let dispatcher = ServiceDispatcher::new();
    dispatcher.init(service.clone()).await;

    let done = Arc::new(Notify::new());
    let observer = {
        let done = done.clone();
        observer_fn(move |response| {
            let reversed = response.payload.get_str(DATA_KEY).unwrap_or_default();
            println!("request {} completed: {reversed}", response.request_id);
            done.notify_one();
        })
    };
    dispatcher.add_observer(observer.clone()).await;

    let id = dispatcher
        .submit(
            OperationKind::ReverseText,
            Payload::new().with_str(DATA_KEY, "reverse this text"),
        )
        .await?;
    println!("submitted request {id}");

    done.notified().await;

    dispatcher.remove_observer(observer).await;
    dispatcher.stop().await;
    service.stop().await;
    Ok(())
}
