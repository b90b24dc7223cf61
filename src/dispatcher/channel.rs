//! Result channel: the asynchronous path carrying encoded responses from
//! worker tasks back to the dispatcher's delivery task.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::codec;
use crate::message::ServiceResponse;

/// Sending half of the result channel, handed to the worker endpoint with
/// every request frame. Cloneable and cheap; delivery is fire-and-forget
/// and never blocks the worker.
#[derive(Clone)]
pub struct ResultSender {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ResultSender {
    fn new(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Encode `response` and queue it for the dispatcher. At-most-once per
    /// request is the caller's contract. Sends after the dispatcher stopped
    /// land in a closed channel and are dropped silently; a fresh channel is
    /// created per `init`, so a stale sender can never reach a later epoch.
    pub fn deliver(&self, response: &ServiceResponse) {
        let frame = match codec::encode_response(response) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(
                    target: "svcbridge::channel",
                    request_id = response.request_id,
                    %error,
                    "response not encodable; dropping"
                );
                return;
            }
        };
        if self.tx.send(frame).is_err() {
            debug!(
                target: "svcbridge::channel",
                request_id = response.request_id,
                "dispatcher gone; response dropped"
            );
        }
    }
}

/// One result channel per dispatcher session.
pub(crate) fn result_channel() -> (ResultSender, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultSender::new(tx), rx)
}
