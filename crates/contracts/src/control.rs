//! Control-plane messages between the admin channel and the aggregation
//! service

use tokio::sync::oneshot;

/// An out-of-cycle flush command. `done` resolves once the resulting
/// snapshot has been handed to the dispatcher.
#[derive(Debug)]
pub struct FlushRequest {
    pub done: oneshot::Sender<()>,
}

impl FlushRequest {
    /// Build a request plus the receiver the issuer awaits.
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (done, done_rx) = oneshot::channel();
        (Self { done }, done_rx)
    }
}
