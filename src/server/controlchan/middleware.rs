use crate::server::{
    Event,
    controlchan::{Reply, error::ControlChanError},
};
use async_trait::async_trait;

// Defines the requirements for code that wants to intercept and do something
// with control channel events.
#[async_trait]
pub trait ControlChanMiddleware: Send + Sync {
    // Handles the specified `Event` and returns a `Reply` for the user or a
    // `ControlChanError` if some unexpected error occurred.
    async fn handle(&mut self, e: Event) -> Result<Reply, ControlChanError>;
}
