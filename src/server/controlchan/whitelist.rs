use crate::server::{
    Command, Event, Reply, ReplyCode,
    controlchan::{error::ControlChanError, middleware::ControlChanMiddleware},
};

use async_trait::async_trait;
use std::collections::HashSet;

// Refuses verbs we do not implement, and, when the server was configured
// with an explicit whitelist, everything outside of it. This runs before any
// other gate so an unknown command is always a 502, never a 530.
pub struct WhitelistMiddleware<Next>
where
    Next: ControlChanMiddleware,
{
    pub allowed: Option<HashSet<String>>,
    pub next: Next,
}

#[async_trait]
impl<Next> ControlChanMiddleware for WhitelistMiddleware<Next>
where
    Next: ControlChanMiddleware,
{
    async fn handle(&mut self, event: Event) -> Result<Reply, ControlChanError> {
        let refused = match &event {
            Event::Command(Command::Other { .. }) => true,
            Event::Command(cmd) => match &self.allowed {
                Some(allowed) => !allowed.contains(cmd.verb()),
                None => false,
            },
            Event::InternalMsg(_) => false,
        };
        if refused {
            return Ok(Reply::new(ReplyCode::CommandNotImplemented, "Command not implemented"));
        }
        self.next.handle(event).await
    }
}
