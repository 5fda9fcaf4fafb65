use crate::{
    auth::UserDetail,
    server::{
        Event, Reply, ReplyCode,
        controlchan::{error::ControlChanError, middleware::ControlChanMiddleware},
        session::SharedSession,
    },
    storage::StorageBackend,
};

use async_trait::async_trait;

// Middleware that enforces TLS on the control channel when the server runs
// in tls-only mode: every command that is not exempt from authentication is
// refused over a plaintext control connection. USER is let through so its
// handler can produce the friendlier 530 with the TLS-only text.
pub struct TlsOnlyMiddleware<Storage, User, Next>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Next: ControlChanMiddleware,
{
    pub session: SharedSession<Storage, User>,
    pub tls_only: bool,
    pub next: Next,
}

#[async_trait]
impl<Storage, User, Next> ControlChanMiddleware for TlsOnlyMiddleware<Storage, User, Next>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Next: ControlChanMiddleware,
{
    async fn handle(&mut self, event: Event) -> Result<Reply, ControlChanError> {
        let gated = self.tls_only && matches!(&event, Event::Command(cmd) if !cmd.is_auth_exempt());
        if gated {
            let secure = {
                let session = self.session.lock().await;
                session.cmd_tls
            };
            if !secure {
                return Ok(Reply::new(ReplyCode::ProtocolNotSupported, "A TLS connection is required; use AUTH TLS first"));
            }
        }
        self.next.handle(event).await
    }
}
