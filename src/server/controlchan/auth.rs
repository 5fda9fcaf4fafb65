use crate::{
    auth::UserDetail,
    server::{
        Event, Reply, ReplyCode, SessionState,
        controlchan::{error::ControlChanError, middleware::ControlChanMiddleware},
        session::SharedSession,
    },
    storage::StorageBackend,
};

use async_trait::async_trait;

// AuthMiddleware ensures the user is authenticated before he can do much
// else.
pub struct AuthMiddleware<Storage, User, Next>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Next: ControlChanMiddleware,
{
    pub session: SharedSession<Storage, User>,
    pub next: Next,
}

#[async_trait]
impl<Storage, User, Next> ControlChanMiddleware for AuthMiddleware<Storage, User, Next>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
    Next: ControlChanMiddleware,
{
    async fn handle(&mut self, event: Event) -> Result<Reply, ControlChanError> {
        // internal messages and commands exempt from auth checks pass
        // straight through.
        let gated = matches!(&event, Event::Command(cmd) if !cmd.is_auth_exempt());
        if gated {
            let session_state = {
                let session = self.session.lock().await;
                session.state
            };
            if session_state != SessionState::WaitCmd {
                return Ok(Reply::new(ReplyCode::NotLoggedIn, "Not logged in"));
            }
        }
        self.next.handle(event).await
    }
}
