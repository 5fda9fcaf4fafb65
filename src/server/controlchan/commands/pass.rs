//! The RFC 959 Password (`PASS`) command
//
// Closes the login handshake: the credentials go to the authenticator, and
// on success the session gets its storage view, its root and its initial
// working directory in one go. A failure while resolving those is a server
// side problem, not a credential problem, and ends the session with a 421.

use crate::{
    auth::UserDetail,
    notification::PresenceEvent,
    server::{
        SessionState,
        chancomms::ControlChanMsg,
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        path,
    },
    storage::StorageBackend,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Pass;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pass
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let password = match &args.parsed_command {
            Command::Pass { password } => password.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        if session.state != SessionState::WaitPass {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "Bad sequence of commands."));
        }
        let username = match session.username.clone() {
            Some(u) => u,
            None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
        };
        let password_str = std::str::from_utf8(password.as_bytes())?;

        let user_detail = match args.authenticator.authenticate(&username, password_str).await {
            Ok(user_detail) => user_detail,
            Err(err) => {
                slog::info!(args.logger, "PASS: authentication failed for {}: {}", username, err);
                session.state = SessionState::New;
                session.username = None;
                return Ok(Reply::new(ReplyCode::NotLoggedIn, "Authentication failed"));
            }
        };

        if !user_detail.account_enabled() {
            slog::info!(args.logger, "PASS: account disabled: {}", username);
            session.state = SessionState::New;
            session.username = None;
            return Ok(Reply::new(ReplyCode::NotLoggedIn, "Account disabled"));
        }

        // Install the user's storage view, root and initial cwd atomically:
        // a failure on any step leaves the session unauthenticated and takes
        // the connection down with a 421.
        let installed = async {
            let root = args.root_resolver.root(&user_detail).await?;
            let cwd = args.root_resolver.initial_cwd(&user_detail).await?;
            Ok::<(String, String), std::io::Error>((root, cwd))
        }
        .await;
        let (root, cwd) = match installed {
            Ok(paths) => paths,
            Err(err) => {
                slog::error!(args.logger, "PASS: resolving root/cwd failed for {}: {}", username, err);
                let _ = args.tx_control_chan.send(ControlChanMsg::ExitControlLoop).await;
                return Ok(Reply::new(ReplyCode::ServiceNotAvailable, "Service not available, closing control connection"));
            }
        };
        match Arc::get_mut(&mut session.storage).map(|s| s.enter(&user_detail)) {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                slog::error!(args.logger, "PASS: storage refused {}: {}", username, err);
                let _ = args.tx_control_chan.send(ControlChanMsg::ExitControlLoop).await;
                return Ok(Reply::new(ReplyCode::ServiceNotAvailable, "Service not available, closing control connection"));
            }
            None => {
                slog::error!(args.logger, "PASS: failed to lock Session::storage");
                let _ = args.tx_control_chan.send(ControlChanMsg::ExitControlLoop).await;
                return Ok(Reply::new(ReplyCode::ServiceNotAvailable, "Service not available, closing control connection"));
            }
        }

        session.root = path::with_cwd("/", &root);
        session.cwd = path::with_cwd("/", &cwd);
        session.user = Arc::new(Some(user_detail));
        session.state = SessionState::WaitCmd;

        let meta = session.event_meta();
        args.presence_listener.receive_presence_event(PresenceEvent::LoggedIn, meta).await;

        Ok(Reply::new(ReplyCode::UserLoggedIn, "User logged in, proceed."))
    }
}
