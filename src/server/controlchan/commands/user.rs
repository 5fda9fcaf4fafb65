//! The RFC 959 User Name (`USER`) command

use crate::{
    auth::UserDetail,
    server::{
        SessionState,
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct User;

#[async_trait]
impl<Storage, Usr> CommandHandler<Storage, Usr> for User
where
    Usr: UserDetail + 'static,
    Storage: StorageBackend<Usr> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, Usr>) -> Result<Reply, ControlChanError> {
        let username = match &args.parsed_command {
            Command::User { username } => username.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;

        // In tls-only mode an unencrypted login attempt gets the friendlier
        // explanation rather than the generic gate reply.
        if args.tls_only && !session.cmd_tls {
            return Ok(Reply::new(
                ReplyCode::NotLoggedIn,
                "This server requires TLS; issue AUTH TLS before logging in",
            ));
        }

        match session.state {
            SessionState::New | SessionState::WaitPass => {
                let username_str = std::str::from_utf8(&username)?;
                match args.authenticator.accept_user(username_str).await {
                    Ok(()) => {
                        session.username = Some(username_str.to_string());
                        session.state = SessionState::WaitPass;
                        Ok(Reply::new(ReplyCode::NeedPassword, "User name okay, need password."))
                    }
                    Err(err) => {
                        slog::info!(args.logger, "USER rejected: {}", err);
                        Ok(Reply::new(ReplyCode::NotLoggedIn, "Invalid username"))
                    }
                }
            }
            SessionState::WaitCmd => Ok(Reply::new(
                ReplyCode::BadCommandSequence,
                "Please create a new connection to switch user",
            )),
        }
    }
}
