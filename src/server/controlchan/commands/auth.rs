//! The RFC 2228 Authentication/Security Mechanism (`AUTH`) command.
//
// Announces the upgrade of the control channel to TLS. The handler only
// validates and answers 234; the control loop performs the actual handshake
// right after the reply has been flushed, because the next bytes on the wire
// belong to the TLS client hello.

use crate::{
    auth::UserDetail,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            Command, Reply, ReplyCode,
            commands::AuthParam,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Auth;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Auth
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let protocol = match args.parsed_command {
            Command::Auth { protocol } => protocol,
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        if !args.tls_configured {
            return Ok(Reply::new(ReplyCode::CommandNotImplemented, "TLS is not configured on this server"));
        }
        let already_secure = {
            let session = args.session.lock().await;
            session.cmd_tls
        };
        if already_secure {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "Control channel is already secure"));
        }
        match protocol {
            AuthParam::Tls => {
                if let Err(err) = args.tx_control_chan.send(ControlChanMsg::SecureControlChannel).await {
                    slog::warn!(args.logger, "AUTH: could not send internal message: {}", err);
                    return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError));
                }
                Ok(Reply::new(ReplyCode::AuthOkayNoDataNeeded, "Honored"))
            }
            AuthParam::Ssl => Ok(Reply::new(
                ReplyCode::CommandNotImplementedForParameter,
                "Only AUTH TLS is supported",
            )),
        }
    }
}
