//! The RFC 2228 Data Channel Protection Level (`PROT`) command.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Command, Reply, ReplyCode,
        commands::ProtParam,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Prot;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Prot
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let param = match args.parsed_command {
            Command::Prot { param } => param,
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        if !session.cmd_tls {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "PROT requires a secure control connection"));
        }
        if !session.pbsz_received {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "PBSZ must be issued first"));
        }
        match param {
            ProtParam::Private => {
                session.data_tls = true;
                Ok(Reply::new(ReplyCode::CommandOkay, "PROT OK. Securing data channel"))
            }
            ProtParam::Clear | ProtParam::Safe | ProtParam::Confidential => {
                Ok(Reply::new(ReplyCode::ProtLevelNotSupported, "Protection level not supported"))
            }
        }
    }
}
