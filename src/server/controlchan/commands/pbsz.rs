//! The RFC 2228 Protection Buffer Size (`PBSZ`) command.
//
// With TLS the only meaningful buffer size is zero, so any other value draws
// a corrective reply. Seeing PBSZ at all is what later entitles the client
// to PROT P.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Command, Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Pbsz;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pbsz
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let size = match &args.parsed_command {
            Command::Pbsz { size } => size.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        if !session.cmd_tls {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "PBSZ requires a secure control connection"));
        }
        session.pbsz_received = true;
        if size == "0" {
            Ok(Reply::new(ReplyCode::CommandOkay, "OK"))
        } else {
            Ok(Reply::new(ReplyCode::CommandOkay, "PBSZ=0"))
        }
    }
}
