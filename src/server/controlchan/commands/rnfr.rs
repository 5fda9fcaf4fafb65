//! The RFC 959 Rename From (`RNFR`) command
//
// First half of the rename two-step: the path is remembered until the next
// RNTO consumes it.

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
pub struct Rnfr;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rnfr
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let file = match &args.parsed_command {
            Command::Rnfr { file } => file.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        session.rename_from = Some(file);
        Ok(Reply::new(ReplyCode::FileActionPending, "Ready for destination name"))
    }
}
