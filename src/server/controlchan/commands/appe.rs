//! The RFC 959 Append (`APPE`) command
//
// Like STOR, but the received data is appended to the file when it already
// exists.

use super::stor_common::prepare_upload;
use crate::{
    auth::UserDetail,
    server::controlchan::{
        Command, Reply,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Appe;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Appe
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command {
            Command::Appe { path } => path.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        prepare_upload(args, path, true).await
    }
}
