//! The RFC 959 Store (`STOR`) command
//
// This command causes the server-DTP to accept the data transferred via the
// data connection and to store the data as a file at the server site. If the
// file exists its contents are replaced; a new file is created otherwise.

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
pub struct Stor;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stor
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path = match &args.parsed_command {
            Command::Stor { path } => path.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        prepare_upload(args, path, false).await
    }
}
