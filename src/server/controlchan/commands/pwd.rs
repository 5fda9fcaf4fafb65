//! The RFC 959 Print Working Directory (`PWD`) command
//
// The 257 reply carries the path between double quotes; an embedded quote is
// doubled, per the RFC 959 appendix.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        path,
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Pwd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pwd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        Ok(Reply::new_with_string(
            ReplyCode::DirCreated,
            format!("\"{}\" is current directory", path::escape_quotes(&session.cwd)),
        ))
    }
}
