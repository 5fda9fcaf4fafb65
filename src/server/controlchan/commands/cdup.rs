//! The RFC 959 Change To Parent Directory (`CDUP`) command
//
// A special case of CWD; from the root the parent is the root itself, so
// this cannot fail.

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
pub struct Cdup;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Cdup
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let mut session = args.session.lock().await;
        session.cwd = path::with_cwd(&session.cwd, "..");
        Ok(Reply::new_with_string(
            ReplyCode::FileActionOkay,
            format!("\"{}\" is current directory", path::escape_quotes(&session.cwd)),
        ))
    }
}
