//! The RFC 959 Change Working Directory (`CWD`) command

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        path,
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Cwd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Cwd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let target = match &args.parsed_command {
            Command::Cwd { path } => path.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user = Arc::clone(&session.user);
        let user = match user.as_ref() {
            Some(u) => u,
            None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
        };
        let virt = session.virtual_path(&target);
        let backend = session.backend_path(&target);
        match storage.metadata(user, &backend).await {
            Ok(meta) if meta.is_dir() => {
                session.cwd = virt.clone();
                Ok(Reply::new_with_string(
                    ReplyCode::FileActionOkay,
                    format!("\"{}\" is current directory", path::escape_quotes(&virt)),
                ))
            }
            Ok(_) => Ok(Reply::new(ReplyCode::FileError, "Not a directory")),
            Err(_) => Ok(Reply::new(ReplyCode::FileError, "Folder not found")),
        }
    }
}
