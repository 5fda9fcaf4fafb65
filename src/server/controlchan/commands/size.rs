//! The RFC 3659 File Size (`SIZE`) command

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Command, Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::{Metadata, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Size;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Size
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let file = match &args.parsed_command {
            Command::Size { file } => file.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user_arc = Arc::clone(&session.user);
        let user = match user_arc.as_ref() {
            Some(u) => u,
            None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
        };
        let backend = session.backend_path(&file);
        match storage.metadata(user, &backend).await {
            Ok(meta) => Ok(Reply::new_with_string(ReplyCode::FileStatus, meta.len().to_string())),
            Err(err) => {
                slog::info!(args.logger, "SIZE failed: {}", err);
                Ok((&err).into())
            }
        }
    }
}
