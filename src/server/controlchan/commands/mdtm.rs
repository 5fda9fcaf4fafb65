//! The RFC 3659 Modify Time (`MDTM`) command
//
// This command can be used to determine when a file in the server NVFS was
// last modified.

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
use chrono::offset::Utc;
use chrono::DateTime;
use std::sync::Arc;

const RFC3659_TIME: &str = "%Y%m%d%H%M%S";

#[derive(Debug)]
pub struct Mdtm;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mdtm
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let file = match &args.parsed_command {
            Command::Mdtm { file } => file.clone(),
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
            Ok(meta) => match meta.modified() {
                Ok(mtime) => Ok(Reply::new_with_string(
                    ReplyCode::FileStatus,
                    DateTime::<Utc>::from(mtime).format(RFC3659_TIME).to_string(),
                )),
                Err(err) => {
                    slog::info!(args.logger, "MDTM: no modification time: {}", err);
                    Ok((&err).into())
                }
            },
            Err(err) => {
                slog::info!(args.logger, "MDTM failed: {}", err);
                Ok((&err).into())
            }
        }
    }
}
