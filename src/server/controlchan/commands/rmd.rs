//! The RFC 959 Remove Directory (`RMD`) command

use crate::{
    auth::UserDetail,
    notification::DataEvent,
    server::controlchan::{
        Command, Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Rmd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rmd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let target = match &args.parsed_command {
            Command::Rmd { path } => path.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user_arc = Arc::clone(&session.user);
        let user = match user_arc.as_ref() {
            Some(u) => u,
            None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
        };
        let virt = session.virtual_path(&target);
        let backend = session.backend_path(&target);
        match storage.rmd(user, &backend).await {
            Ok(()) => {
                args.data_listener
                    .receive_data_event(DataEvent::RemovedDir { path: virt }, session.event_meta())
                    .await;
                Ok(Reply::new(ReplyCode::FileActionOkay, "Folder removed"))
            }
            Err(err) => {
                slog::info!(args.logger, "RMD failed: {}", err);
                Ok((&err).into())
            }
        }
    }
}
