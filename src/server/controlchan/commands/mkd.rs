//! The RFC 959 Make Directory (`MKD`) command

use crate::{
    auth::UserDetail,
    notification::DataEvent,
    server::{
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        path,
    },
    storage::StorageBackend,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Mkd;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Mkd
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let target = match &args.parsed_command {
            Command::Mkd { path } => path.clone(),
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
        match storage.mkd(user, &backend).await {
            Ok(()) => {
                args.data_listener
                    .receive_data_event(DataEvent::MadeDir { path: virt.clone() }, session.event_meta())
                    .await;
                Ok(Reply::new_with_string(
                    ReplyCode::DirCreated,
                    format!("\"{}\" directory created", path::escape_quotes(&virt)),
                ))
            }
            Err(err) => {
                slog::info!(args.logger, "MKD failed: {}", err);
                Ok((&err).into())
            }
        }
    }
}
