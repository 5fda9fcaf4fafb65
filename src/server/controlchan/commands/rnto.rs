//! The RFC 959 Rename To (`RNTO`) command
//
// Second half of the rename two-step. The stored RNFR path is consumed
// whether the rename succeeds or not.

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
pub struct Rnto;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Rnto
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let target = match &args.parsed_command {
            Command::Rnto { file } => file.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        let source = match session.rename_from.take() {
            Some(source) => source,
            None => return Ok(Reply::new(ReplyCode::BadCommandSequence, "Issue RNFR first")),
        };
        let storage = Arc::clone(&session.storage);
        let user_arc = Arc::clone(&session.user);
        let user = match user_arc.as_ref() {
            Some(u) => u,
            None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
        };
        let from_virt = session.virtual_path(&source);
        let from = session.backend_path(&source);
        let to_virt = session.virtual_path(&target);
        let to = session.backend_path(&target);
        match storage.rename(user, &from, &to).await {
            Ok(()) => {
                args.data_listener
                    .receive_data_event(
                        DataEvent::Renamed {
                            from: from_virt,
                            to: to_virt,
                        },
                        session.event_meta(),
                    )
                    .await;
                Ok(Reply::new(ReplyCode::FileActionOkay, "Renamed"))
            }
            Err(err) => {
                slog::info!(args.logger, "RNTO failed: {}", err);
                Ok((&err).into())
            }
        }
    }
}
