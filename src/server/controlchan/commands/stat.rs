//! The RFC 959 Status (`STAT`) command
//
// With a path argument this behaves like LIST, except the listing travels
// over the control channel in a 213 multi-line reply and no data connection
// is involved. Without an argument the current directory is listed.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        listing, path,
    },
    storage::StorageBackend,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Stat;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Stat
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let arg = match &args.parsed_command {
            Command::Stat { path } => path.clone().unwrap_or_default(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user = Arc::clone(&session.user);

        let target = path::strip_options(&arg);
        let virt = session.virtual_path(target);
        let backend = session.backend_path(target);

        let entries = match listing::gather(&storage, &user, &backend, &args.listing).await {
            Ok(entries) => entries,
            Err(err) => {
                slog::info!(args.logger, "STAT of {} failed: {}", virt, err);
                return Ok((&err).into());
            }
        };
        let mut lines = vec!["Status follows".to_string()];
        lines.extend(listing::format_detailed(&entries, &args.name_resolver, &args.listing).await);
        lines.push("End of status".to_string());
        Ok(Reply::new_multiline(ReplyCode::FileStatus, lines))
    }
}
