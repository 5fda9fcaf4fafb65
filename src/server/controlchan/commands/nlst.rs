//! The RFC 959 Name List (`NLST`) command
//
// Like LIST, but the data channel carries bare names only, one per line, fit
// for machine consumption.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        datachan::{self, DataJob},
        listing, path,
    },
    storage::StorageBackend,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Nlst;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Nlst
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let arg = match &args.parsed_command {
            Command::Nlst { path } => path.clone().unwrap_or_default(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user = Arc::clone(&session.user);

        let target = path::strip_options(&arg);
        let virt = session.virtual_path(target);
        let backend = session.backend_path(target);

        let entries = match listing::gather(&storage, &user, &backend, &args.listing).await {
            Ok(entries) => entries,
            Err(err) => {
                drop(session.take_data_chan());
                slog::info!(args.logger, "NLST of {} failed: {}", virt, err);
                return Ok((&err).into());
            }
        };
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let mut data = names.join("\r\n").into_bytes();
        if !data.is_empty() {
            data.extend_from_slice(b"\r\n");
        }

        let chan = session.take_data_chan();
        let tls = if session.data_tls { args.tls_config.clone() } else { None };
        let socket = match datachan::acquire(chan, tls, &args.logger).await {
            Ok(socket) => socket,
            Err(reply) => return Ok(reply),
        };

        session.data_job = Some(DataJob::SendLines { socket, data, path: virt });
        Ok(Reply::new(ReplyCode::FileStatusOkay, "Here comes the directory listing"))
    }
}
