//! The RFC 959 Retrieve (`RETR`) command
//
// This command causes the server-DTP to transfer a copy of the file,
// specified in the pathname, to the user-DTP at the other end of the data
// connection. The file is opened before anything touches the data channel,
// so a missing file produces a clean 550 with no data-channel activity.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
        datachan::{self, DataJob},
    },
    storage::{ErrorKind, StorageBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug)]
pub struct Retr;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Retr
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let path_arg = match &args.parsed_command {
            Command::Retr { path } => path.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        let storage = Arc::clone(&session.storage);
        let user_arc = Arc::clone(&session.user);
        let user = match user_arc.as_ref() {
            Some(u) => u,
            None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
        };
        let virt = session.virtual_path(&path_arg);
        let backend = session.backend_path(&path_arg);

        let job_source = if args.transfer.use_read_file {
            storage.read_file(user, &backend).await.map(Source::Buffered)
        } else {
            storage.get(user, &backend).await.map(Source::Stream)
        };
        let source = match job_source {
            Ok(source) => source,
            Err(err) => {
                // The reservation is spent even though no transfer ran.
                drop(session.take_data_chan());
                slog::info!(args.logger, "RETR: could not open {}: {}", virt, err);
                return Ok(match err.kind() {
                    ErrorKind::PermanentFileNotAvailable => Reply::new(ReplyCode::FileError, "Not Found"),
                    _ => Reply::new(ReplyCode::FileError, "Not Accessible"),
                });
            }
        };

        let chan = session.take_data_chan();
        let tls = if session.data_tls { args.tls_config.clone() } else { None };
        let socket = match datachan::acquire(chan, tls, &args.logger).await {
            Ok(socket) => socket,
            Err(reply) => return Ok(reply),
        };

        session.data_job = Some(match source {
            Source::Stream(reader) => DataJob::Retr {
                socket,
                source: reader,
                path: virt,
            },
            Source::Buffered(contents) => DataJob::RetrBuffered { socket, contents, path: virt },
        });
        Ok(Reply::new_with_string(
            ReplyCode::FileStatusOkay,
            format!("Opening {} mode data connection", session.mode.label()),
        ))
    }
}

enum Source {
    Stream(Box<dyn tokio::io::AsyncRead + Send + Sync + Unpin>),
    Buffered(Vec<u8>),
}
