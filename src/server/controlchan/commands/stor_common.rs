//! Shared machinery for STOR and APPE: both open a destination, pair it with
//! the data socket and hand the control loop an upload job; they differ only
//! in the append flag.

use crate::{
    auth::UserDetail,
    server::{
        controlchan::{Reply, ReplyCode, error::ControlChanError, handler::CommandContext},
        datachan::{self, DataJob},
    },
    storage::StorageBackend,
};
use std::sync::Arc;

pub(super) async fn prepare_upload<Storage, User>(args: CommandContext<Storage, User>, path_arg: String, append: bool) -> Result<Reply, ControlChanError>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    let mut session = args.session.lock().await;
    let storage = Arc::clone(&session.storage);
    let user_arc = Arc::clone(&session.user);
    let user = match user_arc.as_ref() {
        Some(u) => u,
        None => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::IllegalState)),
    };
    let virt = session.virtual_path(&path_arg);
    let backend = session.backend_path(&path_arg);

    // In slurp mode the destination is opened at completion time; otherwise
    // open it now so an unwritable destination fails before the 150.
    let sink = if args.transfer.use_write_file {
        None
    } else {
        match storage.put(user, &backend, append).await {
            Ok(sink) => Some(sink),
            Err(err) => {
                drop(session.take_data_chan());
                slog::info!(args.logger, "STOR: could not open {}: {}", virt, err);
                return Ok((&err).into());
            }
        }
    };

    let chan = session.take_data_chan();
    let tls = if session.data_tls { args.tls_config.clone() } else { None };
    let socket = match datachan::acquire(chan, tls, &args.logger).await {
        Ok(socket) => socket,
        Err(reply) => return Ok(reply),
    };

    session.data_job = Some(match sink {
        Some(sink) => DataJob::Stor { socket, sink, path: virt },
        None => DataJob::StorSlurp {
            socket,
            backend_path: backend,
            path: virt,
            append,
            max: args.transfer.upload_max_slurp_size,
        },
    });
    Ok(Reply::new(ReplyCode::FileStatusOkay, "Ok to send data"))
}
