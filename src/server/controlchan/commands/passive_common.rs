//! Shared machinery for the PASV and EPSV handlers: both reserve a passive
//! endpoint from the pool and differ only in how they announce it.

use crate::{
    auth::UserDetail,
    server::{
        DataChan,
        controlchan::{Reply, ReplyCode, handler::CommandContext},
    },
    storage::StorageBackend,
};

// Reserves a passive endpoint for this session. By the time this returns the
// listener is bound and listening, so announcing the port to the client
// cannot race the bind. The PASV/PORT exclusivity rule is enforced here.
pub(super) async fn reserve_endpoint<Storage, User>(args: &CommandContext<Storage, User>) -> Result<u16, Reply>
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    let mut session = args.session.lock().await;
    if !matches!(session.data_chan, DataChan::None) {
        return Err(Reply::new(ReplyCode::BadCommandSequence, "Bad sequence of commands."));
    }
    let tls = if session.data_tls { args.tls_config.clone() } else { None };
    match args.pool.create_data_connection(session.source.ip(), tls).await {
        Ok(conn) => {
            let port = conn.port();
            session.data_chan = DataChan::PassivePending(conn);
            Ok(port)
        }
        Err(err) => {
            slog::warn!(args.logger, "Could not reserve a passive endpoint: {}", err);
            Err(Reply::new(
                ReplyCode::ServiceNotAvailable,
                "Server was unable to open passive connection listener",
            ))
        }
    }
}
