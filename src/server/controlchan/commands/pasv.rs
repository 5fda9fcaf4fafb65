//! The RFC 959 Passive (`PASV`) command
//
// This command requests the server-DTP to "listen" on a data port (which is
// not its default data port) and to wait for a connection rather than
// initiate one upon receipt of a transfer command. The response to this
// command includes the host and port address this server is listening on.

use super::passive_common::reserve_endpoint;
use crate::{
    auth::UserDetail,
    options::passive_reply_ip,
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Pasv;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Pasv
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let ip = match passive_reply_ip(args.passive_host, args.local_addr.ip()) {
            Some(ip) => ip,
            None => {
                slog::error!(args.logger, "PASV: no IPv4 address to announce for {}", args.local_addr);
                return Ok(Reply::new(ReplyCode::ServiceNotAvailable, "Server was unable to open passive connection listener"));
            }
        };
        let port = match reserve_endpoint(&args).await {
            Ok(port) => port,
            Err(reply) => return Ok(reply),
        };
        let octets = ip.octets();
        let p1 = port >> 8;
        let p2 = port & 0xff;
        Ok(Reply::new_with_string(
            ReplyCode::EnteringPassiveMode,
            format!("Entering Passive Mode ({},{},{},{},{},{})", octets[0], octets[1], octets[2], octets[3], p1, p2),
        ))
    }
}
