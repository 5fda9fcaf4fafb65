//! The RFC 2428 Extended Passive Mode (`EPSV`) command
//
// Like PASV, but the reply carries only the port, between vertical bars, so
// it works the same for any address family.

use super::passive_common::reserve_endpoint;
use crate::{
    auth::UserDetail,
    server::controlchan::{
        Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Epsv;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Epsv
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let port = match reserve_endpoint(&args).await {
            Ok(port) => port,
            Err(reply) => return Ok(reply),
        };
        Ok(Reply::new_with_string(
            ReplyCode::EnteringExtendedPassiveMode,
            format!("Entering Extended Passive Mode (|||{}|)", port),
        ))
    }
}
