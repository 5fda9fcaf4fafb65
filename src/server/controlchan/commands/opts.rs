//! The RFC 2389 Options (`OPTS`) command
//
// The only option we know is UTF8, and it can only be switched on: path
// names are UTF-8 either way.

use crate::{
    auth::UserDetail,
    server::controlchan::{
        Command, Reply, ReplyCode,
        error::ControlChanError,
        handler::{CommandContext, CommandHandler},
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Opts;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Opts
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let option = match &args.parsed_command {
            Command::Opts { option } => option.trim().to_uppercase(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        match option.as_str() {
            "UTF8 ON" => Ok(Reply::new(ReplyCode::CommandOkay, "UTF8 is on")),
            _ => Ok(Reply::new(ReplyCode::LocalError, "Option not understood")),
        }
    }
}
