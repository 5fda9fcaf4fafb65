//! The RFC 959 Representation Type (`TYPE`) command
//
// We transfer raw bytes whatever the client asks for; the selected type only
// changes the wording of the 150 reply that opens a RETR.

use crate::{
    auth::UserDetail,
    server::{
        TransferMode,
        controlchan::{
            Command, Reply, ReplyCode,
            commands::TypeParam,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Type;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Type
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let param = match args.parsed_command {
            Command::Type { param } => param,
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        match param {
            TypeParam::Ascii => {
                let mut session = args.session.lock().await;
                session.mode = TransferMode::Ascii;
                Ok(Reply::new(ReplyCode::CommandOkay, "Switching to ASCII mode"))
            }
            TypeParam::Image => {
                let mut session = args.session.lock().await;
                session.mode = TransferMode::Image;
                Ok(Reply::new(ReplyCode::CommandOkay, "Switching to Binary mode"))
            }
            TypeParam::Other => Ok(Reply::new(ReplyCode::CommandOkayNotImplemented, "Command not implemented for that parameter")),
        }
    }
}
