//! The RFC 959 Logout (`QUIT`) command.
//
// This command terminates a USER and the server closes the control
// connection. An unexpected close on the control connection will cause the
// server to take the effective action of an abort (ABOR) and a logout.

use crate::{
    auth::UserDetail,
    notification::PresenceEvent,
    server::{
        chancomms::ControlChanMsg,
        controlchan::{
            Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
    },
    storage::StorageBackend,
};
use async_trait::async_trait;

#[derive(Debug)]
pub struct Quit;

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Quit
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let meta = {
            let session = args.session.lock().await;
            session.event_meta()
        };
        args.presence_listener.receive_presence_event(PresenceEvent::LoggedOut, meta).await;

        // Let the control loop know it can exit after writing the reply.
        if let Err(send_res) = args.tx_control_chan.send(ControlChanMsg::ExitControlLoop).await {
            slog::warn!(args.logger, "QUIT: could not send internal message: {}", send_res);
        }
        Ok(Reply::new(ReplyCode::ClosingControlConnection, "Bye!"))
    }
}
