use super::command::Command;
use crate::server::chancomms::ControlChanMsg;

// An event on the control channel: either a command from the client or a
// message from elsewhere in the server.
#[derive(Debug)]
pub enum Event {
    Command(Command),
    // Middlewares must wave internal messages through; the control loop
    // handles them itself and does not route them through the chain today.
    #[allow(dead_code)]
    InternalMsg(ControlChanMsg),
}
