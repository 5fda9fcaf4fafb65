//! Contains code pertaining to the communication between the command
//! handlers and the per connection control loop.

/// Messages a command handler can send back to its control loop.
#[derive(Debug, PartialEq, Eq)]
pub enum ControlChanMsg {
    /// The control channel should be upgraded to TLS after the current reply
    /// has been written.
    SecureControlChannel,
    /// The control loop should write the current reply and exit.
    ExitControlLoop,
}
