//! The RFC 959 Data Port (`PORT`) command
//
// The argument is a HOST-PORT specification for the data port to be used in
// data connection:
//
//     PORT h1,h2,h3,h4,p1,p2
//
// where h1 is the high order 8 bits of the internet host address and the
// port is p1 * 256 + p2. Once accepted, PASV is refused until a transfer
// resets the data channel.

use crate::{
    auth::UserDetail,
    server::{
        DataChan,
        controlchan::{
            Command, Reply, ReplyCode,
            error::ControlChanError,
            handler::{CommandContext, CommandHandler},
        },
    },
    storage::StorageBackend,
};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

#[derive(Debug)]
pub struct Port;

pub(super) fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return None;
    }
    let mut octets = [0u8; 6];
    for (i, part) in parts.iter().enumerate() {
        octets[i] = part.trim().parse::<u8>().ok()?;
    }
    let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let port = (u16::from(octets[4]) << 8) | u16::from(octets[5]);
    if port == 0 {
        return None;
    }
    Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Port
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let addr = match &args.parsed_command {
            Command::Port { addr } => addr.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        if !matches!(session.data_chan, DataChan::None) {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "Bad sequence of commands."));
        }
        match parse_port_argument(&addr) {
            Some(addr) => {
                session.data_chan = DataChan::Active { addr, socket: None };
                Ok(Reply::new(ReplyCode::CommandOkay, "OK"))
            }
            None => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Illegal PORT command")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_port_argument;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_the_six_comma_form() {
        let addr = parse_port_argument("127,0,0,1,20,0").unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:5120");
        let addr = parse_port_argument("10,0,0,2,171,229").unwrap();
        assert_eq!(addr.to_string(), "10.0.0.2:44005");
    }

    #[test]
    fn refuses_bad_forms() {
        assert!(parse_port_argument("127,0,0,1,20").is_none());
        assert!(parse_port_argument("256,0,0,1,20,0").is_none());
        assert!(parse_port_argument("127,0,0,1,0,0").is_none());
        assert!(parse_port_argument("not,an,address,at,all,?").is_none());
    }
}
