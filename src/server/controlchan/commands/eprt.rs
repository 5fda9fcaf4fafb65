//! The RFC 2428 Extended Data Port (`EPRT`) command
//
// The argument is `<d><proto><d><addr><d><port><d>` where `<d>` is an
// arbitrary delimiter character. Only protocol 1 (IPv4) is supported;
// protocol 2 (IPv6) draws the RFC's 522 refusal.

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
pub struct Eprt;

pub(super) enum EprtArg {
    Ipv4(SocketAddr),
    UnsupportedFamily,
    Invalid,
}

pub(super) fn parse_eprt_argument(arg: &str) -> EprtArg {
    let arg = arg.trim();
    let delim = match arg.chars().next() {
        Some(d) => d,
        None => return EprtArg::Invalid,
    };
    let fields: Vec<&str> = arg.split(delim).collect();
    // Splitting "|1|host|port|" on '|' yields ["", "1", "host", "port", ""].
    if fields.len() != 5 || !fields[0].is_empty() || !fields[4].is_empty() {
        return EprtArg::Invalid;
    }
    match fields[1] {
        "1" => {}
        "2" => return EprtArg::UnsupportedFamily,
        _ => return EprtArg::Invalid,
    }
    let ip: Ipv4Addr = match fields[2].parse() {
        Ok(ip) => ip,
        Err(_) => return EprtArg::Invalid,
    };
    let port: u32 = match fields[3].parse() {
        Ok(p) => p,
        Err(_) => return EprtArg::Invalid,
    };
    if port == 0 || port > u32::from(u16::MAX) {
        return EprtArg::Invalid;
    }
    EprtArg::Ipv4(SocketAddr::V4(SocketAddrV4::new(ip, port as u16)))
}

#[async_trait]
impl<Storage, User> CommandHandler<Storage, User> for Eprt
where
    User: UserDetail + 'static,
    Storage: StorageBackend<User> + 'static,
{
    async fn handle(&self, args: CommandContext<Storage, User>) -> Result<Reply, ControlChanError> {
        let addr = match &args.parsed_command {
            Command::Eprt { addr } => addr.clone(),
            _ => return Err(ControlChanError::new(crate::server::ControlChanErrorKind::InternalServerError)),
        };
        let mut session = args.session.lock().await;
        if !matches!(session.data_chan, DataChan::None) {
            return Ok(Reply::new(ReplyCode::BadCommandSequence, "Bad sequence of commands."));
        }
        match parse_eprt_argument(&addr) {
            EprtArg::Ipv4(addr) => {
                session.data_chan = DataChan::Active { addr, socket: None };
                Ok(Reply::new(ReplyCode::CommandOkay, "OK"))
            }
            EprtArg::UnsupportedFamily => Ok(Reply::new(ReplyCode::ProtocolNotSupported, "Network protocol not supported, use (1)")),
            EprtArg::Invalid => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Illegal EPRT command")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EprtArg, parse_eprt_argument};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_ipv4_form() {
        match parse_eprt_argument("|1|132.235.1.2|6275|") {
            EprtArg::Ipv4(addr) => assert_eq!(addr.to_string(), "132.235.1.2:6275"),
            _ => panic!("expected an IPv4 address"),
        }
    }

    #[test]
    fn ipv6_family_is_refused() {
        assert!(matches!(parse_eprt_argument("|2|::1|6275|"), EprtArg::UnsupportedFamily));
    }

    #[test]
    fn bad_forms_are_invalid() {
        assert!(matches!(parse_eprt_argument(""), EprtArg::Invalid));
        assert!(matches!(parse_eprt_argument("|1|132.235.1.2|"), EprtArg::Invalid));
        assert!(matches!(parse_eprt_argument("|1|132.235.1.2|0|"), EprtArg::Invalid));
        assert!(matches!(parse_eprt_argument("|1|132.235.1.2|70000|"), EprtArg::Invalid));
        assert!(matches!(parse_eprt_argument("|9|132.235.1.2|6275|"), EprtArg::Invalid));
    }
}
