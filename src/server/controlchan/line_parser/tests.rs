use super::error::ParseErrorKind;
use super::parse;
use crate::server::controlchan::command::Command;
use crate::server::controlchan::commands::{AuthParam, ProtParam, TypeParam};
use crate::server::password::Password;

use bytes::Bytes;
use pretty_assertions::assert_eq;

#[test]
fn parse_user_cmd_crnl() {
    let input = "USER Dolores\r\n";
    assert_eq!(
        parse(input).unwrap(),
        Command::User {
            username: Bytes::from("Dolores")
        }
    );
}

// According to RFC 959, verbs should be interpreted without regard to case
#[test]
fn parse_user_cmd_mixed_case() {
    let input = "uSeR Dolores\r\n";
    assert_eq!(
        parse(input).unwrap(),
        Command::User {
            username: Bytes::from("Dolores")
        }
    );
}

// Not all clients send the CR; be tolerant of that.
#[test]
fn parse_user_cmd_nl() {
    let input = "USER Dolores\n";
    assert_eq!(
        parse(input).unwrap(),
        Command::User {
            username: Bytes::from("Dolores")
        }
    );
}

// A naked CR in the middle of a line is invalid.
#[test]
fn parse_user_cmd_cr() {
    let input = "USER Dolores\r";
    assert_eq!(parse(input).unwrap_err().kind(), ParseErrorKind::InvalidEol);
}

#[test]
fn parse_user_without_name_is_invalid() {
    let input = "USER \r\n";
    assert_eq!(parse(input).unwrap_err().kind(), ParseErrorKind::InvalidCommand);
}

#[test]
fn parse_pass_cmd() {
    let input = "PASS s3cr3t\r\n";
    assert_eq!(
        parse(input).unwrap(),
        Command::Pass {
            password: Password::new("s3cr3t")
        }
    );
}

#[test]
fn parse_quit_and_noop() {
    assert_eq!(parse("QUIT\r\n").unwrap(), Command::Quit);
    assert_eq!(parse("QUIT\n").unwrap(), Command::Quit);
    assert_eq!(parse("NOOP\r\n").unwrap(), Command::Noop);
    assert_eq!(parse("NOOP bla\r\n").unwrap_err().kind(), ParseErrorKind::InvalidCommand);
}

#[test]
fn parse_type() {
    assert_eq!(parse("TYPE I\r\n").unwrap(), Command::Type { param: TypeParam::Image });
    assert_eq!(parse("TYPE A\r\n").unwrap(), Command::Type { param: TypeParam::Ascii });
    assert_eq!(parse("TYPE E\r\n").unwrap(), Command::Type { param: TypeParam::Other });
}

#[test]
fn parse_pasv_epsv() {
    assert_eq!(parse("PASV\r\n").unwrap(), Command::Pasv);
    assert_eq!(parse("PASV foo\r\n").unwrap_err().kind(), ParseErrorKind::InvalidCommand);
    assert_eq!(parse("EPSV\r\n").unwrap(), Command::Epsv);
    assert_eq!(parse("EPSV ALL\r\n").unwrap(), Command::Epsv);
}

#[test]
fn parse_port_keeps_raw_address() {
    assert_eq!(
        parse("PORT 127,0,0,1,20,0\r\n").unwrap(),
        Command::Port {
            addr: "127,0,0,1,20,0".to_string()
        }
    );
    assert_eq!(parse("PORT\r\n").unwrap_err().kind(), ParseErrorKind::InvalidCommand);
}

#[test]
fn parse_eprt_keeps_raw_address() {
    assert_eq!(
        parse("EPRT |1|132.235.1.2|6275|\r\n").unwrap(),
        Command::Eprt {
            addr: "|1|132.235.1.2|6275|".to_string()
        }
    );
}

#[test]
fn parse_list_with_and_without_path() {
    assert_eq!(parse("LIST\r\n").unwrap(), Command::List { path: None });
    assert_eq!(
        parse("LIST -la /pub\r\n").unwrap(),
        Command::List {
            path: Some("-la /pub".to_string())
        }
    );
}

#[test]
fn parse_transfer_commands_need_a_path() {
    assert_eq!(
        parse("RETR file.txt\r\n").unwrap(),
        Command::Retr {
            path: "file.txt".to_string()
        }
    );
    assert_eq!(parse("RETR\r\n").unwrap_err().kind(), ParseErrorKind::InvalidCommand);
    assert_eq!(
        parse("STOR file with spaces.txt\r\n").unwrap(),
        Command::Stor {
            path: "file with spaces.txt".to_string()
        }
    );
    assert_eq!(
        parse("APPE log.txt\r\n").unwrap(),
        Command::Appe {
            path: "log.txt".to_string()
        }
    );
}

#[test]
fn parse_pwd_aliases() {
    assert_eq!(parse("PWD\r\n").unwrap(), Command::Pwd);
    assert_eq!(parse("XPWD\r\n").unwrap(), Command::Pwd);
}

#[test]
fn parse_auth() {
    assert_eq!(parse("AUTH TLS\r\n").unwrap(), Command::Auth { protocol: AuthParam::Tls });
    assert_eq!(parse("auth tls\r\n").unwrap(), Command::Auth { protocol: AuthParam::Tls });
    assert_eq!(parse("AUTH SSL\r\n").unwrap(), Command::Auth { protocol: AuthParam::Ssl });
    assert_eq!(parse("AUTH GSSAPI\r\n").unwrap_err().kind(), ParseErrorKind::InvalidCommand);
}

#[test]
fn parse_prot_levels() {
    assert_eq!(parse("PROT P\r\n").unwrap(), Command::Prot { param: ProtParam::Private });
    assert_eq!(parse("PROT C\r\n").unwrap(), Command::Prot { param: ProtParam::Clear });
    assert_eq!(parse("PROT S\r\n").unwrap(), Command::Prot { param: ProtParam::Safe });
    assert_eq!(
        parse("PROT E\r\n").unwrap(),
        Command::Prot {
            param: ProtParam::Confidential
        }
    );
    assert_eq!(parse("PROT Z\r\n").unwrap_err().kind(), ParseErrorKind::InvalidCommand);
}

#[test]
fn parse_pbsz_keeps_size() {
    assert_eq!(parse("PBSZ 0\r\n").unwrap(), Command::Pbsz { size: "0".to_string() });
    assert_eq!(parse("PBSZ 1024\r\n").unwrap(), Command::Pbsz { size: "1024".to_string() });
}

#[test]
fn parse_rename_pair() {
    assert_eq!(
        parse("RNFR old.txt\r\n").unwrap(),
        Command::Rnfr {
            file: "old.txt".to_string()
        }
    );
    assert_eq!(
        parse("RNTO new.txt\r\n").unwrap(),
        Command::Rnto {
            file: "new.txt".to_string()
        }
    );
}

#[test]
fn parse_unknown_verb_becomes_other() {
    assert_eq!(
        parse("SITE CHMOD 755 foo\r\n").unwrap(),
        Command::Other {
            command_name: "SITE".to_string(),
            arguments: "CHMOD 755 foo".to_string()
        }
    );
}

#[test]
fn parse_utf8_path() {
    assert_eq!(
        parse("RETR résumé.txt\r\n".as_bytes().to_vec()).unwrap(),
        Command::Retr {
            path: "résumé.txt".to_string()
        }
    );
}
