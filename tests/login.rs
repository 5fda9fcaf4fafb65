#![allow(missing_docs)]

//! The control-channel dialogue around logging in: greeting, USER/PASS,
//! the authentication gate and the small no-state commands.

pub mod common;

use common::Client;
use pretty_assertions::assert_eq;
use std::sync::OnceLock;

const ADDR: &str = "127.0.0.1:2901";
static SERVER: OnceLock<std::path::PathBuf> = OnceLock::new();

fn setup() {
    SERVER.get_or_init(|| common::start_server(ADDR, 51000..=51099));
}

#[tokio::test]
async fn greeting_and_login() {
    setup();
    let mut client = Client::connect(ADDR).await;
    assert_eq!(client.read_from_server().await, "220 FTP server ready\r\n");
    client.login("alice").await;
    client.send_to_server("PWD\r\n").await;
    assert_eq!(client.read_from_server().await, "257 \"/\" is current directory\r\n");
}

#[tokio::test]
async fn commands_require_login() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("PWD\r\n").await;
    assert_eq!(client.read_from_server().await, "530 Not logged in\r\n");
    client.send_to_server("PASV\r\n").await;
    assert_eq!(client.read_from_server().await, "530 Not logged in\r\n");
}

#[tokio::test]
async fn pass_without_user_is_a_bad_sequence() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("PASS whatever\r\n").await;
    assert_eq!(client.read_from_server().await, "503 Bad sequence of commands.\r\n");
}

#[tokio::test]
async fn unknown_commands_are_not_implemented() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("SMNT /some/where\r\n").await;
    assert_eq!(client.read_from_server().await, "502 Command not implemented\r\n");
    client.send_to_server("REST 100\r\n").await;
    assert_eq!(client.read_from_server().await, "502 Command not implemented\r\n");
}

#[tokio::test]
async fn small_no_state_commands() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("SYST\r\n").await;
    assert_eq!(client.read_from_server().await, "215 UNIX Type: L8\r\n");
    client.send_to_server("NOOP\r\n").await;
    assert_eq!(client.read_from_server().await, "200 Successfully did nothing\r\n");
    client.send_to_server("TYPE I\r\n").await;
    assert_eq!(client.read_from_server().await, "200 Switching to Binary mode\r\n");
    client.send_to_server("TYPE X\r\n").await;
    assert_eq!(client.read_from_server().await, "202 Command not implemented for that parameter\r\n");
    client.send_to_server("OPTS UTF8 ON\r\n").await;
    assert_eq!(client.read_from_server().await, "200 UTF8 is on\r\n");
}

#[tokio::test]
async fn feat_lists_extensions() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("FEAT\r\n").await;
    let lines = client.read_multiline("211").await;
    assert_eq!(lines.first().unwrap(), "211-Extensions supported:\r\n");
    assert!(lines.contains(&" SIZE\r\n".to_string()));
    assert!(lines.contains(&" MDTM\r\n".to_string()));
    assert!(lines.contains(&" UTF8\r\n".to_string()));
    // No TLS configured on this server, so no AUTH TLS advertisement.
    assert!(!lines.iter().any(|l| l.contains("AUTH TLS")));
    assert_eq!(lines.last().unwrap(), "211 END\r\n");
}

#[tokio::test]
async fn auth_tls_unconfigured_is_refused() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("AUTH TLS\r\n").await;
    assert_eq!(client.read_from_server().await, "502 TLS is not configured on this server\r\n");
}

#[tokio::test]
async fn quit_says_bye() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.send_to_server("QUIT\r\n").await;
    assert_eq!(client.read_from_server().await, "221 Bye!\r\n");
}

#[tokio::test]
async fn cwd_and_cdup_move_around() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("bob").await;
    client.send_to_server("MKD sub\r\n").await;
    assert_eq!(client.read_from_server().await, "257 \"/sub\" directory created\r\n");
    client.send_to_server("CWD sub\r\n").await;
    assert_eq!(client.read_from_server().await, "250 \"/sub\" is current directory\r\n");
    client.send_to_server("PWD\r\n").await;
    assert_eq!(client.read_from_server().await, "257 \"/sub\" is current directory\r\n");
    client.send_to_server("CDUP\r\n").await;
    assert_eq!(client.read_from_server().await, "250 \"/\" is current directory\r\n");
    client.send_to_server("CWD nonexistent\r\n").await;
    assert_eq!(client.read_from_server().await, "550 Folder not found\r\n");
}
