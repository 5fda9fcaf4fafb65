#![allow(missing_docs)]

//! RETR/STOR/APPE over the data channel, plus the PASV/PORT exclusivity and
//! data-channel gating rules.

pub mod common;

use common::{Client, read_data_from_server};
use pretty_assertions::assert_eq;
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;

const ADDR: &str = "127.0.0.1:2903";
static SERVER: OnceLock<std::path::PathBuf> = OnceLock::new();

fn setup() -> &'static std::path::Path {
    SERVER.get_or_init(|| {
        let root = common::start_server(ADDR, 51200..=51299);
        std::fs::write(root.join("download.txt"), b"you got me").unwrap();
        root
    })
}

#[tokio::test]
async fn retr_sends_file_contents() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("RETR download.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Opening ASCII mode data connection\r\n");
    let data = read_data_from_server(&mut data_conn).await;
    assert_eq!(data, b"you got me");
    assert_eq!(client.read_from_server().await, "226 Closing data connection, sent 10 bytes\r\n");
}

#[tokio::test]
async fn retr_after_type_i_says_binary() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;
    client.send_to_server("TYPE I\r\n").await;
    client.read_from_server().await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("RETR download.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Opening BINARY mode data connection\r\n");
    let _ = read_data_from_server(&mut data_conn).await;
    client.read_from_server().await;
}

#[tokio::test]
async fn retr_missing_file_is_550_not_found() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let data_conn = client.pasv_connect().await;
    client.send_to_server("RETR nope.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "550 Not Found\r\n");
    // No data ever flows; the reserved endpoint just goes away.
    drop(data_conn);

    // And the session is fine: the next PASV is accepted again.
    let _ = client.pasv_connect().await;
}

#[tokio::test]
async fn stor_then_retr_roundtrip() {
    let root = setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("STOR upload.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Ok to send data\r\n");
    data_conn.write_all(b"uploaded bytes").await.unwrap();
    data_conn.shutdown().await.unwrap();
    drop(data_conn);
    assert_eq!(client.read_from_server().await, "226 Closing data connection\r\n");

    assert_eq!(std::fs::read(root.join("upload.txt")).unwrap(), b"uploaded bytes");

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("RETR upload.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Opening ASCII mode data connection\r\n");
    let data = read_data_from_server(&mut data_conn).await;
    assert_eq!(data, b"uploaded bytes");
    assert_eq!(client.read_from_server().await, "226 Closing data connection, sent 14 bytes\r\n");
}

#[tokio::test]
async fn appe_appends_to_an_existing_file() {
    let root = setup();
    std::fs::write(root.join("journal.txt"), b"day one\n").unwrap();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("APPE journal.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Ok to send data\r\n");
    data_conn.write_all(b"day two\n").await.unwrap();
    data_conn.shutdown().await.unwrap();
    drop(data_conn);
    assert_eq!(client.read_from_server().await, "226 Closing data connection\r\n");

    assert_eq!(std::fs::read(root.join("journal.txt")).unwrap(), b"day one\nday two\n");
}

#[tokio::test]
async fn dele_size_mdtm_and_rename() {
    let root = setup();
    std::fs::write(root.join("victim.txt"), b"12345").unwrap();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    client.send_to_server("SIZE victim.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "213 5\r\n");
    client.send_to_server("MDTM victim.txt\r\n").await;
    let mdtm = client.read_from_server().await;
    assert!(mdtm.starts_with("213 "));
    assert_eq!(mdtm.trim_end().len(), "213 ".len() + 14);

    client.send_to_server("RNFR victim.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "350 Ready for destination name\r\n");
    client.send_to_server("RNTO renamed.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "250 Renamed\r\n");
    assert!(root.join("renamed.txt").exists());

    client.send_to_server("RNTO again.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "503 Issue RNFR first\r\n");

    client.send_to_server("DELE renamed.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "250 File successfully removed\r\n");
    assert!(!root.join("renamed.txt").exists());
}

#[tokio::test]
async fn pasv_after_port_is_a_bad_sequence() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    client.send_to_server("PORT 127,0,0,1,20,0\r\n").await;
    assert_eq!(client.read_from_server().await, "200 OK\r\n");
    client.send_to_server("PASV\r\n").await;
    assert_eq!(client.read_from_server().await, "503 Bad sequence of commands.\r\n");
    client.send_to_server("PORT 127,0,0,1,20,1\r\n").await;
    assert_eq!(client.read_from_server().await, "503 Bad sequence of commands.\r\n");
}

#[tokio::test]
async fn port_after_pasv_is_a_bad_sequence() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let _data_conn = client.pasv_connect().await;
    client.send_to_server("PORT 127,0,0,1,20,0\r\n").await;
    assert_eq!(client.read_from_server().await, "503 Bad sequence of commands.\r\n");
}

#[tokio::test]
async fn transfers_need_a_data_channel() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    client.send_to_server("RETR download.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "425 Use PORT or PASV first\r\n");
    client.send_to_server("LIST\r\n").await;
    assert_eq!(client.read_from_server().await, "425 Use PORT or PASV first\r\n");
}

#[tokio::test]
async fn active_mode_retr_dials_the_client() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    // Play the active-mode client: listen, tell the server where, transfer.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accept = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        read_data_from_server(&mut sock).await
    });

    client
        .send_to_server(&format!("PORT 127,0,0,1,{},{}\r\n", port >> 8, port & 0xff))
        .await;
    assert_eq!(client.read_from_server().await, "200 OK\r\n");
    client.send_to_server("RETR download.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Opening ASCII mode data connection\r\n");
    assert_eq!(client.read_from_server().await, "226 Closing data connection, sent 10 bytes\r\n");
    assert_eq!(accept.await.unwrap(), b"you got me");
}
