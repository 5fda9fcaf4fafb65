#![allow(missing_docs)]

//! Behaviour of the shared passive port pool across sessions: distinct ports
//! per client reservation, exhaustion, and reuse after a transfer.

pub mod common;

use common::{Client, parse_pasv, read_data_from_server};
use pretty_assertions::assert_eq;
use std::sync::OnceLock;

// Only two passive ports: exhaustion is observable with three sessions.
const ADDR: &str = "127.0.0.1:2904";
static SERVER: OnceLock<std::path::PathBuf> = OnceLock::new();

fn setup() {
    SERVER.get_or_init(|| common::start_server(ADDR, 51300..=51301));
}

async fn logged_in_client() -> Client {
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;
    client
}

#[tokio::test]
async fn pool_hands_out_distinct_ports_and_exhausts() {
    setup();
    let mut first = logged_in_client().await;
    let mut second = logged_in_client().await;
    let mut third = logged_in_client().await;

    first.send_to_server("PASV\r\n").await;
    let first_port = parse_pasv(&first.read_from_server().await).unwrap().port();
    second.send_to_server("PASV\r\n").await;
    let second_port = parse_pasv(&second.read_from_server().await).unwrap().port();

    assert_ne!(first_port, second_port);
    assert!((51300..=51301).contains(&first_port));
    assert!((51300..=51301).contains(&second_port));

    // Both ports hold a reservation for this client IP now.
    third.send_to_server("PASV\r\n").await;
    assert_eq!(
        third.read_from_server().await,
        "421 Server was unable to open passive connection listener\r\n"
    );

    // A completed transfer frees its port for the next reservation.
    let mut data_conn = tokio::net::TcpStream::connect(("127.0.0.1", first_port)).await.unwrap();
    first.send_to_server("NLST\r\n").await;
    assert_eq!(first.read_from_server().await, "150 Here comes the directory listing\r\n");
    let _ = read_data_from_server(&mut data_conn).await;
    assert_eq!(first.read_from_server().await, "226 Transfer OK\r\n");

    third.send_to_server("PASV\r\n").await;
    let third_port = parse_pasv(&third.read_from_server().await).unwrap().port();
    assert_eq!(third_port, first_port);
}
