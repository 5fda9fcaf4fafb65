#![allow(missing_docs)]

//! LIST/NLST over the passive data channel, including the classic long line
//! format and wildcard arguments.

pub mod common;

use common::{Client, read_data_from_server};
use pretty_assertions::assert_eq;
use std::sync::OnceLock;

const ADDR: &str = "127.0.0.1:2902";
static SERVER: OnceLock<std::path::PathBuf> = OnceLock::new();

fn setup() -> &'static std::path::Path {
    SERVER.get_or_init(|| {
        let root = common::start_server(ADDR, 51100..=51199);
        std::fs::write(root.join("alpha.txt"), b"alpha contents").unwrap();
        std::fs::write(root.join("beta.log"), b"beta").unwrap();
        std::fs::create_dir(root.join("docs")).unwrap();
        root
    })
}

fn assert_long_line_shape(line: &str) {
    let type_char = line.chars().next().unwrap();
    assert!(type_char == '-' || type_char == 'd', "bad type char in {:?}", line);
    assert!(line[1..10].chars().all(|c| "rwx-".contains(c)), "bad perms in {:?}", line);
    let fields: Vec<&str> = line.split_whitespace().collect();
    assert!(fields.len() >= 9, "too few fields in {:?}", line);
    assert_eq!(fields[1], "1");
    assert_eq!(fields[2], "ftp");
    assert_eq!(fields[3], "ftp");
    assert!(fields[4].parse::<u64>().is_ok(), "size not numeric in {:?}", line);
    // Mmm dd HH:MM
    assert_eq!(fields[5].len(), 3);
    assert!(fields[5].chars().next().unwrap().is_ascii_uppercase());
    assert!(fields[7].contains(':'));
}

#[tokio::test]
async fn list_over_passive_data_connection() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("LIST\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Here comes the directory listing\r\n");
    let data = read_data_from_server(&mut data_conn).await;
    assert_eq!(client.read_from_server().await, "226 Transfer OK\r\n");

    let text = String::from_utf8(data).unwrap();
    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert!(lines.len() >= 3, "expected at least three entries, got {:?}", lines);
    for line in &lines {
        assert_long_line_shape(line);
    }
    assert!(lines.iter().any(|l| l.ends_with("alpha.txt")));
    assert!(lines.iter().any(|l| l.ends_with("docs") && l.starts_with('d')));
}

#[tokio::test]
async fn nlst_sends_bare_names() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("NLST\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Here comes the directory listing\r\n");
    let data = read_data_from_server(&mut data_conn).await;
    assert_eq!(client.read_from_server().await, "226 Transfer OK\r\n");

    let text = String::from_utf8(data).unwrap();
    let names: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert!(names.contains(&"alpha.txt"));
    assert!(names.contains(&"beta.log"));
    assert!(names.contains(&"docs"));
}

#[tokio::test]
async fn list_with_wildcard_selects_a_subset() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("LIST *.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Here comes the directory listing\r\n");
    let data = read_data_from_server(&mut data_conn).await;
    assert_eq!(client.read_from_server().await, "226 Transfer OK\r\n");

    let text = String::from_utf8(data).unwrap();
    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("alpha.txt"));
}

#[tokio::test]
async fn list_of_a_single_file() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    let mut data_conn = client.pasv_connect().await;
    client.send_to_server("LIST alpha.txt\r\n").await;
    assert_eq!(client.read_from_server().await, "150 Here comes the directory listing\r\n");
    let data = read_data_from_server(&mut data_conn).await;
    assert_eq!(client.read_from_server().await, "226 Transfer OK\r\n");

    let text = String::from_utf8(data).unwrap();
    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with("alpha.txt"));
    let size_field: u64 = lines[0].split_whitespace().nth(4).unwrap().parse().unwrap();
    assert_eq!(size_field, "alpha contents".len() as u64);
}

#[tokio::test]
async fn stat_lists_over_the_control_channel() {
    setup();
    let mut client = Client::connect(ADDR).await;
    client.read_from_server().await;
    client.login("alice").await;

    client.send_to_server("STAT /\r\n").await;
    let lines = client.read_multiline("213").await;
    assert_eq!(lines.first().unwrap(), "213-Status follows\r\n");
    assert_eq!(lines.last().unwrap(), "213 End of status\r\n");
    assert!(lines.iter().any(|l| l.ends_with("alpha.txt\r\n")));
}
