use std::fs;
use std::path::PathBuf;

use phantom_ammo::config::AmmoConfig;
use phantom_ammo::execute::generate_ammo;
use phantom_ammo::{parse_request_list, AmmoError, AmmoWriter, ValidationError};
use serde_json::json;
use test_case::test_case;
use uuid::Uuid;

const AUTH_BULLET: &str = "214 tests\n\
    POST /auth HTTP/1.1\r\n\
    Authorization: token\r\n\
    Host: 127.0.0.1:8888\r\n\
    User-Agent: phantom\r\n\
    Accept: */*\r\n\
    Content-Type: application/json\r\n\
    Connection: Close\r\n\
    Content-Length: 42\r\n\
    \r\n\
    {\"username\": \"admin\", \"password\": \"admin\"}\r\n\r\n";

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("phantom-ammo-it-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn auth_request_becomes_expected_bullet() {
    let dir = scratch_dir();
    let path = dir.join("ammo");
    let records = parse_request_list(&json!([{
        "host": "127.0.0.1",
        "port": 8888,
        "url": "/auth",
        "method": "POST",
        "case": "tests",
        "extra_headers": {"Authorization": "token"},
        "body": {"username": "admin", "password": "admin"}
    }]))
    .unwrap();

    AmmoWriter::new(&path).write(&records).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), AUTH_BULLET);
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn case_defaults_to_url_in_file() {
    let dir = scratch_dir();
    let path = dir.join("ammo");
    let records = parse_request_list(&json!([{
        "host": "127.0.0.1",
        "port": 8888,
        "url": "/auth",
        "method": "POST",
        "body": {"username": "admin", "password": "admin"}
    }]))
    .unwrap();

    AmmoWriter::new(&path).write(&records).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("192 /auth\nPOST /auth HTTP/1.1\r\nHost: 127.0.0.1:8888\r\n"));
    assert!(content.ends_with("{\"username\": \"admin\", \"password\": \"admin\"}\r\n\r\n"));
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn file_reproduces_request_order() {
    let dir = scratch_dir();
    let path = dir.join("ammo");
    let raw: Vec<_> = (0..20)
        .map(|i| json!({"host": "h", "url": format!("/{}", i), "method": "GET", "case": format!("c{}", i)}))
        .collect();
    let records = parse_request_list(&json!(raw)).unwrap();

    AmmoWriter::new(&path).write(&records).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let cases: Vec<&str> = content
        .split("\r\n\r\n")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| chunk.split_once('\n').unwrap().0.split_once(' ').unwrap().1)
        .collect();
    let expected: Vec<String> = (0..20).map(|i| format!("c{}", i)).collect();
    assert_eq!(cases, expected);
    fs::remove_dir_all(dir).unwrap();
}

#[test_case(json!({"host": "h", "url": "/", "method": "GET", "headers": "headers"}) ; "unknown field")]
#[test_case(json!({"host": "h", "url": "/", "method": "BAD"}) ; "bad method")]
#[test_case(json!({"host": "h", "url": "/", "method": "GET", "port": "8888"}) ; "string port")]
fn rejected_batch_writes_nothing(bad: serde_json::Value) {
    let dir = scratch_dir();
    let path = dir.join("ammo");
    let raw = json!([{"host": "h", "url": "/ok", "method": "GET"}, bad]);

    let err = parse_request_list(&raw).unwrap_err();
    assert!(matches!(err, ValidationError::Record { index: 1, .. }));
    assert!(!path.exists());
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn directory_destination_is_rejected_before_writing() {
    let dir = scratch_dir();
    let target = dir.join("ammo");
    fs::create_dir(&target).unwrap();
    let records = parse_request_list(&json!([{"host": "h", "url": "/", "method": "GET"}])).unwrap();

    let err = AmmoWriter::new(&target).write(&records).unwrap_err();

    assert!(matches!(err, AmmoError::Destination(_)));
    assert!(target.is_dir());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn generate_from_config_file() {
    let dir = scratch_dir();
    let config_path = dir.join("config.json");
    let ammo_path = dir.join("ammo");
    let config = AmmoConfig {
        ammo_file: ammo_path.clone(),
        log_lvl: "ERROR".to_string(),
        ..AmmoConfig::template()
    };
    fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

    let summary = generate_ammo(&config_path).unwrap();

    let content = fs::read_to_string(&ammo_path).unwrap();
    assert_eq!(summary.bullets, 1);
    assert_eq!(summary.bytes, content.len() as u64);
    let request = &content[content.find('\n').unwrap() + 1..];
    assert!(request.starts_with("POST AUTH HTTP/1.1\r\n"));
    assert!(content.contains("Content-Length: 54\r\n\r\n"));
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn generate_without_config_fails() {
    let dir = scratch_dir();
    assert!(generate_ammo(&dir.join("config.json")).is_err());
    fs::remove_dir_all(dir).unwrap();
}
