use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;
use tfc_exporter_server::infra::config::{
    Args, Config, ConfigError, LogFormat, LogLevel,
};

fn with_token(args: &[&str]) -> Result<Config, ConfigError> {
    let mut argv = vec!["-t", "abc"];
    argv.extend_from_slice(args);
    parse(&argv)
}

fn parse(args: &[&str]) -> Result<Config, ConfigError> {
    let mut argv = vec!["tfc-exporter"];
    argv.extend_from_slice(args);
    Config::from_args(Args::try_parse_from(argv).expect("arguments parse"))
}

fn token_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_apply() {
    let config = parse(&["--api-token", "abc"]).unwrap();

    assert!(config.organizations.is_empty());
    assert_eq!(config.client.token, "abc");
    assert_eq!(config.client.address, "https://app.terraform.io/");
    assert!(!config.address_overridden);
    assert!(!config.client.insecure_skip_verify);
    assert_eq!(config.listen_address, "0.0.0.0:9100");
    assert_eq!(config.page_size, 20);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.log_format, LogFormat::Logfmt);
}

#[test]
fn organizations_split_on_commas() {
    let config =
        with_token(&["--organizations", "acme, globex,,initech"]).unwrap();

    assert_eq!(config.organizations, vec!["acme", "globex", "initech"]);
}

#[test]
fn token_file_wins_over_flag() {
    let file = token_file("from-file\nsecond line\n");
    let path = file.path().to_str().unwrap();

    let config =
        parse(&["--api-token", "from-flag", "--api-token-file", path]).unwrap();

    assert_eq!(config.client.token, "from-file");
}

#[test]
fn empty_token_file_is_rejected() {
    let file = token_file("\n");
    let path = file.path().to_str().unwrap();

    let err = parse(&["--api-token-file", path]).unwrap_err();

    assert!(matches!(err, ConfigError::EmptyTokenFile { .. }));
}

#[test]
fn unreadable_token_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing-token");

    let err = parse(&["--api-token-file", missing.to_str().unwrap()])
        .unwrap_err();

    assert!(matches!(err, ConfigError::TokenFileIo { .. }));
}

#[test]
fn missing_token_is_rejected() {
    let err = parse(&[]).unwrap_err();
    assert!(matches!(err, ConfigError::MissingToken));
}

#[test]
fn page_size_is_bounded() {
    let err = with_token(&["--page-size", "0"]).unwrap_err();
    assert!(matches!(err, ConfigError::PageSize(0)));

    let err = with_token(&["--page-size", "101"]).unwrap_err();
    assert!(matches!(err, ConfigError::PageSize(101)));

    let config = with_token(&["--page-size", "100"]).unwrap();
    assert_eq!(config.page_size, 100);
}

#[test]
fn listen_address_accepts_host_names_and_bare_ports() {
    let listen = |address: &str| {
        with_token(&["--listen-address", address])
            .map(|config| config.listen_address)
    };

    assert_eq!(listen("localhost:9100").unwrap(), "localhost:9100");
    assert_eq!(listen(":9100").unwrap(), "0.0.0.0:9100");
    assert_eq!(listen("127.0.0.1:8080").unwrap(), "127.0.0.1:8080");
    assert_eq!(listen("[::1]:9100").unwrap(), "[::1]:9100");
}

#[test]
fn listen_address_needs_a_port() {
    for address in ["localhost", "localhost:http", "host:70000", "::1:9100"] {
        let err = with_token(&["--listen-address", address]).unwrap_err();
        let ConfigError::ListenAddress(raw) = &err else {
            panic!("{address}: unexpected error {err:?}");
        };
        assert_eq!(raw, address);
    }
}

#[test]
fn logging_and_address_flags() {
    let config = parse(&[
        "-t",
        "abc",
        "--api-address",
        "https://tfe.example.com",
        "--api-insecure-skip-verify",
        "--log.level",
        "debug",
        "--log.format",
        "json",
    ])
    .unwrap();

    assert!(config.address_overridden);
    assert_eq!(config.client.address, "https://tfe.example.com");
    assert!(config.client.insecure_skip_verify);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_format, LogFormat::Json);
}
