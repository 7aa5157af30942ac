use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn chunks_with_size() {
    match parse(&["reup", "chunks", "--ids", "120", "--chunk-size", "50"]) {
        CliCommand::Chunks { ids, chunk_size } => {
            assert_eq!(ids, 120);
            assert_eq!(chunk_size, Some(50));
        }
        other => panic!("expected Chunks, got {:?}", other),
    }
}

#[test]
fn chunks_requires_ids() {
    assert!(Cli::try_parse_from(["reup", "chunks"]).is_err());
}

#[test]
fn config_and_login_take_no_args() {
    assert!(matches!(parse(&["reup", "config"]), CliCommand::Config));
    assert!(matches!(parse(&["reup", "login"]), CliCommand::Login));
    assert!(Cli::try_parse_from(["reup", "login", "extra"]).is_err());
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["reup", "download"]).is_err());
}
