//! Tests for get and batch subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use mfetch_core::model::MediaMode;
use std::path::Path;

#[test]
fn cli_parse_get_defaults() {
    match parse(&["mfetch", "get", "https://youtu.be/abc"]) {
        CliCommand::Get { url, fetch } => {
            assert_eq!(url, "https://youtu.be/abc");
            assert_eq!(fetch.mode, MediaMode::Video);
            assert_eq!(fetch.requester, 0);
            assert!(fetch.out.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_options() {
    match parse(&[
        "mfetch",
        "get",
        "https://vm.tiktok.com/ZMabc/",
        "--mode",
        "AUDIO",
        "--requester",
        "42",
        "--out",
        "/tmp/media",
    ]) {
        CliCommand::Get { url, fetch } => {
            assert_eq!(url, "https://vm.tiktok.com/ZMabc/");
            assert_eq!(fetch.mode, MediaMode::Audio);
            assert_eq!(fetch.requester, 42);
            assert_eq!(fetch.out.as_deref(), Some(Path::new("/tmp/media")));
        }
        _ => panic!("expected Get with options"),
    }
}

#[test]
fn cli_parse_get_rejects_unknown_mode() {
    assert!(Cli::try_parse_from(["mfetch", "get", "https://youtu.be/a", "--mode", "gif"]).is_err());
}

#[test]
fn cli_parse_get_requires_url() {
    assert!(Cli::try_parse_from(["mfetch", "get"]).is_err());
}

#[test]
fn cli_parse_batch() {
    match parse(&["mfetch", "batch", "links.txt", "--mode", "audio"]) {
        CliCommand::Batch { file, fetch } => {
            assert_eq!(file, Path::new("links.txt"));
            assert_eq!(fetch.mode, MediaMode::Audio);
        }
        _ => panic!("expected Batch"),
    }
}
