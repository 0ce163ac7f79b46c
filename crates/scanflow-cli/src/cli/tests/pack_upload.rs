//! Tests for pack, upload and checksum.

use super::parse;
use crate::cli::commands::PackTarget;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn cli_parse_pack_pairs() {
    match parse(&["scanflow", "pack", "ch01.zip=res/ch01", "ch02.zip=res/ch02"]) {
        CliCommand::Pack { overwrite, targets } => {
            assert!(!overwrite);
            assert_eq!(
                targets,
                vec![
                    PackTarget {
                        dest: "ch01.zip".into(),
                        src: "res/ch01".into(),
                    },
                    PackTarget {
                        dest: "ch02.zip".into(),
                        src: "res/ch02".into(),
                    },
                ]
            );
        }
        _ => panic!("expected Pack"),
    }
}

#[test]
fn cli_parse_pack_overwrite() {
    match parse(&["scanflow", "pack", "--overwrite", "v01.zip=res"]) {
        CliCommand::Pack { overwrite, targets } => {
            assert!(overwrite);
            assert_eq!(targets.len(), 1);
        }
        _ => panic!("expected Pack with --overwrite"),
    }
}

#[test]
fn cli_pack_rejects_malformed_pair() {
    assert!(Cli::try_parse_from(["scanflow", "pack", "v01.zip"]).is_err());
    assert!(Cli::try_parse_from(["scanflow", "pack", "=res"]).is_err());
    assert!(Cli::try_parse_from(["scanflow", "pack"]).is_err());
}

#[test]
fn cli_parse_upload() {
    match parse(&["scanflow", "upload", "a.zip", "b.zip"]) {
        CliCommand::Upload { files } => {
            assert_eq!(files, vec![PathBuf::from("a.zip"), PathBuf::from("b.zip")])
        }
        _ => panic!("expected Upload"),
    }
}

#[test]
fn cli_upload_requires_a_file() {
    assert!(Cli::try_parse_from(["scanflow", "upload"]).is_err());
}

#[test]
fn cli_parse_checksum() {
    match parse(&["scanflow", "checksum", "/tmp/v01.zip"]) {
        CliCommand::Checksum { path } => assert_eq!(path, PathBuf::from("/tmp/v01.zip")),
        _ => panic!("expected Checksum"),
    }
}
