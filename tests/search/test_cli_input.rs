// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//
// Source list input handling

use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;

use sm2av::cli::{read_source_file, Cli};
use sm2av::search::types::collect_sources;

#[test]
fn test_input_file_and_arguments_are_combined() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "sm9 sm10\n\n  sm11\t\nsm9").unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let cli = Cli::parse_from(["sm2av", "sm1", "--input", path.as_str()]);
    let sources = cli.collect_source_args().unwrap();

    assert_eq!(sources, vec!["sm1", "sm9", "sm10", "sm11", "sm9"]);

    let ids: Vec<String> = collect_sources(&sources)
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(ids, vec!["sm1", "sm10", "sm11", "sm9"]);
}

#[test]
fn test_missing_input_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.txt");

    let err = read_source_file(&missing).unwrap_err();
    assert!(err.to_string().contains("absent.txt"));
}

#[test]
fn test_blank_input_file_yields_nothing() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "\n   \n\t\n").unwrap();

    assert!(read_source_file(file.path()).unwrap().is_empty());
}
