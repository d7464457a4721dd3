// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help and version output specs.

use crate::prelude::*;

#[test]
fn redactflow_no_args_shows_usage_and_exits_nonzero() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn redactflow_help_shows_usage_and_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("enqueue")
        .stdout_has("watch");
}

#[test]
fn redactflow_enqueue_help_shows_usage() {
    cli().args(&["enqueue", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn redactflow_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
