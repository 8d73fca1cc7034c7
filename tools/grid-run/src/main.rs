// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Command line launcher for demo programs on an emulated tile grid
//! OWNERS: @tools-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests in cli.rs and demos.rs
//!
//! PUBLIC API:
//!   - CLI: grid-run [--config <file.toml> | --width <n> --height <n> --backend <kind>]
//!          [--demo hello|barrier|image] [--rounds <n>]
//!
//! DEPENDENCIES:
//!   - clap: argument parsing
//!   - env_logger: RUST_LOG driven diagnostics
//!   - grid-runtime: the grid itself

use clap::Parser;

mod cli;
mod demos;

fn main() {
    env_logger::init();
    let args = cli::Cli::parse();
    std::process::exit(cli::run(&args));
}
