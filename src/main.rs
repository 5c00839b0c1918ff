// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for eminorc.

use std::fs;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use eminorc::compiler::cli::{validate_cli, Cli};
use eminorc::compiler::{compile, output};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = err.print();
                return;
            }
            // clap would exit with status 2; the CLI contract is exit 1
            // with a fatal line.
            let _ = err.print();
            eprintln!("fatal: invalid command line");
            process::exit(1);
        }
    };

    let config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("fatal: {err}");
            process::exit(1);
        }
    };

    let source = match fs::read_to_string(&config.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("fatal: failed to read {}: {err}", config.input.display());
            process::exit(1);
        }
    };

    match compile(&source) {
        Ok(artifacts) => {
            for warning in &artifacts.warnings {
                eprintln!("{}", warning.format());
            }
            if let Err(err) = output::write_outputs(&config.outdir, &artifacts, config.disasm) {
                eprintln!("fatal: {err}");
                process::exit(1);
            }
            eprintln!("ok: wrote {}", config.outdir.display());
        }
        Err(failure) => {
            for diagnostic in failure.diagnostics() {
                eprintln!("{}", diagnostic.format());
            }
            eprintln!("fatal: {failure}");
            process::exit(1);
        }
    }
}
