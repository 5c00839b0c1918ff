// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::compiler::error::{CompileError, CompileErrorKind};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(
    name = "eminorc",
    version = VERSION,
    about = "E Minor ahead-of-time compiler producing byte-coded IR",
    long_about = "Compiles a single E Minor source file into a byte-coded text segment, \
a read-only data segment, a function symbol map, and an optional disassembly listing."
)]
pub struct Cli {
    #[arg(
        value_name = "INPUT",
        long_help = "E Minor source file to compile. All input arrives as one file; \
there is no cross-unit linking."
    )]
    pub input: PathBuf,
    #[arg(
        short = 'o',
        value_name = "DIR",
        default_value = "out",
        long_help = "Output directory for a.ir.bin, a.text.hex, a.rodata.bin, symbols.json, \
and a.dis.txt. Created if it does not exist."
    )]
    pub outdir: PathBuf,
    #[arg(
        long = "no-disasm",
        action = ArgAction::SetTrue,
        long_help = "Skip writing the human-readable a.dis.txt listing."
    )]
    pub no_disasm: bool,
}

/// Validated CLI configuration.
#[derive(Debug)]
pub struct CliConfig {
    pub input: PathBuf,
    pub outdir: PathBuf,
    pub disasm: bool,
}

/// Validate CLI arguments and return parsed configuration.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, CompileError> {
    if cli.outdir.exists() && !cli.outdir.is_dir() {
        return Err(CompileError::new(
            CompileErrorKind::Cli,
            "-o must name a directory",
            Some(cli.outdir.to_string_lossy().as_ref()),
        ));
    }
    Ok(CliConfig {
        input: cli.input.clone(),
        outdir: cli.outdir.clone(),
        disasm: !cli.no_disasm,
    })
}
