// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Output directory writing.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::compiler::error::{CompileError, CompileErrorKind};
use crate::compiler::Artifacts;

/// Write all compiler outputs into `outdir`, creating it if needed.
pub fn write_outputs(
    outdir: &Path,
    artifacts: &Artifacts,
    with_disasm: bool,
) -> Result<(), CompileError> {
    fs::create_dir_all(outdir).map_err(|err| {
        CompileError::new(
            CompileErrorKind::Io,
            &format!("failed to create output directory: {err}"),
            Some(outdir.to_string_lossy().as_ref()),
        )
    })?;

    write_file(outdir, "a.ir.bin", &artifacts.text)?;
    write_file(outdir, "a.text.hex", format!("{}\n", format_hex(&artifacts.text)).as_bytes())?;
    write_file(outdir, "a.rodata.bin", &artifacts.rodata)?;

    let symbols = json!({ "functions": &artifacts.functions });
    let payload = serde_json::to_string_pretty(&symbols).map_err(|err| {
        CompileError::new(
            CompileErrorKind::Io,
            &format!("failed to serialize symbol map: {err}"),
            None,
        )
    })?;
    write_file(outdir, "symbols.json", format!("{payload}\n").as_bytes())?;

    if with_disasm {
        write_file(outdir, "a.dis.txt", artifacts.listing.as_bytes())?;
    }
    Ok(())
}

fn write_file(outdir: &Path, name: &str, bytes: &[u8]) -> Result<(), CompileError> {
    let path = outdir.join(name);
    fs::write(&path, bytes).map_err(|err| {
        CompileError::new(
            CompileErrorKind::Io,
            &format!("failed to write {name}: {err}"),
            Some(path.to_string_lossy().as_ref()),
        )
    })
}

/// Space-separated two-character uppercase hex, one pair per byte.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
