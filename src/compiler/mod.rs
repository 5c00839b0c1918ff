// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! E Minor compilation pipeline.
//!
//! Strictly staged: lex/parse -> validate -> emit -> resolve -> fold ->
//! disassemble. Each stage consumes the previous stage's output; file I/O
//! happens only at the entry and exit boundaries (owned by `main`).

pub mod ast;
pub mod check;
pub mod cli;
pub mod disasm;
pub mod emit;
pub mod error;
pub mod fold;
pub mod lexer;
pub mod opcode;
pub mod output;
pub mod parser;
pub mod resolve;
pub mod token;

use std::collections::BTreeMap;

pub use error::{CompileError, CompileErrorKind, CompileFailure, Diagnostic, Severity};

/// Everything a successful compile produces.
#[derive(Debug)]
pub struct Artifacts {
    /// Executable opcodes with inline operands.
    pub text: Vec<u8>,
    /// NUL-terminated string constants.
    pub rodata: Vec<u8>,
    /// Function entry offsets in `text`.
    pub functions: BTreeMap<String, u32>,
    /// Warning diagnostics; never fatal.
    pub warnings: Vec<Diagnostic>,
    /// Disassembly listing of the final `text` segment.
    pub listing: String,
}

/// Compile one source file to IR artifacts.
pub fn compile(source: &str) -> Result<Artifacts, CompileFailure> {
    let program = match parser::parse(source) {
        Ok(program) => program,
        Err(err) => {
            let kind = if err.lexical {
                CompileErrorKind::Lex
            } else {
                CompileErrorKind::Parse
            };
            let diagnostic = Diagnostic::new(
                Severity::Error,
                err.message.clone(),
                err.pos.line,
                err.pos.column,
            );
            return Err(CompileFailure::new(
                CompileError::new(kind, &err.message, None),
                vec![diagnostic],
            ));
        }
    };

    let diagnostics = check::validate(&program);
    if diagnostics.iter().any(|d| d.severity() == Severity::Error) {
        return Err(CompileFailure::new(
            CompileError::new(CompileErrorKind::Check, "star-code validation failed", None),
            diagnostics,
        ));
    }
    let warnings = diagnostics;

    let mut emitter = emit::Emitter::new();
    emitter.emit_program(&program);
    let emit::Emitter {
        mut text,
        rodata,
        functions,
        mut labels,
        relocs,
    } = emitter;

    if let Err(err) = resolve::resolve(&mut text, &relocs, &mut labels, &functions) {
        return Err(CompileFailure::new(err, warnings));
    }

    // Folding must run after resolution: patched branch targets are plain
    // bytes by now, and the pass only shortens matched windows.
    let text = fold::fold_constants(&text);
    let listing = disasm::disassemble(&text);

    Ok(Artifacts {
        text,
        rodata,
        functions,
        warnings,
        listing,
    })
}
