// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Relocation resolution.
//!
//! Consumes the relocation list exactly once after emission. Each symbol is
//! looked up in the label map first, then in the function symbol map; a
//! fallback hit is cached back into the label map. Patching writes the
//! 32-bit little-endian offset in place and never changes the text length.

use std::collections::{BTreeMap, HashMap};

use crate::compiler::emit::Reloc;
use crate::compiler::error::{CompileError, CompileErrorKind};

pub fn resolve(
    text: &mut [u8],
    relocs: &[Reloc],
    labels: &mut HashMap<String, u32>,
    functions: &BTreeMap<String, u32>,
) -> Result<(), CompileError> {
    for reloc in relocs {
        let offset = match labels.get(&reloc.symbol) {
            Some(offset) => *offset,
            None => match functions.get(&reloc.symbol) {
                Some(offset) => {
                    labels.insert(reloc.symbol.clone(), *offset);
                    *offset
                }
                None => {
                    return Err(CompileError::new(
                        CompileErrorKind::Resolve,
                        "unresolved symbol",
                        Some(&reloc.symbol),
                    ));
                }
            },
        };
        text[reloc.at..reloc.at + 4].copy_from_slice(&offset.to_le_bytes());
    }
    Ok(())
}
