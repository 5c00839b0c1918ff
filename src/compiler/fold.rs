// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Peephole constant folding.
//!
//! One pattern family: `PUSHK a; PUSHK b; BIN op` collapses to
//! `PUSHK (a op b)` for the five arithmetic sub-codes. Runs after
//! relocation resolution; the pass only ever shortens the segment and
//! never rewrites bytes outside a matched window.

use crate::compiler::opcode as op;

/// Fold constants in a single pass over `text`.
///
/// A folded `PUSHK` can participate in further matches within the same
/// pass, so chains like `1 + 2 + 3` collapse fully and a second
/// application is a no-op.
pub fn fold_constants(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    // Start offsets of the instructions already copied to `out`.
    let mut starts: Vec<usize> = Vec::new();
    let mut cur = 0;

    while cur < text.len() {
        let opcode = text[cur];
        let len = op::instr_len(opcode)
            .unwrap_or(1)
            .min(text.len() - cur);

        if opcode == op::BIN && len == 2 && is_arith(text[cur + 1]) {
            if let Some(window) = pushk_pair(&out, &starts) {
                let (at, a, b) = window;
                let folded = fold_arith(a, b, text[cur + 1]);
                out.truncate(at);
                starts.truncate(starts.len() - 2);
                starts.push(out.len());
                out.push(op::PUSHK);
                out.extend_from_slice(&folded.to_le_bytes());
                cur += len;
                continue;
            }
        }

        starts.push(out.len());
        out.extend_from_slice(&text[cur..cur + len]);
        cur += len;
    }

    out
}

fn is_arith(sub: u8) -> bool {
    (op::BIN_ADD..=op::BIN_MOD).contains(&sub)
}

/// The two preceding instructions, if both are complete `PUSHK`s.
fn pushk_pair(out: &[u8], starts: &[usize]) -> Option<(usize, u32, u32)> {
    let n = starts.len();
    if n < 2 {
        return None;
    }
    let a_at = starts[n - 2];
    let b_at = starts[n - 1];
    if out[a_at] != op::PUSHK || out[b_at] != op::PUSHK {
        return None;
    }
    if b_at != a_at + 5 || out.len() != b_at + 5 {
        return None;
    }
    let a = u32::from_le_bytes(out[a_at + 1..a_at + 5].try_into().ok()?);
    let b = u32::from_le_bytes(out[b_at + 1..b_at + 5].try_into().ok()?);
    Some((a_at, a, b))
}

/// Unsigned 32-bit inputs widened to signed 64-bit, narrowed back to 32.
/// Division and modulus by zero fold to zero.
fn fold_arith(a: u32, b: u32, sub: u8) -> u32 {
    let a = i64::from(a);
    let b = i64::from(b);
    let value = match sub {
        op::BIN_ADD => a + b,
        op::BIN_SUB => a - b,
        op::BIN_MUL => a.wrapping_mul(b),
        op::BIN_DIV => {
            if b == 0 {
                0
            } else {
                a / b
            }
        }
        op::BIN_MOD => {
            if b == 0 {
                0
            } else {
                a % b
            }
        }
        _ => unreachable!("non-arithmetic sub-code {sub}"),
    };
    value as u32
}
