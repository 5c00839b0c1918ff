// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! IR emission.
//!
//! Walks the AST in source order and produces the `text` and `rodata`
//! segments, the function symbol map, the block-local label map, and the
//! relocation list. Forward branches are written as the placeholder
//! `0xFFFFFFFF` and patched in place; the text vector is never shifted
//! during emission.

use std::collections::{BTreeMap, HashMap};

use crate::compiler::ast::{BinOp, Block, Expr, Item, LetDecl, Program, Stmt, UnOp};
use crate::compiler::opcode as op;

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over the UTF-8 bytes of an identifier as written (`$` included).
pub fn fnv1a(name: &str) -> u32 {
    let mut hash = FNV_OFFSET;
    for byte in name.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A pending patch: `text[at..at + 4]` receives the offset of `symbol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reloc {
    pub at: usize,
    pub symbol: String,
}

#[derive(Debug, Default)]
pub struct Emitter {
    pub text: Vec<u8>,
    pub rodata: Vec<u8>,
    /// Function entry offsets, keyed by name as written.
    pub functions: BTreeMap<String, u32>,
    /// Jump targets: labels under `:name`, functions under the bare name.
    pub labels: HashMap<String, u32>,
    pub relocs: Vec<Reloc>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit_program(&mut self, program: &Program) {
        for item in &program.items {
            match item {
                Item::Entry { block, .. } => self.emit_block(block),
                Item::Function { name, body, .. } | Item::Worker { name, body, .. } => {
                    let entry = self.here();
                    self.functions.insert(name.clone(), entry);
                    self.labels.insert(name.clone(), entry);
                    self.emit_block(body);
                    // Fall-through must not run into the next function.
                    self.op(op::EXIT);
                }
                Item::Let(decl) => self.emit_let(decl),
                Item::Module { .. } | Item::Import { .. } | Item::Export { .. } => {}
            }
        }
    }

    fn emit_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.emit_stmt(stmt);
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Init { target, .. } => self.cap_op(op::INIT, target),
            Stmt::Lease { target, .. } => self.cap_op(op::LEASE, target),
            Stmt::Sublease { target, .. } => self.cap_op(op::SUBLEASE, target),
            Stmt::Release { target, .. } => self.cap_op(op::RELEASE, target),
            Stmt::Render { target, .. } => self.cap_op(op::RENDER, target),
            Stmt::Input { target, .. } => self.cap_op(op::INPUT, target),
            Stmt::Output { target, .. } => self.cap_op(op::OUTPUT, target),
            Stmt::Join { target, .. } => self.cap_op(op::JOIN, target),
            Stmt::Load { target, value, .. } => {
                self.emit_expr(value);
                self.cap_op(op::LOAD, target);
            }
            Stmt::Call { func, arg, .. } => {
                if let Some(arg) = arg {
                    self.emit_expr(arg);
                }
                self.op(op::CALL);
                self.placeholder(func.clone());
            }
            Stmt::Exit { .. } => self.op(op::EXIT),
            Stmt::Yield { .. } => self.op(op::YIELD),
            Stmt::Send { chan, packet, .. } => {
                self.op(op::SEND);
                self.word(fnv1a(chan));
                self.word(fnv1a(packet));
            }
            Stmt::Recv { chan, packet, .. } => {
                self.op(op::RECV);
                self.word(fnv1a(chan));
                self.word(fnv1a(packet));
            }
            Stmt::Spawn { func, args, .. } => {
                for arg in args {
                    self.emit_expr(arg);
                }
                self.op(op::SPAWN);
                self.placeholder(func.clone());
            }
            Stmt::Stamp { target, value, .. } => {
                self.op(op::STAMP);
                self.word(fnv1a(target));
                self.word(literal_word(value));
            }
            Stmt::Expire { target, nanos, .. } => {
                self.op(op::EXPIRE);
                self.word(fnv1a(target));
                self.word(*nanos as u32);
            }
            Stmt::Sleep { nanos, .. } => {
                self.op(op::SLEEP);
                self.word(*nanos as u32);
            }
            Stmt::Error {
                target,
                code,
                message,
                ..
            } => {
                let msg_offset = self.rodata_offset(message);
                self.op(op::ERROR);
                self.word(fnv1a(target));
                self.word(*code as u32);
                self.word(msg_offset);
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
                ..
            } => {
                self.emit_expr(cond);
                self.op(op::JZ);
                let jz_at = self.word_placeholder();
                self.emit_block(then_block);
                match else_block {
                    Some(else_block) => {
                        self.op(op::JMP);
                        let jmp_at = self.word_placeholder();
                        let else_target = self.here();
                        self.patch(jz_at, else_target);
                        self.emit_block(else_block);
                        let end_target = self.here();
                        self.patch(jmp_at, end_target);
                    }
                    None => {
                        let end_target = self.here();
                        self.patch(jz_at, end_target);
                    }
                }
            }
            Stmt::Loop { cond, body, .. } => {
                let start = self.here();
                self.emit_expr(cond);
                self.op(op::JZ);
                let jz_at = self.word_placeholder();
                self.emit_block(body);
                self.op(op::JMP);
                self.word(start);
                let end_target = self.here();
                self.patch(jz_at, end_target);
            }
            Stmt::Label { name, .. } => {
                let here = self.here();
                self.labels.insert(format!(":{name}"), here);
            }
            Stmt::Goto { name, .. } => {
                self.op(op::JMP);
                self.placeholder(format!(":{name}"));
            }
            Stmt::Let(decl) => self.emit_let(decl),
            Stmt::Print { args, .. } => {
                for arg in args {
                    self.emit_expr(arg);
                    self.op(op::OUTPUT);
                    self.word(0);
                }
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.emit_expr(value);
                }
                self.op(op::EXIT);
            }
        }
    }

    fn emit_let(&mut self, decl: &LetDecl) {
        if let Some(init) = &decl.init {
            self.emit_expr(init);
            self.cap_op(op::LOAD, &decl.name);
        }
    }

    /// Post-order: operands first, then the operator.
    fn emit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Number { value, .. } => {
                self.op(op::PUSHK);
                self.word(*value as u32);
            }
            Expr::Bool { value, .. } => {
                self.op(op::PUSHK);
                self.word(u32::from(*value));
            }
            Expr::Duration { nanos, .. } => {
                self.op(op::PUSHK);
                self.word(*nanos as u32);
            }
            Expr::Str { value, .. } => {
                let offset = self.rodata_offset(value);
                self.op(op::PUSHK);
                self.word(offset);
            }
            Expr::Var { name, .. } => {
                self.op(op::PUSHCAP);
                self.word(fnv1a(name));
            }
            Expr::Unary { op: un, operand, .. } => {
                self.emit_expr(operand);
                self.op(op::UN);
                self.byte(un_sub_code(*un));
            }
            Expr::Binary { op: bin, lhs, rhs, .. } => {
                self.emit_expr(lhs);
                self.emit_expr(rhs);
                self.op(op::BIN);
                self.byte(bin_sub_code(*bin));
            }
            Expr::Call { func, args, .. } => {
                for arg in args {
                    self.emit_expr(arg);
                }
                self.op(op::CALL);
                self.placeholder(func.clone());
            }
        }
    }

    fn cap_op(&mut self, opcode: u8, name: &str) {
        self.op(opcode);
        self.word(fnv1a(name));
    }

    fn op(&mut self, opcode: u8) {
        self.text.push(opcode);
    }

    fn byte(&mut self, value: u8) {
        self.text.push(value);
    }

    fn word(&mut self, value: u32) {
        self.text.extend_from_slice(&value.to_le_bytes());
    }

    /// Write the placeholder and record a relocation under `symbol`.
    fn placeholder(&mut self, symbol: String) {
        let at = self.text.len();
        self.word(op::PLACEHOLDER);
        self.relocs.push(Reloc { at, symbol });
    }

    /// Write the placeholder for a branch patched later in this pass.
    fn word_placeholder(&mut self) -> usize {
        let at = self.text.len();
        self.word(op::PLACEHOLDER);
        at
    }

    fn patch(&mut self, at: usize, value: u32) {
        self.text[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn here(&self) -> u32 {
        self.text.len() as u32
    }

    /// Append the string plus a trailing NUL and return its start offset.
    fn rodata_offset(&mut self, value: &str) -> u32 {
        let offset = self.rodata.len() as u32;
        self.rodata.extend_from_slice(value.as_bytes());
        self.rodata.push(0);
        offset
    }
}

fn literal_word(expr: &Expr) -> u32 {
    match expr {
        Expr::Number { value, .. } => *value as u32,
        Expr::Bool { value, .. } => u32::from(*value),
        Expr::Duration { nanos, .. } => *nanos as u32,
        Expr::Str { .. }
        | Expr::Var { .. }
        | Expr::Call { .. }
        | Expr::Unary { .. }
        | Expr::Binary { .. } => 0,
    }
}

fn un_sub_code(un: UnOp) -> u8 {
    match un {
        UnOp::Not => op::UN_NOT,
        UnOp::Neg => op::UN_NEG,
        UnOp::BitNot => op::UN_BITNOT,
    }
}

fn bin_sub_code(bin: BinOp) -> u8 {
    match bin {
        BinOp::Or => op::BIN_OR,
        BinOp::And => op::BIN_AND,
        BinOp::Eq => op::BIN_EQ,
        BinOp::Ne => op::BIN_NE,
        BinOp::Lt => op::BIN_LT,
        BinOp::Gt => op::BIN_GT,
        BinOp::Le => op::BIN_LE,
        BinOp::Ge => op::BIN_GE,
        BinOp::Add => op::BIN_ADD,
        BinOp::Sub => op::BIN_SUB,
        BinOp::Mul => op::BIN_MUL,
        BinOp::Div => op::BIN_DIV,
        BinOp::Mod => op::BIN_MOD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse;
    use pretty_assertions::assert_eq;

    fn emit(src: &str) -> Emitter {
        let program = parse(src).expect("parse");
        let mut emitter = Emitter::new();
        emitter.emit_program(&program);
        emitter
    }

    fn word_at(text: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(text[at..at + 4].try_into().expect("word"))
    }

    #[test]
    fn fnv1a_is_deterministic_and_matches_reference_vectors() {
        // Reference values for FNV-1a 32-bit.
        assert_eq!(fnv1a(""), 0x811C_9DC5);
        assert_eq!(fnv1a("a"), 0xE40C_292C);
        assert_eq!(fnv1a("foobar"), 0xBF9C_F968);
        assert_eq!(fnv1a("$x"), fnv1a("$x"));
        assert_ne!(fnv1a("$x"), fnv1a("$y"));
    }

    #[test]
    fn empty_entry_block_emits_nothing() {
        let emitter = emit("@main { }");
        assert!(emitter.text.is_empty());
        assert!(emitter.rodata.is_empty());
        assert!(emitter.functions.is_empty());
    }

    #[test]
    fn init_emits_opcode_and_hashed_capsule() {
        let emitter = emit("@main { #init $a }");
        assert_eq!(emitter.text.len(), 5);
        assert_eq!(emitter.text[0], op::INIT);
        assert_eq!(word_at(&emitter.text, 1), fnv1a("$a"));
    }

    #[test]
    fn let_with_initializer_emits_expression_then_load() {
        let emitter = emit("@main { let $x: u32 = 2 + 3; }");
        let text = &emitter.text;
        assert_eq!(text[0], op::PUSHK);
        assert_eq!(word_at(text, 1), 2);
        assert_eq!(text[5], op::PUSHK);
        assert_eq!(word_at(text, 6), 3);
        assert_eq!(text[10], op::BIN);
        assert_eq!(text[11], op::BIN_ADD);
        assert_eq!(text[12], op::LOAD);
        assert_eq!(word_at(text, 13), fnv1a("$x"));
        assert_eq!(text.len(), 17);
    }

    #[test]
    fn sleep_operand_is_the_low_32_bits_of_nanoseconds() {
        let emitter = emit("@main { #sleep 5ms }");
        assert_eq!(emitter.text[0], op::SLEEP);
        assert_eq!(word_at(&emitter.text, 1), 5_000_000);
    }

    #[test]
    fn if_else_patches_both_branch_targets() {
        let emitter = emit("@main { #if (1) { #init $a } #else { #init $b } #endif }");
        let text = &emitter.text;
        // PUSHK 1 | JZ -> else | INIT $a | JMP -> end | INIT $b
        assert_eq!(text[5], op::JZ);
        assert_eq!(word_at(text, 6), 20, "JZ lands on the else branch");
        assert_eq!(text[15], op::JMP);
        assert_eq!(word_at(text, 16), 25, "JMP lands one past the else branch");
        assert_eq!(text[20], op::INIT);
        assert_eq!(word_at(text, 21), fnv1a("$b"));
        assert_eq!(text.len(), 25);
    }

    #[test]
    fn if_without_else_patches_to_end() {
        let emitter = emit("@main { #if (1) { #init $a } #endif }");
        let text = &emitter.text;
        assert_eq!(text[5], op::JZ);
        assert_eq!(word_at(text, 6), text.len() as u32);
    }

    #[test]
    fn loop_jumps_back_to_the_condition() {
        let emitter = emit("@main { #init $n #loop ($n < 3) { #yield } }");
        let text = &emitter.text;
        // INIT(5) | PUSHCAP(5) PUSHK(5) BIN(2) | JZ(5) | YIELD(1) | JMP(5)
        let start = 5;
        let jmp_at = text.len() - 5;
        assert_eq!(text[jmp_at], op::JMP);
        assert_eq!(word_at(text, jmp_at + 1), start as u32);
        let jz_at = 5 + 12;
        assert_eq!(text[jz_at], op::JZ);
        assert_eq!(word_at(text, jz_at + 1), text.len() as u32);
    }

    #[test]
    fn goto_records_a_relocation_and_label_records_an_offset() {
        let emitter = emit("@main { :top #yield goto :top; }");
        assert_eq!(emitter.labels.get(":top"), Some(&0));
        assert_eq!(emitter.text[1], op::JMP);
        assert_eq!(
            emitter.relocs,
            vec![Reloc {
                at: 2,
                symbol: ":top".to_string()
            }]
        );
        assert_eq!(word_at(&emitter.text, 2), op::PLACEHOLDER);
    }

    #[test]
    fn functions_get_symbols_and_a_trailing_exit() {
        let emitter = emit("function $f() { #yield } @main { }");
        assert_eq!(emitter.functions.get("$f"), Some(&0));
        assert_eq!(emitter.labels.get("$f"), Some(&0));
        assert_eq!(emitter.text, vec![op::YIELD, op::EXIT]);
    }

    #[test]
    fn call_emits_argument_then_placeholder_relocation() {
        let emitter = emit("function $f() { #exit } @main { #call $f, 0 }");
        let text = &emitter.text;
        // $f: EXIT, EXIT | main: PUSHK 0, CALL <reloc>
        assert_eq!(text[2], op::PUSHK);
        assert_eq!(text[7], op::CALL);
        assert_eq!(
            emitter.relocs,
            vec![Reloc {
                at: 8,
                symbol: "$f".to_string()
            }]
        );
    }

    #[test]
    fn spawn_relocates_like_call() {
        let emitter = emit("worker $w() { #yield } @main { #spawn $w, 1 }");
        let text = &emitter.text;
        assert_eq!(text[2], op::PUSHK);
        assert_eq!(text[7], op::SPAWN);
        assert_eq!(emitter.relocs[0].symbol, "$w");
    }

    #[test]
    fn strings_land_in_rodata_with_nul_terminators() {
        let emitter = emit("@main { #error $c, 7, \"boom\" #error $c, 8, \"pow\" }");
        assert_eq!(emitter.rodata, b"boom\0pow\0");
        let text = &emitter.text;
        assert_eq!(text[0], op::ERROR);
        assert_eq!(word_at(text, 1), fnv1a("$c"));
        assert_eq!(word_at(text, 5), 7);
        assert_eq!(word_at(text, 9), 0);
        assert_eq!(word_at(text, 13 + 9), 5, "second message offset");
    }

    #[test]
    fn stamp_encodes_boolean_literals_as_zero_or_one() {
        let emitter = emit("@main { #init $s #stamp $s, true }");
        let text = &emitter.text;
        assert_eq!(text[5], op::STAMP);
        assert_eq!(word_at(text, 10), 1);
    }

    #[test]
    fn print_lowers_to_output_zero_per_argument() {
        let emitter = emit("@main { print 1, 2; }");
        let text = &emitter.text;
        assert_eq!(text[5], op::OUTPUT);
        assert_eq!(word_at(text, 6), 0);
        assert_eq!(text[15], op::OUTPUT);
        assert_eq!(word_at(text, 16), 0);
    }

    #[test]
    fn unary_sub_codes_follow_the_fixed_mapping() {
        let emitter = emit("@main { #load $x, -~!1 }");
        let text = &emitter.text;
        // PUSHK 1 | UN ! | UN ~ | UN -
        assert_eq!(&text[5..11], &[op::UN, op::UN_NOT, op::UN, op::UN_BITNOT, op::UN, op::UN_NEG]);
    }

    #[test]
    fn text_length_is_a_deterministic_function_of_the_source() {
        let src = "function $f() { #exit } @main { #call $f, 1 + 2 }";
        let first = emit(src);
        let second = emit(src);
        assert_eq!(first.text, second.text);
        assert_eq!(first.rodata, second.rodata);
    }
}
