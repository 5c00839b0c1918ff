// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Star-code validation.
//!
//! Walks the AST and produces a diagnostic list. Warnings never halt
//! compilation; any error diagnostic does.

use std::collections::HashSet;

use crate::compiler::ast::{Block, Expr, Item, Program, Stmt};
use crate::compiler::error::{Diagnostic, Severity};
use crate::compiler::token::Pos;

/// Durations above this many nanoseconds only warn; the emitter truncates
/// operands to 32 bits regardless.
const DURATION_LIMIT_NS: u64 = 9_000_000_000_000_000_000;

/// Validate a program and return its diagnostics in source order.
pub fn validate(program: &Program) -> Vec<Diagnostic> {
    let mut checker = Checker::default();
    checker.collect_declarations(program);
    for item in &program.items {
        match item {
            Item::Entry { block, .. } => checker.check_block(block),
            Item::Function { body, .. } | Item::Worker { body, .. } => checker.check_block(body),
            _ => {}
        }
    }
    checker.check_gotos();
    checker.diagnostics
}

#[derive(Default)]
struct Checker {
    diagnostics: Vec<Diagnostic>,
    labels: HashSet<String>,
    declared: HashSet<String>,
    inited: HashSet<String>,
    leased: HashSet<String>,
    gotos: Vec<(String, Pos)>,
}

impl Checker {
    /// First pass: labels and declared names, regardless of lexical order.
    fn collect_declarations(&mut self, program: &Program) {
        for item in &program.items {
            match item {
                Item::Entry { block, .. } => self.collect_in_block(block),
                Item::Function { params, body, .. } | Item::Worker { params, body, .. } => {
                    for param in params {
                        self.declared.insert(param.name.clone());
                    }
                    self.collect_in_block(body);
                }
                Item::Let(decl) => {
                    self.declared.insert(decl.name.clone());
                }
                _ => {}
            }
        }
    }

    fn collect_in_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            match stmt {
                Stmt::Label { name, .. } => {
                    self.labels.insert(name.clone());
                }
                Stmt::Let(decl) => {
                    self.declared.insert(decl.name.clone());
                }
                Stmt::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    self.collect_in_block(then_block);
                    if let Some(else_block) = else_block {
                        self.collect_in_block(else_block);
                    }
                }
                Stmt::Loop { body, .. } => self.collect_in_block(body),
                _ => {}
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Init { target, .. } => {
                self.inited.insert(target.clone());
            }
            Stmt::Load { target, pos, .. }
            | Stmt::Render { target, pos }
            | Stmt::Input { target, pos }
            | Stmt::Output { target, pos }
            | Stmt::Stamp { target, pos, .. } => {
                self.warn_if_unknown(target, "capsule", *pos);
            }
            Stmt::Send { chan, packet, pos } | Stmt::Recv { chan, packet, pos } => {
                self.warn_if_unknown(chan, "channel", *pos);
                self.warn_if_unknown(packet, "packet", *pos);
            }
            Stmt::Lease { target, pos } => {
                if !self.leased.insert(target.clone()) {
                    self.error(
                        format!("capsule {target} leased twice without release"),
                        *pos,
                    );
                }
            }
            Stmt::Sublease { target, pos } => {
                if !self.leased.contains(target) {
                    self.warn(format!("sublease of capsule {target} that is not leased"), *pos);
                }
            }
            Stmt::Release { target, pos } => {
                if !self.leased.remove(target) {
                    self.warn(format!("release of capsule {target} that is not leased"), *pos);
                }
            }
            Stmt::Expire { target, nanos, pos } => {
                self.warn_if_unknown(target, "capsule", *pos);
                self.check_duration(*nanos, *pos);
            }
            Stmt::Sleep { nanos, pos } => self.check_duration(*nanos, *pos),
            Stmt::Goto { name, pos } => self.gotos.push((name.clone(), *pos)),
            Stmt::If {
                cond,
                then_block,
                else_block,
                pos,
            } => {
                self.check_condition(cond, *pos);
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }
            Stmt::Loop { cond, body, pos } => {
                self.check_condition(cond, *pos);
                self.check_block(body);
            }
            _ => {}
        }
    }

    fn check_condition(&mut self, cond: &Expr, pos: Pos) {
        if matches!(cond, Expr::Number { .. } | Expr::Str { .. }) {
            self.warn("non-bool literal used as condition", pos);
        }
    }

    fn check_duration(&mut self, nanos: u64, pos: Pos) {
        if nanos > DURATION_LIMIT_NS {
            self.warn("duration too large", pos);
        }
    }

    fn check_gotos(&mut self) {
        let gotos = std::mem::take(&mut self.gotos);
        for (name, pos) in gotos {
            if !self.labels.contains(&name) {
                self.error(format!("goto to undefined label: {name}"), pos);
            }
        }
    }

    fn warn_if_unknown(&mut self, name: &str, role: &str, pos: Pos) {
        if !self.inited.contains(name) && !self.declared.contains(name) {
            self.warn(format!("{role} {name} used before init"), pos);
        }
    }

    fn warn(&mut self, message: impl Into<String>, pos: Pos) {
        self.diagnostics
            .push(Diagnostic::new(Severity::Warning, message, pos.line, pos.column));
    }

    fn error(&mut self, message: impl Into<String>, pos: Pos) {
        self.diagnostics
            .push(Diagnostic::new(Severity::Error, message, pos.line, pos.column));
    }
}
