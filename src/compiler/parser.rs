// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Parser for E Minor source.
//!
//! Recursive descent for declarations and statements, precedence climbing
//! for expressions. The parser owns the lexer plus a one-token lookahead
//! buffer and fails fast on the first malformed token.

use std::mem;

use crate::compiler::ast::{
    BinOp, Block, EntryKind, Expr, Item, LetDecl, Param, Program, Stmt, TypeRef, UnOp,
};
use crate::compiler::lexer::{decode_string, Lexer};
use crate::compiler::token::{Pos, Token, TokenKind};

type Result<T, E = ParseError> = std::result::Result<T, E>;

/// A fatal parse (or propagated lex) error with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub pos: Pos,
    /// True when the error originated as a lexer `Error` token.
    pub lexical: bool,
}

/// Parse a whole source file.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source).parse_program()
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    look: Token,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let look = lexer.next_token();
        Self { lexer, look }
    }

    pub fn parse_program(&mut self) -> Result<Program> {
        let mut items = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::End => break,
                TokenKind::AtMain | TokenKind::AtEntryPoint => items.push(self.parse_entry()?),
                TokenKind::AtModule => items.push(self.parse_module()?),
                TokenKind::AtImport => items.push(self.parse_import()?),
                TokenKind::AtExport => items.push(self.parse_export()?),
                TokenKind::KwFunction => items.push(self.parse_function()?),
                TokenKind::KwWorker => items.push(self.parse_worker()?),
                TokenKind::KwLet => items.push(Item::Let(self.parse_let()?)),
                _ => return self.fail("expected declaration or entry block"),
            }
        }
        Ok(Program { items })
    }

    fn parse_entry(&mut self) -> Result<Item> {
        let tok = self.advance();
        let kind = match tok.kind {
            TokenKind::AtMain => EntryKind::Main,
            _ => EntryKind::EntryPoint,
        };
        let block = self.parse_block()?;
        Ok(Item::Entry {
            kind,
            block,
            pos: tok.pos,
        })
    }

    fn parse_module(&mut self) -> Result<Item> {
        let tok = self.advance();
        let path = self.expect(TokenKind::Str, "module path string")?;
        Ok(Item::Module {
            path: decode_string(&path.text),
            pos: tok.pos,
        })
    }

    fn parse_import(&mut self) -> Result<Item> {
        let tok = self.advance();
        let path = self.expect(TokenKind::Str, "import path string")?;
        let alias = if self.look.kind == TokenKind::Ident && self.look.text == "as" {
            self.advance();
            Some(self.parse_name()?)
        } else {
            None
        };
        Ok(Item::Import {
            path: decode_string(&path.text),
            alias,
            pos: tok.pos,
        })
    }

    fn parse_export(&mut self) -> Result<Item> {
        let tok = self.advance();
        self.eat(TokenKind::KwFunction);
        let name = self.parse_name()?;
        Ok(Item::Export {
            name,
            pos: tok.pos,
        })
    }

    fn parse_function(&mut self) -> Result<Item> {
        let kw = self.advance();
        let name = self.parse_name()?;
        let params = self.parse_params()?;
        let ret = if self.eat(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Item::Function {
            name,
            params,
            ret,
            body,
            pos: kw.pos,
        })
    }

    fn parse_worker(&mut self) -> Result<Item> {
        let kw = self.advance();
        let name = self.parse_name()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(Item::Worker {
            name,
            params,
            body,
            pos: kw.pos,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.eat(TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param> {
        let name_tok = self.expect(TokenKind::Ident, "parameter name")?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        Ok(Param {
            name: name_tok.text,
            ty,
            pos: name_tok.pos,
        })
    }

    fn parse_let(&mut self) -> Result<LetDecl> {
        let kw = self.expect(TokenKind::KwLet, "'let'")?;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon, "':'")?;
        let ty = self.parse_type()?;
        let init = if self.eat(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(LetDecl {
            name,
            ty,
            init,
            pos: kw.pos,
        })
    }

    fn parse_type(&mut self) -> Result<TypeRef> {
        match self.peek_kind()? {
            TokenKind::KwByte => {
                self.advance();
                self.expect(TokenKind::LBracket, "'['")?;
                let size = self.expect(TokenKind::Number, "array size")?;
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(TypeRef::ByteArray {
                    size: size.number as u64,
                })
            }
            TokenKind::KwCapsule => {
                self.advance();
                self.expect(TokenKind::Lt, "'<'")?;
                let inner = self.parse_type()?;
                self.expect(TokenKind::Gt, "'>'")?;
                Ok(TypeRef::Capsule {
                    inner: Box::new(inner),
                })
            }
            TokenKind::KwPacket => {
                self.advance();
                self.expect(TokenKind::Lt, "'<'")?;
                let inner = self.parse_type()?;
                self.expect(TokenKind::Gt, "'>'")?;
                Ok(TypeRef::Packet {
                    inner: Box::new(inner),
                })
            }
            kind if is_prim_type(kind) => {
                let tok = self.advance();
                Ok(TypeRef::Prim { name: tok.text })
            }
            _ => self.fail("expected type"),
        }
    }

    fn parse_block(&mut self) -> Result<Block> {
        let lb = self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind()? {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::End => return self.fail("unterminated block"),
                TokenKind::KwLet => stmts.push(Stmt::Let(self.parse_let()?)),
                _ => stmts.push(self.parse_statement()?),
            }
        }
        Ok(Block {
            stmts,
            pos: lb.pos,
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let stmt = self.parse_statement_inner()?;
        // Simple statements permit an optional trailing terminator.
        self.eat(TokenKind::Semicolon);
        Ok(stmt)
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt> {
        use TokenKind::*;

        match self.peek_kind()? {
            Label => {
                let tok = self.advance();
                Ok(Stmt::Label {
                    name: tok.label_name().to_string(),
                    pos: tok.pos,
                })
            }
            HashInit => self.parse_target_stmt(|target, pos| Stmt::Init { target, pos }),
            HashLease => self.parse_target_stmt(|target, pos| Stmt::Lease { target, pos }),
            HashSublease => self.parse_target_stmt(|target, pos| Stmt::Sublease { target, pos }),
            HashRelease => self.parse_target_stmt(|target, pos| Stmt::Release { target, pos }),
            HashRender => self.parse_target_stmt(|target, pos| Stmt::Render { target, pos }),
            HashInput => self.parse_target_stmt(|target, pos| Stmt::Input { target, pos }),
            HashOutput => self.parse_target_stmt(|target, pos| Stmt::Output { target, pos }),
            HashJoin => self.parse_target_stmt(|target, pos| Stmt::Join { target, pos }),
            HashLoad => {
                let tok = self.advance();
                let target = self.parse_name()?;
                self.expect(Comma, "','")?;
                let value = self.parse_expr()?;
                Ok(Stmt::Load {
                    target,
                    value,
                    pos: tok.pos,
                })
            }
            HashCall => {
                let tok = self.advance();
                let func = self.parse_name()?;
                let arg = if self.eat(Comma) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(Stmt::Call {
                    func,
                    arg,
                    pos: tok.pos,
                })
            }
            HashExit => {
                let tok = self.advance();
                Ok(Stmt::Exit { pos: tok.pos })
            }
            HashYield => {
                let tok = self.advance();
                Ok(Stmt::Yield { pos: tok.pos })
            }
            HashSend => {
                let tok = self.advance();
                let chan = self.parse_name()?;
                self.expect(Comma, "','")?;
                let packet = self.parse_name()?;
                Ok(Stmt::Send {
                    chan,
                    packet,
                    pos: tok.pos,
                })
            }
            HashRecv => {
                let tok = self.advance();
                let chan = self.parse_name()?;
                self.expect(Comma, "','")?;
                let packet = self.parse_name()?;
                Ok(Stmt::Recv {
                    chan,
                    packet,
                    pos: tok.pos,
                })
            }
            HashSpawn => {
                let tok = self.advance();
                let func = self.parse_name()?;
                let mut args = Vec::new();
                while self.eat(Comma) {
                    args.push(self.parse_expr()?);
                }
                Ok(Stmt::Spawn {
                    func,
                    args,
                    pos: tok.pos,
                })
            }
            HashStamp => {
                let tok = self.advance();
                let target = self.parse_name()?;
                self.expect(Comma, "','")?;
                let value = self.parse_stamp_literal()?;
                Ok(Stmt::Stamp {
                    target,
                    value,
                    pos: tok.pos,
                })
            }
            HashExpire => {
                let tok = self.advance();
                let target = self.parse_name()?;
                self.expect(Comma, "','")?;
                let dur = self.expect(Duration, "duration literal")?;
                Ok(Stmt::Expire {
                    target,
                    nanos: dur.nanos,
                    pos: tok.pos,
                })
            }
            HashSleep => {
                let tok = self.advance();
                let dur = self.expect(Duration, "duration literal")?;
                Ok(Stmt::Sleep {
                    nanos: dur.nanos,
                    pos: tok.pos,
                })
            }
            HashError => {
                let tok = self.advance();
                let target = self.parse_name()?;
                self.expect(Comma, "','")?;
                let code = self.expect(Number, "number literal")?;
                self.expect(Comma, "','")?;
                let msg = self.expect(Str, "string literal")?;
                Ok(Stmt::Error {
                    target,
                    code: code.number,
                    message: decode_string(&msg.text),
                    pos: tok.pos,
                })
            }
            HashIf => {
                let tok = self.advance();
                self.expect(LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(RParen, "')'")?;
                let then_block = self.parse_block()?;
                let else_block = if self.eat(HashElse) {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                self.expect(HashEndif, "'#endif'")?;
                Ok(Stmt::If {
                    cond,
                    then_block,
                    else_block,
                    pos: tok.pos,
                })
            }
            HashLoop => {
                let tok = self.advance();
                self.expect(LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(RParen, "')'")?;
                let body = self.parse_block()?;
                Ok(Stmt::Loop {
                    cond,
                    body,
                    pos: tok.pos,
                })
            }
            KwIf => {
                let tok = self.advance();
                self.expect(LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(RParen, "')'")?;
                let then_block = self.parse_block()?;
                let else_block = if self.eat(KwElse) {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_block,
                    else_block,
                    pos: tok.pos,
                })
            }
            KwLoop => {
                let tok = self.advance();
                self.expect(LParen, "'('")?;
                let cond = self.parse_expr()?;
                self.expect(RParen, "')'")?;
                let body = self.parse_block()?;
                Ok(Stmt::Loop {
                    cond,
                    body,
                    pos: tok.pos,
                })
            }
            KwInitialize => {
                let tok = self.advance();
                self.eat(KwCapsule);
                let target = self.parse_name()?;
                Ok(Stmt::Init {
                    target,
                    pos: tok.pos,
                })
            }
            KwAssign => {
                let tok = self.advance();
                self.expect(KwValue, "'value'")?;
                let value = self.parse_expr()?;
                self.expect(KwTo, "'to'")?;
                self.eat(KwCapsule);
                let target = self.parse_name()?;
                Ok(Stmt::Load {
                    target,
                    value,
                    pos: tok.pos,
                })
            }
            KwInvoke => {
                let tok = self.advance();
                self.expect(KwFunction, "'function'")?;
                let func = self.parse_name()?;
                let arg = if self.eat(KwWith) {
                    self.eat(KwCapsule);
                    let name_tok = self.expect(Ident, "capsule name")?;
                    Some(Expr::Var {
                        name: name_tok.text,
                        pos: name_tok.pos,
                    })
                } else {
                    None
                };
                Ok(Stmt::Call {
                    func,
                    arg,
                    pos: tok.pos,
                })
            }
            KwTerminate => {
                let tok = self.advance();
                self.eat(KwExecution);
                Ok(Stmt::Exit { pos: tok.pos })
            }
            KwGoto => {
                let tok = self.advance();
                let label = self.expect(Label, "label")?;
                Ok(Stmt::Goto {
                    name: label.label_name().to_string(),
                    pos: tok.pos,
                })
            }
            KwPrint => {
                let tok = self.advance();
                let mut args = vec![self.parse_expr()?];
                while self.eat(Comma) {
                    args.push(self.parse_expr()?);
                }
                Ok(Stmt::Print {
                    args,
                    pos: tok.pos,
                })
            }
            KwReturn => {
                let tok = self.advance();
                let value = if starts_expr(self.look.kind) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(Stmt::Return {
                    value,
                    pos: tok.pos,
                })
            }
            _ => self.fail("expected statement"),
        }
    }

    fn parse_target_stmt(&mut self, build: impl FnOnce(String, Pos) -> Stmt) -> Result<Stmt> {
        let tok = self.advance();
        let target = self.parse_name()?;
        Ok(build(target, tok.pos))
    }

    /// A `#stamp` value is restricted to a boolean or number literal.
    fn parse_stamp_literal(&mut self) -> Result<Expr> {
        match self.peek_kind()? {
            TokenKind::Number => {
                let tok = self.advance();
                Ok(Expr::Number {
                    value: tok.number,
                    pos: tok.pos,
                })
            }
            TokenKind::Bool => {
                let tok = self.advance();
                Ok(Expr::Bool {
                    value: tok.flag,
                    pos: tok.pos,
                })
            }
            _ => self.fail("expected boolean or number literal"),
        }
    }

    // --- Expressions ---

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(1)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, bp)) = binary_op(self.look.kind) {
            if bp < min_bp {
                break;
            }
            let pos = lhs.pos();
            self.advance();
            let rhs = self.parse_expr_bp(bp + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                pos,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind()? {
            TokenKind::Bang => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Tilde => Some(UnOp::BitNot),
            _ => None,
        };
        match op {
            Some(op) => {
                let tok = self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    pos: tok.pos,
                })
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek_kind()? {
            TokenKind::Number => {
                let tok = self.advance();
                Ok(Expr::Number {
                    value: tok.number,
                    pos: tok.pos,
                })
            }
            TokenKind::Str => {
                let tok = self.advance();
                Ok(Expr::Str {
                    value: decode_string(&tok.text),
                    pos: tok.pos,
                })
            }
            TokenKind::Bool => {
                let tok = self.advance();
                Ok(Expr::Bool {
                    value: tok.flag,
                    pos: tok.pos,
                })
            }
            TokenKind::Duration => {
                let tok = self.advance();
                Ok(Expr::Duration {
                    nanos: tok.nanos,
                    pos: tok.pos,
                })
            }
            TokenKind::Ident => {
                let tok = self.advance();
                if self.eat(TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.eat(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect(TokenKind::RParen, "')'")?;
                    }
                    Ok(Expr::Call {
                        func: tok.text,
                        args,
                        pos: tok.pos,
                    })
                } else {
                    Ok(Expr::Var {
                        name: tok.text,
                        pos: tok.pos,
                    })
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => self.fail("expected expression"),
        }
    }

    // --- Token plumbing ---

    fn peek_kind(&self) -> Result<TokenKind> {
        if self.look.kind == TokenKind::Error {
            return Err(self.lex_error());
        }
        Ok(self.look.kind)
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        mem::replace(&mut self.look, next)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.look.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.look.kind == TokenKind::Error {
            return Err(self.lex_error());
        }
        if self.look.kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError {
                message: format!("expected {what} but got {:?}", self.look.kind),
                pos: self.look.pos,
                lexical: false,
            })
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::Ident, "identifier")?.text)
    }

    fn fail<T>(&self, what: &str) -> Result<T> {
        if self.look.kind == TokenKind::Error {
            return Err(self.lex_error());
        }
        Err(ParseError {
            message: format!("{what} but got {:?}", self.look.kind),
            pos: self.look.pos,
            lexical: false,
        })
    }

    fn lex_error(&self) -> ParseError {
        ParseError {
            message: self.look.text.clone(),
            pos: self.look.pos,
            lexical: true,
        }
    }
}

fn starts_expr(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Number
            | TokenKind::Str
            | TokenKind::Bool
            | TokenKind::Duration
            | TokenKind::Ident
            | TokenKind::LParen
            | TokenKind::Bang
            | TokenKind::Minus
            | TokenKind::Tilde
    )
}

fn is_prim_type(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KwU8
            | TokenKind::KwU16
            | TokenKind::KwU32
            | TokenKind::KwU64
            | TokenKind::KwI8
            | TokenKind::KwI16
            | TokenKind::KwI32
            | TokenKind::KwI64
            | TokenKind::KwF32
            | TokenKind::KwF64
            | TokenKind::KwBool
            | TokenKind::KwStamp
            | TokenKind::KwDuration
    )
}

fn binary_op(kind: TokenKind) -> Option<(BinOp, u8)> {
    Some(match kind {
        TokenKind::OrOr => (BinOp::Or, 1),
        TokenKind::AndAnd => (BinOp::And, 2),
        TokenKind::EqEq => (BinOp::Eq, 3),
        TokenKind::BangEq => (BinOp::Ne, 3),
        TokenKind::Lt => (BinOp::Lt, 4),
        TokenKind::Gt => (BinOp::Gt, 4),
        TokenKind::Le => (BinOp::Le, 4),
        TokenKind::Ge => (BinOp::Ge, 4),
        TokenKind::Plus => (BinOp::Add, 5),
        TokenKind::Minus => (BinOp::Sub, 5),
        TokenKind::Star => (BinOp::Mul, 6),
        TokenKind::Slash => (BinOp::Div, 6),
        TokenKind::Percent => (BinOp::Mod, 6),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_one_stmt(body: &str) -> Stmt {
        let src = format!("@main {{ {body} }}");
        let program = parse(&src).expect("parse");
        let Item::Entry { block, .. } = &program.items[0] else {
            panic!("expected entry block");
        };
        assert_eq!(block.stmts.len(), 1, "statement count in {src}");
        block.stmts[0].clone()
    }

    #[test]
    fn parses_empty_entry_block() {
        let program = parse("@main { }").expect("parse");
        assert_eq!(program.items.len(), 1);
        let Item::Entry { kind, block, .. } = &program.items[0] else {
            panic!("expected entry block");
        };
        assert_eq!(*kind, EntryKind::Main);
        assert!(block.stmts.is_empty());
    }

    #[test]
    fn shortcode_and_long_form_map_to_the_same_statements() {
        let short = parse_one_stmt("#init $c");
        let long = parse_one_stmt("initialize capsule $c");
        assert_eq!(short, long_with_pos(long, &short));

        let short = parse_one_stmt("#exit");
        let long = parse_one_stmt("terminate execution");
        assert_eq!(short, long_with_pos(long, &short));
    }

    // Long-form statements land on different columns; normalize before
    // comparing shapes.
    fn long_with_pos(mut stmt: Stmt, like: &Stmt) -> Stmt {
        match (&mut stmt, like) {
            (Stmt::Init { pos, .. }, Stmt::Init { pos: p, .. }) => *pos = *p,
            (Stmt::Exit { pos }, Stmt::Exit { pos: p }) => *pos = *p,
            _ => {}
        }
        stmt
    }

    #[test]
    fn assign_value_maps_to_load() {
        let stmt = parse_one_stmt("assign value 7 to capsule $c");
        let Stmt::Load { target, value, .. } = stmt else {
            panic!("expected load");
        };
        assert_eq!(target, "$c");
        assert!(matches!(value, Expr::Number { value: 7, .. }));
    }

    #[test]
    fn invoke_function_maps_to_call() {
        let stmt = parse_one_stmt("invoke function $f with capsule $c");
        let Stmt::Call { func, arg, .. } = stmt else {
            panic!("expected call");
        };
        assert_eq!(func, "$f");
        assert!(matches!(arg, Some(Expr::Var { ref name, .. }) if name == "$c"));
    }

    #[test]
    fn precedence_binds_mul_tighter_than_add() {
        let stmt = parse_one_stmt("#load $x, 1 + 2 * 3");
        let Stmt::Load { value, .. } = stmt else {
            panic!("expected load");
        };
        let Expr::Binary { op: BinOp::Add, rhs, .. } = value else {
            panic!("expected add at the root");
        };
        assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let stmt = parse_one_stmt("#load $x, 10 - 4 - 3");
        let Stmt::Load { value, .. } = stmt else {
            panic!("expected load");
        };
        let Expr::Binary { op: BinOp::Sub, lhs, rhs, .. } = value else {
            panic!("expected sub at the root");
        };
        assert!(matches!(*lhs, Expr::Binary { op: BinOp::Sub, .. }));
        assert!(matches!(*rhs, Expr::Number { value: 3, .. }));
    }

    #[test]
    fn unary_is_right_associative() {
        let stmt = parse_one_stmt("#load $x, !!$y");
        let Stmt::Load { value, .. } = stmt else {
            panic!("expected load");
        };
        let Expr::Unary { op: UnOp::Not, operand, .. } = value else {
            panic!("expected not");
        };
        assert!(matches!(*operand, Expr::Unary { op: UnOp::Not, .. }));
    }

    #[test]
    fn parses_label_and_goto() {
        let src = "@main { :top goto :top; }";
        let program = parse(src).expect("parse");
        let Item::Entry { block, .. } = &program.items[0] else {
            panic!("expected entry block");
        };
        assert!(matches!(&block.stmts[0], Stmt::Label { name, .. } if name == "top"));
        assert!(matches!(&block.stmts[1], Stmt::Goto { name, .. } if name == "top"));
    }

    #[test]
    fn parses_let_with_initializer() {
        let stmt = parse_one_stmt("let $x: u32 = 2 + 3;");
        let Stmt::Let(decl) = stmt else {
            panic!("expected let");
        };
        assert_eq!(decl.name, "$x");
        assert!(matches!(decl.ty, TypeRef::Prim { ref name } if name == "u32"));
        assert!(matches!(decl.init, Some(Expr::Binary { op: BinOp::Add, .. })));
    }

    #[test]
    fn parses_compound_types() {
        let program = parse("let $buf: byte[16]; let $c: capsule<u8>; @main { }").expect("parse");
        let Item::Let(buf) = &program.items[0] else {
            panic!("expected let");
        };
        assert!(matches!(buf.ty, TypeRef::ByteArray { size: 16 }));
        let Item::Let(cap) = &program.items[1] else {
            panic!("expected let");
        };
        assert!(matches!(
            &cap.ty,
            TypeRef::Capsule { inner } if matches!(**inner, TypeRef::Prim { ref name } if name == "u8")
        ));
    }

    #[test]
    fn parses_if_else_endif() {
        let stmt = parse_one_stmt("#if ($x == 1) { #init $a } #else { #init $b } #endif");
        let Stmt::If { else_block, .. } = stmt else {
            panic!("expected if");
        };
        assert!(else_block.is_some());
    }

    #[test]
    fn missing_endif_is_a_parse_error() {
        let err = parse("@main { #if (1) { #exit } }").expect_err("must fail");
        assert!(err.message.contains("expected '#endif'"), "{}", err.message);
    }

    #[test]
    fn parses_function_with_params_and_return_type() {
        let src = "function $sum($a: u32, $b: u32): u32 { return $a + $b; } @main { }";
        let program = parse(src).expect("parse");
        let Item::Function { name, params, ret, body, .. } = &program.items[0] else {
            panic!("expected function");
        };
        assert_eq!(name, "$sum");
        assert_eq!(params.len(), 2);
        assert!(ret.is_some());
        assert!(matches!(&body.stmts[0], Stmt::Return { value: Some(_), .. }));
    }

    #[test]
    fn parses_worker_and_spawn() {
        let src = "worker $w($n: u32) { #yield } @main { #spawn $w, 1, 2 }";
        let program = parse(src).expect("parse");
        assert!(matches!(&program.items[0], Item::Worker { .. }));
        let Item::Entry { block, .. } = &program.items[1] else {
            panic!("expected entry block");
        };
        let Stmt::Spawn { func, args, .. } = &block.stmts[0] else {
            panic!("expected spawn");
        };
        assert_eq!(func, "$w");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn expire_rejects_non_duration_operand() {
        let err = parse("@main { #expire $c, 5 }").expect_err("must fail");
        assert!(
            err.message.contains("expected duration literal"),
            "{}",
            err.message
        );
    }

    #[test]
    fn error_statement_requires_number_then_string() {
        let stmt = parse_one_stmt("#error $c, 42, \"boom\"");
        let Stmt::Error { target, code, message, .. } = stmt else {
            panic!("expected error statement");
        };
        assert_eq!(target, "$c");
        assert_eq!(code, 42);
        assert_eq!(message, "boom");

        let err = parse("@main { #error $c, \"boom\", 42 }").expect_err("must fail");
        assert!(err.message.contains("expected number literal"));
    }

    #[test]
    fn module_import_export_declarations_parse() {
        let src = "@module \"core/app\" @import \"lib/net\" as $net @export function $f \
                   function $f() { #exit } @main { }";
        let program = parse(src).expect("parse");
        assert!(matches!(&program.items[0], Item::Module { path, .. } if path == "core/app"));
        assert!(matches!(
            &program.items[1],
            Item::Import { path, alias: Some(alias), .. } if path == "lib/net" && alias == "$net"
        ));
        assert!(matches!(&program.items[2], Item::Export { name, .. } if name == "$f"));
    }

    #[test]
    fn parse_error_reports_expected_versus_actual_with_position() {
        let err = parse("@main { #load $x 5 }").expect_err("must fail");
        assert!(err.message.contains("expected ','"), "{}", err.message);
        assert!(err.message.contains("Number"), "{}", err.message);
        assert_eq!((err.pos.line, err.pos.column), (1, 18));
        assert!(!err.lexical);
    }

    #[test]
    fn lexer_error_tokens_surface_as_lexical_errors() {
        let err = parse("@main { #bogus }").expect_err("must fail");
        assert!(err.lexical);
        assert!(err.message.contains("unknown directive '#bogus'"));
    }

    #[test]
    fn stray_top_level_statement_is_rejected() {
        let err = parse("#exit").expect_err("must fail");
        assert!(err.message.contains("expected declaration or entry block"));
    }
}
