// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token kinds and the fixed keyword/directive tables.

use phf::phf_map;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The closed set of token kinds.
///
/// Payloads (numeric value, boolean, nanoseconds) live on [`Token`], so the
/// kinds stay plain tags the parser can dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Punctuation.
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    // Operators.
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    Bar,
    Caret,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    BangEq,
    AndAnd,
    OrOr,
    // Literals.
    Number,
    Str,
    Bool,
    Duration,
    // Names.
    Ident,
    /// `:name` at token level; the lexeme keeps the leading colon.
    Label,
    // Long-form keywords.
    KwInitialize,
    KwCapsule,
    KwAssign,
    KwValue,
    KwTo,
    KwInvoke,
    KwFunction,
    KwWith,
    KwTerminate,
    KwExecution,
    KwIf,
    KwElse,
    KwLoop,
    KwGoto,
    KwWorker,
    KwLet,
    KwPrint,
    KwReturn,
    // Type keywords.
    KwU8,
    KwU16,
    KwU32,
    KwU64,
    KwI8,
    KwI16,
    KwI32,
    KwI64,
    KwF32,
    KwF64,
    KwBool,
    KwStamp,
    KwDuration,
    KwByte,
    KwPacket,
    // `#` directives.
    HashInit,
    HashLease,
    HashSublease,
    HashRelease,
    HashLoad,
    HashCall,
    HashExit,
    HashRender,
    HashInput,
    HashOutput,
    HashSend,
    HashRecv,
    HashSpawn,
    HashJoin,
    HashStamp,
    HashExpire,
    HashSleep,
    HashYield,
    HashError,
    HashIf,
    HashElse,
    HashEndif,
    HashLoop,
    // `@` directives.
    AtMain,
    AtEntryPoint,
    AtModule,
    AtImport,
    AtExport,
    // Terminators.
    End,
    /// Lexical error; the lexeme carries the diagnostic text.
    Error,
}

/// A lexical element with its original lexeme and payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: Pos,
    /// Numeric literal value.
    pub number: i64,
    /// Boolean literal value.
    pub flag: bool,
    /// Duration literal value in nanoseconds.
    pub nanos: u64,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, pos: Pos) -> Self {
        Self {
            kind,
            text,
            pos,
            number: 0,
            flag: false,
            nanos: 0,
        }
    }

    /// Label name without the leading colon.
    pub fn label_name(&self) -> &str {
        self.text.strip_prefix(':').unwrap_or(&self.text)
    }
}

/// Long-form keywords of the language.
pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "initialize" => TokenKind::KwInitialize,
    "capsule" => TokenKind::KwCapsule,
    "assign" => TokenKind::KwAssign,
    "value" => TokenKind::KwValue,
    "to" => TokenKind::KwTo,
    "invoke" => TokenKind::KwInvoke,
    "function" => TokenKind::KwFunction,
    "with" => TokenKind::KwWith,
    "terminate" => TokenKind::KwTerminate,
    "execution" => TokenKind::KwExecution,
    "if" => TokenKind::KwIf,
    "else" => TokenKind::KwElse,
    "loop" => TokenKind::KwLoop,
    "goto" => TokenKind::KwGoto,
    "worker" => TokenKind::KwWorker,
    "let" => TokenKind::KwLet,
    "print" => TokenKind::KwPrint,
    "return" => TokenKind::KwReturn,
    "u8" => TokenKind::KwU8,
    "u16" => TokenKind::KwU16,
    "u32" => TokenKind::KwU32,
    "u64" => TokenKind::KwU64,
    "i8" => TokenKind::KwI8,
    "i16" => TokenKind::KwI16,
    "i32" => TokenKind::KwI32,
    "i64" => TokenKind::KwI64,
    "f32" => TokenKind::KwF32,
    "f64" => TokenKind::KwF64,
    "bool" => TokenKind::KwBool,
    "stamp" => TokenKind::KwStamp,
    "duration" => TokenKind::KwDuration,
    "byte" => TokenKind::KwByte,
    "packet" => TokenKind::KwPacket,
};

/// `#`-prefixed operation directives.
pub static HASH_DIRECTIVES: phf::Map<&'static str, TokenKind> = phf_map! {
    "init" => TokenKind::HashInit,
    "lease" => TokenKind::HashLease,
    "sublease" => TokenKind::HashSublease,
    "release" => TokenKind::HashRelease,
    "load" => TokenKind::HashLoad,
    "call" => TokenKind::HashCall,
    "exit" => TokenKind::HashExit,
    "render" => TokenKind::HashRender,
    "input" => TokenKind::HashInput,
    "output" => TokenKind::HashOutput,
    "send" => TokenKind::HashSend,
    "recv" => TokenKind::HashRecv,
    "spawn" => TokenKind::HashSpawn,
    "join" => TokenKind::HashJoin,
    "stamp" => TokenKind::HashStamp,
    "expire" => TokenKind::HashExpire,
    "sleep" => TokenKind::HashSleep,
    "yield" => TokenKind::HashYield,
    "error" => TokenKind::HashError,
    "if" => TokenKind::HashIf,
    "else" => TokenKind::HashElse,
    "endif" => TokenKind::HashEndif,
    "loop" => TokenKind::HashLoop,
};

/// `@`-prefixed program-structure directives.
pub static AT_DIRECTIVES: phf::Map<&'static str, TokenKind> = phf_map! {
    "main" => TokenKind::AtMain,
    "entry_point" => TokenKind::AtEntryPoint,
    "module" => TokenKind::AtModule,
    "import" => TokenKind::AtImport,
    "export" => TokenKind::AtExport,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_tables_cover_every_listed_directive() {
        for name in [
            "init", "lease", "sublease", "release", "load", "call", "exit", "render", "input",
            "output", "send", "recv", "spawn", "join", "stamp", "expire", "sleep", "yield",
            "error", "if", "else", "endif", "loop",
        ] {
            assert!(HASH_DIRECTIVES.contains_key(name), "missing #{name}");
        }
        for name in ["main", "entry_point", "module", "import", "export"] {
            assert!(AT_DIRECTIVES.contains_key(name), "missing @{name}");
        }
    }

    #[test]
    fn label_name_strips_leading_colon() {
        let tok = Token::new(TokenKind::Label, ":again".to_string(), Pos::new(1, 1));
        assert_eq!(tok.label_name(), "again");
    }

    #[test]
    fn duration_units_are_not_keywords() {
        for unit in ["ns", "ms", "s", "m", "h"] {
            assert!(!KEYWORDS.contains_key(unit), "{unit} must lex as Ident");
        }
    }
}
