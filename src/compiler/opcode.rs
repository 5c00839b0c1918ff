// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! IR opcode table.
//!
//! Byte values are part of the external ABI and must not change. Every
//! opcode is one byte; most are followed by fixed-width little-endian
//! 32-bit operands, `UN`/`BIN` by a single sub-code byte.

pub const INIT: u8 = 0x01;
pub const LEASE: u8 = 0x02;
pub const SUBLEASE: u8 = 0x03;
pub const RELEASE: u8 = 0x04;
pub const LOAD: u8 = 0x05;
pub const CALL: u8 = 0x06;
pub const EXIT: u8 = 0x07;
pub const RENDER: u8 = 0x08;
pub const INPUT: u8 = 0x09;
pub const OUTPUT: u8 = 0x0A;
pub const SEND: u8 = 0x0B;
pub const RECV: u8 = 0x0C;
pub const SPAWN: u8 = 0x0D;
pub const JOIN: u8 = 0x0E;
pub const STAMP: u8 = 0x0F;
pub const EXPIRE: u8 = 0x10;
pub const SLEEP: u8 = 0x11;
pub const YIELD: u8 = 0x12;
pub const ERROR: u8 = 0x13;
pub const PUSHK: u8 = 0x20;
pub const PUSHCAP: u8 = 0x21;
pub const UN: u8 = 0x22;
pub const BIN: u8 = 0x23;
pub const JZ: u8 = 0x30;
pub const JNZ: u8 = 0x31;
pub const JMP: u8 = 0x32;
pub const END: u8 = 0xFF;

// Sub-codes carried in the byte after `BIN`.
pub const BIN_OR: u8 = 1;
pub const BIN_AND: u8 = 2;
pub const BIN_EQ: u8 = 3;
pub const BIN_NE: u8 = 4;
pub const BIN_LT: u8 = 5;
pub const BIN_GT: u8 = 6;
pub const BIN_LE: u8 = 7;
pub const BIN_GE: u8 = 8;
pub const BIN_ADD: u8 = 9;
pub const BIN_SUB: u8 = 10;
pub const BIN_MUL: u8 = 11;
pub const BIN_DIV: u8 = 12;
pub const BIN_MOD: u8 = 13;

// Sub-codes carried in the byte after `UN`.
pub const UN_NOT: u8 = 1;
pub const UN_NEG: u8 = 2;
pub const UN_BITNOT: u8 = 3;

/// Sentinel written where a relocation will later patch a real offset.
pub const PLACEHOLDER: u32 = 0xFFFF_FFFF;

/// Total encoded length of the instruction starting with `op`, or `None`
/// for bytes that are not opcodes.
pub fn instr_len(op: u8) -> Option<usize> {
    let len = match op {
        EXIT | YIELD | END => 1,
        UN | BIN => 2,
        INIT | LEASE | SUBLEASE | RELEASE | LOAD | CALL | RENDER | INPUT | OUTPUT | SPAWN
        | JOIN | SLEEP | PUSHK | PUSHCAP | JZ | JNZ | JMP => 5,
        SEND | RECV | STAMP | EXPIRE => 9,
        ERROR => 13,
        _ => return None,
    };
    Some(len)
}

pub fn mnemonic(op: u8) -> Option<&'static str> {
    let name = match op {
        INIT => "INIT",
        LEASE => "LEASE",
        SUBLEASE => "SUBLEASE",
        RELEASE => "RELEASE",
        LOAD => "LOAD",
        CALL => "CALL",
        EXIT => "EXIT",
        RENDER => "RENDER",
        INPUT => "INPUT",
        OUTPUT => "OUTPUT",
        SEND => "SEND",
        RECV => "RECV",
        SPAWN => "SPAWN",
        JOIN => "JOIN",
        STAMP => "STAMP",
        EXPIRE => "EXPIRE",
        SLEEP => "SLEEP",
        YIELD => "YIELD",
        ERROR => "ERROR",
        PUSHK => "PUSHK",
        PUSHCAP => "PUSHCAP",
        UN => "UN",
        BIN => "BIN",
        JZ => "JZ",
        JNZ => "JNZ",
        JMP => "JMP",
        END => "END",
        _ => return None,
    };
    Some(name)
}
