//! Opcode byte values, as assigned by the ACPI specification's AML grammar
//! (§20). Extended (two-byte) opcodes are encoded here as `0x5B00 | byte2`
//! so that a single `u16` can identify any opcode, single- or double-byte.

use crate::misc::EXT_OP_PREFIX;

const fn ext(byte2: u8) -> u16 {
    ((EXT_OP_PREFIX as u16) << 8) | byte2 as u16
}

pub const ZERO_OP: u16 = 0x00;
pub const ONE_OP: u16 = 0x01;
pub const ALIAS_OP: u16 = 0x06;
pub const NAME_OP: u16 = 0x08;
pub const BYTE_PREFIX: u16 = 0x0A;
pub const WORD_PREFIX: u16 = 0x0B;
pub const DWORD_PREFIX: u16 = 0x0C;
pub const STRING_PREFIX: u16 = 0x0D;
pub const QWORD_PREFIX: u16 = 0x0E;
pub const SCOPE_OP: u16 = 0x10;
pub const BUFFER_OP: u16 = 0x11;
pub const PACKAGE_OP: u16 = 0x12;
pub const VAR_PACKAGE_OP: u16 = 0x13;
pub const METHOD_OP: u16 = 0x14;
pub const EXTERNAL_OP: u16 = 0x15;

pub const DUAL_NAME_PREFIX: u8 = 0x2E;
pub const MULTI_NAME_PREFIX: u8 = 0x2F;
pub const NULL_NAME: u8 = 0x00;
pub const ROOT_CHAR: u8 = b'\\';
pub const PARENT_PREFIX_CHAR: u8 = b'^';

pub const MUTEX_OP: u16 = ext(0x01);
pub const EVENT_OP: u16 = ext(0x02);
pub const COND_REF_OF_OP: u16 = ext(0x12);
pub const CREATE_FIELD_OP: u16 = ext(0x13);
pub const LOAD_TABLE_OP: u16 = ext(0x1F);
pub const LOAD_OP: u16 = ext(0x20);
pub const STALL_OP: u16 = ext(0x21);
pub const SLEEP_OP: u16 = ext(0x22);
pub const ACQUIRE_OP: u16 = ext(0x23);
pub const SIGNAL_OP: u16 = ext(0x24);
pub const WAIT_OP: u16 = ext(0x25);
pub const RESET_OP: u16 = ext(0x26);
pub const RELEASE_OP: u16 = ext(0x27);
pub const OP_REGION_OP: u16 = ext(0x80);
pub const FIELD_OP: u16 = ext(0x81);
pub const DEVICE_OP: u16 = ext(0x82);
pub const PROCESSOR_OP: u16 = ext(0x83);
pub const POWER_RES_OP: u16 = ext(0x84);
pub const THERMAL_ZONE_OP: u16 = ext(0x85);
pub const INDEX_FIELD_OP: u16 = ext(0x86);

pub const LOCAL0_OP: u16 = 0x60;
pub const LOCAL7_OP: u16 = 0x67;
pub const ARG0_OP: u16 = 0x68;
pub const ARG6_OP: u16 = 0x6E;

pub const STORE_OP: u16 = 0x70;
pub const REF_OF_OP: u16 = 0x71;
pub const ADD_OP: u16 = 0x72;
pub const CONCAT_OP: u16 = 0x73;
pub const SUBTRACT_OP: u16 = 0x74;
pub const INCREMENT_OP: u16 = 0x75;
pub const DECREMENT_OP: u16 = 0x76;
pub const MULTIPLY_OP: u16 = 0x77;
pub const DIVIDE_OP: u16 = 0x78;
pub const SHL_OP: u16 = 0x79;
pub const SHR_OP: u16 = 0x7A;
pub const AND_OP: u16 = 0x7B;
pub const NAND_OP: u16 = 0x7C;
pub const OR_OP: u16 = 0x7D;
pub const NOR_OP: u16 = 0x7E;
pub const XOR_OP: u16 = 0x7F;
pub const NOT_OP: u16 = 0x80;
pub const FIND_SET_LEFT_BIT_OP: u16 = 0x81;
pub const FIND_SET_RIGHT_BIT_OP: u16 = 0x82;
pub const DEREF_OF_OP: u16 = 0x83;
pub const CONCAT_RES_OP: u16 = 0x84;
pub const MOD_OP: u16 = 0x85;
pub const NOTIFY_OP: u16 = 0x86;
pub const SIZE_OF_OP: u16 = 0x87;
pub const INDEX_OP: u16 = 0x88;
pub const MATCH_OP: u16 = 0x89;
pub const CREATE_DWORD_FIELD_OP: u16 = 0x8A;
pub const CREATE_WORD_FIELD_OP: u16 = 0x8B;
pub const CREATE_BYTE_FIELD_OP: u16 = 0x8C;
pub const CREATE_BIT_FIELD_OP: u16 = 0x8D;
pub const OBJECT_TYPE_OP: u16 = 0x8E;
pub const CREATE_QWORD_FIELD_OP: u16 = 0x8F;
pub const LAND_OP: u16 = 0x90;
pub const LOR_OP: u16 = 0x91;
pub const LNOT_OP: u16 = 0x92;
pub const LEQUAL_OP: u16 = 0x93;
pub const LGREATER_OP: u16 = 0x94;
pub const LLESS_OP: u16 = 0x95;
pub const TO_BUFFER_OP: u16 = 0x96;
pub const TO_DECIMAL_STRING_OP: u16 = 0x97;
pub const TO_HEX_STRING_OP: u16 = 0x98;
pub const TO_INTEGER_OP: u16 = 0x99;
pub const TO_STRING_OP: u16 = 0x9C;
pub const COPY_OBJECT_OP: u16 = 0x9D;
pub const MID_OP: u16 = 0x9E;
pub const CONTINUE_OP: u16 = 0x9F;
pub const IF_OP: u16 = 0xA0;
pub const ELSE_OP: u16 = 0xA1;
pub const WHILE_OP: u16 = 0xA2;
pub const NOOP_OP: u16 = 0xA3;
pub const RETURN_OP: u16 = 0xA4;
pub const BREAK_OP: u16 = 0xA5;
pub const BREAKPOINT_OP: u16 = 0xCC;
pub const ONES_OP: u16 = 0xFF;

/// Is `byte` (the first byte at the current position) the start of a
/// `NameString` appearing as a `TermArg`? Per the ACPI grammar, names
/// begin with `\`, `^`, a lead name char (`A-Z` or `_`), or one of the
/// multi-segment prefixes. `NULL_NAME` (0x00) is deliberately excluded: it
/// shares its byte value with `ZERO_OP` and only ever appears inside
/// `Target`/`SuperName` grammar (handled directly by `Target::parse`), not
/// as a bare `TermArg` - treating it as a name here would swallow every
/// `Zero` literal.
pub fn begins_name(byte: u8) -> bool {
    byte == ROOT_CHAR
        || byte == PARENT_PREFIX_CHAR
        || byte == DUAL_NAME_PREFIX
        || byte == MULTI_NAME_PREFIX
        || byte.is_ascii_uppercase()
        || byte == b'_'
}
