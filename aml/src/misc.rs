//! Small shared constants used throughout the interpreter.

/// Number of argument slots a control method may be invoked with (`Arg0..Arg6`).
pub const NUM_ARGS: usize = 7;
/// Number of local slots a control method has available (`Local0..Local7`).
pub const NUM_LOCALS: usize = 8;

/// Depth of the operand stack (C2).
pub const OPSTACK_DEPTH: usize = 16;
/// Depth of the execution-scope stack (C3).
pub const EXECSTACK_DEPTH: usize = 16;

/// The prefix byte (`0x5B`) that introduces a two-byte opcode.
pub const EXT_OP_PREFIX: u8 = 0x5B;
