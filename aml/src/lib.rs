// SPDX-License-Identifier: MIT OR Apache-2.0

//! An interpreter for ACPI Machine Language (AML): the bytecode the
//! `_DSDT`/`_SSDT` ACPI tables are written in, and that an OS must
//! interpret to query and configure hardware described by those tables.
//!
//! The crate is built around a fixed-size, iterative dispatcher
//! ([`dispatcher`]) rather than a recursive-descent tree-walker: a control
//! method's execution state lives entirely in two small, bounded stacks
//! (the operand stack, [`opstack`], and the execution-scope stack,
//! [`execstack`]), so evaluating even deeply `While`/`If`-nested AML never
//! grows the host's call stack. Everything this needs from the host - raw
//! memory, IO ports, PCI config space - goes through the [`Handler`] trait,
//! which callers implement once per platform.

#![no_std]

extern crate alloc;

mod call_site;
mod declare;
mod dispatcher;
mod execstack;
mod expression;
mod field;
mod loader;
mod method;
mod misc;
mod name_object;
mod namespace;
mod opcode;
mod opregion;
mod opstack;
mod pkg_length;
mod reducer;
mod state;
mod value;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use name_object::AmlName;
pub use namespace::{Namespace, NodeKind};
pub use opregion::RegionSpace;
pub use state::CallState;
pub use value::{AmlType, AmlValue, Args};

use alloc::boxed::Box;

/// How much the interpreter logs about the methods it runs. Mirrors the
/// levels a real firmware-debug build exposes, narrowed to what this
/// crate's own `log` calls actually use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugVerbosity {
    /// Only firmware-authored `_OSI("Linux")` probes and similar warnings.
    None,
    /// Also trace method entry/exit and reserved-method resolution.
    Scopes,
    /// Trace every opcode the dispatcher steps over.
    AllScopes,
}

/// Abstraction over the platform resources AML can read and write:
/// physical memory, IO ports, and PCI configuration space. Implement this
/// once per host; everything else in the crate is platform-agnostic.
///
/// Mirrors the real `acpi` crate's own `Handler` trait - the same seam,
/// generalized to the opcodes this interpreter actually reaches.
pub trait Handler: Send + Sync {
    fn read_u8(&self, address: usize) -> u8;
    fn read_u16(&self, address: usize) -> u16;
    fn read_u32(&self, address: usize) -> u32;
    fn read_u64(&self, address: usize) -> u64;

    fn write_u8(&mut self, address: usize, value: u8);
    fn write_u16(&mut self, address: usize, value: u16);
    fn write_u32(&mut self, address: usize, value: u32);
    fn write_u64(&mut self, address: usize, value: u64);

    fn read_io_u8(&self, port: u16) -> u8;
    fn read_io_u16(&self, port: u16) -> u16;
    fn read_io_u32(&self, port: u16) -> u32;

    fn write_io_u8(&self, port: u16, value: u8);
    fn write_io_u16(&self, port: u16, value: u16);
    fn write_io_u32(&self, port: u16, value: u32);

    fn read_pci_u8(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u8;
    fn read_pci_u16(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u16;
    fn read_pci_u32(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u32;

    fn write_pci_u8(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16, value: u8);
    fn write_pci_u16(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16, value: u16);
    fn write_pci_u32(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16, value: u32);

    /// Busy-wait for at least `microseconds` (the `Stall` opcode).
    fn stall(&self, microseconds: u64);
    /// Sleep for at least `milliseconds`, yielding the CPU (the `Sleep`
    /// opcode).
    fn sleep(&self, milliseconds: u64);

    /// Called when the interpreter hits a condition it cannot recover
    /// from (a malformed table, not a runtime AML error - those surface as
    /// `Err` instead). The default panics; hosts with their own fatal-error
    /// path (a kernel panic screen, a reset) should override this.
    fn handle_fatal_error(&self, msg: &str, context: u64, value: u64) -> ! {
        panic!("AML fatal error: {} (context = {:#x}, value = {:#x})", msg, context, value);
    }
}

/// Everything the interpreter needs across the lifetime of a platform: the
/// namespace built up from loaded tables, and the host [`Handler`].
pub struct AmlContext {
    pub(crate) namespace: Namespace,
    handler: Box<dyn Handler>,
    debug_verbosity: DebugVerbosity,
}

impl AmlContext {
    pub fn new(handler: Box<dyn Handler>, debug_verbosity: DebugVerbosity) -> AmlContext {
        let mut namespace = Namespace::new();
        namespace.add_predefined_objects(method::osi, method::os, method::rev);
        AmlContext { namespace, handler, debug_verbosity }
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    pub fn handler_mut(&mut self) -> &mut dyn Handler {
        self.handler.as_mut()
    }

    pub fn debug_verbosity(&self) -> DebugVerbosity {
        self.debug_verbosity
    }

    /// Parse a Definition Block (or an SSDT) and install everything it
    /// declares at the root of the namespace.
    pub fn parse_table(&mut self, data: &[u8]) -> Result<(), AmlError> {
        self.namespace.load_table(&AmlName::root(), data)
    }

    /// Invoke a control method (or read a `Name` object) by absolute or
    /// root-relative path, e.g. `"\\_SB.PCI0._INI"`.
    pub fn invoke_method(&mut self, path: &str, args: alloc::vec::Vec<AmlValue>) -> Result<AmlValue, AmlError> {
        let name = AmlName::from_str(path)?;
        let resolved = self.namespace.search(&name, &AmlName::root())?;
        call_site::invoke_resolved(self, &mut CallState::new(AmlName::root(), Args::EMPTY), &resolved, args)
    }

    /// Write `value` to `target`, returning the value actually stored (the
    /// result of a `Store` expression is the stored value itself, so
    /// callers chain straight off this - `spec.md` §9 Open Question (a)).
    pub(crate) fn store(&mut self, call: &mut CallState, target: name_object::Target, value: AmlValue) -> Result<AmlValue, AmlError> {
        use name_object::Target;
        match target {
            Target::Null => {}
            Target::Debug => log::debug!("AML Debug: {:?}", value),
            Target::Arg(num) => call.args.store(num, value.clone())?,
            Target::Local(num) => call.store_local(num, value.clone()),
            Target::Name(name) => {
                let resolved = self.namespace.search(&name, &call.scope)?;
                match self.namespace.get(&resolved)?.clone() {
                    NodeKind::Name(_) => self.namespace.set(resolved, NodeKind::Name(value.clone())),
                    NodeKind::Field { region, bit_offset, bit_length, flags } => {
                        let (space, region_offset) = match self.namespace.get(&region)? {
                            NodeKind::OpRegion { space, offset, .. } => (*space, *offset),
                            _ => return Err(AmlError::FieldRegionIsNotOpRegion),
                        };
                        opregion::write_field(self, space, region_offset, bit_offset, bit_length, flags, value.as_integer()?)?;
                    }
                    other => return Err(AmlError::UnexpectedNodeKind(other.type_name())),
                }
            }
        }
        Ok(value)
    }

    /// Read the current value a `Target` refers to (used by `Increment`,
    /// `Decrement`, and `SizeOf`/`Index`'s `SuperName` operand).
    pub(crate) fn read_target(&mut self, call: &mut CallState, target: &name_object::Target) -> Result<AmlValue, AmlError> {
        use name_object::Target;
        match target {
            Target::Null => Err(AmlError::UnexpectedNodeKind("Null")),
            Target::Debug => Err(AmlError::UnexpectedNodeKind("Debug")),
            Target::Arg(num) => Ok(call.args.arg(*num)?.clone()),
            Target::Local(num) => Ok(call.local(*num).clone()),
            Target::Name(name) => {
                let resolved = self.namespace.search(name, &call.scope)?;
                expression::read_named(self, call, &resolved)
            }
        }
    }
}

/// Every way interpreting AML can fail: malformed byte streams, namespace
/// lookups that don't resolve, control flow used outside its valid
/// position, and the fixed-depth stacks' own bounds. None of these panic -
/// malformed firmware is an expected input, not a programming error
/// (`spec.md` §7).
#[derive(Debug, Clone, PartialEq)]
pub enum AmlError {
    UnexpectedEndOfStream,
    UnexpectedByte(u8),
    MalformedStream,

    InvalidNameSeg,
    EmptyNamesAreInvalid,
    InvalidNormalizedName(AmlName),

    InvalidPkgLength,
    InvalidFieldFlags,
    InvalidRegionSpace(u8),

    UnterminatedStringConstant,
    InvalidStringConstant,
    MalformedPackage,
    MalformedBuffer,

    NameCollision(AmlName),
    ValueDoesNotExist(AmlName),
    UnexpectedNodeKind(&'static str),

    NotExecutingControlMethod,
    InvalidArgAccess(u8),
    InvalidLocalAccess(u8),
    TooManyArgs,

    OperandStackOverflow,
    OperandStackAccessOutOfBounds,
    ExecutionStackOverflow,
    OperandStackNotEmptyAtReturn,
    OperandStackNotExactlyOneAtMethodEnd,

    BreakInInvalidPosition,
    ContinueInInvalidPosition,
    ElseOutsideIf,

    IncompatibleValueConversion { target: AmlType },
    TypeCannotBeCompared(AmlType, AmlType),
    TypeCannotBeSliced(AmlType),
    InvalidSizeOfApplication(AmlType),
    BufferFieldIndexesOutOfBounds,
    DivideByZero,

    FieldRegionIsNotOpRegion,
    FieldInvalidAccessSize,

    UnsupportedTableOpcode(u16),
    UnsupportedExpressionOpcode(u16),
    UnsupportedReducerOpcode(u16),
    UnsupportedOpcode(u16),

    Timeout,
    Unimplemented,
}
