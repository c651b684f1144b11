//! Per-invocation call state (the "Call state" of `spec.md` §3): locals,
//! arguments, the pending return value, and the two stacks (C2, C3) that
//! belong to exactly one in-flight method invocation.

use crate::{
    execstack::ExecutionStack,
    misc::NUM_LOCALS,
    name_object::AmlName,
    opstack::OperandStack,
    value::{AmlValue, Args},
};
use core::array;

pub struct CallState {
    /// The absolute path of the method being executed - both identifies it
    /// for namespace cleanup on exit, and is the scope relative names in
    /// its body resolve against.
    pub scope: AmlName,
    pub args: Args,
    pub locals: [AmlValue; NUM_LOCALS],
    pub retvalue: AmlValue,
    pub(crate) opstack: OperandStack,
    pub(crate) stack: ExecutionStack,
}

impl CallState {
    pub fn new(scope: AmlName, args: Args) -> CallState {
        CallState {
            scope,
            args,
            locals: array::from_fn(|_| AmlValue::zero()),
            retvalue: AmlValue::zero(),
            opstack: OperandStack::new(),
            stack: ExecutionStack::new(),
        }
    }

    pub fn local(&self, num: u8) -> &AmlValue {
        &self.locals[num as usize]
    }

    pub fn store_local(&mut self, num: u8, value: AmlValue) {
        self.locals[num as usize] = value;
    }
}
