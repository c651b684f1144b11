//! The dispatcher (C5) - the interpreter's heart. One method body, one
//! call to [`run`]: an iterative loop driven by an instruction pointer and
//! the execution-scope stack (C3), never by host-stack recursion through
//! `While`/`If` bodies (`spec.md` §9's central design requirement). Nested
//! *expressions* still recurse through `expression::eval_term_arg` - that
//! recursion is bounded by expression nesting depth, not by how many times
//! a loop iterates, which is the distinction the fixed-depth stacks exist
//! to protect.
//!
//! `Store`/`Not`/arithmetic/bitwise opcodes (C4's reducer table) are
//! open-coded here rather than left to AUX: [`reduce_operator`] pushes an
//! `Op` scope, gathers the operator's operands onto the operand stack
//! (C2), reduces, and pops both stacks back down, per `spec.md` §4.4.
//! `expression::eval_term_arg` calls back into it whenever one of these
//! opcodes turns up nested inside a larger expression, so there is still
//! exactly one place in the crate that reduces an operator - it's just
//! this one, not AUX's.

use crate::{
    declare, execstack::ExecutionScope, expression, name_object::Target, opcode, pkg_length::PkgLength, reducer,
    state::CallState, value::AmlValue, AmlContext, AmlError,
};

/// Run `code` (a method body) to completion, leaving its result as the
/// single value on the operand stack (C2) - `method::exec_aml_method`
/// moves it into `call.retvalue` once this returns. A method that never
/// executes `Return` implicitly returns the integer zero (`spec.md` §4.6
/// Edge cases).
pub fn run(ctx: &mut AmlContext, call: &mut CallState, code: &[u8]) -> Result<(), AmlError> {
    call.stack.push(ExecutionScope::MethodContext)?;
    let mut ip: usize = 0;

    loop {
        unwind_finished_scopes(ctx, call, code, &mut ip)?;

        if matches!(call.stack.peek_top(), Some(ExecutionScope::MethodContext)) && ip >= code.len() {
            if !call.opstack.is_empty() {
                return Err(AmlError::OperandStackNotExactlyOneAtMethodEnd);
            }
            call.opstack.push_value(AmlValue::zero())?;
            call.stack.pop(1);
            return Ok(());
        }

        let (op, op_len) = read_opcode(code, ip)?;
        let body = ip + op_len;

        match op {
            opcode::NOOP_OP => {
                ip = body;
            }

            opcode::IF_OP => {
                ip = dispatch_if(ctx, call, code, body)?;
            }

            opcode::WHILE_OP => {
                ip = dispatch_while(ctx, call, code, body)?;
            }

            opcode::ELSE_OP => {
                // Reached only if a stray `Else` follows something other
                // than a just-finished, taken `If` body - malformed AML.
                return Err(AmlError::ElseOutsideIf);
            }

            opcode::RETURN_OP => {
                if !call.opstack.is_empty() {
                    return Err(AmlError::OperandStackNotEmptyAtReturn);
                }
                let (value, _) = expression::eval_term_arg(ctx, call, code, body)?;
                call.opstack.push_value(value)?;
                unwind_to_method_context(call);
                return Ok(());
            }

            opcode::STORE_OP
            | opcode::NOT_OP
            | opcode::ADD_OP
            | opcode::SUBTRACT_OP
            | opcode::MULTIPLY_OP
            | opcode::AND_OP
            | opcode::OR_OP
            | opcode::XOR_OP
            | opcode::SHL_OP
            | opcode::SHR_OP => {
                // A bare statement: the reduced value is discarded once any
                // `Target` write-back has run (`want_result = false`).
                let (_, consumed) = reduce_operator(ctx, call, code, op, body, false)?;
                ip = body + consumed;
            }

            opcode::BREAK_OP => {
                let depth = call
                    .stack
                    .find_from_top(|scope| matches!(scope, ExecutionScope::Loop { .. }))
                    .ok_or(AmlError::BreakInInvalidPosition)?;
                let ExecutionScope::Loop { end, .. } =
                    *call.stack.peek(depth).ok_or(AmlError::BreakInInvalidPosition)?
                else {
                    return Err(AmlError::BreakInInvalidPosition);
                };
                call.stack.pop(depth + 1);
                ip = end;
            }

            opcode::CONTINUE_OP => {
                let depth = call
                    .stack
                    .find_from_top(|scope| matches!(scope, ExecutionScope::Loop { .. }))
                    .ok_or(AmlError::ContinueInInvalidPosition)?;
                call.stack.pop(depth);
                retry_loop(ctx, call, code, &mut ip)?;
            }

            opcode::SLEEP_OP => {
                let (ms, ms_len) = expression::eval_term_arg(ctx, call, code, body)?;
                ctx.handler_mut().sleep(ms.as_integer()?);
                ip = body + ms_len;
            }

            opcode::STALL_OP => {
                let (us, us_len) = expression::eval_term_arg(ctx, call, code, body)?;
                ctx.handler_mut().stall(us.as_integer()?);
                ip = body + us_len;
            }

            opcode::NAME_OP => {
                ip = body + declare::declare_name(ctx, call, &code[body..])?;
            }

            opcode::CREATE_BYTE_FIELD_OP
            | opcode::CREATE_WORD_FIELD_OP
            | opcode::CREATE_DWORD_FIELD_OP
            | opcode::CREATE_QWORD_FIELD_OP
            | opcode::CREATE_BIT_FIELD_OP => {
                ip = body + declare::declare_buffer_field(ctx, call, code, body, op)?;
            }

            _ => {
                // Every other opcode is a self-contained expression used
                // as a statement (a bare method call, `Store`, arithmetic
                // with side effects via its target) - delegate to AUX and
                // discard the value, same as real hosts do for a TermArg
                // appearing where a TermObj was expected (`spec.md` §4.9).
                let (_, consumed) = expression::eval_term_arg(ctx, call, code, ip)?;
                ip += consumed;
            }
        }
    }
}

/// Reduce one of C4's open-coded operators (`spec.md` §4.4's Op-scope
/// algorithm): push an `Op` scope recording where C2 sits right now,
/// evaluate each operand in turn and push its value onto C2, reduce once
/// all of them have landed, then pop both stacks back down and run the
/// opcode's trailing `Target` write-back. `body` is the offset just past
/// the opcode; returns the written-back value and the number of bytes the
/// operands plus the target consumed. `want_result` is only recorded on
/// the `Op` scope for `spec.md`'s data-model shape - which Rust binding
/// ends up holding the returned value (a local in `run`'s bare-statement
/// arm that discards it, or the next operand slot up in an enclosing
/// `reduce_operator` call) is decided entirely by the caller.
pub(crate) fn reduce_operator(
    ctx: &mut AmlContext,
    call: &mut CallState,
    code: &[u8],
    opcode: u16,
    body: usize,
    want_result: bool,
) -> Result<(AmlValue, usize), AmlError> {
    let num_operands = reducer::arity(opcode)?;
    let opstack_base = call.opstack.len();
    call.stack.push(ExecutionScope::Op { opcode, opstack_base, num_operands, want_result })?;

    let mut cursor = body;
    for _ in 0..num_operands {
        let (value, len) = expression::eval_term_arg(ctx, call, code, cursor)?;
        call.opstack.push_value(value)?;
        cursor += len;
    }
    debug_assert_eq!(call.opstack.len(), opstack_base + num_operands);

    let result = reducer::reduce(opcode, call.opstack.slice(opstack_base, num_operands)?)?;
    call.opstack.pop(num_operands)?;
    call.stack.pop(1);

    let (target, target_len) = Target::parse(&code[cursor..])?;
    let stored = ctx.store(call, target, result)?;
    Ok((stored, (cursor - body) + target_len))
}

/// Repeatedly check whether `ip` sits exactly at the end of the
/// innermost `Loop`/`Cond` scope, unwinding (and, for loops, re-testing
/// the predicate) as many times as necessary. Several scopes can end at
/// the same offset (e.g. a loop body that is itself the last statement of
/// an enclosing `If`), so this must loop until nothing changes.
fn unwind_finished_scopes(ctx: &mut AmlContext, call: &mut CallState, code: &[u8], ip: &mut usize) -> Result<(), AmlError> {
    loop {
        match call.stack.peek_top() {
            Some(ExecutionScope::Loop { end, .. }) if *ip == *end => {
                retry_loop(ctx, call, code, ip)?;
            }
            Some(ExecutionScope::Cond { end }) if *ip == *end => {
                call.stack.pop(1);
                skip_trailing_else(code, ip)?;
            }
            _ => return Ok(()),
        }
    }
}

/// The innermost scope must be the `Loop` to retry. Evaluates its
/// predicate again: true re-enters the body (frame kept), false pops it
/// and advances past the whole construct. Shared by natural loop-end
/// unwinding and by `Continue`.
fn retry_loop(ctx: &mut AmlContext, call: &mut CallState, code: &[u8], ip: &mut usize) -> Result<(), AmlError> {
    let ExecutionScope::Loop { pred, body_start, end } =
        *call.stack.peek_top().ok_or(AmlError::ContinueInInvalidPosition)?
    else {
        return Err(AmlError::ContinueInInvalidPosition);
    };

    let (predicate, _) = expression::eval_term_arg(ctx, call, code, pred)?;
    if predicate.as_integer()? != 0 {
        *ip = body_start;
    } else {
        call.stack.pop(1);
        *ip = end;
    }
    Ok(())
}

/// Having just finished the taken branch of an `If`, skip a syntactically
/// following `Else` entirely (only one branch ever executes).
fn skip_trailing_else(code: &[u8], ip: &mut usize) -> Result<(), AmlError> {
    if code.get(*ip).copied() != Some(opcode::ELSE_OP as u8) {
        return Ok(());
    }
    let pkg_start = *ip + 1;
    let pkg = PkgLength::parse(&code[pkg_start..])?;
    *ip = pkg.end_offset(pkg_start);
    Ok(())
}

/// `If`/predicate. Returns the new instruction pointer: either the start
/// of the taken body (with a `Cond` scope pushed) or one past the whole
/// construct, possibly having jumped straight into an `Else` body.
fn dispatch_if(ctx: &mut AmlContext, call: &mut CallState, code: &[u8], pkg_start: usize) -> Result<usize, AmlError> {
    let pkg = PkgLength::parse(&code[pkg_start..])?;
    let predicate_offset = pkg_start + pkg.encoding_len;
    let (predicate, predicate_len) = expression::eval_term_arg(ctx, call, code, predicate_offset)?;
    let body_end = pkg.end_offset(pkg_start);

    if predicate.as_integer()? != 0 {
        call.stack.push(ExecutionScope::Cond { end: body_end })?;
        Ok(predicate_offset + predicate_len)
    } else {
        let mut ip = body_end;
        if code.get(ip).copied() == Some(opcode::ELSE_OP as u8) {
            let else_pkg_start = ip + 1;
            let else_pkg = PkgLength::parse(&code[else_pkg_start..])?;
            ip = else_pkg_start + else_pkg.encoding_len;
        }
        Ok(ip)
    }
}

/// `While`/predicate. Returns the new instruction pointer, pushing a
/// `Loop` scope only if the body will actually run at least once.
fn dispatch_while(ctx: &mut AmlContext, call: &mut CallState, code: &[u8], pkg_start: usize) -> Result<usize, AmlError> {
    let pkg = PkgLength::parse(&code[pkg_start..])?;
    let pred = pkg_start + pkg.encoding_len;
    let (predicate, predicate_len) = expression::eval_term_arg(ctx, call, code, pred)?;
    let end = pkg.end_offset(pkg_start);

    if predicate.as_integer()? != 0 {
        let body_start = pred + predicate_len;
        call.stack.push(ExecutionScope::Loop { pred, body_start, end })?;
        Ok(body_start)
    } else {
        Ok(end)
    }
}

/// Pop every scope down to (and including) the `MethodContext` marker -
/// what `Return` does to unwind out of however many nested `While`/`If`
/// bodies it was called from.
fn unwind_to_method_context(call: &mut CallState) {
    while let Some(scope) = call.stack.peek_top() {
        let is_method_context = matches!(scope, ExecutionScope::MethodContext);
        call.stack.pop(1);
        if is_method_context {
            break;
        }
    }
}

fn read_opcode(code: &[u8], ip: usize) -> Result<(u16, usize), AmlError> {
    let first = *code.get(ip).ok_or(AmlError::UnexpectedEndOfStream)?;
    if first == crate::misc::EXT_OP_PREFIX {
        let second = *code.get(ip + 1).ok_or(AmlError::UnexpectedEndOfStream)?;
        Ok((((first as u16) << 8) | second as u16, 2))
    } else {
        Ok((first as u16, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{name_object::AmlName, test_utils::TestHandler, value::Args, DebugVerbosity};

    fn call() -> CallState {
        CallState::new(AmlName::root(), Args::EMPTY)
    }

    fn ctx() -> AmlContext {
        AmlContext::new(alloc::boxed::Box::new(TestHandler::new()), DebugVerbosity::None)
    }

    #[test]
    fn empty_body_implicitly_returns_zero() {
        let mut ctx = ctx();
        let mut call = call();
        run(&mut ctx, &mut call, &[]).unwrap();
        assert_eq!(call.opstack.len(), 1);
        assert_eq!(*call.opstack.get(0).unwrap(), crate::value::AmlValue::Integer(0));
    }

    #[test]
    fn noop_is_skipped() {
        // NoOp, NoOp, Return(One)
        let code = [opcode::NOOP_OP as u8, opcode::NOOP_OP as u8, opcode::RETURN_OP as u8, opcode::ONE_OP as u8];
        let mut ctx = ctx();
        let mut call = call();
        run(&mut ctx, &mut call, &code).unwrap();
        assert_eq!(call.opstack.len(), 1);
        assert_eq!(*call.opstack.get(0).unwrap(), crate::value::AmlValue::Integer(1));
    }

    #[test]
    fn reduce_operator_drives_the_op_scope_and_operand_stack() {
        // Add(5, 7) -> Zero (discard the target, want the value back)
        let code = [opcode::BYTE_PREFIX as u8, 0x05, opcode::BYTE_PREFIX as u8, 0x07, 0x00];
        let mut ctx = ctx();
        let mut call = call();
        let (value, consumed) = reduce_operator(&mut ctx, &mut call, &code, opcode::ADD_OP, 0, true).unwrap();
        assert_eq!(value, crate::value::AmlValue::Integer(12));
        assert_eq!(consumed, code.len());
        assert!(call.stack.is_empty());
        assert!(call.opstack.is_empty());
    }

    #[test]
    fn store_through_dispatcher_writes_back_and_leaves_no_opstack_residue() {
        // Store(ByteConst(9), Local0); Return(Local0)
        let code = [
            opcode::STORE_OP as u8,
            opcode::BYTE_PREFIX as u8,
            0x09,
            opcode::LOCAL0_OP as u8,
            opcode::RETURN_OP as u8,
            opcode::LOCAL0_OP as u8,
        ];
        let mut ctx = ctx();
        let mut call = call();
        run(&mut ctx, &mut call, &code).unwrap();
        assert_eq!(call.opstack.len(), 1);
        assert_eq!(*call.opstack.get(0).unwrap(), crate::value::AmlValue::Integer(9));
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let code = [opcode::BREAK_OP as u8];
        let mut ctx = ctx();
        let mut call = call();
        assert!(matches!(run(&mut ctx, &mut call, &code), Err(AmlError::BreakInInvalidPosition)));
    }

    #[test]
    fn stray_else_is_an_error() {
        let code = [opcode::ELSE_OP as u8, 0x02];
        let mut ctx = ctx();
        let mut call = call();
        assert!(matches!(run(&mut ctx, &mut call, &code), Err(AmlError::ElseOutsideIf)));
    }
}
