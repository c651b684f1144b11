//! The catch-all expression evaluator (AUX): `eval_term_arg` evaluates
//! exactly one `TermArg` starting at a byte offset and reports how many
//! bytes it consumed. `spec.md` §4.4 delegates every opcode the core
//! dispatcher doesn't open-code to this path, and also uses it directly
//! for `While`/`If` predicates, `Return`'s operand, and `Sleep`'s operand -
//! contexts where the dispatcher wants exactly one value right now rather
//! than pushing a structured scope. `Store`/`Not`/arithmetic/bitwise
//! opcodes are C4's reducer table, not AUX's - when one of those turns up
//! here (nested inside a larger expression), evaluation is handed straight
//! back to `dispatcher::reduce_operator`, so there's still exactly one
//! place in the crate that reduces an operator.
//!
//! Unlike the main dispatcher (C5), which is deliberately iterative
//! (`spec.md` §9), this evaluator is a small recursive-descent routine:
//! it's the one place in the crate where host-stack recursion stands in
//! for AML expression nesting, bounded by how deeply a single TermArg is
//! itself nested (never by loop iteration count, which is what the core's
//! iterative design actually guards against).

use crate::{call_site, dispatcher, name_object::AmlName, opcode, opregion, state::CallState, value::AmlValue, AmlContext, AmlError};
use alloc::vec::Vec;

pub fn eval_term_arg(
    ctx: &mut AmlContext,
    call: &mut CallState,
    method: &[u8],
    i: usize,
) -> Result<(AmlValue, usize), AmlError> {
    let first = *method.get(i).ok_or(AmlError::UnexpectedEndOfStream)?;

    if crate::opcode::begins_name(first) {
        let (name, name_len) = AmlName::parse(&method[i..])?;
        let resolved = ctx.namespace.search(&name, &call.scope)?;

        if let Some(argc) = call_site::argc_of(ctx, &resolved)? {
            let (value, args_len) = call_site::invoke_at(ctx, call, method, i + name_len, &resolved, argc)?;
            return Ok((value, name_len + args_len));
        }

        let value = read_named(ctx, call, &resolved)?;
        return Ok((value, name_len));
    }

    let (op, op_len) = read_opcode(&method[i..])?;
    let body = i + op_len;

    match op {
        opcode::ZERO_OP => Ok((AmlValue::zero(), op_len)),
        opcode::ONE_OP => Ok((AmlValue::Integer(1), op_len)),
        opcode::ONES_OP => Ok((AmlValue::ones(), op_len)),

        opcode::BYTE_PREFIX => {
            let value = *method.get(body).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(value as u64), op_len + 1))
        }
        opcode::WORD_PREFIX => {
            let bytes = method.get(body..body + 2).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(u16::from_le_bytes([bytes[0], bytes[1]]) as u64), op_len + 2))
        }
        opcode::DWORD_PREFIX => {
            let bytes = method.get(body..body + 4).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(u32::from_le_bytes(bytes.try_into().unwrap()) as u64), op_len + 4))
        }
        opcode::QWORD_PREFIX => {
            let bytes = method.get(body..body + 8).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(u64::from_le_bytes(bytes.try_into().unwrap())), op_len + 8))
        }
        opcode::STRING_PREFIX => {
            let end = method[body..].iter().position(|&b| b == 0).ok_or(AmlError::UnterminatedStringConstant)?;
            let string = core::str::from_utf8(&method[body..body + end]).map_err(|_| AmlError::InvalidStringConstant)?;
            Ok((AmlValue::String(string.into()), op_len + end + 1))
        }

        op if (opcode::LOCAL0_OP..=opcode::LOCAL7_OP).contains(&op) => {
            Ok((call.local((op - opcode::LOCAL0_OP) as u8).clone(), op_len))
        }
        op if (opcode::ARG0_OP..=opcode::ARG6_OP).contains(&op) => {
            Ok((call.args.arg((op - opcode::ARG0_OP) as u8)?.clone(), op_len))
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
            let (value, consumed) = dispatcher::reduce_operator(ctx, call, method, op, body, true)?;
            Ok((value, op_len + consumed))
        }

        opcode::INCREMENT_OP | opcode::DECREMENT_OP => {
            let (target, target_len) = crate::name_object::Target::parse(&method[body..])?;
            let current = ctx.read_target(call, &target)?.as_integer()?;
            let updated =
                if op == opcode::INCREMENT_OP { current.wrapping_add(1) } else { current.wrapping_sub(1) };
            let value = ctx.store(call, target, AmlValue::Integer(updated))?;
            Ok((value, op_len + target_len))
        }
        opcode::DIVIDE_OP => {
            let (dividend, dividend_len) = eval_term_arg(ctx, call, method, body)?;
            let (divisor, divisor_len) = eval_term_arg(ctx, call, method, body + dividend_len)?;
            let dividend = dividend.as_integer()?;
            let divisor = divisor.as_integer()?;
            if divisor == 0 {
                return Err(AmlError::DivideByZero);
            }
            let cursor = body + dividend_len + divisor_len;
            let (remainder_target, remainder_len) = crate::name_object::Target::parse(&method[cursor..])?;
            ctx.store(call, remainder_target, AmlValue::Integer(dividend % divisor))?;
            let (quotient_target, quotient_len) = crate::name_object::Target::parse(&method[cursor + remainder_len..])?;
            let value = ctx.store(call, quotient_target, AmlValue::Integer(dividend / divisor))?;
            Ok((value, op_len + dividend_len + divisor_len + remainder_len + quotient_len))
        }

        opcode::LNOT_OP => {
            let (operand, operand_len) = eval_term_arg(ctx, call, method, body)?;
            Ok((AmlValue::boolean(operand.as_integer()? == 0), op_len + operand_len))
        }
        opcode::LAND_OP | opcode::LOR_OP => {
            let (lhs, lhs_len) = eval_term_arg(ctx, call, method, body)?;
            let (rhs, rhs_len) = eval_term_arg(ctx, call, method, body + lhs_len)?;
            let (lhs, rhs) = (lhs.as_integer()? != 0, rhs.as_integer()? != 0);
            let result = if op == opcode::LAND_OP { lhs && rhs } else { lhs || rhs };
            Ok((AmlValue::boolean(result), op_len + lhs_len + rhs_len))
        }
        opcode::LEQUAL_OP | opcode::LGREATER_OP | opcode::LLESS_OP => {
            let (lhs, lhs_len) = eval_term_arg(ctx, call, method, body)?;
            let (rhs, rhs_len) = eval_term_arg(ctx, call, method, body + lhs_len)?;
            let result = compare(op, &lhs, &rhs)?;
            Ok((AmlValue::boolean(result), op_len + lhs_len + rhs_len))
        }

        opcode::COND_REF_OF_OP => {
            // Reduced form: only a plain `NameString` source is supported -
            // enough for the "does this optional object exist" check real
            // DSDTs use it for. A `Local`/`Arg` source (legal per the ACPI
            // grammar but rare in practice) is out of scope here.
            let (name, name_len) = AmlName::parse(&method[body..])?;
            let found = ctx.namespace.search(&name, &call.scope).ok();
            let (target, target_len) = crate::name_object::Target::parse(&method[body + name_len..])?;
            let result = match found {
                Some(resolved) => {
                    ctx.store(call, target, AmlValue::Reference(resolved))?;
                    AmlValue::boolean(true)
                }
                None => AmlValue::boolean(false),
            };
            Ok((result, op_len + name_len + target_len))
        }

        opcode::SIZE_OF_OP => {
            let (target, target_len) = crate::name_object::Target::parse(&method[body..])?;
            let value = ctx.read_target(call, &target)?;
            let size = match value {
                AmlValue::Buffer(bytes) => bytes.len() as u64,
                AmlValue::String(string) => string.len() as u64,
                AmlValue::Package(elements) => elements.len() as u64,
                _ => return Err(AmlError::InvalidSizeOfApplication(value.type_of())),
            };
            Ok((AmlValue::Integer(size), op_len + target_len))
        }

        opcode::INDEX_OP => {
            let (source, source_len) = eval_term_arg(ctx, call, method, body)?;
            let (index, index_len) = eval_term_arg(ctx, call, method, body + source_len)?;
            let index = index.as_integer()? as usize;
            let element = match &source {
                AmlValue::Package(elements) => {
                    elements.get(index).cloned().ok_or(AmlError::BufferFieldIndexesOutOfBounds)?
                }
                AmlValue::Buffer(bytes) => {
                    AmlValue::Integer(*bytes.get(index).ok_or(AmlError::BufferFieldIndexesOutOfBounds)? as u64)
                }
                other => return Err(AmlError::TypeCannotBeSliced(other.type_of())),
            };
            let (target, target_len) = crate::name_object::Target::parse(&method[body + source_len + index_len..])?;
            let value = ctx.store(call, target, element)?;
            Ok((value, op_len + source_len + index_len + target_len))
        }

        opcode::BUFFER_OP => {
            let pkg = crate::pkg_length::PkgLength::parse(&method[body..])?;
            let (size, size_len) = eval_term_arg(ctx, call, method, body + pkg.encoding_len)?;
            let payload_start = body + pkg.encoding_len + size_len;
            let body_end = body + pkg.raw_length as usize;
            let mut bytes: Vec<u8> = method[payload_start..body_end].to_vec();
            bytes.resize(size.as_integer()? as usize, 0);
            Ok((AmlValue::Buffer(bytes), pkg.raw_length as usize + op_len))
        }

        opcode::PACKAGE_OP => {
            let pkg = crate::pkg_length::PkgLength::parse(&method[body..])?;
            let count = *method.get(body + pkg.encoding_len).ok_or(AmlError::UnexpectedEndOfStream)?;
            let mut cursor = body + pkg.encoding_len + 1;
            let body_end = body + pkg.raw_length as usize;
            let mut elements = Vec::with_capacity(count as usize);
            while cursor < body_end {
                let (element, element_len) = eval_term_arg(ctx, call, method, cursor)?;
                elements.push(element);
                cursor += element_len;
            }
            Ok((AmlValue::Package(elements), pkg.raw_length as usize + op_len))
        }

        _ => Err(AmlError::UnsupportedExpressionOpcode(op)),
    }
}

fn read_opcode(data: &[u8]) -> Result<(u16, usize), AmlError> {
    let first = *data.first().ok_or(AmlError::UnexpectedEndOfStream)?;
    if first == crate::misc::EXT_OP_PREFIX {
        let second = *data.get(1).ok_or(AmlError::UnexpectedEndOfStream)?;
        Ok((((first as u16) << 8) | second as u16, 2))
    } else {
        Ok((first as u16, 1))
    }
}

fn compare(op: u16, lhs: &AmlValue, rhs: &AmlValue) -> Result<bool, AmlError> {
    use core::cmp::Ordering;

    let ordering = match (lhs, rhs) {
        (AmlValue::Integer(a), AmlValue::Integer(b)) => a.cmp(b),
        (AmlValue::String(a), AmlValue::String(b)) => a.as_bytes().cmp(b.as_bytes()),
        (AmlValue::Buffer(a), AmlValue::Buffer(b)) => a.cmp(b),
        (a, b) => return Err(AmlError::TypeCannotBeCompared(a.type_of(), b.type_of())),
    };

    Ok(match op {
        opcode::LEQUAL_OP => ordering == Ordering::Equal,
        opcode::LGREATER_OP => ordering == Ordering::Greater,
        opcode::LLESS_OP => ordering == Ordering::Less,
        _ => unreachable!(),
    })
}

/// Read the current value of a resolved namespace node: a `Name`'s stored
/// value, a `Method`'s invocation result, or a `Field`/`OpRegion` read.
pub(crate) fn read_named(ctx: &mut AmlContext, call: &mut CallState, resolved: &AmlName) -> Result<AmlValue, AmlError> {
    let kind = ctx.namespace.get(resolved)?.clone();
    match kind {
        crate::namespace::NodeKind::Name(value) => Ok(value),
        crate::namespace::NodeKind::Method { .. } => call_site::invoke_resolved(ctx, call, resolved, Vec::new()),
        crate::namespace::NodeKind::Field { region, bit_offset, bit_length, flags } => {
            read_field(ctx, &region, bit_offset, bit_length, flags)
        }
        other => Err(AmlError::UnexpectedNodeKind(other.type_name())),
    }
}

pub(crate) fn read_field(
    ctx: &AmlContext,
    region_name: &AmlName,
    bit_offset: u64,
    bit_length: u64,
    flags: crate::field::FieldFlags,
) -> Result<AmlValue, AmlError> {
    let (space, region_offset) = match ctx.namespace.get(region_name)? {
        crate::namespace::NodeKind::OpRegion { space, offset, .. } => (*space, *offset),
        _ => return Err(AmlError::FieldRegionIsNotOpRegion),
    };
    let value = opregion::read_field(ctx, space, region_offset, bit_offset, bit_length, flags)?;
    Ok(AmlValue::Integer(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{name_object::AmlName, test_utils::TestHandler, value::Args, DebugVerbosity};
    use alloc::boxed::Box;

    fn ctx() -> AmlContext {
        AmlContext::new(Box::new(TestHandler::new()), DebugVerbosity::None)
    }

    fn call() -> CallState {
        CallState::new(AmlName::root(), Args::EMPTY)
    }

    #[test]
    fn zero_literal_is_not_confused_with_a_null_name() {
        // `ZeroOp` (0x00) shares a byte value with `NullName`, which only
        // means something inside `Target`/`SuperName` grammar - as a bare
        // `TermArg` it must evaluate to Integer(0), not a namespace lookup.
        let mut ctx = ctx();
        let mut call = call();
        let (value, len) = eval_term_arg(&mut ctx, &mut call, &[0x00], 0).unwrap();
        assert_eq!(value, AmlValue::zero());
        assert_eq!(len, 1);
    }
}
