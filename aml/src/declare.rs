//! Runtime declarations (NS/AUX): `Name` and the `CreateXField` family
//! encountered while a method body is running, as opposed to `loader.rs`'s
//! static, table-load-time declarations. `spec.md` §4.4 step 5 delegates
//! both `NAME_OP` and the `CreateByteField`/`CreateWordField`/... opcodes
//! here rather than open-coding them in the dispatcher.
//!
//! Buffer fields created this way are snapshots of the source buffer at
//! declaration time, not live aliases that write back through it - giving
//! them real write-through semantics would need the same region/field
//! machinery `opregion.rs` already provides for `OperationRegion` fields,
//! which is disproportionate to what a `CreateXField` inside a control
//! method body actually needs here.

use crate::{loader, name_object::AmlName, namespace::NodeKind, state::CallState, value::AmlValue, AmlContext, AmlError};

/// `NAME_OP` has already been consumed; `body` starts at the name.
/// Returns bytes consumed (name + data object).
pub(crate) fn declare_name(ctx: &mut AmlContext, call: &CallState, body: &[u8]) -> Result<usize, AmlError> {
    let (name, name_len) = AmlName::parse(body)?;
    let (value, value_len) = loader::parse_data_object(&body[name_len..])?;
    ctx.namespace.set(name.resolve(&call.scope)?, NodeKind::Name(value));
    Ok(name_len + value_len)
}

/// One of `CreateByteField`/`CreateWordField`/`CreateDWordField`/
/// `CreateQWordField`/`CreateBitField`. `opcode` has already been
/// consumed; `body` starts at `SourceBuff`. Returns bytes consumed.
pub(crate) fn declare_buffer_field(
    ctx: &mut AmlContext,
    call: &mut CallState,
    method: &[u8],
    body_offset: usize,
    opcode: u16,
) -> Result<usize, AmlError> {
    let (source, source_len) = crate::expression::eval_term_arg(ctx, call, method, body_offset)?;
    let source = match source {
        AmlValue::Buffer(bytes) => bytes,
        other => return Err(AmlError::IncompatibleValueConversion { target: other.type_of() }),
    };

    let (index, index_len) = crate::expression::eval_term_arg(ctx, call, method, body_offset + source_len)?;
    let index = index.as_integer()? as usize;

    let width_bits: usize = match opcode {
        crate::opcode::CREATE_BIT_FIELD_OP => 1,
        crate::opcode::CREATE_BYTE_FIELD_OP => 8,
        crate::opcode::CREATE_WORD_FIELD_OP => 16,
        crate::opcode::CREATE_DWORD_FIELD_OP => 32,
        crate::opcode::CREATE_QWORD_FIELD_OP => 64,
        other => return Err(AmlError::UnsupportedOpcode(other)),
    };

    let bit_offset = if opcode == crate::opcode::CREATE_BIT_FIELD_OP { index } else { index * 8 };
    let mut value: u64 = 0;
    for bit in 0..width_bits {
        let abs_bit = bit_offset + bit;
        let byte = *source.get(abs_bit / 8).unwrap_or(&0);
        if byte & (1 << (abs_bit % 8)) != 0 {
            value |= 1 << bit;
        }
    }

    let name_offset = body_offset + source_len + index_len;
    let (name, name_len) = AmlName::parse(&method[name_offset..])?;
    ctx.namespace.set(name.resolve(&call.scope)?, NodeKind::Name(AmlValue::Integer(value)));

    Ok(source_len + index_len + name_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::TestHandler, value::Args, DebugVerbosity};
    use alloc::boxed::Box;

    fn ctx() -> AmlContext {
        AmlContext::new(Box::new(TestHandler::new()), DebugVerbosity::None)
    }

    #[test]
    fn declare_name_installs_a_byte_literal() {
        let mut ctx = ctx();
        let call = CallState::new(AmlName::root(), Args::EMPTY);
        // NameString "TMP_" + BytePrefix 0x2A
        let body = [b'T', b'M', b'P', b'_', 0x0A, 0x2A];
        let consumed = declare_name(&mut ctx, &call, &body).unwrap();
        assert_eq!(consumed, body.len());
        let resolved = AmlName::from_str("\\TMP_").unwrap();
        match ctx.namespace.get(&resolved).unwrap() {
            NodeKind::Name(value) => assert_eq!(*value, AmlValue::Integer(0x2A)),
            other => panic!("expected a Name node, got {:?}", other),
        }
    }

    #[test]
    fn declare_buffer_field_extracts_a_byte_at_offset() {
        let mut ctx = ctx();
        let mut call = CallState::new(AmlName::root(), Args::EMPTY);
        ctx.namespace.add(AmlName::from_str("\\BUF_").unwrap(), NodeKind::Name(AmlValue::Buffer(alloc::vec![0, 0xAB, 0]))).unwrap();
        // SourceBuff = BUF_, ByteIndex = 1, NameString = "FLD_"
        let method = [b'B', b'U', b'F', b'_', 0x0A, 0x01, b'F', b'L', b'D', b'_'];
        let consumed =
            declare_buffer_field(&mut ctx, &mut call, &method, 0, crate::opcode::CREATE_BYTE_FIELD_OP).unwrap();
        assert_eq!(consumed, method.len());
        let resolved = AmlName::from_str("\\FLD_").unwrap();
        match ctx.namespace.get(&resolved).unwrap() {
            NodeKind::Name(value) => assert_eq!(*value, AmlValue::Integer(0xAB)),
            other => panic!("expected a Name node, got {:?}", other),
        }
    }
}
