//! A minimal table loader (NS): walks top-level term objects in a
//! Definition Block, installing `Name`/`Method`/`OpRegion`/`Field`/`Scope`/
//! `Device` declarations into the namespace. This is the narrow slice of
//! "namespace and parser" (`spec.md` §1) the core needs as an *input* - not
//! a general AML disassembler. Everything this loader doesn't recognize
//! inside a term list it skips over, since table loading is explicitly
//! out of scope for the execution engine this crate centers on.

use crate::{
    field::{FieldFlags, MethodFlags},
    name_object::AmlName,
    namespace::{Namespace, NodeKind},
    opcode,
    opregion::RegionSpace,
    pkg_length::PkgLength,
    value::{AmlValue, MethodCode},
    AmlError,
};
use alloc::{boxed::Box, vec::Vec};
use log::warn;

impl Namespace {
    /// Parse a Definition Block (or an SSDT) and install everything it
    /// declares under `scope` (normally the root).
    pub fn load_table(&mut self, scope: &AmlName, data: &[u8]) -> Result<(), AmlError> {
        let mut i = 0;
        while i < data.len() {
            i += self.load_term(scope, &data[i..])?;
        }
        Ok(())
    }

    /// Load one top-level term object at `data[0..]`, returning bytes
    /// consumed. Unrecognized opcodes are skipped by best-effort length
    /// accounting (their own `PkgLength`, if they carry one) - see the
    /// module doc comment.
    fn load_term(&mut self, scope: &AmlName, data: &[u8]) -> Result<usize, AmlError> {
        let (opcode, opcode_len) = read_opcode(data)?;
        let body = &data[opcode_len..];

        match opcode {
            opcode::NAME_OP => {
                let (name, name_len) = AmlName::parse(body)?;
                let (value, value_len) = parse_data_object(&body[name_len..])?;
                self.set(name.resolve(scope)?, NodeKind::Name(value));
                Ok(opcode_len + name_len + value_len)
            }

            opcode::SCOPE_OP => {
                let pkg = PkgLength::parse(body)?;
                let (name, name_len) = AmlName::parse(&body[pkg.encoding_len..])?;
                let inner_scope = name.resolve(scope)?;
                self.set(inner_scope.clone(), NodeKind::Scope);
                let body_start = pkg.encoding_len + name_len;
                let body_end = pkg.raw_length as usize;
                self.load_table(&inner_scope, &body[body_start..body_end])?;
                Ok(opcode_len + body_end)
            }

            opcode::DEVICE_OP => {
                let pkg = PkgLength::parse(body)?;
                let (name, name_len) = AmlName::parse(&body[pkg.encoding_len..])?;
                let inner_scope = name.resolve(scope)?;
                self.set(inner_scope.clone(), NodeKind::Device);
                let body_start = pkg.encoding_len + name_len;
                let body_end = pkg.raw_length as usize;
                self.load_table(&inner_scope, &body[body_start..body_end])?;
                Ok(opcode_len + body_end)
            }

            opcode::METHOD_OP => {
                let pkg = PkgLength::parse(body)?;
                let (name, name_len) = AmlName::parse(&body[pkg.encoding_len..])?;
                let flags = MethodFlags::new(*body.get(pkg.encoding_len + name_len).ok_or(AmlError::UnexpectedEndOfStream)?);
                let argc = flags.arg_count();
                let body_start = pkg.encoding_len + name_len + 1;
                let body_end = pkg.raw_length as usize;
                let code: Box<[u8]> = body[body_start..body_end].into();
                self.set(name.resolve(scope)?, NodeKind::Method { argc, code: MethodCode::Aml(code) });
                Ok(opcode_len + body_end)
            }

            opcode::OP_REGION_OP => {
                let (name, name_len) = AmlName::parse(body)?;
                let mut cursor = name_len;
                let space = RegionSpace::from_byte(*body.get(cursor).ok_or(AmlError::UnexpectedEndOfStream)?)?;
                cursor += 1;
                let (offset, offset_len) = parse_integer_term(&body[cursor..])?;
                cursor += offset_len;
                let (length, length_len) = parse_integer_term(&body[cursor..])?;
                cursor += length_len;
                self.set(
                    name.resolve(scope)?,
                    NodeKind::OpRegion { space, offset, length },
                );
                Ok(opcode_len + cursor)
            }

            opcode::FIELD_OP => {
                let pkg = PkgLength::parse(body)?;
                let (region, region_len) = AmlName::parse(&body[pkg.encoding_len..])?;
                let mut cursor = pkg.encoding_len + region_len;
                let mut flags = FieldFlags::new(*body.get(cursor).ok_or(AmlError::UnexpectedEndOfStream)?);
                cursor += 1;

                let body_end = pkg.raw_length as usize;
                let region_name = region.resolve(scope)?;
                let mut bit_offset = 0u64;
                while cursor < body_end {
                    match body[cursor] {
                        0x00 => {
                            // ReservedField := 0x00 PkgLength(bit count)
                            let skip = PkgLength::parse(&body[cursor + 1..])?;
                            bit_offset += skip.raw_length as u64;
                            cursor += 1 + skip.encoding_len;
                        }
                        0x01 => {
                            // AccessField := 0x01 AccessType AccessAttrib
                            flags = FieldFlags::new(*body.get(cursor + 1).ok_or(AmlError::UnexpectedEndOfStream)?);
                            cursor += 3;
                        }
                        _ => {
                            let name_bytes = body.get(cursor..cursor + 4).ok_or(AmlError::UnexpectedEndOfStream)?;
                            let field_len = PkgLength::parse(&body[cursor + 4..])?;
                            let field_name = AmlName { parent_levels: 0, rooted: false, segments: alloc::vec![crate::name_object::NameSeg::from_bytes(name_bytes)?] };
                            self.set(
                                field_name.resolve(scope)?,
                                NodeKind::Field {
                                    region: region_name.clone(),
                                    bit_offset,
                                    bit_length: field_len.raw_length as u64,
                                    flags,
                                },
                            );
                            bit_offset += field_len.raw_length as u64;
                            cursor += 4 + field_len.encoding_len;
                        }
                    }
                }
                Ok(opcode_len + body_end)
            }

            _ => {
                warn!("skipping unrecognized term object at table-load time (opcode {:#X})", opcode);
                Err(AmlError::UnsupportedTableOpcode(opcode))
            }
        }
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

/// A reduced `DataObject` parser for the object half of a `Name()`
/// declaration: literals only (no expressions - a method body isn't
/// running yet, so there's no operand/execution stack to evaluate one).
/// Reused by `declare::declare_name` for the same reason: a `Name()`
/// encountered at runtime still only needs its literal form here, since
/// anything dynamic goes through `expression::eval_term_arg` instead.
pub(crate) fn parse_data_object(data: &[u8]) -> Result<(AmlValue, usize), AmlError> {
    match data.first().copied() {
        Some(b) if b as u16 == opcode::ZERO_OP => Ok((AmlValue::zero(), 1)),
        Some(b) if b as u16 == opcode::ONE_OP => Ok((AmlValue::Integer(1), 1)),
        Some(b) if b as u16 == opcode::ONES_OP => Ok((AmlValue::ones(), 1)),
        Some(b) if b as u16 == opcode::BYTE_PREFIX => {
            Ok((AmlValue::Integer(*data.get(1).ok_or(AmlError::UnexpectedEndOfStream)? as u64), 2))
        }
        Some(b) if b as u16 == opcode::WORD_PREFIX => {
            let bytes = data.get(1..3).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(u16::from_le_bytes([bytes[0], bytes[1]]) as u64), 3))
        }
        Some(b) if b as u16 == opcode::DWORD_PREFIX => {
            let bytes = data.get(1..5).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(u32::from_le_bytes(bytes.try_into().unwrap()) as u64), 5))
        }
        Some(b) if b as u16 == opcode::QWORD_PREFIX => {
            let bytes = data.get(1..9).ok_or(AmlError::UnexpectedEndOfStream)?;
            Ok((AmlValue::Integer(u64::from_le_bytes(bytes.try_into().unwrap())), 9))
        }
        Some(b) if b as u16 == opcode::STRING_PREFIX => {
            let end = data[1..].iter().position(|&b| b == 0).ok_or(AmlError::UnterminatedStringConstant)?;
            let string = core::str::from_utf8(&data[1..1 + end]).map_err(|_| AmlError::InvalidStringConstant)?;
            Ok((AmlValue::String(string.into()), 1 + end + 1))
        }
        Some(b) if b as u16 == opcode::BUFFER_OP => {
            let pkg = PkgLength::parse(&data[1..])?;
            let (buffer_size, size_len) = parse_integer_term(&data[1 + pkg.encoding_len..])?;
            let payload_start = 1 + pkg.encoding_len + size_len;
            let body_end = 1 + pkg.raw_length as usize;
            let mut bytes: Vec<u8> = data[payload_start..body_end].to_vec();
            bytes.resize(buffer_size as usize, 0);
            Ok((AmlValue::Buffer(bytes), body_end))
        }
        Some(_) => Err(AmlError::MalformedStream),
        None => Err(AmlError::UnexpectedEndOfStream),
    }
}

/// Parse one of the integer-literal TermArg forms used inside the loader
/// (buffer sizes, OpRegion offsets/lengths) - a strict subset of
/// `expression::eval_term_arg` that never needs a running method.
pub(crate) fn parse_integer_term(data: &[u8]) -> Result<(u64, usize), AmlError> {
    match parse_data_object(data)? {
        (AmlValue::Integer(value), len) => Ok((value, len)),
        _ => Err(AmlError::MalformedStream),
    }
}
