//! Field-unit flag bytes and method-flag bytes, both packed bitfields per
//! the ACPI grammar (§19.6.48 `FieldFlags`, §19.6.97 `MethodObj`). Unpacked
//! with `bit_field::BitField`, the same crate the teacher crate already
//! depends on for exactly this purpose.

use crate::AmlError;
use bit_field::BitField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccessType {
    Any,
    Byte,
    Word,
    DWord,
    QWord,
    Buffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdateRule {
    Preserve,
    WriteAsOnes,
    WriteAsZeros,
}

/// The flag byte that follows a `Field`/`IndexField` declaration's region
/// name, encoding the access type (bits 0-3), whether the field is "lockable"
/// (bit 4), and the update rule for partial writes (bits 5-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFlags(u8);

impl FieldFlags {
    pub fn new(byte: u8) -> FieldFlags {
        FieldFlags(byte)
    }

    pub fn access_type(&self) -> Result<FieldAccessType, AmlError> {
        Ok(match self.0.get_bits(0..4) {
            0 => FieldAccessType::Any,
            1 => FieldAccessType::Byte,
            2 => FieldAccessType::Word,
            3 => FieldAccessType::DWord,
            4 => FieldAccessType::QWord,
            5 => FieldAccessType::Buffer,
            _ => return Err(AmlError::InvalidFieldFlags),
        })
    }

    pub fn lock_rule(&self) -> bool {
        self.0.get_bit(4)
    }

    pub fn field_update_rule(&self) -> Result<FieldUpdateRule, AmlError> {
        Ok(match self.0.get_bits(5..7) {
            0 => FieldUpdateRule::Preserve,
            1 => FieldUpdateRule::WriteAsOnes,
            2 => FieldUpdateRule::WriteAsZeros,
            _ => return Err(AmlError::InvalidFieldFlags),
        })
    }
}

/// The flag byte in a `Method` declaration: argument count in the low 3
/// bits (`spec.md` §4.6 step 3), a "serialized" bit, and a sync-level
/// nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodFlags(u8);

impl MethodFlags {
    pub fn new(byte: u8) -> MethodFlags {
        MethodFlags(byte)
    }

    pub fn arg_count(&self) -> u8 {
        self.0.get_bits(0..3)
    }

    pub fn serialized(&self) -> bool {
        self.0.get_bit(3)
    }

    pub fn sync_level(&self) -> u8 {
        self.0.get_bits(4..8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_method_argc() {
        let flags = MethodFlags::new(0b0000_0011);
        assert_eq!(flags.arg_count(), 3);
        assert!(!flags.serialized());
    }

    #[test]
    fn decodes_field_access_and_update_rule() {
        // access type = Byte (1), update rule = WriteAsOnes (1 in bits 5..7)
        let byte = 0b0010_0001;
        let flags = FieldFlags::new(byte);
        assert_eq!(flags.access_type().unwrap(), FieldAccessType::Byte);
        assert_eq!(flags.field_update_rule().unwrap(), FieldUpdateRule::WriteAsOnes);
    }
}
