//! AML `NameString` parsing and representation (NS). Grounded in the ACPI
//! name-object grammar (§20.2.2); the teacher crate's own `name_object.rs`
//! was not retrieved, so this is rebuilt from the spec the teacher's public
//! API (`AmlName`, re-exported from `lib.rs`) already commits to.

use crate::{
    opcode::{DUAL_NAME_PREFIX, MULTI_NAME_PREFIX, NULL_NAME, PARENT_PREFIX_CHAR, ROOT_CHAR},
    AmlError,
};
use alloc::{format, string::String, vec::Vec};
use core::fmt;

/// A single 4-character name segment, e.g. `_SB_` or `PCI0`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    pub fn from_bytes(bytes: &[u8]) -> Result<NameSeg, AmlError> {
        if bytes.len() != 4 {
            return Err(AmlError::InvalidNameSeg);
        }
        let mut seg = [b'_'; 4];
        seg.copy_from_slice(bytes);
        if !seg[0].is_ascii_uppercase() && seg[0] != b'_' {
            return Err(AmlError::InvalidNameSeg);
        }
        for &byte in &seg[1..] {
            if !(byte.is_ascii_uppercase() || byte.is_ascii_digit() || byte == b'_') {
                return Err(AmlError::InvalidNameSeg);
            }
        }
        Ok(NameSeg(seg))
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully- or partially-qualified AML name, e.g. `\_SB.PCI0.S08._ADR` or
/// `^^LID0`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmlName {
    /// Number of `^` (parent) prefixes. Meaningless (and always `0`) if
    /// `rooted` is `true` - a name cannot be both absolute and relative.
    pub parent_levels: u32,
    pub rooted: bool,
    pub segments: Vec<NameSeg>,
}

impl AmlName {
    pub fn root() -> AmlName {
        AmlName { parent_levels: 0, rooted: true, segments: Vec::new() }
    }

    pub fn from_str(string: &str) -> Result<AmlName, AmlError> {
        let bytes = string.as_bytes();
        let mut cursor = 0;
        let rooted = bytes.first() == Some(&ROOT_CHAR);
        if rooted {
            cursor += 1;
        }

        let mut parent_levels = 0;
        while !rooted && bytes.get(cursor) == Some(&PARENT_PREFIX_CHAR) {
            parent_levels += 1;
            cursor += 1;
        }

        let mut segments = Vec::new();
        if bytes.get(cursor).is_none() && (rooted || parent_levels > 0) {
            return Ok(AmlName { parent_levels, rooted, segments });
        }
        if bytes.len() == cursor {
            return Err(AmlError::EmptyNamesAreInvalid);
        }

        for part in bytes[cursor..].split(|&byte| byte == b'.') {
            if part.is_empty() || part.len() > 4 {
                return Err(AmlError::InvalidNameSeg);
            }
            // Human-written names often drop the trailing `_` padding AML
            // requires every segment to have (e.g. `_SB` for `_SB_`).
            let mut padded = [b'_'; 4];
            padded[..part.len()].copy_from_slice(part);
            segments.push(NameSeg::from_bytes(&padded)?);
        }

        Ok(AmlName { parent_levels, rooted, segments })
    }

    /// Parse a `NameString` encoded in an AML byte stream at `data`,
    /// returning the name and the number of bytes it occupied.
    pub fn parse(data: &[u8]) -> Result<(AmlName, usize), AmlError> {
        let mut cursor = 0;
        let rooted = data.first() == Some(&ROOT_CHAR);
        if rooted {
            cursor += 1;
        }

        let mut parent_levels = 0;
        while data.get(cursor) == Some(&PARENT_PREFIX_CHAR) {
            parent_levels += 1;
            cursor += 1;
        }

        let mut segments = Vec::new();
        match data.get(cursor).copied() {
            Some(NULL_NAME) => {
                cursor += 1;
            }
            Some(byte) if byte == DUAL_NAME_PREFIX => {
                cursor += 1;
                for _ in 0..2 {
                    segments.push(NameSeg::from_bytes(data.get(cursor..cursor + 4).ok_or(AmlError::UnexpectedEndOfStream)?)?);
                    cursor += 4;
                }
            }
            Some(byte) if byte == MULTI_NAME_PREFIX => {
                cursor += 1;
                let count = *data.get(cursor).ok_or(AmlError::UnexpectedEndOfStream)? as usize;
                cursor += 1;
                for _ in 0..count {
                    segments.push(NameSeg::from_bytes(data.get(cursor..cursor + 4).ok_or(AmlError::UnexpectedEndOfStream)?)?);
                    cursor += 4;
                }
            }
            Some(_) => {
                segments.push(NameSeg::from_bytes(data.get(cursor..cursor + 4).ok_or(AmlError::UnexpectedEndOfStream)?)?);
                cursor += 4;
            }
            None => return Err(AmlError::UnexpectedEndOfStream),
        }

        Ok((AmlName { parent_levels, rooted, segments }, cursor))
    }

    /// Resolve `self` (which may be relative) against `scope` to produce an
    /// absolute, normalized name. Does not perform namespace lookup or apply
    /// the ACPI "search rule" - see `Namespace::search` for that.
    pub fn resolve(&self, scope: &AmlName) -> Result<AmlName, AmlError> {
        if self.rooted {
            return Ok(AmlName { parent_levels: 0, rooted: true, segments: self.segments.clone() });
        }

        let mut base = scope.segments.clone();
        for _ in 0..self.parent_levels {
            if base.pop().is_none() {
                return Err(AmlError::InvalidNormalizedName(self.clone()));
            }
        }
        base.extend(self.segments.iter().copied());
        Ok(AmlName { parent_levels: 0, rooted: true, segments: base })
    }

    /// The name of the level containing this name (its last segment
    /// stripped), or `None` if this name is the root.
    pub fn parent(&self) -> Option<AmlName> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(AmlName { parent_levels: 0, rooted: true, segments })
    }
}

impl fmt::Debug for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rooted {
            write!(f, "\\")?;
        }
        for _ in 0..self.parent_levels {
            write!(f, "^")?;
        }
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

impl From<&AmlName> for String {
    fn from(name: &AmlName) -> String {
        format!("{}", name)
    }
}

/// The destination of a `Store` (or any opcode that carries a write-back
/// target, per the Open Question in `spec.md` §9).
#[derive(Debug, Clone)]
pub enum Target {
    Null,
    Name(AmlName),
    Debug,
    Arg(u8),
    Local(u8),
}

impl Target {
    /// Parse a `Target`/`SuperName` at `data`, returning the target and
    /// bytes consumed.
    pub fn parse(data: &[u8]) -> Result<(Target, usize), AmlError> {
        match data.first().copied() {
            Some(crate::opcode::NULL_NAME) => Ok((Target::Null, 1)),
            Some(byte) if (crate::opcode::LOCAL0_OP as u8..=crate::opcode::LOCAL7_OP as u8).contains(&byte) => {
                Ok((Target::Local(byte - crate::opcode::LOCAL0_OP as u8), 1))
            }
            Some(byte) if (crate::opcode::ARG0_OP as u8..=crate::opcode::ARG6_OP as u8).contains(&byte) => {
                Ok((Target::Arg(byte - crate::opcode::ARG0_OP as u8), 1))
            }
            Some(_) => {
                let (name, len) = AmlName::parse(data)?;
                Ok((Target::Name(name), len))
            }
            None => Err(AmlError::UnexpectedEndOfStream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_segment() {
        let (name, len) = AmlName::parse(b"_SB_").unwrap();
        assert_eq!(len, 4);
        assert!(!name.rooted);
        assert_eq!(name.segments, alloc::vec![NameSeg::from_bytes(b"_SB_").unwrap()]);
    }

    #[test]
    fn parses_rooted_dual_name() {
        let (name, len) = AmlName::parse(b"\\\x2E_SB_PCI0").unwrap();
        assert_eq!(len, 10);
        assert!(name.rooted);
        assert_eq!(name.segments.len(), 2);
    }

    #[test]
    fn parses_parent_prefix() {
        let (name, len) = AmlName::parse(b"^^PCI0").unwrap();
        assert_eq!(len, 6);
        assert_eq!(name.parent_levels, 2);
        assert!(!name.rooted);
    }

    #[test]
    fn resolve_relative_against_scope() {
        let scope = AmlName::from_str("\\_SB.PCI0").unwrap();
        let relative = AmlName::from_str("S08").unwrap();
        let resolved = relative.resolve(&scope).unwrap();
        assert_eq!(alloc::format!("{}", resolved), "\\_SB.PCI0.S08");
    }

    #[test]
    fn resolve_with_parent_prefix() {
        let scope = AmlName::from_str("\\_SB.PCI0").unwrap();
        let relative = AmlName::from_str("^LID0").unwrap();
        let resolved = relative.resolve(&scope).unwrap();
        assert_eq!(alloc::format!("{}", resolved), "\\_SB.LID0");
    }
}
