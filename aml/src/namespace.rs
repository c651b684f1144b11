//! The ACPI namespace (NS): a hierarchical, path-keyed tree of named
//! objects. Out of the core's scope per `spec.md` §1, but the core cannot
//! run without *some* implementation of it, so this is the minimal real
//! one: a flat `BTreeMap` keyed by normalized absolute path, plus the ACPI
//! "search rule" for resolving relative names.

use crate::{
    field::FieldFlags,
    name_object::{AmlName, NameSeg},
    opregion::RegionSpace,
    value::{AmlValue, MethodCode},
    AmlError,
};
use alloc::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum NodeKind {
    Name(AmlValue),
    Method { argc: u8, code: MethodCode },
    Field { region: AmlName, bit_offset: u64, bit_length: u64, flags: FieldFlags },
    OpRegion { space: RegionSpace, offset: u64, length: u64 },
    Scope,
    Device,
    Processor,
    PowerResource,
    ThermalZone,
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Name(_) => "Name",
            NodeKind::Method { .. } => "Method",
            NodeKind::Field { .. } => "Field",
            NodeKind::OpRegion { .. } => "OpRegion",
            NodeKind::Scope => "Scope",
            NodeKind::Device => "Device",
            NodeKind::Processor => "Processor",
            NodeKind::PowerResource => "PowerResource",
            NodeKind::ThermalZone => "ThermalZone",
        }
    }
}

#[derive(Debug, Default)]
pub struct Namespace {
    nodes: BTreeMap<AmlName, NodeKind>,
}

impl Namespace {
    pub fn new() -> Namespace {
        Namespace { nodes: BTreeMap::new() }
    }

    pub fn add(&mut self, name: AmlName, kind: NodeKind) -> Result<(), AmlError> {
        if self.nodes.contains_key(&name) {
            return Err(AmlError::NameCollision(name));
        }
        self.nodes.insert(name, kind);
        Ok(())
    }

    /// Like [`Namespace::add`], but overwrites an existing node. Used for
    /// re-declaring predefined scopes that firmware may also declare.
    pub fn set(&mut self, name: AmlName, kind: NodeKind) {
        self.nodes.insert(name, kind);
    }

    pub fn get(&self, name: &AmlName) -> Result<&NodeKind, AmlError> {
        self.nodes.get(name).ok_or_else(|| AmlError::ValueDoesNotExist(name.clone()))
    }

    pub fn get_mut(&mut self, name: &AmlName) -> Result<&mut NodeKind, AmlError> {
        self.nodes.get_mut(name).ok_or_else(|| AmlError::ValueDoesNotExist(name.clone()))
    }

    pub fn contains(&self, name: &AmlName) -> bool {
        self.nodes.contains_key(name)
    }

    /// Resolve `name` relative to `scope` using the ACPI "search rule": an
    /// absolute or parent-relative name resolves directly; a plain name is
    /// looked up using only its first segment, tried first in `scope`, then
    /// in each ancestor of `scope` up to the root, and the remaining
    /// segments (if any) are then a direct child path from the level where
    /// the first segment was found.
    pub fn search(&self, name: &AmlName, scope: &AmlName) -> Result<AmlName, AmlError> {
        if name.rooted || name.parent_levels > 0 {
            let resolved = name.resolve(scope)?;
            if self.nodes.contains_key(&resolved) {
                return Ok(resolved);
            }
            return Err(AmlError::ValueDoesNotExist(resolved));
        }

        let Some((first, rest)) = name.segments.split_first() else {
            return Err(AmlError::EmptyNamesAreInvalid);
        };

        let mut candidate_scope = scope.segments.clone();
        loop {
            let mut full = candidate_scope.clone();
            full.push(*first);
            let first_level = AmlName { parent_levels: 0, rooted: true, segments: full };

            if self.nodes.contains_key(&first_level) {
                if rest.is_empty() {
                    return Ok(first_level);
                }
                let mut segments = first_level.segments;
                segments.extend_from_slice(rest);
                let full_name = AmlName { parent_levels: 0, rooted: true, segments };
                if self.nodes.contains_key(&full_name) {
                    return Ok(full_name);
                }
                return Err(AmlError::ValueDoesNotExist(full_name));
            }

            if candidate_scope.is_empty() {
                return Err(AmlError::ValueDoesNotExist(name.resolve(scope)?));
            }
            candidate_scope.pop();
        }
    }

    /// Resolve a segment-only name (used to check "does `\_SB.PCI0` have a
    /// `_STA` child") without the full search rule - a direct lookup.
    pub fn child(&self, scope: &AmlName, seg: NameSeg) -> bool {
        let mut segments = scope.segments.clone();
        segments.push(seg);
        self.nodes.contains_key(&AmlName { parent_levels: 0, rooted: true, segments })
    }

    pub fn add_predefined_objects(&mut self, osi: fn(&mut crate::AmlContext, &mut crate::CallState) -> Result<AmlValue, AmlError>, os: fn(&mut crate::AmlContext, &mut crate::CallState) -> Result<AmlValue, AmlError>, rev: fn(&mut crate::AmlContext, &mut crate::CallState) -> Result<AmlValue, AmlError>) {
        for scope in ["\\_GPE", "\\_SB", "\\_SI", "\\_PR", "\\_TZ"] {
            let name = AmlName::from_str(scope).unwrap();
            self.set(name, NodeKind::Scope);
        }

        self.set(AmlName::from_str("\\_OSI").unwrap(), NodeKind::Method { argc: 1, code: MethodCode::Native(osi) });
        self.set(AmlName::from_str("\\_OS_").unwrap(), NodeKind::Method { argc: 0, code: MethodCode::Native(os) });
        self.set(AmlName::from_str("\\_REV").unwrap(), NodeKind::Method { argc: 0, code: MethodCode::Native(rev) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> AmlName {
        AmlName::from_str(s).unwrap()
    }

    #[test]
    fn search_finds_sibling_in_ancestor_scope() {
        let mut ns = Namespace::new();
        ns.add(name("\\_SB"), NodeKind::Scope).unwrap();
        ns.add(name("\\_SB.PCI0"), NodeKind::Scope).unwrap();
        ns.add(name("\\FOO_"), NodeKind::Name(AmlValue::Integer(42))).unwrap();

        let resolved = ns.search(&name("FOO_"), &name("\\_SB.PCI0")).unwrap();
        assert_eq!(resolved, name("\\FOO_"));
    }

    #[test]
    fn search_prefers_nearest_scope() {
        let mut ns = Namespace::new();
        ns.add(name("\\_SB"), NodeKind::Scope).unwrap();
        ns.add(name("\\_SB.FOO_"), NodeKind::Name(AmlValue::Integer(1))).unwrap();
        ns.add(name("\\FOO_"), NodeKind::Name(AmlValue::Integer(2))).unwrap();

        let resolved = ns.search(&name("FOO_"), &name("\\_SB")).unwrap();
        assert_eq!(resolved, name("\\_SB.FOO_"));
    }

    #[test]
    fn absolute_name_resolves_directly() {
        let mut ns = Namespace::new();
        ns.add(name("\\_SB"), NodeKind::Scope).unwrap();
        ns.add(name("\\_SB.PCI0"), NodeKind::Scope).unwrap();

        let resolved = ns.search(&name("\\_SB.PCI0"), &name("\\_SB")).unwrap();
        assert_eq!(resolved, name("\\_SB.PCI0"));
    }
}
