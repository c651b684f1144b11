//! Method entry (C6): the single entry point from "I have a resolved
//! `Method` node and some `Args`" to "I have its return value". Handles the
//! three reserved predefined methods (`_OSI`, `_OS_`, `_REV`) natively and
//! everything else by handing the method's AML bytes to the dispatcher
//! (C5) with a fresh [`CallState`].

use crate::{
    dispatcher, name_object::AmlName, namespace::NodeKind, state::CallState, value::{AmlValue, Args, MethodCode},
    AmlContext, AmlError,
};
use log::warn;

/// Operating systems this interpreter claims support for via `_OSI`
/// (`spec.md` §6's bit-exact, ordered table).
const SUPPORTED_OSI_STRINGS: &[&str] = &[
    "Windows 2000",
    "Windows 2001",
    "Windows 2001 SP1",
    "Windows 2001.1",
    "Windows 2006",
    "Windows 2006.1",
    "Windows 2006 SP1",
    "Windows 2006 SP2",
    "Windows 2009",
    "Windows 2012",
    "Windows 2013",
    "Windows 2015",
];

pub fn invoke_method(ctx: &mut AmlContext, resolved: &AmlName, args: Args) -> Result<AmlValue, AmlError> {
    let code = match ctx.namespace.get(resolved)? {
        NodeKind::Method { code, .. } => code.clone(),
        other => return Err(AmlError::UnexpectedNodeKind(other.type_name())),
    };

    let mut call = CallState::new(resolved.clone(), args);

    match code {
        MethodCode::Native(func) => func(ctx, &mut call),
        MethodCode::Aml(aml) => exec_aml_method(ctx, &mut call, &aml),
    }
}

/// `spec.md` §4.5/§8 (P3): once the dispatcher returns successfully, the
/// operand stack must hold exactly one value - the method's result,
/// whether it got there via an explicit `Return` or the implicit
/// `Return(Zero)` `dispatcher::run` pushes on falling off the end. Moves
/// that value into `call.retvalue` and pops it, matching `spec.md`'s call
/// state shape.
fn exec_aml_method(ctx: &mut AmlContext, call: &mut CallState, code: &[u8]) -> Result<AmlValue, AmlError> {
    dispatcher::run(ctx, call, code)?;
    if call.opstack.len() != 1 {
        return Err(AmlError::OperandStackNotExactlyOneAtMethodEnd);
    }
    call.retvalue = call.opstack.pop_value()?;
    Ok(call.retvalue.take())
}

/// `\_OSI`: reports whether the host recognizes a feature/OS-version
/// string. We report support for every string in [`SUPPORTED_OSI_STRINGS`]
/// except "Linux" - which many DSDTs probe for directly despite it never
/// being a real `_OSI` string, and which ACPI CA itself recommends always
/// answering "no" to, logging when asked (`spec.md` §4.6 Edge cases).
pub(crate) fn osi(_ctx: &mut AmlContext, call: &mut CallState) -> Result<AmlValue, AmlError> {
    let query = call.args.arg(0)?.as_string()?;

    if query == "Linux" {
        warn!("firmware queried _OSI(\"Linux\") - reporting unsupported, as real hosts do");
        return Ok(AmlValue::zero());
    }

    let supported = SUPPORTED_OSI_STRINGS.iter().any(|&candidate| candidate == query);
    Ok(if supported { AmlValue::Integer(0xFFFF_FFFF) } else { AmlValue::zero() })
}

/// `\_OS_`: the OS identification string AML checks with `LEqual` rather
/// than `_OSI`'s feature-query protocol. Reporting the same string real
/// Windows-targeting firmware expects is what lets those paths run at all.
pub(crate) fn os(_ctx: &mut AmlContext, _call: &mut CallState) -> Result<AmlValue, AmlError> {
    Ok(AmlValue::String("Microsoft Windows NT".into()))
}

/// `\_REV`: the supported ACPI revision. `2` (the value real interpreters
/// report once they implement ACPI 2.0+ integer width) per `spec.md` §4.6.
pub(crate) fn rev(_ctx: &mut AmlContext, _call: &mut CallState) -> Result<AmlValue, AmlError> {
    Ok(AmlValue::Integer(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::TestHandler, DebugVerbosity};
    use alloc::boxed::Box;

    fn ctx() -> AmlContext {
        AmlContext::new(Box::new(TestHandler::new()), DebugVerbosity::None)
    }

    #[test]
    fn osi_unknown_string_is_unsupported() {
        let mut ctx = ctx();
        let mut call = CallState::new(AmlName::root(), Args::EMPTY);
        call.args.push(0, AmlValue::String("Plan 9".into()));
        assert_eq!(osi(&mut ctx, &mut call).unwrap(), AmlValue::zero());
    }

    #[test]
    fn osi_known_string_reports_the_32_bit_dword_not_full_ones() {
        let mut ctx = ctx();
        let mut call = CallState::new(AmlName::root(), Args::EMPTY);
        call.args.push(0, AmlValue::String("Windows 2006".into()));
        // Must be the 32-bit DWORD, not `AmlValue::ones()`'s full 64-bit value.
        assert_eq!(osi(&mut ctx, &mut call).unwrap(), AmlValue::Integer(0xFFFF_FFFF));
    }

    #[test]
    fn invoke_method_dispatches_a_predefined_native_method() {
        let mut ctx = ctx();
        let resolved = AmlName::from_str("\\_REV").unwrap();
        let result = invoke_method(&mut ctx, &resolved, Args::EMPTY).unwrap();
        assert_eq!(result, AmlValue::Integer(2));
    }
}
