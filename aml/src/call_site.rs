//! The call site (C7): turns a resolved `Method` namespace node plus the
//! bytes immediately following a name reference into a nested invocation.
//! Per `spec.md` §4.7, evaluating a method call is the one place the
//! otherwise-iterative dispatcher (C5) genuinely recurses - each call gets
//! its own fresh [`CallState`] (its own C2/C3 pair), and host-stack
//! recursion stands in for AML call nesting rather than growing either of
//! the fixed-depth stacks.

use crate::{
    method, name_object::AmlName, namespace::NodeKind, state::CallState, value::Args, AmlContext, AmlError,
};
use alloc::vec::Vec;

/// `resolved` names a `Method` node. Parse `argc` `TermArg`s starting at
/// `method[i..]`, invoke the method with them, and report total bytes
/// consumed (just the argument list - the name itself was already parsed
/// by the caller).
pub(crate) fn invoke_at(
    ctx: &mut AmlContext,
    caller: &mut CallState,
    method: &[u8],
    i: usize,
    resolved: &AmlName,
    argc: u8,
) -> Result<(crate::value::AmlValue, usize), AmlError> {
    let mut cursor = i;
    let mut args = Args::EMPTY;
    for arg_index in 0..argc as usize {
        let (value, len) = crate::expression::eval_term_arg(ctx, caller, method, cursor)?;
        args.push(arg_index, value);
        cursor += len;
    }

    let retval = method::invoke_method(ctx, resolved, args)?;
    Ok((retval, cursor - i))
}

/// Invoke an already-resolved method with no further argument parsing -
/// used when the caller already has evaluated `AmlValue`s in hand (for
/// instance `expression::read_named`'s zero-arg fast path).
pub(crate) fn invoke_resolved(
    ctx: &mut AmlContext,
    _caller: &mut CallState,
    resolved: &AmlName,
    args: Vec<crate::value::AmlValue>,
) -> Result<crate::value::AmlValue, AmlError> {
    let mut packed = Args::EMPTY;
    for (index, value) in args.into_iter().enumerate() {
        packed.push(index, value);
    }
    method::invoke_method(ctx, resolved, packed)
}

/// What `resolved`'s node kind is, for callers that need to branch before
/// deciding whether this is a call site at all.
pub(crate) fn argc_of(ctx: &AmlContext, resolved: &AmlName) -> Result<Option<u8>, AmlError> {
    Ok(match ctx.namespace.get(resolved)? {
        NodeKind::Method { argc, .. } => Some(*argc),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::TestHandler, value::AmlValue, DebugVerbosity};
    use alloc::boxed::Box;

    fn ctx() -> AmlContext {
        AmlContext::new(Box::new(TestHandler::new()), DebugVerbosity::None)
    }

    #[test]
    fn argc_of_reports_none_for_a_plain_name() {
        let mut ctx = ctx();
        let name = AmlName::from_str("\\FOO_").unwrap();
        ctx.namespace.add(name.clone(), NodeKind::Name(AmlValue::Integer(1))).unwrap();
        assert_eq!(argc_of(&ctx, &name).unwrap(), None);
    }

    #[test]
    fn argc_of_reports_declared_arg_count() {
        let ctx = ctx();
        // `_OSI` is registered at construction with argc = 1.
        let name = AmlName::from_str("\\_OSI").unwrap();
        assert_eq!(argc_of(&ctx, &name).unwrap(), Some(1));
    }

    #[test]
    fn invoke_resolved_packs_positional_args() {
        let mut ctx = ctx();
        let mut caller = CallState::new(AmlName::root(), Args::EMPTY);
        let resolved = AmlName::from_str("\\_OSI").unwrap();
        let result = invoke_resolved(&mut ctx, &mut caller, &resolved, alloc::vec![AmlValue::String("Linux".into())])
            .unwrap();
        assert_eq!(result, AmlValue::zero());
    }
}
