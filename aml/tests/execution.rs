//! End-to-end tests: load a small hand-assembled table and invoke its
//! methods through the public `AmlContext` API, exercising the
//! dispatcher, namespace, and reserved predefined methods together.

use aml::test_utils::TestHandler;
use aml::{AmlContext, AmlValue, DebugVerbosity};

fn context() -> AmlContext {
    AmlContext::new(Box::new(TestHandler::new()), DebugVerbosity::None)
}

/// A definition block declaring control methods under the root:
/// - `MTH0`: an empty body (implicit `Return (Zero)`)
/// - `MTH1`: `Return (42)`
/// - `MTH2`: `Return (Add (5, 7, Zero))`
/// - `MTH3`: counts `Local0` up with `While`/`Increment`, `Break`ing at 3
/// - `MTH4`: `If (LEqual (Local0, 1)) { Return (111) } Else { Return (222) }`
/// - `MTH5`: takes one argument, `Return (Add (Arg0, 1, Zero))`
/// - `MTH6`: `Return (MTH5 (7))`, exercising a call site that parses an
///   argument list for the callee's declared `argc`
/// - `MTH7`: `Return (CondRefOf (MTH1, Local1))`
const TABLE: &[u8] = &[
    // MTH0: Method(MTH0) {}
    0x14, 0x06, b'M', b'T', b'H', b'0', 0x00,
    // MTH1: Method(MTH1) { Return (42) }
    0x14, 0x09, b'M', b'T', b'H', b'1', 0x00, 0xA4, 0x0A, 0x2A,
    // MTH2: Method(MTH2) { Return (Add (5, 7, Zero)) }
    0x14, 0x0D, b'M', b'T', b'H', b'2', 0x00, 0xA4, 0x72, 0x0A, 0x05, 0x0A, 0x07, 0x00,
    // MTH3: Method(MTH3) { While (LLess (Local0, 10)) { Increment (Local0); If (LEqual (Local0, 3)) { Break } }; Return (Local0) }
    0x14, 0x17, b'M', b'T', b'H', b'3', 0x00, 0xA2, 0x0E, 0x95, 0x60, 0x0A, 0x0A, 0x75, 0x60, 0xA0, 0x06, 0x93,
    0x60, 0x0A, 0x03, 0xA5, 0xA4, 0x60,
    // MTH4: Method(MTH4) { If (LEqual (Local0, 1)) { Return (111) } Else { Return (222) } }
    0x14, 0x14, b'M', b'T', b'H', b'4', 0x00, 0xA0, 0x08, 0x93, 0x60, 0x0A, 0x01, 0xA4, 0x0A, 0x6F, 0xA1, 0x04, 0xA4,
    0x0A, 0xDE,
    // MTH5: Method(MTH5, 1) { Return (Add (Arg0, 1, Zero)) }
    0x14, 0x0C, b'M', b'T', b'H', b'5', 0x01, 0xA4, 0x72, 0x68, 0x0A, 0x01, 0x00,
    // MTH6: Method(MTH6) { Return (MTH5 (7)) }
    0x14, 0x0D, b'M', b'T', b'H', b'6', 0x00, 0xA4, b'M', b'T', b'H', b'5', 0x0A, 0x07,
    // MTH7: Method(MTH7) { Return (CondRefOf (MTH1, Local1)) }
    0x14, 0x0E, b'M', b'T', b'H', b'7', 0x00, 0xA4, 0x5B, 0x12, b'M', b'T', b'H', b'1', 0x61,
];

fn loaded() -> AmlContext {
    let mut ctx = context();
    ctx.parse_table(TABLE).unwrap();
    ctx
}

#[test]
fn empty_method_implicitly_returns_zero() {
    let mut ctx = loaded();
    let result = ctx.invoke_method("\\MTH0", vec![]).unwrap();
    assert_eq!(result, AmlValue::Integer(0));
}

#[test]
fn explicit_return_value() {
    let mut ctx = loaded();
    let result = ctx.invoke_method("\\MTH1", vec![]).unwrap();
    assert_eq!(result, AmlValue::Integer(42));
}

#[test]
fn arithmetic_with_discarded_target() {
    let mut ctx = loaded();
    let result = ctx.invoke_method("\\MTH2", vec![]).unwrap();
    assert_eq!(result, AmlValue::Integer(12));
}

#[test]
fn while_loop_breaks_at_three() {
    let mut ctx = loaded();
    let result = ctx.invoke_method("\\MTH3", vec![]).unwrap();
    assert_eq!(result, AmlValue::Integer(3));
}

#[test]
fn if_else_takes_the_false_branch() {
    let mut ctx = loaded();
    // Local0 starts at zero, so `LEqual (Local0, 1)` is false and MTH4
    // should take the `Else` branch.
    let result = ctx.invoke_method("\\MTH4", vec![]).unwrap();
    assert_eq!(result, AmlValue::Integer(222));
}

#[test]
fn osi_reports_known_windows_versions_supported() {
    let mut ctx = context();
    let result = ctx.invoke_method("\\_OSI", vec![AmlValue::String("Windows 2009".into())]).unwrap();
    assert_eq!(result, AmlValue::Integer(0xFFFF_FFFF));
}

#[test]
fn osi_reports_linux_unsupported() {
    let mut ctx = context();
    let result = ctx.invoke_method("\\_OSI", vec![AmlValue::String("Linux".into())]).unwrap();
    assert_eq!(result, AmlValue::Integer(0));
}

#[test]
fn osi_reports_unknown_strings_unsupported() {
    let mut ctx = context();
    let result = ctx.invoke_method("\\_OSI", vec![AmlValue::String("Plan 9".into())]).unwrap();
    assert_eq!(result, AmlValue::Integer(0));
}

#[test]
fn method_call_with_argument_chains_through_call_site() {
    let mut ctx = loaded();
    let result = ctx.invoke_method("\\MTH6", vec![]).unwrap();
    assert_eq!(result, AmlValue::Integer(8));
}

#[test]
fn cond_ref_of_reports_existing_method() {
    let mut ctx = loaded();
    let result = ctx.invoke_method("\\MTH7", vec![]).unwrap();
    assert_eq!(result, AmlValue::boolean(true));
}

#[test]
fn os_and_rev_report_expected_values() {
    let mut ctx = context();
    assert_eq!(ctx.invoke_method("\\_OS_", vec![]).unwrap(), AmlValue::String("Microsoft Windows NT".into()));
    assert_eq!(ctx.invoke_method("\\_REV", vec![]).unwrap(), AmlValue::Integer(2));
}
