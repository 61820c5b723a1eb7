use super::*;

fn constant(kind: ConstKind, raw: &str) -> Const {
    Const {
        kind,
        raw: raw.to_string(),
        span: Span { line: 3, column: 7 },
    }
}

#[test]
fn int_values() {
    assert_eq!(decode_int(&constant(ConstKind::Int, "0")).unwrap(), 0);
    assert_eq!(decode_int(&constant(ConstKind::Int, "007")).unwrap(), 7);
    assert_eq!(decode_int(&constant(ConstKind::Int, "2147483647")).unwrap(), i32::MAX);
}

#[test]
fn int_overflow_is_illegal() {
    let err = decode_int(&constant(ConstKind::Int, "2147483648")).unwrap_err();
    assert!(matches!(err, CodegenError::IllegalConstant { line: 3, column: 7, .. }));
}

#[test]
fn char_values() {
    assert_eq!(decode_char(&constant(ConstKind::Char, "'a'")).unwrap(), 97);
    assert_eq!(decode_char(&constant(ConstKind::Char, "' '")).unwrap(), 32);
    assert_eq!(decode_char(&constant(ConstKind::Char, r"'\n'")).unwrap(), 10);
    assert_eq!(decode_char(&constant(ConstKind::Char, r"'\''")).unwrap(), 39);
    assert_eq!(decode_char(&constant(ConstKind::Char, r"'\\'")).unwrap(), 92);
    assert_eq!(decode_char(&constant(ConstKind::Char, r"'\7e'")).unwrap(), 0x7E);
    assert_eq!(decode_char(&constant(ConstKind::Char, r"'\00'")).unwrap(), 0);
}

#[test]
fn string_gets_terminator() {
    let values = decode_str(&constant(ConstKind::Str, r#""hi""#)).unwrap();
    assert_eq!(values, vec![104, 105, 0]);
    let empty = decode_str(&constant(ConstKind::Str, r#""""#)).unwrap();
    assert_eq!(empty, vec![0]);
}

#[test]
fn string_escapes() {
    let values = decode_str(&constant(ConstKind::Str, r#""a\nb\"c\\d\41e""#)).unwrap();
    assert_eq!(values, vec![97, 10, 98, 34, 99, 92, 100, 0x41, 101, 0]);
}

#[test]
fn string_round_trip() {
    let source = constant(ConstKind::Str, r#""a\nb\"c\\d\41e\01""#);
    let decoded = decode_str(&source).unwrap();
    let encoded = encode_str(&decoded);
    assert_eq!(encoded, r#""a\nb\"c\\dAe\01""#);
    let again = decode_str(&constant(ConstKind::Str, &encoded)).unwrap();
    assert_eq!(again, decoded);
}

#[test]
fn wrong_kind_is_internal() {
    let err = decode_int(&constant(ConstKind::Char, "'a'")).unwrap_err();
    assert!(matches!(err, CodegenError::Internal { .. }));
}
