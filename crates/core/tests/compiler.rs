use magic_core::compiler::{
    compile_file, compile_str, parse_int, parse_offset, parse_rule_line, parse_type, BaseType,
    CompileError, ParseFailure,
};
use magic_core::endian::ByteOrder;
use magic_core::rules::kernel::KERNEL_MAGIC;
use magic_core::rules::{MagicDatabase, RuleGroup};
use magic_core::tester::{
    Directive, Number, OffsetResolver, Operator, PointerWidth, TestKind,
};

#[test]
fn integer_literals_detect_their_base() {
    assert_eq!(parse_int("16", 32), Ok(16));
    assert_eq!(parse_int("0x10", 32), Ok(16));
    assert_eq!(parse_int("0X1f", 32), Ok(31));
    assert_eq!(parse_int("010", 32), Ok(8));
    assert_eq!(parse_int("0o17", 32), Ok(15));
    assert_eq!(parse_int("0b101", 8), Ok(5));
    assert_eq!(parse_int("-1", 8), Ok(-1));
    assert_eq!(parse_int("1_000", 16), Ok(1000));
    assert_eq!(parse_int("0", 8), Ok(0));
}

#[test]
fn integer_literals_accept_signed_or_unsigned_range() {
    assert_eq!(parse_int("0xAA55", 16), Ok(0xAA55));
    assert_eq!(parse_int("-32768", 16), Ok(-32768));
    assert!(parse_int("0x10000", 16).is_err());
    assert!(parse_int("-129", 8).is_err());
    assert!(parse_int("0xZZ", 32).is_err());
    assert!(parse_int("", 32).is_err());
    assert!(parse_int("09", 32).is_err());
}

#[test]
fn offsets_parse_plain_and_indirect_forms() {
    assert_eq!(parse_offset("514"), Ok(OffsetResolver::Constant(514)));
    assert_eq!(parse_offset("0x3c"), Ok(OffsetResolver::Constant(0x3c)));
    assert_eq!(
        parse_offset("(60)"),
        Ok(OffsetResolver::indirect(60, PointerWidth::Long, ByteOrder::Little))
    );
    assert_eq!(
        parse_offset("(526.s+0x200)"),
        Ok(OffsetResolver::chained([
            OffsetResolver::indirect(526, PointerWidth::Short, ByteOrder::Little),
            OffsetResolver::Constant(0x200),
        ]))
    );
    assert_eq!(
        parse_offset("(0x3c.L-4)"),
        Ok(OffsetResolver::chained([
            OffsetResolver::indirect(0x3c, PointerWidth::Long, ByteOrder::Big),
            OffsetResolver::Delta(-4),
        ]))
    );
    assert!(parse_offset("(60").is_err());
    assert!(parse_offset("(60.z)").is_err());
    assert!(parse_offset("-4").is_err());
}

#[test]
fn type_tokens_decode_sign_order_and_extender() {
    let spec = parse_type("ubeshort").expect("known type");
    assert_eq!(spec.base, BaseType::Short);
    assert!(spec.unsigned);
    assert_eq!(spec.order, ByteOrder::Big);

    let spec = parse_type("melong").expect("known type");
    assert_eq!((spec.base, spec.unsigned, spec.order), (BaseType::Long, false, ByteOrder::Middle));

    let spec = parse_type("regex/80c").expect("known type");
    assert_eq!(spec.base, BaseType::Regex);
    assert_eq!(spec.extender, "80c");

    assert_eq!(parse_type("use").map(|s| s.base), Some(BaseType::Directive(Directive::Use)));
    assert_eq!(parse_type("beid3").map(|s| s.base), Some(BaseType::Directive(Directive::Id3)));
    assert_eq!(parse_type("leqwdate").map(|s| s.base), Some(BaseType::QWDate));

    assert!(parse_type("ustring").is_none());
    assert!(parse_type("bestring").is_none());
    assert!(parse_type("lenumber").is_none());
}

#[test]
fn rule_line_splits_relation_and_message() {
    let (depth, rule) = parse_rule_line(">>8\tubyte\t>=5\tversion %d or later")
        .expect("parse")
        .expect("rule");
    assert_eq!(depth, 2);
    assert_eq!(rule.message, "version %d or later");
    assert_eq!(rule.test.offset(), &OffsetResolver::Constant(8));
    match rule.test.kind() {
        TestKind::Number { expected, op, .. } => {
            assert_eq!(*expected, Number::U8(5));
            assert_eq!(*op, Operator::GreaterOrEqual);
        }
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn relation_symbols_map_to_operators() {
    let cases = [
        ("0 byte 1", Operator::Equal),
        ("0 byte =1", Operator::Equal),
        ("0 byte !1", Operator::NotEqual),
        ("0 byte <1", Operator::LessThan),
        ("0 byte <=1", Operator::LessOrEqual),
        ("0 byte >1", Operator::GreaterThan),
        ("0 byte x", Operator::Any),
    ];
    for (line, expected) in cases {
        let (_, rule) = parse_rule_line(line).expect("parse").expect("rule");
        match rule.test.kind() {
            TestKind::Number { op, .. } => assert_eq!(*op, expected, "{line}"),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}

#[test]
fn regex_extenders_in_any_order_compile_the_same() {
    let (_, a) = parse_rule_line("0 regex/80c ^magic").expect("parse").expect("rule");
    let (_, b) = parse_rule_line("0 regex/c80 ^magic").expect("parse").expect("rule");
    match (a.test.kind(), b.test.kind()) {
        (TestKind::Regex(a), TestKind::Regex(b)) => {
            assert_eq!(a.extender(), b.extender());
            assert_eq!(a.pattern(), "^magic");
        }
        other => panic!("unexpected kinds {other:?}"),
    }
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    assert!(parse_rule_line("").expect("parse").is_none());
    assert!(parse_rule_line("   ").expect("parse").is_none());
    assert!(parse_rule_line("# 0 byte 1 nope").expect("parse").is_none());

    let rules = compile_str("# header\n\n0 byte 1 one\n\n# trailer\n").expect("compile");
    assert_eq!(rules.len(), 1);
}

#[test]
fn unknown_type_names_keyword_and_line() {
    let err = compile_str("0 byte 1 ok\n0 lenumber 5 foo\n").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("lenumber"), "missing keyword: {text}");
    assert!(text.contains("0 lenumber 5 foo"), "missing line: {text}");
    assert!(text.contains("line 2"), "missing line number: {text}");
    match err {
        CompileError::Parse { line_number, reason: ParseFailure::UnknownType(keyword), .. } => {
            assert_eq!(line_number, 2);
            assert_eq!(keyword, "lenumber");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_lines_are_rejected() {
    let cases: [(&str, fn(&ParseFailure) -> bool); 8] = [
        ("0xZZ byte 1", |f| matches!(f, ParseFailure::InvalidOffset { .. })),
        ("0", |f| matches!(f, ParseFailure::MissingType)),
        ("0 byte", |f| matches!(f, ParseFailure::MissingValue)),
        ("0 byte >", |f| matches!(f, ParseFailure::EmptyValue(_))),
        ("0 byte 300", |f| matches!(f, ParseFailure::InvalidValue { .. })),
        ("0 float abc", |f| matches!(f, ParseFailure::InvalidValue { .. })),
        ("0 default 1 fallback", |f| matches!(f, ParseFailure::InvalidValue { .. })),
        ("0 string >abc", |f| matches!(f, ParseFailure::Test(_))),
    ];
    for (line, check) in cases {
        let failure = parse_rule_line(line).unwrap_err();
        assert!(check(&failure), "{line}: unexpected failure {failure:?}");
    }
}

#[test]
fn invalid_patterns_and_operators_fail_at_compile_time() {
    let err = compile_str("0 regex (unclosed").unwrap_err();
    assert!(err.to_string().contains("invalid regex"), "unexpected error: {err}");

    let err = compile_str("0 regex/9z abc").unwrap_err();
    assert!(err.to_string().contains("extender"), "unexpected error: {err}");

    let err = compile_str("0 guid >00010203-0405-0607-0809-0A0B0C0D0E0F").unwrap_err();
    assert!(err.to_string().contains("not valid for guid"), "unexpected error: {err}");
}

#[test]
fn failed_compile_returns_no_rules() {
    let result = compile_str("0 byte 1 one\n>1 byte 2 two\n0 bogus 1 three\n");
    assert!(result.is_err());
}

#[test]
fn nesting_attaches_children_to_nearest_parent() {
    let source = "\
0 byte 1 a
>1 byte 2 b
>>2 byte 3 c
>1 byte 4 d
0 byte 5 e
>1 byte 6 f
";
    let rules = compile_str(source).expect("compile");
    assert_eq!(rules.len(), 2);
    let a = &rules[0];
    assert_eq!(a.message, "a");
    assert_eq!(a.children.iter().map(|r| r.message.as_str()).collect::<Vec<_>>(), ["b", "d"]);
    assert_eq!(a.children[0].children[0].message, "c");
    assert_eq!(rules[1].children[0].message, "f");
    assert_eq!(a.subtree_size(), 4);
}

#[test]
fn skipping_a_level_is_an_orphan() {
    let err = compile_str("0 byte 1 a\n>>1 byte 2 b\n").unwrap_err();
    match err {
        CompileError::Parse { reason: ParseFailure::OrphanChild { depth }, .. } => {
            assert_eq!(depth, 2)
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(compile_str(">0 byte 1 a\n").is_err());
}

#[test]
fn directives_compile_but_are_not_evaluated() {
    let source = "\
0 pstring x pascal
0 indirect x
0 name my-type
0 use my-type
0 search/256 x
0 der x
0 beid3 x
0 clear x
0 offset x
";
    let rules = compile_str(source).expect("compile");
    assert_eq!(rules.len(), 9);
    assert!(rules.iter().all(|r| !r.test.is_supported()));
}

#[test]
fn kernel_rules_compile_into_one_tree() {
    let rules = compile_str(KERNEL_MAGIC).expect("compile");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].subtree_size(), 17);
    assert_eq!(rules[0].children[0].children.len(), 11);
}

#[test]
fn missing_magic_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = compile_file(dir.path().join("absent.magic")).unwrap_err();
    assert!(matches!(err, CompileError::Io(_)), "unexpected error {err:?}");
}

#[test]
fn regex_values_keep_relation_characters() {
    let rules = compile_str("0 regex <html HTML document\n").expect("compile");
    let db = MagicDatabase::new(vec![RuleGroup::new("t", rules)]);
    assert_eq!(db.describe(&b"xx <html yy".to_vec()).expect("probe"), "HTML document");
    assert_eq!(db.describe(&b"xx html yy".to_vec()).expect("probe"), "data");

    let rules = compile_str("0 regex !foo bang-foo\n").expect("compile");
    let db = MagicDatabase::new(vec![RuleGroup::new("t", rules)]);
    assert_eq!(db.describe(&b"foo".to_vec()).expect("probe"), "data");
    assert_eq!(db.describe(&b"a !foo".to_vec()).expect("probe"), "bang-foo");

    let (_, rule) = parse_rule_line("0 regex !foo").expect("parse").expect("rule");
    match rule.test.kind() {
        TestKind::Regex(regex) => assert_eq!(regex.pattern(), "!foo"),
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn string_any_renders_the_string_at_its_offset() {
    let rules = compile_str("0 string HdrS hdr\n>4 string x %s\n").expect("compile");
    let db = MagicDatabase::new(vec![RuleGroup::new("t", rules)]);
    assert_eq!(db.describe(&b"HdrSv2.1\0".to_vec()).expect("probe"), "hdr v2.1");
}
