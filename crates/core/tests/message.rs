use magic_core::message::{render, render_with, RenderOptions, DEFAULT_MAX_STRING_LEN};

fn with_int(value: i32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

#[test]
fn percent_s_reads_a_nul_terminated_string() {
    let stream = b"1.2.3\0trailing".to_vec();
    assert_eq!(render(&stream, 0, "version %s"), "version 1.2.3");
}

#[test]
fn percent_d_reads_a_signed_32_bit_value() {
    assert_eq!(render(&with_int(-1), 0, "mode %d"), "mode -1");
    assert_eq!(render(&with_int(42), 0, "%i items"), "42 items");
}

#[test]
fn unsigned_and_hex_conversions() {
    let stream = with_int(-1);
    assert_eq!(render(&stream, 0, "%u"), "4294967295");
    assert_eq!(render(&with_int(255), 0, "%x"), "ff");
    assert_eq!(render(&with_int(255), 0, "%#x"), "0xff");
    assert_eq!(render(&with_int(0x0301), 0, "dev %#X"), "dev 0X301");
}

#[test]
fn flags_and_width_pad_the_value() {
    assert_eq!(render(&with_int(7), 0, "[%5d]"), "[    7]");
    assert_eq!(render(&with_int(7), 0, "[%-5d]"), "[7    ]");
    assert_eq!(render(&with_int(7), 0, "[%05d]"), "[00007]");
    assert_eq!(render(&with_int(-7), 0, "[%05d]"), "[-0007]");
    assert_eq!(render(&with_int(7), 0, "[%+d]"), "[+7]");
    assert_eq!(render(b"ab\0".as_slice(), 0, "[%4s]"), "[  ab]");
}

#[test]
fn literal_percent_and_unknown_conversions_pass_through() {
    let stream = Vec::new();
    assert_eq!(render(&stream, 0, "100%%"), "100%");
    assert_eq!(render(&stream, 0, "%q stays"), "%q stays");
    assert_eq!(render(&stream, 0, "trailing %"), "trailing %");
}

#[test]
fn conversions_advance_through_the_stream() {
    let mut stream = b"ab\0".to_vec();
    stream.extend(7i32.to_le_bytes());
    stream.extend(9i32.to_le_bytes());
    assert_eq!(render(&stream, 0, "%s %d %d"), "ab 7 9");
}

#[test]
fn short_reads_substitute_nothing() {
    let stream = vec![1u8, 2];
    assert_eq!(render(&stream, 0, "mode %d."), "mode .");
    assert_eq!(render(&stream, 10, "name %s."), "name .");
}

#[test]
fn anchor_selects_where_reading_starts() {
    let stream = b"skip\0keep\0".to_vec();
    assert_eq!(render(&stream, 5, "%s"), "keep");
}

#[test]
fn string_reads_are_capped() {
    let stream = vec![b'a'; 64];
    let options = RenderOptions { max_string_len: 8 };
    assert_eq!(render_with(&stream, 0, "%s", None, &options), "aaaaaaaa");
}

#[test]
fn supplied_text_replaces_string_reads() {
    let stream = b"ignored\0".to_vec();
    let text = render_with(&stream, 0, "at %s", Some("noon"), &RenderOptions::default());
    assert_eq!(text, "at noon");
}

#[test]
fn oversized_width_is_capped() {
    let rendered = render(&with_int(1), 0, "%99999999999999999999d");
    assert_eq!(rendered.len(), DEFAULT_MAX_STRING_LEN);
    assert!(rendered.ends_with(" 1"));

    let options = RenderOptions { max_string_len: 4 };
    assert_eq!(render_with(&with_int(7), 0, "[%0100d]", None, &options), "[0007]");
}
