//! Integration tests for realistic editing sequences.
//!
//! These exercise the public replace surface the way an editor would:
//! single-character typing, bulk replacement, appends, and whole-content
//! rewrites, checking content and length after every step.

use vellum_buffer::{MarkedGapBuffer, RangeSpec, ReplayingGapBuffer, TextOps, TextRange};

type Buf = MarkedGapBuffer<u32>;

fn replace_str(buf: &mut Buf, range: impl Into<RangeSpec>, text: &str) {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    buf.replace(range.into(), &chars, TextRange::new(0, n), None)
        .unwrap();
}

#[test]
fn test_single_char_into_empty_buffer() {
    let mut buf = Buf::new();
    buf.replace(RangeSpec::from((0, 0)), &'a', TextRange::new(0, 1), None)
        .unwrap();
    assert_eq!(buf.contents(), "a");
    assert_eq!(buf.len(), 1);
}

#[test]
fn test_replace_interior_range() {
    let mut buf = Buf::from_str("foobar");
    replace_str(&mut buf, (1, 5), "baz");
    assert_eq!(buf.contents(), "fbazr");
}

#[test]
fn test_insert_at_interior_point() {
    let mut buf = Buf::from_str("foobar");
    replace_str(&mut buf, (3, 3), "baz");
    assert_eq!(buf.contents(), "foobazbar");
}

#[test]
fn test_insert_at_end_is_append() {
    let mut buf = Buf::from_str("foobar");
    replace_str(&mut buf, (6, 6), "baz");
    assert_eq!(buf.contents(), "foobarbaz");
}

#[test]
fn test_append_alphabet_one_char_at_a_time() {
    let mut buf = Buf::new();
    for ch in 'a'..='z' {
        let end = buf.len();
        buf.replace(RangeSpec::from((end, end)), &ch, TextRange::new(0, 1), None)
            .unwrap();
    }
    assert_eq!(buf.contents(), "abcdefghijklmnopqrstuvwxyz");
    assert_eq!(buf.len(), 26);
}

#[test]
fn test_empty_buffer_insert_forms_are_equivalent() {
    // Unspecified, the zero range, and an explicit (0, 0) all describe the
    // same insertion point on an empty buffer.
    let mut via_unspecified = Buf::new();
    replace_str(&mut via_unspecified, RangeSpec::Unspecified, "x");

    let mut via_zero = Buf::new();
    replace_str(&mut via_zero, TextRange::ZERO, "x");

    let mut via_explicit = Buf::new();
    replace_str(&mut via_explicit, (0, 0), "x");

    assert_eq!(via_unspecified.contents(), "x");
    assert_eq!(via_zero.contents(), "x");
    assert_eq!(via_explicit.contents(), "x");
}

#[test]
fn test_replace_then_read_back_exact_range() {
    let mut buf = Buf::from_str("foobar");
    replace_str(&mut buf, (1, 5), "baz");
    // The replacement occupies [1, 1 + 3).
    let mut dest = ['\0'; 3];
    buf.get_chars(1, 4, &mut dest, 0, None).unwrap();
    assert_eq!(dest.iter().collect::<String>(), "baz");
}

#[test]
fn test_delete_then_insert_equals_replace() {
    let mut two_step = Buf::from_str("foobar");
    replace_str(&mut two_step, (1, 5), "");
    replace_str(&mut two_step, (1, 1), "baz");

    let mut one_step = Buf::from_str("foobar");
    replace_str(&mut one_step, (1, 5), "baz");

    assert_eq!(two_step.contents(), one_step.contents());
}

#[test]
fn test_get_matches_get_chars() {
    let mut buf = Buf::from_str("hello world");
    replace_str(&mut buf, (5, 6), "_");
    let len = buf.len();

    let mut dest = vec!['\0'; len];
    buf.get_chars(0, len, &mut dest, 0, None).unwrap();
    for (i, expected) in dest.iter().enumerate() {
        assert_eq!(buf.get(i, None).unwrap(), *expected);
    }
}

#[test]
fn test_length_counts_every_reachable_char() {
    let mut buf = Buf::from_str("abc");
    replace_str(&mut buf, (1, 2), "XYZ");
    let mut count = 0;
    while buf.get(count, None).is_ok() {
        count += 1;
    }
    assert_eq!(count, buf.len());
}

#[test]
fn test_whole_content_rewrite_via_unspecified() {
    let mut buf = Buf::from_str("the quick brown fox");
    replace_str(&mut buf, RangeSpec::Unspecified, "gone");
    assert_eq!(buf.contents(), "gone");
    replace_str(&mut buf, RangeSpec::Unspecified, "");
    assert!(buf.is_empty());
}

#[test]
fn test_interleaved_edits_at_both_ends() {
    let mut buf = Buf::new();
    for i in 0..50 {
        let end = buf.len();
        replace_str(&mut buf, (end, end), "t");
        replace_str(&mut buf, (0, 0), "h");
        assert_eq!(buf.len(), (i + 1) * 2);
    }
    let contents = buf.contents();
    assert!(contents.starts_with("hhhh"));
    assert!(contents.ends_with("tttt"));
}

#[test]
fn test_replaying_buffer_matches_marked_buffer() {
    let mut marked = Buf::from_str("foobar");
    let mut replaying: ReplayingGapBuffer<u32> = ReplayingGapBuffer::from_str("foobar");

    let edits: &[((usize, usize), &str)] = &[
        ((1, 5), "baz"),
        ((0, 1), "F"),
        ((4, 4), "!!"),
        ((2, 6), ""),
    ];
    for ((s, e), text) in edits {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        marked
            .replace(RangeSpec::from((*s, *e)), &chars, TextRange::new(0, n), None)
            .unwrap();
        replaying
            .replace(RangeSpec::from((*s, *e)), &chars, TextRange::new(0, n), None)
            .unwrap();
        assert_eq!(marked.contents(), replaying.contents());
    }
}

#[test]
fn test_failed_replace_leaves_content_intact() {
    let mut buf = Buf::from_str("foobar");
    let chars: Vec<char> = "xyz".chars().collect();
    assert!(buf
        .replace(RangeSpec::from((4, 99)), &chars, TextRange::new(0, 3), None)
        .is_err());
    assert!(buf
        .replace(RangeSpec::from((0, 1)), &chars, TextRange::new(2, 9), None)
        .is_err());
    assert_eq!(buf.contents(), "foobar");
}
