//! Property-based tests: the buffer against a string-builder oracle.
//!
//! Arbitrary edit scripts are applied to a buffer and to a `String`; the
//! two must agree on content, length, and mark-free reads. A second
//! property folds the mark update rules independently and compares.

use proptest::prelude::*;
use vellum_buffer::{MarkedGapBuffer, RangeSpec, TextOps, TextRange};

#[derive(Clone, Debug)]
enum EditOp {
    Insert { pos_pct: f64, content: Vec<char> },
    Delete { pos_pct: f64, len_pct: f64 },
}

fn arbitrary_edit_op() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (0.0..=1.0f64, prop::collection::vec(prop::char::range('a', 'z'), 1..10))
            .prop_map(|(pos_pct, content)| EditOp::Insert { pos_pct, content }),
        (0.0..=1.0f64, 0.0..=0.5f64)
            .prop_map(|(pos_pct, len_pct)| EditOp::Delete { pos_pct, len_pct }),
    ]
}

/// Applies `op` to the buffer, returning the concrete (start, end, insert)
/// triple so the caller can mirror it elsewhere.
fn apply_edit(
    buf: &mut MarkedGapBuffer<u8>,
    op: &EditOp,
) -> (usize, usize, Vec<char>) {
    let len = buf.len();
    let (start, end, content) = match op {
        EditOp::Insert { pos_pct, content } => {
            let at = ((pos_pct * len as f64) as usize).min(len);
            (at, at, content.clone())
        }
        EditOp::Delete { pos_pct, len_pct } => {
            let start = ((pos_pct * len as f64) as usize).min(len);
            let max_len = len - start;
            let del = ((len_pct * max_len as f64) as usize).min(max_len);
            (start, start + del, Vec::new())
        }
    };
    let n = content.len();
    buf.replace(
        RangeSpec::from((start, end)),
        &content,
        TextRange::new(0, n),
        None,
    )
    .unwrap();
    (start, end, content)
}

fn mirror_on_string(reference: &mut String, start: usize, end: usize, content: &[char]) {
    let head: String = reference.chars().take(start).collect();
    let tail: String = reference.chars().skip(end).collect();
    let middle: String = content.iter().collect();
    *reference = head + &middle + &tail;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Content always equals the string-builder oracle.
    #[test]
    fn contents_match_oracle(ops in prop::collection::vec(arbitrary_edit_op(), 1..40)) {
        let mut buf: MarkedGapBuffer<u8> = MarkedGapBuffer::new();
        let mut reference = String::new();

        for op in &ops {
            let (start, end, content) = apply_edit(&mut buf, op);
            mirror_on_string(&mut reference, start, end, &content);
            prop_assert_eq!(buf.contents(), reference.clone());
            prop_assert_eq!(buf.len(), reference.chars().count());
        }
    }

    /// Every get(i) agrees with the full get_chars readback.
    #[test]
    fn point_reads_match_bulk_reads(ops in prop::collection::vec(arbitrary_edit_op(), 1..30)) {
        let mut buf: MarkedGapBuffer<u8> = MarkedGapBuffer::new();
        for op in &ops {
            apply_edit(&mut buf, op);
        }
        let len = buf.len();
        let mut dest = vec!['\0'; len];
        buf.get_chars(0, len, &mut dest, 0, None).unwrap();
        for (i, expected) in dest.iter().enumerate() {
            prop_assert_eq!(buf.get(i, None).unwrap(), *expected);
        }
    }

    /// The tracked range of a mark equals the update rules folded by hand.
    #[test]
    fn mark_tracking_matches_folded_rules(
        mark_start_pct in 0.0..=1.0f64,
        mark_len_pct in 0.0..=1.0f64,
        ops in prop::collection::vec(arbitrary_edit_op(), 1..30),
    ) {
        let mut buf: MarkedGapBuffer<u8> = MarkedGapBuffer::from_str("the initial buffer contents");
        let len = buf.len();
        let ms = ((mark_start_pct * len as f64) as usize).min(len);
        let me = (ms + (mark_len_pct * (len - ms) as f64) as usize).min(len);
        buf.mark_range(RangeSpec::from((ms, me)), 0u8, None).unwrap();

        let mut expected = TextRange::new(ms, me);
        for op in &ops {
            let (s, e, content) = apply_edit(&mut buf, op);
            let k = content.len();
            let delta = k as isize - (e - s) as isize;
            let (ms, me) = (expected.start, expected.end);
            expected = if me <= s {
                expected
            } else if ms >= e {
                TextRange::new((ms as isize + delta) as usize, (me as isize + delta) as usize)
            } else if s <= ms && me <= e {
                TextRange::empty_at(s)
            } else if ms < s && me <= e {
                TextRange::new(ms, s)
            } else if ms >= s && me > e {
                TextRange::new(s + k, (me as isize + delta) as usize)
            } else {
                TextRange::new(ms, (me as isize + delta) as usize)
            };
            prop_assert_eq!(buf.range_for_mark(&0u8, None).unwrap(), expected);
        }
    }
}
