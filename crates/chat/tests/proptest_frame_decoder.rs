//! Property-based tests for the stream frame decoder.
//!
//! Verifies the carry-over buffering invariants:
//! - Split invariance: feeding a byte stream in arbitrary chunks (including
//!   splits mid-line and mid multi-byte character) yields the same
//!   accumulated text as feeding it whole
//! - Frame ordering: deltas come out in input order
//! - Malformed lines never abort decoding

use proptest::prelude::*;

use sitechat_chat::{Frame, FrameDecoder};

// ────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────

/// Delta text including multi-byte characters.
fn arb_delta() -> impl Strategy<Value = String> {
    // Mix of plain ASCII words, accented text, and emoji
    prop_oneof![
        "[a-zA-Z ]{0,12}",
        Just("héllo wörld".to_string()),
        Just("naïve café".to_string()),
        Just("🎉 done 🎈".to_string()),
        Just("日本語テキスト".to_string()),
    ]
}

fn arb_deltas() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_delta(), 0..8)
}

/// Cut points used to slice the byte stream into chunks.
fn arb_cuts() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(any::<usize>(), 0..10)
}

fn encode(deltas: &[String], with_done: bool, with_garbage: bool) -> Vec<u8> {
    let mut out = String::new();
    for (i, delta) in deltas.iter().enumerate() {
        out.push_str(&format!(
            "data: {}\n",
            serde_json::json!({"choices":[{"delta":{"content": delta}}]})
        ));
        if with_garbage && i == deltas.len() / 2 {
            out.push_str("data: {broken json\n");
        }
    }
    if with_done {
        out.push_str("data: [DONE]\n");
    }
    out.into_bytes()
}

/// Feed `bytes` split at the given (normalized) cut points and collect all
/// delta text in order.
fn decode_chunked(bytes: &[u8], cuts: &[usize]) -> (String, bool) {
    let mut points: Vec<usize> = cuts
        .iter()
        .map(|c| if bytes.is_empty() { 0 } else { c % bytes.len() })
        .collect();
    points.push(0);
    points.push(bytes.len());
    points.sort_unstable();
    points.dedup();

    let mut decoder = FrameDecoder::new();
    let mut text = String::new();
    let mut done = false;

    for window in points.windows(2) {
        for frame in decoder.feed(&bytes[window[0]..window[1]]) {
            match frame {
                Frame::Delta(delta) => text.push_str(&delta),
                Frame::Done => done = true,
            }
        }
    }

    (text, done)
}

// ────────────────────────────────────────────────────────────────────
// Properties
// ────────────────────────────────────────────────────────────────────

proptest! {
    /// Arbitrary chunking reconstructs exactly the unsplit result.
    #[test]
    fn prop_reassembly_is_split_invariant(
        deltas in arb_deltas(),
        cuts in arb_cuts(),
        with_done in any::<bool>(),
    ) {
        let bytes = encode(&deltas, with_done, false);

        let (whole, whole_done) = decode_chunked(&bytes, &[]);
        let (chunked, chunked_done) = decode_chunked(&bytes, &cuts);

        prop_assert_eq!(&chunked, &whole);
        prop_assert_eq!(chunked_done, whole_done);

        // And both equal the plain concatenation of the encoded deltas
        let expected: String = deltas.concat();
        prop_assert_eq!(whole, expected);
        prop_assert_eq!(whole_done, with_done);
    }

    /// One malformed line in the middle never disturbs the valid frames
    /// around it, however the bytes are chunked.
    #[test]
    fn prop_malformed_line_is_skipped(
        deltas in arb_deltas(),
        cuts in arb_cuts(),
    ) {
        let bytes = encode(&deltas, true, true);

        let (text, done) = decode_chunked(&bytes, &cuts);

        prop_assert_eq!(text, deltas.concat());
        prop_assert!(done);
    }
}
