//! Property tests for fixed-size chunking.

use docqa_rag::{Chunker, FixedSizeChunker};
use proptest::prelude::*;

/// Rebuild the original text by dropping each chunk's overlap prefix.
fn reassemble(chunks: &[docqa_rag::Chunk], overlap: usize) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            text.push_str(&chunk.text);
        } else {
            text.extend(chunk.text.chars().skip(overlap));
        }
    }
    text
}

fn arb_params() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
}

/// *For any* text and parameters with `overlap < chunk_size`, removing the
/// overlap from every chunk after the first and concatenating reproduces the
/// original text exactly.
mod prop_chunk_reconstruction {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_reassemble_to_original(
            text in "\\PC{0,400}",
            (size, overlap) in arb_params(),
        ) {
            let chunks = FixedSizeChunker::new(size, overlap).chunk(&text);
            prop_assert_eq!(reassemble(&chunks, overlap), text);
        }

        #[test]
        fn chunking_is_deterministic(
            text in "\\PC{0,400}",
            (size, overlap) in arb_params(),
        ) {
            let chunker = FixedSizeChunker::new(size, overlap);
            prop_assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
        }

        #[test]
        fn chunks_are_bounded_indexed_and_non_empty(
            text in "\\PC{1,400}",
            (size, overlap) in arb_params(),
        ) {
            let chunks = FixedSizeChunker::new(size, overlap).chunk(&text);
            prop_assert!(!chunks.is_empty());
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert!(!chunk.text.is_empty());
                prop_assert!(chunk.text.chars().count() <= size);
                prop_assert_eq!(chunk.char_offset, i * (size - overlap));
            }
        }

        #[test]
        fn neighbours_share_overlap(
            text in "[a-z ]{0,400}",
            (size, overlap) in arb_params(),
        ) {
            let chunks = FixedSizeChunker::new(size, overlap).chunk(&text);
            for pair in chunks.windows(2) {
                let prev: Vec<char> = pair[0].text.chars().collect();
                let next: Vec<char> = pair[1].text.chars().collect();
                prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
            }
        }
    }
}

#[test]
fn thousand_char_windows_with_two_hundred_overlap() {
    let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let chunks = FixedSizeChunker::new(1000, 200).chunk(&text);
    // Windows start at 0, 800, 1600; the third reaches the end (2500).
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].char_offset, 1600);
    assert_eq!(chunks[2].text.len(), 900);
}
