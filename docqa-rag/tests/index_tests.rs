//! Vector index search ordering and build behaviour.

use docqa_core::{Credentials, FailureKind, ServiceError};
use docqa_rag::{
    Chunk, Chunker, FixedSizeChunker, KeywordEmbeddingProvider, RagError, VectorIndex,
};
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn index_from(embeddings: Vec<Vec<f32>>) -> VectorIndex {
    let pairs = embeddings
        .into_iter()
        .enumerate()
        .map(|(index, e)| (Chunk { index, text: format!("chunk {index}"), char_offset: 0 }, e))
        .collect();
    VectorIndex::from_entries(pairs).unwrap()
}

/// *For any* set of stored embeddings, searching SHALL return at most `k`
/// results in non-increasing score order, and a stored embedding identical to
/// the query SHALL rank first.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let count = embeddings.len();
            let index = index_from(embeddings);
            let results = index.search(&query, k);

            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(count));
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn identical_embedding_ranks_first(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            pick in any::<prop::sample::Index>(),
        ) {
            let target = pick.index(embeddings.len());
            let query = embeddings[target].clone();
            let index = index_from(embeddings);

            let results = index.search(&query, 1);
            prop_assert!((results[0].score - 1.0).abs() < 1e-4);
            // A different chunk may also score ~1.0 only if it precedes the target.
            prop_assert!(results[0].chunk.index <= target);
        }
    }
}

#[tokio::test]
async fn build_embeds_every_chunk_in_batches() {
    let provider = KeywordEmbeddingProvider::default();
    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa ".repeat(20);
    let chunks = FixedSizeChunker::new(50, 10).chunk(&text);
    let expected = chunks.len();

    let index = VectorIndex::build(chunks, &provider, &Credentials::new("k"), 4).await.unwrap();

    assert_eq!(index.len(), expected);
    assert_eq!(provider.calls(), expected);
    assert_eq!(index.dimensions(), 256);
}

#[tokio::test]
async fn build_failure_surfaces_the_service_error() {
    let provider =
        KeywordEmbeddingProvider::failing(ServiceError::auth("keyword", "invalid api key"));
    let chunks = FixedSizeChunker::new(20, 5).chunk("some text that spans a few chunks");

    let err = VectorIndex::build(chunks, &provider, &Credentials::new("bad"), 8).await.unwrap_err();

    match err {
        RagError::Embedding(e) => assert_eq!(e.kind, FailureKind::Auth),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn query_finds_the_matching_chunk() {
    let provider = KeywordEmbeddingProvider::default();
    let chunks = vec![
        Chunk { index: 0, text: "The Louvre museum is in Paris.".into(), char_offset: 0 },
        Chunk { index: 1, text: "Berlin is the capital of Germany.".into(), char_offset: 31 },
    ];
    let creds = Credentials::new("k");
    let index = VectorIndex::build(chunks, &provider, &creds, 64).await.unwrap();

    let results = index.query("Where is the Louvre museum?", 2, &provider, &creds).await.unwrap();

    assert_eq!(results[0].chunk.index, 0);
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn query_with_zero_k_does_not_embed() {
    let provider = KeywordEmbeddingProvider::default();
    let index = index_from(vec![vec![1.0, 0.0]]);
    let results = index.query("anything", 0, &provider, &Credentials::new("k")).await.unwrap();
    assert!(results.is_empty());
    assert_eq!(provider.calls(), 0);
}
