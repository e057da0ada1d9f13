//! Property tests for document splitting.

use astra_rag::{
    Document, DocumentSplitter, RecursiveSplitter, SEGMENT_INDEX_KEY, TokenWindowSplitter,
    Tokenizer, WordTokenizer,
};
use proptest::prelude::*;

/// Text of `n` lowercase words separated by single spaces.
fn arb_words(min: usize, max: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,8}", min..max).prop_map(|words| words.join(" "))
}

/// Sizes with `overlap < max_segment_size`.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..20).prop_flat_map(|max| (Just(max), 0..max))
}

fn tokens(text: &str) -> Vec<&str> {
    WordTokenizer.tokenize(text).into_iter().map(|span| &text[span]).collect()
}

/// A document no longer than the segment size is returned whole as one segment.
mod prop_short_documents_stay_whole {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn single_segment_equals_text(text in arb_words(0, 10), extra in 0usize..5) {
            let max = WordTokenizer.count_tokens(&text).max(1) + extra;
            let document = Document::with_id("d", text.clone());

            for splitter in [
                Box::new(TokenWindowSplitter::new(max, 0).unwrap()) as Box<dyn DocumentSplitter>,
                Box::new(RecursiveSplitter::new(max, 0).unwrap()),
            ] {
                let segments = splitter.split(&document);
                prop_assert_eq!(segments.len(), 1);
                prop_assert_eq!(&segments[0].text, &text);
                prop_assert_eq!(segments[0].index, 0);
            }
        }
    }
}

/// Token windows never exceed the segment size and consecutive windows share
/// exactly `overlap` tokens.
mod prop_token_windows {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn windows_are_bounded_and_overlap_exactly(
            text in arb_words(1, 120),
            (max, overlap) in arb_sizes(),
        ) {
            let splitter = TokenWindowSplitter::new(max, overlap).unwrap();
            let segments = splitter.split(&Document::with_id("d", text.clone()));

            prop_assert!(!segments.is_empty());
            prop_assert!(text.starts_with(&segments[0].text));
            prop_assert!(text.ends_with(&segments[segments.len() - 1].text));

            for (i, segment) in segments.iter().enumerate() {
                prop_assert!(WordTokenizer.count_tokens(&segment.text) <= max);
                prop_assert_eq!(segment.index, i);
                let index = i.to_string();
                prop_assert_eq!(segment.metadata.get(SEGMENT_INDEX_KEY), Some(&index));
            }

            for pair in segments.windows(2) {
                let previous = tokens(&pair[0].text);
                let next = tokens(&pair[1].text);
                prop_assert_eq!(&previous[previous.len() - overlap..], &next[..overlap]);
            }
        }

        #[test]
        fn splitting_is_deterministic(text in arb_words(1, 80), (max, overlap) in arb_sizes()) {
            let splitter = TokenWindowSplitter::new(max, overlap).unwrap();
            let document = Document::with_id("d", text);
            prop_assert_eq!(splitter.split(&document), splitter.split(&document));
        }
    }
}

/// Recursive segments never exceed the segment size and are slices of the text.
mod prop_recursive_segments {
    use super::*;

    fn arb_paragraphs() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            proptest::collection::vec(arb_words(1, 12), 1..4).prop_map(|s| s.join(". ")),
            1..5,
        )
        .prop_map(|p| p.join("\n\n"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn segments_fit_and_cover_the_text(
            text in arb_paragraphs(),
            (max, overlap) in arb_sizes(),
        ) {
            let splitter = RecursiveSplitter::new(max, overlap).unwrap();
            let segments = splitter.split(&Document::with_id("d", text.clone()));

            prop_assert!(!segments.is_empty());
            prop_assert!(text.starts_with(&segments[0].text));
            prop_assert!(text.ends_with(&segments[segments.len() - 1].text));
            for segment in &segments {
                prop_assert!(WordTokenizer.count_tokens(&segment.text) <= max);
                prop_assert!(text.contains(&segment.text));
            }
        }
    }
}

#[test]
fn segments_inherit_document_metadata() {
    let document = Document::with_id("doc-7", "alpha beta gamma delta")
        .with_metadata("file_name", "greek.txt");
    let segments = TokenWindowSplitter::new(2, 0).unwrap().split(&document);

    assert_eq!(segments.len(), 2);
    for segment in &segments {
        assert_eq!(segment.document_id, "doc-7");
        assert_eq!(segment.metadata["file_name"], "greek.txt");
        assert_eq!(segment.metadata["document_id"], "doc-7");
    }
}

#[test]
fn empty_text_yields_one_empty_segment() {
    let segments = TokenWindowSplitter::new(10, 2).unwrap().split(&Document::with_id("d", ""));
    assert_eq!(segments.len(), 1);
    assert!(segments[0].text.is_empty());
}

#[test]
fn recursive_splitter_prefers_paragraph_boundaries() {
    let text = "one two three\n\nfour five six";
    let segments = RecursiveSplitter::new(4, 0).unwrap().split(&Document::with_id("d", text));
    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["one two three\n\n", "four five six"]);
}
