//! Document splitting strategies.
//!
//! This module provides the [`DocumentSplitter`] trait and two implementations:
//!
//! - [`TokenWindowSplitter`]: fixed windows of tokens with an exact overlap
//! - [`RecursiveSplitter`]: splits hierarchically by paragraphs, lines, sentences, then words
//!
//! Sizes are measured in tokens produced by a [`Tokenizer`]. Every token is a
//! contiguous byte span of the input, and the spans of a text cover it end to
//! end, so segments are always exact slices of the document.

use std::fmt::Debug;
use std::ops::Range;
use std::sync::Arc;

use crate::document::{Document, Segment};
use crate::error::{RagError, Result};

/// Splits text into contiguous, non-overlapping byte spans.
///
/// The returned spans must be ordered and cover the whole input without gaps.
/// An empty input yields no spans.
pub trait Tokenizer: Debug + Send + Sync {
    /// Return the byte span of every token in `text`.
    fn tokenize(&self, text: &str) -> Vec<Range<usize>>;

    /// Count the tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }
}

/// One token per word; a word owns the whitespace that follows it.
///
/// Whitespace before the first word belongs to the first token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut boundaries = vec![0];
        let mut seen_word = false;
        let mut prev_whitespace = false;
        for (i, c) in text.char_indices() {
            let whitespace = c.is_whitespace();
            if !whitespace && prev_whitespace && seen_word {
                boundaries.push(i);
            }
            seen_word |= !whitespace;
            prev_whitespace = whitespace;
        }
        boundaries.push(text.len());

        boundaries.windows(2).map(|w| w[0]..w[1]).collect()
    }
}

/// One token per `char`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Range<usize>> {
        text.char_indices().map(|(i, c)| i..i + c.len_utf8()).collect()
    }

    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// A strategy for splitting documents into segments.
pub trait DocumentSplitter: Send + Sync {
    /// Split a document into an ordered, non-empty sequence of segments.
    ///
    /// A document that fits in one segment yields exactly one segment holding
    /// the full text. Each segment inherits the parent document's metadata.
    fn split(&self, document: &Document) -> Vec<Segment>;
}

fn validate_sizes(max_segment_size: usize, overlap: usize) -> Result<()> {
    if max_segment_size == 0 {
        return Err(RagError::ConfigError("max_segment_size must be greater than zero".to_string()));
    }
    if overlap >= max_segment_size {
        return Err(RagError::ConfigError(format!(
            "overlap ({overlap}) must be less than max_segment_size ({max_segment_size})"
        )));
    }
    Ok(())
}

fn segments_from_texts(document: &Document, texts: Vec<String>) -> Vec<Segment> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Segment::from_document(document, i, text))
        .collect()
}

/// Splits text into windows of at most `max_segment_size` tokens.
///
/// Consecutive windows share exactly `overlap` tokens. The output is fully
/// determined by the input text and the tokenizer.
///
/// # Example
///
/// ```rust
/// use astra_rag::{Document, DocumentSplitter, TokenWindowSplitter};
///
/// let splitter = TokenWindowSplitter::new(4, 1).unwrap();
/// let segments = splitter.split(&Document::with_id("d", "one two three four five six"));
/// assert_eq!(segments[0].text, "one two three four ");
/// assert_eq!(segments[1].text, "four five six");
/// ```
#[derive(Debug, Clone)]
pub struct TokenWindowSplitter {
    max_segment_size: usize,
    overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl TokenWindowSplitter {
    /// Create a splitter counting [`WordTokenizer`] tokens.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `max_segment_size` is zero or
    /// `overlap >= max_segment_size`.
    pub fn new(max_segment_size: usize, overlap: usize) -> Result<Self> {
        Self::with_tokenizer(max_segment_size, overlap, Arc::new(WordTokenizer))
    }

    /// Create a splitter counting tokens with the given tokenizer.
    ///
    /// # Errors
    ///
    /// Same as [`TokenWindowSplitter::new`].
    pub fn with_tokenizer(
        max_segment_size: usize,
        overlap: usize,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        validate_sizes(max_segment_size, overlap)?;
        Ok(Self { max_segment_size, overlap, tokenizer })
    }

    fn split_text(&self, text: &str) -> Vec<String> {
        let spans = self.tokenizer.tokenize(text);
        if spans.len() <= self.max_segment_size {
            return vec![text.to_string()];
        }

        let step = self.max_segment_size - self.overlap;
        let mut texts = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.max_segment_size).min(spans.len());
            texts.push(text[spans[start].start..spans[end - 1].end].to_string());
            if end == spans.len() {
                break;
            }
            start += step;
        }
        texts
    }
}

impl DocumentSplitter for TokenWindowSplitter {
    fn split(&self, document: &Document) -> Vec<Segment> {
        segments_from_texts(document, self.split_text(&document.text))
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words.
///
/// Text is cut at the coarsest separator that brings every piece under
/// `max_segment_size` tokens; pieces still too large after word splitting
/// are cut into token windows. Pieces are then packed greedily into segments.
/// Each new segment starts with up to `overlap` trailing tokens of the
/// previous one, as long as the size bound still holds.
///
/// # Example
///
/// ```rust,ignore
/// use astra_rag::RecursiveSplitter;
///
/// let splitter = RecursiveSplitter::new(100, 10)?;
/// let segments = splitter.split(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    max_segment_size: usize,
    overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

impl RecursiveSplitter {
    /// Create a splitter counting [`WordTokenizer`] tokens.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `max_segment_size` is zero or
    /// `overlap >= max_segment_size`.
    pub fn new(max_segment_size: usize, overlap: usize) -> Result<Self> {
        Self::with_tokenizer(max_segment_size, overlap, Arc::new(WordTokenizer))
    }

    /// Create a splitter counting tokens with the given tokenizer.
    ///
    /// # Errors
    ///
    /// Same as [`RecursiveSplitter::new`].
    pub fn with_tokenizer(
        max_segment_size: usize,
        overlap: usize,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        validate_sizes(max_segment_size, overlap)?;
        Ok(Self { max_segment_size, overlap, tokenizer })
    }

    fn fits(&self, text: &str) -> bool {
        self.tokenizer.count_tokens(text) <= self.max_segment_size
    }

    /// Break `text` into pieces that each fit in a segment.
    fn split_to_fit(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if self.fits(text) {
            return vec![text.to_string()];
        }

        match separators.split_first() {
            Some((separator, rest)) => split_keeping_separator(text, separator)
                .into_iter()
                .flat_map(|piece| self.split_to_fit(piece, rest))
                .collect(),
            None => {
                let spans = self.tokenizer.tokenize(text);
                spans
                    .chunks(self.max_segment_size)
                    .map(|window| text[window[0].start..window[window.len() - 1].end].to_string())
                    .collect()
            }
        }
    }

    /// The longest tail of `previous` (at most `overlap` tokens) that still
    /// fits in front of `next`.
    fn overlap_tail<'a>(&self, previous: &'a str, next: &str) -> &'a str {
        let spans = self.tokenizer.tokenize(previous);
        let mut take = self.overlap.min(spans.len());
        while take > 0 {
            let tail = &previous[spans[spans.len() - take].start..];
            if self.fits(&format!("{tail}{next}")) {
                return tail;
            }
            take -= 1;
        }
        ""
    }

    fn split_text(&self, text: &str) -> Vec<String> {
        if self.fits(text) {
            return vec![text.to_string()];
        }

        let mut texts = Vec::new();
        let mut current = String::new();
        for piece in self.split_to_fit(text, &SEPARATORS) {
            let candidate = format!("{current}{piece}");
            if current.is_empty() || self.fits(&candidate) {
                current = candidate;
                continue;
            }
            let tail = self.overlap_tail(&current, &piece).to_string();
            texts.push(std::mem::take(&mut current));
            current = format!("{tail}{piece}");
        }
        if !current.is_empty() {
            texts.push(current);
        }
        texts
    }
}

impl DocumentSplitter for RecursiveSplitter {
    fn split(&self, document: &Document) -> Vec<Segment> {
        segments_from_texts(document, self.split_text(&document.text))
    }
}

/// Split text at a separator while keeping the separator attached to the preceding piece.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}
