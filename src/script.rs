//! Script loading and segmentation into chunk-sized text spans.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ChunkcastError, Result};

/// A span of the script with character (not byte) offsets into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub char_start: usize,
    pub char_end: usize,
}

/// Split `text` into chunks of at most `max_words` words.
///
/// Whole sentences are packed together while they fit. A sentence longer
/// than `max_words` is broken into word windows re-joined with single spaces,
/// so those pieces may not appear verbatim in the source.
pub fn split_text_into_chunks(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut current_words = 0;

    for (start, end) in sentence_ranges(text) {
        let sentence = &text[start..end];
        let words: Vec<&str> = sentence.split_whitespace().collect();

        if words.len() > max_words {
            if let Some((s, e)) = current.take() {
                chunks.push(text[s..e].to_string());
                current_words = 0;
            }
            for window in words.chunks(max_words) {
                chunks.push(window.join(" "));
            }
            continue;
        }

        match current {
            Some((s, e)) if current_words + words.len() > max_words => {
                chunks.push(text[s..e].to_string());
                current = Some((start, end));
                current_words = words.len();
            }
            Some((s, _)) => {
                current = Some((s, end));
                current_words += words.len();
            }
            None => {
                current = Some((start, end));
                current_words = words.len();
            }
        }
    }

    if let Some((s, e)) = current {
        chunks.push(text[s..e].to_string());
    }

    chunks
}

/// Byte ranges of trimmed, non-empty sentences in `text`.
fn sentence_ranges(text: &str) -> Vec<(usize, usize)> {
    let boundary =
        Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).expect("Invalid sentence regex");

    let mut ranges = Vec::new();
    let mut last = 0;
    let mut push_trimmed = |start: usize, end: usize| {
        let slice = &text[start..end];
        let leading = slice.len() - slice.trim_start().len();
        let trimmed = slice.trim();
        if !trimmed.is_empty() {
            let s = start + leading;
            ranges.push((s, s + trimmed.len()));
        }
    };

    for m in boundary.find_iter(text) {
        push_trimmed(last, m.end());
        last = m.end();
    }
    push_trimmed(last, text.len());

    ranges
}

/// Segment `script` and recover each span's character offsets.
///
/// Each span is searched for at or after a cursor that advances to the end of
/// the previous span. When it is not found there, the first occurrence
/// anywhere is used; failing that, the cursor itself.
pub fn segment_script(script: &str, max_words: usize) -> Result<Vec<TextSpan>> {
    if max_words == 0 {
        return Err(ChunkcastError::Config(
            "max_words_per_chunk must be greater than 0".to_string(),
        ));
    }

    let mut spans = Vec::new();
    let mut cursor_chars = 0;

    for raw in split_text_into_chunks(script, max_words) {
        let chunk_text = raw.trim();
        if chunk_text.is_empty() {
            continue;
        }

        let cursor_byte = byte_offset(script, cursor_chars);
        let char_start = match script[cursor_byte..].find(chunk_text) {
            Some(pos) => char_offset(script, cursor_byte + pos),
            None => match script.find(chunk_text) {
                Some(pos) => {
                    debug!("Span not found after cursor, using first occurrence: {chunk_text:?}");
                    char_offset(script, pos)
                }
                None => {
                    warn!("Span not found in script, using cursor offset: {chunk_text:?}");
                    cursor_chars
                }
            },
        };
        let char_end = char_start + chunk_text.chars().count();

        spans.push(TextSpan {
            text: chunk_text.to_string(),
            char_start,
            char_end,
        });
        cursor_chars = char_end;
    }

    if spans.is_empty() {
        return Err(ChunkcastError::Config(
            "No chunks produced from script text".to_string(),
        ));
    }

    debug!("Segmented script into {} spans", spans.len());
    Ok(spans)
}

/// Byte index of the `chars`-th character, clamped to the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Resolve the script text.
///
/// A non-blank `override_text` wins; otherwise `path` is read after expanding
/// `{repo}` placeholders against the configured base directory.
pub fn load_script_text(
    config: &Config,
    path: Option<&Path>,
    override_text: Option<&str>,
) -> Result<String> {
    if let Some(text) = override_text {
        if !text.trim().is_empty() {
            return Ok(text.to_string());
        }
    }

    let Some(path) = path else {
        return Err(ChunkcastError::Config(
            "No script text or script path given".to_string(),
        ));
    };

    let expanded = PathBuf::from(config.expand_placeholders(&path.to_string_lossy()));
    if !expanded.is_file() {
        return Err(ChunkcastError::FileNotFound(expanded.display().to_string()));
    }

    Ok(std::fs::read_to_string(&expanded)?)
}
