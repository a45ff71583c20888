use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Result, DubError};
use super::{TranslationBackend, Translator};

/// Split text after `.`, `!` or `?` when followed by whitespace
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next_idx, next)) = chars.peek() {
                if next.is_whitespace() {
                    sentences.push(&text[start..next_idx]);
                    start = next_idx;
                }
            } else {
                sentences.push(&text[start..idx + c.len_utf8()]);
                start = text.len();
            }
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Break a sentence longer than `max_chars` at whitespace; words longer than
/// the limit are cut by character count
fn split_oversized(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        let word_chars: Vec<char> = word.chars().collect();
        for part in word_chars.chunks(max_chars) {
            let part: String = part.iter().collect();
            let current_len = current.chars().count();
            if current.is_empty() {
                current = part;
            } else if current_len + 1 + part.chars().count() <= max_chars {
                current.push(' ');
                current.push_str(&part);
            } else {
                pieces.push(std::mem::take(&mut current));
                current = part;
            }
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Group sentences into chunks of at most `max_chars` characters
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let pieces = if sentence.chars().count() > max_chars {
            split_oversized(sentence, max_chars)
        } else {
            vec![sentence.to_string()]
        };

        for piece in pieces {
            let piece_len = piece.chars().count();
            if current.is_empty() {
                current = piece;
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= max_chars {
                current.push(' ');
                current.push_str(&piece);
                current_len += 1 + piece_len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current = piece;
                current_len = piece_len;
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Translator that keeps every request under the backend's size limit.
///
/// Long texts are split at sentence boundaries; a chunk that fails is kept in
/// the source language so the rest of the text still gets translated.
pub struct ChunkedTranslator {
    backend: Box<dyn TranslationBackend>,
    chunk_threshold: usize,
}

impl ChunkedTranslator {
    pub fn new(backend: Box<dyn TranslationBackend>, chunk_threshold: usize) -> Self {
        Self { backend, chunk_threshold }
    }
}

#[async_trait]
impl Translator for ChunkedTranslator {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(String::new());
        }

        info!("Translating {} characters to {}", text.chars().count(), target_language);

        if text.chars().count() <= self.chunk_threshold {
            return self.backend.translate_chunk(text, target_language).await;
        }

        let chunks = chunk_text(text, self.chunk_threshold);
        let total = chunks.len();
        let mut translated = Vec::with_capacity(total);
        let mut failures = 0;

        for (idx, chunk) in chunks.into_iter().enumerate() {
            info!("Translating chunk {}/{}", idx + 1, total);
            match self.backend.translate_chunk(&chunk, target_language).await {
                Ok(result) => translated.push(result),
                Err(e) => {
                    warn!("Chunk {}/{} failed, keeping source text: {}", idx + 1, total, e);
                    failures += 1;
                    translated.push(chunk);
                }
            }
        }

        if failures == total {
            return Err(DubError::Translation(format!(
                "all {} chunks failed to translate",
                total
            )));
        }

        Ok(translated.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::MockTranslationBackend;

    fn long_text(min_chars: usize) -> (String, Vec<String>) {
        let mut sentences = Vec::new();
        let mut len = 0;
        let mut i = 0;
        while len < min_chars {
            let sentence = match i % 3 {
                0 => format!("Sentence number {} explains the trick in detail.", i),
                1 => format!("Did you know fact {} was true?", i),
                _ => format!("Wow, number {} is amazing!", i),
            };
            len += sentence.chars().count() + 1;
            sentences.push(sentence);
            i += 1;
        }
        (sentences.join(" "), sentences)
    }

    #[test]
    fn test_split_sentences_on_terminal_punctuation() {
        let text = "Hello there. How are you?  Great!Fine. Version 1.5 is out";
        assert_eq!(
            split_sentences(text),
            vec!["Hello there.", "How are you?", "Great!Fine.", "Version 1.5 is out"]
        );
    }

    #[test]
    fn test_split_sentences_keeps_trailing_punctuation() {
        assert_eq!(split_sentences("One. Two."), vec!["One.", "Two."]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_chunks_respect_threshold_and_preserve_content() {
        let (text, sentences) = long_text(9000);
        let chunks = chunk_text(&text, 4500);

        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4500));
        assert_eq!(chunks.join(" "), sentences.join(" "));
    }

    #[test]
    fn test_oversized_sentence_is_split_at_whitespace() {
        let sentence = "word ".repeat(30);
        let chunks = chunk_text(sentence.trim(), 22);
        assert!(chunks.iter().all(|c| c.chars().count() <= 22));
        assert_eq!(chunks.join(" "), sentence.trim());
    }

    #[test]
    fn test_oversized_word_is_cut() {
        let chunks = chunk_text("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[tokio::test]
    async fn test_short_text_is_one_request() {
        let mut backend = MockTranslationBackend::new();
        backend
            .expect_translate_chunk()
            .times(1)
            .returning(|_, _| Ok("Hola mundo.".to_string()));

        let translator = ChunkedTranslator::new(Box::new(backend), 4500);
        let result = translator.translate("Hello world.", "es").await.unwrap();
        assert_eq!(result, "Hola mundo.");
    }

    #[tokio::test]
    async fn test_short_text_failure_is_translation_error() {
        let mut backend = MockTranslationBackend::new();
        backend
            .expect_translate_chunk()
            .times(1)
            .returning(|_, _| Err(DubError::Translation("quota".to_string())));

        let translator = ChunkedTranslator::new(Box::new(backend), 4500);
        let err = translator.translate("Hello world.", "es").await.unwrap_err();
        assert!(matches!(err, DubError::Translation(_)));
    }

    #[tokio::test]
    async fn test_long_text_is_chunked_and_rejoined() {
        let (text, sentences) = long_text(9000);
        let expected_chunks = chunk_text(&text, 4500).len();
        assert!(expected_chunks >= 2);

        let mut backend = MockTranslationBackend::new();
        backend
            .expect_translate_chunk()
            .times(expected_chunks)
            .returning(|chunk, _| {
                assert!(chunk.chars().count() <= 4500);
                Ok(chunk.to_string())
            });

        let translator = ChunkedTranslator::new(Box::new(backend), 4500);
        let result = translator.translate(&text, "es").await.unwrap();
        assert_eq!(result, sentences.join(" "));
    }

    #[tokio::test]
    async fn test_failed_chunk_passes_through_untranslated() {
        let text = "First part here. Second part FAIL. Third part here.";

        let mut backend = MockTranslationBackend::new();
        backend.expect_translate_chunk().times(3).returning(|chunk, _| {
            if chunk.contains("FAIL") {
                Err(DubError::Translation("segment rejected".to_string()))
            } else {
                Ok(chunk.to_uppercase())
            }
        });

        let translator = ChunkedTranslator::new(Box::new(backend), 20);
        let result = translator.translate(text, "es").await.unwrap();
        assert_eq!(result, "FIRST PART HERE. Second part FAIL. THIRD PART HERE.");
    }

    #[tokio::test]
    async fn test_every_chunk_failing_is_translation_error() {
        let mut backend = MockTranslationBackend::new();
        backend
            .expect_translate_chunk()
            .returning(|_, _| Err(DubError::Translation("offline".to_string())));

        let translator = ChunkedTranslator::new(Box::new(backend), 20);
        let err = translator
            .translate("First part here. Second part here.", "es")
            .await
            .unwrap_err();
        assert!(matches!(err, DubError::Translation(_)));
    }
}
