use async_trait::async_trait;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// TranslationError
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected translation response: {0}")]
    Malformed(String),
}

/// Translator
///
/// A machine-translation lookup. The content layer only ever asks for ru → en,
/// but the languages are passed through so the contract stays honest.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError>;
}

pub type TranslatorState = Arc<dyn Translator>;

/// Longest piece of text sent in one request.
const MAX_CHUNK_CHARS: usize = 4500;

/// GoogleTranslator
///
/// Client for the public Google Translate web endpoint (`client=gtx`). Long texts
/// are split on line boundaries and translated piece by piece.
pub struct GoogleTranslator {
    http: reqwest::Client,
    url: String,
}

impl GoogleTranslator {
    pub fn new(url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.to_string(),
        }
    }

    async fn translate_chunk(
        &self,
        chunk: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let response = self
            .http
            .post(&self.url)
            .query(&[("client", "gtx"), ("sl", source), ("tl", target), ("dt", "t")])
            .form(&[("q", chunk)])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_gtx_response(&body)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        let mut out = String::with_capacity(text.len());
        for chunk in chunk_text(text, MAX_CHUNK_CHARS) {
            out.push_str(&self.translate_chunk(chunk, source, target).await?);
        }
        Ok(out)
    }
}

/// parse_gtx_response
///
/// The endpoint answers with nested arrays; the first element lists the translated
/// segments, each segment starting with its translated text.
pub fn parse_gtx_response(body: &Value) -> Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Malformed(body.to_string()))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

/// chunk_text
///
/// Splits `text` into pieces of at most `max_chars` characters, cutting after a
/// newline when one is available so markup and paragraphs stay intact.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        let hard_limit = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let cut = rest[..hard_limit]
            .rfind('\n')
            .map(|idx| idx + 1)
            .unwrap_or(hard_limit);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// MockTranslator
///
/// Deterministic translator for tests: prefixes the text with `[en] ` and counts
/// calls. A failing mock errors on every call.
#[derive(Default)]
pub struct MockTranslator {
    pub should_fail: bool,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source: &str,
        _target: &str,
    ) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(TranslationError::Malformed("mock failure".to_string()));
        }
        Ok(format!("[en] {text}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_segmented_response() {
        let body = json!([[["Hello, ", "Привет, ", null], ["world", "мир", null]], null, "ru"]);
        assert_eq!(parse_gtx_response(&body).unwrap(), "Hello, world");
    }

    #[test]
    fn rejects_unexpected_shape() {
        assert!(parse_gtx_response(&json!({"error": "nope"})).is_err());
    }

    #[test]
    fn chunks_prefer_line_breaks() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = chunk_text(text, 8);
        assert_eq!(chunks, vec!["aaaa\n", "bbbb\n", "cccc"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunks_count_characters_not_bytes() {
        let text = "ж".repeat(10);
        let chunks = chunk_text(&text, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_text("привет", 100), vec!["привет"]);
    }
}
