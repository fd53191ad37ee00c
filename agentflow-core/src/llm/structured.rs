//! Structured output decoding
//!
//! Models are asked for JSON and frequently wrap it in markdown fences or a
//! sentence of preamble. Decoding strips that envelope, deserializes with
//! serde and then runs the type's own validation. Anything that does not
//! survive is a [`AgentflowError::MalformedOutput`]; nothing is defaulted.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::error::{AgentflowError, Result};

/// A value that can be requested from the model as JSON
pub trait StructuredOutput: DeserializeOwned + Send + 'static {
    /// Short type name used in error messages and logs
    const NAME: &'static str;

    /// Example-shaped JSON schema appended to the prompt
    fn schema() -> serde_json::Value;

    /// Semantic checks beyond what serde enforces
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Instructions appended to a prompt requesting this type
    fn format_instructions() -> String {
        let schema = serde_json::to_string_pretty(&Self::schema()).unwrap_or_default();
        format!(
            "Your response should be in JSON format.\n\
             Do not include any explanations, only provide a RFC8259 compliant JSON response \
             following this format without deviation.\n\
             Do not include markdown code blocks in your response.\n\
             Here is the JSON Schema instance your output must adhere to:\n{schema}"
        )
    }
}

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json|JSON)?\s*\n?([\s\S]*?)\n?```").expect("valid code fence regex")
});

/// Extract the JSON payload from a model reply
fn extract_payload(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(inner) = CODE_FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        return inner.as_str().trim();
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }

    // Leading prose: take the outermost object
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Decode a raw model reply into `T`
pub fn decode_structured<T: StructuredOutput>(raw: &str) -> Result<T> {
    let malformed = |message: String| AgentflowError::MalformedOutput {
        target: T::NAME.to_string(),
        message,
        raw: raw.to_string(),
    };

    let payload = extract_payload(raw);
    if payload.is_empty() {
        return Err(malformed("empty response".to_string()));
    }

    let value: T = serde_json::from_str(payload).map_err(|e| malformed(e.to_string()))?;
    value.validate().map_err(malformed)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        label: String,
        score: u8,
    }

    impl StructuredOutput for Verdict {
        const NAME: &'static str = "Verdict";

        fn schema() -> serde_json::Value {
            serde_json::json!({"label": "string", "score": "integer"})
        }

        fn validate(&self) -> std::result::Result<(), String> {
            if self.label.trim().is_empty() {
                return Err("label must not be empty".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn test_decode_plain_json() {
        let verdict: Verdict = decode_structured(r#"{"label":"ok","score":3}"#).unwrap();
        assert_eq!(verdict.score, 3);
    }

    #[test]
    fn test_decode_strips_code_fence_and_preamble() {
        let fenced = "```json\n{\"label\": \"ok\", \"score\": 1}\n```";
        assert_eq!(decode_structured::<Verdict>(fenced).unwrap().label, "ok");

        let chatty = "Sure! Here you go: {\"label\": \"ok\", \"score\": 2} Hope that helps.";
        assert_eq!(decode_structured::<Verdict>(chatty).unwrap().score, 2);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = decode_structured::<Verdict>(r#"{"label":"ok"}"#).unwrap_err();
        match err {
            AgentflowError::MalformedOutput { target, raw, .. } => {
                assert_eq!(target, "Verdict");
                assert_eq!(raw, r#"{"label":"ok"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validation_failure_is_malformed() {
        let err = decode_structured::<Verdict>(r#"{"label":"  ","score":1}"#).unwrap_err();
        assert!(err.to_string().contains("label must not be empty"));
    }

    #[test]
    fn test_non_json_is_malformed() {
        assert!(matches!(
            decode_structured::<Verdict>("I cannot answer that."),
            Err(AgentflowError::MalformedOutput { .. })
        ));
        assert!(matches!(
            decode_structured::<Verdict>("   "),
            Err(AgentflowError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_format_instructions_embed_schema() {
        let instructions = Verdict::format_instructions();
        assert!(instructions.contains("\"label\""));
        assert!(instructions.contains("JSON"));
    }
}
