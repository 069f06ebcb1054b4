use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

pub const EMPTY_PROMPT: &str = "EMPTY_PROMPT";
pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
pub const INVALID_ARGUMENT: &str = "INVALID_ARGUMENT";
pub const UNKNOWN_STYLE: &str = "UNKNOWN_STYLE";
pub const GENERATION_FAILED: &str = "GENERATION_FAILED";
pub const FONT_UNAVAILABLE: &str = "FONT_UNAVAILABLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodedErrorKind {
    /// Bad input from the caller: arguments, prompt, config.
    Usage,
    /// The pipeline or renderer failed on valid input.
    Runtime,
}

#[derive(Debug, Clone)]
pub struct CodedError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
    pub kind: CodedErrorKind,
}

impl CodedError {
    pub fn usage(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Usage,
        }
    }

    pub fn runtime(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            kind: CodedErrorKind::Runtime,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Process exit status for this error: 2 for usage errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self.kind {
            CodedErrorKind::Usage => 2,
            CodedErrorKind::Runtime => 1,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            ok: false,
            error: ErrorEnvelopeBody {
                code: self.code.to_owned(),
                message: self.message.clone(),
                details: self.details.clone(),
            },
        }
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CodedError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub fn find_coded_error(error: &Error) -> Option<&CodedError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CodedError>())
}

/// Envelope for any error; uncoded errors are reported as
/// `GENERATION_FAILED` with the full context chain as the message.
pub fn envelope_for(error: &Error) -> ErrorEnvelope {
    match find_coded_error(error) {
        Some(coded) => coded.envelope(),
        None => CodedError::runtime(GENERATION_FAILED, format!("{error:#}")).envelope(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn coded_error_survives_context_chain() {
        let error = Err::<(), _>(CodedError::usage(UNKNOWN_STYLE, "no style 'noir'"))
            .context("resolving style")
            .unwrap_err();
        let coded = find_coded_error(&error).expect("coded error in chain");
        assert_eq!(coded.code, UNKNOWN_STYLE);
        assert_eq!(coded.exit_code(), 2);
    }

    #[test]
    fn envelope_serializes_without_empty_details() {
        let json = serde_json::to_value(CodedError::usage(EMPTY_PROMPT, "prompt is blank").envelope()).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["code"], EMPTY_PROMPT);
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn details_reach_the_envelope() {
        let error = anyhow::Error::new(
            CodedError::usage(UNKNOWN_STYLE, "no style 'noir'").with_details(serde_json::json!({ "valid": ["retro"] })),
        );
        let json = serde_json::to_value(envelope_for(&error)).unwrap();
        assert_eq!(json["error"]["details"]["valid"][0], "retro");
    }

    #[test]
    fn uncoded_errors_fall_back_to_generation_failed() {
        let error = anyhow::anyhow!("disk full").context("writing frame 3");
        let envelope = envelope_for(&error);
        assert_eq!(envelope.error.code, GENERATION_FAILED);
        assert!(envelope.error.message.contains("disk full"));
    }
}
