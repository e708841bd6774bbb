//! Failure taxonomy for the activation request boundary.

use thiserror::Error;

/// Message reported to callers for every non-disclosed failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Unknown error";

/// Everything that can go wrong while binding or invoking an action.
///
/// Exactly one variant ([`ActivationError::NotADictionary`]) is safe to
/// disclose to the caller; every other failure is reported as
/// [`GENERIC_ERROR_MESSAGE`] and only logged server-side.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("unexpected call to {0}")]
    UnexpectedRoute(String),

    #[error("could not find action file: {0}")]
    MissingAction(String),

    #[error("action configuration missing: {0}")]
    ConfigMissing(String),

    #[error("entry point '{0}' is not defined by the action source")]
    MissingEntryPoint(String),

    #[error("failed to open action archive: {0}")]
    Archive(String),

    #[error("The action did not return a dictionary.")]
    NotADictionary,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lua runtime error: {0}")]
    Runtime(String),

    #[error("internal error: {0}")]
    Internal(String),
}

// mlua::Error is not Send, but activation outcomes cross a blocking-task
// boundary, so the rendered message is carried instead of the error itself.
impl From<mlua::Error> for ActivationError {
    fn from(err: mlua::Error) -> Self {
        ActivationError::Runtime(err.to_string())
    }
}

impl ActivationError {
    /// HTTP status carried by this failure. Always within [400, 599].
    pub fn status_code(&self) -> u16 {
        match self {
            ActivationError::NotADictionary => 502,
            _ => 500,
        }
    }

    /// The message shown to the caller. Only the result-shape violation
    /// exposes its own text; everything else is opaque.
    pub fn disclosed_message(&self) -> String {
        match self {
            ActivationError::NotADictionary => self.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_dictionary_result_is_disclosed_with_502() {
        let err = ActivationError::NotADictionary;
        assert_eq!(err.status_code(), 502);
        assert_eq!(
            err.disclosed_message(),
            "The action did not return a dictionary."
        );
    }

    #[test]
    fn other_failures_are_opaque_500s() {
        let errors = [
            ActivationError::UnexpectedRoute("/predict".to_string()),
            ActivationError::MissingAction("index.lua".to_string()),
            ActivationError::ConfigMissing("config.json".to_string()),
            ActivationError::MissingEntryPoint("main".to_string()),
            ActivationError::Archive("not a zip".to_string()),
            ActivationError::Runtime("attempt to call a nil value".to_string()),
            ActivationError::Internal("task failed".to_string()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), 500, "{err}");
            assert_eq!(err.disclosed_message(), GENERIC_ERROR_MESSAGE, "{err}");
        }
    }

    #[test]
    fn lua_errors_convert_to_rendered_strings() {
        let err: ActivationError =
            mlua::Error::RuntimeError("boom".to_string()).into();
        match err {
            ActivationError::Runtime(msg) => assert!(msg.contains("boom")),
            other => panic!("expected Runtime, got {other:?}"),
        }
    }
}
