// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum YaksError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("JSON conversion failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML conversion failed: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("unable to determine test name")]
    InvalidTestName,

    #[error("cannot convert {0} CRD: {1}")]
    CrdConversion(String, String),

    #[error("cannot check CRD installation after {0} seconds")]
    CrdTimeout(u64),

    #[error("Invalid environment variable '{0}', expected KEY=VALUE")]
    InvalidEnvVar(String),

    #[error("Unknown embedded resource: {0}")]
    MissingResource(String),

    #[error("OLM installation failed: {0}")]
    Olm(String),
}

pub type Result<T> = std::result::Result<T, YaksError>;

fn api_code(err: &kube::Error) -> Option<u16> {
    match err {
        kube::Error::Api(resp) => Some(resp.code),
        _ => None,
    }
}

/// True when the API server answered 404
pub fn is_not_found(err: &kube::Error) -> bool {
    api_code(err) == Some(404)
}

/// True when a create was rejected because the object exists.
/// A 409 `Conflict` from a stale resourceVersion does not count.
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists")
}

pub fn is_forbidden(err: &kube::Error) -> bool {
    api_code(err) == Some(403)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: "boom".to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_status_code_predicates() {
        assert!(is_not_found(&api_error(404, "NotFound")));
        assert!(is_already_exists(&api_error(409, "AlreadyExists")));
        assert!(is_forbidden(&api_error(403, "Forbidden")));
        assert!(!is_not_found(&api_error(500, "InternalError")));
    }

    #[test]
    fn test_write_conflict_is_not_already_exists() {
        assert!(!is_already_exists(&api_error(409, "Conflict")));
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(
            YaksError::CrdTimeout(25).to_string(),
            "cannot check CRD installation after 25 seconds"
        );
    }
}
