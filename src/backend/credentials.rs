//! API key resolution for backend services

use crate::error::{AppError, Result};

/// Suffix appended to the uppercased service identifier to form the
/// environment variable name holding its API key
const KEY_SUFFIX: &str = "_API_KEY";

/// Environment variable name for a service's API key
pub fn key_name(service: &str) -> String {
    format!("{}{}", service.to_uppercase(), KEY_SUFFIX)
}

/// Resolve the API key for a service from the process environment.
///
/// A missing key is a configuration failure, not a runtime one, so it
/// surfaces as [`AppError::MissingCredential`] rather than an envelope.
pub fn resolve(service: &str) -> Result<String> {
    let key = key_name(service);
    std::env::var(&key).map_err(|_| AppError::MissingCredential {
        service: service.to_string(),
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_name_is_uppercased_with_suffix() {
        assert_eq!(key_name("acme"), "ACME_API_KEY");
        assert_eq!(key_name("groq"), "GROQ_API_KEY");
    }

    #[test]
    fn resolve_reads_from_environment() {
        std::env::set_var("RESOLVE_OK_TEST_API_KEY", "sk-test");
        let key = resolve("resolve_ok_test").unwrap();
        assert_eq!(key, "sk-test");
        std::env::remove_var("RESOLVE_OK_TEST_API_KEY");
    }

    #[test]
    fn missing_key_is_a_credential_error() {
        let err = resolve("resolve_absent_test").unwrap_err();
        match err {
            AppError::MissingCredential { service, key } => {
                assert_eq!(service, "resolve_absent_test");
                assert_eq!(key, "RESOLVE_ABSENT_TEST_API_KEY");
            }
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }
}
