//! Shared HTTP helpers

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// `Authorization` header value for HTTP basic auth
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// Agent without a global timeout; camera streams stay open indefinitely
pub fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(None)
        .build()
        .into()
}
