//! Credential pair of a flow account.

use serde::{Deserialize, Serialize};

/// Email and secret of the shared external account. Opaque to the engine.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCredential {
    /// Login email of the external account.
    pub email: String,
    /// Login secret of the external account.
    pub secret: String,
}

impl FlowCredential {
    /// Create a credential, normalizing the email to trimmed lowercase.
    pub fn new(email: &str, secret: impl Into<String>) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for FlowCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowCredential")
            .field("email", &self.email)
            .field("secret", &"***")
            .finish()
    }
}
