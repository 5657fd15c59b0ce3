use std::fmt;

/// Login material for one account.
///
/// Loaded once at startup and immutable afterwards. The identifier doubles
/// as the account's key in batch output, so loaders must keep it unique
/// within a run.
#[derive(Clone)]
pub struct Credential {
    /// Login name, unique within a batch.
    pub identifier: String,
    /// Account secret, transfer-encoded at sign-in.
    pub secret: String,
    /// Shared authenticator seed for guard-code derivation, present when
    /// the account has a second factor enrolled.
    pub two_factor_seed: Option<String>,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            two_factor_seed: None,
        }
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.two_factor_seed = Some(seed.into());
        self
    }

    pub fn has_second_factor(&self) -> bool {
        self.two_factor_seed.is_some()
    }
}

// Credentials end up in logs through context structs, so Debug must never
// reveal the secret material.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .field(
                "two_factor_seed",
                &self.two_factor_seed.as_deref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secret_material() {
        let credential = Credential::new("alice", "hunter2").with_seed("c2VlZA==");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("c2VlZA=="));
    }

    #[test]
    fn second_factor_presence_tracks_seed() {
        assert!(!Credential::new("a", "b").has_second_factor());
        assert!(Credential::new("a", "b").with_seed("s").has_second_factor());
    }
}
