//! Statische Token-Liste
//!
//! Fuer Entwicklung und kleine Deployments. Tokens werden nur als
//! SHA-256-Digest gehalten.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::error::AuthResult;
use crate::verifier::TokenVerifier;

/// Akzeptiert genau die konfigurierten Tokens
#[derive(Debug, Clone, Default)]
pub struct StatischerVerifier {
    digests: HashSet<[u8; 32]>,
}

impl StatischerVerifier {
    pub fn neu<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let digests = tokens
            .into_iter()
            .filter(|t| !t.as_ref().is_empty())
            .map(|t| digest(t.as_ref()))
            .collect();
        Self { digests }
    }

    pub fn anzahl(&self) -> usize {
        self.digests.len()
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[async_trait]
impl TokenVerifier for StatischerVerifier {
    async fn verifizieren(&self, token: &str) -> AuthResult<bool> {
        Ok(self.digests.contains(&digest(token)))
    }

    fn name(&self) -> &'static str {
        "statisch"
    }
}
