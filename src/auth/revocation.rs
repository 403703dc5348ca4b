use std::collections::HashSet;
use tokio::sync::RwLock;

/// Process-wide set of revoked token ids. Logout inserts the token's
/// `jti`; the gate rejects any bearer whose `jti` is present. Entries
/// are never pruned, revocation outlives the token's own expiry.
#[derive(Debug, Default)]
pub struct RevocationSet {
    revoked: RwLock<HashSet<String>>,
}

impl RevocationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token id as revoked. Returns false if it already was.
    pub async fn revoke(&self, token_id: &str) -> bool {
        let inserted = self.revoked.write().await.insert(token_id.to_string());
        if inserted {
            tracing::debug!(token_id = %token_id, "Revoked access token");
        }
        inserted
    }

    pub async fn contains(&self, token_id: &str) -> bool {
        self.revoked.read().await.contains(token_id)
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.revoked.read().await.is_empty()
    }
}
