use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    pub task_id: String,
}

/// External identity-document verification provider. Consumed only to gate
/// document-dependent eligibility (an operator publishing offers); the
/// provider's async review pipeline is its own concern.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(
        &self,
        document_type: &str,
        number: &str,
        extra: Option<&str>,
    ) -> CoreResult<VerificationOutcome>;
}

pub struct MockIdentityVerifier {
    pub approve: bool,
}

impl MockIdentityVerifier {
    pub fn approving() -> Self {
        Self { approve: true }
    }

    pub fn rejecting() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(
        &self,
        document_type: &str,
        number: &str,
        _extra: Option<&str>,
    ) -> CoreResult<VerificationOutcome> {
        tracing::info!(document_type, "verifying identity document");
        Ok(VerificationOutcome {
            verified: self.approve && !number.is_empty(),
            task_id: format!("idv-{}", uuid::Uuid::new_v4().simple()),
        })
    }
}
