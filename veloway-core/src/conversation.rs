use async_trait::async_trait;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Chat/conversation collaborator. Strictly best-effort: callers log and
/// swallow failures, a booking never rolls back because chat creation failed.
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn create_or_get(&self, booking_id: Uuid, service_type: &str) -> CoreResult<Uuid>;
}

pub struct MockConversationService {
    pub fail: bool,
}

impl MockConversationService {
    pub fn working() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl ConversationService for MockConversationService {
    async fn create_or_get(&self, booking_id: Uuid, service_type: &str) -> CoreResult<Uuid> {
        if self.fail {
            return Err(CoreError::conflict("conversation backend unavailable"));
        }
        tracing::info!(%booking_id, service_type, "conversation created");
        Ok(Uuid::new_v4())
    }
}
