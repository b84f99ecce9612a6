//! Audit trail entries ("auditoria").

use super::{now_epoch_ms, require_text, AuditId, ConsultationId, ModelValidationError, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const AUDIT_EVENT_CONSULTATION_CREATED: &str = "consultation_created";
pub const AUDIT_EVENT_CONSULTATION_RESPONDED: &str = "consultation_responded";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub consultation_id: Option<ConsultationId>,
    pub actor_id: Option<UserId>,
    pub event: String,
    /// Structured event payload, stored as JSON text.
    pub detail: Option<Value>,
    pub occurred_at: i64,
}

impl AuditEntry {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            consultation_id: None,
            actor_id: None,
            event: event.into(),
            detail: None,
            occurred_at: now_epoch_ms(),
        }
    }

    pub fn for_consultation(mut self, consultation_id: ConsultationId) -> Self {
        self.consultation_id = Some(consultation_id);
        self
    }

    pub fn by(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("audit event", &self.event)
    }
}
