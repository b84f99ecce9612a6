//! Administrator responses ("respuestas") to consultations.

use super::consultation::ConsultationStatus;
use super::{normalize_optional, ConsultationId, ResponseId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Formal verdict on a consultation ("estado_respuesta_type").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseOutcome {
    #[serde(rename = "sin_conflicto")]
    NoConflict,
    #[serde(rename = "con_conflicto")]
    Conflict,
    #[serde(rename = "requiere_escalacion")]
    RequiresEscalation,
}

impl ResponseOutcome {
    pub const ALL: [Self; 3] = [Self::NoConflict, Self::Conflict, Self::RequiresEscalation];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoConflict => "sin_conflicto",
            Self::Conflict => "con_conflicto",
            Self::RequiresEscalation => "requiere_escalacion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|outcome| outcome.as_str() == value.trim())
    }

    /// Consultation status after this outcome is recorded.
    pub fn resulting_status(self) -> ConsultationStatus {
        match self {
            Self::NoConflict | Self::Conflict => ConsultationStatus::Finalized,
            Self::RequiresEscalation => ConsultationStatus::Escalated,
        }
    }

    /// Whether the consultation keeps its conflict flag.
    ///
    /// Escalation keeps the flag raised until central review decides.
    pub fn confirms_conflict(self) -> bool {
        !matches!(self, Self::NoConflict)
    }
}

/// Draft submitted by a reviewing administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDraft {
    pub outcome: ResponseOutcome,
    pub comment: Option<String>,
}

/// Persisted response row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub consultation_id: ConsultationId,
    pub responder_id: UserId,
    pub outcome: ResponseOutcome,
    pub comment: Option<String>,
    pub responded_at: i64,
}

impl Response {
    pub fn new(
        consultation_id: ConsultationId,
        responder_id: UserId,
        draft: &ResponseDraft,
        responded_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            consultation_id,
            responder_id,
            outcome: draft.outcome,
            comment: normalize_optional(draft.comment.clone()),
            responded_at,
        }
    }
}
