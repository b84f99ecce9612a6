//! Conflict-check request ("consulta") model.
//!
//! # Responsibility
//! - Carry the prospective client data submitted by a requester.
//! - Track review state (`status`) and the screening result (`has_conflict`).
//!
//! # Invariants
//! - A new consultation starts `Pending` with `has_conflict = None`.
//! - Screening sets `has_conflict` and moves to `InProgress` or `Finalized`.
//! - `tax_id` is stored normalized.

use super::client::{normalize_tax_id, validate_tax_id};
use super::{normalize_optional, require_text, ConsultationId, ModelValidationError, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a consultation ("estado_consulta").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsultationStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "en_proceso")]
    InProgress,
    #[serde(rename = "escalado")]
    Escalated,
    #[serde(rename = "finalizado")]
    Finalized,
}

impl ConsultationStatus {
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Escalated,
        Self::Finalized,
    ];
    /// States an administrator can still respond to.
    pub const OPEN: [Self; 3] = [Self::Pending, Self::InProgress, Self::Escalated];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::InProgress => "en_proceso",
            Self::Escalated => "escalado",
            Self::Finalized => "finalizado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn is_open(self) -> bool {
        !matches!(self, Self::Finalized)
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submitted form data for a new check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewConsultation {
    pub client_name: String,
    pub tax_id: String,
    pub service_kind: Option<String>,
}

impl NewConsultation {
    pub fn new(client_name: impl Into<String>, tax_id: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            tax_id: tax_id.into(),
            service_kind: None,
        }
    }

    pub fn with_service_kind(mut self, service_kind: impl Into<String>) -> Self {
        self.service_kind = Some(service_kind.into());
        self
    }
}

/// Persisted consultation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: ConsultationId,
    pub requester_id: UserId,
    pub client_name: String,
    pub tax_id: String,
    pub service_kind: Option<String>,
    pub requested_at: i64,
    pub status: ConsultationStatus,
    /// `None` until the automatic screening has run.
    pub has_conflict: Option<bool>,
}

impl Consultation {
    /// Builds a pending consultation from form input, normalizing every field.
    pub fn pending(requester_id: UserId, input: &NewConsultation, requested_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id,
            client_name: input.client_name.trim().to_string(),
            tax_id: normalize_tax_id(&input.tax_id),
            service_kind: normalize_optional(input.service_kind.clone()),
            requested_at,
            status: ConsultationStatus::Pending,
            has_conflict: None,
        }
    }

    /// Records the automatic screening result.
    pub fn apply_screening(&mut self, has_conflict: bool) {
        self.has_conflict = Some(has_conflict);
        self.status = if has_conflict {
            ConsultationStatus::InProgress
        } else {
            ConsultationStatus::Finalized
        };
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("client name", &self.client_name)?;
        validate_tax_id(&self.tax_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Consultation, ConsultationStatus, NewConsultation};
    use uuid::Uuid;

    #[test]
    fn pending_consultation_normalizes_input() {
        let input = NewConsultation::new("  Pesquera Sur  ", "20 555-111").with_service_kind("  ");
        let consultation = Consultation::pending(Uuid::new_v4(), &input, 1_000);
        assert_eq!(consultation.client_name, "Pesquera Sur");
        assert_eq!(consultation.tax_id, "20555111");
        assert_eq!(consultation.service_kind, None);
        assert_eq!(consultation.status, ConsultationStatus::Pending);
        assert_eq!(consultation.has_conflict, None);
    }

    #[test]
    fn screening_sets_status_from_result() {
        let input = NewConsultation::new("Pesquera Sur", "20555111");
        let mut flagged = Consultation::pending(Uuid::new_v4(), &input, 1_000);
        flagged.apply_screening(true);
        assert_eq!(flagged.status, ConsultationStatus::InProgress);
        assert_eq!(flagged.has_conflict, Some(true));

        let mut clear = Consultation::pending(Uuid::new_v4(), &input, 1_000);
        clear.apply_screening(false);
        assert_eq!(clear.status, ConsultationStatus::Finalized);
        assert_eq!(clear.has_conflict, Some(false));
    }

    #[test]
    fn only_finalized_is_closed() {
        for status in ConsultationStatus::ALL {
            assert_eq!(status.is_open(), status != ConsultationStatus::Finalized);
        }
    }
}
