//! In-app notifications addressed to one user.

use super::{now_epoch_ms, require_text, ConsultationId, ModelValidationError, NotificationId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery state written on creation.
pub const NOTIFICATION_STATUS_PENDING: &str = "pendiente";

/// Notification category ("tipo_notificacion").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "nueva_consulta")]
    NewConsultation,
    #[serde(rename = "recordatorio")]
    Reminder,
    #[serde(rename = "escalacion")]
    Escalation,
    #[serde(rename = "finalizacion")]
    Finalization,
}

impl NotificationKind {
    pub const ALL: [Self; 4] = [
        Self::NewConsultation,
        Self::Reminder,
        Self::Escalation,
        Self::Finalization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewConsultation => "nueva_consulta",
            Self::Reminder => "recordatorio",
            Self::Escalation => "escalacion",
            Self::Finalization => "finalizacion",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Title prefix shown to the recipient, followed by the client name.
    pub fn title_prefix(self) -> &'static str {
        match self {
            Self::NewConsultation => "Nueva consulta",
            Self::Reminder => "Recordatorio",
            Self::Escalation => "Consulta escalada",
            Self::Finalization => "Consulta finalizada",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub consultation_id: Option<ConsultationId>,
    pub kind: NotificationKind,
    pub title: String,
    pub status: Option<String>,
    pub read: bool,
    pub sent_at: i64,
}

impl Notification {
    /// Builds an unread, pending notification about one consultation.
    pub fn about_consultation(
        recipient_id: UserId,
        consultation_id: ConsultationId,
        kind: NotificationKind,
        client_name: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            consultation_id: Some(consultation_id),
            kind,
            title: format!("{}: {}", kind.title_prefix(), client_name),
            status: Some(NOTIFICATION_STATUS_PENDING.to_string()),
            read: false,
            sent_at: now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("notification title", &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::{Notification, NotificationKind, NOTIFICATION_STATUS_PENDING};
    use uuid::Uuid;

    #[test]
    fn consultation_notification_is_titled_by_kind() {
        let notification = Notification::about_consultation(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NotificationKind::NewConsultation,
            "Agroexport SAC",
        );
        assert_eq!(notification.title, "Nueva consulta: Agroexport SAC");
        assert_eq!(notification.status.as_deref(), Some(NOTIFICATION_STATUS_PENDING));
        assert!(!notification.read);
    }
}
