//! Notification persistence.
//!
//! # Invariants
//! - Batch inserts are all-or-nothing within the caller's transaction.
//! - Marking read is scoped to the recipient; other users' rows are invisible.

use super::{
    opt_uuid_text, read_enum, read_flag, read_optional_uuid, read_uuid, RepoError, RepoResult,
    SqliteStore,
};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::{ConsultationId, NotificationId, UserId};
use rusqlite::{params, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    usuario_destinatario,
    consulta_id,
    tipo_notificacion,
    notificacion_nombre,
    estado,
    leida,
    fecha_envio
FROM notificaciones";

pub trait NotificationRepository {
    /// Inserts every notification and returns how many rows were written.
    fn create_notifications(&self, notifications: &[Notification]) -> RepoResult<usize>;
    /// Notifications for one recipient, newest first.
    fn list_notifications(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>>;
    /// Notifications attached to one consultation, oldest first.
    fn list_consultation_notifications(
        &self,
        consultation_id: ConsultationId,
    ) -> RepoResult<Vec<Notification>>;
    fn mark_notification_read(&self, id: NotificationId, recipient_id: UserId) -> RepoResult<()>;
}

impl NotificationRepository for SqliteStore<'_> {
    fn create_notifications(&self, notifications: &[Notification]) -> RepoResult<usize> {
        for notification in notifications {
            notification.validate()?;
        }

        let mut stmt = self.conn.prepare(
            "INSERT INTO notificaciones (
                id,
                usuario_destinatario,
                consulta_id,
                tipo_notificacion,
                notificacion_nombre,
                estado,
                leida,
                fecha_envio
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        )?;
        let mut written = 0;
        for notification in notifications {
            written += stmt.execute(params![
                notification.id.to_string(),
                notification.recipient_id.to_string(),
                opt_uuid_text(notification.consultation_id),
                notification.kind.as_str(),
                notification.title.as_str(),
                notification.status.as_deref(),
                notification.read,
                notification.sent_at,
            ])?;
        }
        Ok(written)
    }

    fn list_notifications(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE usuario_destinatario = ?1
               AND (?2 = 0 OR leida = 0)
             ORDER BY fecha_envio DESC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![recipient_id.to_string(), unread_only])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn list_consultation_notifications(
        &self,
        consultation_id: ConsultationId,
    ) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE consulta_id = ?1
             ORDER BY fecha_envio ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([consultation_id.to_string()])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn mark_notification_read(&self, id: NotificationId, recipient_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notificaciones
             SET
                leida = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND usuario_destinatario = ?2;",
            params![id.to_string(), recipient_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "notification",
                id,
            });
        }
        Ok(())
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    Ok(Notification {
        id: read_uuid(row, "id", "notificaciones")?,
        recipient_id: read_uuid(row, "usuario_destinatario", "notificaciones")?,
        consultation_id: read_optional_uuid(row, "consulta_id", "notificaciones")?,
        kind: read_enum(
            row,
            "tipo_notificacion",
            "notificaciones",
            NotificationKind::parse,
        )?,
        title: row.get("notificacion_nombre")?,
        status: row.get("estado")?,
        read: read_flag(row, "leida", "notificaciones")?.unwrap_or(false),
        sent_at: row.get("fecha_envio")?,
    })
}
