//! Append-only audit trail persistence.

use super::{opt_uuid_text, read_optional_uuid, read_uuid, RepoError, RepoResult, SqliteStore};
use crate::model::audit::AuditEntry;
use crate::model::{AuditId, ConsultationId};
use rusqlite::params;

pub trait AuditRepository {
    fn append_audit(&self, entry: &AuditEntry) -> RepoResult<AuditId>;
    /// Entries for one consultation, oldest first.
    fn list_audit(&self, consultation_id: ConsultationId) -> RepoResult<Vec<AuditEntry>>;
}

impl AuditRepository for SqliteStore<'_> {
    fn append_audit(&self, entry: &AuditEntry) -> RepoResult<AuditId> {
        entry.validate()?;
        let detail = entry.detail.as_ref().map(ToString::to_string);
        self.conn.execute(
            "INSERT INTO auditoria (
                id,
                consulta_id,
                usuario_responsable,
                evento,
                detalle,
                fecha_evento
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.id.to_string(),
                opt_uuid_text(entry.consultation_id),
                opt_uuid_text(entry.actor_id),
                entry.event.as_str(),
                detail,
                entry.occurred_at,
            ],
        )?;
        Ok(entry.id)
    }

    fn list_audit(&self, consultation_id: ConsultationId) -> RepoResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                consulta_id,
                usuario_responsable,
                evento,
                detalle,
                fecha_evento
             FROM auditoria
             WHERE consulta_id = ?1
             ORDER BY fecha_evento ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([consultation_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let detail = match row.get::<_, Option<String>>("detalle")? {
                Some(text) => Some(serde_json::from_str(&text).map_err(|err| {
                    RepoError::InvalidData(format!("invalid json in auditoria.detalle: {err}"))
                })?),
                None => None,
            };
            entries.push(AuditEntry {
                id: read_uuid(row, "id", "auditoria")?,
                consultation_id: read_optional_uuid(row, "consulta_id", "auditoria")?,
                actor_id: read_optional_uuid(row, "usuario_responsable", "auditoria")?,
                event: row.get("evento")?,
                detail,
                occurred_at: row.get("fecha_evento")?,
            });
        }
        Ok(entries)
    }
}
