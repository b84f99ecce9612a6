//! Consultation persistence.
//!
//! # Responsibility
//! - Insert new consultations and apply screening / review state updates.
//! - List consultations by requester, requester site and status.
//!
//! # Invariants
//! - Lists are always sorted by `fecha_consulta DESC, id ASC`.
//! - Status updates never touch the submitted client data.

use super::{
    opt_uuid_text, placeholders, read_enum, read_flag, read_uuid, RepoError, RepoResult,
    SqliteStore,
};
use crate::model::consultation::{Consultation, ConsultationStatus};
use crate::model::{ConsultationId, SiteId, UserId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const CONSULTATION_SELECT_SQL: &str = "SELECT
    c.id,
    c.usuario_solicitante,
    c.nombre_potencial_cliente,
    c.ruc_potencial_cliente,
    c.tipo_servicio,
    c.fecha_consulta,
    c.estado_final,
    c.tiene_conflicto
FROM consultas c";

/// Filter and pagination options for consultation lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultationListQuery {
    /// Only consultations submitted by this user.
    pub requester_id: Option<UserId>,
    /// Only consultations whose requester belongs to this site.
    pub requester_site_id: Option<SiteId>,
    /// Allowed statuses; empty means any.
    pub statuses: Vec<ConsultationStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ConsultationListQuery {
    pub fn by_requester(requester_id: UserId) -> Self {
        Self {
            requester_id: Some(requester_id),
            ..Self::default()
        }
    }
}

pub trait ConsultationRepository {
    fn create_consultation(&self, consultation: &Consultation) -> RepoResult<ConsultationId>;
    fn get_consultation(&self, id: ConsultationId) -> RepoResult<Option<Consultation>>;
    /// Sets status and conflict flag in one update.
    fn update_consultation_status(
        &self,
        id: ConsultationId,
        status: ConsultationStatus,
        has_conflict: Option<bool>,
    ) -> RepoResult<()>;
    fn list_consultations(&self, query: &ConsultationListQuery) -> RepoResult<Vec<Consultation>>;
}

impl ConsultationRepository for SqliteStore<'_> {
    fn create_consultation(&self, consultation: &Consultation) -> RepoResult<ConsultationId> {
        consultation.validate()?;
        self.conn.execute(
            "INSERT INTO consultas (
                id,
                usuario_solicitante,
                nombre_potencial_cliente,
                ruc_potencial_cliente,
                tipo_servicio,
                fecha_consulta,
                estado_final,
                tiene_conflicto
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                consultation.id.to_string(),
                consultation.requester_id.to_string(),
                consultation.client_name.as_str(),
                consultation.tax_id.as_str(),
                consultation.service_kind.as_deref(),
                consultation.requested_at,
                consultation.status.as_str(),
                consultation.has_conflict,
            ],
        )?;
        Ok(consultation.id)
    }

    fn get_consultation(&self, id: ConsultationId) -> RepoResult<Option<Consultation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONSULTATION_SELECT_SQL} WHERE c.id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_consultation_row(row)?));
        }
        Ok(None)
    }

    fn update_consultation_status(
        &self,
        id: ConsultationId,
        status: ConsultationStatus,
        has_conflict: Option<bool>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE consultas
             SET
                estado_final = ?2,
                tiene_conflicto = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), status.as_str(), has_conflict],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "consultation",
                id,
            });
        }
        Ok(())
    }

    fn list_consultations(&self, query: &ConsultationListQuery) -> RepoResult<Vec<Consultation>> {
        let mut sql = String::from(CONSULTATION_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if query.requester_site_id.is_some() {
            sql.push_str(" INNER JOIN usuarios u ON u.id = c.usuario_solicitante");
        }
        sql.push_str(" WHERE 1 = 1");

        if let Some(requester_id) = opt_uuid_text(query.requester_id) {
            sql.push_str(" AND c.usuario_solicitante = ?");
            bind_values.push(Value::Text(requester_id));
        }
        if let Some(site_id) = opt_uuid_text(query.requester_site_id) {
            sql.push_str(" AND u.sede_id = ?");
            bind_values.push(Value::Text(site_id));
        }
        if !query.statuses.is_empty() {
            sql.push_str(&format!(
                " AND c.estado_final IN ({})",
                placeholders(query.statuses.len())
            ));
            bind_values.extend(
                query
                    .statuses
                    .iter()
                    .map(|status| Value::Text(status.as_str().to_string())),
            );
        }

        sql.push_str(" ORDER BY c.fecha_consulta DESC, c.id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut consultations = Vec::new();
        while let Some(row) = rows.next()? {
            consultations.push(parse_consultation_row(row)?);
        }
        Ok(consultations)
    }
}

fn parse_consultation_row(row: &Row<'_>) -> RepoResult<Consultation> {
    let consultation = Consultation {
        id: read_uuid(row, "id", "consultas")?,
        requester_id: read_uuid(row, "usuario_solicitante", "consultas")?,
        client_name: row.get("nombre_potencial_cliente")?,
        tax_id: row.get("ruc_potencial_cliente")?,
        service_kind: row.get("tipo_servicio")?,
        requested_at: row.get("fecha_consulta")?,
        status: read_enum(row, "estado_final", "consultas", ConsultationStatus::parse)?,
        has_conflict: read_flag(row, "tiene_conflicto", "consultas")?,
    };
    consultation.validate()?;
    Ok(consultation)
}
