//! Administrator response persistence.

use super::{read_enum, read_uuid, RepoResult, SqliteStore};
use crate::model::response::{Response, ResponseOutcome};
use crate::model::{ConsultationId, ResponseId};
use rusqlite::params;

pub trait ResponseRepository {
    fn create_response(&self, response: &Response) -> RepoResult<ResponseId>;
    /// Responses for one consultation, oldest first.
    fn list_responses(&self, consultation_id: ConsultationId) -> RepoResult<Vec<Response>>;
}

impl ResponseRepository for SqliteStore<'_> {
    fn create_response(&self, response: &Response) -> RepoResult<ResponseId> {
        self.conn.execute(
            "INSERT INTO respuestas (
                id,
                consulta_id,
                usuario_respondedor,
                estado_respuesta,
                comentario,
                fecha_respuesta
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                response.id.to_string(),
                response.consultation_id.to_string(),
                response.responder_id.to_string(),
                response.outcome.as_str(),
                response.comment.as_deref(),
                response.responded_at,
            ],
        )?;
        Ok(response.id)
    }

    fn list_responses(&self, consultation_id: ConsultationId) -> RepoResult<Vec<Response>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                consulta_id,
                usuario_respondedor,
                estado_respuesta,
                comentario,
                fecha_respuesta
             FROM respuestas
             WHERE consulta_id = ?1
             ORDER BY fecha_respuesta ASC, id ASC;",
        )?;
        let mut rows = stmt.query([consultation_id.to_string()])?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(Response {
                id: read_uuid(row, "id", "respuestas")?,
                consultation_id: read_uuid(row, "consulta_id", "respuestas")?,
                responder_id: read_uuid(row, "usuario_respondedor", "respuestas")?,
                outcome: read_enum(row, "estado_respuesta", "respuestas", ResponseOutcome::parse)?,
                comment: row.get("comentario")?,
                responded_at: row.get("fecha_respuesta")?,
            });
        }
        Ok(responses)
    }
}
