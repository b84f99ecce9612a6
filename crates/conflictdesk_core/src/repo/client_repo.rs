//! Current-client persistence and the conflict search predicate.
//!
//! # Invariants
//! - Stored `ruc` values are normalized tax IDs.
//! - A client's area, when set, belongs to the client's site.
//! - The conflict predicate is: normalized tax ID equal, OR the folded stored
//!   name contains the folded prospective name.

use super::site_repo::SiteRepository;
use super::{read_optional_uuid, read_uuid, opt_uuid_text, RepoError, RepoResult, SqliteStore};
use crate::model::client::{fold_name, normalize_tax_id, CurrentClient};
use crate::model::{ClientId, SiteId};
use rusqlite::{params, Row};

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    sede_id,
    area_id,
    nombre_cliente,
    ruc,
    tipo_servicio,
    estado,
    fecha_registro
FROM clientes_actuales";

pub trait ClientRepository {
    fn create_client(&self, client: &CurrentClient) -> RepoResult<ClientId>;
    fn get_client(&self, id: ClientId) -> RepoResult<Option<CurrentClient>>;
    /// Lists clients sorted by name, optionally restricted to one site.
    fn list_clients(&self, site_id: Option<SiteId>) -> RepoResult<Vec<CurrentClient>>;
    /// Returns every client that overlaps the prospective client, across all sites.
    ///
    /// Blank inputs never match on their own: an empty name would otherwise be
    /// a substring of every stored name.
    fn find_conflicting_clients(
        &self,
        tax_id: &str,
        client_name: &str,
    ) -> RepoResult<Vec<CurrentClient>>;
}

impl ClientRepository for SqliteStore<'_> {
    fn create_client(&self, client: &CurrentClient) -> RepoResult<ClientId> {
        client.validate()?;
        if let Some(area_id) = client.area_id {
            match self.get_area(area_id)? {
                Some(area) if area.site_id == client.site_id => {}
                Some(area) => {
                    return Err(RepoError::InvalidData(format!(
                        "area {} belongs to site {}, not {}",
                        area.id, area.site_id, client.site_id
                    )));
                }
                None => {
                    return Err(RepoError::NotFound {
                        entity: "area",
                        id: area_id,
                    });
                }
            }
        }

        self.conn.execute(
            "INSERT INTO clientes_actuales (
                id,
                sede_id,
                area_id,
                nombre_cliente,
                ruc,
                tipo_servicio,
                estado,
                fecha_registro
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                client.id.to_string(),
                client.site_id.to_string(),
                opt_uuid_text(client.area_id),
                client.name.as_str(),
                normalize_tax_id(&client.tax_id),
                client.service_kind.as_deref(),
                client.status.as_deref(),
                client.registered_at,
            ],
        )?;
        Ok(client.id)
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<CurrentClient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLIENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_client_row(row)?));
        }
        Ok(None)
    }

    fn list_clients(&self, site_id: Option<SiteId>) -> RepoResult<Vec<CurrentClient>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE (?1 IS NULL OR sede_id = ?1)
             ORDER BY nombre_cliente ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([opt_uuid_text(site_id)])?;
        collect_clients(&mut rows)
    }

    fn find_conflicting_clients(
        &self,
        tax_id: &str,
        client_name: &str,
    ) -> RepoResult<Vec<CurrentClient>> {
        let tax_key = Some(normalize_tax_id(tax_id)).filter(|value| !value.is_empty());
        let name_key = Some(fold_name(client_name)).filter(|value| !value.is_empty());
        if tax_key.is_none() && name_key.is_none() {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE (?1 IS NOT NULL AND ruc = ?1)
                OR (?2 IS NOT NULL AND instr(fold_case(nombre_cliente), ?2) > 0)
             ORDER BY nombre_cliente ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![tax_key, name_key])?;
        collect_clients(&mut rows)
    }
}

fn collect_clients(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<CurrentClient>> {
    let mut clients = Vec::new();
    while let Some(row) = rows.next()? {
        clients.push(parse_client_row(row)?);
    }
    Ok(clients)
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<CurrentClient> {
    let client = CurrentClient {
        id: read_uuid(row, "id", "clientes_actuales")?,
        site_id: read_uuid(row, "sede_id", "clientes_actuales")?,
        area_id: read_optional_uuid(row, "area_id", "clientes_actuales")?,
        name: row.get("nombre_cliente")?,
        tax_id: row.get("ruc")?,
        service_kind: row.get("tipo_servicio")?,
        status: row.get("estado")?,
        registered_at: row.get("fecha_registro")?,
    };
    client.validate()?;
    Ok(client)
}
