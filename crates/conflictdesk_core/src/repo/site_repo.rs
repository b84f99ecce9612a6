//! Site and area persistence.

use super::{read_uuid, RepoError, RepoResult, SqliteStore};
use crate::model::site::{Area, Site};
use crate::model::{AreaId, SiteId};
use rusqlite::{params, Row};

const SITE_SELECT_SQL: &str = "SELECT id, nombre_sede, correo_contacto, direccion FROM sedes";
const AREA_SELECT_SQL: &str =
    "SELECT id, sede_id, nombre_area, responsable_area, correo_contacto FROM areas";

pub trait SiteRepository {
    fn create_site(&self, site: &Site) -> RepoResult<SiteId>;
    fn get_site(&self, id: SiteId) -> RepoResult<Option<Site>>;
    /// All sites sorted by name.
    fn list_sites(&self) -> RepoResult<Vec<Site>>;
    fn create_area(&self, area: &Area) -> RepoResult<()>;
    fn get_area(&self, id: AreaId) -> RepoResult<Option<Area>>;
    /// Areas of one site sorted by name.
    fn list_areas(&self, site_id: SiteId) -> RepoResult<Vec<Area>>;
}

impl SiteRepository for SqliteStore<'_> {
    fn create_site(&self, site: &Site) -> RepoResult<SiteId> {
        site.validate()?;
        self.conn.execute(
            "INSERT INTO sedes (id, nombre_sede, correo_contacto, direccion)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                site.id.to_string(),
                site.name.as_str(),
                site.contact_email.as_str(),
                site.address.as_deref(),
            ],
        )?;
        Ok(site.id)
    }

    fn get_site(&self, id: SiteId) -> RepoResult<Option<Site>> {
        let mut stmt = self.conn.prepare(&format!("{SITE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_site_row(row)?));
        }
        Ok(None)
    }

    fn list_sites(&self) -> RepoResult<Vec<Site>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SITE_SELECT_SQL} ORDER BY nombre_sede ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut sites = Vec::new();
        while let Some(row) = rows.next()? {
            sites.push(parse_site_row(row)?);
        }
        Ok(sites)
    }

    fn create_area(&self, area: &Area) -> RepoResult<()> {
        area.validate()?;
        if self.get_site(area.site_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "site",
                id: area.site_id,
            });
        }
        self.conn.execute(
            "INSERT INTO areas (id, sede_id, nombre_area, responsable_area, correo_contacto)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                area.id.to_string(),
                area.site_id.to_string(),
                area.name.as_str(),
                area.manager.as_deref(),
                area.contact_email.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn list_areas(&self, site_id: SiteId) -> RepoResult<Vec<Area>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AREA_SELECT_SQL} WHERE sede_id = ?1 ORDER BY nombre_area ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([site_id.to_string()])?;
        let mut areas = Vec::new();
        while let Some(row) = rows.next()? {
            areas.push(parse_area_row(row)?);
        }
        Ok(areas)
    }

    fn get_area(&self, id: AreaId) -> RepoResult<Option<Area>> {
        let mut stmt = self.conn.prepare(&format!("{AREA_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_area_row(row)?));
        }
        Ok(None)
    }
}

fn parse_site_row(row: &Row<'_>) -> RepoResult<Site> {
    Ok(Site {
        id: read_uuid(row, "id", "sedes")?,
        name: row.get("nombre_sede")?,
        contact_email: row.get("correo_contacto")?,
        address: row.get("direccion")?,
    })
}

fn parse_area_row(row: &Row<'_>) -> RepoResult<Area> {
    Ok(Area {
        id: read_uuid(row, "id", "areas")?,
        site_id: read_uuid(row, "sede_id", "areas")?,
        name: row.get("nombre_area")?,
        manager: row.get("responsable_area")?,
        contact_email: row.get("correo_contacto")?,
    })
}
