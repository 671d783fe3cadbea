//! libSQL-backed configuration store.
//!
//! Works against a local SQLite file or a remote Turso database. Every
//! statement binds its inputs as positional parameters; no value is ever
//! spliced into SQL text.

use async_trait::async_trait;
use libsql::{params, Builder, Connection, Database};
use tracing::{debug, info, instrument};

use keel_core::error::{KeelError, Result};
use keel_core::traits::ConfigStore;
use keel_core::types::{CompanyConfig, EmailCadence, HubSpotField, NewCadence, NewField};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS hubspot_fields (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id TEXT NOT NULL,
    field_name TEXT NOT NULL,
    field_type TEXT NOT NULL,
    field_value TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (company_id, field_name)
);

CREATE INDEX IF NOT EXISTS idx_hubspot_fields_company ON hubspot_fields (company_id);

CREATE TABLE IF NOT EXISTS upso_email_cadences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id TEXT NOT NULL,
    cadence_id TEXT NOT NULL UNIQUE,
    template TEXT NOT NULL,
    delay_hours INTEGER NOT NULL CHECK (delay_hours >= 0),
    modified_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_upso_email_cadences_company ON upso_email_cadences (company_id);
"#;

/// Maps a libSQL failure onto the store taxonomy.
fn store_err(err: libsql::Error) -> KeelError {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed") {
        KeelError::ConstraintViolation(message)
    } else {
        KeelError::StoreError(message)
    }
}

fn column_err(err: libsql::Error) -> KeelError {
    KeelError::StoreError(format!("unexpected column value: {err}"))
}

/// Configuration store on libSQL.
///
/// Holds a single long-lived connection shared by every caller.
pub struct SqlStore {
    // Keeps the database handle alive for the connection's lifetime.
    _db: Database,
    conn: Connection,
}

impl SqlStore {
    /// Opens a store from a URL.
    ///
    /// `libsql://`, `http://` and `https://` URLs connect to a remote
    /// database with the optional auth token; anything else is treated as a
    /// local file path (a leading `file:` is stripped).
    pub async fn connect(url: &str, auth_token: Option<String>) -> Result<Self> {
        let db = if url.starts_with("libsql://") || url.starts_with("http://") || url.starts_with("https://") {
            info!(url, "Connecting to remote libSQL database");
            Builder::new_remote(url.to_string(), auth_token.unwrap_or_default())
                .build()
                .await
                .map_err(store_err)?
        } else {
            let path = url.strip_prefix("file:").unwrap_or(url);
            info!(path, "Opening local libSQL database");
            Builder::new_local(path).build().await.map_err(store_err)?
        };

        let conn = db.connect().map_err(store_err)?;
        Ok(Self { _db: db, conn })
    }

    /// Provisions the schema. Safe to run repeatedly.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA).await.map_err(store_err)?;
        debug!("Schema provisioned");
        Ok(())
    }

    async fn load_fields(&self, company_id: &str) -> Result<Vec<HubSpotField>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, company_id, field_name, field_type, field_value \
                 FROM hubspot_fields WHERE company_id = ?1 ORDER BY id",
                params![company_id],
            )
            .await
            .map_err(store_err)?;

        let mut fields = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            fields.push(HubSpotField {
                id: row.get::<i64>(0).map_err(column_err)?,
                company_id: row.get::<String>(1).map_err(column_err)?,
                name: row.get::<String>(2).map_err(column_err)?,
                field_type: row.get::<String>(3).map_err(column_err)?,
                value: row.get::<String>(4).map_err(column_err)?,
            });
        }
        Ok(fields)
    }

    async fn load_cadences(&self, company_id: &str) -> Result<Vec<EmailCadence>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, company_id, cadence_id, template, delay_hours \
                 FROM upso_email_cadences WHERE company_id = ?1 ORDER BY id",
                params![company_id],
            )
            .await
            .map_err(store_err)?;

        let mut cadences = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            let delay = row.get::<i64>(4).map_err(column_err)?;
            cadences.push(EmailCadence {
                id: row.get::<i64>(0).map_err(column_err)?,
                company_id: row.get::<String>(1).map_err(column_err)?,
                cadence_id: row.get::<String>(2).map_err(column_err)?,
                template: row.get::<String>(3).map_err(column_err)?,
                delay_hours: u32::try_from(delay)
                    .map_err(|_| KeelError::StoreError(format!("delay_hours out of range: {delay}")))?,
            });
        }
        Ok(cadences)
    }

    async fn returning_id(&self, sql: &str, params: impl libsql::params::IntoParams) -> Result<i64> {
        let mut rows = self.conn.query(sql, params).await.map_err(store_err)?;
        let row = rows
            .next()
            .await
            .map_err(store_err)?
            .ok_or_else(|| KeelError::StoreError("insert returned no row".into()))?;
        row.get::<i64>(0).map_err(column_err)
    }
}

#[async_trait]
impl ConfigStore for SqlStore {
    #[instrument(skip(self, field), fields(company_id = %field.company_id, name = %field.name))]
    async fn insert_field(&self, field: &NewField) -> Result<HubSpotField> {
        let id = self
            .returning_id(
                "INSERT INTO hubspot_fields (company_id, field_name, field_type, field_value) \
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![
                    field.company_id.as_str(),
                    field.name.as_str(),
                    field.field_type.as_str(),
                    field.value.as_str()
                ],
            )
            .await?;

        debug!(id, "Inserted field");
        Ok(field.clone().into_field(id))
    }

    #[instrument(skip(self))]
    async fn rename_field(&self, company_id: &str, old_name: &str, new_name: &str) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE hubspot_fields SET field_name = ?1, updated_at = CURRENT_TIMESTAMP \
                 WHERE company_id = ?2 AND field_name = ?3",
                params![new_name, company_id, old_name],
            )
            .await
            .map_err(store_err)
    }

    #[instrument(skip(self))]
    async fn delete_field(&self, company_id: &str, name: &str) -> Result<u64> {
        self.conn
            .execute(
                "DELETE FROM hubspot_fields WHERE company_id = ?1 AND field_name = ?2",
                params![company_id, name],
            )
            .await
            .map_err(store_err)
    }

    #[instrument(skip(self, cadence), fields(company_id = %cadence.company_id, cadence_id = %cadence.cadence_id))]
    async fn insert_cadence(&self, cadence: &NewCadence) -> Result<EmailCadence> {
        let id = self
            .returning_id(
                "INSERT INTO upso_email_cadences (company_id, cadence_id, template, delay_hours) \
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![
                    cadence.company_id.as_str(),
                    cadence.cadence_id.as_str(),
                    cadence.template.as_str(),
                    i64::from(cadence.delay_hours)
                ],
            )
            .await?;

        debug!(id, "Inserted cadence");
        Ok(cadence.clone().into_cadence(id))
    }

    #[instrument(skip(self, template))]
    async fn update_cadence(
        &self,
        company_id: &str,
        cadence_id: &str,
        template: &str,
        delay_hours: u32,
    ) -> Result<u64> {
        self.conn
            .execute(
                "UPDATE upso_email_cadences \
                 SET template = ?1, delay_hours = ?2, modified_at = CURRENT_TIMESTAMP \
                 WHERE company_id = ?3 AND cadence_id = ?4",
                params![template, i64::from(delay_hours), company_id, cadence_id],
            )
            .await
            .map_err(store_err)
    }

    #[instrument(skip(self))]
    async fn load_company(&self, company_id: &str) -> Result<CompanyConfig> {
        Ok(CompanyConfig {
            company_id: company_id.to_string(),
            hubspot_fields: self.load_fields(company_id).await?,
            upso_cadences: self.load_cadences(company_id).await?,
        })
    }
}
