/*!
 * Repository layer for document operations.
 *
 * `DocumentStore` is the seam the admin controller talks to; `Repository`
 * implements it on top of SQLite. Writes are single-document except for
 * `set_batch`, which runs in one transaction.
 */

use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::connection::{DatabaseConnection, DatabaseStats};
use super::models::{Document, DocumentWrite, SortDirection};
use crate::errors::StoreError;

/// Document database operations
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` if absent
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully replace a document
    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<(), StoreError>;

    /// Merge top-level fields into an existing document
    ///
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Document, StoreError>;

    /// Delete a document; returns whether anything was removed
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// All documents of a collection, by id
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents having `field`, ordered by its value
    async fn query_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: SortDirection,
    ) -> Result<Vec<Document>, StoreError>;

    /// Apply several create-or-replace writes atomically
    async fn set_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError>;

    /// Per-collection document counts
    async fn stats(&self) -> Result<DatabaseStats, StoreError>;

    /// Human-readable location of the store
    fn location(&self) -> String;
}

/// SQLite-backed document store
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> anyhow::Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    fn parse_row(row: &rusqlite::Row) -> rusqlite::Result<(String, String, String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn into_document(raw: (String, String, String, String, String)) -> anyhow::Result<Document> {
        let (collection, id, data, created_at, updated_at) = raw;
        let data: Map<String, Value> = serde_json::from_str(&data)?;
        Ok(Document {
            collection,
            id,
            data,
            created_at,
            updated_at,
        })
    }

    fn get_sync(conn: &Connection, collection: &str, id: &str) -> anyhow::Result<Option<Document>> {
        let raw = conn
            .query_row(
                r#"
                SELECT collection, id, data, created_at, updated_at
                FROM documents WHERE collection = ?1 AND id = ?2
                "#,
                params![collection, id],
                Self::parse_row,
            )
            .optional()?;

        raw.map(Self::into_document).transpose()
    }

    fn upsert_sync(conn: &Connection, collection: &str, id: &str, data: &Map<String, Value>, now: &str) -> anyhow::Result<()> {
        conn.execute(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(collection, id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
            params![collection, id, serde_json::to_string(data)?, now],
        )?;
        Ok(())
    }

    fn collect_rows(stmt: &mut rusqlite::Statement, params: impl rusqlite::Params) -> anyhow::Result<Vec<Document>> {
        let rows = stmt
            .query_map(params, Self::parse_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(Self::into_document).collect()
    }
}

/// Field names are interpolated into a JSON path, so only plain identifiers pass
fn validate_field_name(field: &str) -> Result<(), StoreError> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!("unsupported field name '{}'", field)))
    }
}

#[async_trait]
impl DocumentStore for Repository {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collection = collection.to_string();
        let id = id.to_string();

        Ok(self
            .db
            .execute_async(move |conn| Self::get_sync(conn, &collection, &id))
            .await?)
    }

    async fn set(&self, collection: &str, id: &str, data: Map<String, Value>) -> Result<(), StoreError> {
        let collection = collection.to_string();
        let id = id.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        debug!("Writing document {}/{}", collection, id);

        Ok(self
            .db
            .execute_async(move |conn| Self::upsert_sync(conn, &collection, &id, &data, &now))
            .await?)
    }

    async fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<Document, StoreError> {
        let collection_owned = collection.to_string();
        let id_owned = id.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let updated = self
            .db
            .transaction_async(move |tx| {
                let Some(mut document) = Self::get_sync(tx, &collection_owned, &id_owned)? else {
                    return Ok(None);
                };

                for (key, value) in fields {
                    document.data.insert(key, value);
                }
                Self::upsert_sync(tx, &collection_owned, &id_owned, &document.data, &now)?;
                document.updated_at = now;

                Ok(Some(document))
            })
            .await?;

        updated.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let collection = collection.to_string();
        let id = id.to_string();

        Ok(self
            .db
            .execute_async(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                )?;
                Ok(deleted > 0)
            })
            .await?)
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collection = collection.to_string();

        Ok(self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT collection, id, data, created_at, updated_at
                    FROM documents WHERE collection = ?1
                    ORDER BY id
                    "#,
                )?;
                Self::collect_rows(&mut stmt, [&collection])
            })
            .await?)
    }

    async fn query_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: SortDirection,
    ) -> Result<Vec<Document>, StoreError> {
        validate_field_name(field)?;

        let collection = collection.to_string();
        let path = format!("$.{}", field);

        Ok(self
            .db
            .execute_async(move |conn| {
                // Documents without the field are excluded
                let sql = format!(
                    r#"
                    SELECT collection, id, data, created_at, updated_at
                    FROM documents
                    WHERE collection = ?1 AND json_type(data, ?2) IS NOT NULL
                    ORDER BY json_extract(data, ?2) {}, id
                    "#,
                    direction.as_sql()
                );
                let mut stmt = conn.prepare(&sql)?;
                Self::collect_rows(&mut stmt, params![collection, path])
            })
            .await?)
    }

    async fn set_batch(&self, writes: Vec<DocumentWrite>) -> Result<(), StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        debug!("Committing batch of {} document writes", writes.len());

        Ok(self
            .db
            .transaction_async(move |tx| {
                for write in &writes {
                    Self::upsert_sync(tx, &write.collection, &write.id, &write.data, &now)?;
                }
                Ok(())
            })
            .await?)
    }

    async fn stats(&self) -> Result<DatabaseStats, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.stats())
            .await
            .map_err(|e| StoreError::Database(format!("Database task panicked: {}", e)))?
            .map_err(StoreError::from)
    }

    fn location(&self) -> String {
        self.db.path().display().to_string()
    }
}
