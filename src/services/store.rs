//! Document storage keyed by document id.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::models::{Document, DocumentSummary};

/// Persists raw document text keyed by id. `Ok(None)` is the normal
/// "not found" outcome, which queries surface as "no relevant information".
pub trait DocumentStore: Send + Sync {
    fn put(&self, document: &Document) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<Option<Document>, StoreError>;
    fn get_by_filename(&self, filename: &str) -> Result<Option<Document>, StoreError>;
    fn list(&self) -> Result<Vec<DocumentSummary>, StoreError>;
    fn count(&self) -> Result<u64, StoreError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    filename TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL,
    checksum TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// SQLite-backed document store.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::PathError(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> Result<T, StoreError> {
        let conn = match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&conn).map_err(StoreError::from)
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> Result<Document, rusqlite::Error> {
    Ok(Document {
        id: row.get(0)?,
        filename: row.get(1)?,
        content: row.get(2)?,
        checksum: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl DocumentStore for SqliteDocumentStore {
    fn put(&self, document: &Document) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            // Re-ingestion overwrites content under the same id; the original
            // created_at is preserved.
            conn.execute(
                "INSERT INTO documents (id, filename, content, checksum, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     content = excluded.content,
                     checksum = excluded.checksum,
                     updated_at = excluded.updated_at",
                params![
                    document.id,
                    document.filename,
                    document.content,
                    document.checksum,
                    document.created_at,
                    document.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, filename, content, checksum, created_at, updated_at
                 FROM documents WHERE id = ?1",
                params![id],
                row_to_document,
            )
            .optional()
        })
    }

    fn get_by_filename(&self, filename: &str) -> Result<Option<Document>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, filename, content, checksum, created_at, updated_at
                 FROM documents WHERE filename = ?1",
                params![filename],
                row_to_document,
            )
            .optional()
        })
    }

    fn list(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, filename, LENGTH(content), updated_at
                 FROM documents ORDER BY updated_at DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(DocumentSummary {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    size_chars: row.get::<_, i64>(2)? as u64,
                    updated_at: row.get(3)?,
                })
            })?;
            rows.collect()
        })
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
                row.get::<_, i64>(0).map(|n| n as u64)
            })
        })
    }
}

/// Volatile store for ephemeral sessions and tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Document>> {
        match self.documents.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn put(&self, document: &Document) -> Result<(), StoreError> {
        let mut documents = match self.documents.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.read().get(id).cloned())
    }

    fn get_by_filename(&self, filename: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .read()
            .values()
            .find(|d| d.filename == filename)
            .cloned())
    }

    fn list(&self) -> Result<Vec<DocumentSummary>, StoreError> {
        let mut summaries: Vec<DocumentSummary> =
            self.read().values().map(Document::summary).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn count(&self) -> Result<u64, StoreError> {
        Ok(self.read().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> Vec<Box<dyn DocumentStore>> {
        vec![
            Box::new(SqliteDocumentStore::open_in_memory().unwrap()),
            Box::new(InMemoryDocumentStore::new()),
        ]
    }

    #[test]
    fn test_put_get_roundtrip() {
        for store in stores() {
            let doc = Document::new("ipc.txt", "Section 302 defines murder.".to_string());
            store.put(&doc).unwrap();

            let fetched = store.get(&doc.id).unwrap().unwrap();
            assert_eq!(fetched.content, doc.content);
            assert_eq!(fetched.filename, "ipc.txt");

            let by_name = store.get_by_filename("ipc.txt").unwrap().unwrap();
            assert_eq!(by_name.id, doc.id);
        }
    }

    #[test]
    fn test_not_found_is_none_not_error() {
        for store in stores() {
            assert!(store.get("missing").unwrap().is_none());
            assert!(store.get_by_filename("missing.txt").unwrap().is_none());
        }
    }

    #[test]
    fn test_reingest_overwrites_content() {
        for store in stores() {
            let first = Document::new("ipc.txt", "old text here for the record".to_string());
            store.put(&first).unwrap();

            let second = Document::new("ipc.txt", "new text entirely different".to_string());
            store.put(&second).unwrap();

            assert_eq!(store.count().unwrap(), 1);
            let fetched = store.get(&first.id).unwrap().unwrap();
            assert_eq!(fetched.content, "new text entirely different");
        }
    }

    #[test]
    fn test_list_documents() {
        for store in stores() {
            store
                .put(&Document::new("a.txt", "first document body".to_string()))
                .unwrap();
            store
                .put(&Document::new("b.txt", "second document body".to_string()))
                .unwrap();

            let summaries = store.list().unwrap();
            assert_eq!(summaries.len(), 2);
            assert!(summaries.iter().any(|s| s.filename == "a.txt"));
        }
    }

    #[test]
    fn test_sqlite_store_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.db");

        let doc = Document::new("ipc.txt", "Section 302 defines murder.".to_string());
        {
            let store = SqliteDocumentStore::open(&path).unwrap();
            store.put(&doc).unwrap();
        }

        let reopened = SqliteDocumentStore::open(&path).unwrap();
        let fetched = reopened.get(&doc.id).unwrap().unwrap();
        assert_eq!(fetched.checksum, doc.checksum);
    }
}
