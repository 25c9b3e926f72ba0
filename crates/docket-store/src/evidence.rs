//! SQLite-backed evidence store

use crate::StoreError;
use docket_domain::traits::EvidenceStore;
use docket_domain::{EvidenceHandle, EvidenceRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS evidence (
    id            TEXT PRIMARY KEY,
    case_id       TEXT NOT NULL,
    claim_id      TEXT NOT NULL,
    description   TEXT NOT NULL,
    evidence_type TEXT NOT NULL,
    confidence    REAL NOT NULL,
    supports      TEXT NOT NULL,
    submitted_at  INTEGER NOT NULL,
    seq           INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_evidence_case ON evidence (case_id, seq);
";

/// SQLite implementation of [`EvidenceStore`]
///
/// `supports` keys are stored as a JSON array. Listing returns records in
/// insertion order.
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own store.
pub struct SqliteEvidenceStore {
    conn: Connection,
}

impl SqliteEvidenceStore {
    /// Open (or create) a store at `path`; use `:memory:` for tests
    ///
    /// # Examples
    ///
    /// ```
    /// use docket_store::SqliteEvidenceStore;
    ///
    /// let store = SqliteEvidenceStore::new(":memory:").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Look up one record by id
    pub fn get_evidence(&self, evidence_id: &str) -> Result<Option<EvidenceRecord>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, case_id, claim_id, description, evidence_type, confidence, supports, submitted_at
                 FROM evidence WHERE id = ?1",
                params![evidence_id],
                row_to_parts,
            )
            .optional()?;
        row.map(parts_to_record).transpose()
    }

    /// Number of records stored for a case
    pub fn count_for_case(&self, case_id: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM evidence WHERE case_id = ?1",
            params![case_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

type RowParts = (String, String, String, String, String, f64, String, i64);

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<RowParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn parts_to_record(parts: RowParts) -> Result<EvidenceRecord, StoreError> {
    let (id, case_id, claim_id, description, evidence_type, confidence, supports, submitted_at) = parts;
    let supports: Vec<String> = serde_json::from_str(&supports)?;
    Ok(EvidenceRecord {
        id,
        case_id,
        claim_id,
        description,
        evidence_type,
        confidence,
        supports,
        submitted_at: submitted_at as u64,
    })
}

impl EvidenceStore for SqliteEvidenceStore {
    type Error = StoreError;

    fn store_evidence(&mut self, record: &EvidenceRecord) -> Result<EvidenceHandle, Self::Error> {
        let exists: bool = self
            .conn
            .query_row("SELECT 1 FROM evidence WHERE id = ?1", params![&record.id], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if exists {
            return Err(StoreError::InvalidData(format!(
                "Evidence already stored: {}",
                record.id
            )));
        }

        let supports = serde_json::to_string(&record.supports)?;
        let seq: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM evidence", [], |row| row.get(0))?;

        self.conn.execute(
            "INSERT INTO evidence (id, case_id, claim_id, description, evidence_type, confidence, supports, submitted_at, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &record.id,
                &record.case_id,
                &record.claim_id,
                &record.description,
                &record.evidence_type,
                record.confidence,
                supports,
                record.submitted_at as i64,
                seq,
            ],
        )?;

        debug!(evidence_id = %record.id, case_id = %record.case_id, "Evidence stored");

        Ok(EvidenceHandle {
            evidence_id: record.id.clone(),
            case_id: record.case_id.clone(),
        })
    }

    fn list_evidence(&self, case_id: &str) -> Result<Vec<EvidenceRecord>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, case_id, claim_id, description, evidence_type, confidence, supports, submitted_at
             FROM evidence WHERE case_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt
            .query_map(params![case_id], row_to_parts)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(parts_to_record).collect()
    }
}
