//! PostgreSQL-backed contact store
//!
//! Resolutions are serialized with a transaction-scoped advisory lock, so two
//! submissions touching overlapping clusters can never interleave their
//! read-modify-write steps. The lock is released on commit or rollback.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};

use shared::{Contact, ContactId, LinkPrecedence, NewContact, ProcessId, process_info};

use crate::error::{ReconcilerError, ReconcilerResult};
use crate::traits::{ContactQuery, ContactStore, ContactTransaction};

/// Advisory lock key shared by every resolution
const RESOLUTION_LOCK_KEY: i64 = 0x1d3e_c0de;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id              BIGSERIAL PRIMARY KEY,
    phone_number    TEXT,
    email           TEXT,
    linked_id       BIGINT REFERENCES contacts (id),
    link_precedence TEXT NOT NULL CHECK (link_precedence IN ('primary', 'secondary')),
    created_at      TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
    deleted_at      TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS contacts_email_idx ON contacts (email);
CREATE INDEX IF NOT EXISTS contacts_phone_number_idx ON contacts (phone_number);
CREATE INDEX IF NOT EXISTS contacts_linked_id_idx ON contacts (linked_id);
"#;

const CONTACT_COLUMNS: &str =
    "id, email, phone_number, linked_id, link_precedence, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct PostgresContactStore {
    pool: PgPool,
}

impl PostgresContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> ReconcilerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the contacts table and its lookup indexes if missing
    pub async fn ensure_schema(&self) -> ReconcilerResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        process_info!(ProcessId::current(), "🗄️ Contacts schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ContactStore for PostgresContactStore {
    async fn begin(&self) -> ReconcilerResult<Box<dyn ContactTransaction>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(RESOLUTION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PostgresTransaction { tx: Some(tx) }))
    }
}

/// Open database transaction; rolls back when dropped uncommitted
pub struct PostgresTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresTransaction {
    fn tx(&mut self) -> ReconcilerResult<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().ok_or(ReconcilerError::TransactionClosed)
    }
}

fn contact_from_row(row: &PgRow) -> ReconcilerResult<Contact> {
    let precedence: String = row.try_get("link_precedence")?;
    Ok(Contact {
        id: ContactId(row.try_get("id")?),
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        linked_id: row.try_get::<Option<i64>, _>("linked_id")?.map(ContactId),
        link_precedence: precedence.parse::<LinkPrecedence>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait::async_trait]
impl ContactTransaction for PostgresTransaction {
    async fn find_by_email_or_phone(&mut self, query: &ContactQuery) -> ReconcilerResult<Vec<Contact>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts \
             WHERE deleted_at IS NULL AND (email = $1 OR phone_number = $2) \
             ORDER BY id"
        );
        let rows = sqlx::query(&sql)
            .bind(query.email.as_deref())
            .bind(query.phone_number.as_deref())
            .fetch_all(&mut **self.tx()?)
            .await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn find_cluster(&mut self, root_id: ContactId) -> ReconcilerResult<Vec<Contact>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts \
             WHERE deleted_at IS NULL AND (id = $1 OR linked_id = $1) \
             ORDER BY id"
        );
        let rows = sqlx::query(&sql)
            .bind(root_id.value())
            .fetch_all(&mut **self.tx()?)
            .await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn insert(&mut self, contact: NewContact) -> ReconcilerResult<Contact> {
        let sql = format!(
            "INSERT INTO contacts (email, phone_number, linked_id, link_precedence) \
             VALUES ($1, $2, $3, $4) RETURNING {CONTACT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(contact.email)
            .bind(contact.phone_number)
            .bind(contact.linked_id.map(|id| id.value()))
            .bind(contact.link_precedence.as_str())
            .fetch_one(&mut **self.tx()?)
            .await?;
        contact_from_row(&row)
    }

    async fn update(&mut self, contact: &Contact) -> ReconcilerResult<()> {
        let result = sqlx::query(
            "UPDATE contacts SET link_precedence = $2, linked_id = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(contact.id.value())
        .bind(contact.link_precedence.as_str())
        .bind(contact.linked_id.map(|id| id.value()))
        .bind(contact.updated_at)
        .execute(&mut **self.tx()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ReconcilerError::ContactNotFound { id: contact.id });
        }
        Ok(())
    }

    async fn commit(&mut self) -> ReconcilerResult<()> {
        let tx = self.tx.take().ok_or(ReconcilerError::TransactionClosed)?;
        tx.commit().await?;
        Ok(())
    }
}
