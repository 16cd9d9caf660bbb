// PostgreSQL repository
//
// Each record is stored whole as a JSONB document, with the columns needed
// for lookups and ordering pulled out next to it.

use crate::change::{ChangeRequest, SetChangeRequest};
use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{NewCard, NewSet, Planeswalker, SubmissionStatus, UserCard};
use crate::repository::{amount_out_of_range, Repository};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::Json;
use tokio_postgres::NoTls;
use tracing::info;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS planeswalkers (
        id UUID PRIMARY KEY,
        user_name TEXT NOT NULL,
        email TEXT NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_planeswalkers_user_name ON planeswalkers (LOWER(user_name))",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_planeswalkers_email ON planeswalkers (LOWER(email))",
    "CREATE TABLE IF NOT EXISTS new_cards (
        id UUID PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS new_sets (
        id UUID PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS card_changes (
        id UUID PRIMARY KEY,
        mvid INTEGER NOT NULL,
        version INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_card_changes_mvid ON card_changes (mvid)",
    "CREATE TABLE IF NOT EXISTS set_changes (
        id UUID PRIMARY KEY,
        set_id TEXT NOT NULL,
        version INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_set_changes_set_id ON set_changes (UPPER(set_id))",
    "CREATE TABLE IF NOT EXISTS user_cards (
        user_id UUID NOT NULL,
        mvid INTEGER NOT NULL,
        card_set_id TEXT NOT NULL,
        amount INTEGER NOT NULL,
        PRIMARY KEY (user_id, mvid)
    )",
];

fn conflict_or(e: tokio_postgres::Error, what: &str) -> AppError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        AppError::Conflict(format!("{} already registered", what))
    } else {
        AppError::Database(e)
    }
}

// Repository backed by a deadpool-postgres pool
pub struct PgRepository {
    pool: Pool,
}

impl PgRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    // Create the pool, verify the connection and make sure the tables exist
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let mut cfg = Config::new();
        cfg.url = Some(config.url.clone());
        cfg.pool = Some(PoolConfig::new(config.max_pool_size));
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        // Hosted databases (Neon etc.) require TLS
        let use_tls = config.url.contains("sslmode=require") || config.url.contains("neon.tech");

        let pool = if use_tls {
            let certs = rustls_native_certs::load_native_certs();
            let mut root_store = rustls::RootCertStore::empty();
            for cert in certs.certs {
                root_store.add(cert).ok();
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
            cfg.create_pool(Some(Runtime::Tokio1), tls)
        } else {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        }
        .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))?;

        let repo = Self::new(pool);
        repo.create_tables().await?;

        info!("Change request store ready (TLS: {})", use_tls);
        Ok(repo)
    }

    // Create tables if they don't exist
    pub async fn create_tables(&self) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        for statement in SCHEMA {
            client.execute(*statement, &[]).await?;
        }
        Ok(())
    }

    async fn docs<T>(&self, sql: &str, params: &[&(dyn tokio_postgres::types::ToSql + Sync)]) -> Result<Vec<T>, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let client = self.pool.get().await?;
        let rows = client.query(sql, params).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let Json(doc): Json<T> = row.get(0);
                doc
            })
            .collect())
    }

    async fn doc<T>(&self, sql: &str, id: Uuid) -> Result<Option<T>, AppError>
    where
        T: serde::de::DeserializeOwned,
    {
        let client = self.pool.get().await?;
        let row = client.query_opt(sql, &[&id]).await?;
        Ok(row.map(|r| {
            let Json(doc): Json<T> = r.get(0);
            doc
        }))
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn add_planeswalker(&self, walker: Planeswalker) -> Result<Planeswalker, AppError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO planeswalkers (id, user_name, email, doc) VALUES ($1, $2, $3, $4)",
                &[&walker.id, &walker.user_name, &walker.email, &Json(&walker)],
            )
            .await
            .map_err(|e| conflict_or(e, "User name or email"))?;
        Ok(walker)
    }

    async fn get_planeswalker(&self, id: Uuid) -> Result<Option<Planeswalker>, AppError> {
        self.doc("SELECT doc FROM planeswalkers WHERE id = $1", id).await
    }

    async fn find_planeswalker(&self, user_name: &str) -> Result<Option<Planeswalker>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT doc FROM planeswalkers WHERE LOWER(user_name) = LOWER($1)",
                &[&user_name],
            )
            .await?;
        Ok(row.map(|r| {
            let Json(walker): Json<Planeswalker> = r.get(0);
            walker
        }))
    }

    async fn update_planeswalker(&self, mut walker: Planeswalker) -> Result<Planeswalker, AppError> {
        walker.updated_at = Utc::now();
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE planeswalkers SET user_name = $2, email = $3, doc = $4 WHERE id = $1",
                &[&walker.id, &walker.user_name, &walker.email, &Json(&walker)],
            )
            .await
            .map_err(|e| conflict_or(e, "Email"))?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Planeswalker {} not found", walker.id)));
        }
        Ok(walker)
    }

    async fn remove_planeswalker(&self, id: Uuid) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM planeswalkers WHERE id = $1", &[&id])
            .await?;
        if removed == 0 {
            return Err(AppError::NotFound(format!("Planeswalker {} not found", id)));
        }
        Ok(())
    }

    async fn add_card(&self, mut card: NewCard) -> Result<Uuid, AppError> {
        if card.id.is_nil() {
            card.id = Uuid::new_v4();
        }
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO new_cards (id, created_at, doc) VALUES ($1, $2, $3)",
                &[&card.id, &card.created_at, &Json(&card)],
            )
            .await?;
        Ok(card.id)
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<NewCard>, AppError> {
        self.doc("SELECT doc FROM new_cards WHERE id = $1", id).await
    }

    async fn get_new_cards(&self) -> Result<Vec<NewCard>, AppError> {
        self.docs("SELECT doc FROM new_cards ORDER BY created_at DESC", &[]).await
    }

    async fn update_new_card_status(&self, id: Uuid, status: SubmissionStatus) -> Result<NewCard, AppError> {
        let mut card = self
            .get_card(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("New card {} not found", id)))?;
        card.status = status;

        let client = self.pool.get().await?;
        client
            .execute("UPDATE new_cards SET doc = $2 WHERE id = $1", &[&id, &Json(&card)])
            .await?;
        Ok(card)
    }

    async fn add_set(&self, mut set: NewSet) -> Result<Uuid, AppError> {
        if set.id.is_nil() {
            set.id = Uuid::new_v4();
        }
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO new_sets (id, created_at, doc) VALUES ($1, $2, $3)",
                &[&set.id, &set.created_at, &Json(&set)],
            )
            .await?;
        Ok(set.id)
    }

    async fn get_set(&self, id: Uuid) -> Result<Option<NewSet>, AppError> {
        self.doc("SELECT doc FROM new_sets WHERE id = $1", id).await
    }

    async fn get_new_sets(&self) -> Result<Vec<NewSet>, AppError> {
        self.docs("SELECT doc FROM new_sets ORDER BY created_at DESC", &[]).await
    }

    async fn update_new_set_status(&self, id: Uuid, status: SubmissionStatus) -> Result<NewSet, AppError> {
        let mut set = self
            .get_set(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("New set {} not found", id)))?;
        set.status = status;

        let client = self.pool.get().await?;
        client
            .execute("UPDATE new_sets SET doc = $2 WHERE id = $1", &[&id, &Json(&set)])
            .await?;
        Ok(set)
    }

    async fn add_card_change_request(&self, mut change: ChangeRequest) -> Result<Uuid, AppError> {
        if change.id.is_nil() {
            change.id = Uuid::new_v4();
        }
        let version = change.lifecycle.version as i32;
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO card_changes (id, mvid, version, created_at, doc) VALUES ($1, $2, $3, $4, $5)",
                &[&change.id, &change.mvid, &version, &change.lifecycle.created_at, &Json(&change)],
            )
            .await?;
        Ok(change.id)
    }

    async fn get_card_change_request(&self, id: Uuid) -> Result<Option<ChangeRequest>, AppError> {
        self.doc("SELECT doc FROM card_changes WHERE id = $1", id).await
    }

    async fn get_card_change_requests(&self, mvid: i32) -> Result<Vec<ChangeRequest>, AppError> {
        self.docs(
            "SELECT doc FROM card_changes WHERE mvid = $1 ORDER BY version ASC, created_at ASC",
            &[&mvid],
        )
        .await
    }

    async fn get_change_requests(&self) -> Result<Vec<ChangeRequest>, AppError> {
        self.docs("SELECT doc FROM card_changes ORDER BY created_at DESC", &[]).await
    }

    async fn update_card_change_request(&self, change: ChangeRequest) -> Result<ChangeRequest, AppError> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE card_changes SET doc = $2 WHERE id = $1",
                &[&change.id, &Json(&change)],
            )
            .await?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Change request {} not found", change.id)));
        }
        Ok(change)
    }

    async fn add_set_change_request(&self, mut change: SetChangeRequest) -> Result<Uuid, AppError> {
        if change.id.is_nil() {
            change.id = Uuid::new_v4();
        }
        let version = change.lifecycle.version as i32;
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO set_changes (id, set_id, version, created_at, doc) VALUES ($1, $2, $3, $4, $5)",
                &[&change.id, &change.set_id, &version, &change.lifecycle.created_at, &Json(&change)],
            )
            .await?;
        Ok(change.id)
    }

    async fn get_set_change_request(&self, id: Uuid) -> Result<Option<SetChangeRequest>, AppError> {
        self.doc("SELECT doc FROM set_changes WHERE id = $1", id).await
    }

    async fn get_card_set_change_requests(&self, set_id: &str) -> Result<Vec<SetChangeRequest>, AppError> {
        self.docs(
            "SELECT doc FROM set_changes WHERE UPPER(set_id) = UPPER($1) ORDER BY version ASC, created_at ASC",
            &[&set_id],
        )
        .await
    }

    async fn get_set_change_requests(&self) -> Result<Vec<SetChangeRequest>, AppError> {
        self.docs("SELECT doc FROM set_changes ORDER BY created_at DESC", &[]).await
    }

    async fn update_set_change_request(&self, change: SetChangeRequest) -> Result<SetChangeRequest, AppError> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE set_changes SET doc = $2 WHERE id = $1",
                &[&change.id, &Json(&change)],
            )
            .await?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Set change request {} not found", change.id)));
        }
        Ok(change)
    }

    async fn add_user_card(
        &self,
        user_id: Uuid,
        mvid: i32,
        card_set_id: &str,
        amount: i32,
    ) -> Result<UserCard, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO user_cards (user_id, mvid, card_set_id, amount) VALUES ($1, $2, $3, $4)
                 ON CONFLICT (user_id, mvid) DO UPDATE SET amount = user_cards.amount + EXCLUDED.amount
                 RETURNING user_id, mvid, card_set_id, amount",
                &[&user_id, &mvid, &card_set_id, &amount],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::NUMERIC_VALUE_OUT_OF_RANGE) {
                    amount_out_of_range(mvid)
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(UserCard {
            user_id: row.get(0),
            mvid: row.get(1),
            card_set_id: row.get(2),
            amount: row.get(3),
        })
    }

    async fn get_user_cards(&self, user_id: Uuid, mvids: &[i32]) -> Result<Vec<UserCard>, AppError> {
        let client = self.pool.get().await?;
        let mvids = mvids.to_vec();
        let rows = client
            .query(
                "SELECT user_id, mvid, card_set_id, amount FROM user_cards
                 WHERE user_id = $1 AND mvid = ANY($2) ORDER BY mvid",
                &[&user_id, &mvids],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| UserCard {
                user_id: r.get(0),
                mvid: r.get(1),
                card_set_id: r.get(2),
                amount: r.get(3),
            })
            .collect())
    }

    async fn get_user_cards_by_set(&self, user_id: Uuid, set_id: &str) -> Result<Vec<UserCard>, AppError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT user_id, mvid, card_set_id, amount FROM user_cards
                 WHERE user_id = $1 AND UPPER(card_set_id) = UPPER($2) ORDER BY mvid",
                &[&user_id, &set_id],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| UserCard {
                user_id: r.get(0),
                mvid: r.get(1),
                card_set_id: r.get(2),
                amount: r.get(3),
            })
            .collect())
    }
}
