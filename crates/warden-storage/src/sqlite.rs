//! SQLite Database backend (sqlx).

use crate::database::Database;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use warden_core::{
    AccountBlock, AdminRecord, InvitationCode, IpForbiddenEntry, LoginFailure, StorageError,
    UserIpAllowEntry,
};

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to `url` (e.g. `sqlite://data/warden.sqlite` or `sqlite::memory:`),
    /// creating the file and schema if needed.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin the pool
        // to a single connection that never expires.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await.map_err(db_err)?;
        let db = Self { pool };
        db.migrate().await?;
        tracing::info!(url = %url, "connected to sqlite database");
        Ok(db)
    }

    /// Apply pending migrations from `migrations/`. Already-applied versions are skipped.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::backend)
    }
}

fn db_err(err: sqlx::Error) -> StorageError {
    StorageError::backend(err)
}

fn insert_err(err: sqlx::Error, key: &str) -> StorageError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StorageError::Duplicate(key.to_string())
        }
        _ => db_err(err),
    }
}

fn admin_from_row(row: &SqliteRow) -> Result<AdminRecord, sqlx::Error> {
    Ok(AdminRecord {
        account: row.try_get("account")?,
        user_id: row.try_get("user_id")?,
        password_hash: row.try_get("password_hash")?,
        nickname: row.try_get("nickname")?,
        created_at: row.try_get("created_at")?,
    })
}

fn ip_forbidden_from_row(row: &SqliteRow) -> Result<IpForbiddenEntry, sqlx::Error> {
    Ok(IpForbiddenEntry {
        ip: row.try_get("ip")?,
        limit_login: row.try_get("limit_login")?,
        limit_register: row.try_get("limit_register")?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_ip_from_row(row: &SqliteRow) -> Result<UserIpAllowEntry, sqlx::Error> {
    Ok(UserIpAllowEntry {
        user_id: row.try_get("user_id")?,
        ip: row.try_get("ip")?,
        created_at: row.try_get("created_at")?,
    })
}

fn block_from_row(row: &SqliteRow) -> Result<AccountBlock, sqlx::Error> {
    Ok(AccountBlock {
        user_id: row.try_get("user_id")?,
        reason: row.try_get("reason")?,
        operator_id: row.try_get("operator_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn invitation_from_row(row: &SqliteRow) -> Result<InvitationCode, sqlx::Error> {
    Ok(InvitationCode {
        code: row.try_get("code")?,
        used_by_user_id: row.try_get("used_by_user_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// `<prefix> (?, ?, ...)` with one bind per key.
fn in_list<'a>(prefix: &str, keys: &'a [String]) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(prefix);
    qb.push(" (");
    let mut sep = qb.separated(", ");
    for key in keys {
        sep.push_bind(key.as_str());
    }
    sep.push_unseparated(")");
    qb
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn get_admin_by_account(
        &self,
        account: &str,
    ) -> Result<Option<AdminRecord>, StorageError> {
        let row = sqlx::query(
            "SELECT account, user_id, password_hash, nickname, created_at FROM admins WHERE account = ?",
        )
        .bind(account)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(admin_from_row).transpose().map_err(db_err)
    }

    async fn create_admin(&self, admin: AdminRecord) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO admins (account, user_id, password_hash, nickname, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&admin.account)
        .bind(&admin.user_id)
        .bind(&admin.password_hash)
        .bind(&admin.nickname)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_err(e, &admin.account))?;
        Ok(())
    }

    async fn find_ip_forbidden(
        &self,
        ips: &[String],
    ) -> Result<Vec<IpForbiddenEntry>, StorageError> {
        if ips.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = in_list(
            "SELECT ip, limit_login, limit_register, created_at FROM ip_forbidden WHERE ip IN",
            ips,
        );
        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter()
            .map(ip_forbidden_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_err)
    }

    async fn upsert_ip_forbidden(
        &self,
        entries: Vec<IpForbiddenEntry>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for entry in &entries {
            sqlx::query(
                r#"INSERT INTO ip_forbidden (ip, limit_login, limit_register, created_at)
                   VALUES (?, ?, ?, ?)
                   ON CONFLICT (ip) DO UPDATE SET
                     limit_login = excluded.limit_login,
                     limit_register = excluded.limit_register,
                     created_at = excluded.created_at"#,
            )
            .bind(&entry.ip)
            .bind(entry.limit_login)
            .bind(entry.limit_register)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }

    async fn delete_ip_forbidden(&self, ips: &[String]) -> Result<u64, StorageError> {
        if ips.is_empty() {
            return Ok(0);
        }
        let mut qb = in_list("DELETE FROM ip_forbidden WHERE ip IN", ips);
        let res = qb.build().execute(&self.pool).await.map_err(db_err)?;
        Ok(res.rows_affected())
    }

    async fn list_ip_forbidden(&self) -> Result<Vec<IpForbiddenEntry>, StorageError> {
        let rows = sqlx::query(
            "SELECT ip, limit_login, limit_register, created_at FROM ip_forbidden ORDER BY ip",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(ip_forbidden_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_err)
    }

    async fn get_user_ip_allow(
        &self,
        user_id: &str,
        ip: &str,
    ) -> Result<Option<UserIpAllowEntry>, StorageError> {
        let row = sqlx::query(
            "SELECT user_id, ip, created_at FROM user_ip_allow WHERE user_id = ? AND ip = ?",
        )
        .bind(user_id)
        .bind(ip)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(user_ip_from_row).transpose().map_err(db_err)
    }

    async fn count_user_ip_allow(&self, user_id: &str) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_ip_allow WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }

    async fn add_user_ip_allow(
        &self,
        entries: Vec<UserIpAllowEntry>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for entry in &entries {
            sqlx::query(
                "INSERT INTO user_ip_allow (user_id, ip, created_at) VALUES (?, ?, ?) ON CONFLICT (user_id, ip) DO NOTHING",
            )
            .bind(&entry.user_id)
            .bind(&entry.ip)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }

    async fn delete_user_ip_allow(
        &self,
        user_id: &str,
        ips: &[String],
    ) -> Result<u64, StorageError> {
        if ips.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM user_ip_allow WHERE user_id = ");
        qb.push_bind(user_id).push(" AND ip IN (");
        let mut sep = qb.separated(", ");
        for ip in ips {
            sep.push_bind(ip.as_str());
        }
        sep.push_unseparated(")");
        let res = qb.build().execute(&self.pool).await.map_err(db_err)?;
        Ok(res.rows_affected())
    }

    async fn list_user_ip_allow(
        &self,
        user_id: &str,
    ) -> Result<Vec<UserIpAllowEntry>, StorageError> {
        let rows = sqlx::query(
            "SELECT user_id, ip, created_at FROM user_ip_allow WHERE user_id = ? ORDER BY ip",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(user_ip_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_err)
    }

    async fn get_account_block(
        &self,
        user_id: &str,
    ) -> Result<Option<AccountBlock>, StorageError> {
        let row = sqlx::query(
            "SELECT user_id, reason, operator_id, created_at FROM account_blocks WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(block_from_row).transpose().map_err(db_err)
    }

    async fn upsert_account_block(&self, blocks: Vec<AccountBlock>) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for block in &blocks {
            sqlx::query(
                r#"INSERT INTO account_blocks (user_id, reason, operator_id, created_at)
                   VALUES (?, ?, ?, ?)
                   ON CONFLICT (user_id) DO UPDATE SET
                     reason = excluded.reason,
                     operator_id = excluded.operator_id,
                     created_at = excluded.created_at"#,
            )
            .bind(&block.user_id)
            .bind(&block.reason)
            .bind(&block.operator_id)
            .bind(block.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)
    }

    async fn delete_account_block(&self, user_ids: &[String]) -> Result<u64, StorageError> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let mut qb = in_list("DELETE FROM account_blocks WHERE user_id IN", user_ids);
        let res = qb.build().execute(&self.pool).await.map_err(db_err)?;
        Ok(res.rows_affected())
    }

    async fn list_account_blocks(&self) -> Result<Vec<AccountBlock>, StorageError> {
        let rows = sqlx::query(
            "SELECT user_id, reason, operator_id, created_at FROM account_blocks ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(block_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_err)
    }

    async fn record_login_failure(&self, failure: LoginFailure) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO login_failures (account, ip, occurred_at) VALUES (?, ?, ?)")
            .bind(&failure.account)
            .bind(&failure.ip)
            .bind(failure.occurred_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn count_login_failures(
        &self,
        account: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM login_failures WHERE account = ? AND occurred_at >= ?",
        )
        .bind(account)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }

    async fn clear_login_failures(&self, account: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM login_failures WHERE account = ?")
            .bind(account)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_invitation_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<InvitationCode>, StorageError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = in_list(
            "SELECT code, used_by_user_id, created_at FROM invitation_codes WHERE code IN",
            codes,
        );
        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter()
            .map(invitation_from_row)
            .collect::<Result<_, _>>()
            .map_err(db_err)
    }

    async fn create_invitation_codes(
        &self,
        entries: Vec<InvitationCode>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for entry in &entries {
            sqlx::query(
                "INSERT INTO invitation_codes (code, used_by_user_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(&entry.code)
            .bind(&entry.used_by_user_id)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| insert_err(e, &entry.code))?;
        }
        // Dropping `tx` on an early return rolls the whole batch back.
        tx.commit().await.map_err(db_err)
    }

    async fn conditional_redeem(&self, code: &str, user_id: &str) -> Result<bool, StorageError> {
        let res = sqlx::query(
            "UPDATE invitation_codes SET used_by_user_id = ? WHERE code = ? AND used_by_user_id = ''",
        )
        .bind(user_id)
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_invitation_codes(&self, codes: &[String]) -> Result<u64, StorageError> {
        if codes.is_empty() {
            return Ok(0);
        }
        let mut qb = in_list("DELETE FROM invitation_codes WHERE code IN", codes);
        let res = qb.build().execute(&self.pool).await.map_err(db_err)?;
        Ok(res.rows_affected())
    }
}
