//! PostgreSQL store: table DDL and transactional ownership-scoped queries.

use super::{duplicate_name, duplicate_username, Store};
use crate::error::{is_unique_violation, AppError};
use crate::model::{Item, ItemFields, Session, SessionUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{ConnectOptions, PgConnection, PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Columns selected or returned for an item; `s` aliases the stuff table.
const ITEM_COLUMNS: &str =
    "s.itemid, s.itemname, s.quantity, s.itemtype, s.itemvalue::float8 AS itemvalue, s.location";

#[derive(Clone, Debug)]
struct Tables {
    schema: String,
    users: String,
    stuff: String,
    owns: String,
    sessions: String,
}

impl Tables {
    fn new(schema: &str) -> Self {
        let q = quote_ident(schema);
        Tables {
            schema: q.clone(),
            users: format!("{}.users", q),
            stuff: format!("{}.stuff", q),
            owns: format!("{}.usersownstuff", q),
            sessions: format!("{}.sessions", q),
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    tables: Tables,
}

impl PgStore {
    /// `schema` must already be a validated identifier (see `AppConfig`).
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgStore {
            pool,
            tables: Tables::new(schema),
        }
    }

    /// Create the schema and tables if they do not exist.
    pub async fn ensure_tables(&self) -> Result<(), AppError> {
        let t = &self.tables;
        let statements = [
            format!("CREATE SCHEMA IF NOT EXISTS {}", t.schema),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    userid SERIAL PRIMARY KEY,
                    username TEXT NOT NULL UNIQUE,
                    password TEXT NOT NULL
                )
                "#,
                t.users
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    itemid SERIAL PRIMARY KEY,
                    itemname TEXT NOT NULL CHECK (itemname <> ''),
                    quantity INTEGER CHECK (quantity >= 0),
                    itemtype TEXT,
                    itemvalue NUMERIC(12, 2),
                    location TEXT
                )
                "#,
                t.stuff
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    ownerid INTEGER NOT NULL REFERENCES {}(userid) ON DELETE CASCADE,
                    itemid INTEGER NOT NULL UNIQUE REFERENCES {}(itemid) ON DELETE CASCADE,
                    PRIMARY KEY (ownerid, itemid)
                )
                "#,
                t.owns, t.users, t.stuff
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    sessionid UUID PRIMARY KEY,
                    userid INTEGER NOT NULL REFERENCES {}(userid) ON DELETE CASCADE,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    expires_at TIMESTAMPTZ NOT NULL
                )
                "#,
                t.sessions, t.users
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS sessions_userid_idx ON {} (userid)",
                t.sessions
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS sessions_expires_at_idx ON {} (expires_at)",
                t.sessions
            ),
        ];
        for ddl in &statements {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        tracing::info!(schema = %t.schema, "tables ready");
        Ok(())
    }

    /// Row-lock the owner so concurrent writes to one collection serialize.
    async fn lock_owner(&self, conn: &mut PgConnection, owner_id: i32) -> Result<(), AppError> {
        let sql = format!("SELECT userid FROM {} WHERE userid = $1 FOR UPDATE", self.tables.users);
        let found = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_optional(&mut *conn)
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Can't find user {}", owner_id))),
        }
    }

    /// True when the owner holds an item named `name` other than `except`.
    async fn name_taken(
        &self,
        conn: &mut PgConnection,
        owner_id: i32,
        name: &str,
        except: Option<i32>,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT s.itemid FROM {} s JOIN {} o ON o.itemid = s.itemid \
             WHERE o.ownerid = $1 AND s.itemname = $2 AND ($3::int IS NULL OR s.itemid <> $3) LIMIT 1",
            self.tables.stuff, self.tables.owns
        );
        let row = sqlx::query(&sql)
            .bind(owner_id)
            .bind(name)
            .bind(except)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT userid, username, password FROM {} WHERE username = $1 LIMIT 1",
            self.tables.users
        );
        tracing::debug!(sql = %sql, "query");
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(User {
                user_id: r.try_get("userid")?,
                username: r.try_get("username")?,
                password_hash: r.try_get("password")?,
            }),
            None => None,
        })
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<i32, AppError> {
        let sql = format!(
            "INSERT INTO {} (username, password) VALUES ($1, $2) RETURNING userid",
            self.tables.users
        );
        tracing::debug!(sql = %sql, "query");
        let inserted: Result<(i32,), sqlx::Error> = sqlx::query_as(&sql)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await;
        match inserted {
            Ok((id,)) => Ok(id),
            Err(e) if is_unique_violation(&e) => Err(duplicate_username(username)),
            Err(e) => Err(AppError::Db(e)),
        }
    }

    async fn create_session(
        &self,
        user_id: i32,
        replaces: Option<Uuid>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let t = &self.tables;
        let session_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;
        if let Some(old) = replaces {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE sessionid = $1 AND userid = $2",
                t.sessions
            ))
            .bind(old)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        let purged = sqlx::query(&format!("DELETE FROM {} WHERE expires_at <= NOW()", t.sessions))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "expired sessions removed");
        }
        sqlx::query(&format!(
            "INSERT INTO {} (sessionid, userid, expires_at) VALUES ($1, $2, $3)",
            t.sessions
        ))
        .bind(session_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Session {
            session_id,
            user_id,
            expires_at,
        })
    }

    async fn resolve_session(&self, session_id: Uuid) -> Result<Option<SessionUser>, AppError> {
        let sql = format!(
            "SELECT se.sessionid, u.userid, u.username FROM {} se JOIN {} u ON u.userid = se.userid \
             WHERE se.sessionid = $1 AND se.expires_at > NOW()",
            self.tables.sessions, self.tables.users
        );
        let row: Option<(Uuid, i32, String)> = sqlx::query_as(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(session_id, user_id, username)| SessionUser {
            session_id,
            user_id,
            username,
        }))
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, AppError> {
        let res = sqlx::query(&format!(
            "DELETE FROM {} WHERE sessionid = $1",
            self.tables.sessions
        ))
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_items(&self, owner_id: i32) -> Result<Vec<Item>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} o JOIN {} s ON s.itemid = o.itemid WHERE o.ownerid = $1 ORDER BY s.itemid",
            ITEM_COLUMNS, self.tables.owns, self.tables.stuff
        );
        tracing::debug!(sql = %sql, owner_id, "query");
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        let items = rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<Item>, sqlx::Error>>()?;
        Ok(items)
    }

    async fn get_item(&self, owner_id: i32, item_id: i32) -> Result<Option<Item>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} o JOIN {} s ON s.itemid = o.itemid \
             WHERE o.ownerid = $1 AND s.itemid = $2 LIMIT 1",
            ITEM_COLUMNS, self.tables.owns, self.tables.stuff
        );
        tracing::debug!(sql = %sql, owner_id, item_id, "query");
        let row = sqlx::query(&sql)
            .bind(owner_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(item_from_row).transpose()?)
    }

    async fn create_item(&self, owner_id: i32, fields: &ItemFields) -> Result<Item, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_owner(&mut *tx, owner_id).await?;
        if self.name_taken(&mut *tx, owner_id, &fields.item_name, None).await? {
            return Err(duplicate_name(&fields.item_name));
        }
        let sql = format!(
            "INSERT INTO {} AS s (itemname, quantity, itemtype, itemvalue, location) \
             VALUES ($1, $2, $3, CAST($4 AS NUMERIC(12, 2)), $5) RETURNING {}",
            self.tables.stuff, ITEM_COLUMNS
        );
        tracing::debug!(sql = %sql, owner_id, "query (tx)");
        let row = bind_fields(sqlx::query(&sql), fields)
            .fetch_one(&mut *tx)
            .await?;
        let item = item_from_row(&row)?;
        sqlx::query(&format!(
            "INSERT INTO {} (ownerid, itemid) VALUES ($1, $2)",
            self.tables.owns
        ))
        .bind(owner_id)
        .bind(item.item_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn update_item(
        &self,
        owner_id: i32,
        item_id: i32,
        fields: &ItemFields,
    ) -> Result<Option<Item>, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_owner(&mut *tx, owner_id).await?;
        let owned = sqlx::query(&format!(
            "SELECT itemid FROM {} WHERE ownerid = $1 AND itemid = $2",
            self.tables.owns
        ))
        .bind(owner_id)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;
        if owned.is_none() {
            return Ok(None);
        }
        if self
            .name_taken(&mut *tx, owner_id, &fields.item_name, Some(item_id))
            .await?
        {
            return Err(duplicate_name(&fields.item_name));
        }
        let sql = format!(
            "UPDATE {} AS s SET itemname = $1, quantity = $2, itemtype = $3, \
             itemvalue = CAST($4 AS NUMERIC(12, 2)), location = $5 WHERE s.itemid = $6 RETURNING {}",
            self.tables.stuff, ITEM_COLUMNS
        );
        tracing::debug!(sql = %sql, owner_id, item_id, "query (tx)");
        let row = bind_fields(sqlx::query(&sql), fields)
            .bind(item_id)
            .fetch_optional(&mut *tx)
            .await?;
        let item = row.as_ref().map(item_from_row).transpose()?;
        tx.commit().await?;
        Ok(item)
    }

    async fn delete_item(&self, owner_id: i32, item_id: i32) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let unlinked = sqlx::query(&format!(
            "DELETE FROM {} WHERE ownerid = $1 AND itemid = $2",
            self.tables.owns
        ))
        .bind(owner_id)
        .bind(item_id)
        .execute(&mut *tx)
        .await?;
        if unlinked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }
        sqlx::query(&format!("DELETE FROM {} WHERE itemid = $1", self.tables.stuff))
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Bind $1..$5 in column order: name, quantity, type, value, location.
fn bind_fields<'q>(q: PgQuery<'q>, fields: &'q ItemFields) -> PgQuery<'q> {
    q.bind(fields.item_name.as_str())
        .bind(fields.quantity)
        .bind(fields.item_type.as_deref())
        .bind(fields.item_value)
        .bind(fields.location.as_deref())
}

fn item_from_row(row: &PgRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        item_id: row.try_get("itemid")?,
        item_name: row.try_get("itemname")?,
        quantity: row.try_get("quantity")?,
        item_type: row.try_get("itemtype")?,
        item_value: row.try_get("itemvalue")?,
        location: row.try_get("location")?,
    })
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Internal(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: PgConnection = opts.connect().await?;
    let exists: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&mut conn)
            .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Internal("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
