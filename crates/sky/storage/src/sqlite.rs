//! SQLite storage implementation.

use std::collections::HashMap;
use std::time::Duration;

use diesel::connection::SimpleConnection as _;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::{Sqlite, SqliteConnection};

use sky_core::{AuthInfo, Device, UserInfo};

use crate::models::*;
use crate::schema::*;
use crate::traits::*;
use crate::{Result, StoreError, expect_single_row};

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-connection pragmas applied when the pool opens a connection.
///
/// Pooled connections write concurrently, so a writer waits for the lock
/// instead of failing with `SQLITE_BUSY`.
#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// SQLite-based storage.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database URL.
    pub fn new(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(10)
            .connection_customizer(Box::new(ConnectionOptions {
                busy_timeout: BUSY_TIMEOUT,
            }))
            .build(manager)?;

        Ok(Self { pool })
    }

    /// Run migrations.
    pub fn run_migrations(&self) -> Result<()> {
        use diesel_migrations::MigrationHarness as _;

        let mut conn = self.conn()?;
        let applied = conn
            .run_pending_migrations(crate::MIGRATIONS)
            .map_err(StoreError::Migration)?;

        tracing::info!(count = applied.len(), "applied migrations");
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
        Ok(self.pool.get()?)
    }
}

/// Unique constraint violations on the user table are a domain condition.
fn map_user_write(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::UserDuplicated
        }
        other => StoreError::Database(other),
    }
}

fn encode_auth(user: &UserInfo) -> Result<String> {
    serde_json::to_string(&user.auth).map_err(|source| StoreError::InvalidAuth {
        id: user.id.clone(),
        source,
    })
}

/// Replace the role memberships of a user, registering unseen roles.
fn sync_roles(conn: &mut SqliteConnection, user_id: &str, role_ids: &[String]) -> QueryResult<()> {
    diesel::delete(user_roles::table.filter(user_roles::user_id.eq(user_id))).execute(conn)?;

    if role_ids.is_empty() {
        return Ok(());
    }

    let new_roles: Vec<NewRole<'_>> = role_ids
        .iter()
        .map(|id| NewRole {
            id,
            is_admin: false,
            by_default: false,
        })
        .collect();

    diesel::insert_or_ignore_into(roles::table)
        .values(&new_roles)
        .execute(conn)?;

    let memberships: Vec<NewUserRole<'_>> = role_ids
        .iter()
        .map(|role_id| NewUserRole { user_id, role_id })
        .collect();

    diesel::insert_into(user_roles::table)
        .values(&memberships)
        .execute(conn)?;

    Ok(())
}

/// Attach role memberships to user rows, preserving row order.
fn hydrate_users(conn: &mut SqliteConnection, rows: Vec<UserRow>) -> Result<Vec<UserInfo>> {
    let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();

    let memberships: Vec<(String, String)> = user_roles::table
        .filter(user_roles::user_id.eq_any(ids))
        .select((user_roles::user_id, user_roles::role_id))
        .order((user_roles::user_id.asc(), user_roles::role_id.asc()))
        .load(conn)?;

    let mut roles_by_user: HashMap<String, Vec<String>> = HashMap::new();
    for (user_id, role_id) in memberships {
        roles_by_user.entry(user_id).or_default().push(role_id);
    }

    rows.into_iter()
        .map(|row| {
            let roles = roles_by_user.remove(&row.id).unwrap_or_default();
            user_from_row(row, roles)
        })
        .collect()
}

fn user_from_row(row: UserRow, roles: Vec<String>) -> Result<UserInfo> {
    let auth: AuthInfo =
        serde_json::from_str(&row.auth).map_err(|source| StoreError::InvalidAuth {
            id: row.id.clone(),
            source,
        })?;

    Ok(UserInfo {
        id: row.id,
        username: row.username,
        email: row.email,
        hashed_password: row.password,
        auth,
        roles,
    })
}

fn single_user(
    conn: &mut SqliteConnection,
    row: Option<UserRow>,
    key: impl FnOnce() -> String,
) -> Result<UserInfo> {
    let Some(row) = row else {
        return Err(StoreError::UserNotFound(key()));
    };

    let id = row.id.clone();
    hydrate_users(conn, vec![row])?
        .pop()
        .ok_or(StoreError::UserNotFound(id))
}

/// Escape `LIKE` wildcards so the pattern matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl UserStore for SqliteStorage {
    fn create_user(&self, user: &UserInfo) -> Result<()> {
        let auth = encode_auth(user)?;
        let roles = user.role_set();
        let mut conn = self.conn()?;

        let new_user = NewUser {
            id: &user.id,
            username: user.stored_username(),
            email: user.stored_email(),
            password: &user.hashed_password,
            auth: &auth,
        };

        // Row and memberships commit together.
        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            diesel::insert_into(users::table)
                .values(&new_user)
                .execute(conn)
                .map_err(map_user_write)?;

            sync_roles(conn, &user.id, &roles).map_err(StoreError::RoleSyncFailed)
        })?;

        tracing::info!(user_id = %user.id, roles = roles.len(), "created user");
        Ok(())
    }

    fn update_user(&self, user: &UserInfo) -> Result<()> {
        let auth = encode_auth(user)?;
        let roles = user.role_set();
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let affected = diesel::update(users::table.filter(users::id.eq(&user.id)))
                .set((
                    users::username.eq(user.stored_username()),
                    users::email.eq(user.stored_email()),
                    users::password.eq(user.hashed_password.as_slice()),
                    users::auth.eq(&auth),
                ))
                .execute(conn)
                .map_err(map_user_write)?;

            expect_single_row(affected, "updated", || {
                StoreError::UserNotFound(user.id.clone())
            })?;

            sync_roles(conn, &user.id, &roles).map_err(StoreError::RoleSyncFailed)
        })?;

        tracing::info!(user_id = %user.id, "updated user");
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<UserInfo> {
        let mut conn = self.conn()?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id))
            .select(UserRow::as_select())
            .first(&mut conn)
            .optional()?;

        single_user(&mut conn, row, || id.to_string())
    }

    fn get_user_by_username_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserInfo> {
        let username = username.filter(|s| !s.is_empty());
        let email = email.filter(|s| !s.is_empty());

        let mut query = users::table
            .select(UserRow::as_select())
            .into_boxed::<Sqlite>();
        match (username, email) {
            (Some(username), Some(email)) => {
                query = query
                    .filter(users::username.eq(username))
                    .filter(users::email.eq(email));
            }
            (Some(username), None) => query = query.filter(users::username.eq(username)),
            (None, Some(email)) => query = query.filter(users::email.eq(email)),
            (None, None) => return Err(StoreError::UserNotFound(String::new())),
        }

        let mut conn = self.conn()?;
        let row: Option<UserRow> = query.first(&mut conn).optional()?;

        single_user(&mut conn, row, || {
            username.or(email).unwrap_or_default().to_string()
        })
    }

    fn get_user_by_principal_id(&self, principal_id: &str) -> Result<UserInfo> {
        // Narrow in SQL on the JSON-encoded key, then confirm on the decoded map.
        let encoded_key = serde_json::to_string(principal_id).map_err(|source| {
            StoreError::InvalidAuth {
                id: principal_id.to_string(),
                source,
            }
        })?;
        let pattern = format!("%{}%", escape_like(&encoded_key));

        let mut conn = self.conn()?;
        let candidates: Vec<UserRow> = users::table
            .filter(users::auth.like(pattern).escape('\\'))
            .select(UserRow::as_select())
            .order(users::id.asc())
            .load(&mut conn)?;

        let row = candidates.into_iter().find(|row| {
            serde_json::from_str::<AuthInfo>(&row.auth)
                .map(|auth| auth.contains_principal(principal_id))
                .unwrap_or(false)
        });

        single_user(&mut conn, row, || principal_id.to_string())
    }

    fn query_users_by_emails(&self, emails: &[String]) -> Result<Vec<UserInfo>> {
        let emails: Vec<&str> = emails
            .iter()
            .map(String::as_str)
            .filter(|email| !email.is_empty())
            .collect();

        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;
        let rows: Vec<UserRow> = users::table
            .filter(users::email.eq_any(emails))
            .select(UserRow::as_select())
            .order(users::id.asc())
            .load(&mut conn)?;

        hydrate_users(&mut conn, rows)
    }

    fn delete_user(&self, id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            diesel::delete(user_roles::table.filter(user_roles::user_id.eq(id))).execute(conn)?;

            let affected = diesel::delete(users::table.filter(users::id.eq(id))).execute(conn)?;
            expect_single_row(affected, "deleted", || StoreError::UserNotFound(id.to_string()))
        })?;

        tracing::info!(user_id = %id, "deleted user");
        Ok(())
    }
}

impl DeviceStore for SqliteStorage {
    fn get_device(&self, id: &str) -> Result<Device> {
        let mut conn = self.conn()?;

        let row: Option<DeviceRow> = devices::table
            .filter(devices::id.eq(id))
            .select(DeviceRow::as_select())
            .first(&mut conn)
            .optional()?;

        row.map(Device::from)
            .ok_or_else(|| StoreError::DeviceNotFound(id.to_string()))
    }

    fn query_devices_by_user(&self, user_id: &str) -> Result<Vec<Device>> {
        let mut conn = self.conn()?;

        let rows: Vec<DeviceRow> = devices::table
            .filter(devices::user_id.eq(user_id))
            .select(DeviceRow::as_select())
            .order(devices::id.asc())
            .load(&mut conn)?;

        if rows.is_empty() {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }

        Ok(rows.into_iter().map(Device::from).collect())
    }

    fn save_device(&self, device: &Device) -> Result<()> {
        let mut conn = self.conn()?;
        let new_device = NewDevice::from(device);

        diesel::insert_into(devices::table)
            .values(&new_device)
            .on_conflict(devices::id)
            .do_update()
            .set((
                devices::device_type.eq(new_device.device_type),
                devices::token.eq(new_device.token),
                devices::user_id.eq(new_device.user_id),
                devices::last_registered_at.eq(new_device.last_registered_at),
            ))
            .execute(&mut conn)?;

        tracing::debug!(device_id = %device.id, "saved device");
        Ok(())
    }

    fn delete_device(&self, id: &str) -> Result<()> {
        let mut conn = self.conn()?;

        let affected =
            diesel::delete(devices::table.filter(devices::id.eq(id))).execute(&mut conn)?;
        expect_single_row(affected, "deleted", || StoreError::DeviceNotFound(id.to_string()))
    }
}

/// Which named role set a write targets.
#[derive(Clone, Copy)]
enum RoleFlag {
    Admin,
    Default,
}

impl SqliteStorage {
    fn replace_role_set(&self, flag: RoleFlag, role_ids: &[String]) -> Result<()> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, StoreError, _>(|conn| {
            let new_roles: Vec<NewRole<'_>> = role_ids
                .iter()
                .map(|id| NewRole {
                    id,
                    is_admin: false,
                    by_default: false,
                })
                .collect();

            if !new_roles.is_empty() {
                diesel::insert_or_ignore_into(roles::table)
                    .values(&new_roles)
                    .execute(conn)?;
            }

            match flag {
                RoleFlag::Admin => {
                    diesel::update(roles::table)
                        .set(roles::is_admin.eq(false))
                        .execute(conn)?;
                    diesel::update(roles::table.filter(roles::id.eq_any(role_ids)))
                        .set(roles::is_admin.eq(true))
                        .execute(conn)?;
                }
                RoleFlag::Default => {
                    diesel::update(roles::table)
                        .set(roles::by_default.eq(false))
                        .execute(conn)?;
                    diesel::update(roles::table.filter(roles::id.eq_any(role_ids)))
                        .set(roles::by_default.eq(true))
                        .execute(conn)?;
                }
            }

            Ok(())
        })
    }
}

impl RoleStore for SqliteStorage {
    fn set_admin_roles(&self, roles: &[String]) -> Result<()> {
        self.replace_role_set(RoleFlag::Admin, roles)?;
        tracing::info!(roles = ?roles, "replaced admin roles");
        Ok(())
    }

    fn set_default_roles(&self, roles: &[String]) -> Result<()> {
        self.replace_role_set(RoleFlag::Default, roles)?;
        tracing::info!(roles = ?roles, "replaced default roles");
        Ok(())
    }

    fn admin_roles(&self) -> Result<Vec<String>> {
        let mut conn = self.conn()?;

        Ok(roles::table
            .filter(roles::is_admin.eq(true))
            .select(roles::id)
            .order(roles::id.asc())
            .load(&mut conn)?)
    }

    fn default_roles(&self) -> Result<Vec<String>> {
        let mut conn = self.conn()?;

        Ok(roles::table
            .filter(roles::by_default.eq(true))
            .select(roles::id)
            .order(roles::id.asc())
            .load(&mut conn)?)
    }
}
