use crate::auth::jwt::AuthService;
use crate::types::{ActorInfo, AppError, AuditRecord, Result, Role, User};
use libsql::{params_from_iter, Builder, Connection, Database, Row, Value};

/// Email and password of the bootstrap administrator created by [`Store::seed`].
pub const SEED_ADMIN_EMAIL: &str = "superadmin@example.com";
pub const SEED_ADMIN_PASSWORD: &str = "Test1234!";

/// The role name enforced on the privileged route group.
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// libsql-backed relational store for users, roles, and the audit trail.
///
/// Holds a single shared connection; libsql connections are internally
/// synchronized, and nothing here needs cross-statement transactions beyond
/// what a single insert/update already gets.
pub struct Store {
    _db: Database,
    conn: Connection,
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

impl Store {
    /// Opens (creating if missing) a file-backed SQLite database.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        // Foreign keys are declared in the schema for documentation/shape, but
        // enforcement is left off so that deleting a referenced actor is not
        // blocked (audit rows are append-only and keep their original actor id).
        conn.execute("PRAGMA foreign_keys = OFF", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to set pragma: {}", e)))?;

        let store = Self { _db: db, conn };
        store.initialize_schema().await?;

        Ok(store)
    }

    /// Opens an ephemeral in-memory database. Used by tests and as a fallback
    /// development store.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    /// Cheap connectivity check for the diagnostics endpoint.
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .query("SELECT 1", ())
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))?;
        Ok(())
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    last_login INTEGER,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS roles (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE,
                    permissions TEXT NOT NULL DEFAULT '[]'
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create roles table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS user_roles (
                    user_id INTEGER NOT NULL,
                    role_id INTEGER NOT NULL,
                    PRIMARY KEY (user_id, role_id),
                    FOREIGN KEY (user_id) REFERENCES users(id),
                    FOREIGN KEY (role_id) REFERENCES roles(id)
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create user_roles table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS audit_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    action TEXT NOT NULL,
                    target_type TEXT NOT NULL,
                    target_id INTEGER,
                    details TEXT,
                    actor_user_id INTEGER NOT NULL,
                    timestamp INTEGER NOT NULL,
                    FOREIGN KEY (actor_user_id) REFERENCES users(id)
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create audit_logs table: {}", e)))?;

        self.conn
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp
                 ON audit_logs(timestamp DESC)",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create audit index: {}", e)))?;

        Ok(())
    }

    // ============= User operations =============

    fn user_from_row(row: &Row) -> Result<User> {
        Ok(User {
            id: row.get(0).map_err(db_err)?,
            name: row.get(1).map_err(db_err)?,
            email: row.get(2).map_err(db_err)?,
            password_hash: row.get(3).map_err(db_err)?,
            last_login: row.get(4).map_err(db_err)?,
            created_at: row.get(5).map_err(db_err)?,
            updated_at: row.get(6).map_err(db_err)?,
        })
    }

    const USER_COLUMNS: &'static str =
        "id, name, email, password_hash, last_login, created_at, updated_at";

    pub async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT INTO users (name, email, password_hash, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                (name, email, password_hash, now, now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create user: {}", e)))?;

        Ok(self.conn.last_insert_rowid())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {} FROM users WHERE email = ?", Self::USER_COLUMNS),
                [email],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {} FROM users WHERE id = ?", Self::USER_COLUMNS),
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_users(&self, page: i64, limit: i64) -> Result<Vec<User>> {
        let offset = (page - 1) * limit;

        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM users ORDER BY id LIMIT ? OFFSET ?",
                    Self::USER_COLUMNS
                ),
                [limit, offset],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            users.push(Self::user_from_row(&row)?);
        }

        Ok(users)
    }

    pub async fn count_users(&self) -> Result<i64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM users", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count users: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err),
            None => Ok(0),
        }
    }

    /// Updates profile fields; the password hash changes only when a new one
    /// is supplied.
    pub async fn update_user(
        &self,
        id: i64,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        match password_hash {
            Some(hash) => self
                .conn
                .execute(
                    "UPDATE users SET name = ?, email = ?, password_hash = ?, updated_at = ?
                     WHERE id = ?",
                    (name, email, hash, now, id),
                )
                .await
                .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?,
            None => self
                .conn
                .execute(
                    "UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ?",
                    (name, email, now, id),
                )
                .await
                .map_err(|e| AppError::Database(format!("Failed to update user: {}", e)))?,
        };

        Ok(())
    }

    pub async fn touch_last_login(&self, id: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        self.conn
            .execute(
                "UPDATE users SET last_login = ?, updated_at = ? WHERE id = ?",
                (now, now, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update last login: {}", e)))?;

        Ok(())
    }

    /// Removes the user and their role assignments. Audit records are
    /// append-only and stay behind with the original actor id.
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM user_roles WHERE user_id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete role assignments: {}", e)))?;

        self.conn
            .execute("DELETE FROM users WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        Ok(())
    }

    // ============= Role operations =============

    fn role_from_row(row: &Row) -> Result<Role> {
        let permissions: String = row.get(2).map_err(db_err)?;

        Ok(Role {
            id: row.get(0).map_err(db_err)?,
            name: row.get(1).map_err(db_err)?,
            permissions: serde_json::from_str(&permissions).unwrap_or_default(),
        })
    }

    pub async fn create_role(&self, name: &str, permissions: &[String]) -> Result<i64> {
        let permissions = serde_json::to_string(permissions)
            .map_err(|e| AppError::Internal(format!("Failed to encode permissions: {}", e)))?;

        self.conn
            .execute(
                "INSERT INTO roles (name, permissions) VALUES (?, ?)",
                (name, permissions),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create role: {}", e)))?;

        Ok(self.conn.last_insert_rowid())
    }

    pub async fn get_role_by_id(&self, id: i64) -> Result<Option<Role>> {
        let mut rows = self
            .conn
            .query("SELECT id, name, permissions FROM roles WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query role: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(Self::role_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, permissions FROM roles WHERE name = ?",
                [name],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query role: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => Ok(Some(Self::role_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        let mut rows = self
            .conn
            .query("SELECT id, name, permissions FROM roles ORDER BY id", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list roles: {}", e)))?;

        let mut roles = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            roles.push(Self::role_from_row(&row)?);
        }

        Ok(roles)
    }

    pub async fn count_roles(&self) -> Result<i64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM roles", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count roles: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err),
            None => Ok(0),
        }
    }

    pub async fn update_role(&self, id: i64, name: &str, permissions: &[String]) -> Result<()> {
        let permissions = serde_json::to_string(permissions)
            .map_err(|e| AppError::Internal(format!("Failed to encode permissions: {}", e)))?;

        self.conn
            .execute(
                "UPDATE roles SET name = ?, permissions = ? WHERE id = ?",
                (name, permissions, id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update role: {}", e)))?;

        Ok(())
    }

    /// Associates a role with a user. Idempotent: assigning an already-held
    /// role is a no-op.
    pub async fn assign_role(&self, user_id: i64, role_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)",
                (user_id, role_id),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to assign role: {}", e)))?;

        Ok(())
    }

    pub async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>> {
        let mut rows = self
            .conn
            .query(
                "SELECT r.id, r.name, r.permissions
                 FROM roles r
                 JOIN user_roles ur ON ur.role_id = r.id
                 WHERE ur.user_id = ?
                 ORDER BY r.id",
                [user_id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user roles: {}", e)))?;

        let mut roles = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            roles.push(Self::role_from_row(&row)?);
        }

        Ok(roles)
    }

    // ============= Audit operations =============

    /// Appends one immutable audit record. There is no update or delete path
    /// for this table.
    pub async fn append_audit(
        &self,
        action: &str,
        target_type: &str,
        target_id: Option<i64>,
        details: Option<&serde_json::Value>,
        actor_id: i64,
        timestamp: i64,
    ) -> Result<()> {
        let params: Vec<Value> = vec![
            Value::Text(action.to_string()),
            Value::Text(target_type.to_string()),
            target_id.map(Value::Integer).unwrap_or(Value::Null),
            details
                .map(|d| Value::Text(d.to_string()))
                .unwrap_or(Value::Null),
            Value::Integer(actor_id),
            Value::Integer(timestamp),
        ];

        self.conn
            .execute(
                "INSERT INTO audit_logs (action, target_type, target_id, details, actor_user_id, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params_from_iter(params),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to append audit record: {}", e)))?;

        Ok(())
    }

    fn audit_where(filter: &AuditFilter) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(actor_id) = filter.actor_id {
            clauses.push("a.actor_user_id = ?");
            params.push(Value::Integer(actor_id));
        }
        if let Some(action) = &filter.action {
            clauses.push("a.action = ?");
            params.push(Value::Text(action.clone()));
        }
        if let Some(from) = filter.from {
            clauses.push("a.timestamp >= ?");
            params.push(Value::Integer(from));
        }
        if let Some(to) = filter.to {
            clauses.push("a.timestamp <= ?");
            params.push(Value::Integer(to));
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }

    /// Lists audit records newest-first with the actor embedded for display.
    pub async fn list_audit(
        &self,
        filter: &AuditFilter,
        page: i64,
        limit: i64,
    ) -> Result<Vec<AuditRecord>> {
        let (where_sql, mut params) = Self::audit_where(filter);
        params.push(Value::Integer(limit));
        params.push(Value::Integer((page - 1) * limit));

        let sql = format!(
            "SELECT a.id, a.action, a.target_type, a.target_id, a.details,
                    a.actor_user_id, a.timestamp, u.id, u.name, u.email
             FROM audit_logs a
             LEFT JOIN users u ON u.id = a.actor_user_id{}
             ORDER BY a.timestamp DESC, a.id DESC
             LIMIT ? OFFSET ?",
            where_sql
        );

        let mut rows = self
            .conn
            .query(&sql, params_from_iter(params))
            .await
            .map_err(|e| AppError::Database(format!("Failed to query audit logs: {}", e)))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await.map_err(db_err)? {
            let details: Option<String> = row.get(4).map_err(db_err)?;
            let actor_row_id: Option<i64> = row.get(7).map_err(db_err)?;

            let actor = match actor_row_id {
                Some(id) => Some(ActorInfo {
                    id,
                    name: row.get(8).map_err(db_err)?,
                    email: row.get(9).map_err(db_err)?,
                }),
                None => None,
            };

            records.push(AuditRecord {
                id: row.get(0).map_err(db_err)?,
                action: row.get(1).map_err(db_err)?,
                target_type: row.get(2).map_err(db_err)?,
                target_id: row.get(3).map_err(db_err)?,
                details: details
                    .map(|d| serde_json::from_str(&d).unwrap_or(serde_json::Value::String(d))),
                actor_id: row.get(5).map_err(db_err)?,
                actor,
                timestamp: chrono::DateTime::from_timestamp(row.get(6).map_err(db_err)?, 0)
                    .unwrap_or_default(),
            });
        }

        Ok(records)
    }

    pub async fn count_audit(&self, filter: &AuditFilter) -> Result<i64> {
        let (where_sql, params) = Self::audit_where(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_logs a{}", where_sql);

        let mut rows = self
            .conn
            .query(&sql, params_from_iter(params))
            .await
            .map_err(|e| AppError::Database(format!("Failed to count audit logs: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err),
            None => Ok(0),
        }
    }

    /// Number of LOGIN audit entries at or after `since`.
    pub async fn count_recent_logins(&self, since: i64) -> Result<i64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM audit_logs WHERE action = 'LOGIN' AND timestamp >= ?",
                [since],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to count logins: {}", e)))?;

        match rows.next().await.map_err(db_err)? {
            Some(row) => row.get(0).map_err(db_err),
            None => Ok(0),
        }
    }

    // ============= Seeding =============

    /// Ensures the superadmin role and bootstrap administrator exist.
    /// Idempotent: safe to run on every startup.
    pub async fn seed(&self, auth: &AuthService) -> Result<()> {
        let role_id = match self.get_role_by_name(SUPERADMIN_ROLE).await? {
            Some(role) => role.id,
            None => self.create_role(SUPERADMIN_ROLE, &[]).await?,
        };

        let user_id = match self.get_user_by_email(SEED_ADMIN_EMAIL).await? {
            Some(user) => user.id,
            None => {
                let hash = auth.hash_password(SEED_ADMIN_PASSWORD)?;
                self.create_user("Super Admin", SEED_ADMIN_EMAIL, &hash)
                    .await?
            }
        };

        self.assign_role(user_id, role_id).await
    }
}

/// Filters for audit listings: actor, action tag, and an inclusive
/// timestamp range.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor_id: Option<i64>,
    pub action: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}
