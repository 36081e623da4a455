use std::env;

/// Process configuration, read once at startup and passed by reference.
///
/// Request handling never touches the environment directly; everything it
/// needs flows through this struct.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. `:memory:` yields an ephemeral store.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing key. Required: a missing key is a startup failure,
    /// never a silent default.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_expiry_hours: i64,
    /// Optional argon2 time-cost override; library defaults apply if unset.
    pub hash_time_cost: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH")
                    .unwrap_or_else(|_| "./data/warden.db".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| "JWT_SECRET must be set")?,
                token_expiry_hours: env::var("TOKEN_EXPIRY_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()?,
                hash_time_cost: match env::var("HASH_TIME_COST") {
                    Ok(value) => Some(value.parse()?),
                    Err(_) => None,
                },
            },
        })
    }
}
