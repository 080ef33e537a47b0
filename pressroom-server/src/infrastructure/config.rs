use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Runtime settings, read once at startup from `PRESSROOM_*` variables
/// (plus the conventional `DATABASE_URL`).
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_pool_size: u32,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("PRESSROOM_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = match std::env::var("PRESSROOM_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PRESSROOM_PORT: {}", e))?,
            Err(_) => DEFAULT_PORT,
        };
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let db_pool_size = match std::env::var("PRESSROOM_DB_POOL_SIZE") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PRESSROOM_DB_POOL_SIZE: {}", e))?,
            Err(_) => DEFAULT_POOL_SIZE,
        };
        let jwt_secret = std::env::var("PRESSROOM_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("PRESSROOM_JWT_SECRET must be set"))?;
        let token_ttl_secs = match std::env::var("PRESSROOM_TOKEN_TTL_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PRESSROOM_TOKEN_TTL_SECS: {}", e))?,
            Err(_) => DEFAULT_TOKEN_TTL_SECS,
        };
        // Unset means "any origin"; main special-cases the "*" entry.
        let cors_origins =
            parse_origins(&std::env::var("PRESSROOM_CORS_ORIGINS").unwrap_or_else(|_| "*".into()));

        Ok(Self {
            host,
            port,
            database_url,
            db_pool_size,
            jwt_secret,
            token_ttl_secs,
            cors_origins,
        })
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
