use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub webhook_url: String,
    pub store: StoreConfig,
    pub run_limit: usize,
    pub guard_max_age_days: i64,
    pub max_body_size: usize,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Rest { url: String, api_key: String },
    Postgres { database_url: String },
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("SAL_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid SAL_HOST: {e}"))?;

        let port: u16 = env_or("SAL_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid SAL_PORT: {e}"))?;

        let base_url = env_or("SAL_BASE_URL", &format!("http://{host}:{port}"));

        let webhook_url = env_required("SAL_WEBHOOK_URL")?;

        let store = match env_or("WATCHDOG_STORE", "rest").as_str() {
            "rest" => StoreConfig::Rest {
                url: env_required("SUPABASE_URL")?,
                api_key: env_required("SUPABASE_KEY")?,
            },
            "postgres" => StoreConfig::Postgres {
                database_url: env_required("DATABASE_URL")?,
            },
            other => return Err(format!("Invalid WATCHDOG_STORE '{other}' (expected rest or postgres)")),
        };

        let run_limit: usize = env_or("WATCHDOG_RUN_LIMIT", "200")
            .parse()
            .map_err(|e| format!("Invalid WATCHDOG_RUN_LIMIT: {e}"))?;

        let guard_max_age_days: i64 = env_or("SAL_GUARD_MAX_AGE_DAYS", "400")
            .parse()
            .map_err(|e| format!("Invalid SAL_GUARD_MAX_AGE_DAYS: {e}"))?;

        let max_body_size: usize = env_or("SAL_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid SAL_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("SAL_LOG_LEVEL", "info");

        Ok(Config {
            host,
            port,
            base_url,
            webhook_url,
            store,
            run_limit,
            guard_max_age_days,
            max_body_size,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
