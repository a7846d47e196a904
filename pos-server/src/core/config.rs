use shared::models::DispatchConfig;

/// Server configuration, loaded from environment variables.
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/dukani | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | DATABASE_PATH | {WORK_DIR}/dukani.db | SQLite database file |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | LOG_LEVEL | info | tracing filter directive |
/// | LOG_JSON | false | JSON log output |
/// | SMS_GATEWAY_URL | (unset) | SMS gateway endpoint; SMS disabled without it |
/// | SMS_API_KEY | (empty) | SMS gateway bearer token |
/// | SMS_SENDER_ID | DUKANI | SMS sender id |
/// | WHATSAPP_BRIDGE_URL | (unset) | WhatsApp bridge base URL; channel disabled without it |
/// | WHATSAPP_SESSION_ID | default | WhatsApp bridge session |
/// | DISPATCH_DAILY_LIMIT | 100 | Max recipients per dispatch job |
/// | DISPATCH_MIN_DELAY_SECONDS | 3 | Minimum gap between sends |
/// | DISPATCH_MAX_DELAY_SECONDS | 8 | Maximum gap between sends |
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub database_path: String,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,

    pub sms_gateway_url: Option<String>,
    pub sms_api_key: String,
    pub sms_sender_id: String,
    pub whatsapp_bridge_url: Option<String>,
    pub whatsapp_session_id: String,

    pub dispatch_daily_limit: usize,
    pub dispatch_min_delay_seconds: u64,
    pub dispatch_max_delay_seconds: u64,
}

impl Config {
    /// Load configuration, falling back to defaults for anything unset
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/dukani".into());
        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| format!("{}/dukani.db", work_dir));
        Self {
            work_dir,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),

            sms_gateway_url: std::env::var("SMS_GATEWAY_URL").ok(),
            sms_api_key: std::env::var("SMS_API_KEY").unwrap_or_default(),
            sms_sender_id: std::env::var("SMS_SENDER_ID").unwrap_or_else(|_| "DUKANI".into()),
            whatsapp_bridge_url: std::env::var("WHATSAPP_BRIDGE_URL").ok(),
            whatsapp_session_id: std::env::var("WHATSAPP_SESSION_ID")
                .unwrap_or_else(|_| "default".into()),

            dispatch_daily_limit: std::env::var("DISPATCH_DAILY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            dispatch_min_delay_seconds: std::env::var("DISPATCH_MIN_DELAY_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            dispatch_max_delay_seconds: std::env::var("DISPATCH_MAX_DELAY_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
        }
    }

    /// Pacing defaults applied to jobs created without an explicit config
    pub fn default_dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            min_delay_seconds: self.dispatch_min_delay_seconds,
            max_delay_seconds: self.dispatch_max_delay_seconds,
            daily_limit: self.dispatch_daily_limit,
            ..DispatchConfig::default()
        }
    }

    pub fn log_dir(&self) -> String {
        format!("{}/logs", self.work_dir)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
