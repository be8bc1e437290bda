use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub session_expiry_hours: i64,
    pub request_timeout_secs: u64,
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            session_expiry_hours: 24,
            request_timeout_secs: 30,
            seed_sample_data: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?,
            session_expiry_hours: parse_expiry_hours(
                &std::env::var("SESSION_EXPIRY_HOURS").unwrap_or_else(|_| "24".to_string()),
            )?,
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", e)))?,
            seed_sample_data: parse_flag(
                "SEED_SAMPLE_DATA",
                &std::env::var("SEED_SAMPLE_DATA").unwrap_or_else(|_| "true".to_string()),
            )?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Longest accepted session lifetime: ten years.
const MAX_SESSION_EXPIRY_HOURS: i64 = 24 * 365 * 10;

fn parse_expiry_hours(value: &str) -> Result<i64, AppError> {
    let hours: i64 = value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid SESSION_EXPIRY_HOURS: {}", e)))?;

    if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&hours) {
        return Err(AppError::Config(format!(
            "Invalid SESSION_EXPIRY_HOURS: {} (expected 1..={})",
            hours, MAX_SESSION_EXPIRY_HOURS
        )));
    }

    Ok(hours)
}

fn parse_flag(name: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("Invalid {}: {}", name, other))),
    }
}
