use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{FixedOffset, Local, Offset};
use resoluty_core::AppError;
use resoluty_infrastructure::{DEFAULT_SHEETS_API_BASE_URL, GoogleSheetsConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_API_PORT: u16 = 4000;
const DEFAULT_CREDENTIALS_PATH: &str = "./credentials.json";
const DEFAULT_REALTIME_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub init_sheets_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub sheets: GoogleSheetsConfig,
    pub log_utc_offset: FixedOffset,
    pub realtime_channel_capacity: usize,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let init_sheets_only = env::args().nth(1).as_deref() == Some("init-sheets");
        let mut config = Self::from_lookup(|name| env::var(name).ok())?;
        config.init_sheets_only = init_sheets_only;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_host = optional("API_HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let api_port = match optional("PORT").or_else(|| optional("API_PORT")) {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid PORT '{value}': {error}")))?,
            None => DEFAULT_API_PORT,
        };

        let log_utc_offset = match optional("LOG_UTC_OFFSET") {
            Some(value) => FixedOffset::from_str(&value).map_err(|error| {
                AppError::Validation(format!("invalid LOG_UTC_OFFSET '{value}': {error}"))
            })?,
            None => Local::now().offset().fix(),
        };

        let realtime_channel_capacity = match optional("REALTIME_CHANNEL_CAPACITY") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "REALTIME_CHANNEL_CAPACITY must be a positive integer, got '{value}'"
                    ))
                })?,
            None => DEFAULT_REALTIME_CHANNEL_CAPACITY,
        };

        let sheets = GoogleSheetsConfig {
            spreadsheet_id: optional("GOOGLE_SHEET_ID"),
            credentials_path: PathBuf::from(
                optional("GOOGLE_CREDENTIALS_PATH")
                    .unwrap_or_else(|| DEFAULT_CREDENTIALS_PATH.to_owned()),
            ),
            access_token: optional("GOOGLE_ACCESS_TOKEN"),
            api_base_url: optional("GOOGLE_SHEETS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE_URL.to_owned()),
        };

        Ok(Self {
            init_sheets_only: false,
            api_host,
            api_port,
            cors_allowed_origin: optional("CORS_ALLOWED_ORIGIN"),
            sheets,
            log_utc_offset,
            realtime_channel_capacity,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
