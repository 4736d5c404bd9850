use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use resoluty_application::{SpreadsheetBackend, SpreadsheetConnector};
use resoluty_core::{AppError, AppResult};
use resoluty_domain::{RangeAddress, Table, WriteSummary};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::google_credentials::{GoogleCredential, GoogleTokenSource};

/// Public Sheets API endpoint.
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";

const VALUE_INPUT_OPTION: &str = "RAW";
const INSERT_DATA_OPTION: &str = "INSERT_ROWS";

/// Settings needed to reach one spreadsheet.
#[derive(Clone)]
pub struct GoogleSheetsConfig {
    /// Target spreadsheet. `None` disables the integration.
    pub spreadsheet_id: Option<String>,
    /// Location of `credentials.json`.
    pub credentials_path: PathBuf,
    /// Static access token taking precedence over the credential file.
    pub access_token: Option<String>,
    /// Sheets API origin.
    pub api_base_url: String,
}

impl std::fmt::Debug for GoogleSheetsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("credentials_path", &self.credentials_path)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Builds a [`GoogleSheetsClient`] from configuration at startup.
#[derive(Debug)]
pub struct GoogleSheetsConnector {
    http: reqwest::Client,
    config: GoogleSheetsConfig,
}

impl GoogleSheetsConnector {
    /// Creates a connector for `config`.
    #[must_use]
    pub fn new(http: reqwest::Client, config: GoogleSheetsConfig) -> Self {
        Self { http, config }
    }

    async fn credential(&self) -> AppResult<Option<GoogleCredential>> {
        if let Some(token) = self
            .config
            .access_token
            .as_ref()
            .filter(|token| !token.trim().is_empty())
        {
            return Ok(Some(GoogleCredential::AccessToken(token.clone())));
        }

        GoogleCredential::load(&self.config.credentials_path).await
    }
}

#[async_trait]
impl SpreadsheetConnector for GoogleSheetsConnector {
    async fn connect(&self) -> AppResult<Option<Arc<dyn SpreadsheetBackend>>> {
        let Some(spreadsheet_id) = self
            .config
            .spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return Ok(None);
        };

        let Some(credential) = self.credential().await? else {
            return Ok(None);
        };

        info!(
            credential = credential.kind(),
            spreadsheet_id, "loaded Google credential"
        );
        let tokens = GoogleTokenSource::new(self.http.clone(), credential)?;
        let client = GoogleSheetsClient::new(
            self.http.clone(),
            &self.config.api_base_url,
            spreadsheet_id,
            tokens,
        )?;

        Ok(Some(Arc::new(client)))
    }
}

/// Sheets v4 values API client bound to one spreadsheet.
#[derive(Debug)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    tokens: GoogleTokenSource,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Table,
}

#[derive(Deserialize)]
struct AppendValuesResponse {
    #[serde(default)]
    updates: Option<WriteSummary>,
}

#[derive(Deserialize)]
struct GoogleApiErrorBody {
    error: GoogleApiError,
}

#[derive(Deserialize)]
struct GoogleApiError {
    #[serde(default)]
    message: String,
}

impl GoogleSheetsClient {
    /// Creates a client for `spreadsheet_id` at `base_url`.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        tokens: GoogleTokenSource,
    ) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid Sheets API base URL '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "Sheets API base URL '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            http,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        })
    }

    fn values_url(&self, range: &RangeAddress, method: Option<&str>) -> AppResult<Url> {
        let last_segment = match method {
            Some(method) => format!("{range}:{method}"),
            None => range.as_str().to_owned(),
        };

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Internal("Sheets API base URL cannot carry a path".to_owned())
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&last_segment);

        Ok(url)
    }

    async fn send<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let access_token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                AppError::Integration(format!("Sheets API {operation} request failed: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleApiErrorBody>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            return Err(AppError::Integration(format!(
                "Sheets API {operation} returned {status}: {message}"
            )));
        }

        response.json::<T>().await.map_err(|error| {
            AppError::Integration(format!("invalid Sheets API {operation} response: {error}"))
        })
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheetsClient {
    fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn get_values(&self, range: &RangeAddress) -> AppResult<Table> {
        let url = self.values_url(range, None)?;
        let value_range: ValueRange = self.send("values.get", self.http.get(url)).await?;
        debug!(range = %range, rows = value_range.values.len(), "read spreadsheet values");

        Ok(value_range.values)
    }

    async fn update_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary> {
        let url = self.values_url(range, None)?;
        let request = self
            .http
            .put(url)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&json!({ "range": range.as_str(), "values": values }));

        self.send("values.update", request).await
    }

    async fn append_values(&self, range: &RangeAddress, values: &Table) -> AppResult<WriteSummary> {
        let url = self.values_url(range, Some("append"))?;
        let request = self
            .http
            .post(url)
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", INSERT_DATA_OPTION),
            ])
            .json(&json!({ "values": values }));

        let response: AppendValuesResponse = self.send("values.append", request).await?;
        Ok(response.updates.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests;
