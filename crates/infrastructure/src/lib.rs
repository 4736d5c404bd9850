//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod google_credentials;
mod google_sheets_client;
mod in_memory_spreadsheet_backend;

pub use google_credentials::{
    AuthorizedUserSecret, GoogleCredential, GoogleTokenSource, SPREADSHEETS_SCOPE,
    ServiceAccountKey,
};
pub use google_sheets_client::{
    DEFAULT_SHEETS_API_BASE_URL, GoogleSheetsClient, GoogleSheetsConfig, GoogleSheetsConnector,
};
pub use in_memory_spreadsheet_backend::InMemorySpreadsheetBackend;
