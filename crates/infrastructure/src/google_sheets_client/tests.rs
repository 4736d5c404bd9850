use std::path::PathBuf;

use httpmock::prelude::*;
use resoluty_application::{SpreadsheetBackend, SpreadsheetConnector};
use resoluty_domain::{CellValue, RangeAddress};
use serde_json::json;

use super::{GoogleSheetsClient, GoogleSheetsConfig, GoogleSheetsConnector};
use crate::google_credentials::{GoogleCredential, GoogleTokenSource};

fn client(base_url: &str) -> GoogleSheetsClient {
    let tokens = GoogleTokenSource::new(
        reqwest::Client::new(),
        GoogleCredential::AccessToken("ya29.test".to_owned()),
    )
    .unwrap_or_else(|_| panic!("valid token"));
    GoogleSheetsClient::new(reqwest::Client::new(), base_url, "sheet-123", tokens)
        .unwrap_or_else(|_| panic!("valid base url"))
}

fn range(value: &str) -> RangeAddress {
    RangeAddress::new(value).unwrap_or_else(|_| panic!("valid range"))
}

fn config(spreadsheet_id: Option<&str>, access_token: Option<&str>) -> GoogleSheetsConfig {
    GoogleSheetsConfig {
        spreadsheet_id: spreadsheet_id.map(str::to_owned),
        credentials_path: PathBuf::from("/nonexistent/resoluty/credentials.json"),
        access_token: access_token.map(str::to_owned),
        api_base_url: "https://sheets.googleapis.com".to_owned(),
    }
}

#[tokio::test]
async fn get_values_reads_value_range() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/sheet-123/values/UserActions!A:E")
                .header("authorization", "Bearer ya29.test");
            then.status(200).json_body(json!({
                "range": "UserActions!A1:E2",
                "majorDimension": "ROWS",
                "values": [["Data/Hora", "User ID"], ["19/10/2026, 10:00:00", "u1"]]
            }));
        })
        .await;

    let table = client(&server.base_url())
        .get_values(&range("UserActions!A:E"))
        .await
        .unwrap_or_else(|error| panic!("read failed: {error}"));

    mock.assert_async().await;
    assert_eq!(table.len(), 2);
    assert_eq!(table[1][1], CellValue::from("u1"));
}

#[tokio::test]
async fn empty_range_omits_values() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet-123/values/A1:A1");
            then.status(200)
                .json_body(json!({"range": "Sheet1!A1", "majorDimension": "ROWS"}));
        })
        .await;

    let table = client(&server.base_url()).get_values(&range("A1:A1")).await;

    assert!(table.is_ok_and(|table| table.is_empty()));
}

#[tokio::test]
async fn update_values_uses_raw_input() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v4/spreadsheets/sheet-123/values/FrontendEvents!A1:D1")
                .query_param("valueInputOption", "RAW")
                .body_includes("\"values\":[[\"Data/Hora\",\"Evento\"]]");
            then.status(200).json_body(json!({
                "spreadsheetId": "sheet-123",
                "updatedRange": "FrontendEvents!A1:B1",
                "updatedRows": 1,
                "updatedColumns": 2,
                "updatedCells": 2
            }));
        })
        .await;

    let summary = client(&server.base_url())
        .update_values(
            &range("FrontendEvents!A1:D1"),
            &vec![vec![CellValue::from("Data/Hora"), CellValue::from("Evento")]],
        )
        .await
        .unwrap_or_else(|error| panic!("update failed: {error}"));

    mock.assert_async().await;
    assert_eq!(summary.updated_cells, 2);
    assert_eq!(summary.updated_range.as_deref(), Some("FrontendEvents!A1:B1"));
}

#[tokio::test]
async fn append_values_inserts_rows() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/sheet-123/values/UserActions!A:E:append")
                .query_param("valueInputOption", "RAW")
                .query_param("insertDataOption", "INSERT_ROWS");
            then.status(200).json_body(json!({
                "spreadsheetId": "sheet-123",
                "tableRange": "UserActions!A1:E4",
                "updates": {
                    "spreadsheetId": "sheet-123",
                    "updatedRange": "UserActions!A5:E5",
                    "updatedRows": 1,
                    "updatedColumns": 5,
                    "updatedCells": 5
                }
            }));
        })
        .await;

    let summary = client(&server.base_url())
        .append_values(&range("UserActions!A:E"), &vec![vec![CellValue::from("x")]])
        .await
        .unwrap_or_else(|error| panic!("append failed: {error}"));

    mock.assert_async().await;
    assert_eq!(summary.updated_rows, 1);
    assert_eq!(summary.updated_range.as_deref(), Some("UserActions!A5:E5"));
}

#[tokio::test]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet-123/values/Missing!A:A");
            then.status(400).json_body(json!({
                "error": {
                    "code": 400,
                    "message": "Unable to parse range: Missing!A:A",
                    "status": "INVALID_ARGUMENT"
                }
            }));
        })
        .await;

    let result = client(&server.base_url()).get_values(&range("Missing!A:A")).await;

    assert!(result.is_err_and(|error| error.to_string().contains("Unable to parse range")));
}

#[test]
fn invalid_base_url_is_rejected() {
    let tokens = GoogleTokenSource::new(
        reqwest::Client::new(),
        GoogleCredential::AccessToken("ya29.test".to_owned()),
    )
    .unwrap_or_else(|_| panic!("valid token"));

    assert!(GoogleSheetsClient::new(reqwest::Client::new(), "not a url", "sheet", tokens).is_err());
}

#[tokio::test]
async fn connector_without_sheet_id_is_unconfigured() {
    let connector = GoogleSheetsConnector::new(reqwest::Client::new(), config(None, Some("ya29")));

    assert!(matches!(connector.connect().await, Ok(None)));
}

#[tokio::test]
async fn connector_without_credential_is_unconfigured() {
    let connector =
        GoogleSheetsConnector::new(reqwest::Client::new(), config(Some("sheet-123"), None));

    assert!(matches!(connector.connect().await, Ok(None)));
}

#[tokio::test]
async fn connector_prefers_static_token() {
    let connector = GoogleSheetsConnector::new(
        reqwest::Client::new(),
        config(Some("sheet-123"), Some("ya29.static")),
    );

    let backend = connector
        .connect()
        .await
        .unwrap_or_else(|error| panic!("connect failed: {error}"));

    assert_eq!(
        backend.as_ref().map(|backend| backend.spreadsheet_id()),
        Some("sheet-123")
    );
}

#[test]
fn config_debug_redacts_token() {
    let rendered = format!("{:?}", config(Some("sheet-123"), Some("ya29.secret")));

    assert!(!rendered.contains("ya29.secret"));
}
