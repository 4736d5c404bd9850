use std::sync::Arc;

use resoluty_domain::{CellValue, ConnectionStatus, RangeAddress, WriteOutcome};

use super::{GatewayState, SpreadsheetGateway};
use crate::test_support::{FakeConnector, FakeSpreadsheetBackend};

fn range(value: &str) -> RangeAddress {
    RangeAddress::new(value).unwrap_or_else(|_| panic!("valid range"))
}

#[tokio::test]
async fn unconfigured_gateway_degrades_without_errors() {
    let gateway = SpreadsheetGateway::new();
    let state = gateway.initialize(&FakeConnector::Unconfigured).await;
    assert_eq!(state, GatewayState::Disabled);

    let report = gateway.test_connection().await;
    assert_eq!(report.status, ConnectionStatus::Disabled);

    let values = vec![vec![CellValue::from("x")]];
    let write = gateway.write(&range("Sheet1!A1"), &values).await;
    let append = gateway.append(&range("Sheet1!A:A"), &values).await;
    let read = gateway.read(&range("Sheet1!A:A")).await;

    assert!(matches!(write, Ok(WriteOutcome::Skipped)));
    assert!(matches!(append, Ok(WriteOutcome::Skipped)));
    assert!(read.is_ok_and(|table| table.is_empty()));
}

#[tokio::test]
async fn rejected_credential_disables_gateway() {
    let gateway = SpreadsheetGateway::new();
    let state = gateway
        .initialize(&FakeConnector::Rejected("credential file is not valid JSON".to_owned()))
        .await;

    assert_eq!(state, GatewayState::Disabled);
    let report = gateway.test_connection().await;
    assert!(report.message.contains("not valid JSON"));
}

#[tokio::test]
async fn initialize_settles_once() {
    let backend = Arc::new(FakeSpreadsheetBackend::default());
    let gateway = SpreadsheetGateway::new();
    assert_eq!(gateway.state().await, GatewayState::Uninitialized);

    let first = gateway
        .initialize(&FakeConnector::Connected(backend.clone()))
        .await;
    let second = gateway.initialize(&FakeConnector::Unconfigured).await;

    assert_eq!(first, GatewayState::Ready);
    assert_eq!(second, GatewayState::Ready);
}

#[tokio::test]
async fn append_then_read_returns_appended_row_last() {
    let backend = Arc::new(FakeSpreadsheetBackend::default());
    let gateway = SpreadsheetGateway::ready(backend);
    let log_range = range("UserActions!A:E");
    let row = vec![CellValue::from("a"), CellValue::from("b")];

    let outcome = gateway.append(&log_range, &vec![row.clone()]).await;
    assert!(matches!(outcome, Ok(WriteOutcome::Applied(_))));

    let table = gateway
        .read(&log_range)
        .await
        .unwrap_or_else(|_| panic!("read succeeds"));
    assert_eq!(table.last(), Some(&row));
}

#[tokio::test]
async fn remote_failures_propagate_but_state_stays_ready() {
    let gateway = SpreadsheetGateway::ready(Arc::new(FakeSpreadsheetBackend::failing(
        "quota exceeded",
    )));

    let read = gateway.read(&range("UserActions!A:E")).await;
    assert!(read.is_err());
    assert_eq!(gateway.state().await, GatewayState::Ready);

    let report = gateway.test_connection().await;
    assert_eq!(report.status, ConnectionStatus::Error);
    assert!(report.message.contains("quota exceeded"));
}

#[tokio::test]
async fn connected_probe_reports_sheet_id() {
    let gateway = SpreadsheetGateway::ready(Arc::new(FakeSpreadsheetBackend::default()));
    let report = gateway.test_connection().await;

    assert_eq!(report.status, ConnectionStatus::Connected);
    assert_eq!(report.sheet_id.as_deref(), Some("fake-sheet"));
}
