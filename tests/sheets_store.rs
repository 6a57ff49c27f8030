//! Sheets client against a local mock of the v4 REST API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roombook::store::{ReservationStore, SheetsConfig, SheetsStore, StoreOp};

fn store_for(server: &MockServer) -> SheetsStore {
    SheetsStore::new(SheetsConfig {
        endpoint: server.uri(),
        spreadsheet_id: "sheet123".into(),
        token: "tok".into(),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn read_range_stringifies_cells() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet123/values/Reservations!A2:G"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Reservations!A2:G1000",
            "majorDimension": "ROWS",
            "values": [
                [1, "2024-03-04", "R1", "09:00", "10:00", "Kim"],
                ["2", "2024-03-04", "R1", "10:00", "11:00", "Ann", "demo"]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store_for(&server)
        .read_range("Reservations", "A2:G")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "1");
    assert_eq!(rows[0].len(), 6);
    assert_eq!(rows[1][6], "demo");
}

#[tokio::test]
async fn empty_range_has_no_values_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet123/values/Reservations!A2:G"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Reservations!A2:G1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let rows = store_for(&server)
        .read_range("Reservations", "A2:G")
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn append_uses_raw_insert_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123/values/Reservations!A2:G:append"))
        .and(query_param("valueInputOption", "RAW"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(body_json(json!({
            "values": [["3", "2024-03-04", "R1", "09:00", "10:00", "Kim", ""]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let row = ["3", "2024-03-04", "R1", "09:00", "10:00", "Kim", ""]
        .iter()
        .map(|s| s.to_string())
        .collect();
    store_for(&server)
        .append_row("Reservations", "A2:G", row)
        .await
        .unwrap();
}

#[tokio::test]
async fn update_cell_targets_a1_reference() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet123/values/Meta!A1"))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_json(json!({ "range": "Meta!A1", "values": [["42"]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .update_cell("Meta", 1, 1, "42".into())
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_row_resolves_sheet_id_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Rooms" } },
                { "properties": { "sheetId": 918, "title": "Reservations" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123:batchUpdate"))
        .and(body_json(json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": 918,
                        "dimension": "ROWS",
                        "startIndex": 4,
                        "endIndex": 5
                    }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123:batchUpdate"))
        .and(body_json(json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": 918,
                        "dimension": "ROWS",
                        "startIndex": 1,
                        "endIndex": 2
                    }
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store.delete_row("Reservations", 5).await.unwrap();
    store.delete_row("Reservations", 2).await.unwrap();
}

#[tokio::test]
async fn unknown_sheet_title_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sheets": [{ "properties": { "sheetId": 0, "title": "Rooms" } }]
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .delete_row("Reservations", 2)
        .await
        .unwrap_err();
    assert_eq!(err.op, StoreOp::DeleteRow);
    assert!(err.message.contains("Reservations"));
}

#[tokio::test]
async fn http_errors_carry_the_operation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.read_range("Reservations", "A2:G").await.unwrap_err();
    assert_eq!(err.op, StoreOp::Read);
    assert!(err.message.contains("503"));
    assert!(err.message.contains("backend unavailable"));

    let err = store
        .append_row("Reservations", "A2:G", vec!["1".into()])
        .await
        .unwrap_err();
    assert_eq!(err.op, StoreOp::Append);
    assert!(err.message.contains("403"));
}
