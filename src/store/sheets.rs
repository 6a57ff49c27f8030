use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::range::cell_ref;
use super::{ReservationStore, Row, StoreError, StoreOp};

pub const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com";

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// API base, e.g. `https://sheets.googleapis.com`.
    pub endpoint: String,
    pub spreadsheet_id: String,
    /// OAuth2 bearer token with the spreadsheets scope.
    pub token: String,
    pub timeout: Duration,
}

/// Google Sheets v4 REST client.
pub struct SheetsStore {
    client: Client,
    base: Url,
    spreadsheet_id: String,
    token: String,
    /// Sheet title → numeric sheet id, needed for row deletion.
    sheet_ids: DashMap<String, i64>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl SheetsStore {
    pub fn new(config: SheetsConfig) -> Result<Self, StoreError> {
        let base = Url::parse(&config.endpoint).map_err(|e| {
            StoreError::new(StoreOp::Read, format!("invalid endpoint {:?}: {e}", config.endpoint))
        })?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::new(StoreOp::Read, e.to_string()))?;
        Ok(Self {
            client,
            base,
            spreadsheet_id: config.spreadsheet_id,
            token: config.token,
            sheet_ids: DashMap::new(),
        })
    }

    /// `{base}/v4/spreadsheets/{id}{suffix}` followed by `extra` segments.
    fn url(&self, op: StoreOp, id_suffix: &str, extra: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::new(op, "endpoint cannot be a base URL"))?
            .pop_if_empty()
            .push("v4")
            .push("spreadsheets")
            .push(&format!("{}{id_suffix}", self.spreadsheet_id))
            .extend(extra);
        Ok(url)
    }

    async fn send(&self, op: StoreOp, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| StoreError::new(op, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::new(op, format!("HTTP {status}: {body}")));
        }
        Ok(resp)
    }

    async fn sheet_id(&self, title: &str) -> Result<i64, StoreError> {
        if let Some(id) = self.sheet_ids.get(title) {
            return Ok(*id);
        }
        let op = StoreOp::DeleteRow;
        let url = self.url(op, "", &[])?;
        let resp = self
            .send(
                op,
                self.client
                    .get(url)
                    .query(&[("fields", "sheets.properties(sheetId,title)")]),
            )
            .await?;
        let meta: SpreadsheetMeta = resp
            .json()
            .await
            .map_err(|e| StoreError::new(op, format!("malformed spreadsheet metadata: {e}")))?;
        for entry in meta.sheets {
            self.sheet_ids
                .insert(entry.properties.title, entry.properties.sheet_id);
        }
        self.sheet_ids
            .get(title)
            .map(|id| *id)
            .ok_or_else(|| StoreError::new(op, format!("no sheet titled {title:?}")))
    }
}

fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ReservationStore for SheetsStore {
    async fn read_range(&self, sheet: &str, range: &str) -> Result<Vec<Row>, StoreError> {
        let op = StoreOp::Read;
        let url = self.url(op, "", &["values", &format!("{sheet}!{range}")])?;
        debug!("sheets read {sheet}!{range}");
        let resp = self.send(op, self.client.get(url)).await?;
        let body: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::new(op, format!("malformed value range: {e}")))?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn append_row(&self, sheet: &str, range: &str, row: Row) -> Result<(), StoreError> {
        let op = StoreOp::Append;
        let url = self.url(op, "", &["values", &format!("{sheet}!{range}:append")])?;
        debug!("sheets append {sheet}!{range}");
        self.send(
            op,
            self.client
                .post(url)
                .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
                .json(&json!({ "values": [row] })),
        )
        .await?;
        Ok(())
    }

    async fn update_cell(
        &self,
        sheet: &str,
        row: usize,
        col: usize,
        value: String,
    ) -> Result<(), StoreError> {
        let op = StoreOp::UpdateCell;
        if row == 0 || col == 0 {
            return Err(StoreError::new(op, format!("cell ({row}, {col}) out of range")));
        }
        let target = format!("{sheet}!{}", cell_ref(row, col));
        let url = self.url(op, "", &["values", &target])?;
        debug!("sheets update {target}");
        self.send(
            op,
            self.client
                .put(url)
                .query(&[("valueInputOption", "RAW")])
                .json(&json!({ "range": target, "values": [[value]] })),
        )
        .await?;
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row: usize) -> Result<(), StoreError> {
        let op = StoreOp::DeleteRow;
        if row == 0 {
            return Err(StoreError::new(op, "row 0 out of range"));
        }
        let sheet_id = self.sheet_id(sheet).await?;
        let url = self.url(op, ":batchUpdate", &[])?;
        debug!("sheets delete {sheet} row {row}");
        self.send(
            op,
            self.client.post(url).json(&json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row - 1,
                            "endIndex": row,
                        }
                    }
                }]
            })),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_stringify() {
        assert_eq!(cell_to_string(json!("a")), "a");
        assert_eq!(cell_to_string(json!(12)), "12");
        assert_eq!(cell_to_string(json!(true)), "true");
        assert_eq!(cell_to_string(Value::Null), "");
    }

    #[test]
    fn url_layout() {
        let store = SheetsStore::new(SheetsConfig {
            endpoint: "https://sheets.example.com/".into(),
            spreadsheet_id: "sid".into(),
            token: "t".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let url = store
            .url(StoreOp::Read, "", &["values", "My Sheet!A2:G"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.com/v4/spreadsheets/sid/values/My%20Sheet!A2:G"
        );
        let url = store.url(StoreOp::DeleteRow, ":batchUpdate", &[]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.example.com/v4/spreadsheets/sid:batchUpdate");
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let result = SheetsStore::new(SheetsConfig {
            endpoint: "not a url".into(),
            spreadsheet_id: "sid".into(),
            token: "t".into(),
            timeout: Duration::from_secs(5),
        });
        assert!(result.is_err());
    }
}
