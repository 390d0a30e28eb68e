use crate::error::{Result, SyncError};
use crate::models::SHEET_HEADER;
use crate::sheets::{Destination, SheetStore};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets API v4 store. Rows are appended with
/// `values:append`, never rewritten; formatting is a `batchUpdate`
/// of set-based requests so repeating it cannot stack rules.
pub struct GoogleSheetsStore {
    client: Client,
    access_token: String,
}

impl GoogleSheetsStore {
    pub fn new(access_token: String) -> Self {
        GoogleSheetsStore {
            client: Client::new(),
            access_token,
        }
    }

    async fn get(&self, url: &str) -> Result<Response> {
        self.client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Write(format!("request failed: {e}")))
    }

    async fn post_json(&self, url: &str, body: Value) -> Result<Response> {
        self.client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Write(format!("request failed: {e}")))
    }

    /// Numeric sheet id for a tab title, or `None` when the tab does
    /// not exist yet.
    async fn sheet_id(&self, destination: &Destination) -> Result<Option<i64>> {
        let url = format!(
            "{SHEETS_API_BASE}/{}?fields=sheets.properties",
            destination.spreadsheet_id
        );
        let response = self.get(&url).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Write(format!(
                "spreadsheet lookup returned {status}: {body}"
            )));
        }

        let parsed: SpreadsheetResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Write(format!("spreadsheet lookup: invalid JSON: {e}")))?;

        Ok(parsed
            .sheets
            .into_iter()
            .find(|sheet| sheet.properties.title == destination.tab)
            .map(|sheet| sheet.properties.sheet_id))
    }

    /// Create the tab if it is missing. A concurrent creation racing
    /// us comes back as an "already exists" error, which is fine.
    async fn ensure_tab(&self, destination: &Destination) -> Result<()> {
        if self.sheet_id(destination).await?.is_some() {
            return Ok(());
        }

        let url = format!(
            "{SHEETS_API_BASE}/{}:batchUpdate",
            destination.spreadsheet_id
        );
        let body = json!({
            "requests": [{
                "addSheet": {"properties": {"title": destination.tab}}
            }]
        });
        let response = self.post_json(&url, body).await?;
        if response.status().is_success() {
            info!("created tab {destination}");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if body.contains("already exists") {
            debug!("tab {destination} already exists");
            return Ok(());
        }
        Err(SyncError::Write(format!(
            "creating tab {destination} returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsStore {
    async fn read_rows(&self, destination: &Destination) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{}",
            destination.spreadsheet_id, destination.tab
        );
        let response = self.get(&url).await?;
        let status = response.status();

        // A tab that does not exist yet reads as zero rows, exactly
        // like an existing empty tab.
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if status == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if body.contains("Unable to parse range") {
                return Ok(Vec::new());
            }
            return Err(SyncError::Write(format!(
                "reading {destination} returned {status}: {body}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Write(format!(
                "reading {destination} returned {status}: {body}"
            )));
        }

        let parsed: ValueRange = response
            .json()
            .await
            .map_err(|e| SyncError::Write(format!("reading {destination}: invalid JSON: {e}")))?;
        Ok(parsed.values)
    }

    async fn append_rows(&self, destination: &Destination, rows: Vec<Vec<String>>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.ensure_tab(destination).await?;

        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{}:append?valueInputOption=USER_ENTERED",
            destination.spreadsheet_id, destination.tab
        );
        let row_count = rows.len();
        let response = self.post_json(&url, json!({ "values": rows })).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Write(format!(
                "appending to {destination} returned {status}: {body}"
            )));
        }
        info!("appended {row_count} rows to {destination}");
        Ok(())
    }

    async fn format_range(&self, destination: &Destination, row_count: usize) -> Result<()> {
        let Some(sheet_id) = self.sheet_id(destination).await? else {
            debug!("no tab at {destination}, nothing to format");
            return Ok(());
        };
        if row_count == 0 {
            return Ok(());
        }

        // Set-based requests only: repeating this batch with the same
        // extent overwrites the same properties instead of stacking
        // another rule.
        let url = format!(
            "{SHEETS_API_BASE}/{}:batchUpdate",
            destination.spreadsheet_id
        );
        let body = json!({
            "requests": [
                {
                    "repeatCell": {
                        "range": {
                            "sheetId": sheet_id,
                            "startRowIndex": 0,
                            "endRowIndex": 1,
                            "startColumnIndex": 0,
                            "endColumnIndex": SHEET_HEADER.len()
                        },
                        "cell": {
                            "userEnteredFormat": {
                                "textFormat": {"bold": true},
                                "backgroundColor": {"red": 0.9, "green": 0.9, "blue": 0.9}
                            }
                        },
                        "fields": "userEnteredFormat(textFormat,backgroundColor)"
                    }
                },
                {
                    "updateSheetProperties": {
                        "properties": {
                            "sheetId": sheet_id,
                            "gridProperties": {"frozenRowCount": 1}
                        },
                        "fields": "gridProperties.frozenRowCount"
                    }
                },
                {
                    "updateBorders": {
                        "range": {
                            "sheetId": sheet_id,
                            "startRowIndex": 0,
                            "endRowIndex": row_count,
                            "startColumnIndex": 0,
                            "endColumnIndex": SHEET_HEADER.len()
                        },
                        "innerHorizontal": {"style": "SOLID"}
                    }
                },
                {
                    "autoResizeDimensions": {
                        "dimensions": {
                            "sheetId": sheet_id,
                            "dimension": "COLUMNS",
                            "startIndex": 0,
                            "endIndex": SHEET_HEADER.len()
                        }
                    }
                }
            ]
        });

        let response = self.post_json(&url, body).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Write(format!(
                "formatting {destination} returned {status}: {body}"
            )));
        }
        info!("formatted {row_count} rows at {destination}");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}
