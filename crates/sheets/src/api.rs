use std::future::Future;

use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// The slice of the Google Sheets and Drive APIs the bot needs.
///
/// Futures are `Send` so implementations can run inside the dispatcher.
pub trait SheetsApi {
    /// Reads a range. An empty or missing range comes back as an empty list;
    /// trailing empty rows are omitted by the backend.
    fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> impl Future<Output = Result<Vec<Vec<String>>, SheetsError>> + Send;

    /// Overwrites a range with the given rows.
    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> impl Future<Output = Result<(), SheetsError>> + Send;

    /// Appends rows after the last data row of the block containing `range`.
    /// The transaction blocks sit side by side on one sheet, so rows are
    /// written in place instead of inserted.
    fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> impl Future<Output = Result<(), SheetsError>> + Send;

    /// Whether the spreadsheet is reachable with the configured credentials.
    fn validate_access(&self, spreadsheet_id: &str) -> impl Future<Output = bool> + Send;

    /// Title of the spreadsheet. A table that has not been shared with the
    /// service account fails here with [`SheetsError::NoAccess`].
    fn spreadsheet_title(
        &self,
        spreadsheet_id: &str,
    ) -> impl Future<Output = Result<String, SheetsError>> + Send;

    /// Copies a spreadsheet under a new title, returning the new id.
    fn clone_spreadsheet(
        &self,
        source_id: &str,
        new_title: &str,
    ) -> impl Future<Output = Result<String, SheetsError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("no access to the spreadsheet")]
    NoAccess,
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// REST implementation authenticated with an OAuth bearer token.
#[derive(Clone, Debug)]
pub struct HttpSheets {
    client: Client,
    base_url: String,
    drive_url: String,
}

impl HttpSheets {
    pub fn new(token: &str) -> Result<Self, String> {
        let mut auth = header::HeaderValue::try_from(format!("Bearer {token}"))
            .map_err(|err| format!("invalid auth header value: {err}"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Self {
            client,
            base_url: SHEETS_BASE_URL.to_string(),
            drive_url: DRIVE_BASE_URL.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl SheetsApi for HttpSheets {
    async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let resp = self
            .client
            .get(self.url(&format!("{spreadsheet_id}/values/{range}")))
            .send()
            .await?;
        let body = checked(resp).await?.json::<ValueRange>().await?;
        Ok(body.values)
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        let resp = self
            .client
            .put(self.url(&format!("{spreadsheet_id}/values/{range}")))
            .query(&[("valueInputOption", "RAW")])
            .json(&ValuePayload { values })
            .send()
            .await?;
        checked(resp).await?;
        Ok(())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        let resp = self
            .client
            .post(self.url(&format!("{spreadsheet_id}/values/{range}:append")))
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "OVERWRITE"),
            ])
            .json(&ValuePayload { values })
            .send()
            .await?;
        checked(resp).await?;
        Ok(())
    }

    async fn validate_access(&self, spreadsheet_id: &str) -> bool {
        self.spreadsheet_title(spreadsheet_id).await.is_ok()
    }

    async fn spreadsheet_title(&self, spreadsheet_id: &str) -> Result<String, SheetsError> {
        let resp = self
            .client
            .get(self.url(spreadsheet_id))
            .query(&[("fields", "properties.title")])
            .send()
            .await?;
        let meta = checked(resp).await?.json::<SpreadsheetMeta>().await?;
        Ok(meta.properties.title)
    }

    async fn clone_spreadsheet(
        &self,
        source_id: &str,
        new_title: &str,
    ) -> Result<String, SheetsError> {
        let resp = self
            .client
            .post(format!(
                "{}/{source_id}/copy",
                self.drive_url.trim_end_matches('/')
            ))
            .json(&CopyRequest { name: new_title })
            .send()
            .await?;
        let copy = checked(resp).await?.json::<DriveFile>().await?;
        Ok(copy.id)
    }
}

async fn checked(resp: Response) -> Result<Response, SheetsError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
    ) {
        return Err(SheetsError::NoAccess);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => "server error".to_string(),
    };
    Err(SheetsError::Api { status, message })
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ValuePayload {
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    properties: SpreadsheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Serialize)]
struct CopyRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
