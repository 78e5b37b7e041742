use super::parser::parse_script_payload;
use super::{RowSource, RowSourceError, SheetPayload};
use crate::config::SheetsConfig;
use crate::workflows::dashboard::ColumnLayout;
use chrono::{FixedOffset, Offset, Utc};
use std::future::Future;
use std::time::Duration;

/// Row source backed by the spreadsheet's Apps Script web endpoint.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    script_url: String,
    sheet_id: String,
    utc_offset: FixedOffset,
}

impl SheetsClient {
    pub fn new(
        script_url: impl Into<String>,
        sheet_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RowSourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RowSourceError::Fetch(format!("could not build HTTP client: {err}")))?;

        Ok(Self {
            http,
            script_url: script_url.into(),
            sheet_id: sheet_id.into(),
            utc_offset: Utc.fix(),
        })
    }

    /// Offset the spreadsheet keeps its dates in; UTC unless set.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// `None` when the endpoint or the spreadsheet id is not configured.
    pub fn from_config(config: &SheetsConfig) -> Result<Option<Self>, RowSourceError> {
        match (&config.script_url, &config.sheet_id) {
            (Some(url), Some(sheet_id)) => Self::new(url, sheet_id, config.timeout)
                .map(|client| Some(client.with_utc_offset(config.utc_offset))),
            _ => Ok(None),
        }
    }

    async fn fetch(&self, sheet: &str) -> Result<SheetPayload, RowSourceError> {
        let response = self
            .http
            .post(&self.script_url)
            .form(&[
                ("action", "fetchTasks"),
                ("sheetId", self.sheet_id.as_str()),
                ("sheetName", sheet),
            ])
            .send()
            .await
            .map_err(|err| RowSourceError::Fetch(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                sheet,
                status = status.as_u16(),
                "row source answered with an error status"
            );
            return Err(RowSourceError::Fetch(format!(
                "row source answered with status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| RowSourceError::Fetch(err.to_string()))?;

        let width = ColumnLayout::STANDARD.required_width();
        let payload = parse_script_payload(&body, width, self.utc_offset)?;
        tracing::debug!(
            sheet,
            headers = payload.headers.len(),
            rows = payload.rows.len(),
            "fetched sheet rows"
        );
        Ok(payload)
    }
}

impl RowSource for SheetsClient {
    fn fetch_rows(
        &self,
        sheet: &str,
    ) -> impl Future<Output = Result<SheetPayload, RowSourceError>> + Send {
        self.fetch(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetsConfig;

    fn sheets_config(script_url: Option<&str>, sheet_id: Option<&str>) -> SheetsConfig {
        SheetsConfig {
            script_url: script_url.map(str::to_string),
            sheet_id: sheet_id.map(str::to_string),
            task_sheet: "DATA".to_string(),
            roster_sheet: "MASTER".to_string(),
            timeout: Duration::from_secs(5),
            utc_offset: FixedOffset::east_opt(19_800).expect("valid offset"),
        }
    }

    #[test]
    fn client_requires_url_and_sheet_id() {
        let url = Some("http://localhost/x");
        let missing = SheetsClient::from_config(&sheets_config(url, None)).expect("builds");
        assert!(missing.is_none());

        let client = SheetsClient::from_config(&sheets_config(url, Some("abc")))
            .expect("builds")
            .expect("configured");
        assert_eq!(client.script_url, "http://localhost/x");
        assert_eq!(client.sheet_id, "abc");
        assert_eq!(client.utc_offset.local_minus_utc(), 19_800);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_fetch_error() {
        let timeout = Duration::from_millis(500);
        let client =
            SheetsClient::new("http://127.0.0.1:9/exec", "abc", timeout).expect("client");
        let err = client
            .fetch_rows("DATA")
            .await
            .expect_err("nothing listens on port 9");
        assert!(matches!(err, RowSourceError::Fetch(_)));
    }
}
