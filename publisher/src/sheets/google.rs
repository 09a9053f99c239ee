use super::{
    SheetFuture,
    SpreadsheetService,
};
use plugin_traffic_collector::{
    CanonicalRow,
    Error,
    Result,
};
use reqwest::{
    header::CONTENT_TYPE,
    Client as HttpClient,
    RequestBuilder,
};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

/// Google Sheets API v4 client. The access token is obtained elsewhere and used as-is.
pub struct GoogleSheets {
    http_client: HttpClient,
    api_url: Url,
    access_token: String,
}

impl GoogleSheets {
    pub fn new(api_url: Url, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::Configuration("a spreadsheet access token is required".to_string()));
        }
        if api_url.cannot_be_a_base() {
            return Err(Error::Configuration(format!("{api_url} cannot be used as an API base URL")));
        }
        Ok(Self {
            http_client: HttpClient::new(),
            api_url,
            access_token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Configuration(format!("{} cannot be used as an API base URL", self.api_url)))?
            .pop_if_empty()
            .push("v4")
            .push("spreadsheets")
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::Spreadsheet(e.into()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Spreadsheet(eyre::eyre!("{status}: {body}")))
    }
}

impl SpreadsheetService for GoogleSheets {
    fn create_spreadsheet<'a>(&'a self, title: &'a str) -> SheetFuture<'a, String> {
        Box::pin(async move {
            let url = self.endpoint(&[])?;
            let body = serde_json::json!({ "properties": { "title": title } });
            let response = self.send(self.http_client.post(url).json(&body)).await?;
            let created: CreatedSpreadsheet = response.json().await.map_err(|e| Error::Spreadsheet(e.into()))?;
            Ok(created.spreadsheet_id)
        })
    }

    fn update_range<'a>(
        &'a self,
        spreadsheet_id: &'a str,
        range: &'a str,
        rows: &'a [CanonicalRow],
    ) -> SheetFuture<'a, ()> {
        Box::pin(async move {
            let mut url = self.endpoint(&[spreadsheet_id, "values", range])?;
            url.query_pairs_mut().append_pair("valueInputOption", "USER_ENTERED");
            let body = serde_json::json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": rows,
            });
            self.send(self.http_client.put(url).json(&body)).await?;
            Ok(())
        })
    }

    fn batch_update<'a>(&'a self, spreadsheet_id: &'a str, request: &'a [u8]) -> SheetFuture<'a, ()> {
        Box::pin(async move {
            let segment = format!("{spreadsheet_id}:batchUpdate");
            let url = self.endpoint(&[segment.as_str()])?;
            let request = self
                .http_client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(request.to_vec());
            self.send(request).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheets() -> GoogleSheets {
        GoogleSheets::new(Url::parse("https://sheets.googleapis.com").unwrap(), "token").unwrap()
    }

    #[test]
    fn endpoints() {
        let sheets = sheets();
        assert_eq!(
            sheets.endpoint(&[]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets"
        );
        assert_eq!(
            sheets.endpoint(&["abc", "values", "A1:E"]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/A1:E"
        );
        assert_eq!(
            sheets.endpoint(&["abc:batchUpdate"]).unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc:batchUpdate"
        );
    }

    #[test]
    fn an_access_token_is_required() {
        let err = GoogleSheets::new(Url::parse("https://sheets.googleapis.com").unwrap(), "")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
