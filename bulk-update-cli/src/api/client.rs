//! HTTP implementation of [`BulkUpdateService`]

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use std::time::Duration;

use super::error::ApiError;
use super::models::{
    ExecuteRequest, ExecutionReport, PreviewReport, PreviewRequest, TableId, TemplateRequest,
};
use super::service::BulkUpdateService;
use crate::config::Config;

/// Header the backend reads the identity token from
pub const TOKEN_HEADER: &str = "x-access-token";

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Client for the bulk update REST endpoints
#[derive(Debug, Clone)]
pub struct BulkUpdateClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BulkUpdateClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.api_url.clone(),
            config.token.clone(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header(TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Turn a non-success response into an [`ApiError::Http`]
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response_body(status.as_u16(), &body);
        debug!("Request failed with {}: {}", status, err);
        Err(err)
    }
}

#[async_trait]
impl BulkUpdateService for BulkUpdateClient {
    async fn table_schema(&self, table: TableId) -> Result<Vec<String>, ApiError> {
        let path = format!("/api/table-schema/{}", urlencoding::encode(table.as_str()));
        let response = Self::check(self.request(Method::GET, &path).send().await?).await?;
        let columns: Vec<String> = response.json().await?;
        debug!("Schema for {}: {} columns", table, columns.len());
        Ok(columns)
    }

    async fn download_template(&self, request: &TemplateRequest) -> Result<Vec<u8>, ApiError> {
        let response = self
            .request(Method::GET, "/api/bulk-update/download-template")
            .query(&request.query_pairs())
            .send()
            .await?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn preview_upload(&self, request: &PreviewRequest) -> Result<PreviewReport, ApiError> {
        let part = Part::bytes(request.file.bytes.clone())
            .file_name(request.file.name.clone())
            .mime_str(XLSX_MIME)?;
        let form = Form::new()
            .part("file", part)
            .text("table_name", request.table.as_str())
            .text("identifier_column", request.identifier_column.clone());

        let response = self
            .request(Method::POST, "/api/bulk-update/preview-upload")
            .multipart(form)
            .send()
            .await?;
        let report: PreviewReport = Self::check(response).await?.json().await?;
        debug!(
            "Preview: {} valid, {} invalid",
            report.valid_updates.len(),
            report.invalid_rows.len()
        );
        Ok(report)
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecutionReport, ApiError> {
        let response = self
            .request(Method::POST, "/api/bulk-update/execute")
            .json(request)
            .send()
            .await?;
        let report: ExecutionReport = Self::check(response).await?.json().await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BulkUpdateClient::new("http://localhost:5000/", None, None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.url("/api/table-schema/x"),
            "http://localhost:5000/api/table-schema/x"
        );
    }

    #[test]
    fn test_token_header_attached() {
        let client =
            BulkUpdateClient::new("http://localhost:5000", Some("abc".into()), None).unwrap();
        let req = client.request(Method::GET, "/api/test").build().unwrap();
        assert_eq!(req.headers().get(TOKEN_HEADER).unwrap(), "abc");
    }

    #[test]
    fn test_no_token_header_without_token() {
        let client = BulkUpdateClient::new("http://localhost:5000", None, None).unwrap();
        let req = client.request(Method::GET, "/api/test").build().unwrap();
        assert!(req.headers().get(TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_template_query_string() {
        let client = BulkUpdateClient::new("http://localhost:5000", None, None).unwrap();
        let template = TemplateRequest {
            table: TableId::StudentsDetailsMaster,
            identifier_column: "master_id".into(),
            update_columns: vec!["email".into()],
        };
        let req = client
            .request(Method::GET, "/api/bulk-update/download-template")
            .query(&template.query_pairs())
            .build()
            .unwrap();
        let pairs: Vec<(String, String)> = req
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("table_name".to_string(), "students_details_master".to_string()),
                ("identifier_column".to_string(), "master_id".to_string()),
                ("update_columns".to_string(), r#"["email"]"#.to_string()),
            ]
        );
    }
}
