use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    error::{AppError, Result},
    files::{client_file_name, convert_to_csv, download_csv, escape_newlines, Row, TestsetFormat, UploadedFile},
    middleware::logging::{record_rows, record_testset_file},
    models::ApiResponse,
    AppState,
};

const DEFAULT_EXPORT_FILENAME: &str = "testset.csv";

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub header: Vec<Option<String>>,
    #[serde(default)]
    pub rows: Vec<Row>,
    pub filename: Option<String>,
    #[serde(default)]
    pub escape_newlines: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub format: Option<TestsetFormat>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub filename: String,
    pub format: TestsetFormat,
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub filename: String,
    pub saved: bool,
}

impl ExportRequest {
    /// Renders the request as `(filename, csv)`.
    fn render(self) -> Result<(String, String)> {
        let filename = self
            .filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());

        record_testset_file(&filename);
        record_rows(self.rows.len());

        let rows = if self.escape_newlines {
            self.rows.into_iter().map(escape_row_newlines).collect()
        } else {
            self.rows
        };

        let content = convert_to_csv(&rows, &self.header)?;
        Ok((filename, content))
    }
}

pub async fn export_csv(Json(payload): Json<ExportRequest>) -> Result<Response> {
    info!("POST /api/testsets/export - {} rows", payload.rows.len());

    let (filename, content) = payload.render()?;
    csv_attachment(content, &filename)
}

/// Saves the export through the server-side download host, if one is set.
pub async fn save_csv(
    State(state): State<AppState>,
    Json(payload): Json<ExportRequest>,
) -> Result<Json<ApiResponse<SaveResponse>>> {
    info!("POST /api/testsets/save - {} rows", payload.rows.len());

    let (filename, content) = payload.render()?;
    let saved = state.download_host.is_some();
    let host = state.download_host.clone();
    let target = filename.clone();

    tokio::task::spawn_blocking(move || download_csv(host.as_deref(), &content, &target))
        .await
        .map_err(|e| anyhow::anyhow!("Download task failed: {}", e))??;

    Ok(Json(ApiResponse::success(SaveResponse { filename, saved })))
}

pub async fn validate_testset(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ValidateResponse>>> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(client_file_name)
            .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?
            .to_string();
        record_testset_file(&filename);

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        upload = Some(UploadedFile::new(filename, content_type, data.to_vec()));
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::BadRequest("No file found in request".to_string())
    })?;

    state
        .validator
        .validate_upload(&upload.filename, &upload.content_type, &upload.data)?;

    let format = query
        .format
        .or_else(|| TestsetFormat::from_filename(&upload.filename))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Cannot tell the format of {}; pass ?format=csv or ?format=json",
                upload.filename
            ))
        })?;

    let valid = state.validator.validate(format, &upload).await.is_valid();
    info!("Validated {} as {:?}: valid={}", upload.filename, format, valid);

    Ok(Json(ApiResponse::success(ValidateResponse {
        filename: upload.filename,
        format,
        valid,
    })))
}

/// Builds a `text/csv` attachment response for `content`.
pub fn csv_attachment(content: String, filename: &str) -> Result<Response> {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        filename.replace('"', "\\\"")
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| AppError::BadRequest(format!("Invalid download filename: {}", filename)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(content.len()));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, headers, content).into_response())
}

fn escape_row_newlines(row: Row) -> Row {
    row.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, Value::String(escape_newlines(&s))),
            other => (key, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_attachment_headers() {
        let response = csv_attachment("a,b".to_string(), "my \"rows\".csv").unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "3");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"my \\\"rows\\\".csv\""
        );
    }

    #[test]
    fn test_csv_attachment_rejects_control_characters() {
        assert!(csv_attachment(String::new(), "bad\nname.csv").is_err());
    }

    #[test]
    fn test_escape_row_newlines_only_touches_strings() {
        let row = match json!({"text": "a\nb", "n": 1, "list": ["x\ny"]}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let escaped = escape_row_newlines(row);
        assert_eq!(escaped["text"], "a\\nb");
        assert_eq!(escaped["n"], 1);
        assert_eq!(escaped["list"], json!(["x\ny"]));
    }
}
