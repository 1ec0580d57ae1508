use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde_json::Value;

use super::error::ClientError;
use super::http::{ApiClient, RequestConfig};
use super::normalize::unwrap_envelope;
use super::storage::StorageError;
use crate::common::{ReportFormat, report_filename};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Inventory,
    LowStock,
}

impl ReportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Inventory => "inventory",
            ReportKind::LowStock => "low-stock",
        }
    }

    fn path(&self) -> String {
        format!("/reports/{}", self.slug())
    }
}

/// 报表结果：JSON 直接交给调用方，PDF 作为待保存的文件
#[derive(Debug, Clone)]
pub enum ReportOutput {
    Json(Value),
    Document { filename: String, bytes: Vec<u8> },
}

impl ReportOutput {
    /// 把文档写入目录，JSON 结果不落盘
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<Option<PathBuf>, StorageError> {
        let ReportOutput::Document { filename, bytes } = self else {
            return Ok(None);
        };
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), size = bytes.len(), "Report saved");
        Ok(Some(path))
    }
}

/// 获取报表，`params` 中的 `format` 会被覆盖
pub async fn fetch_report(
    api: &ApiClient,
    kind: ReportKind,
    params: RequestConfig,
    format: ReportFormat,
) -> Result<ReportOutput, ClientError> {
    fetch_report_on(api, kind, params, format, Local::now().date_naive()).await
}

/// 指定生成日期，文件名形如 `inventory-report-2026-10-19.pdf`
pub async fn fetch_report_on(
    api: &ApiClient,
    kind: ReportKind,
    mut params: RequestConfig,
    format: ReportFormat,
    date: NaiveDate,
) -> Result<ReportOutput, ClientError> {
    params.query.retain(|(key, _)| key != "format");
    let params = params.query("format", format.as_str());

    match format {
        ReportFormat::Json => {
            let value = api.request(reqwest::Method::GET, &kind.path(), None, Some(params)).await?;
            Ok(ReportOutput::Json(unwrap_envelope(value)))
        }
        ReportFormat::Pdf => {
            let download = api.download(&kind.path(), params).await?;
            let is_pdf = download
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.starts_with("application/pdf"));
            if !is_pdf {
                return Err(ClientError::MalformedResponse(format!(
                    "expected a pdf document, got {}",
                    download.content_type.as_deref().unwrap_or("no content type")
                )));
            }
            Ok(ReportOutput::Document {
                filename: report_filename(kind.slug(), date),
                bytes: download.bytes,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_documents_but_not_json() {
        let dir = tempfile::tempdir().unwrap();

        let json = ReportOutput::Json(serde_json::json!({"total_products": 3}));
        assert_eq!(json.save_to(dir.path()).await.unwrap(), None);

        let doc = ReportOutput::Document {
            filename: "low-stock-report-2026-10-19.pdf".into(),
            bytes: b"%PDF-1.5".to_vec(),
        };
        let path = doc.save_to(dir.path().join("reports")).await.unwrap().unwrap();
        assert!(path.ends_with("reports/low-stock-report-2026-10-19.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.5");
    }
}
