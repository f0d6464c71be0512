use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::analytics::AnalyzeEntry;
use crate::intake::AcceptedFile;

/// Multipart field carrying each uploaded file.
pub const UPLOAD_FIELD: &str = "eml_files";

/// Client trait for the real analysis backend or a test double
#[async_trait]
pub trait AnalyzeClient {
    /// Sends every file of one batch in a single request.
    async fn analyze(&self, files: &[AcceptedFile]) -> anyhow::Result<Vec<AnalyzeEntry>>;
}

/// HTTP client for the backend's `/analyze` endpoint
#[derive(Clone)]
pub struct HttpAnalyzeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalyzeClient {
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(files: &[AcceptedFile]) -> anyhow::Result<Form> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.content.clone())
                .file_name(file.name.clone())
                .mime_str("message/rfc822")?;
            form = form.part(UPLOAD_FIELD, part);
        }
        Ok(form)
    }
}

#[async_trait]
impl AnalyzeClient for HttpAnalyzeClient {
    async fn analyze(&self, files: &[AcceptedFile]) -> anyhow::Result<Vec<AnalyzeEntry>> {
        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(Self::form(files)?)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error = resp.text().await.unwrap_or_default();
            anyhow::bail!("Analyze request failed with {}: {}", status, error);
        }

        let body = resp.bytes().await?;
        decode_entries(&body)
    }
}

/// Decodes the `/analyze` response body, which must be a JSON array.
///
/// Rows are decoded one by one so a malformed row never costs its siblings.
/// A malformed row that still names its file becomes a per-file failure; one
/// without a usable filename is logged and dropped.
pub fn decode_entries(body: &[u8]) -> anyhow::Result<Vec<AnalyzeEntry>> {
    let rows: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|e| anyhow::anyhow!("Analyze response is not a result array: {}", e))?;
    Ok(rows.into_iter().filter_map(decode_row).collect())
}

fn decode_row(row: serde_json::Value) -> Option<AnalyzeEntry> {
    let filename = row
        .get("filename")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    match serde_json::from_value::<AnalyzeEntry>(row) {
        Ok(entry) => Some(entry),
        Err(e) => match filename {
            Some(filename) => {
                log::warn!("Malformed result for {}: {}", filename, e);
                Some(AnalyzeEntry::Failed {
                    filename,
                    error: format!("Malformed analysis result: {}", e),
                })
            }
            None => {
                log::warn!("Skipping malformed result row: {}", e);
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpAnalyzeClient, decode_entries};
    use crate::analytics::AnalyzeEntry;

    #[test]
    fn test_decode_array() {
        let body = br#"[{"filename":"b.eml","subject":"B"},{"filename":"a.eml","error":"parse failure"}]"#;
        let entries = decode_entries(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename(), "b.eml");
        assert!(matches!(entries[1], AnalyzeEntry::Failed { .. }));
    }

    #[test]
    fn test_malformed_row_keeps_siblings() {
        let body = br#"[
            {"filename":"a.eml","subject":"A"},
            {"filename":"b.eml","analytics":{"reasons":[1]}},
            {"filename":null,"subject":"lost"},
            {"filename":"c.eml","error":{"code":500}}
        ]"#;
        let entries = decode_entries(body).unwrap();

        assert_eq!(entries.len(), 3);
        let AnalyzeEntry::Analyzed(a) = &entries[0] else {
            panic!("expected analyzed entry");
        };
        assert_eq!(a.subject, "A");
        for (entry, name) in entries[1..].iter().zip(["b.eml", "c.eml"]) {
            let AnalyzeEntry::Failed { filename, error } = entry else {
                panic!("expected failed entry for {}", name);
            };
            assert_eq!(filename, name);
            assert!(error.starts_with("Malformed analysis result"));
        }
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(decode_entries(b"<html>502 Bad Gateway</html>").is_err());
    }

    #[test]
    fn test_decode_rejects_object() {
        assert!(decode_entries(br#"{"error":"too large"}"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        use super::AnalyzeClient;
        use crate::intake::{CandidateFile, accept_files};

        let batch = accept_files(vec![CandidateFile::new("a.eml", "From: x@example.com\r\n")]).unwrap();
        // port 9 (discard) on localhost is not expected to serve HTTP
        let client = HttpAnalyzeClient::new("http://127.0.0.1:9/analyze").unwrap();
        assert!(client.analyze(&batch.files).await.is_err());
    }
}
