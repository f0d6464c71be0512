use serde::{Deserialize, Deserializer};

/// Body shown when the backend sent neither `body_html` nor `body`.
pub const NO_CONTENT_HTML: &str = "<p>No content</p>";

/// Authentication and phishing analytics attached to one analyzed email.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Analytics {
    /// Free-form SPF status token (`pass`, `fail`, `unknown`, ...).
    pub spf: String,

    /// Free-form DKIM status token.
    pub dkim: String,

    /// Free-form DMARC status token.
    pub dmarc: String,

    /// Backend phishing verdict.
    pub is_phishing: bool,

    /// Confidence as sent by the backend (`high`, `0.92`, or empty).
    pub confidence: String,

    /// Human readable reasons behind the verdict.
    pub reasons: Vec<String>,
}

impl Default for Analytics {
    fn default() -> Self {
        Self {
            spf: "unknown".to_string(),
            dkim: "unknown".to_string(),
            dmarc: "unknown".to_string(),
            is_phishing: false,
            confidence: String::new(),
            reasons: Vec::new(),
        }
    }
}

/// A successfully analyzed email, ready for rendering.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnalyzedEmail {
    pub filename: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    /// Raw HTML of the message body. Only ever placed inside the sandboxed frame.
    pub body_html: String,
    pub analytics: Analytics,
}

/// One element of the `/analyze` response array.
///
/// Any element carrying an `error` field is a per-file failure, whatever else
/// it contains.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeEntry {
    Failed { filename: String, error: String },
    Analyzed(AnalyzedEmail),
}

impl AnalyzeEntry {
    pub fn filename(&self) -> &str {
        match self {
            AnalyzeEntry::Failed { filename, .. } => filename,
            AnalyzeEntry::Analyzed(email) => &email.filename,
        }
    }
}

impl<'de> Deserialize<'de> for AnalyzeEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawEntry::deserialize(deserializer).map(AnalyzeEntry::from)
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    filename: String,
    error: Option<String>,
    subject: Option<String>,
    from: Option<String>,
    to: Option<String>,
    date: Option<String>,
    body: Option<String>,
    body_html: Option<String>,
    analytics: Option<RawAnalytics>,
}

#[derive(Deserialize)]
struct RawAnalytics {
    spf: Option<String>,
    dkim: Option<String>,
    dmarc: Option<String>,
    is_phishing: Option<bool>,
    #[serde(default, deserialize_with = "confidence_text")]
    confidence: String,
    reasons: Option<Vec<String>>,
}

/// Confidence arrives either as a label or as a number.
fn confidence_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

impl From<RawEntry> for AnalyzeEntry {
    fn from(raw: RawEntry) -> Self {
        if let Some(error) = raw.error {
            return AnalyzeEntry::Failed {
                filename: raw.filename,
                error,
            };
        }

        let defaults = Analytics::default();
        let analytics = match raw.analytics {
            Some(a) => Analytics {
                spf: a.spf.unwrap_or(defaults.spf),
                dkim: a.dkim.unwrap_or(defaults.dkim),
                dmarc: a.dmarc.unwrap_or(defaults.dmarc),
                is_phishing: a.is_phishing.unwrap_or(false),
                confidence: a.confidence,
                reasons: a.reasons.unwrap_or_default(),
            },
            None => defaults,
        };

        AnalyzeEntry::Analyzed(AnalyzedEmail {
            filename: raw.filename,
            subject: raw.subject.unwrap_or_else(|| "(no subject)".to_string()),
            from: raw.from.unwrap_or_default(),
            to: raw.to.unwrap_or_default(),
            date: raw.date.unwrap_or_default(),
            body_html: raw
                .body_html
                .or(raw.body)
                .unwrap_or_else(|| NO_CONTENT_HTML.to_string()),
            analytics,
        })
    }
}
