//! Server-side HTML for the upload page and result panels.
//!
//! Every value coming from the backend goes through [`escape_html`] before it
//! reaches the host document. The email body itself is only ever written into
//! the `srcdoc` attribute of a sandboxed frame.

use crate::analytics::{Analytics, AnalyzedEmail};
use crate::controller::{Layout, ResultsController};
use crate::panel::{Panel, PanelState};

/// Stylesheet served at `/static/app.css`.
pub const APP_CSS: &str = include_str!("../static/app.css");

/// Drop handling, picker wiring and Escape forwarding.
const PAGE_SCRIPT: &str = include_str!("../static/app.js");

/// Sizes the frame to its content once the body has loaded.
const FRAME_ONLOAD: &str =
    "this.style.height=this.contentWindow.document.documentElement.scrollHeight+'px'";

/// Seconds between reloads while a batch request is in flight.
const BUSY_REFRESH_SECS: u32 = 2;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turns a free-form status token into something usable as a class name.
pub fn status_class(token: &str) -> String {
    let class: String = token
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if class.is_empty() {
        "unknown".to_string()
    } else {
        class
    }
}

/// Full page: upload form, drop zone or results, and the modal overlay.
pub fn render_page(controller: &ResultsController) -> String {
    let refresh = if controller.is_busy() {
        format!(
            r#"<meta http-equiv="refresh" content="{}">"#,
            BUSY_REFRESH_SECS
        )
    } else {
        String::new()
    };

    let drop_zone = if controller.drop_zone_visible() {
        r#"<div id="drop-zone" class="drop-zone" data-action="open-file-picker" data-drop-target>
        <p>Drag &amp; drop <strong>.eml</strong> files here, or click to browse</p>
    </div>"#
    } else {
        ""
    };

    let modal = controller
        .modal_panel()
        .map(render_modal)
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    {}
    <title>EML Phishing Analyzer</title>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body data-layout="{}">
<main class="container">
    <h1>EML Phishing Analyzer</h1>
    <form id="upload-form" method="post" action="/upload" enctype="multipart/form-data">
        <input type="file" id="file-input" name="eml_files" accept=".eml" multiple hidden>
    </form>
    {}
    <div id="results">
{}
    </div>
</main>
{}
<script>{}</script>
</body>
</html>"#,
        refresh,
        controller.layout(),
        drop_zone,
        render_results(controller),
        modal,
        PAGE_SCRIPT
    )
}

/// The results container: panels in intake order, then the "Add more" row.
pub fn render_results(controller: &ResultsController) -> String {
    let mut html: String = controller
        .panels()
        .iter()
        .map(|panel| render_panel(panel, controller.layout()))
        .collect();

    if controller.has_add_more_row() {
        html.push_str(ADD_MORE_ROW);
    }
    html
}

const ADD_MORE_ROW: &str = r#"
        <div class="add-more-row" data-action="open-file-picker" data-drop-target>Add More Files</div>"#;

pub fn render_panel(panel: &Panel, layout: Layout) -> String {
    let inner = match &panel.state {
        PanelState::Loading => render_placeholder(panel),
        PanelState::Failed { error } => format!(
            r#"<p class="panel-error">Error processing {}: {}</p>"#,
            escape_html(&panel.filename),
            escape_html(error)
        ),
        PanelState::Rendered(email) => render_rendered(panel, email, layout),
    };

    format!(
        r#"
        <div class="result-item" id="{}">{}</div>"#,
        escape_html(panel.id.as_str()),
        inner
    )
}

fn render_placeholder(panel: &Panel) -> String {
    format!(
        r#"
            <div class="collapsible">
                <button class="collapsible-header" type="button" disabled>
                    <span>{}</span>
                    <span class="loading-spinner"></span>
                </button>
                <div class="collapsible-content">
                    <p class="loading-text">Loading email content and analytics...</p>
                </div>
            </div>"#,
        escape_html(&panel.filename)
    )
}

fn render_rendered(panel: &Panel, email: &AnalyzedEmail, layout: Layout) -> String {
    let id = escape_html(panel.id.as_str());
    let (action, badges, icon) = match layout {
        Layout::Accordion => (
            "toggle",
            String::new(),
            if panel.expanded { "▲" } else { "▼" },
        ),
        Layout::Modal => ("modal", render_badges(&email.analytics), "⤢"),
    };

    let content = match layout {
        Layout::Accordion => format!(
            r#"
                <div class="collapsible-content" style="display: {};">{}</div>"#,
            if panel.expanded { "block" } else { "none" },
            render_preview(email, true)
        ),
        Layout::Modal => String::new(),
    };

    format!(
        r#"
            <div class="collapsible{}">
                <form method="post" action="/panels/{}/{}">
                    <button class="collapsible-header" type="submit">
                        <span>{}</span>{}
                        <span class="toggle-icon">{}</span>
                    </button>
                </form>{}{}
            </div>"#,
        if panel.expanded { " active" } else { "" },
        id,
        action,
        escape_html(&email.filename),
        badges,
        icon,
        render_reasons(&email.analytics),
        content
    )
}

fn render_badges(analytics: &Analytics) -> String {
    let badges: String = [
        ("SPF", &analytics.spf),
        ("DKIM", &analytics.dkim),
        ("DMARC", &analytics.dmarc),
    ]
    .iter()
    .map(|(label, token)| {
        format!(
            r#"<span class="badge {}">{}: {}</span>"#,
            status_class(token),
            label,
            escape_html(token)
        )
    })
    .collect();

    format!(
        r#"
                        <span class="badges">{}</span>"#,
        badges
    )
}

/// Always-visible verdict summary under the header.
fn render_reasons(analytics: &Analytics) -> String {
    let (class, verdict) = if analytics.is_phishing {
        ("phishing", "Phishing detected")
    } else {
        ("safe", "No phishing detected")
    };

    let confidence = if analytics.confidence.is_empty() {
        String::new()
    } else {
        format!(
            r#" <span class="confidence">(confidence: {})</span>"#,
            escape_html(&analytics.confidence)
        )
    };

    let reasons = if analytics.reasons.is_empty() {
        String::new()
    } else {
        let items: String = analytics
            .reasons
            .iter()
            .map(|r| format!("<li>{}</li>", escape_html(r)))
            .collect();
        format!("<ul>{}</ul>", items)
    };

    format!(
        r#"
                <div class="reasons-box {}"><strong>{}</strong>{}{}</div>"#,
        class, verdict, confidence, reasons
    )
}

/// Escaped headers plus the sandboxed body frame.
fn render_preview(email: &AnalyzedEmail, with_analytics: bool) -> String {
    let analytics = if with_analytics {
        let a = &email.analytics;
        format!(
            r#"
                        <div class="analytics">
                            <h4>Analytics</h4>
                            <div class="analytics-item"><span>SPF</span><span class="{}">{}</span></div>
                            <div class="analytics-item"><span>DKIM</span><span class="{}">{}</span></div>
                            <div class="analytics-item"><span>DMARC</span><span class="{}">{}</span></div>
                        </div>"#,
            status_class(&a.spf),
            escape_html(&a.spf),
            status_class(&a.dkim),
            escape_html(&a.dkim),
            status_class(&a.dmarc),
            escape_html(&a.dmarc)
        )
    } else {
        String::new()
    };

    format!(
        r#"
                    <div class="email-preview">
                        <div class="email-header">
                            <h3>{}</h3>
                            <p><strong>From:</strong> {}</p>
                            <p><strong>To:</strong> {}</p>
                            <p><strong>Date:</strong> {}</p>
                        </div>
                        <div class="email-body">
                            <iframe sandbox="allow-same-origin" srcdoc="{}" onload="{}"></iframe>
                        </div>{}
                    </div>"#,
        escape_html(&email.subject),
        escape_html(&email.from),
        escape_html(&email.to),
        escape_html(&email.date),
        escape_html(&email.body_html),
        FRAME_ONLOAD,
        analytics
    )
}

/// Overlay for the modal layout. The backdrop and the close button each post
/// their own action; Escape is forwarded by the page script.
pub fn render_modal(panel: &Panel) -> String {
    let Some(email) = panel.email() else {
        return String::new();
    };

    format!(
        r#"<div class="modal-overlay" data-modal-open>
    <form method="post" action="/modal/backdrop" class="modal-backdrop-form">
        <button class="modal-backdrop" type="submit" aria-label="Close preview"></button>
    </form>
    <div class="modal" role="dialog" aria-modal="true" aria-label="{}">
        <form method="post" action="/modal/close">
            <button class="modal-close" type="submit" aria-label="Close">&times;</button>
        </form>{}
    </div>
</div>"#,
        escape_html(&email.filename),
        render_preview(email, false)
    )
}

#[cfg(test)]
mod tests {
    use super::{escape_html, render_page, render_panel, render_results, status_class};
    use crate::action::UiAction;
    use crate::analytics::{AnalyzeEntry, AnalyzedEmail, Analytics};
    use crate::controller::{Layout, ResultsController};
    use crate::intake::CandidateFile;

    fn email(name: &str) -> AnalyzedEmail {
        AnalyzedEmail {
            filename: name.to_string(),
            subject: "Quarterly report".to_string(),
            from: "boss@example.com".to_string(),
            to: "me@example.org".to_string(),
            date: "Mon, 7 Oct 2024 09:00:00 +0000".to_string(),
            body_html: r#"<p class="x">Hi</p><script>alert(1)</script>"#.to_string(),
            analytics: Analytics {
                spf: "pass".to_string(),
                dkim: "fail".to_string(),
                dmarc: "none".to_string(),
                is_phishing: true,
                confidence: "high".to_string(),
                reasons: vec!["Lookalike <domain>".to_string()],
            },
        }
    }

    fn controller_with(layout: Layout, entry: AnalyzeEntry) -> ResultsController {
        let mut controller = ResultsController::new(layout);
        let batch = controller
            .intake(vec![CandidateFile::new(entry.filename(), "raw")])
            .unwrap();
        controller.reconcile(&batch.correlation, vec![entry]);
        controller
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_status_class() {
        assert_eq!(status_class("Pass"), "pass");
        assert_eq!(status_class("soft fail\" onclick=x"), "softfailonclickx");
        assert_eq!(status_class("<>"), "unknown");
    }

    #[test]
    fn test_header_fields_render_as_text() {
        let mut e = email("a.eml");
        e.subject = r#"<img src=x onerror="alert(1)"> & co"#.to_string();
        e.from = "Evil <evil@example.com>".to_string();
        e.to = r#""Team & Co" <team@example.org>"#.to_string();
        e.date = r#"<b>Mon</b> "today" & later"#.to_string();
        let controller = controller_with(Layout::Accordion, AnalyzeEntry::Analyzed(e));

        let html = render_results(&controller);
        assert!(html.contains("&lt;img src=x onerror=&quot;alert(1)&quot;&gt; &amp; co"));
        assert!(html.contains("<strong>From:</strong> Evil &lt;evil@example.com&gt;</p>"));
        assert!(html.contains(
            "<strong>To:</strong> &quot;Team &amp; Co&quot; &lt;team@example.org&gt;</p>"
        ));
        assert!(html.contains(
            "<strong>Date:</strong> &lt;b&gt;Mon&lt;/b&gt; &quot;today&quot; &amp; later</p>"
        ));
        assert!(!html.contains("<img"));
        assert!(!html.contains("<b>Mon"));
    }

    #[test]
    fn test_body_only_inside_sandboxed_frame() {
        let controller = controller_with(Layout::Accordion, AnalyzeEntry::Analyzed(email("a.eml")));
        let html = render_results(&controller);

        assert!(html.contains(r#"sandbox="allow-same-origin""#));
        assert!(html.contains(
            "srcdoc=\"&lt;p class=&quot;x&quot;&gt;Hi&lt;/p&gt;&lt;script&gt;alert(1)&lt;/script&gt;\""
        ));
        assert!(!html.contains("<script>alert(1)"));
    }

    #[test]
    fn test_error_panel_has_no_analytics() {
        let controller = controller_with(
            Layout::Modal,
            AnalyzeEntry::Failed {
                filename: "a.eml".to_string(),
                error: "parse failure".to_string(),
            },
        );
        let html = render_results(&controller);

        assert!(html.contains("Error processing a.eml: parse failure"));
        assert!(!html.contains("reasons-box"));
        assert!(!html.contains("class=\"analytics\""));
        assert!(!html.contains("badge"));
    }

    #[test]
    fn test_placeholder_has_spinner_and_disabled_header() {
        let mut controller = ResultsController::default();
        controller
            .intake(vec![CandidateFile::new("a<b>.eml", "raw")])
            .unwrap();
        let html = render_panel(&controller.panels()[0], Layout::Modal);

        assert!(html.contains("loading-spinner"));
        assert!(html.contains("disabled"));
        assert!(html.contains("a&lt;b&gt;.eml"));
    }

    #[test]
    fn test_modal_layout_header_badges_and_reasons() {
        let controller = controller_with(Layout::Modal, AnalyzeEntry::Analyzed(email("a.eml")));
        let html = render_results(&controller);

        assert!(html.contains(r#"<span class="badge pass">SPF: pass</span>"#));
        assert!(html.contains(r#"<span class="badge fail">DKIM: fail</span>"#));
        assert!(html.contains(r#"<div class="reasons-box phishing"><strong>Phishing detected</strong>"#));
        assert!(html.contains("(confidence: high)"));
        assert!(html.contains("<li>Lookalike &lt;domain&gt;</li>"));
        assert!(html.contains("/modal\""));
        // the body is not inlined until the modal opens
        assert!(!html.contains("iframe"));
    }

    #[test]
    fn test_accordion_layout_has_no_badges() {
        let controller = controller_with(Layout::Accordion, AnalyzeEntry::Analyzed(email("a.eml")));
        let html = render_results(&controller);

        assert!(!html.contains("class=\"badge"));
        assert!(html.contains("reasons-box"));
        assert!(html.contains("display: none;"));
        assert!(html.contains("/toggle\""));
    }

    #[test]
    fn test_page_states() {
        let mut controller = ResultsController::default();
        let empty = render_page(&controller);
        assert!(empty.contains("id=\"drop-zone\""));
        assert!(!empty.contains("add-more-row\""));
        assert!(!empty.contains("http-equiv=\"refresh\""));

        let batch = controller
            .intake(vec![CandidateFile::new("a.eml", "raw")])
            .unwrap();
        let busy = render_page(&controller);
        assert!(!busy.contains("id=\"drop-zone\""));
        assert!(busy.contains("class=\"add-more-row\""));
        assert!(busy.contains("http-equiv=\"refresh\""));

        controller.reconcile(&batch.correlation, vec![AnalyzeEntry::Analyzed(email("a.eml"))]);
        let id = controller.panels()[0].id.clone();
        controller.dispatch(UiAction::OpenModal(id));
        let open = render_page(&controller);
        assert!(open.contains("modal-overlay"));
        assert!(open.contains("action=\"/modal/backdrop\""));
        assert!(open.contains("action=\"/modal/close\""));
        assert!(open.contains("<iframe sandbox"));
    }

    #[test]
    fn test_add_more_row_is_last() {
        let mut controller = ResultsController::default();
        controller.intake(vec![CandidateFile::new("a.eml", "raw")]);
        controller.intake(vec![CandidateFile::new("b.eml", "raw")]);
        let html = render_results(&controller);

        let a = html.find("a.eml").unwrap();
        let b = html.find("b.eml").unwrap();
        let row = html.find("add-more-row").unwrap();
        assert!(a < b && b < row);
        assert_eq!(html.matches("add-more-row").count(), 1);
    }
}
