use clap::Parser;
use eml_phish_viewer::{
    client::HttpAnalyzeClient,
    config::Config,
    controller::ResultsController,
    intake::CandidateFile,
    panel::{Panel, PanelState},
    submit::run_batch,
};
use env_logger::Env;
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(about = "Send .eml files to the analysis backend and print the results")]
struct Cli {
    /// .eml files or directories containing them
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Backend /analyze URL (overrides ANALYZE_URL)
    #[arg(long)]
    analyze_url: Option<String>,

    /// Files per request; 0 sends everything in one batch
    #[arg(long, default_value_t = 0)]
    batch_size: usize,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

/// Reads a file, or every regular file directly inside a directory.
fn read_candidates(path: &Path, out: &mut Vec<CandidateFile>) -> anyhow::Result<()> {
    if path.is_dir() {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        entries.sort();
        for entry in entries {
            read_candidates(&entry, out)?;
        }
        return Ok(());
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    out.push(CandidateFile::new(name, std::fs::read(path)?));
    Ok(())
}

fn panel_json(panel: &Panel) -> serde_json::Value {
    match &panel.state {
        PanelState::Loading => json!({
            "filename": panel.filename,
            "status": "loading",
        }),
        PanelState::Failed { error } => json!({
            "filename": panel.filename,
            "status": "error",
            "error": error,
        }),
        PanelState::Rendered(email) => json!({
            "filename": panel.filename,
            "status": "rendered",
            "email": email,
        }),
    }
}

fn print_panel(panel: &Panel) {
    println!("{}", panel.filename);
    match &panel.state {
        PanelState::Loading => println!("  No result (batch request failed)"),
        PanelState::Failed { error } => println!("  Error: {}", error),
        PanelState::Rendered(email) => {
            let a = &email.analytics;
            let verdict = if a.is_phishing { "Phishing" } else { "Not phishing" };
            if a.confidence.is_empty() {
                println!("  Verdict: {}", verdict);
            } else {
                println!("  Verdict: {} (confidence: {})", verdict, a.confidence);
            }
            println!("  Subject: {}", email.subject);
            println!("  From: {}", email.from);
            println!("  SPF: {}  DKIM: {}  DMARC: {}", a.spf, a.dkim, a.dmarc);
            for reason in &a.reasons {
                println!("    - {}", reason);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.analyze_url {
        config.analyze_url = url;
    }

    let mut candidates = Vec::new();
    for path in &cli.input {
        read_candidates(path, &mut candidates)?;
    }

    let chunk = if cli.batch_size == 0 {
        candidates.len().max(1)
    } else {
        cli.batch_size
    };

    let controller = Mutex::new(ResultsController::new(config.layout));
    let mut batches = Vec::new();
    {
        let mut guard = controller.lock().await;
        let mut remaining = candidates.into_iter().peekable();
        while remaining.peek().is_some() {
            let group: Vec<_> = remaining.by_ref().take(chunk).collect();
            if let Some(batch) = guard.intake(group) {
                batches.push(batch);
            }
        }
    }

    if batches.is_empty() {
        eprintln!("Error: no .eml files among the given inputs.");
        std::process::exit(1);
    }

    let client = HttpAnalyzeClient::new(config.analyze_url.clone())?;
    log::info!(
        "Submitting {} batch(es) to {}",
        batches.len(),
        client.endpoint()
    );

    futures::future::join_all(
        batches
            .into_iter()
            .map(|batch| run_batch(&controller, &client, batch)),
    )
    .await;

    let controller = controller.into_inner();
    if cli.json {
        let panels: Vec<_> = controller.panels().iter().map(panel_json).collect();
        println!("{}", serde_json::to_string_pretty(&panels)?);
    } else {
        for panel in controller.panels() {
            print_panel(panel);
        }
    }

    Ok(())
}
