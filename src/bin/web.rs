use actix_web::{App, HttpServer, web};
use clap::Parser;
use env_logger::Env;
use eml_phish_viewer::{
    config::Config,
    controller::{Layout, ResultsController},
    client::HttpAnalyzeClient,
    server::{AppState, configure},
};
use std::sync::Arc;

#[derive(Parser)]
#[command(about = "Upload .eml files and browse their phishing analytics")]
struct Args {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend /analyze URL (overrides ANALYZE_URL)
    #[arg(long)]
    analyze_url: Option<String>,

    /// accordion or modal (overrides LAYOUT)
    #[arg(long)]
    layout: Option<Layout>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.analyze_url {
        config.analyze_url = url;
    }
    if let Some(layout) = args.layout {
        config.layout = layout;
    }

    log::info!("Starting EML upload page ({} layout)", config.layout);
    log::info!("Forwarding batches to {}", config.analyze_url);

    let client = HttpAnalyzeClient::new(config.analyze_url.clone()).map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState::new(
        ResultsController::new(config.layout),
        Arc::new(client),
    ));

    log::info!("Binding to {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure)
            .wrap(actix_web::middleware::Logger::default())
    })
        .workers(config.workers)
        .keep_alive(std::time::Duration::from_secs(75)) // typical production keep-alive
        .max_connections(1_000)          // limit simultaneous connections
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
