pub mod action;
pub mod analytics;
pub mod client;
pub mod config;
pub mod controller;
pub mod correlation;
pub mod intake;
pub mod panel;
pub mod render;
pub mod server;
pub mod submit;

pub use action::{ActionOutcome, Key, UiAction};
pub use analytics::{AnalyzeEntry, AnalyzedEmail, Analytics};
pub use client::{AnalyzeClient, HttpAnalyzeClient};
pub use config::Config;
pub use controller::{Layout, ReconcileReport, ResultsController};
pub use intake::{CandidateFile, CorrelationId, UploadBatch};
