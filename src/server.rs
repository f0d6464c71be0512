use actix_multipart::Multipart;
use actix_web::{HttpResponse, Responder, http::header, web};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::action::{Key, UiAction};
use crate::client::UPLOAD_FIELD;
use crate::controller::ResultsController;
use crate::intake::{CandidateFile, CorrelationId};
use crate::render::{APP_CSS, render_page};
use crate::submit::{SharedClient, SharedController, start_batch};

/// State shared by every worker: the single controller instance and the backend client.
pub struct AppState {
    pub controller: SharedController,
    pub client: SharedClient,
}

impl AppState {
    pub fn new(controller: ResultsController, client: SharedClient) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            client,
        }
    }
}

/// Registers the page routes. Each action route maps onto one `UiAction` kind.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/upload", web::post().to(upload))
        .route("/panels/{id}/toggle", web::post().to(toggle))
        .route("/panels/{id}/modal", web::post().to(open_modal))
        .route("/modal/close", web::post().to(close_modal))
        .route("/modal/backdrop", web::post().to(backdrop))
        .route("/keys/{key}", web::post().to(key))
        .route("/static/app.css", web::get().to(stylesheet));
}

async fn index(state: web::Data<AppState>) -> impl Responder {
    let html = render_page(&*state.controller.lock().await);
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}

async fn upload(state: web::Data<AppState>, mut payload: Multipart) -> impl Responder {
    let candidates = match read_candidates(&mut payload).await {
        Ok(c) => c,
        Err(e) => return HttpResponse::BadRequest().body(format!("Failed to read upload: {}", e)),
    };

    if start_batch(&state.controller, &state.client, candidates)
        .await
        .is_none()
    {
        log::debug!("Upload contained no .eml files");
    }
    back_to_page()
}

/// Collects every `eml_files` part that carries a filename.
async fn read_candidates(payload: &mut Multipart) -> anyhow::Result<Vec<CandidateFile>> {
    let mut candidates = Vec::new();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?
    {
        let filename = field
            .content_disposition()
            .filter(|cd| cd.get_name() == Some(UPLOAD_FIELD))
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut content = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?
        {
            content.extend_from_slice(&chunk);
        }

        if let Some(name) = filename {
            candidates.push(CandidateFile::new(name, content));
        }
    }

    Ok(candidates)
}

async fn toggle(state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    dispatch(&state, UiAction::Toggle(CorrelationId::from_raw(id.into_inner()))).await
}

async fn open_modal(state: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    dispatch(&state, UiAction::OpenModal(CorrelationId::from_raw(id.into_inner()))).await
}

async fn close_modal(state: web::Data<AppState>) -> impl Responder {
    dispatch(&state, UiAction::CloseModal).await
}

async fn backdrop(state: web::Data<AppState>) -> impl Responder {
    dispatch(&state, UiAction::OutsideClick).await
}

async fn key(state: web::Data<AppState>, name: web::Path<String>) -> impl Responder {
    dispatch(&state, UiAction::Key(Key::from_name(&name))).await
}

async fn stylesheet() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/css; charset=utf-8")
        .body(APP_CSS)
}

async fn dispatch(state: &AppState, action: UiAction) -> HttpResponse {
    let outcome = state.controller.lock().await.dispatch(action);
    log::debug!("UI action outcome: {:?}", outcome);
    back_to_page()
}

fn back_to_page() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish()
}
