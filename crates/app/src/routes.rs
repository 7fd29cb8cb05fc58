use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use hanja_core::model::{
    Chapter, Hanja, HanjaDraft, HanjaId, HanjaPatch, Namespace, ProgressRecord, ProgressScope,
    UserId,
};
use services::api_client::progress_resource;
use services::{AppServices, HanjaListResponse, ProgressListResponse};

use crate::error::{HANJA_NOT_FOUND, HttpError};

#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
}

#[derive(Debug, Serialize)]
struct ChapterSummaryDto {
    chapter: Chapter,
    count: usize,
}

#[derive(Debug, Serialize)]
struct ChapterListResponse {
    chapters: Vec<ChapterSummaryDto>,
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/api/hanja", get(list_hanja).post(create_hanja))
        .route(
            "/api/hanja/{id}",
            get(get_hanja).put(update_hanja).delete(delete_hanja),
        )
        .route("/api/hanja/chapter/{chapter}", get(list_chapter))
        .route("/api/chapters", get(list_chapters));

    Namespace::ALL
        .into_iter()
        .fold(router, progress_routes)
        .with_state(state)
        .layer(from_fn(log_request))
        .layer(cors)
}

/// `/api/{study,practice}-progress` routes for one namespace.
fn progress_routes(router: Router<AppState>, namespace: Namespace) -> Router<AppState> {
    let base = format!("/api/{}", progress_resource(namespace));
    router
        .route(
            &base,
            post(
                move |State(state): State<AppState>, Json(record): Json<ProgressRecord>| async move {
                    save_progress(&state, namespace, record).await
                },
            ),
        )
        .route(
            &format!("{base}/{{user_id}}"),
            get(
                move |State(state): State<AppState>, Path(user): Path<String>| async move {
                    list_progress(&state, namespace, user, ProgressScope::All).await
                },
            ),
        )
        .route(
            &format!("{base}/{{user_id}}/chapter/{{chapter}}"),
            get(
                move |State(state): State<AppState>, Path((user, chapter)): Path<(String, u32)>| async move {
                    list_chapter_progress(&state, namespace, user, chapter).await
                },
            ),
        )
}

async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let response = next.run(req).await;
    tracing::info!(%method, %uri, status = %response.status(), "request");
    response
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "한자 5급 API 서버입니다." }))
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

fn parse_id(raw: String) -> Result<HanjaId, HttpError> {
    HanjaId::new(raw).map_err(|_| HttpError::NotFound(HANJA_NOT_FOUND.to_string()))
}

async fn list_hanja(State(state): State<AppState>) -> Result<Json<HanjaListResponse>, HttpError> {
    let hanja = state.services.catalog().list_all().await?;
    Ok(Json(HanjaListResponse { hanja }))
}

async fn get_hanja(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Hanja>, HttpError> {
    let id = parse_id(id)?;
    Ok(Json(state.services.catalog().get(&id).await?))
}

async fn list_chapter(
    State(state): State<AppState>,
    Path(chapter): Path<u32>,
) -> Result<Json<HanjaListResponse>, HttpError> {
    let chapter = Chapter::new(chapter)?;
    let hanja = state.services.catalog().list_chapter(chapter).await?;
    Ok(Json(HanjaListResponse { hanja }))
}

async fn list_chapters(
    State(state): State<AppState>,
) -> Result<Json<ChapterListResponse>, HttpError> {
    let chapters = state
        .services
        .catalog()
        .chapters()
        .await?
        .into_iter()
        .map(|s| ChapterSummaryDto {
            chapter: s.chapter,
            count: s.count,
        })
        .collect();
    Ok(Json(ChapterListResponse { chapters }))
}

async fn create_hanja(
    State(state): State<AppState>,
    Json(draft): Json<HanjaDraft>,
) -> Result<(StatusCode, Json<Hanja>), HttpError> {
    let created = state.services.catalog().create(draft).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_hanja(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<HanjaPatch>,
) -> Result<Json<Hanja>, HttpError> {
    let id = parse_id(id)?;
    Ok(Json(state.services.catalog().update(&id, patch).await?))
}

async fn delete_hanja(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let id = parse_id(id)?;
    state.services.catalog().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

async fn list_progress(
    state: &AppState,
    namespace: Namespace,
    user: String,
    scope: ProgressScope,
) -> Result<Json<ProgressListResponse>, HttpError> {
    let user = UserId::new(user);
    let progress = state.services.progress().list(namespace, &user, scope).await?;
    Ok(Json(ProgressListResponse { progress }))
}

async fn list_chapter_progress(
    state: &AppState,
    namespace: Namespace,
    user: String,
    chapter: u32,
) -> Result<Json<ProgressListResponse>, HttpError> {
    let chapter = Chapter::new(chapter)?;
    list_progress(state, namespace, user, ProgressScope::Chapter(chapter)).await
}

async fn save_progress(
    state: &AppState,
    namespace: Namespace,
    record: ProgressRecord,
) -> Result<Json<ProgressRecord>, HttpError> {
    Ok(Json(state.services.progress().save(namespace, &record).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use hanja_core::model::Classification;
    use hanja_core::time::fixed_clock;
    use services::{
        ApiClient, ApiError, AppContext, ClassifyOutcome, ProgressStore, ProgressStoreError,
        SessionController, SessionPhase, SessionScope,
    };
    use tower::ServiceExt;

    async fn app() -> Router {
        let services = AppServices::in_memory(fixed_clock());
        services.seed_samples(false).await.unwrap();
        router(AppState { services }, CorsLayer::permissive())
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn root_banner() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "한자 5급 API 서버입니다.");
    }

    #[tokio::test]
    async fn catalog_reads() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/hanja", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hanja"].as_array().unwrap().len(), 12);

        let (_, body) = send(&app, "GET", "/api/hanja/chapter/2", None).await;
        assert_eq!(body["hanja"].as_array().unwrap().len(), 4);

        let (status, body) = send(&app, "GET", "/api/hanja/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "1");
        assert!(body.get("strokeOrder").is_some());

        let (status, body) = send(&app, "GET", "/api/hanja/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], HANJA_NOT_FOUND);

        let (status, _) = send(&app, "GET", "/api/hanja/chapter/0", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = send(&app, "GET", "/api/chapters", None).await;
        assert_eq!(body["chapters"][0], json!({ "chapter": 1, "count": 6 }));
    }

    #[tokio::test]
    async fn catalog_writes() {
        let app = app().await;
        let draft = json!({
            "character": "森",
            "sound": "삼",
            "meaning": "수풀",
            "chapter": 3,
            "examples": [{ "sentence": "森林", "meaning": "삼림" }]
        });
        let (status, created) = send(&app, "POST", "/api/hanja", Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], "13");
        assert_eq!(created["difficulty"], 2);

        let (status, updated) = send(
            &app,
            "PUT",
            "/api/hanja/13",
            Some(json!({ "meaning": "빽빽할" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["meaning"], "빽빽할");
        assert_eq!(updated["sound"], "삼");

        let (status, _) = send(&app, "PUT", "/api/hanja/13", Some(json!({ "chapter": 0 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "DELETE", "/api/hanja/13", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", "/api/hanja/13", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let blank = json!({ "character": " ", "sound": "삼", "meaning": "수풀", "chapter": 3 });
        let (status, body) = send(&app, "POST", "/api/hanja", Some(blank)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn progress_namespaces_are_independent() {
        let app = app().await;
        let record = json!({ "user_id": "지민", "hanja_id": "5", "chapter": 1, "is_known": false });
        let (status, echoed) =
            send(&app, "POST", "/api/practice-progress", Some(record)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(echoed["hanja_id"], "5");
        assert!(echoed["updated_at"].is_string());

        let flipped = json!({ "user_id": "지민", "hanja_id": "5", "chapter": 1, "is_known": true });
        send(&app, "POST", "/api/practice-progress", Some(flipped)).await;

        let uri = "/api/practice-progress/%EC%A7%80%EB%AF%BC/chapter/1";
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let progress = body["progress"].as_array().unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0]["is_known"], true);

        let (_, study) = send(&app, "GET", "/api/study-progress/%EC%A7%80%EB%AF%BC", None).await;
        assert!(study["progress"].as_array().unwrap().is_empty());

        let (_, other) = send(&app, "GET", "/api/practice-progress/default/chapter/2", None).await;
        assert!(other["progress"].as_array().unwrap().is_empty());
    }

    //
    // ─── OVER HTTP ─────────────────────────────────────────────────────────────────
    //

    /// Serve the router on an ephemeral local port and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn chapter_one() -> Chapter {
        Chapter::new(1).unwrap()
    }

    #[tokio::test]
    async fn practice_session_completes_through_api_client() {
        let base = serve(app().await).await;
        let client = ApiClient::new(&base).unwrap();
        let user = UserId::new("김 민지");
        let ctx = AppContext::new(client.list_hanja().await.unwrap(), user.clone());
        assert_eq!(ctx.catalog().len(), 12);

        let mut session = SessionController::new(
            ctx,
            Arc::new(client.clone()),
            SessionScope::Chapter(chapter_one()),
            Namespace::Practice,
        )
        .with_seed(5);
        assert_eq!(session.start().await, Ok(SessionPhase::Active));

        let missed = HanjaId::from_number(3);
        let mut outcomes = Vec::new();
        while let Some(id) = session.current_card().map(|card| card.id.clone()) {
            let classification = if id == missed && !session.is_review_pass() {
                Classification::Unknown
            } else {
                Classification::Known
            };
            outcomes.push(session.classify(&id, classification).await);
        }

        assert_eq!(outcomes.len(), 7);
        assert!(outcomes[..5].iter().all(|o| *o == ClassifyOutcome::Advanced));
        assert_eq!(outcomes[5], ClassifyOutcome::ReviewStarted { cards: 1 });
        assert_eq!(outcomes[6], ClassifyOutcome::Completed);
        assert_eq!(session.phase(), SessionPhase::Complete);

        let stored = client
            .fetch_progress(Namespace::Practice, &user, ProgressScope::Chapter(chapter_one()))
            .await
            .unwrap();
        assert_eq!(stored.len(), 6);
        assert!(stored.iter().all(|r| r.is_known && r.updated_at.is_some()));

        let study = client
            .fetch_progress(Namespace::Study, &user, ProgressScope::All)
            .await
            .unwrap();
        assert!(study.is_empty());
    }

    #[tokio::test]
    async fn api_client_save_echoes_stamped_record() {
        let base = serve(app().await).await;
        let client = ApiClient::new(&base).unwrap();
        let record = ProgressRecord::new(
            UserId::new("지민"),
            HanjaId::from_number(4),
            chapter_one(),
            Classification::Unknown,
        );
        let saved = client.save_progress(Namespace::Study, &record).await.unwrap();
        assert_eq!(saved.hanja_id, record.hanja_id);
        assert!(!saved.is_known);
        assert!(saved.updated_at.is_some());

        assert_eq!(
            client.get_hanja(&HanjaId::from_number(4)).await.unwrap().map(|h| h.character),
            Some("人".to_string())
        );
        assert_eq!(client.get_hanja(&HanjaId::from_number(404)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejected_saves_surface_status_and_session_still_advances() {
        let base = serve(app().await).await;
        let catalog = ApiClient::new(&base).unwrap().list_hanja().await.unwrap();
        let client = ApiClient::new(&format!("{base}/missing")).unwrap();

        let record = ProgressRecord::new(
            UserId::default(),
            HanjaId::from_number(1),
            chapter_one(),
            Classification::Known,
        );
        let err = client
            .save_progress(Namespace::Study, &record)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressStoreError::Api(ApiError::HttpStatus(StatusCode::NOT_FOUND))
        ));

        let mut session = SessionController::new(
            AppContext::new(catalog, UserId::default()),
            Arc::new(client),
            SessionScope::Chapter(chapter_one()),
            Namespace::Study,
        )
        .with_seed(1);
        assert_eq!(session.start().await, Ok(SessionPhase::Active));
        assert_eq!(session.progress().total, 6);

        let first = session.current_card().map(|card| card.id.clone()).unwrap();
        assert_eq!(
            session.classify(&first, Classification::Known).await,
            ClassifyOutcome::Advanced
        );
        assert_eq!(session.progress().resolved, 1);
        assert!(session.known_ids().contains(&first));
        assert_eq!(session.position().as_deref(), Some("2 / 6"));
    }
}
