use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::hyper::body::Bytes;
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::error::{ApiError, ErrorBody};
use crate::validate;
use crate::PhotoStore;

/// Largest accepted request body (64KB)
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

pub struct GalleryServer {
    store: Arc<PhotoStore>,
    static_dir: Option<PathBuf>,
}

impl GalleryServer {
    pub fn new(store: Arc<PhotoStore>, static_dir: Option<PathBuf>) -> Self {
        Self { store, static_dir }
    }

    /// Serves until `shutdown` resolves, then lets in-flight requests finish.
    pub async fn run(
        &self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), warp::Error> {
        let routes = routes(self.store.clone(), self.static_dir.clone());
        let (bound, server) = warp::serve(routes).try_bind_with_graceful_shutdown(addr, shutdown)?;

        info!("Gallery listening on {}", bound);
        server.await;
        info!("Gallery stopped");
        Ok(())
    }
}

/// Every route the server exposes, with error recovery and request tracing.
pub fn routes(
    store: Arc<PhotoStore>,
    static_dir: Option<PathBuf>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let api = api(store);

    let app: BoxedFilter<(Response,)> = match static_dir {
        Some(dir) => {
            info!("Serving UI from {}", dir.display());
            api.or(ui(dir)).unify().boxed()
        }
        None => api.boxed(),
    };

    app.recover(recover)
    .unify()
    .with(warp::trace::request())
}

/// The four photo endpoints under `/api/photos`.
pub fn api(store: Arc<PhotoStore>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    // GET /api/photos
    let list = warp::path!("api" / "photos")
    .and(warp::get())
    .and(with_store(store.clone()))
    .and_then(list_photos);

    // GET /api/photos/{id}
    let get = warp::path!("api" / "photos" / String)
    .and(warp::get())
    .and(with_store(store.clone()))
    .and_then(get_photo);

    // POST /api/photos
    let create = warp::path!("api" / "photos")
    .and(warp::post())
    .and(warp::body::content_length_limit(MAX_BODY_BYTES))
    .and(warp::body::bytes())
    .and(with_store(store.clone()))
    .and_then(create_photo);

    // DELETE /api/photos/{id}
    let delete = warp::path!("api" / "photos" / String)
    .and(warp::delete())
    .and(with_store(store))
    .and_then(delete_photo);

    list.or(get).unify().or(create).unify().or(delete).unify()
}

fn with_store(store: Arc<PhotoStore>) -> impl Filter<Extract = (Arc<PhotoStore>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

/// Static files for the browser UI; unknown non-API paths get `index.html`
/// so client-side routes survive a reload.
fn ui(dir: PathBuf) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let index = dir.join("index.html");

    let outside_api = warp::path::full()
    .and_then(|path: FullPath| async move {
        if path.as_str() == "/api" || path.as_str().starts_with("/api/") {
            Err(warp::reject::not_found())
        } else {
            Ok(())
        }
    })
    .untuple_one();

    warp::get()
    .and(outside_api)
    .and(warp::fs::dir(dir).or(warp::fs::file(index)).unify())
    .map(|file: warp::fs::File| file.into_response())
}

// --- HANDLERS ---

async fn list_photos(store: Arc<PhotoStore>) -> Result<Response, Infallible> {
    let result = store
    .get_all_photos()
    .map_err(ApiError::unexpected("Failed to fetch photos"));

    Ok(respond(StatusCode::OK, result))
}

async fn get_photo(id: String, store: Arc<PhotoStore>) -> Result<Response, Infallible> {
    let result = parse_id(&id).and_then(|id| {
        store
        .get_photo(id)
        .map_err(ApiError::unexpected("Failed to fetch photo"))?
        .ok_or(ApiError::NotFound)
    });

    Ok(respond(StatusCode::OK, result))
}

async fn create_photo(body: Bytes, store: Arc<PhotoStore>) -> Result<Response, Infallible> {
    let result = validate::parse_new_photo(&body)
    .map_err(ApiError::Validation)
    .and_then(|new_photo| {
        store
        .create_photo(new_photo)
        .map_err(ApiError::unexpected("Failed to create photo"))
    });

    if let Ok(photo) = &result {
        info!(id = %photo.id, title = %photo.title, "Photo created");
    }
    Ok(respond(StatusCode::CREATED, result))
}

async fn delete_photo(id: String, store: Arc<PhotoStore>) -> Result<Response, Infallible> {
    let result = parse_id(&id).and_then(|id| {
        let removed = store
        .delete_photo(id)
        .map_err(ApiError::unexpected("Failed to delete photo"))?;

        if removed {
            info!(%id, "Photo deleted");
            Ok(json!({ "message": "Photo deleted successfully" }))
        } else {
            Err(ApiError::NotFound)
        }
    });

    Ok(respond(StatusCode::OK, result))
}

// Only the exact form the store issued (lowercase, hyphenated) names a record
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    let id = Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)?;
    if id.hyphenated().to_string() != raw {
        return Err(ApiError::NotFound);
    }
    Ok(id)
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), status).into_response(),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &ApiError) -> Response {
    match err {
        ApiError::Unexpected { source, .. } => error!("{}: {}", err, source),
        ApiError::Validation(errors) => warn!(count = errors.len(), "Rejected invalid photo"),
        ApiError::NotFound => {}
    }
    warp::reply::with_status(warp::reply::json(&err.body()), err.status()).into_response()
}

/// Turns leftover rejections into JSON error bodies.
pub async fn recover(rejection: Rejection) -> Result<Response, Infallible> {
    if let Some(err) = rejection.find::<ApiError>() {
        return Ok(error_response(err));
    }

    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Length required")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        error!("Unhandled rejection: {:?}", rejection);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    let body = warp::reply::json(&ErrorBody::message(message));
    Ok(warp::reply::with_status(body, status).into_response())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(parse_id("abc"), Err(ApiError::NotFound)));
        assert!(parse_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn parse_id_only_takes_the_issued_form() {
        let id = Uuid::new_v4();

        for alias in [
            id.simple().to_string(),
            id.urn().to_string(),
            id.braced().to_string(),
            id.to_string().to_uppercase(),
        ] {
            assert!(matches!(parse_id(&alias), Err(ApiError::NotFound)), "{}", alias);
        }
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }

    #[tokio::test]
    async fn poisoned_store_answers_500_without_detail() {
        let store = Arc::new(PhotoStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.photos.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let filter = routes(store, None);

        let res = warp::test::request().path("/api/photos").reply(&filter).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "message": "Failed to fetch photos" }));

        let res = warp::test::request()
        .path(&format!("/api/photos/{}", Uuid::new_v4()))
        .reply(&filter)
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({ "message": "Failed to fetch photo" }));
    }

    #[tokio::test]
    async fn recover_maps_method_not_allowed() {
        let store = Arc::new(PhotoStore::new());
        let res = warp::test::request()
        .method("PUT")
        .path("/api/photos")
        .reply(&routes(store, None))
        .await;

        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["message"], "Method not allowed");
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let store = Arc::new(PhotoStore::new());
        let padding = "x".repeat(MAX_BODY_BYTES as usize + 1);
        let res = warp::test::request()
        .method("POST")
        .path("/api/photos")
        .json(&json!({ "url": "https://example.com/a.jpg", "title": padding, "date": "2024-01-01" }))
        .reply(&routes(store.clone(), None))
        .await;

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.is_empty().unwrap());
    }
}
