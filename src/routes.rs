use crate::{
    error::{ErrorPayload, StudentsError},
    routes::students::{
        delete_student, get_single_student, get_students, post_create_student,
        put_update_student,
    },
    state::StudentsState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

pub mod input;
pub mod students;

pub fn app(state: StudentsState) -> Router {
    let server_config = state.config().server_config();

    let router = Router::new()
        .route("/createstudent", post(post_create_student))
        .route("/students", get(get_students))
        .route("/single-student/{id}", get(get_single_student))
        .route("/update-student/{id}", put(put_update_student))
        .route("/delete-student/{id}", delete(delete_student))
        .nest_service("/uploads", ServeDir::new(state.uploads().dir()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_body_bytes))
        .layer(map_response(body_limit_as_error))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if server_config.legacy_error_status {
        router.layer(map_response(legacy_error_status))
    } else {
        router
    }
}

///an oversized `Content-Length` is refused with a bare text 413 before any extractor runs
async fn body_limit_as_error(response: Response) -> Response {
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE
        && response.extensions().get::<ErrorPayload>().is_none()
    {
        StudentsError::BodyTooLarge.into_response()
    } else {
        response
    }
}

///old clients only know how to look at the body, so errors go out as `200 OK`
async fn legacy_error_status(mut response: Response) -> Response {
    if let Some(ErrorPayload(kind)) = response.extensions().get::<ErrorPayload>().copied() {
        debug!(?kind, status = ?response.status(), "Rewriting error status for legacy clients");
        *response.status_mut() = StatusCode::OK;
    }
    response
}
