use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use snafu::Snafu;
use std::{
    net::SocketAddr,
    num::ParseIntError,
    path::PathBuf,
    str::ParseBoolError,
};

pub type StudentsResult<T> = Result<T, StudentsError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StudentsError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a number", name))]
    ParseNumberEnvVar {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a bool", name))]
    ParseBoolEnvVar {
        source: ParseBoolError,
        name: &'static str,
    },
    #[snafu(display("Unable to parse listening address {:?}", original))]
    ParseListenAddress {
        source: std::net::AddrParseError,
        original: String,
    },
    #[snafu(display("Unable to listen on {}", addr))]
    BindListener {
        source: std::io::Error,
        addr: SocketAddr,
    },
    #[snafu(display("Error serving app"))]
    Serve { source: std::io::Error },
    #[snafu(display("Path `{}` is required", field))]
    MissingField { field: &'static str },
    #[snafu(display("Path `{}` must not be empty", field))]
    EmptyField { field: &'static str },
    #[snafu(display("Path `{}` must be a whole number, found {:?}", field, original))]
    InvalidNumber {
        source: ParseIntError,
        field: &'static str,
        original: String,
    },
    #[snafu(display("Unknown field {:?}", field))]
    UnknownField { field: String },
    #[snafu(display("Only one file may be uploaded, under `image`"))]
    TooManyFiles,
    #[snafu(display("Error with multipart form input: {}", source))]
    Multipart { source: MultipartError },
    #[snafu(display("Error reading multipart form: {}", source))]
    MultipartBody { source: MultipartRejection },
    #[snafu(display("Error with JSON input: {}", source))]
    JsonBody { source: JsonRejection },
    #[snafu(display("Request body is too large"))]
    BodyTooLarge,
    #[snafu(display("Unable to create upload directory {:?}", path))]
    CreateUploadDir {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Unable to write uploaded file to {:?}", path))]
    WriteUpload {
        source: std::io::Error,
        path: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorKind {
    ValidationError,
    StorageError,
    DatabaseError,
    ConfigurationError,
}

impl StudentsError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OpenDatabase { .. } | Self::MakeQuery { .. } | Self::MigrateError { .. } => {
                ErrorKind::DatabaseError
            }
            Self::BadEnvVar { .. }
            | Self::ParseNumberEnvVar { .. }
            | Self::ParseBoolEnvVar { .. }
            | Self::ParseListenAddress { .. }
            | Self::BindListener { .. }
            | Self::Serve { .. } => ErrorKind::ConfigurationError,
            Self::MissingField { .. }
            | Self::EmptyField { .. }
            | Self::InvalidNumber { .. }
            | Self::UnknownField { .. }
            | Self::TooManyFiles
            | Self::Multipart { .. }
            | Self::MultipartBody { .. }
            | Self::JsonBody { .. }
            | Self::BodyTooLarge => ErrorKind::ValidationError,
            Self::CreateUploadDir { .. } | Self::WriteUpload { .. } => ErrorKind::StorageError,
        }
    }
}

/// Marker left in the extensions of every error response, so later layers can tell an
/// error payload apart from a successful body.
#[derive(Debug, Copy, Clone)]
pub struct ErrorPayload(pub ErrorKind);

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: ErrorKind,
    message: String,
}

impl IntoResponse for StudentsError {
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        let kind = self.kind();
        let status_code = match &self {
            Self::Multipart { source } => source.status(),
            Self::MultipartBody { source } => source.status(),
            Self::JsonBody { source } => source.status(),
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => match kind {
                ErrorKind::ValidationError => BI,
                ErrorKind::StorageError
                | ErrorKind::DatabaseError
                | ErrorKind::ConfigurationError => ISE,
            },
        };

        error!(?self, "Error!");

        let body = ErrorBody {
            error: ErrorDetail {
                kind,
                message: self.to_string(),
            },
        };
        let mut response = (status_code, Json(body)).into_response();
        response.extensions_mut().insert(ErrorPayload(kind));
        response
    }
}
