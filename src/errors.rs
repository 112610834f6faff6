use actix_http::ResponseBuilder;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;

use crate::auth::Permissions;

#[derive(thiserror::Error, Debug)]
pub enum JoblyError {
    #[error("{}", message)]
    Validation { message: String },

    #[error("Duplicate job: {}", title)]
    Conflict { title: String },

    #[error("No job: {}", title)]
    NotFound { title: String },

    #[error("Missing authorization token")]
    MissingToken {},

    #[error("Failed to authenticate request, {}", source)]
    Authenticate { source: jsonwebtoken::errors::Error },

    #[error("Missing permission {:?}", permission)]
    Forbidden { permission: Permissions },

    #[error("Failed to create token, {}", source)]
    CreateToken { source: jsonwebtoken::errors::Error },

    #[error("Failed to read application context")]
    ReadContext {},

    #[error("Failed to run database statement, {}", source)]
    Storage { source: rusqlite::Error },

    #[error("Failed to reach the database actor, {}", cause)]
    Mailbox { cause: actix::MailboxError },

    #[error("Failed to decode column '{}' of a jobs row", column)]
    DecodeRow { column: String },

    #[error("Failed to create database directory, {}", source)]
    CreateDatabaseDir { source: std::io::Error },

    #[error("Failed to open database at {}, {}", path, source)]
    OpenDatabase {
        path: String,
        source: rusqlite::Error,
    },

    #[error("Failed to register database functions, {}", source)]
    RegisterFunction { source: rusqlite::Error },

    #[error("Failed to run database migrations, {}", source)]
    Migrate { source: refinery::Error },

    #[error("Failed to read Jobly file, {}", source)]
    ReadConfig { source: std::io::Error },

    #[error("Failed to parse Jobly file, {}", source)]
    ParseConfig { source: toml::de::Error },

    #[error("Secret is required")]
    MissingSecret {},
}

impl JoblyError {
    pub fn validation(message: impl Into<String>) -> Self {
        JoblyError::Validation {
            message: message.into(),
        }
    }
}

impl actix_web::error::ResponseError for JoblyError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!("{}", self);
            "Internal Server Error".to_owned()
        } else {
            self.to_string()
        };

        ResponseBuilder::new(status).json(json!({
            "error": { "message": message, "status": status.as_u16() }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            JoblyError::Validation { .. } | JoblyError::Conflict { .. } => StatusCode::BAD_REQUEST,
            JoblyError::NotFound { .. } => StatusCode::NOT_FOUND,
            JoblyError::MissingToken {} | JoblyError::Authenticate { .. } => {
                StatusCode::UNAUTHORIZED
            }
            JoblyError::Forbidden { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
