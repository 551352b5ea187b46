mod execute;
mod submissions;

pub use execute::post_execute_handler;
pub use submissions::{
    get_solved_problems_handler, get_submission_by_id_handler, get_submission_count_handler,
    get_submissions_handler, post_submission_handler,
};

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::JudgeError;

#[derive(Serialize)]
struct ErrorResponse {
    reason: &'static str,
    code: u32,
}

#[derive(Serialize)]
struct ErrorResponseWithMessage {
    reason: &'static str,
    code: u32,
    message: String,
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
    });
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        reason: "ERR_INVALID_ARGUMENT",
        code: 1,
    });
    InternalError::from_response(err, response).into()
}

/// Maps pipeline errors onto HTTP responses. "Your code did not pass" is a
/// 200 with a verdict body and never comes through here; these are the
/// "could not judge" cases.
fn judge_error_response(err: JudgeError) -> HttpResponse {
    match err {
        JudgeError::InvalidRequest(message) => {
            HttpResponse::BadRequest().json(ErrorResponseWithMessage {
                reason: "ERR_INVALID_ARGUMENT",
                code: 1,
                message,
            })
        }
        JudgeError::UnsupportedLanguage(language) => {
            HttpResponse::NotFound().json(ErrorResponseWithMessage {
                reason: "ERR_NOT_FOUND",
                code: 3,
                message: format!("language '{language}' is not supported"),
            })
        }
        JudgeError::JudgingInProgress(id) => HttpResponse::Conflict().json(
            ErrorResponseWithMessage {
                reason: "ERR_BUSY",
                code: 4,
                message: format!("submission {id} is already being judged"),
            },
        ),
        JudgeError::DispatchFailed(message) => {
            log::error!("Execution service unreachable: {message}");
            HttpResponse::BadGateway().json(ErrorResponseWithMessage {
                reason: "ERR_EXTERNAL",
                code: 5,
                message,
            })
        }
        JudgeError::Cancelled => HttpResponse::InternalServerError().json(ErrorResponse {
            reason: "ERR_INTERNAL",
            code: 6,
        }),
        JudgeError::Database(e) => {
            log::error!("Database error while judging: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}
