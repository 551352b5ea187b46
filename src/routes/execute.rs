use actix_web::{HttpResponse, Responder, post, web};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::judge_error_response;
use crate::judge::{Judger, JudgingRequest, TestCase};

/// Body of the "run code" flow: execute against the given cases, report the
/// outcome, persist nothing.
#[derive(Deserialize, Debug)]
pub struct ExecuteBody {
    pub language: String,
    pub source_code: String,
    pub test_cases: Vec<TestCase>,
}

#[post("/execute")]
pub async fn post_execute_handler(
    judger: web::Data<Judger>,
    body: web::Json<ExecuteBody>,
) -> impl Responder {
    let body = body.into_inner();

    let request = JudgingRequest {
        // Throwaway id; nothing is stored for a run-only request.
        submission_id: Uuid::new_v4().to_string(),
        user_id: String::new(),
        problem_id: String::new(),
        source_code: body.source_code,
        language: body.language,
        test_cases: body.test_cases,
    };

    match judger.run(request, CancellationToken::new()).await {
        Ok(verdict) => HttpResponse::Ok().json(verdict),
        Err(e) => judge_error_response(e),
    }
}
