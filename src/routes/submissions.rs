use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Deserialize;
use sqlx::sqlite::SqlitePool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{ErrorResponse, judge_error_response};
use crate::database as db;
use crate::judge::{Judger, JudgingRequest, TestCase};

#[derive(Deserialize, Debug)]
pub struct SubmissionBody {
    /// Client-supplied idempotency key; minted server-side when absent.
    pub id: Option<String>,
    pub user_id: String,
    pub problem_id: String,
    pub language: String,
    pub source_code: String,
    pub test_cases: Vec<TestCase>,
}

#[derive(Deserialize)]
pub struct SubmissionsQueryParams {
    pub user_id: String,
}

#[post("/submissions")]
pub async fn post_submission_handler(
    judger: web::Data<Judger>,
    body: web::Json<SubmissionBody>,
) -> impl Responder {
    let body = body.into_inner();
    let submission_id = body.id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let request = JudgingRequest {
        submission_id,
        user_id: body.user_id,
        problem_id: body.problem_id,
        source_code: body.source_code,
        language: body.language,
        test_cases: body.test_cases,
    };

    match judger.judge(request, CancellationToken::new()).await {
        Ok(verdict) => HttpResponse::Ok().json(verdict),
        Err(e) => judge_error_response(e),
    }
}

#[get("/submissions")]
pub async fn get_submissions_handler(
    pool: web::Data<SqlitePool>,
    query: web::Query<SubmissionsQueryParams>,
) -> impl Responder {
    match db::list_user_submissions(pool.as_ref(), &query.user_id).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => {
            log::error!("Failed to list submissions: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}

#[get("/submissions/{id}")]
pub async fn get_submission_by_id_handler(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> impl Responder {
    let id = path.into_inner();
    match db::fetch_submission(pool.as_ref(), &id).await {
        Ok(Some(record)) => HttpResponse::Ok().json(record),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse {
            reason: "ERR_NOT_FOUND",
            code: 3,
        }),
        Err(e) => {
            log::error!("Failed to fetch submission {id}: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}

#[get("/problems/{id}/submissions/count")]
pub async fn get_submission_count_handler(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> impl Responder {
    let problem_id = path.into_inner();
    match db::count_submissions_for_problem(pool.as_ref(), &problem_id).await {
        Ok(count) => HttpResponse::Ok().json(serde_json::json!({ "count": count })),
        Err(e) => {
            log::error!("Failed to count submissions for {problem_id}: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}

#[get("/users/{id}/solved")]
pub async fn get_solved_problems_handler(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    match db::list_solved_problems(pool.as_ref(), &user_id).await {
        Ok(problems) => HttpResponse::Ok().json(problems),
        Err(e) => {
            log::error!("Failed to list solved problems for {user_id}: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_EXTERNAL",
                code: 5,
            })
        }
    }
}
