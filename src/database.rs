use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::verdict::{SubmissionVerdict, TestCaseVerdict};

const DATABASE_NAME: &str = "codejudge.sqlite3";

pub fn get_db_path() -> PathBuf {
    use directories::ProjectDirs;

    let proj_dirs = ProjectDirs::from("", "", "codejudge").expect("Unable to find user directory");
    let data_dir = proj_dirs.data_local_dir();

    fs::create_dir_all(data_dir).expect("Failed to create local data dir");

    data_dir.join(DATABASE_NAME)
}

pub async fn init_db(db_path: impl AsRef<Path>) -> sqlx::Result<SqlitePool> {
    let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display()); // rwc = read/write/create
    let db_pool = SqlitePoolOptions::new().max_connections(2).connect(&db_url).await?;

    init_schema(&db_pool).await?;

    log::info!("Initialized database at {}", db_path.as_ref().display());

    Ok(db_pool)
}

/// Opens an in-memory database, used by tests. A single connection keeps the
/// whole pool on the same in-memory instance.
pub async fn init_memory_db() -> sqlx::Result<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&db_pool).await?;
    Ok(db_pool)
}

async fn init_schema(db_pool: &SqlitePool) -> sqlx::Result<()> {
    // PRAGMA statements cannot run inside a transaction
    for pragma_sql in &[
        "PRAGMA foreign_keys = ON;",
        "PRAGMA busy_timeout = 2000;", // 2 seconds timeout for lock contention
        "PRAGMA journal_mode = WAL;",  // Write-Ahead Logging for better concurrency
        "PRAGMA synchronous = NORMAL;",
    ] {
        sqlx::query(pragma_sql).execute(db_pool).await?;
    }

    let mut tx = db_pool.begin().await?;

    for sql in &[
        r"
        CREATE TABLE IF NOT EXISTS submissions (
            id               TEXT     PRIMARY KEY,
            user_id          TEXT     NOT NULL,
            problem_id       TEXT     NOT NULL,
            language         TEXT     NOT NULL,
            source_code      TEXT     NOT NULL,
            status           TEXT     NOT NULL,
            time_total       REAL     NOT NULL,
            memory_total     REAL     NOT NULL,
            created_time     TEXT     NOT NULL,
            updated_time     TEXT     NOT NULL
        );",
        "CREATE INDEX IF NOT EXISTS idx_submissions_user ON submissions(user_id);",
        "CREATE INDEX IF NOT EXISTS idx_submissions_problem ON submissions(problem_id);",
        r"
        CREATE TABLE IF NOT EXISTS submission_case (
            submission_id    TEXT     NOT NULL,
            case_index       INTEGER  NOT NULL,
            passed           INTEGER  NOT NULL,
            stdout           TEXT     NOT NULL DEFAULT '',
            expected_output  TEXT     NOT NULL DEFAULT '',
            status           TEXT     NOT NULL,
            stderr           TEXT     NOT NULL DEFAULT '',
            compile_output   TEXT     NOT NULL DEFAULT '',
            time_secs        REAL     NOT NULL,
            memory_kb        REAL     NOT NULL,
            PRIMARY KEY (submission_id, case_index),
            FOREIGN KEY (submission_id) REFERENCES submissions (id)
        );",
        r"
        CREATE TABLE IF NOT EXISTS problem_solved (
            user_id          TEXT     NOT NULL,
            problem_id       TEXT     NOT NULL,
            solved_time      TEXT     NOT NULL,
            PRIMARY KEY (user_id, problem_id)
        );",
    ] {
        sqlx::query(sql).execute(tx.as_mut()).await?;
    }

    tx.commit().await?;
    Ok(())
}

pub fn remove_db(db_path: impl AsRef<Path>) {
    // Remove WAL and SHM files (ignore errors as they might not exist)
    let wal_path = format!("{}-wal", db_path.as_ref().display());
    let shm_path = format!("{}-shm", db_path.as_ref().display());
    let _ = fs::remove_file(wal_path);
    let _ = fs::remove_file(shm_path);

    if let Err(e) = std::fs::remove_file(&db_path) {
        log::warn!(
            "Unable to remove database at {}: {e}",
            db_path.as_ref().display()
        );
    } else {
        log::info!("Removed database at {}", db_path.as_ref().display());
    }
}

/// A persisted submission together with its per-case results, as served by
/// the query endpoints.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SubmissionRecord {
    pub id: String,
    pub user_id: String,
    pub problem_id: String,
    pub language: String,
    pub status: String,
    pub total_time_secs: f64,
    pub total_memory_kb: f64,
    pub created_time: String,
    pub updated_time: String,
    pub cases: Vec<TestCaseVerdict>,
}

/// Persists a verdict, keyed on the submission id.
///
/// Re-running with the same id replaces the previous record instead of
/// creating a second one, so duplicate client retries cannot race-persist
/// two verdicts.
pub async fn save_verdict(
    pool: &SqlitePool,
    verdict: &SubmissionVerdict,
    user_id: &str,
    problem_id: &str,
    language: &str,
    source_code: &str,
) -> sqlx::Result<()> {
    let now = crate::create_timestamp();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO submissions
            (id, user_id, problem_id, language, source_code, status,
             time_total, memory_total, created_time, updated_time)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            time_total = excluded.time_total,
            memory_total = excluded.memory_total,
            updated_time = excluded.updated_time
        "#,
    )
    .bind(&verdict.submission_id)
    .bind(user_id)
    .bind(problem_id)
    .bind(language)
    .bind(source_code)
    .bind(verdict.status.as_str())
    .bind(verdict.total_time_secs)
    .bind(verdict.total_memory_kb)
    .bind(&now)
    .bind(&now)
    .execute(tx.as_mut())
    .await?;

    // Rewrite case rows wholesale; a re-judge replaces them all.
    sqlx::query("DELETE FROM submission_case WHERE submission_id = ?")
        .bind(&verdict.submission_id)
        .execute(tx.as_mut())
        .await?;

    for case in &verdict.test_cases {
        sqlx::query(
            r#"
            INSERT INTO submission_case
                (submission_id, case_index, passed, stdout, expected_output,
                 status, stderr, compile_output, time_secs, memory_kb)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&verdict.submission_id)
        .bind(case.index)
        .bind(case.passed)
        .bind(&case.stdout)
        .bind(&case.expected_output)
        .bind(&case.status)
        .bind(&case.stderr)
        .bind(&case.compile_output)
        .bind(case.time_secs)
        .bind(case.memory_kb)
        .execute(tx.as_mut())
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Records that a user has solved a problem. Inserting the same pair twice
/// is a no-op; the marker is never deleted here.
pub async fn mark_solved(pool: &SqlitePool, user_id: &str, problem_id: &str) -> sqlx::Result<()> {
    let now = crate::create_timestamp();

    sqlx::query(
        "INSERT OR IGNORE INTO problem_solved (user_id, problem_id, solved_time) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(problem_id)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn is_problem_solved(
    pool: &SqlitePool,
    user_id: &str,
    problem_id: &str,
) -> sqlx::Result<bool> {
    let row = sqlx::query("SELECT 1 FROM problem_solved WHERE user_id = ? AND problem_id = ?")
        .bind(user_id)
        .bind(problem_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

pub async fn list_solved_problems(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT problem_id FROM problem_solved WHERE user_id = ? ORDER BY solved_time",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|r| r.get("problem_id")).collect())
}

pub async fn fetch_submission(
    pool: &SqlitePool,
    id: &str,
) -> sqlx::Result<Option<SubmissionRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, problem_id, language, status,
               time_total, memory_total, created_time, updated_time
        FROM submissions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let cases = fetch_cases(pool, id).await?;

    Ok(Some(SubmissionRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        problem_id: row.get("problem_id"),
        language: row.get("language"),
        status: row.get("status"),
        total_time_secs: row.get("time_total"),
        total_memory_kb: row.get("memory_total"),
        created_time: row.get("created_time"),
        updated_time: row.get("updated_time"),
        cases,
    }))
}

async fn fetch_cases(pool: &SqlitePool, submission_id: &str) -> sqlx::Result<Vec<TestCaseVerdict>> {
    let rows = sqlx::query(
        r#"
        SELECT case_index, passed, stdout, expected_output, status,
               stderr, compile_output, time_secs, memory_kb
        FROM submission_case
        WHERE submission_id = ?
        ORDER BY case_index
        "#,
    )
    .bind(submission_id)
    .fetch_all(pool)
    .await?;

    let mut cases = Vec::with_capacity(rows.len());
    for row in rows {
        cases.push(TestCaseVerdict {
            index: row.get::<i64, _>("case_index") as u32,
            passed: row.get("passed"),
            stdout: row.get("stdout"),
            expected_output: row.get("expected_output"),
            status: row.get("status"),
            stderr: row.get("stderr"),
            compile_output: row.get("compile_output"),
            time_secs: row.get("time_secs"),
            memory_kb: row.get("memory_kb"),
        });
    }

    Ok(cases)
}

pub async fn list_user_submissions(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Vec<SubmissionRecord>> {
    let rows = sqlx::query(
        "SELECT id FROM submissions WHERE user_id = ? ORDER BY created_time",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get("id");
        if let Some(record) = fetch_submission(pool, &id).await? {
            records.push(record);
        }
    }

    Ok(records)
}

pub async fn count_submissions_for_problem(
    pool: &SqlitePool,
    problem_id: &str,
) -> sqlx::Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM submissions WHERE problem_id = ?")
        .bind(problem_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("n"))
}

