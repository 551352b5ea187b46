use std::sync::Arc;

use actix_web::web;
use anyhow::Context;
use clap::Parser;

use codejudge::config::{CliArgs, Config};
use codejudge::database as db;
use codejudge::judge::{JudgeSettings, Judger};
use codejudge::judge0::Judge0Client;
use codejudge::web_server::build_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let db_path = db::get_db_path();
    let cli = CliArgs::parse();

    let Config {
        server: server_config,
        judge: judge_config,
    } = cli.to_config().context("Failed to load configuration")?;

    if cli.flush_data {
        db::remove_db(&db_path);
    }

    let db_pool = db::init_db(&db_path)
        .await
        .context("Failed to initialize database")?;

    let http = reqwest::Client::new();
    let service = Arc::new(Judge0Client::new(http, judge_config.service_url.clone()));
    let judger = web::Data::new(Judger::new(
        service,
        db_pool.clone(),
        JudgeSettings::from(&judge_config),
    ));

    log::info!(
        "Judging against execution service at {}",
        judge_config.service_url
    );

    // ======= PREPARATION END, EXECUTION START =======

    let server = build_server(server_config, db_pool, judger).context("Failed to build server")?;

    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
    }

    server_handle.stop(true).await;

    log::info!("Shutdown complete");
    Ok(())
}
