use actix_web::{App, HttpServer, dev::Server, middleware, web};
use sqlx::sqlite::SqlitePool;

use crate::config::ServerConfig;
use crate::judge::Judger;
use crate::routes::{
    get_solved_problems_handler, get_submission_by_id_handler, get_submission_count_handler,
    get_submissions_handler, json_error_handler, post_execute_handler, post_submission_handler,
    query_error_handler,
};

pub fn build_server(
    server_config: ServerConfig,
    db_pool: SqlitePool,
    judger: web::Data<Judger>,
) -> std::io::Result<Server> {
    let db_pool = web::Data::new(db_pool);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(db_pool.clone())
            .app_data(judger.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .wrap(middleware::Logger::default())
            .service(post_submission_handler)
            .service(post_execute_handler)
            .service(get_submissions_handler)
            .service(get_submission_by_id_handler)
            .service(get_submission_count_handler)
            .service(get_solved_problems_handler)
    })
    .bind((
        server_config
            .bind_address
            .unwrap_or("127.0.0.1".to_string()),
        server_config.bind_port.unwrap_or(12345),
    ))?
    .run();

    Ok(server)
}
