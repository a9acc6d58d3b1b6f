use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::{JwtSettings, NlpSettings};
use crate::middleware::{AuthMiddleware, RequestLogger};
use crate::nlp_client::NlpClient;
use crate::routes::{
    create_task, delete_task, get_current_user, health_check, list_tasks, refresh, signin, signup,
    update_task,
};
use crate::session::{PgRevocationLedger, SessionManager, TokenCodec};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
    nlp_config: NlpSettings,
) -> Result<Server, std::io::Error> {
    let codec = TokenCodec::new(&jwt_config);
    let ledger = Arc::new(PgRevocationLedger::new(connection.clone()));
    let session = SessionManager::new(codec, ledger);

    let nlp_client = NlpClient::new(nlp_config.base_url, reqwest::Client::new());

    let connection = web::Data::new(connection);
    let session_data = web::Data::new(session.clone());
    let jwt_config_data = web::Data::new(jwt_config);
    let nlp_data = web::Data::new(nlp_client);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(RequestLogger)

            // Shared state
            .app_data(connection.clone())
            .app_data(session_data.clone())
            .app_data(jwt_config_data.clone())
            .app_data(nlp_data.clone())

            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/signin", web::post().to(signin))
            .route("/auth/refresh", web::post().to(refresh))

            // Protected routes (authenticated on every request)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(session.clone()))
                    .route("/me", web::get().to(get_current_user))
                    .route("/tasks", web::get().to(list_tasks))
                    .route("/tasks", web::post().to(create_task))
                    .route("/tasks/{id}", web::put().to(update_task))
                    .route("/tasks/{id}", web::delete().to(delete_task)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
