// paysync-server/src/web/routes.rs

use crate::web::handlers::{
  batch_handlers, health_check_handler, method_not_allowed_handler, webhook_handlers,
};
use actix_web::web;

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .service(
        web::resource("/health")
          .route(web::get().to(health_check_handler))
          .default_service(web::to(method_not_allowed_handler)),
      )
      .service(
        web::resource("/webhooks/payment")
          .route(web::post().to(webhook_handlers::payment_webhook_handler))
          .default_service(web::to(method_not_allowed_handler)),
      )
      .service(
        web::resource("/batch")
          .route(web::post().to(batch_handlers::batch_handler))
          .default_service(web::to(method_not_allowed_handler)),
      ),
  );
}
