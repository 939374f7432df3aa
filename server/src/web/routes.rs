// kirana_server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{customer_handlers, owner_handlers, profile_handlers, stream_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/session", web::get().to(profile_handlers::session_handler))
      .route("/profile", web::put().to(profile_handlers::update_profile_handler))
      .service(
        web::scope("/stores")
          .route("/nearby", web::get().to(customer_handlers::nearby_stores_handler))
          .route("/{store_id}/items", web::get().to(customer_handlers::store_shelf_handler)),
      )
      .route("/checkout", web::post().to(customer_handlers::checkout_handler))
      // `/orders/stream` is registered before `/orders/{order_id}` so it is not captured as an id.
      .service(
        web::scope("/orders")
          .route("", web::get().to(customer_handlers::list_orders_handler))
          .route("/stream", web::get().to(stream_handlers::order_stream_handler))
          .route("/{order_id}", web::get().to(customer_handlers::get_order_handler))
          .route("/{order_id}/tracking", web::get().to(customer_handlers::track_order_handler))
          .route("/{order_id}/route", web::get().to(customer_handlers::route_estimate_handler))
          .route("/{order_id}/cancel", web::post().to(customer_handlers::cancel_order_handler))
          .route("/{order_id}/payment", web::post().to(customer_handlers::confirm_payment_handler))
          .route("/{order_id}/accept", web::post().to(owner_handlers::accept_order_handler))
          .route("/{order_id}/advance", web::post().to(owner_handlers::advance_order_handler))
          .route("/{order_id}/reject", web::post().to(owner_handlers::reject_order_handler)),
      )
      .service(
        web::scope("/store")
          .route("", web::patch().to(owner_handlers::update_store_handler))
          .route("/catalog", web::get().to(owner_handlers::browse_catalog_handler))
          .route("/inventory", web::get().to(owner_handlers::list_inventory_handler))
          .route("/inventory/catalog", web::post().to(owner_handlers::list_catalog_product_handler))
          .route("/inventory/custom", web::post().to(owner_handlers::add_custom_product_handler))
          .route("/inventory/{item_id}", web::put().to(owner_handlers::update_listing_handler))
          .route("/inventory/{item_id}/toggle", web::post().to(owner_handlers::toggle_listing_handler))
          .route(
            "/inventory/{item_id}/variants/{brand}",
            web::put().to(owner_handlers::update_variant_handler),
          ),
      ),
  );
}
