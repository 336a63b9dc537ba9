//! HTTP router assembly.

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// Build the full application router around the given state.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Customer routes
        .route(
            "/api/v1/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/api/v1/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/api/v1/customers/{id}/accounts",
            post(handlers::customers::open_account),
        )
        .route(
            "/api/v1/customers/{id}/accounts/{account_id}",
            delete(handlers::customers::close_account),
        )
        .route(
            "/api/v1/customers/{id}/recipients",
            get(handlers::customers::list_recipients).post(handlers::customers::add_recipient),
        )
        .route(
            "/api/v1/customers/{id}/recipients/{recipient_id}",
            delete(handlers::customers::remove_recipient),
        )
        // Account routes
        .route("/api/v1/accounts/{id}", get(handlers::accounts::get_account))
        .route(
            "/api/v1/accounts/{id}/deposit",
            post(handlers::accounts::deposit),
        )
        .route(
            "/api/v1/accounts/{id}/withdraw",
            post(handlers::accounts::withdraw),
        )
        .route("/api/v1/transfers", post(handlers::accounts::transfer));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
