pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub fn build_api_router(state: ApiState) -> Router {
    let open = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/dummyLogin", get(handlers::dummy_login))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let authenticated = Router::new()
        .route("/house/{id}", get(handlers::list_house_flats))
        .route("/flat/create", post(handlers::create_flat))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_authenticated,
        ));

    let moderator = Router::new()
        .route("/house/create", post(handlers::create_house))
        .route("/flat/update", post(handlers::update_flat))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_moderator,
        ));

    Router::new()
        .merge(open)
        .merge(authenticated)
        .merge(moderator)
        .with_state(state)
}
