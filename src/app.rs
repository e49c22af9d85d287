// src/app.rs

use axum::{
    extract::{OriginalUri, Request},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::normalize_path::NormalizePath;

use crate::{
    config::AppState,
    handlers::{application, tenant, user},
    middleware::auth::{new_reseller_guard, reseller_guard},
};

/// Rotas do conector (montadas em `/connector/v1` e `/connector`).
fn connector_routes(app_state: &AppState) -> Router<AppState> {
    // Health check público
    let public_routes = Router::new().route("/", get(application::health_check));

    // Nova instância: o revendedor ainda não tem token
    let new_app_routes = Router::new()
        .route("/app", post(application::create_app))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            new_reseller_guard,
        ));

    let app_routes = Router::new()
        .route("/app/{app_id}", delete(application::delete_app))
        .route("/app/{app_id}/upgrade", post(application::upgrade))
        .route("/app/{app_id}/tenants", post(application::tenant_new))
        .route(
            "/app/{app_id}/tenants/{tenant_id}",
            delete(application::tenant_delete),
        );

    let tenant_routes = Router::new()
        .route("/tenant", post(tenant::create_tenant))
        .route(
            "/tenant/{tenant_id}",
            get(tenant::get_tenant)
                .put(tenant::update_tenant)
                .delete(tenant::delete_tenant),
        )
        .route("/tenant/{tenant_id}/disable", put(tenant::disable))
        .route("/tenant/{tenant_id}/enable", put(tenant::enable))
        .route("/tenant/{tenant_id}/adminlogin", get(tenant::admin_login))
        .route("/tenant/{tenant_id}/users", post(tenant::users_created))
        .route(
            "/tenant/{tenant_id}/users/{user_id}",
            delete(tenant::user_removed),
        )
        .route(
            "/tenant/{tenant_id}/onUsersChange",
            post(tenant::on_users_change),
        )
        .route("/tenant/{tenant_id}/reprovision", post(tenant::reprovision));

    let user_routes = Router::new()
        .route("/user", post(user::create_user))
        .route(
            "/user/{user_id}",
            put(user::update_user).delete(user::delete_user),
        )
        .route("/user/{user_id}/userlogin", get(user::user_login));

    let protected_routes = Router::new()
        .merge(app_routes)
        .merge(tenant_routes)
        .merge(user_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            reseller_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(new_app_routes)
        .merge(protected_routes)
}

// A assinatura OAuth cobre o caminho tal como o OA o enviou, com ou sem barra final.
async fn keep_original_uri(mut request: Request) -> Request {
    if request.extensions().get::<OriginalUri>().is_none() {
        let uri = request.uri().clone();
        request.extensions_mut().insert(OriginalUri(uri));
    }
    request
}

pub fn router(app_state: AppState) -> Router {
    let api = connector_routes(&app_state);

    let routes = Router::new()
        .route("/", get(application::root))
        .nest("/connector/v1", api.clone())
        .nest("/connector", api)
        .with_state(app_state);

    // O axum escolhe a rota antes das camadas do Router, por isso a barra
    // final é removida num serviço que envolve o roteador inteiro.
    Router::new()
        .fallback_service(NormalizePath::trim_trailing_slash(routes))
        .layer(axum_middleware::map_request(keep_original_uri))
}
