use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Form, Json, Router,
};
use server_api::{
    get_recipe, health, initial_view, list_recipe_choices, submit_selection, ApiContext,
};
use shared::{
    domain::{Recipe, RecipeChoice, RecipeId},
    error::{ApiError, ErrorCode},
    protocol::{RecipePage, SelectRecipeForm},
};
use storage::RecipeStore;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod render;

use app_state::AppState;
use config::load_settings;

type PageResult = Result<Html<String>, (StatusCode, Html<String>)>;
type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let store = RecipeStore::open(&settings.database_url)?;
    if let Err(error) = store.verify_schema().await {
        warn!(
            database_url = %settings.database_url,
            error = %format!("{error:#}"),
            "recipe store is not usable yet; requests will fail until it is"
        );
    }

    let state = AppState {
        api: ApiContext::new(store),
        image_dir: settings.image_dir.clone(),
        max_form_bytes: settings.max_form_bytes,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        database_url = %settings.database_url,
        image_dir = %settings.image_dir.display(),
        "recipe server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let images = ServeDir::new(&state.image_dir);
    let max_form_bytes = state.max_form_bytes;

    Router::new()
        .route("/", get(recipes_page).post(select_recipe))
        .route("/healthz", get(healthz))
        .route("/api/recipes", get(http_list_recipes))
        .route("/api/recipes/:recipe_id", get(http_get_recipe))
        .nest_service(render::IMAGES_ROUTE, images)
        .layer(RequestBodyLimitLayer::new(max_form_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    health(&state.api)
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, Json(e)))?;
    Ok("ok")
}

async fn recipes_page(State(state): State<Arc<AppState>>) -> PageResult {
    let page = initial_view(&state.api).await.map_err(page_error)?;
    Ok(render_page(&page))
}

async fn select_recipe(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SelectRecipeForm>,
) -> PageResult {
    let selection = form.selection();
    debug!(
        selected_recipe_id = form.selected_recipe_id,
        "recipe selection submitted"
    );
    let page = submit_selection(&state.api, selection)
        .await
        .map_err(page_error)?;
    Ok(render_page(&page))
}

async fn http_list_recipes(
    State(state): State<Arc<AppState>>,
) -> JsonResult<Vec<RecipeChoice>> {
    let choices = list_recipe_choices(&state.api).await.map_err(json_error)?;
    Ok(Json(choices))
}

async fn http_get_recipe(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<i64>,
) -> JsonResult<Recipe> {
    let recipe = get_recipe(&state.api, RecipeId(recipe_id))
        .await
        .map_err(json_error)?;
    Ok(Json(recipe))
}

fn render_page(page: &RecipePage) -> Html<String> {
    Html(render::recipe_page(page))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The HTML routes never show store details to the user.
fn page_error(err: ApiError) -> (StatusCode, Html<String>) {
    (status_for(err.code), Html(render::error_page()))
}

fn json_error(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
