use std::sync::Arc;

use shared::{
    domain::{Recipe, RecipeChoice, RecipeId, RecipeSelection},
    error::{ApiError, ErrorCode},
    protocol::RecipePage,
};
use storage::RecipeSource;
use tracing::{debug, error};

pub const STORE_UNAVAILABLE: &str = "recipe store unavailable";

/// Request-independent handle shared by every handler. Holds no mutable state.
#[derive(Clone)]
pub struct ApiContext {
    pub recipes: Arc<dyn RecipeSource>,
}

impl ApiContext {
    pub fn new(recipes: impl RecipeSource + 'static) -> Self {
        Self {
            recipes: Arc::new(recipes),
        }
    }
}

/// First visit: every choice, nothing selected.
pub async fn initial_view(ctx: &ApiContext) -> Result<RecipePage, ApiError> {
    let choices = load_choices(ctx).await?;
    Ok(RecipePage::unselected(choices))
}

/// Form submit. The choice list is reloaded because nothing survives between
/// requests. An id with no matching row renders the same as no selection.
pub async fn submit_selection(
    ctx: &ApiContext,
    selection: RecipeSelection,
) -> Result<RecipePage, ApiError> {
    let choices = load_choices(ctx).await?;

    let Some(id) = selection.recipe_id() else {
        return Ok(RecipePage::unselected(choices));
    };

    let recipe = ctx.recipes.fetch_by_id(id).await.map_err(internal)?;
    if recipe.is_none() {
        debug!(recipe_id = id.0, "selected recipe not found");
    }

    Ok(RecipePage {
        choices,
        selection,
        recipe,
    })
}

pub async fn list_recipe_choices(ctx: &ApiContext) -> Result<Vec<RecipeChoice>, ApiError> {
    load_choices(ctx).await
}

pub async fn get_recipe(ctx: &ApiContext, id: RecipeId) -> Result<Recipe, ApiError> {
    ctx.recipes
        .fetch_by_id(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, format!("recipe {} not found", id.0)))
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.recipes.health_check().await.map_err(|err| {
        error!(error = %format!("{err:#}"), "recipe store health check failed");
        ApiError::new(ErrorCode::Unavailable, STORE_UNAVAILABLE)
    })
}

async fn load_choices(ctx: &ApiContext) -> Result<Vec<RecipeChoice>, ApiError> {
    ctx.recipes.list_choices().await.map_err(internal)
}

/// Store details (paths, driver messages) only go to the log.
fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "recipe store access failed");
    ApiError::new(ErrorCode::Internal, STORE_UNAVAILABLE)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
