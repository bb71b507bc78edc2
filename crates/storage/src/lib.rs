use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow},
    ConnectOptions, Connection, Row,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, warn};

use shared::domain::{Recipe, RecipeChoice, RecipeId};

pub const RECIPES_TABLE: &str = "Recipes";

/// Columns the accessor reads, in table order.
pub const RECIPE_COLUMNS: [&str; 6] = [
    "Id",
    "Name",
    "Cuisine",
    "Ingredients",
    "Instructions",
    "ImageFileName",
];

const LIST_CHOICES_SQL: &str = "SELECT Id AS id, Name AS name FROM Recipes";

const FETCH_BY_ID_SQL: &str = "SELECT Id AS id, Name AS name, Cuisine AS cuisine,
        Ingredients AS ingredients, Instructions AS instructions,
        ImageFileName AS image_file_name
     FROM Recipes
     WHERE Id = ?";

/// Read access to the recipe catalogue.
///
/// The page controller only talks to this trait; [`RecipeStore`] is the
/// SQLite-backed implementation.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn list_choices(&self) -> Result<Vec<RecipeChoice>>;

    /// `Ok(None)` means no row has this id. Connectivity or schema problems
    /// are always `Err`.
    async fn fetch_by_id(&self, id: RecipeId) -> Result<Option<Recipe>>;

    async fn health_check(&self) -> Result<()>;
}

/// Handle on a `Recipes` SQLite database.
///
/// Holds connection options only. Every call opens its own connection and
/// closes it before returning.
#[derive(Debug, Clone)]
pub struct RecipeStore {
    options: SqliteConnectOptions,
    database_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub cuisine: String,
    pub ingredients: String,
    pub instructions: String,
    pub image_file_name: String,
}

impl RecipeStore {
    /// Opens the store read-only. The database file is never created here; a
    /// missing file shows up as an error on the first query.
    pub fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .read_only(true)
            .create_if_missing(false);
        Ok(Self {
            options,
            database_url: database_url.to_string(),
        })
    }

    /// Opens the store for the admin write path, creating the file and its
    /// parent directory when missing.
    pub fn open_writable(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);
        Ok(Self {
            options,
            database_url: database_url.to_string(),
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .with_context(|| format!("failed to open sqlite database '{}'", self.database_url))
    }

    pub async fn list_choices(&self) -> Result<Vec<RecipeChoice>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(LIST_CHOICES_SQL).fetch_all(&mut conn).await;
        close(conn).await;

        let rows = rows.context("failed to list recipes")?;
        let choices = rows
            .iter()
            .map(|row| {
                Ok(RecipeChoice {
                    id: RecipeId(row.try_get("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .context("failed to decode recipe choice")?;
        debug!(count = choices.len(), "listed recipe choices");
        Ok(choices)
    }

    pub async fn fetch_by_id(&self, id: RecipeId) -> Result<Option<Recipe>> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(FETCH_BY_ID_SQL)
            .bind(id.0)
            .fetch_optional(&mut conn)
            .await;
        close(conn).await;

        let row = row.with_context(|| format!("failed to fetch recipe {}", id.0))?;
        row.as_ref()
            .map(recipe_from_row)
            .transpose()
            .with_context(|| format!("failed to decode recipe {}", id.0))
    }

    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let ping: Result<i64, _> = sqlx::query_scalar("SELECT 1").fetch_one(&mut conn).await;
        close(conn).await;

        ping.context("sqlite ping failed")?;
        Ok(())
    }

    /// Checks that `Recipes` exists and carries every column the accessor
    /// reads.
    pub async fn verify_schema(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let pragma_rows = sqlx::query("PRAGMA table_info(Recipes)")
            .fetch_all(&mut conn)
            .await;
        close(conn).await;

        let pragma_rows = pragma_rows.context("failed to inspect Recipes schema")?;
        if pragma_rows.is_empty() {
            bail!(
                "table '{RECIPES_TABLE}' not found in '{}'",
                self.database_url
            );
        }

        let mut present = Vec::with_capacity(pragma_rows.len());
        for row in pragma_rows {
            let col_name: String = row.try_get("name")?;
            present.push(col_name);
        }

        let missing: Vec<&str> = RECIPE_COLUMNS
            .iter()
            .copied()
            .filter(|required| !present.iter().any(|col| col.eq_ignore_ascii_case(required)))
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!(
                "table '{RECIPES_TABLE}' is missing columns: {}",
                missing.join(", ")
            ));
        }

        Ok(())
    }

    /// Creates the `Recipes` table when it does not exist yet. Only used by
    /// tooling and tests; the web server never writes.
    pub async fn create_table(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Recipes (
                Id            INTEGER PRIMARY KEY AUTOINCREMENT,
                Name          TEXT NOT NULL,
                Cuisine       TEXT NOT NULL,
                Ingredients   TEXT NOT NULL,
                Instructions  TEXT NOT NULL,
                ImageFileName TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut conn)
        .await;
        close(conn).await;

        result.context("failed to create Recipes table")?;
        Ok(())
    }

    pub async fn insert_recipe(&self, recipe: &NewRecipe) -> Result<RecipeId> {
        let mut conn = self.connect().await?;
        let rec = sqlx::query(
            "INSERT INTO Recipes (Name, Cuisine, Ingredients, Instructions, ImageFileName)
             VALUES (?, ?, ?, ?, ?)
             RETURNING Id",
        )
        .bind(&recipe.name)
        .bind(&recipe.cuisine)
        .bind(&recipe.ingredients)
        .bind(&recipe.instructions)
        .bind(&recipe.image_file_name)
        .fetch_one(&mut conn)
        .await;
        close(conn).await;

        let rec = rec.with_context(|| format!("failed to insert recipe '{}'", recipe.name))?;
        Ok(RecipeId(rec.try_get::<i64, _>(0)?))
    }

    /// Returns whether a row was removed.
    pub async fn delete_recipe(&self, id: RecipeId) -> Result<bool> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("DELETE FROM Recipes WHERE Id = ?")
            .bind(id.0)
            .execute(&mut conn)
            .await;
        close(conn).await;

        let result = result.with_context(|| format!("failed to delete recipe {}", id.0))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RecipeSource for RecipeStore {
    async fn list_choices(&self) -> Result<Vec<RecipeChoice>> {
        RecipeStore::list_choices(self).await
    }

    async fn fetch_by_id(&self, id: RecipeId) -> Result<Option<Recipe>> {
        RecipeStore::fetch_by_id(self, id).await
    }

    async fn health_check(&self) -> Result<()> {
        RecipeStore::health_check(self).await
    }
}

fn recipe_from_row(row: &SqliteRow) -> Result<Recipe, sqlx::Error> {
    Ok(Recipe {
        id: RecipeId(row.try_get("id")?),
        name: row.try_get("name")?,
        cuisine: row.try_get("cuisine")?,
        ingredients: row.try_get("ingredients")?,
        instructions: row.try_get("instructions")?,
        image_file_name: row.try_get("image_file_name")?,
    })
}

async fn close(conn: SqliteConnection) {
    if let Err(error) = conn.close().await {
        warn!(%error, "failed to close sqlite connection cleanly");
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
