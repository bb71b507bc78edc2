use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{Recipe, RecipeId},
    error::{ApiException, ErrorCode},
};
use storage::{NewRecipe, RecipeStore};

/// Maintenance commands for a `Recipes` database. The web server itself only
/// reads; rows are created and removed here.
#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://Recipes.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the Recipes table if it is missing.
    Init {
        /// Also insert a couple of sample recipes.
        #[arg(long)]
        sample: bool,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        cuisine: String,
        #[arg(long)]
        ingredients: String,
        #[arg(long)]
        instructions: String,
        #[arg(long, default_value = "")]
        image: String,
    },
    /// Insert every recipe from a JSON array file.
    Import {
        file: PathBuf,
    },
    List,
    Show {
        id: i64,
    },
    Remove {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = RecipeStore::open_writable(&cli.database_url)?;

    match cli.command {
        Command::Init { sample } => {
            store.create_table().await?;
            println!("Recipes table ready in {}", store.database_url());
            if sample {
                for recipe in sample_recipes() {
                    let id = store.insert_recipe(&recipe).await?;
                    println!("created recipe_id={} name={}", id.0, recipe.name);
                }
            }
        }
        Command::Add {
            name,
            cuisine,
            ingredients,
            instructions,
            image,
        } => {
            let recipe = NewRecipe {
                name,
                cuisine,
                ingredients,
                instructions,
                image_file_name: image,
            };
            let id = store.insert_recipe(&recipe).await?;
            println!("created recipe_id={}", id.0);
        }
        Command::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let recipes: Vec<NewRecipe> = serde_json::from_str(&raw).with_context(|| {
                format!("'{}' is not a JSON array of recipes", file.display())
            })?;
            for recipe in &recipes {
                let id = store.insert_recipe(recipe).await?;
                println!("created recipe_id={} name={}", id.0, recipe.name);
            }
            println!("imported {} recipes", recipes.len());
        }
        Command::List => {
            for choice in store.list_choices().await? {
                println!("{}\t{}", choice.id.0, choice.name);
            }
        }
        Command::Show { id } => {
            let recipe = store
                .fetch_by_id(RecipeId(id))
                .await?
                .ok_or_else(|| not_found(id))?;
            print_recipe(&recipe);
        }
        Command::Remove { id } => {
            if !store.delete_recipe(RecipeId(id)).await? {
                return Err(not_found(id).into());
            }
            println!("removed recipe_id={id}");
        }
    }

    Ok(())
}

fn not_found(id: i64) -> ApiException {
    ApiException::new(ErrorCode::NotFound, format!("recipe {id} not found"))
}

fn print_recipe(recipe: &Recipe) {
    println!("id:           {}", recipe.id.0);
    println!("name:         {}", recipe.name);
    println!("cuisine:      {}", recipe.cuisine);
    println!("image:        {}", recipe.image_file_name);
    println!("ingredients:\n{}", recipe.ingredients);
    println!("instructions:\n{}", recipe.instructions);
}

fn sample_recipes() -> Vec<NewRecipe> {
    vec![
        NewRecipe {
            name: "Soup".into(),
            cuisine: "French".into(),
            ingredients: "onions, butter, beef stock, bread, gruyere".into(),
            instructions: "Caramelise the onions.\nAdd stock and simmer.\nTop with bread and cheese, then grill."
                .into(),
            image_file_name: "soup.jpg".into(),
        },
        NewRecipe {
            name: "Salad".into(),
            cuisine: "Greek".into(),
            ingredients: "tomatoes, cucumber, red onion, olives, feta, olive oil".into(),
            instructions: "Chop the vegetables.\nAdd olives and feta.\nDress with olive oil.".into(),
            image_file_name: "salad.jpg".into(),
        },
    ]
}
