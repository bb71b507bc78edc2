use serde::{de, Deserialize, Deserializer, Serialize};

use crate::domain::{Recipe, RecipeChoice, RecipeSelection};

/// Everything the page needs to render one response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecipePage {
    pub choices: Vec<RecipeChoice>,
    pub selection: RecipeSelection,
    pub recipe: Option<Recipe>,
}

impl RecipePage {
    pub fn unselected(choices: Vec<RecipeChoice>) -> Self {
        Self {
            choices,
            selection: RecipeSelection::None,
            recipe: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectRecipeForm {
    #[serde(default, deserialize_with = "form_integer")]
    pub selected_recipe_id: i64,
}

impl SelectRecipeForm {
    pub fn selection(&self) -> RecipeSelection {
        RecipeSelection::from_form_value(self.selected_recipe_id)
    }
}

/// Form fields arrive as text; an empty value binds to the "nothing
/// selected" value, anything else must parse as an integer.
fn form_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                Ok(RecipeSelection::FORM_NONE)
            } else {
                text.parse().map_err(de::Error::custom)
            }
        }
    }
}
