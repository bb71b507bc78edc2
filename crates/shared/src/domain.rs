use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(RecipeId);

/// One row of the `Recipes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub cuisine: String,
    pub ingredients: String,
    pub instructions: String,
    pub image_file_name: String,
}

/// The `(id, name)` projection used to populate the selection control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeChoice {
    pub id: RecipeId,
    pub name: String,
}

/// What the user picked in the dropdown.
///
/// The form posts `0` for the placeholder entry; that value never reaches the
/// store and is represented as [`RecipeSelection::None`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecipeSelection {
    #[default]
    None,
    Recipe(RecipeId),
}

impl RecipeSelection {
    pub const FORM_NONE: i64 = 0;

    pub fn from_form_value(value: i64) -> Self {
        if value == Self::FORM_NONE {
            Self::None
        } else {
            Self::Recipe(RecipeId(value))
        }
    }

    pub fn form_value(self) -> i64 {
        match self {
            Self::None => Self::FORM_NONE,
            Self::Recipe(id) => id.0,
        }
    }

    pub fn recipe_id(self) -> Option<RecipeId> {
        match self {
            Self::None => None,
            Self::Recipe(id) => Some(id),
        }
    }
}
