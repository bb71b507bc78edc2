use super::*;
use shared::domain::{RecipeChoice, RecipeId};

fn soup() -> Recipe {
    Recipe {
        id: RecipeId(1),
        name: "Soup & <Bread>".into(),
        cuisine: "French".into(),
        ingredients: "water\nsalt".into(),
        instructions: "Boil \"gently\"".into(),
        image_file_name: "soups/tomato soup.jpg".into(),
    }
}

fn choices() -> Vec<RecipeChoice> {
    vec![
        RecipeChoice {
            id: RecipeId(1),
            name: "Soup & <Bread>".into(),
        },
        RecipeChoice {
            id: RecipeId(2),
            name: "Salad".into(),
        },
    ]
}

#[test]
fn unselected_page_marks_placeholder_and_has_no_details() {
    let html = recipe_page(&RecipePage::unselected(choices()));

    assert!(html.contains("<option value=\"0\" selected>-- Select a recipe --</option>"));
    assert!(html.contains("<option value=\"2\">Salad</option>"));
    assert!(!html.contains("class=\"recipe\""));
}

#[test]
fn selected_page_renders_escaped_details() {
    let page = RecipePage {
        choices: choices(),
        selection: RecipeSelection::Recipe(RecipeId(1)),
        recipe: Some(soup()),
    };
    let html = recipe_page(&page);

    assert!(html.contains("<option value=\"1\" selected>Soup &amp; &lt;Bread&gt;</option>"));
    assert!(html.contains("<option value=\"0\">-- Select a recipe --</option>"));
    assert!(html.contains("<h2>Soup &amp; &lt;Bread&gt;</h2>"));
    assert!(html.contains("water<br>\nsalt"));
    assert!(html.contains("Boil &quot;gently&quot;"));
    assert!(html.contains("src=\"/images/soups/tomato%20soup.jpg\""));
    assert!(!html.contains("<Bread>"));
}

#[test]
fn blank_image_file_name_renders_no_img_tag() {
    let mut recipe = soup();
    recipe.image_file_name = "  ".into();
    let page = RecipePage {
        choices: choices(),
        selection: RecipeSelection::Recipe(RecipeId(1)),
        recipe: Some(recipe),
    };

    assert!(!recipe_page(&page).contains("<img"));
}

#[test]
fn escape_html_covers_attribute_quotes() {
    assert_eq!(escape_html("a'b\"c"), "a&#39;b&quot;c");
}

#[test]
fn error_page_leaks_no_details() {
    let html = error_page();
    assert!(html.contains("Something went wrong"));
    assert!(!html.contains("sqlite"));
}
