use std::fmt::Write as _;

use shared::{
    domain::{Recipe, RecipeSelection},
    protocol::RecipePage,
};

pub const IMAGES_ROUTE: &str = "/images";

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Recipes</title>
</head>
<body>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

pub fn recipe_page(page: &RecipePage) -> String {
    let mut html = String::from(PAGE_HEAD);
    html.push_str("<h1>Recipes</h1>\n");
    html.push_str("<form method=\"post\" action=\"/\">\n");
    html.push_str("<label for=\"selected_recipe_id\">Choose a recipe</label>\n");
    html.push_str("<select id=\"selected_recipe_id\" name=\"selected_recipe_id\">\n");
    let _ = writeln!(
        html,
        "<option value=\"{}\"{}>-- Select a recipe --</option>",
        RecipeSelection::FORM_NONE,
        selected_attr(page.selection == RecipeSelection::None),
    );
    for choice in &page.choices {
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            choice.id.0,
            selected_attr(page.selection == RecipeSelection::Recipe(choice.id)),
            escape_html(&choice.name),
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Show</button>\n</form>\n");

    if let Some(recipe) = &page.recipe {
        recipe_details(&mut html, recipe);
    }

    html.push_str(PAGE_TAIL);
    html
}

pub fn error_page() -> String {
    let mut html = String::from(PAGE_HEAD);
    html.push_str("<h1>Something went wrong</h1>\n");
    html.push_str("<p>The recipes could not be loaded. Please try again later.</p>\n");
    html.push_str(PAGE_TAIL);
    html
}

fn recipe_details(html: &mut String, recipe: &Recipe) {
    html.push_str("<section class=\"recipe\">\n");
    let _ = writeln!(html, "<h2>{}</h2>", escape_html(&recipe.name));
    let _ = writeln!(
        html,
        "<p><strong>Cuisine:</strong> {}</p>",
        escape_html(&recipe.cuisine)
    );
    let _ = writeln!(
        html,
        "<h3>Ingredients</h3>\n<p>{}</p>",
        multiline(&recipe.ingredients)
    );
    let _ = writeln!(
        html,
        "<h3>Instructions</h3>\n<p>{}</p>",
        multiline(&recipe.instructions)
    );
    if !recipe.image_file_name.trim().is_empty() {
        let _ = writeln!(
            html,
            "<img src=\"{IMAGES_ROUTE}/{}\" alt=\"{}\">",
            escape_html(&encode_path(recipe.image_file_name.trim())),
            escape_html(&recipe.name),
        );
    }
    html.push_str("</section>\n");
}

fn selected_attr(selected: bool) -> &'static str {
    if selected {
        " selected"
    } else {
        ""
    }
}

fn multiline(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>\n")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Percent-encodes everything outside the unreserved set, keeping `/` so
/// nested image paths still resolve.
fn encode_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.replace('\\', "/").bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
