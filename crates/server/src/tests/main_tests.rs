use super::*;
use axum::{body, body::Body, http::Request};
use storage::NewRecipe;
use tempfile::TempDir;
use tower::ServiceExt;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

struct TestApp {
    app: Router,
    _dir: TempDir,
}

fn database_url(dir: &TempDir) -> String {
    format!(
        "sqlite://{}",
        dir.path()
            .join("Recipes.db")
            .to_string_lossy()
            .replace('\\', "/")
    )
}

fn router_for(dir: &TempDir) -> Router {
    let store = RecipeStore::open(&database_url(dir)).expect("store");
    build_router(Arc::new(AppState {
        api: ApiContext::new(store),
        image_dir: dir.path().join("images"),
        max_form_bytes: 1024,
    }))
}

async fn test_app() -> TestApp {
    let dir = TempDir::new().expect("tempdir");
    let admin = RecipeStore::open_writable(&database_url(&dir)).expect("admin");
    admin.create_table().await.expect("table");
    for (name, cuisine) in [("Soup", "French"), ("Salad", "Greek")] {
        admin
            .insert_recipe(&NewRecipe {
                name: name.into(),
                cuisine: cuisine.into(),
                ingredients: "lettuce, tomato".into(),
                instructions: "Chop.\nServe.".into(),
                image_file_name: format!("{}.jpg", name.to_lowercase()),
            })
            .await
            .expect("insert");
    }

    std::fs::create_dir_all(dir.path().join("images")).expect("images dir");
    std::fs::write(dir.path().join("images").join("soup.jpg"), b"not really a jpeg")
        .expect("image");

    TestApp {
        app: router_for(&dir),
        _dir: dir,
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

fn submit(value: &str) -> Request<Body> {
    Request::post("/")
        .header("content-type", FORM_CONTENT_TYPE)
        .body(Body::from(format!("selected_recipe_id={value}")))
        .expect("request")
}

#[tokio::test]
async fn initial_view_lists_every_recipe() {
    let TestApp { app, _dir } = test_app().await;

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(">Soup</option>"));
    assert!(html.contains(">Salad</option>"));
    assert!(html.contains("<option value=\"0\" selected>"));
    assert!(!html.contains("class=\"recipe\""));
}

#[tokio::test]
async fn submitting_an_id_shows_that_recipe() {
    let TestApp { app, _dir } = test_app().await;

    let response = app.oneshot(submit("1")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<h2>Soup</h2>"));
    assert!(html.contains("French"));
    assert!(html.contains("Chop.<br>\nServe."));
    assert!(html.contains("src=\"/images/soup.jpg\""));
    assert!(html.contains("<option value=\"1\" selected>Soup</option>"));
    assert!(html.contains(">Salad</option>"));
}

#[tokio::test]
async fn unknown_id_looks_like_no_selection() {
    let TestApp { app, _dir } = test_app().await;

    let unknown = app.clone().oneshot(submit("99")).await.expect("response");
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown_html = body_text(unknown).await;

    let none = app.oneshot(submit("0")).await.expect("response");
    assert_eq!(none.status(), StatusCode::OK);
    let none_html = body_text(none).await;

    assert!(!unknown_html.contains("class=\"recipe\""));
    assert!(!none_html.contains("class=\"recipe\""));
}

#[tokio::test]
async fn missing_form_field_means_no_selection() {
    let TestApp { app, _dir } = test_app().await;

    let request = Request::post("/")
        .header("content-type", FORM_CONTENT_TYPE)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_text(response).await.contains("class=\"recipe\""));
}

#[tokio::test]
async fn empty_form_value_means_no_selection() {
    let TestApp { app, _dir } = test_app().await;

    let response = app.oneshot(submit("")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<option value=\"0\" selected>"));
    assert!(!html.contains("class=\"recipe\""));
}

#[tokio::test]
async fn non_integer_selection_is_rejected_by_form_binding() {
    let TestApp { app, _dir } = test_app().await;

    let response = app.oneshot(submit("soup")).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn oversized_form_is_rejected() {
    let TestApp { app, _dir } = test_app().await;

    let form = format!("selected_recipe_id={}", "1".repeat(4096));
    let request = Request::post("/")
        .header("content-type", FORM_CONTENT_TYPE)
        .header("content-length", form.len())
        .body(Body::from(form))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn missing_database_renders_generic_error_page() {
    let dir = TempDir::new().expect("tempdir");
    let app = router_for(&dir);

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Something went wrong"));
    assert!(!html.contains("Recipes.db"));

    let response = app.oneshot(submit("0")).await.expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn healthz_reports_store_state() {
    let TestApp { app, _dir } = test_app().await;
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let dir = TempDir::new().expect("tempdir");
    let response = router_for(&dir)
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let err: ApiError = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(err.code, ErrorCode::Unavailable);
}

#[tokio::test]
async fn json_routes_return_choices_and_recipes() {
    let TestApp { app, _dir } = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/api/recipes").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let choices: Vec<RecipeChoice> =
        serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(choices.len(), 2);

    let response = app
        .clone()
        .oneshot(Request::get("/api/recipes/2").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let recipe: Recipe = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(recipe.name, "Salad");
    assert_eq!(recipe.image_file_name, "salad.jpg");

    let response = app
        .oneshot(Request::get("/api/recipes/99").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn serves_images_from_configured_directory() {
    let TestApp { app, _dir } = test_app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/images/soup.jpg").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "not really a jpeg");

    let response = app
        .oneshot(Request::get("/images/salad.jpg").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn json_errors_hide_store_details() {
    let dir = TempDir::new().expect("tempdir");
    let app = router_for(&dir);

    for (uri, status) in [
        ("/api/recipes", StatusCode::INTERNAL_SERVER_ERROR),
        ("/api/recipes/1", StatusCode::INTERNAL_SERVER_ERROR),
        ("/healthz", StatusCode::SERVICE_UNAVAILABLE),
    ] {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), status, "{uri}");

        let text = body_text(response).await;
        assert!(!text.contains("sqlite"), "{uri}: {text}");
        assert!(!text.contains("Recipes.db"), "{uri}: {text}");
        let err: ApiError = serde_json::from_str(&text).expect("json");
        assert_eq!(err.message, server_api::STORE_UNAVAILABLE);
    }
}
