use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    response::Response,
    Router,
};
use bookstore_kernel::settings::{DatabaseSettings, Settings};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    app: bookstore_app::App,
    dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        database: DatabaseSettings::with_url(format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("bookstore.db").display()
        )),
        ..Settings::default()
    };

    let app = bookstore_app::bootstrap(&settings).await.unwrap();
    let router = bookstore_http::build_router(&app.registry, &settings, app.db.clone());

    TestApp {
        router,
        app,
        dir,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn book_lifecycle_round_trip() {
    let app = spawn_app().await;

    let response = app
        .send(
            "POST",
            "/book/",
            Some(json!({"name": "Dune", "author": "Herbert", "publication": "Chilton"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let uri = format!("/book/{}", created["id"].as_i64().unwrap());

    let response = app.send("GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = json_body(response).await;
    for field in ["id", "name", "author", "publication"] {
        assert_eq!(fetched[field], created[field], "{field}");
    }

    let response = app
        .send("PUT", &uri, Some(json!({"name": "Dune Messiah"})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["name"], "Dune Messiah");
    assert_eq!(updated["author"], "Herbert");
    assert_eq!(updated["publication"], "Chilton");

    let response = app.send("DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Dune Messiah");

    let response = app.send("GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_returns_at_least_the_created_books() {
    let app = spawn_app().await;

    let mut ids = Vec::new();
    for (name, author) in [("Hyperion", "Simmons"), ("Solaris", "Lem")] {
        let response = app
            .send(
                "POST",
                "/book/",
                Some(json!({"name": name, "author": author, "publication": "Doubleday"})),
            )
            .await;
        ids.push(json_body(response).await["id"].clone());
    }

    let response = app.send("GET", "/book/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Value> = json_body(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].clone())
        .collect();
    for id in ids {
        assert!(listed.contains(&id), "{id} missing from {listed:?}");
    }
}

#[tokio::test]
async fn bootstrap_is_repeatable_on_the_same_database() {
    let first = spawn_app().await;
    let settings = Settings {
        database: DatabaseSettings::with_url(format!(
            "sqlite://{}?mode=rwc",
            first.dir.path().join("bookstore.db").display()
        )),
        ..Settings::default()
    };

    first
        .send(
            "POST",
            "/book/",
            Some(json!({"name": "Dune", "author": "Herbert", "publication": "Chilton"})),
        )
        .await;

    // Auto-migration must not disturb existing rows
    let second = bookstore_app::bootstrap(&settings).await.unwrap();
    let router = bookstore_http::build_router(&second.registry, &settings, second.db.clone());
    let response = router
        .oneshot(Request::builder().uri("/book/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ambient_routes_are_served() {
    let app = spawn_app().await;
    assert!(app.app.registry.get_module("books").is_some());

    let response = app.send("GET", "/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app.send("GET", "/docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let spec = json_body(response).await;
    assert!(spec["paths"]["/book/"]["post"].is_object());
    assert!(spec["paths"]["/book/{book_id}"]["put"].is_object());
}
