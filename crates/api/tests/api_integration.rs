//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use document_store::{InMemoryDocumentStore, Operation};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, InMemoryDocumentStore) {
    let store = InMemoryDocumentStore::new();
    let state = api::AppState::new(store.clone());
    (api::create_app(state, get_metrics_handle()), store)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn book_body(title: &str) -> Value {
    json!({
        "title": title,
        "author": "Mary Shelley",
        "pages": 280,
        "genre": "Gothic Fiction",
        "printType": "Paper",
        "publisher": "Lackington Hughes"
    })
}

fn audio_body(book_id: Option<&str>) -> Value {
    json!({
        "title": "Frankenstein Unabridged",
        "author": "Mary Shelley",
        "voiceActor": "Dan Stevens Reads",
        "recordingStudio": "Audible Studios",
        "genre": "Gothic Fiction",
        "audioFormat": "mp3",
        "time": "08:35",
        "type": "standard",
        "bookId": book_id
    })
}

async fn create_book(app: &axum::Router, title: &str) -> String {
    let (status, json) = send(app, "POST", "/books", Some(book_body(title))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Book created successfully");
    json["bookId"].as_str().unwrap().to_string()
}

async fn create_audio(app: &axum::Router, book_id: Option<&str>) -> String {
    let (status, json) = send(app, "POST", "/audio", Some(audio_body(book_id))).await;
    assert_eq!(status, StatusCode::CREATED);
    json["audioId"].as_str().unwrap().to_string()
}

async fn get_book(app: &axum::Router, book_id: &str) -> Value {
    let (status, json) = send(app, "GET", &format!("/books/{book_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let views = json.as_array().unwrap();
    assert_eq!(views.len(), 1);
    views[0].clone()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_welcome_and_fallback() {
    let (app, _) = setup();

    let (status, json) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Welcome to Da Book Store API");

    let (status, json) = send(&app, "GET", "/magazines", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Route not found");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    create_book(&app, "Frankenstein").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

mod books {
    use super::*;

    #[tokio::test]
    async fn test_book_view_has_empty_audiobooks() {
        let (app, _) = setup();
        let book_id = create_book(&app, "Frankenstein").await;

        let view = get_book(&app, &book_id).await;
        assert_eq!(view["_id"], book_id);
        assert_eq!(view["hasAudiobook"], false);
        assert_eq!(view["audiobooks"], json!([]));

        let (status, json) = send(&app, "GET", "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["audiobooks"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected_before_the_store() {
        let (app, store) = setup();

        for method in ["GET", "DELETE"] {
            let (status, json) = send(&app, method, "/books/12345", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], "Invalid book ID format");
        }
        let (status, _) = send(&app, "PUT", "/books/12345", Some(book_body("Frankenstein"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(store.operation_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_book_is_not_found() {
        let (app, _) = setup();
        let id = common::DocumentId::new();
        let (status, json) = send(&app, "GET", &format!("/books/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Book not found");
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed() {
        let (app, _) = setup();
        let (status, json) = send(
            &app,
            "POST",
            "/books",
            Some(json!({"title": "Frankenstein", "pages": -3})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors = json["errors"].as_array().unwrap();
        assert!(errors.contains(&json!("Pages must be a positive integer")));
        assert!(errors.contains(&json!("Author is required")));
    }

    #[tokio::test]
    async fn test_numeric_string_pages_are_accepted() {
        let (app, _) = setup();
        let mut body = book_body("Frankenstein");
        body["pages"] = json!("280");

        let (status, json) = send(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        let book_id = json["bookId"].as_str().unwrap().to_string();
        assert_eq!(get_book(&app, &book_id).await["pages"], 280);

        let mut body = book_body("Frankenstein");
        body["pages"] = json!("two hundred");
        let (status, json) = send(&app, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"], json!(["Pages must be a positive integer"]));
    }

    #[tokio::test]
    async fn test_unreadable_body_is_bad_request() {
        let (app, _) = setup();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/books")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_ignores_client_has_audiobook() {
        let (app, _) = setup();
        let book_id = create_book(&app, "Frankenstein").await;

        let mut body = book_body("Frankenstein Revised");
        body["hasAudiobook"] = json!(true);
        let (status, json) = send(&app, "PUT", &format!("/books/{book_id}"), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Book updated successfully");

        let view = get_book(&app, &book_id).await;
        assert_eq!(view["title"], "Frankenstein Revised");
        assert_eq!(view["hasAudiobook"], false);
    }

    #[tokio::test]
    async fn test_store_failure_is_500_with_detail() {
        let (app, store) = setup();
        store.fail_operation(Operation::Aggregate).await;

        let (status, json) = send(&app, "GET", "/books", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Failed to fetch books");
        assert!(json["error"].as_str().is_some());
    }
}

mod audio {
    use super::*;

    #[tokio::test]
    async fn test_link_lifecycle_through_http() {
        let (app, _) = setup();
        let book_id = create_book(&app, "Frankenstein").await;
        let audio_id = create_audio(&app, Some(&book_id)).await;

        let view = get_book(&app, &book_id).await;
        assert_eq!(view["hasAudiobook"], true);
        assert_eq!(
            view["audiobooks"],
            json!([{
                "_id": audio_id,
                "type": "standard",
                "voiceActor": "Dan Stevens Reads",
                "time": "08:35",
                "recordingStudio": "Audible Studios",
                "audioFormat": "mp3"
            }])
        );

        let (status, json) = send(&app, "DELETE", &format!("/audio/{audio_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Audiobook deleted successfully");

        let view = get_book(&app, &book_id).await;
        assert_eq!(view["hasAudiobook"], false);
        assert_eq!(view["audiobooks"], json!([]));
    }

    #[tokio::test]
    async fn test_relink_via_update() {
        let (app, _) = setup();
        let first = create_book(&app, "Frankenstein").await;
        let second = create_book(&app, "The Last Man").await;
        let audio_id = create_audio(&app, Some(&first)).await;

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/audio/{audio_id}"),
            Some(audio_body(Some(&second))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(get_book(&app, &first).await["hasAudiobook"], false);
        assert_eq!(get_book(&app, &second).await["hasAudiobook"], true);
    }

    #[tokio::test]
    async fn test_audiodrama_with_book_is_rejected() {
        let (app, _) = setup();
        let book_id = create_book(&app, "Frankenstein").await;

        let mut body = audio_body(Some(&book_id));
        body["type"] = json!("audiodrama");
        let (status, _) = send(&app, "POST", "/audio", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(get_book(&app, &book_id).await["hasAudiobook"], false);
    }

    #[tokio::test]
    async fn test_reference_errors() {
        let (app, store) = setup();

        let before = store.operation_count();
        let (status, json) = send(&app, "POST", "/audio", Some(audio_body(Some("12345")))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid book ID format");
        assert_eq!(store.operation_count(), before);

        let missing = common::DocumentId::new().to_string();
        let (status, json) = send(&app, "POST", "/audio", Some(audio_body(Some(&missing)))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Book not found");

        let (status, json) = send(&app, "DELETE", &format!("/audio/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Audiobook not found");

        let (status, json) = send(&app, "GET", "/audio/12345", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid audiobook ID format");
    }

    #[tokio::test]
    async fn test_recount_failure_is_500() {
        let (app, store) = setup();
        let book_id = create_book(&app, "Frankenstein").await;
        let audio_id = create_audio(&app, Some(&book_id)).await;

        store.fail_operation(Operation::CountDocuments).await;
        let (status, json) = send(&app, "DELETE", &format!("/audio/{audio_id}"), None).await;
        store.heal().await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Failed to delete audiobook");

        let (status, _) = send(&app, "GET", &format!("/audio/{audio_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod users_and_orders {
    use super::*;

    fn user_body(email: &str) -> Value {
        json!({
            "type": "buyer",
            "email": email,
            "phone": "5550001111",
            "address": "12 Rue Morgue, Paris",
            "password": "Gothic@1818"
        })
    }

    #[tokio::test]
    async fn test_user_never_exposes_password() {
        let (app, _) = setup();
        let (status, json) = send(
            &app,
            "POST",
            "/users",
            Some(user_body("victor@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = json["userId"].as_str().unwrap().to_string();

        let (status, json) = send(&app, "GET", &format!("/users/{user_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["email"], "victor@example.com");
        assert!(json.get("password").is_none());

        let (status, _) = send(
            &app,
            "POST",
            "/users",
            Some(user_body("Victor@Example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_order_flow() {
        let (app, _) = setup();
        let book_id = create_book(&app, "Frankenstein").await;
        let (_, json) = send(
            &app,
            "POST",
            "/users",
            Some(user_body("elizabeth@example.com")),
        )
        .await;
        let user_id = json["userId"].as_str().unwrap().to_string();

        let order = json!({
            "userId": user_id,
            "shippingAddress": "Villa Diodati, Cologny, Geneva",
            "date": "1816-06-16",
            "paymentMethod": "Cash on Delivery",
            "bookIds": [book_id]
        });
        let (status, json) = send(&app, "POST", "/orders", Some(order)).await;
        assert_eq!(status, StatusCode::CREATED);
        let order_id = json["orderId"].as_str().unwrap().to_string();

        let (status, json) = send(&app, "GET", &format!("/users/{user_id}/orders"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["_id"], order_id);
        assert_eq!(json[0]["paymentMethod"], "Cash on Delivery");

        let (status, _) = send(&app, "DELETE", &format!("/orders/{order_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Order not found");
    }

    #[tokio::test]
    async fn test_order_for_missing_user_is_not_found() {
        let (app, _) = setup();
        let book_id = create_book(&app, "Frankenstein").await;
        let order = json!({
            "userId": common::DocumentId::new(),
            "shippingAddress": "Villa Diodati, Cologny, Geneva",
            "paymentMethod": "PayPal",
            "bookIds": [book_id]
        });
        let (status, json) = send(&app, "POST", "/orders", Some(order)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "User not found");
    }
}
