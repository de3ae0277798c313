use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, AccessToken, RegisteredUser, Todo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn detail(response: axum::response::Response) -> String {
    let body: serde_json::Value = body_json(response).await;
    body["detail"].as_str().unwrap().to_string()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn login_request(email: &str, password: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(format!("username={email}&password={password}"))
        .unwrap()
}

/// Register `email` and return a bearer token for it.
async fn sign_up(app: &Router, email: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/register",
            None,
            &format!(r#"{{"email":"{email}","password":"password123"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(login_request(email, "password123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: AccessToken = body_json(resp).await;
    assert_eq!(token.token_type, "bearer");
    token.access_token
}

// --- root ---

#[tokio::test]
async fn root_is_public() {
    let resp = app()
        .oneshot(Request::builder().uri("/").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert!(body["message"].is_string());
}

// --- auth ---

#[tokio::test]
async fn register_returns_account() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/register",
            None,
            r#"{"email":"ada@example.com","password":"password123"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: RegisteredUser = body_json(resp).await;
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.id, 1);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = app();
    sign_up(&app, "ada@example.com").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            "/register",
            None,
            r#"{"email":"ada@example.com","password":"whatever1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(resp).await, "Email already registered");
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = app();
    sign_up(&app, "ada@example.com").await;

    let resp = app
        .oneshot(login_request("ada@example.com", "nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Incorrect email or password");
}

#[tokio::test]
async fn todos_require_bearer() {
    let resp = app()
        .oneshot(Request::builder().uri("/todos/").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Not authenticated");
}

#[tokio::test]
async fn unknown_token_is_401() {
    let resp = app()
        .oneshot(json_request("GET", "/todos/", Some("forged"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Could not validate credentials");
}

// --- todos ---

#[tokio::test]
async fn list_todos_empty() {
    let app = app();
    let token = sign_up(&app, "ada@example.com").await;

    let resp = app
        .oneshot(json_request("GET", "/todos/", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}

#[tokio::test]
async fn create_todo_malformed_json_returns_422() {
    let app = app();
    let token = sign_up(&app, "ada@example.com").await;

    let resp = app
        .oneshot(json_request("POST", "/todos/", Some(&token), r#"{"not_title":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_todo_bad_id_returns_400() {
    let app = app();
    let token = sign_up(&app, "ada@example.com").await;

    let resp = app
        .oneshot(json_request("GET", "/todos/not-a-number", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn todos_are_scoped_to_owner() {
    let app = app();
    let ada = sign_up(&app, "ada@example.com").await;
    let bob = sign_up(&app, "bob@example.com").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos/", Some(&ada), r#"{"title":"Ada's"}"#))
        .await
        .unwrap();
    let created: Todo = body_json(resp).await;

    let resp = app
        .clone()
        .oneshot(json_request("GET", "/todos/", Some(&bob), ""))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());

    let resp = app
        .oneshot(json_request(
            "DELETE",
            &format!("/todos/{}", created.id),
            Some(&bob),
            "",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(detail(resp).await, "Todo not found");
}

// --- full CRUD lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    let app = app();
    let token = sign_up(&app, "ada@example.com").await;
    let token = Some(token.as_str());

    // create
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos/", token, r#"{"title":"Walk dog"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Todo = body_json(resp).await;
    assert_eq!(created.title, "Walk dog");
    assert!(created.description.is_none());
    let id = created.id;

    // list: should contain the one todo
    let resp = app
        .clone()
        .oneshot(json_request("GET", "/todos/", token, ""))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, id);

    // update: partial, only description
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/todos/{id}"),
            token,
            r#"{"description":"around the block"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Todo = body_json(resp).await;
    assert_eq!(updated.title, "Walk dog"); // unchanged
    assert_eq!(updated.description.as_deref(), Some("around the block"));

    // get
    let resp = app
        .clone()
        .oneshot(json_request("GET", &format!("/todos/{id}"), token, ""))
        .await
        .unwrap();
    let fetched: Todo = body_json(resp).await;
    assert_eq!(fetched.description.as_deref(), Some("around the block"));

    // delete
    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &format!("/todos/{id}"), token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], format!("Todo with id {id} deleted"));

    // get after delete: 404
    let resp = app
        .clone()
        .oneshot(json_request("GET", &format!("/todos/{id}"), token, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete: empty
    let resp = app
        .oneshot(json_request("GET", "/todos/", token, ""))
        .await
        .unwrap();
    let todos: Vec<Todo> = body_json(resp).await;
    assert!(todos.is_empty());
}
