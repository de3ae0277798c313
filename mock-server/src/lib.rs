use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
}

/// Field names follow the OAuth2 password form: the email travels as
/// `username`.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

struct Account {
    id: i64,
    password: String,
}

struct OwnedTodo {
    owner: i64,
    todo: Todo,
}

#[derive(Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, i64>,
    todos: BTreeMap<i64, OwnedTodo>,
    next_account_id: i64,
    next_todo_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

/// Error response in the `{"detail": "..."}` shape.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    detail: &'static str,
}

impl ApiFailure {
    const fn new(status: StatusCode, detail: &'static str) -> Self {
        Self { status, detail }
    }
}

const NOT_AUTHENTICATED: ApiFailure = ApiFailure::new(StatusCode::UNAUTHORIZED, "Not authenticated");
const INVALID_TOKEN: ApiFailure =
    ApiFailure::new(StatusCode::UNAUTHORIZED, "Could not validate credentials");
const TODO_NOT_FOUND: ApiFailure = ApiFailure::new(StatusCode::NOT_FOUND, "Todo not found");

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "detail": self.detail }))).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// The account behind a valid `Authorization: Bearer` header.
pub struct Owner(i64);

impl FromRequestParts<Db> for Owner {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(NOT_AUTHENTICATED)?;
        let store = db.read().await;
        store.tokens.get(token).copied().map(Owner).ok_or(INVALID_TOKEN)
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(root))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/todos/", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Welcome to the Todo API",
        "operations": ["CREATE (POST)", "READ (GET)", "UPDATE (PUT)", "DELETE (DELETE)"],
    }))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<Registration>,
) -> Result<Json<RegisteredUser>, ApiFailure> {
    let mut store = db.write().await;
    if store.accounts.contains_key(&input.email) {
        return Err(ApiFailure::new(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    store.next_account_id += 1;
    let id = store.next_account_id;
    store.accounts.insert(
        input.email.clone(),
        Account {
            id,
            password: input.password,
        },
    );
    tracing::info!(id, "account registered");
    Ok(Json(RegisteredUser {
        id,
        email: input.email,
    }))
}

async fn login(
    State(db): State<Db>,
    Form(input): Form<LoginForm>,
) -> Result<Json<AccessToken>, ApiFailure> {
    let mut store = db.write().await;
    let id = store
        .accounts
        .get(&input.username)
        .filter(|account| account.password == input.password)
        .map(|account| account.id)
        .ok_or(ApiFailure::new(StatusCode::UNAUTHORIZED, "Incorrect email or password"))?;
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), id);
    Ok(Json(AccessToken {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

async fn list_todos(State(db): State<Db>, Owner(owner): Owner) -> Json<Vec<Todo>> {
    let store = db.read().await;
    Json(
        store
            .todos
            .values()
            .filter(|entry| entry.owner == owner)
            .map(|entry| entry.todo.clone())
            .collect(),
    )
}

async fn create_todo(
    State(db): State<Db>,
    Owner(owner): Owner,
    Json(input): Json<CreateTodo>,
) -> Json<Todo> {
    let mut store = db.write().await;
    store.next_todo_id += 1;
    let todo = Todo {
        id: store.next_todo_id,
        title: input.title,
        description: input.description,
    };
    store.todos.insert(
        todo.id,
        OwnedTodo {
            owner,
            todo: todo.clone(),
        },
    );
    Json(todo)
}

async fn get_todo(
    State(db): State<Db>,
    Owner(owner): Owner,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, ApiFailure> {
    let store = db.read().await;
    store
        .todos
        .get(&id)
        .filter(|entry| entry.owner == owner)
        .map(|entry| Json(entry.todo.clone()))
        .ok_or(TODO_NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Owner(owner): Owner,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, ApiFailure> {
    let mut store = db.write().await;
    let entry = store
        .todos
        .get_mut(&id)
        .filter(|entry| entry.owner == owner)
        .ok_or(TODO_NOT_FOUND)?;
    if let Some(title) = input.title {
        entry.todo.title = title;
    }
    if let Some(description) = input.description {
        entry.todo.description = Some(description);
    }
    Ok(Json(entry.todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Owner(owner): Owner,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let mut store = db.write().await;
    if !store.todos.get(&id).is_some_and(|entry| entry.owner == owner) {
        return Err(TODO_NOT_FOUND);
    }
    store.todos.remove(&id);
    Ok(Json(json!({ "message": format!("Todo with id {id} deleted") })))
}
