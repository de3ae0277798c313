//! Session owner and declarative view state for a todo front end.
//!
//! # Design
//! `TodoApp` is the single owner of the `Session`. Sign-in state changes only
//! through `restore`, `login`, `logout` and `set_credential`; the client
//! borrows the session for each request. Front ends read `View` and render
//! it; they never toggle state themselves.
//!
//! Every mutation is followed by a full `refresh`, started only after the
//! mutation's response has been handled, so the feed always holds the last
//! successful list response and is never patched locally.

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::{CredentialStore, Session, StoredCredential};
use crate::transport::Transport;
use crate::types::{CreateTodo, RegisteredUser, Todo, UpdateTodo};
use crate::validate;

pub const REGISTERED_NOTICE: &str = "Registration successful! You can now sign in.";
pub const SESSION_EXPIRED: &str = "Your session has expired, please sign in again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthView {
    SignedOut,
    SignedIn { email: String },
}

/// State of the most recent form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Error(String),
    Notice(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    NotLoaded,
    Loaded(Vec<Todo>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub auth: AuthView,
    pub form: FormState,
    pub feed: Feed,
    /// Item dimmed while its delete is in flight.
    pub pending_delete: Option<i64>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            auth: AuthView::SignedOut,
            form: FormState::Idle,
            feed: Feed::NotLoaded,
            pending_delete: None,
        }
    }
}

pub struct TodoApp<T, S> {
    client: TodoClient,
    transport: T,
    store: S,
    session: Session,
    view: View,
}

impl<T: Transport, S: CredentialStore> TodoApp<T, S> {
    pub fn new(client: TodoClient, transport: T, store: S) -> Self {
        Self {
            client,
            transport,
            store,
            session: Session::anonymous(),
            view: View::default(),
        }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Re-populate the session from the durable entry and load the feed.
    ///
    /// Only storage failures are returned; a failed fetch is left in the
    /// feed. A stored token the backend no longer accepts is dropped and the
    /// view falls back to signed-out.
    pub fn restore(&mut self) -> Result<(), ApiError> {
        let Some(credential) = self.store.load()? else {
            tracing::debug!("no stored credential, starting signed out");
            self.view = View::default();
            return Ok(());
        };
        self.session.sign_in(&credential);
        self.view.auth = self.auth_view();

        match self.refresh() {
            Err(e) if e.is_unauthorized() => {
                tracing::info!("stored credential rejected, signing out");
                self.set_credential(None)?;
                self.view.form = FormState::Error(SESSION_EXPIRED.to_string());
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Replace the in-memory credential and mirror it to the durable store.
    /// `None` signs out.
    pub fn set_credential(&mut self, credential: Option<StoredCredential>) -> Result<(), ApiError> {
        match credential {
            Some(credential) => {
                self.store.save(&credential)?;
                self.session.sign_in(&credential);
            }
            None => {
                self.store.clear()?;
                self.session.clear();
                self.view.feed = Feed::NotLoaded;
                self.view.pending_delete = None;
            }
        }
        self.view.auth = self.auth_view();
        Ok(())
    }

    /// Sign in and load the feed. A failed login leaves any previous
    /// credential untouched.
    pub fn login(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        self.submit(|app| {
            let email = validate::email(email)?;
            let password = validate::login_password(password)?;
            let token = app
                .send(app.client.build_login(email, password))
                .and_then(|r| app.client.parse_login(r))?;
            app.set_credential(Some(StoredCredential {
                access_token: token,
                email: Some(email.to_string()),
            }))
        })?;
        tracing::info!(email = email.trim(), "signed in");
        // Feed errors are shown in the list, not as a failed login.
        let _ = self.refresh();
        Ok(())
    }

    /// Create an account. The password length is checked before any request.
    pub fn register(&mut self, email: &str, password: &str) -> Result<RegisteredUser, ApiError> {
        let user = self.submit(|app| {
            let email = validate::email(email)?;
            let password = validate::password(password)?;
            let req = app.client.build_register(email, password)?;
            app.send(req).and_then(|r| app.client.parse_register(r))
        })?;
        self.view.form = FormState::Notice(REGISTERED_NOTICE.to_string());
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<(), ApiError> {
        self.set_credential(None)?;
        self.view.form = FormState::Idle;
        tracing::info!("signed out");
        Ok(())
    }

    /// Fetch the list and replace the feed with it.
    pub fn refresh(&mut self) -> Result<(), ApiError> {
        let req = self.client.build_list_todos(&self.session);
        let result = self.send(req).and_then(|r| self.client.parse_list_todos(r));
        self.view.pending_delete = None;
        match result {
            Ok(todos) => {
                self.view.feed = Feed::Loaded(todos);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load todos");
                self.view.feed = Feed::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Create a todo, then reload the feed.
    pub fn create(&mut self, title: &str, description: &str) -> Result<Todo, ApiError> {
        let todo = self.submit(|app| {
            let title = validate::title(title)?;
            let req = app
                .client
                .build_create_todo(&app.session, &CreateTodo::new(title, description))?;
            app.send(req).and_then(|r| app.client.parse_create_todo(r))
        })?;
        tracing::debug!(id = todo.id, "todo created");
        let _ = self.refresh();
        Ok(todo)
    }

    /// Update the given fields of a todo, then reload the feed.
    pub fn update(
        &mut self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Todo, ApiError> {
        let todo = self.submit(|app| {
            let input = UpdateTodo {
                title: title.map(validate::title).transpose()?.map(str::to_string),
                description: description.map(|d| d.trim().to_string()),
            };
            let req = app.client.build_update_todo(&app.session, id, &input)?;
            app.send(req).and_then(|r| app.client.parse_update_todo(r))
        })?;
        let _ = self.refresh();
        Ok(todo)
    }

    /// Delete a todo. On failure the item stays listed and interactive.
    pub fn delete(&mut self, id: i64) -> Result<(), ApiError> {
        self.view.pending_delete = Some(id);
        let req = self.client.build_delete_todo(&self.session, id);
        if let Err(e) = self.send(req).and_then(|r| self.client.parse_delete_todo(r)) {
            tracing::warn!(id, error = %e, "failed to delete todo");
            self.view.pending_delete = None;
            return Err(e);
        }
        let _ = self.refresh();
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Todo, ApiError> {
        let req = self.client.build_get_todo(&self.session, id);
        self.send(req).and_then(|r| self.client.parse_get_todo(r))
    }

    /// The backend's root document.
    pub fn info(&self) -> Result<serde_json::Value, ApiError> {
        self.send(self.client.build_root())
            .and_then(|r| self.client.parse_root(r))
    }

    fn send(&self, req: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(req)
    }

    fn auth_view(&self) -> AuthView {
        match self.session.user() {
            Some(user) if self.session.is_authenticated() => AuthView::SignedIn {
                email: user.email.clone(),
            },
            _ => AuthView::SignedOut,
        }
    }

    fn submit<R>(
        &mut self,
        action: impl FnOnce(&mut Self) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        self.view.form = FormState::Submitting;
        let result = action(self);
        self.view.form = match &result {
            Ok(_) => FormState::Idle,
            Err(e) => FormState::Error(e.to_string()),
        };
        result
    }
}
