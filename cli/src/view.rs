//! Text rendering of the controller's `View`.

use std::fmt::Write as _;

use todo_core::{AuthView, Feed, FormState, Todo, View};

pub fn render(view: &View, base_url: &str) -> String {
    let mut out = String::new();
    match &view.auth {
        AuthView::SignedIn { email } => {
            let _ = writeln!(out, "Signed in as {email}");
        }
        AuthView::SignedOut => {
            let _ = writeln!(out, "Not signed in. Use `todo login` or `todo register`.");
        }
    }
    match &view.form {
        FormState::Error(message) => {
            let _ = writeln!(out, "! {message}");
        }
        FormState::Notice(message) => {
            let _ = writeln!(out, "{message}");
        }
        FormState::Idle | FormState::Submitting => {}
    }
    out.push_str(&render_feed(&view.feed, view.pending_delete, base_url));
    out
}

pub fn render_feed(feed: &Feed, pending_delete: Option<i64>, base_url: &str) -> String {
    let mut out = String::new();
    match feed {
        Feed::NotLoaded => {}
        Feed::Loaded(todos) if todos.is_empty() => {
            out.push_str("No tasks yet\n");
            out.push_str("  Add your first task with `todo add <title>`.\n");
        }
        Feed::Loaded(todos) => {
            for todo in todos {
                out.push_str(&render_todo(todo, pending_delete == Some(todo.id)));
            }
        }
        Feed::Failed(message) => {
            let _ = writeln!(out, "Error");
            let _ = writeln!(out, "  Failed to load tasks: {message}.");
            let _ = writeln!(out, "  Check if your backend is running at: {base_url}");
        }
    }
    out
}

pub fn render_todo(todo: &Todo, deleting: bool) -> String {
    let mut out = String::new();
    let marker = if deleting { " (deleting...)" } else { "" };
    let _ = writeln!(out, "- {}{marker}", todo.title);
    match todo.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => {
            let _ = writeln!(out, "  {description}");
        }
        None => out.push_str("  No description\n"),
    }
    let _ = writeln!(out, "  ID: {}", todo.id);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: i64, title: &str, description: Option<&str>) -> Todo {
        Todo {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn empty_feed_shows_hint() {
        let out = render_feed(&Feed::Loaded(Vec::new()), None, "http://x");
        assert!(out.starts_with("No tasks yet"));
    }

    #[test]
    fn items_show_description_or_placeholder() {
        let feed = Feed::Loaded(vec![
            todo(1, "Buy milk", None),
            todo(2, "Walk dog", Some("around the block")),
        ]);
        let out = render_feed(&feed, None, "http://x");
        assert_eq!(
            out,
            "- Buy milk\n  No description\n  ID: 1\n- Walk dog\n  around the block\n  ID: 2\n"
        );
    }

    #[test]
    fn pending_delete_is_marked() {
        let feed = Feed::Loaded(vec![todo(7, "Old", None)]);
        assert!(render_feed(&feed, Some(7), "http://x").contains("Old (deleting...)"));
        assert!(!render_feed(&feed, None, "http://x").contains("deleting"));
    }

    #[test]
    fn failed_feed_names_backend() {
        let out = render_feed(&Feed::Failed("network error: refused".to_string()), None, "http://api");
        assert!(out.contains("Failed to load tasks: network error: refused."));
        assert!(out.contains("Check if your backend is running at: http://api"));
    }

    #[test]
    fn header_reflects_session_and_form() {
        let view = View {
            auth: AuthView::SignedIn {
                email: "ada@example.com".to_string(),
            },
            form: FormState::Error("Credentials error".to_string()),
            feed: Feed::NotLoaded,
            pending_delete: None,
        };
        assert_eq!(
            render(&view, "http://x"),
            "Signed in as ada@example.com\n! Credentials error\n"
        );

        let out = render(&View::default(), "http://x");
        assert!(out.starts_with("Not signed in."));
    }
}
