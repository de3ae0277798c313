//! Subcommands and their execution against a `TodoApp`.

use std::io::Write;

use anyhow::{bail, Context};
use clap::Subcommand;
use todo_core::{CredentialStore, Feed, TodoApp, Transport};

use crate::view;

#[derive(Subcommand)]
pub enum Command {
    /// Create an account.
    Register {
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and store the access token.
    Login {
        email: String,
        #[arg(long, env = "TODO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored access token.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// List tasks.
    List,
    /// Add a task.
    Add {
        title: String,
        #[arg(long, short, default_value = "")]
        description: String,
    },
    /// Show one task.
    Show { id: i64 },
    /// Change the title or description of a task.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Delete a task.
    Delete {
        id: i64,
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },
    /// Show the backend's welcome document.
    Info,
}

/// Run one command, writing what the user sees to `out`.
///
/// Confirmation prompts are the caller's job; `Delete` here always deletes.
pub fn dispatch<T: Transport, S: CredentialStore>(
    app: &mut TodoApp<T, S>,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Register { email, password } => {
            app.register(&email, &password)
                .context("Registration failed")?;
            show(app, out)?;
        }
        Command::Login { email, password } => {
            app.login(&email, &password).context("Sign-in failed")?;
            show(app, out)?;
        }
        Command::Logout => {
            app.logout()?;
            writeln!(out, "Signed out.")?;
        }
        Command::Whoami => {
            app.restore()?;
            match app.session().user() {
                Some(user) => writeln!(out, "{}", user.email)?,
                None => writeln!(out, "Not signed in.")?,
            }
        }
        Command::List => {
            require_session(app, out)?;
            if app.view().feed == Feed::NotLoaded {
                let _ = app.refresh();
            }
            show(app, out)?;
            if matches!(app.view().feed, Feed::Failed(_)) {
                bail!("could not load tasks");
            }
        }
        Command::Add { title, description } => {
            require_session(app, out)?;
            let todo = app
                .create(&title, &description)
                .context("Failed to create task")?;
            writeln!(out, "Created task {}.", todo.id)?;
            show(app, out)?;
        }
        Command::Show { id } => {
            require_session(app, out)?;
            let todo = app.get(id).with_context(|| format!("Failed to load task {id}"))?;
            write!(out, "{}", view::render_todo(&todo, false))?;
        }
        Command::Edit {
            id,
            title,
            description,
        } => {
            if title.is_none() && description.is_none() {
                bail!("nothing to change: pass --title and/or --description");
            }
            require_session(app, out)?;
            app.update(id, title.as_deref(), description.as_deref())
                .with_context(|| format!("Failed to update task {id}"))?;
            show(app, out)?;
        }
        Command::Delete { id, .. } => {
            require_session(app, out)?;
            app.delete(id)
                .with_context(|| format!("Failed to delete task {id}"))?;
            show(app, out)?;
        }
        Command::Info => {
            let info = app.info().context("Failed to reach backend")?;
            writeln!(out, "Backend URL: {}", app.client().base_url())?;
            writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
        }
    }
    Ok(())
}

/// Restore the stored session; without one, render the sign-in prompt and
/// stop before any todo request goes out.
fn require_session<T: Transport, S: CredentialStore>(
    app: &mut TodoApp<T, S>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    app.restore()?;
    if !app.session().is_authenticated() {
        show(app, out)?;
        bail!("not signed in");
    }
    Ok(())
}

fn show<T: Transport, S: CredentialStore>(
    app: &TodoApp<T, S>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    write!(out, "{}", view::render(app.view(), app.client().base_url()))?;
    Ok(())
}
