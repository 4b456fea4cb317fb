//! Command routing for the interactive shell.
//!
//! Handlers are registered by canonical name (`exit_force`) in an explicit
//! map built at startup. A tokenized input line resolves to the most specific
//! registered name; the remaining tokens are the handler's arguments. Handler
//! failures, including panics, stop at the router boundary.

mod resolve;

pub use resolve::{candidate_names, longest_match, SEPARATOR};

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;
use thiserror::Error;

/// What the input loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A shell command operating on context `C`.
#[async_trait]
pub trait Handler<C: Send>: Send + Sync {
    /// One-line description shown by `help`.
    fn description(&self) -> &str;

    /// Run with the tokens left after the command name. Handlers check their
    /// own arity and fail with a descriptive error.
    async fn run(&self, ctx: &mut C, args: &[String]) -> anyhow::Result<Flow>;
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command not found: {command}")]
    NotFound { command: String },
    #[error("command '{command}' failed")]
    Failed {
        command: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("command '{command}' panicked: {message}")]
    Panicked { command: String, message: String },
}

/// A resolved command: its canonical name and its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'r, 't> {
    pub name: &'r str,
    pub args: &'t [String],
}

pub struct CommandRouter<C: Send> {
    handlers: BTreeMap<String, Box<dyn Handler<C>>>,
}

impl<C: Send> CommandRouter<C> {
    pub fn builder() -> RouterBuilder<C> {
        RouterBuilder {
            handlers: BTreeMap::new(),
        }
    }

    /// Canonical names of all registered commands, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// `(display name, description)` for every command, sorted by name.
    /// Multi-word names are shown with spaces, as they are typed.
    pub fn describe(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|(name, h)| (name.replace(SEPARATOR, " "), h.description().to_string()))
            .collect()
    }

    /// Longest-match-first lookup of `tokens`.
    pub fn resolve<'r, 't>(&'r self, tokens: &'t [String]) -> Option<Resolved<'r, 't>> {
        let (name, consumed) = longest_match(tokens, |n| self.handlers.contains_key(n))?;
        let (name, _) = self.handlers.get_key_value(&name)?;
        Some(Resolved {
            name,
            args: &tokens[consumed..],
        })
    }

    /// Resolve and run one command line. An empty line does nothing.
    ///
    /// Every failure is returned as a [`DispatchError`] after being logged;
    /// none of them should end the session.
    pub async fn dispatch(&self, ctx: &mut C, tokens: &[String]) -> Result<Flow, DispatchError> {
        let Some(first) = tokens.first() else {
            return Ok(Flow::Continue);
        };
        let Some(Resolved { name, args }) = self.resolve(tokens) else {
            tracing::debug!(command = %first, "command not found");
            return Err(DispatchError::NotFound {
                command: first.clone(),
            });
        };
        let Some(handler) = self.handlers.get(name) else {
            return Err(DispatchError::NotFound {
                command: first.clone(),
            });
        };

        tracing::debug!(command = name, ?args, "running command");
        match AssertUnwindSafe(handler.run(ctx, args)).catch_unwind().await {
            Ok(Ok(flow)) => Ok(flow),
            Ok(Err(source)) => {
                tracing::error!(command = name, ?args, "command failed: {:#}", source);
                Err(DispatchError::Failed {
                    command: name.to_string(),
                    source,
                })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(command = name, ?args, "command panicked: {}", message);
                Err(DispatchError::Panicked {
                    command: name.to_string(),
                    message,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Startup registration table for a [`CommandRouter`].
pub struct RouterBuilder<C: Send> {
    handlers: BTreeMap<String, Box<dyn Handler<C>>>,
}

impl<C: Send> RouterBuilder<C> {
    /// Register `handler` under `name`. Words may be separated by spaces or
    /// by [`SEPARATOR`]; a later registration of the same name replaces the
    /// earlier one.
    pub fn command(mut self, name: &str, handler: impl Handler<C> + 'static) -> Self {
        let canonical = name.split_whitespace().collect::<Vec<_>>().join(SEPARATOR);
        if self.handlers.insert(canonical.clone(), Box::new(handler)).is_some() {
            tracing::warn!(command = %canonical, "handler registered twice; keeping the last one");
        }
        self
    }

    pub fn build(self) -> CommandRouter<C> {
        CommandRouter {
            handlers: self.handlers,
        }
    }
}
