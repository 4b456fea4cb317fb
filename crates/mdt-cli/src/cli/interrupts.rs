//! Ctrl-C presses, queued by one listener that lives as long as the shell.
//!
//! Installing the tokio handler replaces the default SIGINT action for the
//! whole process, so presses are collected even while no command is waiting
//! for them. A press that arrives during a command that does not listen is
//! seen by the next prompt.

use tokio::sync::mpsc;

pub struct Interrupts(mpsc::UnboundedReceiver<()>);

impl Interrupts {
    /// Start the listener task. Must be called inside the runtime.
    pub fn listen() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("cannot listen for Ctrl-C: {}", e);
                    return;
                }
                tracing::debug!("Ctrl-C");
                if tx.send(()).is_err() {
                    return;
                }
            }
        });
        Self(rx)
    }

    #[cfg(test)]
    pub fn from_receiver(rx: mpsc::UnboundedReceiver<()>) -> Self {
        Self(rx)
    }

    /// Resolves on the next press, including one already queued. Never
    /// resolves once the listener is gone.
    pub async fn next(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}
