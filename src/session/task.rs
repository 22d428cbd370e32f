//! Session task
//!
//! Runs a [`BoardSession`] on its own tokio task. The task waits on three
//! things: the cancellation token, the command channel, and the poll timer.
//! Everything the session does happens on that task, so two fetches of one
//! session never overlap.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use crate::error::Result;
use crate::record::GameIdentity;
use crate::session::{BoardSession, SessionStatus};

/// Requests a [`SessionHandle`] sends to its task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Forced fetch
    Reload,
    /// Follow another game (or rename the current one)
    Assign(GameIdentity),
    /// Viewer picked a ply
    SelectPly(usize),
    /// Stop for good
    Disable,
}

/// Caller side of a running session
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    cancel: CancellationToken,
    status: watch::Receiver<SessionStatus>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Spawn `session` on the current runtime
    pub fn spawn(session: BoardSession) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(session.status());
        let cancel = session.cancellation_token();
        let task = tokio::spawn(
            run(session, receiver, status_tx).instrument(info_span!("board_session")),
        );

        Self {
            commands,
            cancel,
            status,
            task,
        }
    }

    pub fn reload(&self) {
        self.send(SessionCommand::Reload);
    }

    pub fn assign(&self, identity: GameIdentity) {
        self.send(SessionCommand::Assign(identity));
    }

    pub fn select_ply(&self, ply: usize) {
        self.send(SessionCommand::SelectPly(ply));
    }

    /// Stop for good, discarding the result of any fetch already in flight
    pub fn disable(&self) {
        self.send(SessionCommand::Disable);
        self.cancel.cancel();
    }

    /// Stop the task at its next wake point without waiting for queued commands
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Latest published status
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified after every command and poll
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to end
    ///
    /// # Errors
    ///
    /// Returns an error if the task panicked
    pub async fn join(self) -> Result<()> {
        self.task.await?;
        Ok(())
    }

    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            debug!("Session task already finished, command dropped");
        }
    }
}

async fn run(
    mut session: BoardSession,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    status: watch::Sender<SessionStatus>,
) {
    let cancel = session.cancellation_token();

    loop {
        let wait = session.next_poll_in();

        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            command = commands.recv() => match command {
                Some(SessionCommand::Reload) => {
                    session.reload().await;
                }
                Some(SessionCommand::Assign(identity)) => {
                    session.assign(identity).await;
                }
                Some(SessionCommand::SelectPly(ply)) => {
                    session.select_ply(ply);
                }
                Some(SessionCommand::Disable) | None => break,
            },

            _ = sleep_or_pending(wait) => {
                session.poll().await;
            }
        }

        status.send_replace(session.status());
    }

    session.disable();
    status.send_replace(session.status());
    debug!("Session task finished");
}

async fn sleep_or_pending(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}
