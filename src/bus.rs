//! UI message bus.
//!
//! Architecture:
//! - `attach()` spawns one dedicated UI thread that exclusively owns the
//!   [`Transcript`], the [`MessageRenderer`] (and its style profile) and the
//!   [`DisplaySurface`]. Nothing else ever touches them, so no lock guards the
//!   transcript.
//! - `post()` can be called from any thread. It only enqueues onto an
//!   unbounded FIFO channel; the UI thread drains it in admission order and
//!   performs every append.
//! - With no display attached, `post()` drops the message.

use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::error::BusError;
use crate::message::{Message, Role};
use crate::render::{MessageRenderer, StyleProfile, Transcript};
use crate::surface::DisplaySurface;

/// Name of the thread that owns the display.
pub const UI_THREAD_NAME: &str = "smartta-ui";

enum UiEvent {
    Append(Message),
    Flush(oneshot::Sender<()>),
}

/// Handle for posting messages to the attached display. Cheap to clone.
#[derive(Clone, Default)]
pub struct UiBus {
    sender: Arc<RwLock<Option<mpsc::UnboundedSender<UiEvent>>>>,
}

/// The running UI thread of an attached display.
pub struct AttachedDisplay {
    handle: JoinHandle<Transcript>,
}

impl AttachedDisplay {
    /// Wait for the UI thread to finish and take its transcript. The thread
    /// exits once the bus has been detached and the queue is drained.
    pub fn join(self) -> Result<Transcript, BusError> {
        self.handle.join().map_err(|_| BusError::UiThreadPanicked)
    }
}

impl UiBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a display surface and start the UI thread. One display per bus
    /// at a time.
    pub fn attach<S>(&self, surface: S, profile: StyleProfile) -> Result<AttachedDisplay, BusError>
    where
        S: DisplaySurface + 'static,
    {
        let mut slot = self.sender.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(BusError::AlreadyAttached);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let renderer = MessageRenderer::new(profile);
        let handle = std::thread::Builder::new()
            .name(UI_THREAD_NAME.to_string())
            .spawn(move || run_ui_loop(rx, renderer, surface))?;

        *slot = Some(tx);
        info!("Display attached");
        Ok(AttachedDisplay { handle })
    }

    /// Stop accepting messages. Already-queued messages are still rendered.
    /// Returns false when nothing was attached.
    pub fn detach(&self) -> bool {
        let taken = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if taken.is_some() {
            info!("Display detached");
        }
        taken.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Queue a message for the UI thread. Never renders on the caller's
    /// thread. A no-op when no display is attached.
    pub fn post(&self, message: Message) {
        if !self.send(UiEvent::Append(message)) {
            trace!("No display attached; message dropped");
        }
    }

    pub fn post_message(&self, role: Role, text: impl Into<String>) {
        self.post(Message::new(role, text));
    }

    /// Wait until everything posted before this call has been rendered.
    /// Returns false when no display is attached.
    pub async fn flush(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if !self.send(UiEvent::Flush(tx)) {
            return false;
        }
        rx.await.is_ok()
    }

    fn send(&self, event: UiEvent) -> bool {
        let slot = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

fn run_ui_loop<S: DisplaySurface>(
    mut rx: mpsc::UnboundedReceiver<UiEvent>,
    renderer: MessageRenderer,
    mut surface: S,
) -> Transcript {
    let mut transcript = Transcript::new();

    while let Some(event) = rx.blocking_recv() {
        match event {
            UiEvent::Append(message) => {
                let range = renderer.render(&mut transcript, &message.compose());
                surface.on_append(&transcript.spans()[range], transcript.cursor());
            }
            UiEvent::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!(entries = transcript.entry_count(), "UI loop finished");
    transcript
}
