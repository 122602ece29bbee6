//! Host-facing event channels.
//!
//! The session reports three kinds of events:
//!
//! | Channel | Fired when |
//! |---------|------------|
//! | recognition result | an utterance ended with a non-empty hypothesis |
//! | crash | an operation failed and did not complete |
//! | log | an informational transition (listening started, search switched) |
//!
//! Hosts implement [`SessionListener`] (all methods default to no-ops) and
//! register any number of listeners on the controller.  A
//! `std::sync::mpsc::Sender<SessionEvent>` is a listener too, for hosts that
//! prefer to consume events from a channel.

use std::sync::mpsc;

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// One event emitted by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RecognitionResult(String),
    Crash(String),
    Log(String),
}

impl SessionEvent {
    /// Deliver this event to the matching method of `listener`.
    pub fn deliver_to(&self, listener: &mut dyn SessionListener) {
        match self {
            SessionEvent::RecognitionResult(text) => listener.on_recognition_result(text),
            SessionEvent::Crash(message) => listener.on_crash(message),
            SessionEvent::Log(message) => listener.on_log(message),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionListener
// ---------------------------------------------------------------------------

/// Receives session events.  Implement only the channels you need.
pub trait SessionListener {
    fn on_recognition_result(&mut self, _text: &str) {}

    fn on_crash(&mut self, _message: &str) {}

    fn on_log(&mut self, _message: &str) {}
}

impl SessionListener for mpsc::Sender<SessionEvent> {
    fn on_recognition_result(&mut self, text: &str) {
        // Ignore send errors; the receiver may have been dropped.
        let _ = self.send(SessionEvent::RecognitionResult(text.to_string()));
    }

    fn on_crash(&mut self, message: &str) {
        let _ = self.send(SessionEvent::Crash(message.to_string()));
    }

    fn on_log(&mut self, message: &str) {
        let _ = self.send(SessionEvent::Log(message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

/// Fans events out to every registered listener and mirrors them to the
/// `log` facade.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<Box<dyn SessionListener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Box<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn recognition_result(&mut self, text: &str) {
        log::info!("recognized: {text}");
        self.dispatch(&SessionEvent::RecognitionResult(text.to_string()));
    }

    pub fn crash(&mut self, message: &str) {
        log::error!("{message}");
        self.dispatch(&SessionEvent::Crash(message.to_string()));
    }

    pub fn log(&mut self, message: &str) {
        log::info!("{message}");
        self.dispatch(&SessionEvent::Log(message.to_string()));
    }

    fn dispatch(&mut self, event: &SessionEvent) {
        for listener in &mut self.listeners {
            event.deliver_to(listener.as_mut());
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
