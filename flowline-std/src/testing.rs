//! Testing utilities for flowline.
//!
//! This module provides doubles for every collaborator the engine talks to,
//! all writing into one shared [`Journal`] so tests can assert on the exact
//! interleaving of handler invocations, completions, deliveries and sends.
//!
//! # Features
//!
//! - [`ScriptedHandler`]: A handler that replays a script of responses/failures
//! - [`RecordingReceiver`]: A message receiver that records deliveries
//! - [`RecordingSender`]: A transport sender that records (or fails) sends
//! - [`RecordingCallback`]: A callback that records errors and can be awaited

use async_trait::async_trait;
use flowline_core::{
    BoxError, Callback, Handler, InvocationResponse, MessageContext, MessageReceiver,
    TransportSender,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::Notify;

// ============================================================================
// Journal
// ============================================================================

/// One observable event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// A handler's `invoke` was called.
    Invoked(String),
    /// A handler's `flow_complete` was called.
    Completed(String),
    /// A receiver got the message with this id.
    Received(String),
    /// A sender got the message with this id.
    Sent(String),
}

/// A shared, ordered log of [`JournalEntry`] values.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&self, entry: JournalEntry) {
        self.lock().push(entry);
    }

    /// A copy of every entry in order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().clone()
    }

    /// Names of invoked handlers in order.
    pub fn invoked(&self) -> Vec<String> {
        self.collect(|e| match e {
            JournalEntry::Invoked(name) => Some(name.clone()),
            _ => None,
        })
    }

    /// Names of completed handlers in order.
    pub fn completed(&self) -> Vec<String> {
        self.collect(|e| match e {
            JournalEntry::Completed(name) => Some(name.clone()),
            _ => None,
        })
    }

    /// Ids of received messages in order.
    pub fn received(&self) -> Vec<String> {
        self.collect(|e| match e {
            JournalEntry::Received(id) => Some(id.clone()),
            _ => None,
        })
    }

    /// Ids of sent messages in order.
    pub fn sent(&self) -> Vec<String> {
        self.collect(|e| match e {
            JournalEntry::Sent(id) => Some(id.clone()),
            _ => None,
        })
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn collect(&self, f: impl Fn(&JournalEntry) -> Option<String>) -> Vec<String> {
        self.lock().iter().filter_map(f).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JournalEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// ScriptedHandler
// ============================================================================

/// One scripted reaction of a [`ScriptedHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Return this response.
    Respond(InvocationResponse),
    /// Fail with this message.
    Fail(String),
}

/// A handler that plays back a script, then repeats a fallback step.
///
/// Every `invoke` and `flow_complete` is written to the journal.
pub struct ScriptedHandler {
    name: String,
    journal: Journal,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
}

impl ScriptedHandler {
    /// A handler that always continues.
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            script: Mutex::new(VecDeque::new()),
            fallback: Step::Respond(InvocationResponse::Continue),
        }
    }

    /// A handler that suspends on its first invocation and continues after.
    pub fn suspend_once(name: impl Into<String>, journal: &Journal) -> Self {
        Self::new(name, journal).then(Step::Respond(InvocationResponse::Suspend))
    }

    /// A handler that always returns `response`.
    pub fn responding(
        name: impl Into<String>,
        journal: &Journal,
        response: InvocationResponse,
    ) -> Self {
        Self::new(name, journal).otherwise(Step::Respond(response))
    }

    /// A handler that always fails with `message`.
    pub fn failing(name: impl Into<String>, journal: &Journal, message: impl Into<String>) -> Self {
        Self::new(name, journal).otherwise(Step::Fail(message.into()))
    }

    /// Queue a step to play before the fallback.
    pub fn then(self, step: Step) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }

    /// Replace the fallback step.
    pub fn otherwise(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Handler for ScriptedHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _ctx: &mut MessageContext) -> Result<InvocationResponse, BoxError> {
        self.journal.push(JournalEntry::Invoked(self.name.clone()));
        match self.next_step() {
            Step::Respond(response) => Ok(response),
            Step::Fail(message) => Err(message.into()),
        }
    }

    fn flow_complete(&self, _ctx: &mut MessageContext) {
        self.journal.push(JournalEntry::Completed(self.name.clone()));
    }
}

// ============================================================================
// RecordingReceiver
// ============================================================================

/// A message receiver that records every delivery.
pub struct RecordingReceiver {
    journal: Journal,
    failure: Option<String>,
}

impl RecordingReceiver {
    /// A receiver that accepts every message.
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failure: None,
        }
    }

    /// A receiver that records, then rejects every message.
    pub fn failing(journal: &Journal, message: impl Into<String>) -> Self {
        Self {
            journal: journal.clone(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl MessageReceiver for RecordingReceiver {
    async fn receive(&self, ctx: &mut MessageContext) -> Result<(), BoxError> {
        self.journal
            .push(JournalEntry::Received(ctx.message_id().to_string()));
        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// RecordingSender
// ============================================================================

/// A transport sender that records every send attempt.
pub struct RecordingSender {
    journal: Journal,
    failure: Option<String>,
}

impl RecordingSender {
    /// A sender that succeeds.
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            failure: None,
        }
    }

    /// A sender that records, then fails every send.
    pub fn failing(journal: &Journal, message: impl Into<String>) -> Self {
        Self {
            journal: journal.clone(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl TransportSender for RecordingSender {
    async fn invoke(&self, ctx: &mut MessageContext) -> Result<(), BoxError> {
        self.journal.push(JournalEntry::Sent(ctx.message_id().to_string()));
        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// RecordingCallback
// ============================================================================

/// A callback that records what it was told and wakes waiters.
#[derive(Default)]
pub struct RecordingCallback {
    errors: Mutex<Vec<String>>,
    completions: Mutex<Vec<String>>,
    notify: Notify,
}

impl RecordingCallback {
    /// Create a callback with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of the errors reported so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Ids of the responses delivered so far.
    pub fn completions(&self) -> Vec<String> {
        self.completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until the callback has been notified at least once more.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

impl Callback for RecordingCallback {
    fn on_complete(&self, ctx: &MessageContext) {
        self.completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ctx.message_id().to_string());
        self.notify.notify_one();
    }

    fn on_error(&self, error: BoxError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
        self.notify.notify_one();
    }
}
