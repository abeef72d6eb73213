//! Dialogue orchestrator.
//!
//! Owns at most one [`ChatSession`] and the surface it is shown on.
//!
//! # State Machine
//!
//! ```text
//!            open(fragments, mode)
//! Closed ─────────────────────────────▶ Open(mode)
//!   ▲                                   │    ▲
//!   │ close()            minimize()     │    │ restore()
//!   │                    (panel only)   ▼    │
//!   └──────────────────────────────── Minimized
//! ```
//!
//! Closing discards the transcript and context; minimizing keeps both.
//!
//! # Sending
//!
//! A send is split in three so the network round-trip never holds the
//! orchestrator:
//!
//! 1. [`DialogueOrchestrator::begin_send`] appends the user message right
//!    away and snapshots the request.
//! 2. [`PendingSend::resolve`] (or [`PendingSend::resolve_async`]) calls the
//!    endpoint. It never fails: any problem becomes the fallback reply.
//! 3. [`DialogueOrchestrator::complete_send`] appends the reply, but only if
//!    the session that started the send is still the current one.
//!
//! User messages are appended in send order. Replies are appended in the
//! order their sends complete.

use super::context::ReconcileReport;
use super::dragdrop::{DroppedFragment, decode_drag_payload};
use super::panel::{PanelController, PointerEvent};
use super::prompt::PromptBuilder;
use crate::config::{DEFAULT_FALLBACK_REPLY, EndpointConfig, FragmindConfig, PanelConfig};
use crate::llm::{DialogueEndpoint, DialogueRequest};
use crate::models::{
    ChatSession, Fragment, Message, PanelGeometry, Point, SessionId, Size,
};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Dialogue surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DialogueMode {
    /// Centered modal dialog; cannot be minimized.
    #[default]
    Modal,
    /// Floating, draggable, resizable panel.
    Panel,
}

impl DialogueMode {
    /// Returns the mode as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Modal => "modal",
            Self::Panel => "panel",
        }
    }
}

impl fmt::Display for DialogueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observable orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    /// No session.
    Closed,
    /// Session visible on the given surface.
    Open(DialogueMode),
    /// Panel session collapsed to its title bar.
    Minimized,
}

/// Send behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueSettings {
    /// Prepend the context preamble to the outgoing content.
    pub include_preamble: bool,
    /// Assistant text used when a turn fails.
    pub fallback_reply: String,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            include_preamble: false,
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }
}

impl DialogueSettings {
    /// Loads settings from the `[endpoint]` config section.
    #[must_use]
    pub fn from_config(config: &EndpointConfig) -> Self {
        Self {
            include_preamble: config.include_preamble,
            fallback_reply: config.fallback_reply.clone(),
        }
    }
}

/// How a send was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The endpoint produced a reply.
    Success,
    /// The fallback reply was substituted.
    Fallback,
}

impl SendStatus {
    /// Returns the status as a metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fallback => "fallback",
        }
    }
}

/// A send whose user message is already in the transcript.
#[derive(Debug, Clone)]
pub struct PendingSend {
    session_id: SessionId,
    request: DialogueRequest,
    attached: Vec<Fragment>,
    fallback_reply: String,
}

/// Result of resolving a [`PendingSend`].
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Session the send belongs to.
    pub session_id: SessionId,
    /// Assistant text to append.
    pub reply: String,
    /// Whether the reply came from the endpoint.
    pub status: SendStatus,
    /// Context snapshot taken when the send began.
    pub attached: Vec<Fragment>,
}

impl PendingSend {
    /// Session the send belongs to.
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Request that will be sent.
    #[must_use]
    pub const fn request(&self) -> &DialogueRequest {
        &self.request
    }

    /// Calls the endpoint, substituting the fallback reply on any failure.
    #[must_use]
    #[instrument(skip(self, endpoint), fields(operation = "dialogue.resolve", endpoint = endpoint.name(), session_id = %self.session_id))]
    pub fn resolve(self, endpoint: &dyn DialogueEndpoint) -> SendOutcome {
        let reply = match endpoint.send(&self.request) {
            Ok(response) => {
                if let Some(reply) = response.reply() {
                    Some(reply.to_string())
                } else {
                    tracing::warn!(
                        success = response.success,
                        error = response.error.as_deref().unwrap_or("no usable choice"),
                        "Dialogue endpoint returned no reply; using fallback"
                    );
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Dialogue endpoint failed; using fallback");
                None
            },
        };
        self.into_outcome(reply)
    }

    /// Calls the endpoint on tokio's blocking pool.
    pub async fn resolve_async(self, endpoint: Arc<dyn DialogueEndpoint>) -> SendOutcome {
        let fallback = self.clone();
        match tokio::task::spawn_blocking(move || self.resolve(endpoint.as_ref())).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Dialogue send task failed; using fallback");
                fallback.into_outcome(None)
            },
        }
    }

    fn into_outcome(self, reply: Option<String>) -> SendOutcome {
        let (reply, status) = match reply {
            Some(reply) => (reply, SendStatus::Success),
            None => (self.fallback_reply, SendStatus::Fallback),
        };
        SendOutcome {
            session_id: self.session_id,
            reply,
            status,
            attached: self.attached,
        }
    }
}

/// Owns the active chat session, its surface, and the panel geometry.
#[derive(Debug, Clone)]
pub struct DialogueOrchestrator {
    session: Option<ChatSession>,
    mode: DialogueMode,
    minimized: bool,
    panel: PanelController,
    panel_defaults: PanelGeometry,
    settings: DialogueSettings,
}

impl Default for DialogueOrchestrator {
    fn default() -> Self {
        Self::new(
            DialogueSettings::default(),
            PanelController::from_config(&PanelConfig::default()),
        )
    }
}

impl DialogueOrchestrator {
    /// Creates a closed orchestrator.
    #[must_use]
    pub fn new(settings: DialogueSettings, panel: PanelController) -> Self {
        let panel_defaults = *panel.geometry();
        Self {
            session: None,
            mode: DialogueMode::default(),
            minimized: false,
            panel,
            panel_defaults,
            settings,
        }
    }

    /// Creates a closed orchestrator from configuration.
    #[must_use]
    pub fn from_config(config: &FragmindConfig) -> Self {
        Self::new(
            DialogueSettings::from_config(&config.endpoint),
            PanelController::from_config(&config.panel),
        )
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DialogueState {
        match (&self.session, self.minimized) {
            (None, _) => DialogueState::Closed,
            (Some(_), true) => DialogueState::Minimized,
            (Some(_), false) => DialogueState::Open(self.mode),
        }
    }

    /// Active session.
    #[must_use]
    pub const fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Surface of the current or most recent session.
    #[must_use]
    pub const fn mode(&self) -> DialogueMode {
        self.mode
    }

    /// Send settings.
    #[must_use]
    pub const fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    /// Panel controller.
    #[must_use]
    pub const fn panel(&self) -> &PanelController {
        &self.panel
    }

    /// Committed panel geometry.
    #[must_use]
    pub const fn panel_geometry(&self) -> &PanelGeometry {
        self.panel.geometry()
    }

    /// Fragments shown in the panel, derived from the session context.
    ///
    /// Empty unless a panel session is open.
    #[must_use]
    pub fn panel_fragments(&self) -> Vec<Fragment> {
        match (&self.session, self.mode) {
            (Some(session), DialogueMode::Panel) => session.context.fragments(),
            _ => Vec::new(),
        }
    }

    /// Opens a new session seeded with `fragments`, discarding any current one.
    pub fn open(&mut self, fragments: &[Fragment], mode: DialogueMode) -> &ChatSession {
        self.start(ChatSession::title_for(fragments), fragments, mode, None)
    }

    /// Opens a panel session placed at `position`.
    pub fn open_panel_at(&mut self, fragments: &[Fragment], position: Point) -> &ChatSession {
        self.start(
            ChatSession::title_for(fragments),
            fragments,
            DialogueMode::Panel,
            Some(position),
        )
    }

    fn start(
        &mut self,
        title: String,
        fragments: &[Fragment],
        mode: DialogueMode,
        position: Option<Point>,
    ) -> &mut ChatSession {
        if let Some(previous) = self.session.take() {
            tracing::debug!(session_id = %previous.id, "Discarding session on reopen");
        }
        let mut session = ChatSession::new(title);
        session.context.reconcile(fragments);
        tracing::info!(
            session_id = %session.id,
            mode = %mode,
            context = session.context.len(),
            "Opened dialogue session"
        );

        self.mode = mode;
        self.minimized = false;
        self.panel.reset(self.panel_defaults);
        if let Some(position) = position {
            self.panel.set_position(position);
        }
        self.session.insert(session)
    }

    /// Closes the surface and discards the session.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(
                session_id = %session.id,
                messages = session.transcript.len(),
                "Closed dialogue session"
            );
        }
        self.minimized = false;
        self.panel.reset(self.panel_defaults);
    }

    /// Collapses a panel session. Returns false if nothing changed.
    pub fn minimize(&mut self) -> bool {
        self.set_minimized(true)
    }

    /// Expands a minimized panel session. Returns false if nothing changed.
    pub fn restore(&mut self) -> bool {
        self.set_minimized(false)
    }

    fn set_minimized(&mut self, minimized: bool) -> bool {
        if self.session.is_none() || self.mode != DialogueMode::Panel || self.minimized == minimized
        {
            return false;
        }
        self.minimized = minimized;
        self.panel.set_minimized(minimized);
        true
    }

    /// Adds a fragment to the context, opening a panel session if none is open.
    ///
    /// Returns false if the fragment was already in context.
    pub fn add_fragment_to_context(&mut self, fragment: Fragment) -> bool {
        let session = self.ensure_session(&fragment);
        let position = session.context.next_position();
        let added = session.context.add(fragment, position);
        if added {
            session.touch();
        }
        added
    }

    /// Adds a fragment under a caller-resolved identity at `position`.
    pub fn add_resolved_to_context(
        &mut self,
        identity: String,
        fragment: Fragment,
        position: Point,
    ) -> bool {
        let session = self.ensure_session(&fragment);
        let added = session.context.add_resolved(identity, fragment, position);
        if added {
            session.touch();
        }
        added
    }

    /// Removes a fragment from the context (and so from the panel list).
    pub fn remove_fragment_from_context(&mut self, identity: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let removed = session.context.remove(identity);
        if removed {
            session.touch();
        }
        removed
    }

    /// Reconciles the context with an externally owned panel fragment list.
    ///
    /// Opens a panel session when none is open and the list is non-empty.
    pub fn sync_panel_fragments(&mut self, external: &[Fragment]) -> ReconcileReport {
        match self.session.as_mut() {
            Some(session) => {
                let report = session.context.reconcile(external);
                if !report.is_unchanged() {
                    session.touch();
                }
                report
            },
            None if external.is_empty() => ReconcileReport::default(),
            None => {
                let session = self.open(external, DialogueMode::Panel);
                ReconcileReport {
                    added: session.context.len(),
                    removed: 0,
                }
            },
        }
    }

    /// Handles a raw drop payload at a position relative to the drop zone.
    ///
    /// Malformed payloads are ignored without touching any state.
    pub fn drop_payload(&mut self, raw: &str, position: Point) -> bool {
        let Some(payload) = decode_drag_payload(raw) else {
            metrics::counter!("fragmind_context_drops_total", "status" => "ignored").increment(1);
            return false;
        };
        self.accept_drop(DroppedFragment { payload, position })
    }

    /// Adds a decoded drop to the context.
    pub fn accept_drop(&mut self, dropped: DroppedFragment) -> bool {
        let DroppedFragment { payload, position } = dropped;
        let added = match payload.node_id {
            Some(identity) => self.add_resolved_to_context(identity, payload.fragment, position),
            None => {
                let session = self.ensure_session(&payload.fragment);
                let added = session.context.add(payload.fragment, position);
                if added {
                    session.touch();
                }
                added
            },
        };
        let status = if added { "accepted" } else { "ignored" };
        metrics::counter!("fragmind_context_drops_total", "status" => status).increment(1);
        added
    }

    fn ensure_session(&mut self, seed: &Fragment) -> &mut ChatSession {
        match self.session {
            Some(ref mut session) => session,
            None => {
                let title = ChatSession::title_for(std::slice::from_ref(seed));
                self.start(title, &[], DialogueMode::Panel, None)
            },
        }
    }

    /// Feeds a pointer event to the panel. `None` unless a panel session is open.
    pub fn panel_event(&mut self, event: PointerEvent) -> Option<PanelGeometry> {
        if self.session.is_none() || self.mode != DialogueMode::Panel {
            return None;
        }
        Some(self.panel.handle(event))
    }

    /// Updates the viewport and re-clamps the panel.
    pub fn set_viewport(&mut self, viewport: Size) -> PanelGeometry {
        self.panel.set_viewport(viewport)
    }

    /// Appends the user message and prepares the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveSession`] when closed or minimized and
    /// [`Error::InvalidInput`] for blank text.
    #[instrument(skip(self, text), fields(operation = "dialogue.begin_send"))]
    pub fn begin_send(&mut self, text: &str) -> Result<PendingSend> {
        if self.minimized {
            return Err(Error::NoActiveSession);
        }
        let session = self.session.as_mut().ok_or(Error::NoActiveSession)?;
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("message is empty".to_string()));
        }

        let attached = session.context.fragments();
        let prompt = PromptBuilder::build_context(session.context.entries());
        let content =
            PromptBuilder::compose_content(text, &prompt, self.settings.include_preamble);
        let request = DialogueRequest::new(session.id.as_str(), content, prompt.tags)
            .with_context_size(attached.len());

        session.push(Message::user(text).with_fragments(attached.clone()));
        tracing::debug!(
            session_id = %session.id,
            context = attached.len(),
            tags = request.variables.tags.len(),
            "Dispatching dialogue message"
        );

        Ok(PendingSend {
            session_id: session.id.clone(),
            request,
            attached,
            fallback_reply: self.settings.fallback_reply.clone(),
        })
    }

    /// Appends a resolved reply to its session.
    ///
    /// Returns false, changing nothing, if that session is no longer current.
    pub fn complete_send(&mut self, outcome: SendOutcome) -> bool {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.id == outcome.session_id)
        else {
            tracing::debug!(session_id = %outcome.session_id, "Discarding reply for closed session");
            metrics::counter!("fragmind_dialogue_sends_total", "status" => "discarded")
                .increment(1);
            return false;
        };

        session.push(Message::assistant(outcome.reply).with_fragments(outcome.attached));
        metrics::counter!("fragmind_dialogue_sends_total", "status" => outcome.status.as_str())
            .increment(1);
        true
    }

    /// Sends a message and waits for the reply.
    ///
    /// # Errors
    ///
    /// Same as [`Self::begin_send`]; endpoint failures produce the fallback
    /// reply instead of an error.
    pub fn send_message(&mut self, endpoint: &dyn DialogueEndpoint, text: &str) -> Result<Message> {
        let pending = self.begin_send(text)?;
        let outcome = pending.resolve(endpoint);
        self.complete_send(outcome);
        self.last_message()
    }

    /// Sends a message, resolving it on tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`Self::begin_send`].
    pub async fn send_message_async(
        &mut self,
        endpoint: Arc<dyn DialogueEndpoint>,
        text: &str,
    ) -> Result<Message> {
        let pending = self.begin_send(text)?;
        let outcome = pending.resolve_async(endpoint).await;
        self.complete_send(outcome);
        self.last_message()
    }

    fn last_message(&self) -> Result<Message> {
        self.session
            .as_ref()
            .and_then(|session| session.transcript.last())
            .cloned()
            .ok_or(Error::NoActiveSession)
    }
}
