//! Application state and AI request polling.
//!
//! [`Garden`] wraps the core session. [`AppState`] holds everything the UI
//! needs between frames: the open overlay, form contents, status line and
//! the AI requests started from the form.

use bevy::prelude::*;
use chrono::{Local, NaiveDate};
use garden_core::{
    AiGateway, Emotion, GardenConfig, GardenSession, MemoryDraft, MemoryId, PendingRequest,
};
use std::sync::mpsc;
use std::sync::Mutex;
use thiserror::Error;

use crate::runtime::RUNTIME;

/// The open garden.
#[derive(Resource)]
pub struct Garden {
    pub session: GardenSession,
}

impl Garden {
    pub fn new(config: GardenConfig) -> Self {
        Self {
            session: GardenSession::create(config, rand::random()),
        }
    }

    pub fn has_ai(&self) -> bool {
        self.session.gateway().is_some()
    }
}

/// Which window is open over the garden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveOverlay {
    #[default]
    None,
    PlantForm,
    MemoryDetail(MemoryId),
    Settings,
    Help,
}

/// Problems with the memory form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Give your memory a title")]
    MissingTitle,

    #[error("Describe your memory")]
    MissingDescription,

    #[error("Date must look like 2024-05-31")]
    BadDate,
}

/// Contents of the "Plant a New Memory" form.
#[derive(Debug, Clone)]
pub struct MemoryForm {
    pub title: String,
    pub date: String,
    pub emotion: Emotion,
    pub intensity: i32,
    pub description: String,
}

impl Default for MemoryForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            emotion: Emotion::Joy,
            intensity: 5,
            description: String::new(),
        }
    }
}

impl MemoryForm {
    pub fn to_draft(&self) -> Result<MemoryDraft, FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingTitle);
        }
        if self.description.trim().is_empty() {
            return Err(FormError::MissingDescription);
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| FormError::BadDate)?;

        Ok(MemoryDraft::new(&self.title, &self.description)
            .with_emotion(self.emotion.key())
            .with_date(date)
            .with_intensity(self.intensity))
    }

    /// Text the AI helpers work from.
    pub fn ai_text(&self) -> String {
        format!("{} {}", self.title.trim(), self.description.trim())
            .trim()
            .to_string()
    }
}

/// AI requests started from the form.
#[derive(Default)]
pub struct FormRequests {
    pub sentiment: Option<PendingRequest<Emotion>>,
    pub completion: Option<PendingRequest<String>>,
    pub chunks: Option<Mutex<mpsc::Receiver<String>>>,
}

impl FormRequests {
    pub fn is_detecting(&self) -> bool {
        self.sentiment.is_some()
    }

    pub fn is_completing(&self) -> bool {
        self.completion.is_some()
    }

    /// Drop both requests; anything still running is aborted.
    pub fn cancel(&mut self) {
        if let Some(request) = self.sentiment.take() {
            request.cancel();
        }
        if let Some(request) = self.completion.take() {
            request.cancel();
        }
        self.chunks = None;
    }
}

/// Main application state resource.
#[derive(Resource)]
pub struct AppState {
    /// Current overlay.
    pub overlay: ActiveOverlay,
    /// Whether connection lines are drawn.
    pub show_connections: bool,
    /// Memory form contents.
    pub form: MemoryForm,
    /// Error shown inside the form.
    pub form_error: Option<String>,
    /// AI requests from the form.
    pub requests: FormRequests,
    /// API key being edited in the settings window.
    pub api_key_input: String,
    /// Status bar message.
    pub status_message: Option<String>,
    /// When the status message was set (for auto-clear).
    pub status_set_time: Option<f64>,
    /// Error popup message.
    pub error_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            overlay: ActiveOverlay::None,
            show_connections: true,
            form: MemoryForm::default(),
            form_error: None,
            requests: FormRequests::default(),
            api_key_input: String::new(),
            status_message: None,
            status_set_time: None,
            error_message: None,
        }
    }
}

impl AppState {
    /// Set a status message (with timestamp for auto-clear).
    pub fn set_status(&mut self, message: impl Into<String>, current_time: f64) {
        self.status_message = Some(message.into());
        self.status_set_time = Some(current_time);
    }

    /// Set a status message without timestamp (won't auto-clear).
    pub fn set_status_persistent(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_set_time = None;
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
        self.status_set_time = None;
    }

    /// Toggle an overlay.
    pub fn toggle_overlay(&mut self, overlay: ActiveOverlay) {
        if self.overlay == overlay {
            self.overlay = ActiveOverlay::None;
        } else {
            self.overlay = overlay;
        }
    }

    /// Open the plant form, fresh unless it was already being filled in.
    pub fn open_form(&mut self) {
        self.overlay = ActiveOverlay::PlantForm;
        self.form_error = None;
    }

    /// Close the form and forget its contents.
    pub fn close_form(&mut self) {
        self.requests.cancel();
        self.form = MemoryForm::default();
        self.form_error = None;
        if self.overlay == ActiveOverlay::PlantForm {
            self.overlay = ActiveOverlay::None;
        }
    }

    /// Ask the gateway for the form's dominant emotion.
    pub fn start_sentiment(&mut self, gateway: &AiGateway) {
        let text = self.form.ai_text();
        if text.is_empty() || self.requests.is_detecting() {
            return;
        }
        let gateway = gateway.clone();
        self.requests.sentiment = Some(PendingRequest::spawn(
            RUNTIME.handle(),
            "classify_sentiment",
            async move { gateway.classify_sentiment(&text).await },
        ));
        self.set_status_persistent("Sensing the mood...");
    }

    /// Stream a continuation of the description into the form.
    pub fn start_completion(&mut self, gateway: &AiGateway) {
        let text = self.form.ai_text();
        if text.is_empty() || self.requests.is_completing() {
            return;
        }
        if !self.form.description.is_empty() && !self.form.description.ends_with(char::is_whitespace) {
            self.form.description.push(' ');
        }

        let (tx, rx) = mpsc::channel();
        let gateway = gateway.clone();
        self.requests.chunks = Some(Mutex::new(rx));
        self.requests.completion = Some(PendingRequest::spawn(
            RUNTIME.handle(),
            "complete_text",
            async move {
                gateway
                    .complete_text_streaming(&text, move |chunk| {
                        let _ = tx.send(chunk.to_string());
                    })
                    .await
            },
        ));
        self.set_status_persistent("Writing...");
    }
}

/// Apply finished AI work: relatedness lookups and form helpers.
pub fn poll_ai_requests(mut garden: ResMut<Garden>, mut app_state: ResMut<AppState>, time: Res<Time>) {
    let now = time.elapsed_secs_f64();

    if garden.session.poll_pending() > 0 {
        app_state.set_status("New connections found", now);
    }

    let state = &mut *app_state;

    if let Some(rx) = &state.requests.chunks {
        let rx = rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while let Ok(chunk) = rx.try_recv() {
            state.form.description.push_str(&chunk);
        }
    }

    if let Some(result) = state.requests.sentiment.as_mut().and_then(|r| r.try_take()) {
        state.requests.sentiment = None;
        match result {
            Ok(emotion) => {
                state.form.emotion = emotion;
                state.set_status(format!("Detected {}", garden_core::Zone::of(emotion).display_name), now);
            }
            Err(e) => state.set_status(format!("Detection failed: {e}"), now),
        }
    }

    if let Some(result) = state.requests.completion.as_mut().and_then(|r| r.try_take()) {
        state.requests.completion = None;
        state.requests.chunks = None;
        match result {
            Ok(text) if text.is_empty() => state.set_status("No suggestion this time", now),
            Ok(_) => state.set_status("Suggestion added", now),
            Err(e) => state.set_status(format!("Completion failed: {e}"), now),
        }
    }
}

/// Clear old status messages after a timeout.
pub fn clear_old_status(mut app_state: ResMut<AppState>, time: Res<Time>) {
    const STATUS_TIMEOUT: f64 = 4.0;

    if let Some(set_time) = app_state.status_set_time {
        if time.elapsed_secs_f64() - set_time > STATUS_TIMEOUT {
            app_state.clear_status();
        }
    }
}

/// Dispose the session when the window closes.
pub fn dispose_on_exit(
    mut exit: EventReader<AppExit>,
    mut garden: ResMut<Garden>,
    mut app_state: ResMut<AppState>,
    time: Res<Time>,
) {
    if exit.read().next().is_some() {
        app_state.requests.cancel();
        garden.session.dispose(time.elapsed_secs_f64());
    }
}
