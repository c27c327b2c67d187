use std::sync::{Arc, RwLock};

use scout_llm::{LlmClient, Message, RunningModel};
use scout_search::{SearchEngineConfig, SearchProvider};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ChatError, Result};
use crate::prompt;
use crate::publisher::SessionPublisher;
use crate::run::Run;
use crate::types::{
    ChatTurn, ConversationSession, EngineConfig, Phase, QuickAction, RequestHistory,
    SessionStatus, Settings,
};

pub const WELCOME_MESSAGE: &str = "Welcome! Please enter your Ollama server address in settings.";
pub const SELECT_MODEL_MESSAGE: &str = "Server connected! Now select a model in settings to start.";
pub const READY_MESSAGE: &str = "Ready to chat.";
pub const SERVER_UNREACHABLE_MESSAGE: &str = "Server unreachable. Check your URL and API Key.";

struct ActiveRun {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// The chat orchestration engine.
///
/// Owns the conversation session and at most one in-flight run. Starting a
/// send cancels the run before it. State is observed through
/// [`ChatEngine::subscribe`]; settings changes through
/// [`ChatEngine::subscribe_settings`].
pub struct ChatEngine {
    llm: RwLock<Arc<dyn LlmClient>>,
    search: Arc<dyn SearchProvider>,
    config: EngineConfig,
    publisher: SessionPublisher,
    settings: watch::Sender<Settings>,
    active: Mutex<Option<ActiveRun>>,
}

impl ChatEngine {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
        settings: Settings,
        config: EngineConfig,
    ) -> Self {
        let publisher = SessionPublisher::new(ConversationSession::default(), &config);
        let (settings, _) = watch::channel(settings);
        Self {
            llm: RwLock::new(llm),
            search,
            config,
            publisher,
            settings,
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSession> {
        self.publisher.subscribe()
    }

    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.settings.subscribe()
    }

    pub fn session(&self) -> ConversationSession {
        self.publisher.snapshot()
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn llm(&self) -> Arc<dyn LlmClient> {
        match self.llm.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    // ========================================================================
    // GENERATION
    // ========================================================================

    /// Append a user turn and start generating the answer in the background.
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        let settings = self.settings();
        let Some(model) = settings.model.clone() else {
            self.publisher.post_error(ChatError::NoModelSelected.to_string());
            return Err(ChatError::NoModelSelected);
        };

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            tracing::debug!("Cancelling previous run");
            previous.token.cancel();
        }

        let text = text.into();
        let user_id = self.publisher.next_id();
        let mut history = Vec::new();
        self.publisher.modify(|s| {
            history = prompt::history_for_request(&s.messages());
            let images = std::mem::take(&mut s.attached_images);
            let user = Message::user(text).with_images(images);
            history.push(user.clone());
            s.turns.push(ChatTurn::new(user_id, user));
            s.draft = None;
            s.error = None;
            s.status = SessionStatus::requesting();
        });

        let token = CancellationToken::new();
        let run = Run {
            llm: self.llm(),
            search: Arc::clone(&self.search),
            publisher: self.publisher.clone(),
            settings: self.settings.subscribe(),
            token: token.clone(),
            model,
            web_search: settings.web_search_enabled,
            streaming: settings.streaming_enabled,
            max_rounds: self.config.max_rounds,
            temperature: self.config.temperature,
            history: RequestHistory::new(history),
        };
        let handle = tokio::spawn(run.execute());
        *active = Some(ActiveRun { token, handle });
        Ok(())
    }

    /// Send one of the preset prompts.
    pub async fn quick_action(&self, action: QuickAction) -> Result<()> {
        tracing::debug!(?action, "Quick action");
        self.send(action.prompt()).await
    }

    /// Stop the active run, if any. Committed turns are left alone.
    pub async fn cancel(&self) {
        let previous = self.active.lock().await.take();
        let was_running = match previous {
            Some(run) => {
                run.token.cancel();
                !run.handle.is_finished()
            }
            None => false,
        };

        self.publisher.modify(|s| {
            s.draft = None;
            if was_running {
                s.status = SessionStatus::settled(Phase::Cancelled);
            } else {
                s.status.generating = false;
                s.status.searching = false;
                s.status.search_query = None;
                s.status.progress = crate::types::IDLE_PROGRESS;
            }
        });
        if was_running {
            tracing::info!("Run cancelled by user");
        }
    }

    pub async fn clear_history(&self) {
        self.cancel().await;
        self.publisher.modify(|s| {
            s.turns.clear();
            s.error = None;
            s.status = SessionStatus::default();
        });
    }

    /// Remove one committed turn. Returns whether it existed.
    pub fn delete_turn(&self, id: u64) -> bool {
        let mut removed = false;
        self.publisher.modify(|s| {
            let before = s.turns.len();
            s.turns.retain(|t| t.id != id);
            removed = s.turns.len() != before;
        });
        removed
    }

    pub fn attach_images(&self, images: Vec<String>) {
        self.publisher.modify(|s| s.attached_images.extend(images));
    }

    pub fn clear_attached_images(&self) {
        self.publisher.modify(|s| s.attached_images.clear());
    }

    pub fn dismiss_error(&self) {
        self.publisher.dismiss_error();
    }

    pub fn dismiss_info(&self) {
        self.publisher.dismiss_info();
    }

    // ========================================================================
    // SETTINGS
    // ========================================================================

    /// Switch models. The new model gets a fresh chance at tool calls.
    pub fn select_model(&self, model: impl Into<String>) {
        let model = model.into();
        tracing::info!(model = %model, "Model selected");
        self.settings.send_modify(|s| s.model = Some(model));
        self.publisher.modify(|s| s.model_supports_tools = true);
    }

    pub fn toggle_web_search(&self, enabled: bool) {
        self.settings
            .send_if_modified(|s| std::mem::replace(&mut s.web_search_enabled, enabled) != enabled);
    }

    pub fn toggle_streaming(&self, enabled: bool) {
        self.settings
            .send_if_modified(|s| std::mem::replace(&mut s.streaming_enabled, enabled) != enabled);
    }

    pub fn add_search_engine(&self, engine: SearchEngineConfig) -> String {
        let mut id = String::new();
        self.settings.send_modify(|s| id = s.search_engines.add(engine));
        id
    }

    pub fn remove_search_engine(&self, id: &str) -> Result<()> {
        let mut outcome = Ok(());
        self.settings.send_if_modified(|s| {
            outcome = s.search_engines.remove(id).map(|_| ());
            outcome.is_ok()
        });
        outcome.map_err(ChatError::from)
    }

    pub fn select_search_engine(&self, id: &str) -> Result<()> {
        let mut outcome = Ok(());
        self.settings.send_if_modified(|s| {
            outcome = s.search_engines.select(id);
            outcome.is_ok()
        });
        outcome.map_err(ChatError::from)
    }

    // ========================================================================
    // SERVER
    // ========================================================================

    /// Point the engine at another server and reconnect.
    ///
    /// `llm` must already be built for `server_url`. The running answer, if
    /// any, is cancelled and the model list is reloaded.
    pub async fn set_connection(
        &self,
        server_url: impl Into<String>,
        api_key: Option<String>,
        llm: Arc<dyn LlmClient>,
    ) -> Result<()> {
        self.cancel().await;
        match self.llm.write() {
            Ok(mut guard) => *guard = llm,
            Err(poisoned) => *poisoned.into_inner() = llm,
        }

        let server_url = server_url.into();
        tracing::info!(url = %server_url, "Server changed");
        self.settings.send_modify(|s| {
            s.server_url = server_url;
            s.api_key = api_key.filter(|k| !k.trim().is_empty());
        });
        self.publisher.modify(|s| {
            s.available_models.clear();
            s.server_healthy = None;
            s.model_supports_tools = true;
        });
        self.connect().await
    }

    /// Probe the server, load its models and post the start-up banner.
    pub async fn connect(&self) -> Result<()> {
        let settings = self.settings();
        if !settings.has_server_url() {
            self.publisher.post_notice(WELCOME_MESSAGE);
            return Ok(());
        }

        if let Err(e) = self.llm().health_check().await {
            tracing::warn!("Health check failed: {}", e);
            self.publisher.modify(|s| s.server_healthy = Some(false));
            self.publisher.post_error(SERVER_UNREACHABLE_MESSAGE);
            return Err(e.into());
        }
        self.publisher.modify(|s| s.server_healthy = Some(true));

        match self.llm().version().await {
            Ok(version) => tracing::info!(url = %settings.server_url, %version, "Connected to Ollama"),
            Err(e) => tracing::debug!("Server version unavailable: {}", e),
        }

        self.refresh_models().await?;

        if settings.model.is_none() {
            self.publisher.post_notice(SELECT_MODEL_MESSAGE);
        } else {
            self.publisher.post_info(READY_MESSAGE);
        }
        Ok(())
    }

    pub async fn server_version(&self) -> Result<String> {
        Ok(self.llm().version().await?)
    }

    /// Models currently loaded in the server's memory.
    pub async fn running_models(&self) -> Result<Vec<RunningModel>> {
        Ok(self.llm().running_models().await?)
    }

    pub async fn refresh_models(&self) -> Result<Vec<String>> {
        match self.llm().list_models().await {
            Ok(models) => {
                let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
                tracing::debug!(count = names.len(), "Models loaded");
                let published = names.clone();
                self.publisher.modify(|s| s.available_models = published);
                Ok(names)
            }
            Err(e) => {
                self.publisher.post_error(format!("Failed to load models: {}", e));
                Err(e.into())
            }
        }
    }
}
