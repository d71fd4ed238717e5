//! Per-agent connector: session lifecycle, prompt exchange, turn logging.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::ConnectorConfig;
use crate::error::{classify, ConnectorError, Result};
use crate::history::{filter_and_prune, PruneOutcome};
use crate::provider::GeminiApi;
use crate::store::TurnLog;
use crate::types::{Role, SessionSettings, TokenInfo, Turn, TurnRecord};

use super::accounting::exchange_token_info;
use super::chat::ChatSession;
use super::segregate::{segregate, Segregated};

/// Result of a successful prompt exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub answer: String,
    pub reasoning: Option<String>,
    pub token_info: TokenInfo,
}

/// One message of the simplified history view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub role: Role,
    pub text: String,
    pub thinking: Option<String>,
}

/// Connects one agent to Gemini.
///
/// The connector owns the agent's live [`ChatSession`]; the [`TurnLog`] is
/// the durable record the session is rebuilt from. Calls take `&mut self`,
/// so at most one exchange is in flight per agent.
pub struct GeminiConnector {
    config: ConnectorConfig,
    api: Arc<dyn GeminiApi>,
    turn_log: Arc<dyn TurnLog>,
    settings: SessionSettings,
    session: Option<ChatSession>,
}

impl std::fmt::Debug for GeminiConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConnector")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl GeminiConnector {
    /// Connect using the Google REST client and the agent's file turn log.
    ///
    /// The API key is resolved here, once.
    #[cfg(feature = "google")]
    pub fn connect(config: ConnectorConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let client = crate::provider::google::GoogleClient::new(&api_key, config.base_url.clone())?;
        let turn_log = crate::store::FileTurnLog::in_agent_dir(&config.agent_data_path);
        Self::with_parts(config, Arc::new(client), Arc::new(turn_log))
    }

    /// Connect with an explicit provider client and turn log, then
    /// initialize the session from the log.
    pub fn with_parts(
        config: ConnectorConfig,
        api: Arc<dyn GeminiApi>,
        turn_log: Arc<dyn TurnLog>,
    ) -> Result<Self> {
        let settings = config.session_settings();
        let mut connector = Self {
            config,
            api,
            turn_log,
            settings,
            session: None,
        };
        connector.initialize_chat_session()?;
        info!(
            agent = %connector.config.agent_name,
            model = %connector.config.model_name,
            temperature = connector.config.temperature,
            "Gemini connector initialized"
        );
        Ok(connector)
    }

    pub fn agent_name(&self) -> &str {
        &self.config.agent_name
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Load and prune the turn log. A log that cannot be read counts as empty.
    pub fn load_history(&self) -> PruneOutcome {
        let records = self.turn_log.load_all().unwrap_or_else(|err| {
            error!(agent = %self.config.agent_name, error = %err, "error loading turn log");
            Vec::new()
        });
        filter_and_prune(&self.config.agent_name, &records, &self.config.retention)
    }

    /// Replace the live session with one seeded from the turn log.
    ///
    /// On failure no session is left behind and the error is returned as is.
    pub fn initialize_chat_session(&mut self) -> Result<()> {
        self.session = None;
        let seed = self.load_history().to_contents();
        let seed_len = seed.len();

        let session = ChatSession::create(
            self.api.clone(),
            self.config.model_name.clone(),
            self.settings.clone(),
            seed,
        )
        .map_err(|failure| {
            error!(
                agent = %self.config.agent_name,
                model = %self.config.model_name,
                error = %failure,
                "error starting chat session"
            );
            classify(&self.config.agent_name, failure)
        })?;

        self.session = Some(session);
        info!(agent = %self.config.agent_name, history_len = seed_len, "chat session initialized");
        Ok(())
    }

    /// Discard the live session and start a new one from the turn log.
    pub fn reset_session(&mut self) -> Result<()> {
        self.initialize_chat_session()
    }

    /// Drop the live session without replacing it.
    pub fn end_session(&mut self) {
        if self.session.take().is_some() {
            debug!(agent = %self.config.agent_name, "chat session ended");
        }
    }

    /// Send `prompt`, retrying transient failures.
    ///
    /// The session is initialized first if absent; an initialization error is
    /// returned unchanged. Attempt 0 is a single request, later attempts are
    /// streamed.
    pub async fn send_message(&mut self, prompt: &str, tick: u64) -> Result<Reply> {
        let policy = self.config.retry_policy();
        let mut attempt = 0;
        loop {
            if self.session.is_none() {
                self.initialize_chat_session()?;
            }
            match self.send_message_attempt(prompt, tick, attempt).await {
                Ok(reply) => return Ok(reply),
                Err(err) if policy.should_retry(&err, attempt) => {
                    policy.pause(&self.config.agent_name, attempt, &err).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run a single exchange attempt.
    ///
    /// Without a live session this returns a `SYSTEM_ERROR` answer instead
    /// of an error. Both turns are written to the log only after the whole
    /// response has been assembled.
    pub async fn send_message_attempt(
        &mut self,
        prompt: &str,
        tick: u64,
        attempt_number: u32,
    ) -> Result<Reply> {
        let agent = self.config.agent_name.clone();

        let Some(session) = self.session.as_mut() else {
            let message = format!("SYSTEM_ERROR: Chat session for {agent} is not available.");
            error!(agent = %agent, tick, "{message}");
            return Ok(Reply {
                answer: message,
                reasoning: None,
                token_info: TokenInfo::default(),
            });
        };

        let outcome = if attempt_number == 0 {
            session.send_message(prompt).await
        } else {
            info!(agent = %agent, attempt = attempt_number, "using streaming for retry attempt");
            session.send_message_stream(prompt).await
        };
        let assembled = outcome.map_err(|failure| classify(&agent, failure))?;

        if !assembled.has_candidates {
            return Err(ConnectorError::safety_block(&agent, assembled.prompt_feedback));
        }

        let Segregated { answer, reasoning } = segregate(&assembled.parts);
        let token_info =
            exchange_token_info(&agent, assembled.usage_metadata.as_ref(), self.session.as_ref()).await;

        self.record_exchange(
            Turn::user(tick, prompt),
            Turn::model(tick, answer.clone(), reasoning.clone(), token_info.clone()),
        );

        debug!(
            agent = %agent,
            tick,
            attempt = attempt_number,
            answer_len = answer.len(),
            has_reasoning = reasoning.is_some(),
            "exchange complete"
        );
        Ok(Reply {
            answer,
            reasoning,
            token_info,
        })
    }

    /// Append the user and model turns together, skipping empty ones.
    fn record_exchange(&self, user: Turn, model: Turn) {
        let records: Vec<TurnRecord> = [user, model]
            .iter()
            .filter(|turn| !turn.is_empty())
            .map(TurnRecord::from)
            .collect();
        if let Err(err) = self.turn_log.append_all(&records) {
            error!(agent = %self.config.agent_name, error = %err, "error appending turns to log");
        }
    }

    /// The conversation as the model currently sees it.
    ///
    /// Falls back to the pruned turn log when no session is live.
    pub fn chat_history(&self) -> Vec<HistoryMessage> {
        match &self.session {
            Some(session) => session
                .history()
                .iter()
                .map(|content| {
                    let Segregated { answer, reasoning } = segregate(&content.parts);
                    HistoryMessage {
                        role: content.role.unwrap_or(Role::User),
                        text: answer,
                        thinking: reasoning,
                    }
                })
                .collect(),
            None => {
                warn!(agent = %self.config.agent_name, "no active chat session, reconstructing history from turn log");
                self.load_history()
                    .entries
                    .into_iter()
                    .map(|entry| HistoryMessage {
                        role: entry.role,
                        text: entry.text_content,
                        thinking: entry.reasoning_content,
                    })
                    .collect()
            }
        }
    }

    /// Token count of the current, possibly pruned, session history.
    ///
    /// Returns `Some(0)` when there is no history and `None` when the
    /// provider could not count.
    pub async fn current_total_session_tokens(&self) -> Option<u32> {
        let contents = match &self.session {
            Some(session) => session.history().to_vec(),
            None => {
                warn!(agent = %self.config.agent_name, "no active chat session for token count, loading turn log");
                self.load_history().to_contents()
            }
        };
        if contents.is_empty() {
            return Some(0);
        }

        match self.api.count_tokens(&self.config.model_name, &contents).await {
            Ok(total) => Some(total),
            Err(failure) => {
                warn!(agent = %self.config.agent_name, error = %failure, "could not count total session tokens");
                None
            }
        }
    }
}
