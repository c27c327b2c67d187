//! One send: the request/search/resume cycle running as a background task.

use std::sync::Arc;

use futures::StreamExt;
use scout_llm::{ChatOptions, ChatRequest, LlmClient, Message};
use scout_search::{web_search_tool, SearchProvider};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::detector::ResponseAccumulator;
use crate::error::{ChatError, Result};
use crate::prompt;
use crate::publisher::SessionPublisher;
use crate::types::{
    ChatTurn, Phase, RequestHistory, RoundOutcome, SearchRequest, SessionStatus, Settings,
    StepOutcome, ANALYZING_PROGRESS,
};

pub(crate) struct Run {
    pub llm: Arc<dyn LlmClient>,
    pub search: Arc<dyn SearchProvider>,
    pub publisher: SessionPublisher,
    pub settings: watch::Receiver<Settings>,
    pub token: CancellationToken,
    pub model: String,
    pub web_search: bool,
    pub streaming: bool,
    pub max_rounds: usize,
    pub temperature: Option<f32>,
    pub history: RequestHistory,
}

impl Run {
    pub(crate) async fn execute(mut self) {
        tracing::info!(
            model = %self.model,
            streaming = self.streaming,
            web_search = self.web_search,
            "Starting chat run"
        );

        if let Err(e) = self.drive().await {
            if self.token.is_cancelled() {
                return;
            }
            tracing::error!("Chat run failed: {}", e);
            self.publisher.post_error_if_live(&self.token, e.to_string(), |s| {
                s.draft = None;
                s.status = SessionStatus::settled(Phase::Errored);
            });
        }
    }

    async fn drive(&mut self) -> Result<()> {
        for round in 0..self.max_rounds {
            match self.run_round(round).await? {
                RoundOutcome::Cancelled => {
                    tracing::debug!(round, "Run cancelled");
                    return Ok(());
                }
                RoundOutcome::Answer { id, content, reasoning } => {
                    self.commit_answer(id, content, reasoning);
                    return Ok(());
                }
                RoundOutcome::Search(request) => {
                    // No round left to read the results.
                    if round + 1 == self.max_rounds {
                        tracing::debug!(query = %request.query, "Search skipped on the last round");
                        break;
                    }
                    if !self.perform_search(request).await {
                        return Ok(());
                    }
                }
            }
        }

        tracing::warn!(max_rounds = self.max_rounds, "Round limit reached");
        Err(ChatError::RoundLimit(self.max_rounds))
    }

    /// One generation round, retried once without tools if the server rejects them.
    async fn run_round(&self, round: usize) -> Result<RoundOutcome> {
        let mut retried = false;
        loop {
            let request = self.build_request();
            let sent_tools = request.has_tools();
            tracing::info!(round, tools = sent_tools, messages = request.messages.len(), "Dispatching generation");

            let attempt = if self.streaming {
                self.stream_round(request).await
            } else {
                self.complete_round(request).await
            };

            match attempt {
                Err(e) if e.is_tools_unsupported() && sent_tools && !retried => {
                    tracing::warn!(model = %self.model, "Model rejected tools, retrying without them");
                    retried = true;
                    let live = self.publisher.modify_if_live(&self.token, |s| {
                        s.model_supports_tools = false;
                        s.draft = None;
                    });
                    if !live {
                        return Ok(RoundOutcome::Cancelled);
                    }
                }
                other => return other,
            }
        }
    }

    fn build_request(&self) -> ChatRequest {
        let supports_tools = self.publisher.model_supports_tools();
        let system = prompt::system_turn(self.web_search, supports_tools);

        let mut options = ChatOptions::new();
        if self.web_search {
            options = if supports_tools {
                options.tools(vec![web_search_tool()])
            } else {
                options.web_search(true)
            };
        }
        if let Some(temperature) = self.temperature {
            options = options.temperature(temperature);
        }

        ChatRequest::new(self.model.clone(), self.history.with_system(system)).with_options(options)
    }

    async fn stream_round(&self, request: ChatRequest) -> Result<RoundOutcome> {
        let draft_id = self.publisher.next_id();
        let placed = self.publisher.modify_if_live(&self.token, |s| {
            s.draft = Some(ChatTurn::new(draft_id, Message::assistant("")));
        });
        if !placed {
            return Ok(RoundOutcome::Cancelled);
        }

        let mut stream = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Ok(RoundOutcome::Cancelled),
            result = self.llm.chat_stream(request) => result?,
        };

        let mut acc = ResponseAccumulator::new(self.web_search);
        let mut fragments = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return Ok(RoundOutcome::Cancelled),
                next = stream.next() => next,
            };

            let fragment = match next {
                Some(Ok(fragment)) => {
                    fragments += 1;
                    Some(fragment)
                }
                Some(Err(e)) => return Err(e.into()),
                None => None,
            };

            match acc.step(fragment) {
                StepOutcome::ToolCallDetected(request) => {
                    tracing::info!(query = %request.query, fragments, "Search request detected");
                    return Ok(RoundOutcome::Search(request));
                }
                StepOutcome::Done => {
                    tracing::debug!(fragments, "Stream finished");
                    let (content, reasoning) = acc.into_parts();
                    return Ok(RoundOutcome::Answer { id: draft_id, content, reasoning });
                }
                StepOutcome::Continue => {
                    let content = acc.text().to_string();
                    let reasoning = acc.reasoning().to_string();
                    let tool_calls = acc.tool_calls().map(<[_]>::to_vec);
                    let live = self.publisher.modify_if_live(&self.token, |s| {
                        if let Some(draft) = s.draft.as_mut() {
                            draft.message.content = Some(content);
                            draft.message.reasoning = (!reasoning.is_empty()).then_some(reasoning);
                            draft.message.tool_calls = tool_calls;
                        }
                        s.status.phase = Phase::StreamingAnswer;
                    });
                    if !live {
                        return Ok(RoundOutcome::Cancelled);
                    }
                }
            }
        }
    }

    async fn complete_round(&self, request: ChatRequest) -> Result<RoundOutcome> {
        let response = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Ok(RoundOutcome::Cancelled),
            result = self.llm.chat(request) => result?,
        };

        let mut acc = ResponseAccumulator::new(self.web_search);
        if let StepOutcome::ToolCallDetected(request) = acc.step(Some(response.into_fragment())) {
            tracing::info!(query = %request.query, "Search request detected");
            return Ok(RoundOutcome::Search(request));
        }

        let (content, reasoning) = acc.into_parts();
        Ok(RoundOutcome::Answer {
            id: self.publisher.next_id(),
            content,
            reasoning,
        })
    }

    /// Run the search and append the exchange. Returns false if cancelled.
    async fn perform_search(&mut self, request: SearchRequest) -> bool {
        let query = request.query.clone();
        let started = self.publisher.modify_if_live(&self.token, |s| {
            s.draft = None;
            s.status = SessionStatus::searching(query.clone());
        });
        if !started {
            return false;
        }

        // The search itself is left to finish on its own if the run is
        // cancelled; its result is then discarded.
        let engine = self.settings.borrow().search_engines.selected();
        let search = Arc::clone(&self.search);
        let task = tokio::spawn(async move { search.search(&query, &engine).await });

        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => return false,
            joined = task => joined.unwrap_or_else(|e| format!("Search error: {}", e)),
        };

        let supports_tools = self.publisher.model_supports_tools();
        let live = self.publisher.modify_if_live(&self.token, |s| {
            s.status.searching = false;
            s.status.search_query = None;
            s.status.progress = ANALYZING_PROGRESS;
        });
        if !live {
            return false;
        }

        let (assistant, answer) = prompt::search_exchange(&request, &result, supports_tools);
        self.history.add_search_exchange(assistant, answer);
        tracing::debug!(history = self.history.len(), "Search results added");

        self.publisher.modify_if_live(&self.token, |s| {
            s.status = SessionStatus::synthesizing();
        })
    }

    fn commit_answer(&self, id: u64, content: String, reasoning: String) {
        let message = Message::assistant(content).with_reasoning(reasoning);
        let committed = self.publisher.modify_if_live(&self.token, |s| {
            s.draft = None;
            s.turns.push(ChatTurn::new(id, message));
            s.status = SessionStatus::settled(Phase::Done);
        });
        if committed {
            tracing::info!(turn = id, "Answer committed");
        }
    }
}
