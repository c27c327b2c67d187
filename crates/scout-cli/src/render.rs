//! Terminal view of the conversation session.

use std::io::Write;

use scout_chat::{ConversationSession, Phase};
use scout_llm::Role;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What has already been written, so each update prints only what is new.
#[derive(Debug, Default)]
pub struct Renderer {
    last_turn_id: u64,
    draft_id: Option<u64>,
    draft_printed: usize,
    phase: Phase,
    search_query: Option<String>,
    error_id: Option<u64>,
    info_id: Option<u64>,
}

impl Renderer {
    pub fn new(session: &ConversationSession) -> Self {
        Self {
            last_turn_id: session.turns.iter().map(|t| t.id).max().unwrap_or(0),
            phase: session.status.phase,
            error_id: session.error.as_ref().map(|b| b.id),
            info_id: session.info.as_ref().map(|b| b.id),
            ..Self::default()
        }
    }

    /// Text to print for the transition to `session`.
    pub fn update(&mut self, session: &ConversationSession) -> String {
        let mut out = String::new();

        if let Some(banner) = &session.info {
            if self.info_id != Some(banner.id) {
                out.push_str(&format!("[info] {}\n", banner.message));
            }
        }
        self.info_id = session.info.as_ref().map(|b| b.id);

        if let Some(query) = &session.status.search_query {
            if self.search_query.as_ref() != Some(query) {
                self.close_draft(&mut out);
                out.push_str(&format!("[{}] {}\n", session.status.progress, query));
            }
        }
        self.search_query = session.status.search_query.clone();

        if let Some(draft) = &session.draft {
            if self.draft_id != Some(draft.id) {
                self.close_draft(&mut out);
                self.draft_id = Some(draft.id);
                out.push_str("assistant> ");
            }
            let text = draft.text();
            let shown = shown_len(text);
            if let Some(delta) = text.get(self.draft_printed..shown) {
                out.push_str(delta);
                self.draft_printed = shown;
            }
        }

        let seen = self.last_turn_id;
        for turn in session.turns.iter().filter(|t| t.id > seen) {
            if turn.role() == Role::Assistant {
                if self.draft_id == Some(turn.id) {
                    if let Some(rest) = turn.text().get(self.draft_printed..) {
                        out.push_str(rest);
                    }
                    out.push('\n');
                    self.draft_id = None;
                    self.draft_printed = 0;
                } else {
                    self.close_draft(&mut out);
                    out.push_str(&format!("assistant> {}\n", turn.text()));
                }
            }
            self.last_turn_id = turn.id;
        }

        if session.draft.is_none() {
            self.close_draft(&mut out);
        }

        if session.status.phase != self.phase {
            if session.status.phase == Phase::Cancelled {
                out.push_str("[cancelled]\n");
            }
            self.phase = session.status.phase;
        }

        if let Some(banner) = &session.error {
            if self.error_id != Some(banner.id) {
                out.push_str(&format!("[error] {}\n", banner.message));
            }
        }
        self.error_id = session.error.as_ref().map(|b| b.id);

        out
    }

    /// A draft that disappeared without being committed ends its line here.
    fn close_draft(&mut self, out: &mut String) {
        if self.draft_id.take().is_some() {
            out.push('\n');
        }
        self.draft_printed = 0;
    }
}

const MARKERS: [&str; 2] = ["[search", "web_search"];

/// Length of the draft prefix that is safe to print. Text from a search
/// marker onward is held back, including a trailing partial marker, since
/// the draft is dropped once the marker is detected.
fn shown_len(text: &str) -> usize {
    let lower = text.to_ascii_lowercase();
    if let Some(start) = MARKERS.iter().filter_map(|m| lower.find(m)).min() {
        return start;
    }
    lower
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| MARKERS.iter().any(|m| m.starts_with(&lower[i..])))
        .unwrap_or(text.len())
}

/// Print session changes to stdout until the engine goes away.
pub fn spawn(mut session: watch::Receiver<ConversationSession>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut renderer = Renderer::new(&session.borrow_and_update());
        while session.changed().await.is_ok() {
            let text = renderer.update(&session.borrow_and_update());
            if !text.is_empty() {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
        }
    })
}

/// One line per committed turn, for `/history`
pub fn history(session: &ConversationSession) -> String {
    if session.turns.is_empty() {
        return "(no messages)\n".to_string();
    }
    let mut out = String::new();
    for turn in &session.turns {
        let images = if turn.message.has_images() {
            format!(" [{} image(s)]", turn.message.images.len())
        } else {
            String::new()
        };
        out.push_str(&format!("#{} {}> {}{}\n", turn.id, turn.role().as_str(), turn.text(), images));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_chat::{Banner, ChatTurn, SessionStatus};
    use scout_llm::Message;

    fn streaming(id: u64, text: &str) -> ConversationSession {
        ConversationSession {
            draft: Some(ChatTurn::new(id, Message::assistant(text))),
            ..Default::default()
        }
    }

    #[test]
    fn test_streams_only_new_text() {
        let mut renderer = Renderer::default();
        assert_eq!(renderer.update(&streaming(2, "Hel")), "assistant> Hel");
        assert_eq!(renderer.update(&streaming(2, "Hello")), "lo");

        let mut done = ConversationSession::default();
        done.turns.push(ChatTurn::new(1, Message::user("hi")));
        done.turns.push(ChatTurn::new(2, Message::assistant("Hello!")));
        done.status = SessionStatus::settled(Phase::Done);
        assert_eq!(renderer.update(&done), "!\n");
        assert_eq!(renderer.update(&done), "");
    }

    #[test]
    fn test_draft_after_earlier_turns() {
        let mut session = ConversationSession::default();
        session.turns.push(ChatTurn::new(1, Message::user("hi")));
        session.turns.push(ChatTurn::new(2, Message::assistant("Hello")));
        let mut renderer = Renderer::new(&session);

        session.turns.push(ChatTurn::new(3, Message::user("more")));
        session.draft = Some(ChatTurn::new(4, Message::assistant("Sure")));
        assert_eq!(renderer.update(&session), "assistant> Sure");

        session.draft = None;
        session.turns.push(ChatTurn::new(4, Message::assistant("Sure thing")));
        assert_eq!(renderer.update(&session), " thing\n");
        assert_eq!(renderer.last_turn_id, 4);
    }

    #[test]
    fn test_search_marker_held_back() {
        let mut renderer = Renderer::default();
        assert_eq!(renderer.update(&streaming(2, "Let me check. [SEA")), "assistant> Let me check. ");
        assert_eq!(renderer.update(&streaming(2, "Let me check. [SEARCH: \"rust")), "");

        let searching = ConversationSession {
            status: SessionStatus::searching("rust"),
            ..Default::default()
        };
        assert_eq!(
            renderer.update(&searching),
            "\n[AI is searching the web...] rust\n"
        );
    }

    #[test]
    fn test_partial_marker_released_when_not_a_marker() {
        let mut renderer = Renderer::default();
        assert_eq!(renderer.update(&streaming(2, "see [")), "assistant> see ");
        assert_eq!(renderer.update(&streaming(2, "see [1]")), "[1]");
        assert_eq!(shown_len("call web_search(query=\"x\")"), 5);
        assert_eq!(shown_len("plain"), 5);
    }

    #[test]
    fn test_non_streamed_answer_printed_whole() {
        let mut renderer = Renderer::default();
        let mut session = ConversationSession::default();
        session.turns.push(ChatTurn::new(1, Message::user("hi")));
        session.turns.push(ChatTurn::new(2, Message::assistant("Hello")));
        assert_eq!(renderer.update(&session), "assistant> Hello\n");
    }

    #[test]
    fn test_cancel_closes_the_draft_line() {
        let mut renderer = Renderer::default();
        renderer.update(&streaming(2, "Once"));

        let cancelled = ConversationSession {
            status: SessionStatus::settled(Phase::Cancelled),
            ..Default::default()
        };
        assert_eq!(renderer.update(&cancelled), "\n[cancelled]\n");
    }

    #[test]
    fn test_banners_printed_once() {
        let mut renderer = Renderer::default();
        let session = ConversationSession {
            error: Some(Banner { id: 9, message: "Server unreachable".into() }),
            ..Default::default()
        };
        assert_eq!(renderer.update(&session), "[error] Server unreachable\n");
        assert_eq!(renderer.update(&session), "");
    }

    #[test]
    fn test_search_status_line() {
        let mut renderer = Renderer::default();
        let session = ConversationSession {
            status: SessionStatus::searching("rust 1.85"),
            ..Default::default()
        };
        assert_eq!(
            renderer.update(&session),
            "[AI is searching the web...] rust 1.85\n"
        );
    }

    #[test]
    fn test_history_lists_turns() {
        let mut session = ConversationSession::default();
        assert_eq!(history(&session), "(no messages)\n");
        session.turns.push(ChatTurn::new(
            1,
            Message::user("look").with_images(vec!["aGk=".into()]),
        ));
        assert_eq!(history(&session), "#1 user> look [1 image(s)]\n");
    }
}
