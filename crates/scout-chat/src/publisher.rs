use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::types::{Banner, ConversationSession, EngineConfig};

pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BannerKind {
    Error,
    Info,
}

/// Write side of the observable session.
///
/// Every change is a single read-modify-write under the channel's lock.
/// Changes made on behalf of a run go through [`SessionPublisher::modify_if_live`],
/// which refuses them once that run's token is cancelled.
#[derive(Clone)]
pub struct SessionPublisher {
    sender: Arc<watch::Sender<ConversationSession>>,
    ids: Arc<AtomicU64>,
    error_ttl: Duration,
    info_ttl: Duration,
}

impl SessionPublisher {
    pub fn new(initial: ConversationSession, config: &EngineConfig) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
            ids: Arc::new(AtomicU64::new(1)),
            error_ttl: config.error_banner_ttl,
            info_ttl: config.info_banner_ttl,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSession> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSession {
        self.sender.borrow().clone()
    }

    pub fn model_supports_tools(&self) -> bool {
        self.sender.borrow().model_supports_tools
    }

    pub fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }

    pub fn modify(&self, f: impl FnOnce(&mut ConversationSession)) {
        self.sender.send_modify(f);
    }

    /// Apply `f` unless `token` is already cancelled. Returns whether it ran.
    pub fn modify_if_live(
        &self,
        token: &CancellationToken,
        f: impl FnOnce(&mut ConversationSession),
    ) -> bool {
        self.sender.send_if_modified(|session| {
            if token.is_cancelled() {
                return false;
            }
            f(session);
            true
        })
    }

    pub fn post_error(&self, message: impl Into<String>) {
        let banner = self.banner(message.into());
        let id = banner.id;
        self.sender.send_modify(|s| s.error = Some(banner));
        self.schedule_dismiss(BannerKind::Error, id);
    }

    pub fn post_info(&self, message: impl Into<String>) {
        let banner = self.banner(message.into());
        let id = banner.id;
        self.sender.send_modify(|s| s.info = Some(banner));
        self.schedule_dismiss(BannerKind::Info, id);
    }

    /// Info banner that stays until replaced or dismissed.
    pub fn post_notice(&self, message: impl Into<String>) {
        let banner = self.banner(message.into());
        self.sender.send_modify(|s| s.info = Some(banner));
    }

    /// Error banner on behalf of a run; dropped if the run was cancelled.
    pub fn post_error_if_live(
        &self,
        token: &CancellationToken,
        message: impl Into<String>,
        f: impl FnOnce(&mut ConversationSession),
    ) -> bool {
        let banner = self.banner(message.into());
        let id = banner.id;
        let posted = self.modify_if_live(token, |s| {
            f(s);
            s.error = Some(banner);
        });
        if posted {
            self.schedule_dismiss(BannerKind::Error, id);
        }
        posted
    }

    pub fn dismiss_error(&self) {
        self.sender.send_if_modified(|s| s.error.take().is_some());
    }

    pub fn dismiss_info(&self) {
        self.sender.send_if_modified(|s| s.info.take().is_some());
    }

    fn banner(&self, message: String) -> Banner {
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        Banner {
            id: self.next_id(),
            message,
        }
    }

    /// Clear the banner after its delay, unless a newer one replaced it.
    fn schedule_dismiss(&self, kind: BannerKind, id: u64) {
        let sender = Arc::clone(&self.sender);
        let ttl = match kind {
            BannerKind::Error => self.error_ttl,
            BannerKind::Info => self.info_ttl,
        };
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            sender.send_if_modified(|s| {
                let slot = match kind {
                    BannerKind::Error => &mut s.error,
                    BannerKind::Info => &mut s.info,
                };
                if slot.as_ref().map(|b| b.id) == Some(id) {
                    *slot = None;
                    true
                } else {
                    false
                }
            });
        });
    }
}
