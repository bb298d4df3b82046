//! Native dialog auto-handling
//!
//! The console raises `confirm()` dialogs on save and delete. Playwright
//! stalls the triggering action until a raised dialog is resolved, so every
//! dialog must be answered. Tests subscribe with [`Page::on_dialog`]
//! (matcher + resolution + lifetime) and get back a [`DialogSubscription`]
//! that deregisters on drop.
//!
//! Resolution happens synchronously in the driver's event reader, never on
//! the task that triggered the dialog. The newest matching subscription
//! wins. Dialogs nobody subscribed to fall through to the
//! [`UnhandledDialogPolicy`]; they are logged and flagged `unexpected` in
//! the page's dialog log so a test can assert none slipped through.
//!
//! [`Page::on_dialog`]: crate::page::Page::on_dialog

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub type PageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Alert,
    Confirm,
    Prompt,
    Beforeunload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Accept { prompt_text: Option<String> },
    Dismiss,
}

impl Resolution {
    pub fn accept() -> Self {
        Resolution::Accept { prompt_text: None }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Resolution::Accept { .. })
    }
}

/// Which dialogs a subscription applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMatcher {
    Any,
    Kind(DialogKind),
    MessageContains(String),
}

impl DialogMatcher {
    pub fn contains(keyword: impl Into<String>) -> Self {
        DialogMatcher::MessageContains(keyword.into())
    }

    pub fn matches(&self, kind: DialogKind, message: &str) -> bool {
        match self {
            DialogMatcher::Any => true,
            DialogMatcher::Kind(k) => *k == kind,
            DialogMatcher::MessageContains(keyword) => message.contains(keyword.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Resolve the next matching dialog, then deregister
    Once,
    /// Resolve every matching dialog until unsubscribed
    Persistent,
}

/// Fallback for dialogs no subscription matched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledDialogPolicy {
    #[default]
    Accept,
    Dismiss,
}

impl UnhandledDialogPolicy {
    pub fn resolution(&self) -> Resolution {
        match self {
            UnhandledDialogPolicy::Accept => Resolution::accept(),
            UnhandledDialogPolicy::Dismiss => Resolution::Dismiss,
        }
    }
}

/// A dialog observed on a page and how it was answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogEvent {
    pub page: PageId,
    pub kind: DialogKind,
    pub message: String,
    pub default_value: String,
    pub resolution: Resolution,
    pub handled_by: Option<SubscriptionId>,
    pub unexpected: bool,
}

/// Outcome of matching one dialog against the subscriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub resolution: Resolution,
    pub handled_by: Option<SubscriptionId>,
}

#[derive(Debug)]
struct Entry {
    id: SubscriptionId,
    matcher: DialogMatcher,
    resolution: Resolution,
    lifetime: Lifetime,
}

/// Subscriptions of one page
#[derive(Debug)]
pub struct DialogHandlers {
    next_id: u64,
    entries: Vec<Entry>,
    fallback: UnhandledDialogPolicy,
}

impl DialogHandlers {
    pub fn new(fallback: UnhandledDialogPolicy) -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
            fallback,
        }
    }

    pub fn subscribe(&mut self, matcher: DialogMatcher, resolution: Resolution, lifetime: Lifetime) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            matcher,
            resolution,
            lifetime,
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn is_active(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick the resolution for a dialog. One-shot subscriptions are consumed.
    pub fn resolve(&mut self, kind: DialogKind, message: &str) -> Decision {
        let matched = self
            .entries
            .iter()
            .rposition(|e| e.matcher.matches(kind, message));

        match matched {
            Some(pos) => {
                let entry = &self.entries[pos];
                let decision = Decision {
                    resolution: entry.resolution.clone(),
                    handled_by: Some(entry.id),
                };
                if entry.lifetime == Lifetime::Once {
                    self.entries.remove(pos);
                }
                decision
            }
            None => Decision {
                resolution: self.fallback.resolution(),
                handled_by: None,
            },
        }
    }
}

#[derive(Debug)]
struct PageDialogs {
    handlers: DialogHandlers,
    log: Vec<DialogEvent>,
}

/// Dialog state for every page of one driver
#[derive(Debug)]
pub struct DialogRouter {
    fallback: UnhandledDialogPolicy,
    pages: Mutex<HashMap<PageId, PageDialogs>>,
}

impl DialogRouter {
    pub fn new(fallback: UnhandledDialogPolicy) -> Self {
        Self {
            fallback,
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_page(&self, page: PageId) {
        self.pages.lock().insert(
            page,
            PageDialogs {
                handlers: DialogHandlers::new(self.fallback),
                log: Vec::new(),
            },
        );
    }

    pub fn remove_page(&self, page: PageId) {
        self.pages.lock().remove(&page);
    }

    pub fn subscribe(
        self: &Arc<Self>,
        page: PageId,
        matcher: DialogMatcher,
        resolution: Resolution,
        lifetime: Lifetime,
    ) -> DialogSubscription {
        let mut pages = self.pages.lock();
        let state = pages.entry(page).or_insert_with(|| PageDialogs {
            handlers: DialogHandlers::new(self.fallback),
            log: Vec::new(),
        });
        let id = state.handlers.subscribe(matcher, resolution, lifetime);
        debug!("Dialog subscription {:?} on page {} ({:?})", id, page, lifetime);

        DialogSubscription {
            router: Arc::downgrade(self),
            page,
            id,
        }
    }

    fn unsubscribe(&self, page: PageId, id: SubscriptionId) -> bool {
        self.pages
            .lock()
            .get_mut(&page)
            .map(|state| state.handlers.unsubscribe(id))
            .unwrap_or(false)
    }

    fn is_active(&self, page: PageId, id: SubscriptionId) -> bool {
        self.pages
            .lock()
            .get(&page)
            .map(|state| state.handlers.is_active(id))
            .unwrap_or(false)
    }

    /// Decide how to answer a dialog raised on `page` and record it.
    pub fn dispatch(&self, page: PageId, kind: DialogKind, message: &str, default_value: &str) -> Resolution {
        let mut pages = self.pages.lock();

        let decision = match pages.get_mut(&page) {
            Some(state) => state.handlers.resolve(kind, message),
            None => Decision {
                resolution: self.fallback.resolution(),
                handled_by: None,
            },
        };

        let unexpected = decision.handled_by.is_none();
        if unexpected {
            warn!(
                "Unexpected {:?} dialog on page {}: {:?}; resolving with {:?}",
                kind, page, message, decision.resolution
            );
        } else {
            debug!("{:?} dialog on page {} handled by {:?}: {:?}", kind, page, decision.handled_by, message);
        }

        let event = DialogEvent {
            page,
            kind,
            message: message.to_string(),
            default_value: default_value.to_string(),
            resolution: decision.resolution.clone(),
            handled_by: decision.handled_by,
            unexpected,
        };
        if let Some(state) = pages.get_mut(&page) {
            state.log.push(event);
        }

        decision.resolution
    }

    /// Drain the dialogs recorded for `page`
    pub fn take_log(&self, page: PageId) -> Vec<DialogEvent> {
        self.pages
            .lock()
            .get_mut(&page)
            .map(|state| std::mem::take(&mut state.log))
            .unwrap_or_default()
    }
}

/// Deregistration handle returned by `on_dialog`; dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct DialogSubscription {
    router: Weak<DialogRouter>,
    page: PageId,
    id: SubscriptionId,
}

impl DialogSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// False once a one-shot subscription has fired or it was removed
    pub fn is_active(&self) -> bool {
        self.router
            .upgrade()
            .map(|router| router.is_active(self.page, self.id))
            .unwrap_or(false)
    }

    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for DialogSubscription {
    fn drop(&mut self) {
        if let Some(router) = self.router.upgrade() {
            router.unsubscribe(self.page, self.id);
        }
    }
}
