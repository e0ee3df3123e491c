//! Reactive suggestion presenter.
//!
//! Subscribes the suggestion surface to its three inputs (visibility,
//! query text, enablement change notifications), recomputes the pure
//! filter when any of them changes, and publishes complete result lists
//! through a watch channel. The enablement snapshot is fetched once per
//! recomputation; this is the only component that touches the store.
//!
//! Each recomputation carries a monotonically increasing request token.
//! A recomputation only publishes if no newer one has been scheduled or
//! published, so a stale in-flight store read can never overwrite the
//! result of a newer input change. Subscribers always observe either the
//! previous complete list or the new complete list, never a partial one.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use crate::catalog::{Catalog, CommandSpec};
use crate::enablement::EnablementSource;
use crate::filter::suggestions;
use crate::form::ParamForm;

struct Inputs {
    visible: bool,
    query: String,
}

struct Inner {
    catalog: Arc<Catalog>,
    source: Arc<dyn EnablementSource>,
    inputs: Mutex<Inputs>,
    /// Token of the most recently scheduled recomputation.
    scheduled: AtomicU64,
    /// Highest token that has published a result.
    published: AtomicU64,
    tx: watch::Sender<Vec<CommandSpec>>,
    form: Mutex<Option<ParamForm>>,
}

/// Presenter for one suggestion surface. Cheap to clone; clones share the
/// same surface state.
#[derive(Clone)]
pub struct SuggestionPresenter {
    inner: Arc<Inner>,
}

impl SuggestionPresenter {
    pub fn new(catalog: Arc<Catalog>, source: Arc<dyn EnablementSource>) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                catalog,
                source,
                inputs: Mutex::new(Inputs {
                    visible: false,
                    query: String::new(),
                }),
                scheduled: AtomicU64::new(0),
                published: AtomicU64::new(0),
                tx,
                form: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to published suggestion lists.
    pub fn subscribe(&self) -> watch::Receiver<Vec<CommandSpec>> {
        self.inner.tx.subscribe()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.inner.catalog
    }

    /// Show or hide the surface. Hiding publishes an empty list
    /// immediately; showing triggers a store read and recomputation.
    pub fn set_visible(&self, visible: bool) {
        self.lock_inputs().visible = visible;
        self.schedule(false);
    }

    /// Update the user-typed query text.
    pub fn set_query(&self, query: &str) {
        query.clone_into(&mut self.lock_inputs().query);
        self.schedule(false);
    }

    /// The enablement record changed externally; drop the cached snapshot
    /// and recompute.
    pub fn notify_enablement_changed(&self) {
        self.schedule(true);
    }

    /// Select a command from the suggestion list, instantiating its
    /// parameter form. Any prior uncommitted form for this surface is
    /// cancelled and discarded; only one form is live at a time. Returns
    /// false if the trigger is not in the catalog.
    pub fn select(&self, trigger: &str) -> bool {
        let Some(spec) = self.inner.catalog.find(trigger) else {
            return false;
        };
        let mut slot = self.lock_form();
        if let Some(prior) = slot.as_mut() {
            // Already-terminal forms have nothing left to discard.
            let _ = prior.cancel();
        }
        *slot = Some(ParamForm::new(spec));
        true
    }

    /// Run a closure against the live form, if any.
    pub fn with_form<R>(&self, f: impl FnOnce(&mut ParamForm) -> R) -> Option<R> {
        self.lock_form().as_mut().map(f)
    }

    pub fn has_form(&self) -> bool {
        self.lock_form().is_some()
    }

    /// Take the live form out of the surface, leaving none.
    pub fn take_form(&self) -> Option<ParamForm> {
        self.lock_form().take()
    }

    /// Cancel and discard the live form, if any.
    pub fn close_form(&self) {
        if let Some(mut form) = self.lock_form().take() {
            let _ = form.cancel();
        }
    }

    fn lock_inputs(&self) -> std::sync::MutexGuard<'_, Inputs> {
        // Inputs are only touched from the UI thread and the lock is never
        // held across an await, so poisoning cannot occur in practice.
        match self.inner.inputs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_form(&self) -> std::sync::MutexGuard<'_, Option<ParamForm>> {
        match self.inner.form.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Schedule a recomputation tagged with the next request token.
    fn schedule(&self, invalidate: bool) {
        let token = self.inner.scheduled.fetch_add(1, Ordering::SeqCst) + 1;
        let (visible, query) = {
            let inputs = self.lock_inputs();
            (inputs.visible, inputs.query.clone())
        };

        if !visible {
            // No store read needed; publish the empty list right away so
            // any in-flight read for an older token gets discarded.
            self.publish(token, Vec::new());
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if invalidate {
                inner.source.invalidate().await;
            }
            let snapshot = inner.source.snapshot().await;
            if inner.scheduled.load(Ordering::SeqCst) != token {
                tracing::trace!(token, "discarding superseded suggestion recompute");
                return;
            }
            let list: Vec<CommandSpec> = suggestions(&inner.catalog, &snapshot, &query)
                .into_iter()
                .cloned()
                .collect();
            Self { inner }.publish(token, list);
        });
    }

    /// Publish a complete result, unless a newer token already has.
    fn publish(&self, token: u64, list: Vec<CommandSpec>) {
        if self.inner.published.fetch_max(token, Ordering::SeqCst) < token {
            self.inner.tx.send_replace(list);
        } else {
            tracing::trace!(token, "dropping stale suggestion result");
        }
    }
}
