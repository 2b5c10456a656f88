//! Navigation controller.
//!
//! Owns the content cache and the supersession token. Every navigation
//! issues its fetch immediately, stores the handle in the cache, and spawns
//! a completion task. When the handle resolves the task takes the state
//! lock, compares its token with the current one, and only then writes
//! history and switches the active key.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rsc_core::{
    Location, NavigationKey, NavigationKind, NavigationObserver, NavigationPhase,
    NavigationToken, NavigatorConfig,
};
use rsc_fetch::{Content, ContentFetcher, ContentHandle, ContentRequest, FetchError};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::{ContentCache, HistoryStore, NavigationError, RenderEvent, RouterSnapshot, RouterState};

/// Callback the render layer registers to hear about key switches.
pub type RenderCallback = Arc<dyn Fn(RenderEvent) + Send + Sync>;

/// Options for [`NavigationController::navigate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
    /// Reuse this key instead of minting a fresh one.
    pub key: Option<NavigationKey>,
}

impl NavigateOptions {
    /// Push a new history entry under a fresh key.
    pub fn push() -> Self {
        Self::default()
    }

    /// Replace the current history entry under a fresh key.
    pub fn replace() -> Self {
        Self {
            replace: true,
            key: None,
        }
    }

    /// Use an explicit key.
    pub fn with_key(mut self, key: NavigationKey) -> Self {
        self.key = Some(key);
        self
    }
}

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// The navigation was still current when its content drained.
    Committed {
        key: NavigationKey,
        location: Location,
    },
    /// A later navigation started first. Nothing visible changed.
    Superseded { key: NavigationKey },
    /// The fetch failed while the navigation was current.
    Failed {
        key: NavigationKey,
        error: FetchError,
    },
}

impl NavigationOutcome {
    /// Key the navigation was issued under.
    pub fn key(&self) -> &NavigationKey {
        match self {
            Self::Committed { key, .. } | Self::Superseded { key } | Self::Failed { key, .. } => {
                key
            }
        }
    }

    /// Whether the navigation became visible.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    fn phase(&self) -> NavigationPhase {
        match self {
            Self::Committed { .. } => NavigationPhase::Committed,
            Self::Superseded { .. } => NavigationPhase::Superseded,
            Self::Failed { error, .. } => NavigationPhase::Failed(error.to_string()),
        }
    }
}

/// A navigation whose completion task is running.
///
/// Dropping this does not cancel anything; the navigation still completes
/// or is superseded in the background.
#[derive(Debug)]
pub struct PendingNavigation {
    key: NavigationKey,
    token: NavigationToken,
    task: JoinHandle<NavigationOutcome>,
}

impl PendingNavigation {
    /// Key the navigation was issued under.
    pub fn key(&self) -> &NavigationKey {
        &self.key
    }

    /// Token the navigation was issued with.
    pub fn token(&self) -> NavigationToken {
        self.token
    }

    /// Wait for the navigation to commit, fail, or be superseded.
    pub async fn outcome(self) -> Result<NavigationOutcome, NavigationError> {
        self.task
            .await
            .map_err(|e| NavigationError::Task(e.to_string()))
    }
}

struct NavigatorState {
    cache: ContentCache,
    active_key: NavigationKey,
    current_token: NavigationToken,
    /// Key of the navigation holding `current_token`, until it settles.
    in_flight: Option<NavigationKey>,
    router: RouterState,
    epoch: u64,
}

/// A fetch in flight, with what to do once it drains.
struct Job {
    token: NavigationToken,
    key: NavigationKey,
    location: Location,
    kind: NavigationKind,
    handle: ContentHandle,
    started: Instant,
}

struct ControllerInner<F, H> {
    config: NavigatorConfig,
    fetcher: Arc<F>,
    history: Arc<H>,
    runtime: Handle,
    observer: Option<Arc<dyn NavigationObserver>>,
    render: Mutex<Option<RenderCallback>>,
    state: Mutex<NavigatorState>,
}

impl<F: ContentFetcher, H: HistoryStore> ControllerInner<F, H> {
    fn lock_state(&self) -> MutexGuard<'_, NavigatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observe(&self, kind: NavigationKind, phase: &NavigationPhase, elapsed: Duration) {
        if let Some(observer) = &self.observer {
            observer.on_phase(kind, phase, elapsed);
        }
    }

    fn notify(&self, event: RenderEvent) {
        let callback = self
            .render
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    fn fetch(&self, request: ContentRequest) -> ContentHandle {
        ContentHandle::fetch(Arc::clone(&self.fetcher), request)
    }

    fn evict(&self, state: &mut NavigatorState, incoming: &NavigationKey) {
        if state.cache.capacity().is_none() {
            return;
        }

        let history_key = self.history.current().key;
        let active = state.active_key.clone();
        let in_flight = state.in_flight.clone();
        let mut protected = vec![&active, incoming];
        protected.extend(history_key.as_ref());
        protected.extend(in_flight.as_ref());

        for key in state.cache.evict(&protected) {
            tracing::debug!(key = %key, "evicted cached content");
        }
    }

    async fn complete(self: Arc<Self>, job: Job) -> NavigationOutcome {
        let result = job.handle.read().await;

        let (outcome, event) = self.settle(&job, result);
        if let Some(event) = event {
            self.notify(event);
        }

        self.observe(job.kind, &outcome.phase(), job.started.elapsed());
        outcome
    }

    /// Apply a drained result under the state lock.
    fn settle(
        &self,
        job: &Job,
        result: Result<Arc<Content>, FetchError>,
    ) -> (NavigationOutcome, Option<RenderEvent>) {
        let mut state = self.lock_state();

        // Action results belong to the current entry whether or not the
        // switch below happens. A failed action only fills a missing slot.
        if job.kind == NavigationKind::Action
            && (result.is_ok() || !state.cache.contains(&job.key))
        {
            state.cache.insert(job.key.clone(), job.handle.clone());
            self.evict(&mut state, &job.key);
        }

        if state.current_token != job.token {
            tracing::debug!(
                key = %job.key,
                location = %job.location,
                kind = %job.kind,
                token = %job.token,
                "navigation superseded"
            );
            return (
                NavigationOutcome::Superseded {
                    key: job.key.clone(),
                },
                None,
            );
        }

        // An action only re-renders the entry it was issued against.
        if job.kind == NavigationKind::Action
            && self.history.current().key.as_ref() != Some(&job.key)
        {
            tracing::debug!(
                key = %job.key,
                location = %job.location,
                "action entry no longer current"
            );
            return (
                NavigationOutcome::Superseded {
                    key: job.key.clone(),
                },
                None,
            );
        }

        if job.kind != NavigationKind::Action {
            state.in_flight = None;
        }

        match result {
            Ok(_) => {
                if job.kind.mutates_history() {
                    if job.kind == NavigationKind::Replace {
                        self.history.replace(job.key.clone(), job.location.clone());
                    } else {
                        self.history.push(job.key.clone(), job.location.clone());
                    }
                } else if job.kind == NavigationKind::Pop && self.config.refresh_on_pop {
                    state.cache.insert(job.key.clone(), job.handle.clone());
                }

                state.active_key = job.key.clone();
                if job.kind != NavigationKind::Action {
                    state.router.commit(job.location.clone());
                }
                state.epoch += 1;

                tracing::debug!(
                    key = %job.key,
                    location = %job.location,
                    kind = %job.kind,
                    epoch = state.epoch,
                    "navigation committed"
                );

                let event = RenderEvent {
                    key: job.key.clone(),
                    epoch: state.epoch,
                    forced: job.kind == NavigationKind::Action,
                };
                let outcome = NavigationOutcome::Committed {
                    key: job.key.clone(),
                    location: job.location.clone(),
                };
                (outcome, Some(event))
            }
            Err(error) => {
                tracing::debug!(
                    key = %job.key,
                    location = %job.location,
                    kind = %job.kind,
                    error = %error,
                    "navigation failed"
                );

                let outcome = NavigationOutcome::Failed {
                    key: job.key.clone(),
                    error,
                };
                if job.kind == NavigationKind::Action {
                    return (outcome, None);
                }

                // The failed handle becomes active so readers see the error.
                state.active_key = job.key.clone();
                if job.kind == NavigationKind::Pop {
                    state.router.commit(job.location.clone());
                } else {
                    state.router.abandon();
                }
                state.epoch += 1;

                let event = RenderEvent {
                    key: job.key.clone(),
                    epoch: state.epoch,
                    forced: false,
                };
                (outcome, Some(event))
            }
        }
    }
}

/// Builder for a [`NavigationController`].
pub struct NavigatorBuilder<F, H> {
    config: NavigatorConfig,
    fetcher: Arc<F>,
    history: Arc<H>,
    observer: Option<Arc<dyn NavigationObserver>>,
    render: Option<RenderCallback>,
}

impl<F: ContentFetcher, H: HistoryStore> NavigatorBuilder<F, H> {
    /// Report lifecycle phases to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn NavigationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register the render callback before the initial load starts.
    pub fn with_render<C>(mut self, callback: C) -> Self
    where
        C: Fn(RenderEvent) + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(callback));
        self
    }

    /// Start the session.
    ///
    /// Reads the current history entry, keys it if it has no key yet, and
    /// issues the initial content fetch. Must be called from within a tokio
    /// runtime; completion tasks are spawned onto it.
    pub fn start(self) -> Result<NavigationController<F, H>, NavigationError> {
        self.config.validate()?;
        let runtime = Handle::try_current().map_err(|e| NavigationError::Task(e.to_string()))?;

        let entry = self.history.current();
        let key = match entry.key {
            Some(key) => key,
            None => {
                let key = NavigationKey::generate();
                self.history.replace(key.clone(), entry.location.clone());
                key
            }
        };

        let request = ContentRequest::content(&self.config, &entry.location)?;
        let handle = ContentHandle::fetch(Arc::clone(&self.fetcher), request);
        let token = NavigationToken::next();

        let mut cache = ContentCache::bounded(self.config.cache_capacity);
        cache.insert(key.clone(), handle.clone());

        let state = NavigatorState {
            cache,
            active_key: key.clone(),
            current_token: token,
            in_flight: Some(key.clone()),
            router: RouterState::idle(entry.location.clone()),
            epoch: 0,
        };

        tracing::info!(
            key = %key,
            location = %entry.location,
            "navigation session started"
        );

        let controller = NavigationController {
            inner: Arc::new(ControllerInner {
                config: self.config,
                fetcher: self.fetcher,
                history: self.history,
                runtime,
                observer: self.observer,
                render: Mutex::new(self.render),
                state: Mutex::new(state),
            }),
        };

        controller.launch(Job {
            token,
            key,
            location: entry.location,
            kind: NavigationKind::Initial,
            handle,
            started: Instant::now(),
        });

        Ok(controller)
    }
}

/// Coordinates navigations, history and the content cache for one session.
///
/// Cloning is cheap; clones share the same session.
pub struct NavigationController<F, H> {
    inner: Arc<ControllerInner<F, H>>,
}

impl<F, H> Clone for NavigationController<F, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ContentFetcher, H: HistoryStore> NavigationController<F, H> {
    /// Create a builder for a session.
    pub fn builder(config: NavigatorConfig, fetcher: Arc<F>, history: Arc<H>) -> NavigatorBuilder<F, H> {
        NavigatorBuilder {
            config,
            fetcher,
            history,
            observer: None,
            render: None,
        }
    }

    /// Start a session with no observer or render callback.
    pub fn start(
        config: NavigatorConfig,
        fetcher: Arc<F>,
        history: Arc<H>,
    ) -> Result<Self, NavigationError> {
        Self::builder(config, fetcher, history).start()
    }

    fn launch(&self, job: Job) -> PendingNavigation {
        tracing::debug!(
            key = %job.key,
            location = %job.location,
            kind = %job.kind,
            token = %job.token,
            "navigation started"
        );
        self.inner
            .observe(job.kind, &NavigationPhase::Started, Duration::ZERO);

        let key = job.key.clone();
        let token = job.token;
        let inner = Arc::clone(&self.inner);
        let task = self.inner.runtime.spawn(inner.complete(job));

        PendingNavigation { key, token, task }
    }

    /// Navigate to `target`.
    ///
    /// The fetch is issued and cached under the navigation's key right away.
    /// History is written and the active key switched only if no other
    /// navigation has started by the time the content drains.
    pub fn navigate(
        &self,
        target: &str,
        options: NavigateOptions,
    ) -> Result<PendingNavigation, NavigationError> {
        let location = Location::parse(target)?;
        let kind = if options.replace {
            NavigationKind::Replace
        } else {
            NavigationKind::Push
        };
        let key = options.key.unwrap_or_else(NavigationKey::generate);
        let request = ContentRequest::content(&self.inner.config, &location)?;
        let handle = self.inner.fetch(request);

        let token = {
            let mut state = self.inner.lock_state();
            let token = NavigationToken::next();
            state.current_token = token;
            state.in_flight = Some(key.clone());
            state.router.begin(location.clone());
            state.cache.insert(key.clone(), handle.clone());
            self.inner.evict(&mut state, &key);
            token
        };

        Ok(self.launch(Job {
            token,
            key,
            location,
            kind,
            handle,
            started: Instant::now(),
        }))
    }

    /// React to the history owner moving back or forward.
    ///
    /// Never writes history. Content is always refetched; the cache keeps
    /// whatever handle it already holds for the entry's key.
    pub fn handle_pop_event(&self) -> Result<PendingNavigation, NavigationError> {
        let (job, token) = {
            let mut state = self.inner.lock_state();
            let entry = self.inner.history.current();

            let key = match entry.key {
                Some(key) => {
                    if !state.cache.contains(&key) {
                        tracing::warn!(
                            key = %key,
                            location = %entry.location,
                            "popped entry has no cached content, refetching"
                        );
                    }
                    key
                }
                None => {
                    let key = NavigationKey::generate();
                    tracing::warn!(
                        key = %key,
                        location = %entry.location,
                        "popped entry has no navigation key, minted one"
                    );
                    key
                }
            };

            let request = ContentRequest::content(&self.inner.config, &entry.location)?;
            let handle = self.inner.fetch(request);

            let token = NavigationToken::next();
            state.current_token = token;
            state.in_flight = Some(key.clone());
            state.router.begin(entry.location.clone());
            if state.cache.insert_if_absent(key.clone(), handle.clone()) {
                self.inner.evict(&mut state, &key);
            }

            let job = Job {
                token,
                key,
                location: entry.location,
                kind: NavigationKind::Pop,
                handle,
                started: Instant::now(),
            };
            (job, token)
        };

        tracing::trace!(token = %token, "pop event");
        Ok(self.launch(job))
    }

    /// Invoke a server action against the current history entry.
    ///
    /// Once the response drains, its content is cached under the entry's key
    /// and that key is re-rendered, unless a navigation started in the
    /// meantime or the entry is no longer current. Returns the action's
    /// return value.
    pub async fn call_server<A>(
        &self,
        action_id: &str,
        args: &A,
    ) -> Result<serde_json::Value, NavigationError>
    where
        A: Serialize + ?Sized,
    {
        let job = {
            let state = self.inner.lock_state();
            let entry = self.inner.history.current();
            let request =
                ContentRequest::action(&self.inner.config, &entry.location, action_id, args)?;

            let key = match entry.key {
                Some(key) => key,
                None => {
                    let key = NavigationKey::generate();
                    self.inner.history.replace(key.clone(), entry.location.clone());
                    key
                }
            };

            Job {
                token: state.current_token,
                key,
                location: entry.location,
                kind: NavigationKind::Action,
                handle: self.inner.fetch(request),
                started: Instant::now(),
            }
        };
        let handle = job.handle.clone();
        let pending = self.launch(job);

        if let NavigationOutcome::Failed { error, .. } = pending.outcome().await? {
            return Err(error.into());
        }

        let content = handle.read().await?;
        Ok(content
            .return_value
            .clone()
            .unwrap_or(serde_json::Value::Null))
    }

    /// Replace the render callback.
    pub fn subscribe<C>(&self, callback: C)
    where
        C: Fn(RenderEvent) + Send + Sync + 'static,
    {
        *self
            .inner
            .render
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    /// Drop the render callback.
    pub fn unsubscribe(&self) {
        *self
            .inner
            .render
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current router state, active key and render epoch.
    pub fn snapshot(&self) -> RouterSnapshot {
        let state = self.inner.lock_state();
        RouterSnapshot {
            router: state.router.clone(),
            active_key: state.active_key.clone(),
            epoch: state.epoch,
        }
    }

    /// Key whose content should be rendered.
    pub fn active_key(&self) -> NavigationKey {
        self.inner.lock_state().active_key.clone()
    }

    /// Handle for the active key.
    pub fn active_content(&self) -> Result<ContentHandle, NavigationError> {
        let state = self.inner.lock_state();
        state
            .cache
            .get(&state.active_key)
            .cloned()
            .ok_or_else(|| NavigationError::MissingContent(state.active_key.clone()))
    }

    /// Wait for the active content. A failed fetch surfaces as an error.
    pub async fn read_active(&self) -> Result<Arc<Content>, NavigationError> {
        let handle = self.active_content()?;
        Ok(handle.read().await?)
    }

    /// Cached handle for a key.
    pub fn cached(&self, key: &NavigationKey) -> Option<ContentHandle> {
        self.inner.lock_state().cache.get(key).cloned()
    }

    /// Cached keys in insertion order.
    pub fn cache_keys(&self) -> Vec<NavigationKey> {
        self.inner.lock_state().cache.keys().cloned().collect()
    }

    /// Number of cached entries.
    pub fn cache_len(&self) -> usize {
        self.inner.lock_state().cache.len()
    }

    /// Session configuration.
    pub fn config(&self) -> &NavigatorConfig {
        &self.inner.config
    }

    /// History store driving this session.
    pub fn history(&self) -> &Arc<H> {
        &self.inner.history
    }

    /// Fetcher serving this session.
    pub fn fetcher(&self) -> &Arc<F> {
        &self.inner.fetcher
    }
}

impl<F, H> fmt::Debug for NavigationController<F, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HistoryEntry, MemoryHistory};
    use rsc_fetch::{ContentResponse, GatedFetcher, ScriptedFetcher};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn loc(s: &str) -> Location {
        Location::parse(s).unwrap()
    }

    fn scripted() -> Arc<ScriptedFetcher> {
        Arc::new(
            ScriptedFetcher::new()
                .route("/", "home")
                .route("/ships", "ships")
                .route("/ships/1", "ship one"),
        )
    }

    #[tokio::test]
    async fn test_start_keys_unkeyed_entry() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let nav = NavigationController::start(NavigatorConfig::default(), scripted(), history.clone())
            .unwrap();

        let entry = history.current();
        assert_eq!(entry.key, Some(nav.active_key()));
        assert_eq!(history.len(), 1);
        assert_eq!(history.mutations().replaces, 1);

        let content = nav.read_active().await.unwrap();
        assert_eq!(content.root_str(), Some("home"));
    }

    #[tokio::test]
    async fn test_start_reuses_existing_key() {
        let key = NavigationKey::from("restored");
        let history = Arc::new(MemoryHistory::with_entry(HistoryEntry::new(
            key.clone(),
            loc("/ships"),
        )));
        let nav = NavigationController::start(NavigatorConfig::default(), scripted(), history.clone())
            .unwrap();

        assert_eq!(nav.active_key(), key);
        assert_eq!(history.mutations().replaces, 0);
        assert_eq!(nav.snapshot().router.location, loc("/ships"));
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_config() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let config = NavigatorConfig::default().with_content_endpoint("rsc");

        let result = NavigationController::start(config, scripted(), history);
        assert!(matches!(result, Err(NavigationError::Config(_))));
    }

    #[tokio::test]
    async fn test_navigate_rejects_invalid_location() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let nav = NavigationController::start(NavigatorConfig::default(), scripted(), history)
            .unwrap();

        let result = nav.navigate("ships", NavigateOptions::push());
        assert!(matches!(result, Err(NavigationError::InvalidLocation(_))));
        assert_eq!(nav.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_navigate_commits_and_renders() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        let nav = NavigationController::builder(NavigatorConfig::default(), scripted(), history.clone())
            .with_render(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .start()
            .unwrap();

        let pending = nav.navigate("/ships", NavigateOptions::push()).unwrap();
        let key = pending.key().clone();
        let outcome = pending.outcome().await.unwrap();

        assert_eq!(
            outcome,
            NavigationOutcome::Committed {
                key: key.clone(),
                location: loc("/ships"),
            }
        );
        assert_eq!(nav.active_key(), key);
        assert_eq!(history.current(), HistoryEntry::new(key, loc("/ships")));

        let snapshot = nav.snapshot();
        assert_eq!(snapshot.router, RouterState::idle(loc("/ships")));
        // Every epoch bump renders exactly once.
        assert_eq!(snapshot.epoch, renders.load(Ordering::SeqCst) as u64);
    }

    #[tokio::test]
    async fn test_pending_entry_visible_before_resolution() {
        let fetcher = Arc::new(GatedFetcher::new());
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let nav = NavigationController::start(NavigatorConfig::default(), fetcher.clone(), history)
            .unwrap();

        let pending = nav.navigate("/ships", NavigateOptions::push()).unwrap();
        let handle = nav.cached(pending.key()).unwrap();
        assert!(handle.is_pending());
        assert!(nav.snapshot().router.is_pending);
        assert_eq!(nav.snapshot().router.next_location, loc("/ships"));

        fetcher
            .release("/ships", ContentResponse::from_bytes("ships"))
            .await;
        assert!(pending.outcome().await.unwrap().is_committed());
        assert!(!handle.is_pending());
    }

    #[tokio::test]
    async fn test_navigate_failure_surfaces_error() {
        let fetcher = Arc::new(GatedFetcher::new());
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let nav = NavigationController::start(NavigatorConfig::default(), fetcher.clone(), history.clone())
            .unwrap();
        fetcher.release("/", ContentResponse::from_bytes("home")).await;

        let pending = nav.navigate("/broken", NavigateOptions::push()).unwrap();
        let key = pending.key().clone();
        fetcher
            .fail("/broken", FetchError::Connection("reset".to_string()))
            .await;

        let outcome = pending.outcome().await.unwrap();
        assert!(matches!(outcome, NavigationOutcome::Failed { .. }));
        assert_eq!(nav.active_key(), key);
        assert_eq!(history.len(), 1);
        assert_eq!(nav.snapshot().router, RouterState::idle(loc("/")));

        let err = nav.read_active().await.unwrap_err();
        assert!(matches!(
            err,
            NavigationError::Fetch(FetchError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_replaces_callback() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let nav = NavigationController::start(NavigatorConfig::default(), scripted(), history)
            .unwrap();
        nav.read_active().await.unwrap();

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let c1 = first.clone();
        nav.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = second.clone();
        nav.subscribe(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        nav.navigate("/ships", NavigateOptions::push())
            .unwrap()
            .outcome()
            .await
            .unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_cache_keeps_active_and_history_keys() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let config = NavigatorConfig::default().with_cache_capacity(2);
        let nav = NavigationController::start(config, scripted(), history.clone()).unwrap();
        let initial = nav.active_key();
        nav.read_active().await.unwrap();

        let first = nav.navigate("/ships", NavigateOptions::push()).unwrap();
        first.outcome().await.unwrap();
        let second = nav.navigate("/ships/1", NavigateOptions::push()).unwrap();
        let second_key = second.key().clone();
        second.outcome().await.unwrap();

        assert_eq!(nav.cache_len(), 2);
        assert!(nav.cached(&initial).is_none());
        assert!(nav.cached(&second_key).is_some());
        let active = nav.cached(&nav.active_key()).unwrap();
        assert_eq!(active.location(), &loc("/ships/1"));
    }

    #[test]
    fn test_navigate_options() {
        assert!(!NavigateOptions::push().replace);
        assert!(NavigateOptions::replace().replace);

        let options = NavigateOptions::push().with_key(NavigationKey::from("k"));
        assert_eq!(options.key, Some(NavigationKey::from("k")));
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let history = Arc::new(MemoryHistory::new(loc("/")));
        let result = NavigationController::start(NavigatorConfig::default(), scripted(), history);

        assert!(matches!(result, Err(NavigationError::Task(_))));
    }
}
