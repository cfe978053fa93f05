//! Session gateway: the single owner of authentication state.
//!
//! Wraps an [`IdentityProvider`], mirrors the current session locally,
//! fans session changes out to subscribers and sends the user back to the
//! login entry point whenever no session remains.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::errors::SmartSpaceError;
use crate::models::{Session, SessionEvent, SessionEventKind};
use crate::notify::{Notice, Notifier};
use crate::session::forms::{ForgotPasswordForm, SignInForm, SignUpForm};
use crate::session::provider::IdentityProvider;
use crate::storage::ProfileStore;

/// Moves the user to the unauthenticated entry point
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Navigator for headless use: records the redirect in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self) {
        info!("No active session, login required");
    }
}

type Callback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback>,
}

/// Registration of a session change callback; dropping it unregisters
/// the callback
#[must_use = "dropping the subscription unregisters the callback"]
pub struct SessionSubscription {
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            let mut subscribers = subscribers.lock().unwrap_or_else(|e| e.into_inner());
            subscribers.callbacks.remove(&self.id);
        }
    }
}

/// Outcome of asking the provider about the cached session
enum Verification {
    NoSession,
    Valid(Session),
    Refreshed(Session),
    Rejected,
}

impl Verification {
    fn confirms_session(&self) -> bool {
        matches!(self, Verification::Valid(_) | Verification::Refreshed(_))
    }
}

/// Result of applying a verification to the mirror
enum Settled {
    Current(Option<Session>),
    /// The session changed while the provider was asked; nothing was applied
    Stale,
}

pub struct SessionGateway {
    provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    store: Option<ProfileStore>,
    timeout: Duration,
    cached: RwLock<Option<Session>>,
    subscribers: Arc<Mutex<Subscribers>>,
    /// Moves on every session change and on `cancel_pending_checks`
    generation: AtomicU64,
}

impl SessionGateway {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            navigator,
            notifier,
            store: None,
            timeout,
            cached: RwLock::new(None),
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Persist the session in `store` and resume the one already there
    pub fn with_store(mut self, store: ProfileStore) -> Self {
        if let Some(session) = store.load_session() {
            debug!("Resuming stored session of user {}", session.user.id);
            *self.cached.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
        }
        self.store = Some(store);
        self
    }

    /// The locally mirrored session, without asking the provider
    pub fn current_session(&self) -> Option<Session> {
        self.cached
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Register a callback for session changes
    pub fn on_session_changed<F>(&self, callback: F) -> SessionSubscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.callbacks.insert(id, Arc::new(callback));
        SessionSubscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .callbacks
            .len()
    }

    /// Ask the provider for the current session and update the local mirror.
    ///
    /// Provider failures are notified and reported as no session; the
    /// mirror is left as it was. An answer that arrives after the session
    /// changed is discarded in favor of the newer state.
    pub async fn get_session(&self) -> Option<Session> {
        let ticket = self.ticket();
        match self.verify().await {
            Ok(verification) => match self.settle(ticket, verification) {
                Settled::Current(session) => session,
                Settled::Stale => {
                    debug!("Discarding stale session lookup");
                    self.current_session()
                }
            },
            Err(e) if self.is_stale(ticket) => {
                debug!("Ignoring failure of stale session lookup: {}", e);
                self.current_session()
            }
            Err(e) => {
                error!("Failed to get session: {}", e);
                self.notifier.notify(Notice::error(
                    "Error",
                    "The session could not be verified",
                ));
                None
            }
        }
    }

    /// Whether a valid session exists; redirects to login when it does not.
    ///
    /// A check overtaken by a session change or
    /// [`Self::cancel_pending_checks`] applies nothing and never redirects.
    /// It passes only if the provider confirmed the session and a session is
    /// still cached. Concurrent checks do not invalidate each other.
    pub async fn check_auth(&self) -> bool {
        let ticket = self.ticket();
        let result = self.verify().await;

        match result {
            Ok(Verification::NoSession) => {
                if !self.is_stale(ticket) {
                    self.navigator.redirect_to_login();
                }
                false
            }
            // a rejected session redirects through the signed-out event
            Ok(verification) => {
                let confirmed = verification.confirms_session();
                match self.settle(ticket, verification) {
                    Settled::Current(session) => session.is_some(),
                    Settled::Stale => {
                        debug!("Discarding stale auth check");
                        confirmed && self.current_session().is_some()
                    }
                }
            }
            Err(e) if self.is_stale(ticket) => {
                debug!("Ignoring failure of stale auth check: {}", e);
                false
            }
            Err(e) => {
                error!("Error checking auth: {}", e);
                self.notifier.notify(Notice::error(
                    "Error",
                    "Authentication could not be verified",
                ));
                self.navigator.redirect_to_login();
                false
            }
        }
    }

    /// Invalidate in-flight auth checks, e.g. when their consumer goes away
    pub fn cancel_pending_checks(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn sign_in(&self, form: SignInForm) -> Result<Session, SmartSpaceError> {
        form.validate()?;
        let email = form.email.trim();
        match self
            .call("sign in", self.provider.sign_in_with_password(email, &form.password))
            .await
        {
            Ok(session) => {
                info!("Signed in as {}", session.user.id);
                self.handle_provider_event(SessionEvent::new(
                    SessionEventKind::SignedIn,
                    Some(session.clone()),
                ));
                Ok(session)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error("Error", "Could not sign in"));
                Err(e)
            }
        }
    }

    /// Register an account; the display name goes into the user metadata.
    /// Returns the session when the provider signs the user in right away.
    pub async fn sign_up(&self, form: SignUpForm) -> Result<Option<Session>, SmartSpaceError> {
        form.validate()?;
        let metadata = json!({ "name": form.name.trim() });
        let result = self
            .call(
                "sign up",
                self.provider
                    .sign_up(form.email.trim(), &form.password, metadata),
            )
            .await;

        match result {
            Ok(session) => {
                self.notifier.notify(Notice::success(
                    "Account created",
                    "The account was created successfully",
                ));
                if let Some(session) = &session {
                    self.handle_provider_event(SessionEvent::new(
                        SessionEventKind::SignedIn,
                        Some(session.clone()),
                    ));
                }
                Ok(session)
            }
            Err(e) => {
                self.notifier
                    .notify(Notice::error("Error", "The account could not be created"));
                Err(e)
            }
        }
    }

    pub async fn reset_password(&self, form: ForgotPasswordForm) -> Result<(), SmartSpaceError> {
        form.validate()?;
        match self
            .call(
                "password recovery",
                self.provider.reset_password_for_email(form.email.trim()),
            )
            .await
        {
            Ok(()) => {
                self.notifier.notify(Notice::success(
                    "Check your email",
                    "Recovery instructions were sent",
                ));
                Ok(())
            }
            Err(e) => {
                self.notifier.notify(Notice::error(
                    "Error",
                    "Recovery instructions could not be sent",
                ));
                Err(e)
            }
        }
    }

    /// End the session with the provider, then clear it locally
    pub async fn sign_out(&self) -> Result<(), SmartSpaceError> {
        if let Some(session) = self.current_session() {
            if let Err(e) = self.call("sign out", self.provider.sign_out(&session)).await {
                error!("Sign out error: {}", e);
                self.notifier
                    .notify(Notice::error("Error", "Could not sign out"));
                return Err(e);
            }
        }
        info!("Signed out");
        self.handle_provider_event(SessionEvent::signed_out());
        Ok(())
    }

    /// Exchange the refresh token for a new session. A refused refresh
    /// ends the session.
    ///
    /// If the session changed while the provider was asked, the answer is
    /// dropped and the newer session is returned instead.
    pub async fn refresh(&self) -> Result<Session, SmartSpaceError> {
        let ticket = self.ticket();
        let Some(session) = self.current_session() else {
            return Err(SmartSpaceError::AuthError(
                "No session to refresh".to_string(),
            ));
        };
        match self
            .call("session refresh", self.provider.refresh_session(&session))
            .await
        {
            Ok(refreshed) => {
                let event = SessionEvent::new(
                    SessionEventKind::TokenRefreshed,
                    Some(refreshed.clone()),
                );
                if self.apply_event(event, Some(ticket)) {
                    return Ok(refreshed);
                }
                debug!("Discarding stale session refresh");
                self.current_session().ok_or_else(|| {
                    SmartSpaceError::AuthError("Session ended during refresh".to_string())
                })
            }
            Err(e @ SmartSpaceError::AuthError(_)) => {
                if self.apply_event(SessionEvent::signed_out(), Some(ticket)) {
                    warn!("Session refresh refused, signed out: {}", e);
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply a session change reported by the provider: update and persist
    /// the mirror, notify subscribers and redirect when no session remains
    pub fn handle_provider_event(&self, event: SessionEvent) {
        self.apply_event(event, None);
    }

    // ================================ HELPERS ================================ //

    /// Current session generation; any session change moves past it
    fn ticket(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_stale(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != ticket
    }

    /// Apply `event` unless the session moved past `ticket`. Returns whether
    /// it was applied.
    fn apply_event(&self, event: SessionEvent, ticket: Option<u64>) -> bool {
        {
            // generation and mirror change together under the lock
            let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
            if ticket.is_some_and(|ticket| self.is_stale(ticket)) {
                return false;
            }
            self.generation.fetch_add(1, Ordering::SeqCst);
            *cached = event.session.clone();
            self.persist(event.session.as_ref());
        }

        debug!("Session event: {:?}", event.kind);
        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .callbacks
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(&event);
        }

        if event.session.is_none() {
            self.navigator.redirect_to_login();
        }
        true
    }

    async fn call<T, F>(&self, what: &str, request: F) -> Result<T, SmartSpaceError>
    where
        F: Future<Output = Result<T, SmartSpaceError>>,
    {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                SmartSpaceError::Timeout(format!("{} after {:?}", what, self.timeout))
            })?
    }

    /// Ask the provider about the cached session without touching any state
    async fn verify(&self) -> Result<Verification, SmartSpaceError> {
        let Some(session) = self.current_session() else {
            return Ok(Verification::NoSession);
        };

        if session.is_expired() {
            debug!("Cached session expired, refreshing");
            return match self
                .call("session refresh", self.provider.refresh_session(&session))
                .await
            {
                Ok(refreshed) => Ok(Verification::Refreshed(refreshed)),
                Err(SmartSpaceError::AuthError(e)) => {
                    warn!("Expired session could not be refreshed: {}", e);
                    Ok(Verification::Rejected)
                }
                Err(e) => Err(e),
            };
        }

        match self.call("get user", self.provider.get_user(&session)).await? {
            Some(user) => {
                let mut session = session;
                session.user = user;
                Ok(Verification::Valid(session))
            }
            None => Ok(Verification::Rejected),
        }
    }

    /// Bring the mirror in line with a verification started at `ticket`
    fn settle(&self, ticket: u64, verification: Verification) -> Settled {
        match verification {
            Verification::NoSession => Settled::Current(None),
            Verification::Valid(session) => {
                let mut cached = self.cached.write().unwrap_or_else(|e| e.into_inner());
                if self.is_stale(ticket) {
                    return Settled::Stale;
                }
                *cached = Some(session.clone());
                self.persist(Some(&session));
                Settled::Current(Some(session))
            }
            Verification::Refreshed(session) => {
                let event = SessionEvent::new(
                    SessionEventKind::TokenRefreshed,
                    Some(session.clone()),
                );
                if self.apply_event(event, Some(ticket)) {
                    Settled::Current(Some(session))
                } else {
                    Settled::Stale
                }
            }
            Verification::Rejected => {
                if self.apply_event(SessionEvent::signed_out(), Some(ticket)) {
                    info!("Session no longer valid");
                    Settled::Current(None)
                } else {
                    Settled::Stale
                }
            }
        }
    }

    fn persist(&self, session: Option<&Session>) {
        let Some(store) = &self.store else {
            return;
        };
        let result = match session {
            Some(session) => store.save_session(session),
            None => store.clear_session(),
        };
        if let Err(e) = result {
            warn!("Failed to persist session: {}", e);
        }
    }
}
