//! Session state shared by the whole console. The context is created anonymous,
//! changes only through [`reduce`], and pushes every change synchronously to its
//! subscribers. Only non-sensitive identity metadata is kept in memory; admin
//! passwords are handed to the authenticator and dropped.

use super::observers::{Observers, Subscription};
use secrecy::SecretString;
use std::{cell::RefCell, fmt, rc::Rc};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Discriminator for who is using the console.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    #[default]
    Anonymous,
    GoogleUnregistered,
    GoogleRegistered,
    AdminAuthenticated,
}

impl IdentityKind {
    pub const ALL: [Self; 4] = [
        Self::Anonymous,
        Self::GoogleUnregistered,
        Self::GoogleRegistered,
        Self::AdminAuthenticated,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::GoogleUnregistered => "google-unregistered",
            Self::GoogleRegistered => "google-registered",
            Self::AdminAuthenticated => "admin",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity returned by the external sign-in provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub email: String,
    pub display_name: Option<String>,
}

/// Who the session belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    Google {
        email: String,
        display_name: Option<String>,
    },
    Admin {
        username: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    kind: IdentityKind,
    principal: Option<Principal>,
}

impl Session {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn kind(&self) -> IdentityKind {
        self.kind
    }

    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

/// Inputs to the session reducer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    ProviderSignedIn {
        assertion: IdentityAssertion,
        registered: bool,
    },
    RegistrationConfirmed,
    AdminLoggedIn {
        username: String,
    },
    LoggedOut,
}

impl SessionEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProviderSignedIn { .. } => "provider-signed-in",
            Self::RegistrationConfirmed => "registration-confirmed",
            Self::AdminLoggedIn { .. } => "admin-logged-in",
            Self::LoggedOut => "logged-out",
        }
    }
}

/// Admin login input. The password is only exposed to the authenticator.
pub struct AdminCredentials {
    pub username: String,
    pub password: SecretString,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("sign-in failed: {0}")]
    Provider(String),
    #[error("registration lookup failed: {0}")]
    Lookup(String),
    #[error("admin login failed: {0}")]
    AdminLogin(String),
    #[error("invalid session transition from {from} on {event}")]
    InvalidTransition {
        from: IdentityKind,
        event: &'static str,
    },
}

/// External sign-in provider (Google).
pub trait IdentityProvider {
    fn sign_in(&self) -> impl Future<Output = Result<IdentityAssertion, SessionError>>;
}

/// Backend check for whether a signed-in Google user has a student registration.
pub trait RegistrationLookup {
    fn is_registered(
        &self,
        assertion: &IdentityAssertion,
    ) -> impl Future<Output = Result<bool, SessionError>>;
}

/// Backend admin login.
pub trait AdminAuthenticator {
    /// Resolves to the authenticated admin username.
    fn login(
        &self,
        credentials: &AdminCredentials,
    ) -> impl Future<Output = Result<String, SessionError>>;
}

/// Applies `event` to `session` following the fixed transition graph.
///
/// # Errors
/// Returns [`SessionError::InvalidTransition`] for any pair outside the graph.
pub fn reduce(session: &Session, event: SessionEvent) -> Result<Session, SessionError> {
    let from = session.kind;
    let invalid = SessionError::InvalidTransition {
        from,
        event: event.name(),
    };

    match (from, event) {
        (_, SessionEvent::LoggedOut) => Ok(Session::anonymous()),
        (
            IdentityKind::Anonymous,
            SessionEvent::ProviderSignedIn {
                assertion,
                registered,
            },
        ) => Ok(Session {
            kind: if registered {
                IdentityKind::GoogleRegistered
            } else {
                IdentityKind::GoogleUnregistered
            },
            principal: Some(Principal::Google {
                email: assertion.email,
                display_name: assertion.display_name,
            }),
        }),
        (IdentityKind::GoogleUnregistered, SessionEvent::RegistrationConfirmed) => Ok(Session {
            kind: IdentityKind::GoogleRegistered,
            principal: session.principal.clone(),
        }),
        (IdentityKind::Anonymous, SessionEvent::AdminLoggedIn { username }) => Ok(Session {
            kind: IdentityKind::AdminAuthenticated,
            principal: Some(Principal::Admin { username }),
        }),
        _ => Err(invalid),
    }
}

/// Process-wide session handle. Clones share the same state and subscribers.
#[derive(Clone, Default)]
pub struct SessionContext {
    state: Rc<RefCell<Session>>,
    observers: Observers<Session>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn kind(&self) -> IdentityKind {
        self.state.borrow().kind
    }

    /// Registers a listener called after every session change.
    pub fn subscribe(&self, listener: impl Fn(&Session) + 'static) -> Subscription {
        self.observers.subscribe(listener)
    }

    /// Runs the reducer and notifies subscribers when the session changed.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] and leaves the session untouched
    /// when the event is not allowed from the current state.
    pub fn dispatch(&self, event: SessionEvent) -> Result<IdentityKind, SessionError> {
        let event_name = event.name();
        let (previous, next) = {
            let mut state = self.state.borrow_mut();
            let next = reduce(&state, event)?;
            let previous = std::mem::replace(&mut *state, next.clone());
            (previous, next)
        };

        if previous != next {
            info!(
                from = %previous.kind,
                to = %next.kind,
                event = event_name,
                "session transition"
            );
            self.observers.notify(&next);
        }

        Ok(next.kind)
    }

    /// Signs in through the external provider and classifies the user with a
    /// registration lookup.
    ///
    /// # Errors
    /// Returns an error if the session is not anonymous, the provider or lookup fails,
    /// or the session changed while the calls were pending. The session is unchanged
    /// on error.
    pub async fn sign_in_with_provider<P, L>(
        &self,
        provider: &P,
        lookup: &L,
    ) -> Result<IdentityKind, SessionError>
    where
        P: IdentityProvider,
        L: RegistrationLookup,
    {
        self.require(IdentityKind::Anonymous, "provider-signed-in")?;

        let assertion = provider.sign_in().await.inspect_err(|err| {
            warn!("provider sign-in failed: {err}");
        })?;
        let registered = lookup.is_registered(&assertion).await.inspect_err(|err| {
            warn!("registration lookup failed: {err}");
        })?;

        debug!(registered, "provider sign-in completed");

        self.dispatch(SessionEvent::ProviderSignedIn {
            assertion,
            registered,
        })
    }

    /// Re-runs the registration lookup for an unregistered Google user.
    ///
    /// # Errors
    /// Returns an error if the session is not an unregistered Google user or the
    /// lookup fails.
    pub async fn confirm_registration<L>(&self, lookup: &L) -> Result<IdentityKind, SessionError>
    where
        L: RegistrationLookup,
    {
        let (kind, principal) = {
            let state = self.state.borrow();
            (state.kind, state.principal.clone())
        };
        let assertion = match (kind, principal) {
            (
                IdentityKind::GoogleUnregistered,
                Some(Principal::Google {
                    email,
                    display_name,
                }),
            ) => IdentityAssertion {
                email,
                display_name,
            },
            _ => {
                return Err(SessionError::InvalidTransition {
                    from: kind,
                    event: "registration-confirmed",
                });
            }
        };

        if lookup.is_registered(&assertion).await? {
            self.dispatch(SessionEvent::RegistrationConfirmed)
        } else {
            Ok(self.kind())
        }
    }

    /// Logs the administrator in.
    ///
    /// # Errors
    /// Returns an error if the session is not anonymous or the authenticator rejects
    /// the credentials.
    pub async fn admin_login<A>(
        &self,
        authenticator: &A,
        credentials: AdminCredentials,
    ) -> Result<IdentityKind, SessionError>
    where
        A: AdminAuthenticator,
    {
        self.require(IdentityKind::Anonymous, "admin-logged-in")?;

        let username = authenticator.login(&credentials).await.inspect_err(|err| {
            warn!(username = %credentials.username, "admin login failed: {err}");
        })?;
        drop(credentials);

        self.dispatch(SessionEvent::AdminLoggedIn { username })
    }

    /// Resets the session to anonymous. Always succeeds.
    pub fn logout(&self) -> IdentityKind {
        // every kind may log out
        self.dispatch(SessionEvent::LoggedOut)
            .unwrap_or(IdentityKind::Anonymous)
    }

    fn require(&self, expected: IdentityKind, event: &'static str) -> Result<(), SessionError> {
        let from = self.kind();
        if from == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { from, event })
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &*self.state.borrow())
            .field("subscribers", &self.observers.len())
            .finish()
    }
}
