//! Route selection driven by the session. Each identity kind has one landing route;
//! the controller follows session changes and otherwise only moves when the user
//! asks it to. Guards here are UX only: real access control lives on the API.

use super::{
    observers::Subscription,
    session::{IdentityKind, Session, SessionContext},
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    SignIn,
    AdminSignIn,
    Register,
    UserProfile,
    AdminHome,
    NewPlacement,
    Responses,
    ManageStudents,
}

impl Route {
    pub const ALL: [Self; 8] = [
        Self::SignIn,
        Self::AdminSignIn,
        Self::Register,
        Self::UserProfile,
        Self::AdminHome,
        Self::NewPlacement,
        Self::Responses,
        Self::ManageStudents,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::SignIn => "/signin",
            Self::AdminSignIn => "/signin/admin",
            Self::Register => "/register",
            Self::UserProfile => "/userprofile",
            Self::AdminHome => "/admin",
            Self::NewPlacement => "/admin/newplacement",
            Self::Responses => "/admin/responses",
            Self::ManageStudents => "/admin/manage",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Whether a user of `kind` may open this route.
    #[must_use]
    pub const fn permits(self, kind: IdentityKind) -> bool {
        match self {
            Self::SignIn | Self::AdminSignIn => matches!(kind, IdentityKind::Anonymous),
            Self::Register => matches!(kind, IdentityKind::GoogleUnregistered),
            Self::UserProfile => matches!(kind, IdentityKind::GoogleRegistered),
            Self::AdminHome | Self::NewPlacement | Self::Responses | Self::ManageStudents => {
                matches!(kind, IdentityKind::AdminAuthenticated)
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Landing route for each identity kind.
#[must_use]
pub const fn landing_route(kind: IdentityKind) -> Route {
    match kind {
        IdentityKind::Anonymous => Route::SignIn,
        IdentityKind::GoogleUnregistered => Route::Register,
        IdentityKind::GoogleRegistered => Route::UserProfile,
        IdentityKind::AdminAuthenticated => Route::AdminHome,
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("route {route} is not available to {kind} sessions")]
    Forbidden { route: Route, kind: IdentityKind },
}

/// The routing library the console runs under.
pub trait Router {
    fn navigate(&self, route: Route);
}

impl<R: Router + ?Sized> Router for Rc<R> {
    fn navigate(&self, route: Route) {
        (**self).navigate(route);
    }
}

/// In-memory router that records every navigation.
#[derive(Debug, Default)]
pub struct History {
    entries: RefCell<Vec<Route>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Route> {
        self.entries.borrow().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.entries.borrow().last().copied()
    }
}

impl Router for History {
    fn navigate(&self, route: Route) {
        self.entries.borrow_mut().push(route);
    }
}

/// Keeps the router on the route that matches the session.
pub struct NavigationController<R> {
    router: R,
    current: Cell<Option<Route>>,
    kind: Cell<IdentityKind>,
}

impl<R: Router + 'static> NavigationController<R> {
    pub fn new(router: R) -> Rc<Self> {
        Rc::new(Self {
            router,
            current: Cell::new(None),
            kind: Cell::new(IdentityKind::Anonymous),
        })
    }

    /// Evaluates the current session once and follows every later change.
    pub fn attach(self: &Rc<Self>, session: &SessionContext) -> Subscription {
        self.on_session_change(&session.current());

        let controller = Rc::downgrade(self);
        session.subscribe(move |session| {
            if let Some(controller) = controller.upgrade() {
                controller.on_session_change(session);
            }
        })
    }

    /// Moves to the landing route of `session`. Returns `false` when already there.
    pub fn on_session_change(&self, session: &Session) -> bool {
        self.kind.set(session.kind());
        self.enter(landing_route(session.kind()))
    }

    /// User-initiated navigation, guarded by the current identity.
    ///
    /// # Errors
    /// Returns [`NavigationError::Forbidden`] if the route is not available to the
    /// current session; the current route is left unchanged.
    pub fn go(&self, route: Route) -> Result<bool, NavigationError> {
        let kind = self.kind.get();
        if !route.permits(kind) {
            return Err(NavigationError::Forbidden { route, kind });
        }
        Ok(self.enter(route))
    }

    #[must_use]
    pub fn current(&self) -> Option<Route> {
        self.current.get()
    }

    #[must_use]
    pub fn router(&self) -> &R {
        &self.router
    }

    fn enter(&self, route: Route) -> bool {
        if self.current.get() == Some(route) {
            return false;
        }
        debug!(route = route.path(), "navigate");
        self.current.set(Some(route));
        self.router.navigate(route);
        true
    }
}

impl<R> fmt::Debug for NavigationController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("current", &self.current.get())
            .field("kind", &self.kind.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::session::{SessionEvent, reduce};
    use anyhow::Result;

    #[test]
    fn landing_routes_per_identity() {
        assert_eq!(landing_route(IdentityKind::Anonymous), Route::SignIn);
        assert_eq!(landing_route(IdentityKind::GoogleUnregistered), Route::Register);
        assert_eq!(landing_route(IdentityKind::GoogleRegistered), Route::UserProfile);
        assert_eq!(landing_route(IdentityKind::AdminAuthenticated), Route::AdminHome);
        for kind in IdentityKind::ALL {
            assert!(landing_route(kind).permits(kind));
        }
    }

    #[test]
    fn paths_round_trip() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/admin/"), Some(Route::AdminHome));
        assert_eq!(Route::from_path("/nowhere"), None);
    }

    #[test]
    fn session_change_is_idempotent() -> Result<()> {
        let controller = NavigationController::new(History::new());
        let admin = reduce(
            &Session::anonymous(),
            SessionEvent::AdminLoggedIn {
                username: "admin".to_string(),
            },
        )?;

        assert!(controller.on_session_change(&admin));
        assert!(!controller.on_session_change(&admin));
        assert_eq!(controller.router().entries(), vec![Route::AdminHome]);
        Ok(())
    }

    #[test]
    fn attach_follows_session_without_polling() -> Result<()> {
        let session = SessionContext::new();
        let controller = NavigationController::new(History::new());
        let _link = controller.attach(&session);

        assert_eq!(controller.current(), Some(Route::SignIn));

        session.dispatch(SessionEvent::AdminLoggedIn {
            username: "admin".to_string(),
        })?;
        assert_eq!(controller.current(), Some(Route::AdminHome));

        session.logout();
        assert_eq!(
            controller.router().entries(),
            vec![Route::SignIn, Route::AdminHome, Route::SignIn]
        );
        Ok(())
    }

    #[test]
    fn dropping_the_link_stops_following() -> Result<()> {
        let session = SessionContext::new();
        let controller = NavigationController::new(History::new());
        let link = controller.attach(&session);
        drop(link);

        session.dispatch(SessionEvent::AdminLoggedIn {
            username: "admin".to_string(),
        })?;
        assert_eq!(controller.current(), Some(Route::SignIn));
        Ok(())
    }

    #[test]
    fn go_is_guarded_by_identity() -> Result<()> {
        let session = SessionContext::new();
        let controller = NavigationController::new(History::new());
        let _link = controller.attach(&session);

        assert_eq!(
            controller.go(Route::Responses),
            Err(NavigationError::Forbidden {
                route: Route::Responses,
                kind: IdentityKind::Anonymous
            })
        );
        assert_eq!(controller.go(Route::AdminSignIn), Ok(true));

        session.dispatch(SessionEvent::AdminLoggedIn {
            username: "admin".to_string(),
        })?;
        assert_eq!(controller.go(Route::Responses), Ok(true));
        assert_eq!(controller.go(Route::Responses), Ok(false));
        assert_eq!(controller.current(), Some(Route::Responses));
        Ok(())
    }
}
