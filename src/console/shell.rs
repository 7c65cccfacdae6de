//! Admin application shell: sidebar, content area and the credential modal, wired
//! to one session.

use super::{
    credentials::{CredentialWorkflow, WorkflowError},
    layout::{LayoutState, ResponsiveLayout, Viewport},
    menu::{MenuCommand, MenuTarget},
    navigation::{NavigationController, NavigationError, Route, Router},
    observers::Subscription,
    session::{IdentityKind, SessionContext},
};
use crate::api::AdminDataSource;
use std::{fmt, rc::Rc};
use thiserror::Error;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("the credential form needs an admin session, not {kind}")]
    AdminRequired { kind: IdentityKind },
}

pub struct AdminConsole<R, S> {
    session: SessionContext,
    navigation: Rc<NavigationController<R>>,
    layout: ResponsiveLayout,
    credentials: CredentialWorkflow<S>,
    _links: [Subscription; 2],
}

impl<R, S> AdminConsole<R, S>
where
    R: Router + 'static,
    S: AdminDataSource + 'static,
{
    /// Attaches navigation to the session, starts following the viewport and loads
    /// the admin profile. A profile failure is logged and leaves the form without a
    /// username.
    pub async fn mount(
        session: SessionContext,
        router: R,
        viewport: &Viewport,
        source: S,
    ) -> Self {
        let navigation = NavigationController::new(router);
        let navigation_link = navigation.attach(&session);
        let layout = ResponsiveLayout::mount(viewport, LayoutState::new());
        let credentials = CredentialWorkflow::new(source);

        let sign_out_link = {
            let credentials = credentials.clone();
            session.subscribe(move |session| {
                if session.kind() != IdentityKind::AdminAuthenticated && credentials.cancel() {
                    debug!("credential form closed on sign-out");
                }
            })
        };

        let _ = credentials.load_profile().await;

        Self {
            session,
            navigation,
            layout,
            credentials,
            _links: [navigation_link, sign_out_link],
        }
    }

    /// Runs the command bound to a menu entry and returns it.
    ///
    /// # Errors
    /// Returns [`ConsoleError`] when the route is not available to the session, the
    /// session is not an admin's, or the credential form cannot be opened right now.
    pub fn select(&self, target: MenuTarget) -> Result<MenuCommand, ConsoleError> {
        let command = target.command();
        debug!(target = target.label(), "menu selected");

        match command {
            MenuCommand::Navigate(route) => {
                self.navigation.go(route)?;
            }
            MenuCommand::OpenCredentialForm => {
                let kind = self.session.kind();
                if kind != IdentityKind::AdminAuthenticated {
                    return Err(ConsoleError::AdminRequired { kind });
                }
                self.credentials.open()?;
            }
            MenuCommand::Logout => {
                self.session.logout();
            }
        }

        Ok(command)
    }

    /// Sidebar entries in display order, with their highlight state.
    #[must_use]
    pub fn menu(&self) -> Vec<(MenuTarget, bool)> {
        let current = self.navigation.current();
        MenuTarget::NAVIGATION
            .into_iter()
            .chain(MenuTarget::ACCOUNT)
            .map(|target| (target, target.is_selected(current)))
            .collect()
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn current_route(&self) -> Option<Route> {
        self.navigation.current()
    }

    #[must_use]
    pub fn router(&self) -> &R {
        self.navigation.router()
    }

    #[must_use]
    pub fn layout(&self) -> &LayoutState {
        self.layout.state()
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialWorkflow<S> {
        &self.credentials
    }

    /// Detaches from the session and the viewport.
    pub fn unmount(self) {}
}

impl<R, S> fmt::Debug for AdminConsole<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConsole")
            .field("session", &self.session)
            .field("navigation", &self.navigation)
            .field("layout", &self.layout)
            .field("credentials", &self.credentials)
            .finish()
    }
}
