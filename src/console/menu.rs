//! Sidebar menu for the administrator.
//!
//! Two sections:
//! 1. Navigation (Home, New Placement, Responses, Manage Students)
//! 2. Account dropdown (Change Password, Logout)
//!
//! Targets are a closed enum and [`MenuTarget::command`] is the dispatch table, so a
//! navigation entry can never be mistaken for an account action.

use super::navigation::Route;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuTarget {
    Home,
    NewPlacement,
    Responses,
    ManageStudents,
    ChangePassword,
    Logout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuCommand {
    Navigate(Route),
    OpenCredentialForm,
    Logout,
}

impl MenuTarget {
    pub const NAVIGATION: [Self; 4] = [
        Self::Home,
        Self::NewPlacement,
        Self::Responses,
        Self::ManageStudents,
    ];

    pub const ACCOUNT: [Self; 2] = [Self::ChangePassword, Self::Logout];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::NewPlacement => "New Placement",
            Self::Responses => "Responses",
            Self::ManageStudents => "Manage Students",
            Self::ChangePassword => "Change Password",
            Self::Logout => "Logout",
        }
    }

    #[must_use]
    pub const fn command(self) -> MenuCommand {
        match self {
            Self::Home => MenuCommand::Navigate(Route::AdminHome),
            Self::NewPlacement => MenuCommand::Navigate(Route::NewPlacement),
            Self::Responses => MenuCommand::Navigate(Route::Responses),
            Self::ManageStudents => MenuCommand::Navigate(Route::ManageStudents),
            Self::ChangePassword => MenuCommand::OpenCredentialForm,
            Self::Logout => MenuCommand::Logout,
        }
    }

    /// Highlight state: a navigation entry is selected when its route is current.
    #[must_use]
    pub fn is_selected(self, current: Option<Route>) -> bool {
        match self.command() {
            MenuCommand::Navigate(route) => current == Some(route),
            MenuCommand::OpenCredentialForm | MenuCommand::Logout => false,
        }
    }
}
