//! Client-side state for the placement portal console.
//!
//! Everything here is single-threaded: components share state through `Rc` handles
//! and talk to each other through [`observers::Observers`] lists.

pub mod credentials;
pub mod layout;
pub mod menu;
pub mod navigation;
pub mod observers;
pub mod session;
pub mod shell;

pub use credentials::{CredentialWorkflow, SubmitOutcome, WorkflowError, WorkflowState};
pub use layout::{LayoutState, ResponsiveLayout, Viewport};
pub use menu::{MenuCommand, MenuTarget};
pub use navigation::{History, NavigationController, Route, Router, landing_route};
pub use observers::{Observers, Subscription};
pub use session::{IdentityKind, Session, SessionContext, SessionEvent};
pub use shell::{AdminConsole, ConsoleError};
