use crate::console::{
    layout::{LayoutState, ResponsiveLayout, Viewport},
    menu::{MenuCommand, MenuTarget},
    navigation::landing_route,
    session::IdentityKind,
};
use anyhow::Result;
use std::fmt::{self, Write};

#[derive(Debug)]
pub struct Args {
    pub width: Option<u32>,
}

/// # Errors
/// Returns an error if the report cannot be written.
pub fn execute(args: &Args) -> Result<()> {
    print!("{}", render(args.width)?);
    Ok(())
}

/// Landing routes per identity, the sidebar dispatch table and, for a width, the
/// sidebar layout.
///
/// # Errors
/// Returns an error if formatting fails.
pub fn render(width: Option<u32>) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Landing routes")?;
    for kind in IdentityKind::ALL {
        writeln!(out, "  {:<22}{}", kind.as_str(), landing_route(kind))?;
    }

    writeln!(out, "Menu")?;
    for target in MenuTarget::NAVIGATION.into_iter().chain(MenuTarget::ACCOUNT) {
        let command = match target.command() {
            MenuCommand::Navigate(route) => format!("navigate {route}"),
            MenuCommand::OpenCredentialForm => "open credential form".to_string(),
            MenuCommand::Logout => "logout".to_string(),
        };
        writeln!(out, "  {:<22}{command}", target.label())?;
    }

    if let Some(width) = width {
        let viewport = Viewport::new(width);
        let layout = ResponsiveLayout::mount(&viewport, LayoutState::new());
        let state = layout.state();
        writeln!(
            out,
            "Layout at {width}px: sidebar {} ({}px)",
            if state.is_collapsed() {
                "collapsed"
            } else {
                "expanded"
            },
            state.sidebar_width()
        )?;
    }

    Ok(out)
}
