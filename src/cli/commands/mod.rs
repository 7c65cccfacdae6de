mod backend;
mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

fn change_password_command() -> Command {
    Command::new("change-password")
        .about("Change the administrator password")
        .arg(
            Arg::new("old-password")
                .long("old-password")
                .help("Current password")
                .env("PLACEMENT_CONSOLE_OLD_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("new-password")
                .long("new-password")
                .help("New password")
                .env("PLACEMENT_CONSOLE_NEW_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("confirm-new-password")
                .long("confirm-new-password")
                .help("New password, again")
                .env("PLACEMENT_CONSOLE_CONFIRM_NEW_PASSWORD")
                .hide_env_values(true),
        )
}

fn routes_command() -> Command {
    Command::new("routes")
        .about("Print landing routes, the sidebar menu and the layout for a width")
        .arg(
            Arg::new("width")
                .long("width")
                .help("Viewport width in pixels")
                .value_parser(clap::value_parser!(u32)),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("placement-console")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("profile").about("Fetch the administrator profile"))
        .subcommand(change_password_command())
        .subcommand(routes_command());

    let command = backend::with_args(command);
    logging::with_args(command)
}
