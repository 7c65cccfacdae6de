use anyhow::Result;
use placement_console::cli::{self, telemetry};
use tokio::task::LocalSet;

// Console state is single-threaded, so actions run on a LocalSet.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = LocalSet::new().run_until(action.execute()).await;

    telemetry::shutdown_tracer();

    result
}
