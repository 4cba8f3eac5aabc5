//! `wtui add` / `wtui remove`.

use wtui_git::LifecycleOutcome;

use crate::config::Config;
use crate::services::Services;

pub fn cmd_add(
    config: &Config,
    services: &Services,
    name: &str,
    branch: Option<&str>,
) -> anyhow::Result<()> {
    let outcome = services.lifecycle(config).add(name, branch)?;
    report("created", &outcome);
    Ok(())
}

pub fn cmd_remove(config: &Config, services: &Services, name: &str, force: bool) -> anyhow::Result<()> {
    let outcome = services.lifecycle(config).remove(name, force)?;
    report("removed", &outcome);
    Ok(())
}

/// A failed post-hook is a warning: the git side already happened.
fn report(verb: &str, outcome: &LifecycleOutcome) {
    println!("{verb} {}", outcome.path().display());
    if let LifecycleOutcome::PartialSuccess { hook_error, .. } = outcome {
        eprintln!("warning: {hook_error}");
    }
}
