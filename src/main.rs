use std::time::Duration;

use anyhow::Context;

use cpupin::config::CONFIG_FILE_NAME;
use cpupin::Engine;

fn main() -> anyhow::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC in cpupin: {info}");
        default_hook(info);
    }));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cpupin=info".into()),
        )
        .init();

    let config_path = match std::env::args_os().nth(1) {
        Some(path) => path.into(),
        None => std::env::current_exe()
            .context("failed to resolve executable path")?
            .with_file_name(CONFIG_FILE_NAME),
    };
    tracing::info!("Using configuration at {}", config_path.display());

    let mut engine = Engine::open(config_path);
    engine
        .start()
        .context("could not start affinity enforcement")?;

    loop {
        std::thread::sleep(Duration::from_secs(60));
        for rule in engine.status() {
            tracing::debug!(
                "rule {}: {} -> {:X} (applied: {})",
                rule.index,
                rule.process_name,
                rule.affinity_mask,
                rule.applied
            );
        }
    }
}
