use std::sync::Arc;

use anyhow::Context;
use scrape_core::{Settings, SettingsStore};
use scrape_engine::{ChannelObserver, EngineConfig, Orchestrator, RunEvent};
use scrape_logging::{scrape_info, scrape_warn};

use crate::cli::Cli;
use crate::persistence::RonSettingsStore;

/// Resolves settings, runs one scrape and prints the response as JSON.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = RonSettingsStore::new(cli.settings.clone());
    let mut settings = match store.load() {
        Ok(Some(settings)) => settings,
        Ok(None) => Settings::default(),
        Err(err) => {
            scrape_warn!("Ignoring stored settings: {}", err);
            Settings::default()
        }
    };
    cli.apply(&mut settings);

    if !cli.no_save {
        if let Err(err) = store.save(&settings) {
            scrape_warn!("Could not save settings to {:?}: {}", store.path(), err);
        }
    }

    let config = EngineConfig {
        output_dir: cli.output_dir.clone(),
        ..EngineConfig::default()
    };
    let (observer, mut events) = ChannelObserver::channel();
    let orchestrator = Orchestrator::with_defaults(config)
        .context("failed to set up the scrape engine")?
        .with_observer(Arc::new(observer));

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            scrape_warn!("Interrupt received, cancelling the run");
            cancel.cancel();
        }
    });

    // Log lines already reach the logger; only progress is echoed here.
    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let RunEvent::Progress(update) = event {
                let note = update.note.as_deref().unwrap_or("");
                eprintln!(
                    "[{:>3}%] {} {}/{} {}",
                    update.percent,
                    update.stage.label(),
                    update.current,
                    update.total,
                    note
                );
            }
        }
    });

    scrape_info!("Running scrape for {:?}", settings.request.keyword);
    let result = orchestrator.run(&settings.request).await;
    drop(orchestrator);
    let _ = progress.await;

    let response = result?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
