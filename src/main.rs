use std::sync::Arc;

use anyhow::{Context, bail};

use bulk_sender::config::{BrowserConfig, RemoteConfig, SenderConfig};
use bulk_sender::dispatch::{
    DispatchEngine, DispatchJob, MessageStrategy, ProgressEvent, spawn_dispatch,
};
use bulk_sender::error::{DispatchError, InputError};
use bulk_sender::identity::DeviceIdentity;
use bulk_sender::input;
use bulk_sender::remote::{HttpRemoteControl, RemoteControl, spawn_heartbeat};
use bulk_sender::report::{FailureLogSink, SummarySink};
use bulk_sender::session::{AttemptOutcome, DryRunDriver, SessionDriver};

/// Exit code when the administrator has disabled this device.
const EXIT_DEVICE_DISABLED: i32 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let remote_config = RemoteConfig::from_env();
    let sender_config = SenderConfig::from_env(std::env::args().nth(1));
    let browser_config = BrowserConfig::from_env();

    // ── Identity + admin service ────────────────────────────────────────
    let identity = match sender_config.device_file {
        Some(ref path) => DeviceIdentity::load_or_create(path).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not use device file; generating a fresh identity");
            DeviceIdentity::generate()
        }),
        None => DeviceIdentity::generate(),
    };

    eprintln!("📨 Bulk Sender v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Device: {} ({})", identity.device_name, identity.device_id);
    eprintln!("   Admin: {}", remote_config.base_url);

    let remote: Arc<dyn RemoteControl> = Arc::new(
        HttpRemoteControl::new(&remote_config, identity).context("building admin client")?,
    );

    if let Some(update) = remote.check_update().await
        && update.version != env!("CARGO_PKG_VERSION")
    {
        eprintln!("\n   Update available: {}", update.version);
        if let Some(ref changelog) = update.changelog {
            eprintln!("   {}", changelog);
        }
        eprintln!("   Download: {}\n", update.download_url);
    }

    if !remote.register().await {
        eprintln!("   Warning: could not reach the admin dashboard. Check your internet connection.");
    }

    let _heartbeat = remote_config
        .heartbeat_interval
        .map(|interval| spawn_heartbeat(Arc::clone(&remote), interval));

    // ── Input + job ─────────────────────────────────────────────────────
    let Some(ref input_path) = sender_config.input_path else {
        bail!("No recipient spreadsheet given. Pass a path or set SENDER_INPUT.");
    };

    let sheet = input::load_recipients(input_path)
        .with_context(|| format!("loading recipients from {}", input_path.display()))?;

    let strategy = match sender_config.uniform_message {
        Some(ref text) => MessageStrategy::Uniform(text.clone()),
        None if sheet.has_message_column => MessageStrategy::PerRecipient,
        None => {
            return Err(InputError::MissingColumn {
                column: input::MESSAGE_COLUMN.to_string(),
            })
            .context("set SENDER_UNIFORM_MESSAGE or add a Message column");
        }
    };

    let job = DispatchJob::new(sheet.records, strategy, sender_config.pacing_secs)?;

    eprintln!("   Input: {} ({} recipients)", input_path.display(), job.len());
    eprintln!("   Pacing: {:.1}s", job.pacing().as_secs_f64());
    eprintln!(
        "   Mode: {}\n",
        if sender_config.dry_run { "dry run" } else { "live" }
    );

    // ── Dispatch ────────────────────────────────────────────────────────
    let session = build_session(&sender_config, browser_config)?;

    let engine = Arc::new(
        DispatchEngine::new(Arc::clone(&remote))
            .with_sink(Arc::new(FailureLogSink::new(sender_config.failure_log.clone())))
            .with_sink(Arc::new(
                SummarySink::new().with_failure_log(sender_config.failure_log.clone()),
            )),
    );

    let mut handle = spawn_dispatch(engine, job, session);

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => print_progress(&event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nInterrupted, stopping dispatch.");
                handle.abort();
                break;
            }
        }
    }

    match handle.join().await {
        Ok(_) => Ok(()),
        Err(DispatchError::DeviceDisabled) => {
            eprintln!("Error: this device has been disabled by the administrator.");
            std::process::exit(EXIT_DEVICE_DISABLED);
        }
        Err(DispatchError::Cancelled) => Ok(()),
        Err(e) => Err(e).context("dispatch failed"),
    }
}

fn build_session(
    config: &SenderConfig,
    browser: BrowserConfig,
) -> anyhow::Result<Box<dyn SessionDriver>> {
    if config.dry_run {
        return Ok(Box::new(DryRunDriver::new()));
    }

    #[cfg(feature = "browser")]
    {
        Ok(Box::new(bulk_sender::session::WebClientDriver::new(browser)))
    }

    #[cfg(not(feature = "browser"))]
    {
        let _ = browser;
        bail!("Built without browser support. Rebuild with `--features browser` or set SENDER_DRY_RUN=1.")
    }
}

fn print_progress(event: &ProgressEvent) {
    match event.outcome {
        AttemptOutcome::Success => eprintln!(
            "✅ Sent {}/{} ({:.1}%) → {}",
            event.index,
            event.total,
            event.percent(),
            event.identifier
        ),
        AttemptOutcome::Failure(ref reason) => eprintln!(
            "❌ Failed {}/{} ({:.1}%) → {}: {}",
            event.index,
            event.total,
            event.percent(),
            event.identifier,
            reason
        ),
    }
}
