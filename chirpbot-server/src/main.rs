use std::time::Duration;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use chirpbot_core::services::EventDispatcher;
use chirpbot_core::tasks::spawn_credential_refresh_task;
use chirpbot_core::Error;

mod config;
mod context;

use config::{Args, TwitchConfig};
use context::ServerContext;

fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    tracing_log::LogTracer::init()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level)?;
    info!("chirpbot starting. tokens_db={}, responses_db={}", args.tokens_db, args.responses_db);

    let twitch = TwitchConfig::from_env()?;
    let ctx = ServerContext::new(&args, twitch).await?;

    let result = run_server(&ctx, &args).await;
    ctx.bot.close().await;
    if let Err(e) = &result {
        error!("Server error: {}", e);
    }
    result.map_err(Into::into)
}

async fn run_server(ctx: &ServerContext, args: &Args) -> Result<(), Error> {
    let credentials = &ctx.bot.credentials;

    if let Some((access, refresh)) = &ctx.twitch.seed_tokens {
        match credentials.add_credential(access, refresh).await {
            Ok(identity) => info!("seeded credential for {} ({})", identity.login, identity.user_id),
            Err(e) => warn!("seed token from environment was rejected: {}", e),
        }
    }

    let report = credentials.load_all_credentials().await?;
    if let Some(bot) = report.loaded.iter().find(|i| i.user_id == ctx.twitch.bot_id) {
        info!("Successfully logged in as: {}", bot.login);
    } else {
        warn!(
            "no valid credential for bot user_id={}; chat replies will fail until one is added",
            ctx.twitch.bot_id
        );
    }

    ctx.bot.responses.load_all().await?;

    let rx = ctx
        .event_bus
        .subscribe()
        .ok_or_else(|| Error::Config("event bus already has a consumer".into()))?;

    let dispatcher = EventDispatcher::new(ctx.bot.clone());
    let dispatcher_shutdown = ctx.event_bus.shutdown_rx.clone();
    let dispatcher_handle = tokio::spawn(async move { dispatcher.run(rx, dispatcher_shutdown).await });

    let refresh_handle = spawn_credential_refresh_task(
        credentials.clone(),
        Duration::from_secs(args.refresh_interval_secs),
        Duration::from_secs(args.refresh_margin_secs),
        ctx.event_bus.shutdown_rx.clone(),
    );

    let mut eventsub = ctx.eventsub_runtime();
    let mut eventsub_handle = tokio::spawn(async move {
        let res = eventsub.start_loop().await;
        info!("EventSub runtime stopped (status={:?})", eventsub.status());
        res
    });

    let mut outcome = Ok(());
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            match res {
                Ok(()) => warn!("Shutting down bot..."),
                Err(e) => error!("ctrl_c listener failed: {}", e),
            }
        }
        joined = &mut eventsub_handle => {
            outcome = flatten_join(joined);
            if let Err(e) = &outcome {
                error!("EventSub runtime stopped: {}", e);
            }
        }
    }

    ctx.event_bus.shutdown();

    if !eventsub_handle.is_finished() {
        if let Err(e) = flatten_join(eventsub_handle.await) {
            warn!("EventSub runtime exited with error during shutdown: {}", e);
        }
    }
    match dispatcher_handle.await {
        Ok(n) => info!("dispatcher stopped after {} event(s)", n),
        Err(e) => error!("dispatcher task failed: {}", e),
    }
    if let Err(e) = refresh_handle.await {
        error!("credential refresh task failed: {}", e);
    }

    outcome
}

fn flatten_join(joined: Result<Result<(), Error>, tokio::task::JoinError>) -> Result<(), Error> {
    match joined {
        Ok(res) => res,
        Err(e) => Err(Error::Platform(format!("EventSub task failed: {e}"))),
    }
}
