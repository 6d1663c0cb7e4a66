//! Process-per-event entry point, run as a GitHub Action.
//!
//! The Actions runner supplies the event name and a payload file through
//! `GITHUB_EVENT_NAME`/`GITHUB_EVENT_PATH`, and the `with:` inputs as
//! `INPUT_*` variables. One invocation handles one event and exits.

use anyhow::Context;

use cherrypicker::config::Config;
use cherrypicker::git::CommitIdentity;
use cherrypicker::github::OctocrabApi;
use cherrypicker::picker::{Cherrypicker, GitReplayer};
use cherrypicker::webhooks::parse_webhook;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let token = std::env::var("INPUT_REPO-TOKEN")
        .or_else(|_| std::env::var("GITHUB_TOKEN"))
        .context("neither the repo-token input nor GITHUB_TOKEN is set")?;
    let event_name =
        std::env::var("GITHUB_EVENT_NAME").context("GITHUB_EVENT_NAME is not set")?;
    let event_path =
        std::env::var("GITHUB_EVENT_PATH").context("GITHUB_EVENT_PATH is not set")?;
    let payload = tokio::fs::read(&event_path)
        .await
        .with_context(|| format!("could not read the event payload at {event_path}"))?;

    let Some(event) = parse_webhook(&event_name, &payload)
        .with_context(|| format!("could not parse the {event_name} payload"))?
    else {
        tracing::info!(%event_name, "event is not one the bot reacts to");
        return Ok(());
    };

    let config = Config::from_env();
    let api = OctocrabApi::from_token(token.clone()).context("could not build the API client")?;
    let bot_user = api
        .current_user()
        .await
        .context("could not resolve the authenticated bot user")?;
    tracing::info!(%bot_user, repo = %event.repo_id(), "handling event");

    let identity = CommitIdentity {
        name: bot_user.clone(),
        email: format!("{bot_user}@users.noreply.github.com"),
    };
    let replayer = GitReplayer::new(api.clone(), identity, token);

    Cherrypicker::new(api, replayer, config, bot_user)
        .handle_event(&event)
        .await
        .context("orchestration failed")?;

    Ok(())
}
