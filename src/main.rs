use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tunedeck::commands::music::{
    audio_sources::{
        TrackResolver,
        suggestions::{SuggestionService, provider_from_config},
        ytdlp::YtDlpBackend,
    },
    pause::*,
    play::*,
    queue::*,
    remove::*,
    skip::*,
    stop::*,
    utils::music_manager::SessionRegistry,
    volume::*,
};
use tunedeck::events::Handler;
use tunedeck::{CommandResult, Config, Context, Data, Error};

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tunedeck=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    // Process-wide state, injected into commands and the component handler
    let registry = SessionRegistry::new(config.playback.clone());
    let backend = Arc::new(YtDlpBackend::new(config.ytdlp_path.clone()));
    let resolver = Arc::new(TrackResolver::new(
        backend.clone(),
        config.resolver.clone(),
        config.stream_user_agent.clone(),
    ));
    let suggestions = Arc::new(SuggestionService::new(
        provider_from_config(&config),
        backend,
        config.suggestions.clone(),
    ));

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        register(),
        help(),
        play(),
        pause(),
        queue(),
        remove(),
        skip(),
        stop(),
        volume(),
    ];

    let data = Data {
        config: config.clone(),
        registry: registry.clone(),
        resolver,
        suggestions,
    };

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        });

    let client_builder = ClientBuilder::new(config.discord_token.clone(), intents)
        .event_handler(Handler::new(registry))
        .framework(framework.build());

    // Create and run client
    build_and_start_client(client_builder).await
}

async fn build_and_start_client(client_builder: ClientBuilder) -> Result<(), Error> {
    use songbird::SerenityInit;

    let mut client = client_builder.register_songbird().await?;
    client.start().await.map_err(Into::into)
}
