//! Royal reading quest command line application.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use royal_reading_quest::{
    config::{Config, EXAMPLE_CONFIG},
    constants::{MAX_TOKENS, STEPS},
    gentext::{GeminiClient, HelperChat},
    quest::{CastleType, Mood, Sender},
    state::StateStore,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Quest state file (overrides the configuration)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Camera index to use
    #[arg(long)]
    cam: Option<i32>,

    /// Video file to replay instead of the camera
    #[arg(short, long)]
    video: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Choose today's mood and castle and start a new journey
    Setup {
        /// How you feel (happy, okay, tired)
        #[arg(short, long)]
        mood: Mood,

        /// Castle at the end of the path (classic, fairytale, crystal, forest)
        #[arg(short, long)]
        castle: CastleType,
    },
    /// Show the path to the castle
    Board,
    /// Catch a butterfly to earn a token
    Catch,
    /// Show journal messages
    Journal {
        /// Show badges instead
        #[arg(short, long)]
        badges: bool,
    },
    /// Talk to the Fairy Godmother
    Chat,
    /// Start a new journey after reaching the castle
    Reset,
    /// Print an example configuration file
    ExampleConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if matches!(args.command, Command::ExampleConfig) {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let config = load_config(&args)?;
    let mut store = StateStore::open(&config.storage.state_file)?;
    info!("Quest state: {}", store.path().display());

    match args.command {
        Command::Setup { mood, castle } => {
            store.update(|s| s.complete_setup(mood, castle))?;
            println!("Your journey to the {castle} castle begins! Feeling {mood} today.");
            print_board(&store);
        }
        Command::Board => print_board(&store),
        Command::Catch => catch(&config, &mut store).await?,
        Command::Journal { badges } => {
            if badges {
                print_badges(&store);
            } else {
                print_journal(&store);
            }
        }
        Command::Chat => chat(&config, &mut store).await?,
        Command::Reset => {
            if store.state().is_finale() {
                store.update(|s| s.reset_journey())?;
                println!("A new journey awaits! Run `royal-quest setup` to choose your mood and castle.");
            } else {
                println!("Reach the castle first! {} of {} tokens so far.", store.state().tokens, MAX_TOKENS);
            }
        }
        Command::ExampleConfig => {}
    }

    Ok(())
}

/// Load the configuration file and apply command line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(state) = &args.state {
        config.storage.state_file.clone_from(state);
    }
    if let Some(cam) = args.cam {
        config.camera.index = cam;
    }
    if let Some(video) = &args.video {
        config.camera.video_file = Some(video.clone());
    }

    config.validate()?;
    Ok(config)
}

fn print_board(store: &StateStore) {
    let state = store.state();
    if !state.is_setup {
        println!("Choose your mood and castle first: royal-quest setup --mood happy --castle classic");
        return;
    }

    let castle = state.castle_or_default();
    let sky = if castle.is_night_theme() { " under the stars" } else { "" };
    println!("The road to the {castle} castle{sky}");
    println!();

    let here = state.current_step_index();
    for (i, step) in STEPS.iter().enumerate() {
        let marker = if i == here { "👑" } else if i < here { "✔" } else { "·" };
        println!("  {marker} {step}");
    }
    println!();
    println!("Tokens: {} / {}", state.tokens, MAX_TOKENS);

    if let Some(entry) = state.latest_journal_entry() {
        println!("✨ {}", entry.text);
    }

    if state.is_finale() {
        println!();
        println!("You reached {}! Well done, Princess!", STEPS[STEPS.len() - 1]);
        println!("Run `royal-quest reset` to start a new journey.");
    }
}

fn print_journal(store: &StateStore) {
    let entries = &store.state().journal_entries;
    if entries.is_empty() {
        println!("Your journal is empty. Catch a butterfly to fill it!");
        return;
    }
    for entry in entries.iter().rev() {
        println!("{}  {}", entry.timestamp.format("%Y-%m-%d %H:%M"), entry.text);
    }
}

fn print_badges(store: &StateStore) {
    let state = store.state();
    println!("Total tokens earned: {}", state.total_tokens_earned);
    for badge in &state.achievements {
        let status = badge
            .unlocked_at
            .map_or_else(|| "locked".to_string(), |at| format!("unlocked {}", at.format("%Y-%m-%d")));
        println!("  {} {} - {} ({})", badge.icon, badge.name, badge.description, status);
    }
}

#[cfg(feature = "vision")]
async fn catch(config: &Config, store: &mut StateStore) -> Result<()> {
    use royal_reading_quest::app::{ButterflyGameApp, GameOutcome};
    use royal_reading_quest::capture::VideoSource;
    use royal_reading_quest::gentext::motivate;

    if !store.state().is_setup {
        print_board(store);
        return Ok(());
    }
    if store.state().is_finale() {
        println!("You already reached the castle! Run `royal-quest reset` to start a new journey.");
        return Ok(());
    }

    let source = config
        .camera
        .video_file
        .clone()
        .map_or(VideoSource::Camera(config.camera.index), VideoSource::File);

    let outcome = ButterflyGameApp::new(config.clone(), source).run()?;
    match outcome {
        GameOutcome::Caught(variant) => {
            let award = store.update(|s| s.award_token(Utc::now()))?;
            println!("You caught a {variant} butterfly! 🦋 Tokens: {} / {}", award.tokens, MAX_TOKENS);
            for id in &award.unlocked {
                if let Some(badge) = store.state().achievements.iter().find(|a| &a.id == id) {
                    println!("New badge: {} {}", badge.icon, badge.name);
                }
            }

            let message = motivate(&config.gentext, store.state().mood_or_default()).await;
            store.update(|s| s.record_journal_entry(message, Utc::now()))?;
            println!();
            print_board(store);
        }
        GameOutcome::PermissionDenied => {
            println!("Oh no! We need your magic camera to find the butterflies!");
        }
        GameOutcome::Closed => {
            println!("The butterflies will wait for you. Come back soon!");
        }
    }

    Ok(())
}

#[cfg(not(feature = "vision"))]
async fn catch(_config: &Config, _store: &mut StateStore) -> Result<()> {
    anyhow::bail!("This build has no camera support; rebuild with the `vision` feature")
}

async fn chat(config: &Config, store: &mut StateStore) -> Result<()> {
    let client = GeminiClient::new(&config.gentext)?;
    let name = client.child_name().to_string();
    let mut helper = HelperChat::with_history(client, &store.state().messages);

    if store.state().messages.is_empty() {
        let welcome = helper.welcome();
        store.update(|s| s.record_chat_message(welcome, Sender::Helper, Utc::now()))?;
    }

    for message in store.state().messages.iter().rev().take(6).rev() {
        print_chat_line(message.sender, &message.text);
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let text = line?;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "exit" | "quit" | "bye") {
            break;
        }

        store.update(|s| s.record_chat_message(text, Sender::User, Utc::now()))?;
        let reply = helper.send(text).await;
        print_chat_line(Sender::Helper, &reply);
        store.update(|s| s.record_chat_message(reply, Sender::Helper, Utc::now()))?;
    }

    println!("Goodbye, Princess {name}! ✨");
    Ok(())
}

fn print_chat_line(sender: Sender, text: &str) {
    match sender {
        Sender::User => println!("You: {text}"),
        Sender::Helper => println!("Fairy Godmother: {text}"),
        Sender::System => println!("✨ {text}"),
    }
}
