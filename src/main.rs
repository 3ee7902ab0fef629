//! # Folio - Portfolio Interaction Engine
//!
//! Drives the page's interaction state machines headlessly from the terminal.
//!
//! ## Quick Start
//!
//! ```bash
//! # Flip the persisted theme
//! cargo run -- theme toggle
//!
//! # Watch the typewriter for five seconds
//! cargo run -- type --duration-ms 5000
//!
//! # Replay scroll offsets through a simulated viewport
//! cargo run -- scroll 0 40 900 3000 0
//!
//! # Validate and dry-run a contact message
//! cargo run -- submit --name Ada --email ada@example.com --message Hi --dry-run
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_core::config::Config;
use folio_core::event::{EngineEvent, EventBus, EventHandler};
use folio_core::form::{Field, FormController};
use folio_core::scroll::{Region, ScrollTracker, SimulatedViewport};
use folio_core::storage::{FileStore, MemoryStore};
use folio_core::{Content, ParticleSet, ThemePreference, ThemeStore, Typewriter};
use folio_delivery::{DryRunSender, MessageSender, UnavailableSender};

/// Folio - headless interaction engine for a portfolio page
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read or change the persisted theme preference
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Get)]
        action: ThemeAction,
    },

    /// Run the typewriter and print every frame
    Type {
        /// How long to animate
        #[arg(long, default_value_t = 6000)]
        duration_ms: u64,

        /// Phrases to cycle (overrides config)
        #[arg(long = "phrase", value_name = "TEXT")]
        phrases: Vec<String>,
    },

    /// Replay scroll offsets and print the derived signals
    Scroll {
        /// Offsets in px, in order
        #[arg(required = true)]
        offsets: Vec<f64>,

        /// Viewport height in px
        #[arg(long, default_value_t = 800.0)]
        viewport_height: f64,

        /// Hero region height in px
        #[arg(long, default_value_t = 900.0)]
        hero_height: f64,
    },

    /// Validate and send a contact message
    Submit {
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        message: String,

        /// Log the delivery request instead of failing for lack of a transport
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a freshly drawn particle set as JSON
    Particles {
        #[arg(long)]
        count: Option<usize>,
    },

    /// List the content registry
    Content,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeAction {
    Get,
    Toggle,
    Light,
    Dark,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting folio v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load(),
    };

    match args.command {
        Command::Theme { action } => run_theme(&config, action),
        Command::Type {
            duration_ms,
            phrases,
        } => run_typewriter(&config, phrases, Duration::from_millis(duration_ms)).await,
        Command::Scroll {
            offsets,
            viewport_height,
            hero_height,
        } => run_scroll(&config, &offsets, viewport_height, hero_height).await,
        Command::Submit {
            name,
            email,
            message,
            dry_run,
        } => {
            let fields = [(Field::Name, name), (Field::Email, email), (Field::Message, message)];
            if dry_run {
                run_submit(&config, DryRunSender::new(config.delivery.clone()), fields).await
            } else {
                run_submit(&config, UnavailableSender, fields).await
            }
        }
        Command::Particles { count } => {
            let set = ParticleSet::generate(count.unwrap_or(config.particles.count));
            println!("{}", serde_json::to_string_pretty(&*set)?);
            Ok(())
        }
        Command::Content => run_content(&config),
    }
}

fn open_theme(config: &Config) -> ThemeStore {
    let key = config.theme.storage_key.clone();
    let file = match &config.theme.storage_path {
        Some(path) => Ok(FileStore::new(path)),
        None => FileStore::default_location(),
    };

    match file {
        Ok(store) => ThemeStore::open(store, key),
        Err(err) => {
            tracing::warn!("No durable storage, preference will not persist: {}", err);
            ThemeStore::open(MemoryStore::new(), key)
        }
    }
}

fn run_theme(config: &Config, action: ThemeAction) -> anyhow::Result<()> {
    let mut theme = open_theme(config);
    match action {
        ThemeAction::Get => {}
        ThemeAction::Toggle => {
            theme.toggle();
        }
        ThemeAction::Light => theme.set(ThemePreference::Light),
        ThemeAction::Dark => theme.set(ThemePreference::Dark),
    }
    println!("{}", theme.get());
    Ok(())
}

async fn run_typewriter(
    config: &Config,
    phrases: Vec<String>,
    duration: Duration,
) -> anyhow::Result<()> {
    let phrases = if phrases.is_empty() {
        config.typewriter.phrases.clone()
    } else {
        phrases
    };

    let handle = Typewriter::new(phrases)?.mount(config.typewriter.clone());
    let mut frames = handle.subscribe();
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                println!("[{}] {:?} {}", frame.active_index, frame.phase, frame.displayed);
            }
        }
    }

    let last = handle.unmount();
    tracing::info!(steps = last.steps, "Typewriter stopped");
    Ok(())
}

async fn run_scroll(
    config: &Config,
    offsets: &[f64],
    viewport_height: f64,
    hero_height: f64,
) -> anyhow::Result<()> {
    let mut viewport = SimulatedViewport::new(viewport_height)
        .with_region(config.scroll.hero_region.clone(), Region::new(0.0, hero_height));
    let handle = ScrollTracker::mount(&config.scroll, &mut viewport);
    tokio::task::yield_now().await;

    for &offset in offsets {
        viewport.scroll_to(offset);
        tokio::task::yield_now().await;

        let signals = handle.signals();
        println!(
            "offset={:>7.1} chrome_solid={} scroll_top_visible={}",
            viewport.offset(),
            signals.chrome_solid(),
            signals.scroll_top_visible()
        );
    }

    handle.unmount();
    Ok(())
}

async fn run_submit<S: MessageSender>(
    config: &Config,
    sender: S,
    fields: [(Field, String); 3],
) -> anyhow::Result<()> {
    let bus = EventBus::new();
    let mut events = EventHandler::new(bus.subscribe());
    let handle = FormController::new(&config.form).mount(
        Arc::new(sender),
        config.delivery.recipient_name.clone(),
        bus,
    );

    for (field, value) in fields {
        handle.update_field(field, value);
    }
    handle.submit();

    loop {
        match events.next().await.context("form stopped before resolving")? {
            EngineEvent::SubmissionStarted => tracing::info!("Sending message"),
            EngineEvent::SubmissionSucceeded => {
                println!("Message sent");
                break;
            }
            EngineEvent::SubmissionFailed(notice) => {
                println!("{}", notice);
                break;
            }
            EngineEvent::InvalidSubmission(_) => {
                let mut state = handle.subscribe();
                let errors = state
                    .wait_for(|s| s.invalid_pulse)
                    .await
                    .context("form stopped before reporting errors")?
                    .errors
                    .clone();
                for field in Field::ALL {
                    let error = errors.get(field);
                    if !error.is_empty() {
                        println!("{}: {}", field, error);
                    }
                }
                break;
            }
            other => tracing::debug!(?other, "Ignoring event"),
        }
    }

    handle.unmount();
    Ok(())
}

fn run_content(config: &Config) -> anyhow::Result<()> {
    let content = match &config.content.path {
        Some(path) => Content::load_from(path)
            .with_context(|| format!("loading content from {}", path.display()))?,
        None => Content::default(),
    };

    for (category, skills) in content.skills_by_category() {
        let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();
        println!("{:?}: {}", category, names.join(", "));
    }
    for project in &content.projects {
        println!("project: {} ({})", project.title, project.tech.join(", "));
    }
    for (network, url) in content.social.iter() {
        println!("{}: {}", network, url);
    }
    for link in &content.nav {
        println!("nav: {} -> section {}", link.label, link.target_id());
    }
    Ok(())
}
