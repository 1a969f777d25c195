//! Binary entrypoint for the EcoQuest CLI.
//!
//! Commands:
//! - `init` - create a starter `ecoquest.toml`
//! - `signup <username>` / `login <username>` - create or resume an account
//! - `profile`, `garden`, `achievements` - show the signed-in player's state
//! - `learn <lesson>`, `story <story>`, `play <game>` - record activity results
//! - `shop` / `buy <item>` - browse and buy garden items
//! - `status` - config summary plus a remote liveness probe
//! - `logout` - end the session (the account is kept)
//!
//! See the library crate docs for module-level details: `ecoquest::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use rand::seq::SliceRandom;

// Use the published library crate modules instead of redefining them here.
use ecoquest::config::Config;
use ecoquest::engine::achievements::BUILTIN_ACHIEVEMENTS;
use ecoquest::engine::content::{ECO_TIPS, GAMES, GARDEN_SHOP, LESSONS, STORIES};
use ecoquest::engine::session::{Session, SessionEvent, SessionUpdate};
use ecoquest::engine::store::{ProfileStore, ProfileStoreBuilder};
use ecoquest::remote::{RemoteClient, SyncAdapter};
use ecoquest::Profile;

#[derive(Parser)]
#[command(name = "ecoquest")]
#[command(about = "Progression and rewards core for the EcoQuest learning app")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "ecoquest.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration file
    Init,
    /// Create a new player account and sign in
    Signup {
        username: String,
        /// Avatar emoji; must come from the EcoQuest avatar set
        #[arg(short, long, default_value = "🌱")]
        avatar: String,
    },
    /// Sign in to an existing account
    Login { username: String },
    /// Show the signed-in player's profile
    Profile,
    /// Record a completed lesson quiz
    Learn {
        /// Lesson id, e.g. l1
        lesson: String,
        /// Quiz score
        #[arg(short, long, default_value_t = 0)]
        score: u32,
    },
    /// Mark a story as read
    Story {
        /// Story id, e.g. s1
        story: String,
    },
    /// Record a mini-game result
    Play {
        /// Game id, e.g. sort
        game: String,
        /// Final score; rewards require the game's win threshold
        #[arg(short, long)]
        score: u32,
    },
    /// List the garden shop catalog
    Shop,
    /// Buy a garden item by id
    Buy { item: String },
    /// Show the garden
    Garden,
    /// Show achievements (earned and remaining)
    Achievements,
    /// Show configuration and remote service status
    Status,
    /// End the session; the account is kept
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes the default later)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    if let Commands::Init = cli.command {
        info!("Initializing new EcoQuest configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = match pre_config {
        Some(config) => config,
        None => Config::load(&cli.config).await?,
    };
    let store = open_store(&config)?;

    if let Commands::Status = cli.command {
        return show_status(&config, &store).await;
    }

    let remote = if config.remote.enabled {
        let token = store.token()?;
        Some(RemoteClient::new(&config.remote).with_token(token))
    } else {
        None
    };
    let adapter = match remote {
        Some(client) => SyncAdapter::new(client, store),
        None => SyncAdapter::local_only(store),
    };
    let mut session = Session::new(adapter);

    match cli.command {
        Commands::Init | Commands::Status => unreachable!("handled above"),
        Commands::Signup { username, avatar } => {
            let password = prompt_new_password()?;
            let update = session.signup(&username, &password, &avatar).await?;
            println!("Welcome to EcoQuest, {} {}!", update.profile.avatar, update.profile.username);
            report(&update);
            print_tip();
        }
        Commands::Login { username } => {
            let password = rpassword::prompt_password("Password: ")?;
            let update = session.login(&username, &password).await?;
            println!("Welcome back, {} {}!", update.profile.avatar, update.profile.username);
            report(&update);
            print_tip();
        }
        Commands::Profile => {
            let update = resume(&mut session).await?;
            print_profile(&update.profile);
        }
        Commands::Learn { lesson, score } => {
            resume(&mut session).await?;
            let update = session.complete_lesson(&lesson, score).await?;
            println!("Lesson {} complete! XP: {}", lesson, update.profile.xp);
            report(&update);
            print_tip();
        }
        Commands::Story { story } => {
            resume(&mut session).await?;
            let update = session.read_story(&story).await?;
            println!("Story {} finished! XP: {}", story, update.profile.xp);
            report(&update);
        }
        Commands::Play { game, score } => {
            resume(&mut session).await?;
            let before = session.profile().map(|p| p.xp).unwrap_or(0);
            let update = session.play_game(&game, score).await?;
            if update.profile.xp > before {
                println!("You won! +{} XP", update.profile.xp - before);
            } else {
                println!("Good try! Play again to beat the target score.");
            }
            report(&update);
        }
        Commands::Shop => {
            println!("Garden Shop:");
            for entry in GARDEN_SHOP {
                println!("  {:>4}  {} {:<12} {:>3} coins ({})", entry.id, entry.emoji, entry.name, entry.cost, entry.kind);
            }
        }
        Commands::Buy { item } => {
            resume(&mut session).await?;
            let update = session.buy_garden_item(&item).await?;
            println!("Planted! EcoCoins left: {}", update.profile.eco_coins);
            report(&update);
        }
        Commands::Garden => {
            let update = resume(&mut session).await?;
            if update.profile.garden.is_empty() {
                println!("Your garden is empty. Try `ecoquest shop`!");
            } else {
                println!("Your garden:");
                for entry in &update.profile.garden {
                    println!("  {} {} ({})", entry.emoji, entry.name, entry.kind);
                }
            }
        }
        Commands::Achievements => {
            let update = resume(&mut session).await?;
            println!("Achievements:");
            for def in BUILTIN_ACHIEVEMENTS {
                let mark = if update.profile.achievements.contains(def.id) {
                    def.emoji
                } else {
                    "🔒"
                };
                println!("  {} {:<12} {}", mark, def.title, def.description);
            }
        }
        Commands::Logout => {
            session.logout()?;
            println!("Logged out. See you soon!");
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<ProfileStore> {
    let path = std::path::Path::new(&config.app.data_dir).join("profiles.db");
    let mut builder = ProfileStoreBuilder::new(path);
    if let Some(params) = config.argon2_params()? {
        builder = builder.with_argon2_params(params);
    }
    Ok(builder.open()?)
}

/// Re-establish the session for a new process: the remote token or the local
/// active-account pointer must already be present.
async fn resume(session: &mut Session<RemoteClient>) -> Result<SessionUpdate> {
    let update = session.refresh().await?;
    report(&update);
    Ok(update)
}

fn report(update: &SessionUpdate) {
    for event in &update.events {
        match event {
            SessionEvent::LeveledUp { to, .. } => {
                println!("⭐ Level up! You are now level {}!", to);
            }
            SessionEvent::AchievementUnlocked { id } => {
                match ecoquest::engine::achievements::find_achievement(id) {
                    Some(def) => println!("🏆 Achievement unlocked: {} {}!", def.emoji, def.title),
                    None => println!("🏆 Achievement unlocked: {}!", id),
                }
            }
        }
    }
}

fn print_profile(profile: &Profile) {
    println!("{} {} (level {})", profile.avatar, profile.username, profile.level);
    println!("  XP:           {}", profile.xp);
    println!("  EcoCoins:     {}", profile.eco_coins);
    println!("  CO2 saved:    {:.1} kg", profile.carbon_saved);
    println!("  Streak:       {} day(s)", profile.streak);
    println!(
        "  Lessons:      {}/{}",
        profile.completed_lessons.len(),
        LESSONS.len()
    );
    println!(
        "  Stories:      {}/{}",
        profile.completed_stories.len(),
        STORIES.len()
    );
    println!("  Games played: {}", profile.games_played);
    println!("  Garden items: {}", profile.garden.len());
    println!(
        "  Achievements: {}/{}",
        profile.achievements.len(),
        BUILTIN_ACHIEVEMENTS.len()
    );
}

fn print_tip() {
    if let Some(tip) = ECO_TIPS.choose(&mut rand::thread_rng()) {
        println!("{}", tip);
    }
}

async fn show_status(config: &Config, store: &ProfileStore) -> Result<()> {
    println!("EcoQuest v{}", env!("CARGO_PKG_VERSION"));
    println!("  Data dir:    {}", config.app.data_dir);
    println!("  Accounts:    {}", store.list_usernames()?.len());
    match store.active_username()? {
        Some(username) => println!("  Signed in:   {} (local)", username),
        None if store.token()?.is_some() => println!("  Signed in:   yes (remote token)"),
        None => println!("  Signed in:   no"),
    }
    println!("  Content:     {} lessons, {} stories, {} games", LESSONS.len(), STORIES.len(), GAMES.len());
    if config.remote.enabled {
        let client = RemoteClient::new(&config.remote);
        let healthy = client.health().await;
        println!("  Remote:      {} ({})", config.remote.base_url, if healthy { "healthy" } else { "unreachable" });
    } else {
        println!("  Remote:      disabled");
    }
    Ok(())
}

fn prompt_new_password() -> Result<String> {
    let pass1 = rpassword::prompt_password("New password: ")?;
    let pass2 = rpassword::prompt_password("Confirm password: ")?;
    if pass1 != pass2 {
        anyhow::bail!("passwords do not match");
    }
    Ok(pass1)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from config, bumped by CLI verbosity
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let mutex = std::sync::Mutex::new(f);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                writeln!(fmt, "{}", line)
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
