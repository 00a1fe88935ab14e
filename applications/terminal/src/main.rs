/// Cadenza - terminal music player
use cadenza_core::{CategoryId, PlayerAdapter};
use cadenza_terminal::{
    screens::{self, ScreenCommand},
    AppConfig, AppContext, Flow, Library, SimulatedPlayer,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long a command may take to show up on screen
const RENDER_SETTLE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(about = "Curated audio player with a simulated track player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENZA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories
    Categories,
    /// List the tracks of a category
    Tracks {
        /// Category id (`all` for every track)
        category: String,
    },
    /// Play a track and open the player
    Play {
        /// Category id (`all` for every track)
        category: String,
        /// Track number in the list, starting at 1
        number: usize,
    },
    /// Interactive shell starting at the category menu (default)
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so screens stay readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadenza=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let library = Library::load_or_builtin(config.catalog.path.as_deref())?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Categories => {
            println!("{}", screens::render_home(library.catalogs()));
        }
        Commands::Tracks { category } => {
            let catalog = library.category(&CategoryId::new(category))?;
            println!("{}", screens::render_track_list(&catalog));
        }
        Commands::Play { category, number } => {
            anyhow::ensure!(number >= 1, "track numbers start at 1");
            let mut context = build_context(config, library);
            context.open_category(&CategoryId::new(category)).await?;
            let session = context.select_track(number - 1).await?;
            // Setup failures are shown with the player screen
            if let Err(e) = session.wait_until_ready().await {
                tracing::warn!(error = %e, "Player not ready");
            }
            run_shell(context).await?;
        }
        Commands::Shell => {
            let context = build_context(config, library);
            run_shell(context).await?;
        }
    }

    Ok(())
}

fn build_context(config: AppConfig, library: Library) -> AppContext {
    let player: Arc<dyn PlayerAdapter> = Arc::new(SimulatedPlayer::start(&config.simulator));
    tracing::info!(
        track_seconds = config.simulator.track_seconds,
        "Simulated player started"
    );
    AppContext::new(config, library, player)
}

async fn run_shell(mut context: AppContext) -> anyhow::Result<()> {
    render(&mut context).await;
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match screens::parse_command(&line) {
            Ok(ScreenCommand::Help) => {
                println!("{}", screens::HELP);
                continue;
            }
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        match context.handle(command).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => render(&mut context).await,
            Err(e) => eprintln!("{}", e),
        }
    }

    context.shutdown().await;
    Ok(())
}

async fn render(context: &mut AppContext) {
    if let Some(session) = context.session() {
        // Give the session a moment to apply the command
        let _ = tokio::time::timeout(
            RENDER_SETTLE,
            session.wait_until(|s| s.is_settled() || s.init_error.is_some()),
        )
        .await;
    }
    for failure in context.take_failures() {
        eprintln!("{}", failure);
    }

    match context.render() {
        Ok(screen) => println!("\n{}", screen),
        Err(e) => eprintln!("{}", e),
    }
}
