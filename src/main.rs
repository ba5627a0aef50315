use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use hyrox_roast::config::{load_env_file, Config};
use hyrox_roast::model::{ShareCardSpec, ShareFormat, SITE_URL};
use hyrox_roast::roaster::MISSING_API_KEY;
use hyrox_roast::server::{router, AppState, FONT_NOT_CONFIGURED};
use hyrox_roast::share_card::share_card_file_name;
use hyrox_roast::{build_prompt, parse_result_page, validate_results_url, RoastError};

#[derive(Parser)]
#[command(name = "hyrox-roast", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Roast a single result from the terminal.
    Roast(RoastArgs),
}

#[derive(Args)]
struct RoastArgs {
    /// hyresult.com result page.
    #[arg(required_unless_present = "html")]
    url: Option<String>,

    /// Parse a saved result page instead of fetching one.
    #[arg(long, conflicts_with = "url")]
    html: Option<PathBuf>,

    /// Write a share card here; a directory gets the default file name.
    #[arg(long)]
    card: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<ShareFormat>,

    /// Link appended to the share text.
    #[arg(long, default_value = SITE_URL)]
    link: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = load_env_file(None);
    let cli = Cli::parse();
    init_tracing(cli.config.log_json);
    match env_file {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded env file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "ignoring unreadable env file"),
    }

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config).await,
        Command::Roast(args) => roast(cli.config, args).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let _ = if json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.try_init()
    };
}

async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    let app = router(AppState::new(
        config.roaster(),
        config.share_card_renderer()?,
    ));
    if config.is_vercel() {
        info!("VERCEL=1, requests are routed by the platform");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn roast(config: Config, args: RoastArgs) -> Result<(), Box<dyn Error>> {
    let variant = config.prompt_variant;
    let data = match &args.html {
        Some(path) => parse_result_page(&std::fs::read_to_string(path)?),
        None => {
            let url = validate_results_url(args.url.as_deref())?;
            config.results_client().get_result(url).await?
        }
    };
    println!("{}\n", serde_json::to_string_pretty(&data)?);

    let prompt = build_prompt(&data, variant);
    println!("--- prompt ({variant}) ---\n{prompt}\n");

    let generator = config
        .gemini_client()
        .ok_or_else(|| RoastError::Config(MISSING_API_KEY.to_string()))?;
    let roast = generator.generate_roast(&prompt, variant).await?;
    println!("--- {} ---\n{}\n", roast.title, roast.roast);
    println!("--- share text ---\n{}", roast.share_text(&data.athlete_name, &args.link));

    if let Some(card) = args.card {
        let renderer = config
            .share_card_renderer()?
            .ok_or_else(|| RoastError::Config(FONT_NOT_CONFIGURED.to_string()))?;
        let spec = ShareCardSpec {
            format: args.format.unwrap_or_default(),
            title: roast.title,
            total_time: data.total_time,
            roast_text: roast.roast,
        };
        let path = if card.is_dir() {
            card.join(share_card_file_name(&data.athlete_name, args.format))
        } else {
            card
        };
        std::fs::write(&path, renderer.render_png(&spec)?)?;
        info!(path = %path.display(), "wrote share card");
    }
    Ok(())
}
