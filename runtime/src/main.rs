use anyhow::Result;
use clap::{Parser, Subcommand};
use privacy_probe::cli::crawl_cmd::{self, CrawlArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "privacy-probe", version, about = "Measure and rank the privacy behavior of websites")]
struct Cli {
    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress and summary output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe every site in a list and rank them by privacy score
    Crawl(CrawlArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Output helpers read these instead of threading flags everywhere.
    if cli.json {
        std::env::set_var("PRIVACY_PROBE_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("PRIVACY_PROBE_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("PRIVACY_PROBE_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("PRIVACY_PROBE_NO_COLOR", "1");
    }

    init_tracing(cli.verbose, cli.quiet)?;

    match cli.command {
        Command::Crawl(args) => crawl_cmd::run(args).await,
    }
}

fn init_tracing(verbose: bool, quiet: bool) -> Result<()> {
    let level = if verbose {
        "privacy_probe=debug"
    } else if quiet {
        "privacy_probe=warn"
    } else {
        "privacy_probe=info"
    };
    let filter = EnvFilter::from_default_env().add_directive(level.parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("PRIVACY_PROBE_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.with_ansi(privacy_probe::cli::output::color_enabled()).init();
    }
    Ok(())
}
