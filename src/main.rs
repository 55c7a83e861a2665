//! demande CLI: extract booking inquiries from emails.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::Result;

use demande_extract::config::ExtractConfig;
use demande_extract::intake::{JsonLinesSink, Pipeline, store_all};
use demande_extract::normalize::decode_bytes;
use demande_extract::{DemandeError, DemandeResult};

#[derive(Parser)]
#[command(name = "demande", version, about = "Booking-inquiry extraction from emails")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract records from an email and print them as JSON lines.
    Extract {
        /// Input file, or `-` for stdin.
        file: PathBuf,

        /// Treat the input as a raw RFC 5322 message.
        #[arg(long)]
        eml: bool,

        /// Keep every distinct record instead of the best one.
        #[arg(long)]
        multi: bool,

        /// Use the rule-based extractor only.
        #[arg(long)]
        no_ai: bool,
    },

    /// Print the effective configuration (API key redacted).
    Config,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli)?;
    Ok(())
}

fn run(cli: Cli) -> DemandeResult<()> {
    let mut config = ExtractConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            file,
            eml,
            multi,
            no_ai,
        } => {
            if multi {
                config.multi_record = true;
            }
            if no_ai {
                config.ai.enabled = false;
            }
            let pipeline = Pipeline::new(&config);
            let data = read_input(&file)?;
            let records = if eml {
                pipeline.process_eml(&data)?
            } else {
                pipeline.extract_text(&decode_bytes(&data, None))
            };

            let mut sink = JsonLinesSink::new(std::io::stdout().lock());
            let stored = store_all(&records, &mut sink);
            tracing::info!(records = records.len(), stored, ai = pipeline.uses_ai(), "done");
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> DemandeResult<Vec<u8>> {
    let read = if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data).map(|_| data)
    } else {
        std::fs::read(path)
    };
    read.map_err(|source| DemandeError::Input {
        path: path.to_path_buf(),
        source,
    })
}
