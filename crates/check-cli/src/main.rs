//! `checkfill` CLI - manage bank check templates and print checks

mod cmd;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use check_template::{BankId, FieldPosition, FieldRole, PositionProperty, RenderMode};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cmd::RenderArgs;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "checkfill")]
#[command(about = "Calibrate bank check templates and print checks")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./checkfill.toml)
    #[arg(short, long, global = true, env = "CHECKFILL_CONFIG")]
    config: Option<PathBuf>,

    /// Bank store file, overriding `store_path` from the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage banks in the local store
    Banks {
        #[command(subcommand)]
        command: BankCommands,
    },

    /// Inspect and calibrate field positions
    Positions {
        #[command(subcommand)]
        command: PositionCommands,
    },

    /// Split an amount in words over one or two lines
    Wrap {
        /// Amount in words
        text: String,

        /// Box width in pixels
        #[arg(long, default_value = "500")]
        width: u32,

        /// Font size in pixels
        #[arg(long, default_value = "12")]
        font_size: u32,
    },

    /// Render a check as PDF and/or overlay JSON
    Render {
        /// Bank id
        id: BankId,

        /// calibration (colored frames, sample values) or print
        #[arg(short, long, default_value = "calibration")]
        mode: RenderMode,

        /// Check template PDF
        #[arg(long, conflicts_with = "fetch_pdf")]
        pdf: Option<PathBuf>,

        /// Download the bank's PDF from the server
        #[arg(long)]
        fetch_pdf: bool,

        /// Output PDF
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Print the overlay as JSON
        #[arg(long)]
        json: bool,

        /// Scale the overlay to this width in pixels
        #[arg(long)]
        presentation_width: Option<f64>,

        #[arg(long)]
        city: Option<String>,

        /// dd/mm/yyyy or yyyy-mm-dd
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        payee: Option<String>,

        #[arg(long)]
        amount: Option<String>,

        #[arg(long)]
        amount_in_words: Option<String>,

        #[arg(long)]
        reference: Option<String>,
    },

    /// Work against the check server
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
}

#[derive(Subcommand)]
enum BankCommands {
    /// List banks
    List,

    /// Create a bank with default positions
    Add {
        code: String,
        name: String,

        /// Path or URL of the check template PDF
        #[arg(long)]
        pdf_url: Option<String>,
    },

    /// Change code, name or PDF of a bank
    Update {
        id: BankId,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        pdf_url: Option<String>,

        /// Detach the PDF
        #[arg(long)]
        no_pdf: bool,
    },

    /// Delete a bank
    Remove { id: BankId },

    /// Show the resolved URL of a bank's PDF
    PdfUrl { id: BankId },
}

#[derive(Subcommand)]
enum PositionCommands {
    /// Show the positions of a bank
    Show {
        id: BankId,

        /// Print the stored JSON
        #[arg(long)]
        json: bool,
    },

    /// Set one property (x, y, width, fontSize) of one field
    Set {
        id: BankId,
        field: FieldRole,
        property: PositionProperty,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },

    /// Place a whole field rectangle
    Place {
        id: BankId,
        field: FieldRole,
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        width: u32,
        font_size: u32,
    },

    /// Remove an optional field (amountInWordsLine2, reference)
    Clear { id: BankId, field: FieldRole },

    /// Turn the second amount line on or off
    SecondLine { id: BankId, state: Switch },

    /// Load positions from a JSON file
    Import { id: BankId, file: PathBuf },

    /// Restore the default positions
    Reset { id: BankId },
}

#[derive(Subcommand)]
enum RemoteCommands {
    /// List the server's banks
    Banks,

    /// Set one position property on the server
    Set {
        id: BankId,
        field: FieldRole,
        property: PositionProperty,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let store = cli.store.unwrap_or_else(|| config.store_path.clone());
    debug!(store = %store.display(), "configuration loaded");

    match cli.command {
        Commands::Banks { command } => match command {
            BankCommands::List => cmd::cmd_banks_list(&store)?,
            BankCommands::Add {
                code,
                name,
                pdf_url,
            } => cmd::cmd_banks_add(&store, &code, &name, pdf_url.as_deref())?,
            BankCommands::Update {
                id,
                code,
                name,
                pdf_url,
                no_pdf,
            } => cmd::cmd_banks_update(&store, id, code, name, pdf_url, no_pdf)?,
            BankCommands::Remove { id } => cmd::cmd_banks_remove(&store, id)?,
            BankCommands::PdfUrl { id } => cmd::cmd_banks_pdf_url(&store, &config.client, id)?,
        },
        Commands::Positions { command } => match command {
            PositionCommands::Show { id, json } => cmd::cmd_positions_show(&store, id, json)?,
            PositionCommands::Set {
                id,
                field,
                property,
                value,
            } => {
                cmd::cmd_positions_set(&store, &config.layout, id, field, property, value).await?;
            }
            PositionCommands::Place {
                id,
                field,
                x,
                y,
                width,
                font_size,
            } => cmd::cmd_positions_place(
                &store,
                id,
                field,
                FieldPosition::new(x, y, width, font_size),
            )?,
            PositionCommands::Clear { id, field } => cmd::cmd_positions_clear(&store, id, field)?,
            PositionCommands::SecondLine { id, state } => {
                let enabled = matches!(state, Switch::On);
                cmd::cmd_positions_second_line(&store, &config.layout, id, enabled).await?;
            }
            PositionCommands::Import { id, file } => cmd::cmd_positions_import(&store, id, &file)?,
            PositionCommands::Reset { id } => cmd::cmd_positions_reset(&store, id)?,
        },
        Commands::Wrap {
            text,
            width,
            font_size,
        } => cmd::cmd_wrap(&config.layout, &text, width, font_size)?,
        Commands::Render {
            id,
            mode,
            pdf,
            fetch_pdf,
            out,
            json,
            presentation_width,
            city,
            date,
            payee,
            amount,
            amount_in_words,
            reference,
        } => {
            let args = RenderArgs {
                id,
                mode,
                pdf,
                fetch_pdf,
                out,
                json,
                presentation_width,
                city,
                date,
                payee,
                amount,
                amount_in_words,
                reference,
            };
            cmd::cmd_render(&store, &config.layout, &config.client, &args).await?;
        }
        Commands::Remote { command } => match command {
            RemoteCommands::Banks => cmd::cmd_remote_banks(&config.client).await?,
            RemoteCommands::Set {
                id,
                field,
                property,
                value,
            } => {
                cmd::cmd_remote_set(&config.client, &config.layout, id, field, property, value)
                    .await?;
            }
        },
    }

    Ok(())
}
