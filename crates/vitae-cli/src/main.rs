use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vitae_application::EditingContext;
use vitae_infrastructure::VitaePaths;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "vitae")]
#[command(about = "Vitae CLI - edit résumés with live preview and auto-save", long_about = None)]
struct Cli {
    /// Use this directory instead of the platform config directory
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and store the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your documents
    List,
    /// Create a new document
    Create {
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a document
    Delete { id: String },
    /// Duplicate a document as "<title> (Copy)"
    Duplicate { id: String },
    /// Print a document, or one section of it, as JSON
    Show {
        id: String,
        #[arg(long)]
        section: Option<String>,
    },
    /// Replace one section with raw JSON (inline or @file)
    Edit {
        id: String,
        #[arg(long)]
        section: String,
        #[arg(long, value_name = "JSON|@FILE")]
        json: String,
    },
    /// Rename a document
    SetTitle { id: String, title: String },
    /// Render a document to a file
    Render {
        id: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Tailor a document to a job description
    Tailor {
        id: String,
        /// File containing the job description
        #[arg(long)]
        job: PathBuf,
        /// Apply the tailored sections to the document
        #[arg(long)]
        apply: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = VitaePaths::new(cli.config_dir.as_deref())?;
    let _log_guard = logging::init(&paths.logs_dir(), cli.verbose);
    tracing::debug!("[vitae] Using config directory {}", paths.config_dir().display());

    let (ctx, auth) = EditingContext::connect(&paths).await?;

    match cli.command {
        Commands::Register { email, password } => {
            commands::account::register(&auth, &email, &password).await?
        }
        Commands::Login { username, password } => {
            commands::account::login(&ctx, &auth, &username, &password).await?
        }
        Commands::Logout => commands::account::logout(&ctx).await?,
        Commands::Whoami => commands::account::whoami(&ctx),
        Commands::List => commands::documents::list(&ctx).await?,
        Commands::Create { title } => commands::documents::create(&ctx, title.as_deref()).await?,
        Commands::Delete { id } => commands::documents::delete(&ctx, &id).await?,
        Commands::Duplicate { id } => commands::documents::duplicate(&ctx, &id).await?,
        Commands::Show { id, section } => {
            commands::documents::show(&ctx, &id, section.as_deref()).await?
        }
        Commands::Edit { id, section, json } => {
            commands::documents::edit(&ctx, &id, &section, &json).await?
        }
        Commands::SetTitle { id, title } => commands::documents::set_title(&ctx, &id, &title).await?,
        Commands::Render { id, out } => commands::preview::render(&ctx, &id, &out).await?,
        Commands::Tailor { id, job, apply } => {
            commands::preview::tailor(&ctx, &id, &job, apply).await?
        }
    }

    Ok(())
}
