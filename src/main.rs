//! # Certigen CLI
//!
//! Command-line interface for generating personalized certificates.
//!
//! ## Usage
//!
//! ```bash
//! # Render one certificate from the stored workspace template
//! certigen render --name "Ada Lovelace"
//!
//! # Render with an explicit template and element file, as PDF
//! certigen render --template award.png --elements elements.json --name Ada --format pdf
//!
//! # Export one certificate per recipient into a directory
//! certigen batch --recipients people.json --out-dir out/
//!
//! # Email every recipient their certificate
//! certigen send --recipients people.json --mail-settings emailjs.json
//!
//! # Start the HTTP API
//! certigen serve --listen 0.0.0.0:8080
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use certigen::{
    CertigenError,
    compositor::Compositor,
    export::{self, ExportFormat, ExportOptions},
    fonts::FontRegistry,
    image_source::{ImageSource, TemplateImage},
    mail::{self, EmailJsMailer, MailSettings},
    model::{ElementList, FontWeight, RecipientList, RecipientRow},
    server::{self, ServerConfig},
    storage::{FileStore, Workspace},
};

/// Certigen - Certificate generator
#[derive(Parser, Debug)]
#[command(name = "certigen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace directory (templates, elements, recipients, fonts)
    #[arg(long, global = true, env = "CERTIGEN_DATA_DIR", default_value = "certigen-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Template, element and font inputs shared by the render commands.
#[derive(Args, Debug)]
struct Inputs {
    /// Template image: file path, http(s) URL or data URI (defaults to the workspace template)
    #[arg(long)]
    template: Option<String>,

    /// JSON file with the text elements (defaults to the workspace elements)
    #[arg(long, value_name = "FILE")]
    elements: Option<PathBuf>,

    /// Register a font: FAMILY=PATH or FAMILY:WEIGHT=PATH (repeatable)
    #[arg(long = "font", value_name = "SPEC")]
    fonts: Vec<String>,

    /// Output format
    #[arg(long, default_value = "jpg")]
    format: ExportFormat,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = export::DEFAULT_JPEG_QUALITY)]
    quality: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a single certificate
    Render {
        #[command(flatten)]
        inputs: Inputs,

        /// Recipient name substituted for {name}
        #[arg(long, default_value = "")]
        name: String,

        /// Output file (defaults to certificate-<name>.<ext>)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Export one certificate per recipient
    Batch {
        #[command(flatten)]
        inputs: Inputs,

        /// JSON array of {name, email, description} rows (defaults to the workspace recipients)
        #[arg(long, value_name = "FILE")]
        recipients: Option<PathBuf>,

        /// Directory to write the certificates into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Email every recipient their certificate
    Send {
        #[command(flatten)]
        inputs: Inputs,

        /// JSON array of {name, email, description} rows (defaults to the workspace recipients)
        #[arg(long, value_name = "FILE")]
        recipients: Option<PathBuf>,

        /// JSON file with service_id, template_id, user_id, from_name (defaults to the workspace settings)
        #[arg(long, value_name = "FILE")]
        mail_settings: Option<PathBuf>,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, env = "CERTIGEN_LISTEN", default_value = "127.0.0.1:8080")]
        listen: String,

        /// Allow API clients to name http(s) template URLs for the server to fetch
        #[arg(long, env = "CERTIGEN_ALLOW_REMOTE_TEMPLATES")]
        allow_remote_templates: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("certigen=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CertigenError> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve {
            listen,
            allow_remote_templates,
        } => runtime.block_on(server::serve(ServerConfig {
            listen_addr: listen,
            data_dir: cli.data_dir,
            allow_remote_templates,
        })),
        Commands::Render {
            inputs,
            name,
            output,
        } => {
            let workspace = open_workspace(&cli.data_dir)?;
            let (template, elements, fonts) = runtime.block_on(prepare(&workspace, &inputs))?;

            let surface = Compositor::new(&fonts).render(&template, elements.as_slice(), &name);
            let file = export::export(&surface, &name, &options(&inputs))?;
            let path = output.unwrap_or_else(|| PathBuf::from(&file.file_name));
            std::fs::write(&path, &file.bytes)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::Batch {
            inputs,
            recipients,
            out_dir,
        } => {
            let workspace = open_workspace(&cli.data_dir)?;
            let (template, elements, fonts) = runtime.block_on(prepare(&workspace, &inputs))?;
            let recipients = load_recipients(&workspace, recipients.as_deref())?;

            let report = export::export_batch_to_dir(
                &Compositor::new(&fonts),
                &template,
                elements.as_slice(),
                recipients.as_slice(),
                &options(&inputs),
                &out_dir,
            )?;
            for record in &report.records {
                if let Err(e) = &record.result {
                    eprintln!("  {}: {}", record.recipient.name, e);
                }
            }
            println!(
                "Exported {} of {} certificates to {}",
                report.succeeded(),
                report.records.len(),
                out_dir.display()
            );
            Ok(())
        }
        Commands::Send {
            inputs,
            recipients,
            mail_settings,
        } => {
            let workspace = open_workspace(&cli.data_dir)?;
            let (template, elements, fonts) = runtime.block_on(prepare(&workspace, &inputs))?;
            let recipients = load_recipients(&workspace, recipients.as_deref())?;
            let settings = load_mail_settings(&workspace, mail_settings.as_deref())?;
            let mailer = EmailJsMailer::new(settings)?;

            let compositor = Compositor::new(&fonts);
            let report = runtime.block_on(mail::dispatch_batch(
                &mailer,
                &compositor,
                &template,
                elements.as_slice(),
                recipients.as_slice(),
                &options(&inputs),
            ));

            for outcome in &report.outcomes {
                match &outcome.status {
                    mail::DispatchStatus::Sent => println!("  sent     {}", outcome.recipient.name),
                    mail::DispatchStatus::Skipped(reason) => {
                        println!("  skipped  {} ({})", outcome.recipient.name, reason)
                    }
                    mail::DispatchStatus::Failed(reason) => {
                        println!("  FAILED   {} ({})", outcome.recipient.name, reason)
                    }
                }
            }
            println!(
                "{} sent, {} skipped, {} failed",
                report.sent(),
                report.skipped(),
                report.failed()
            );
            Ok(())
        }
    }
}

fn open_workspace(data_dir: &Path) -> Result<Workspace, CertigenError> {
    Ok(Workspace::new(Arc::new(FileStore::open(data_dir)?)))
}

fn options(inputs: &Inputs) -> ExportOptions {
    ExportOptions::new(inputs.format).with_quality(inputs.quality)
}

/// Parse `FAMILY=PATH` or `FAMILY:WEIGHT=PATH`.
fn parse_font_spec(spec: &str) -> Result<(String, FontWeight, PathBuf), CertigenError> {
    let (family, path) = spec.split_once('=').ok_or_else(|| {
        CertigenError::InvalidInput(format!("Font must be FAMILY=PATH, got '{}'", spec))
    })?;
    let (family, weight) = match family.split_once(':') {
        Some((family, weight)) => (family, FontWeight::from(weight)),
        None => (family, FontWeight::normal()),
    };
    Ok((family.trim().to_string(), weight, PathBuf::from(path)))
}

/// Load the template, elements and fonts a render needs.
async fn prepare(
    workspace: &Workspace,
    inputs: &Inputs,
) -> Result<(TemplateImage, ElementList, FontRegistry), CertigenError> {
    let mut fonts = FontRegistry::new();
    fonts.restore(&workspace.font_uploads()?);
    for spec in &inputs.fonts {
        let (family, weight, path) = parse_font_spec(spec)?;
        fonts.register_file(&family, &weight, &path).await?;
    }

    let source = match &inputs.template {
        Some(reference) => ImageSource::parse(reference),
        None => workspace.current_image()?.ok_or_else(|| {
            CertigenError::InvalidInput(
                "No template given and none stored in the workspace (use --template)".to_string(),
            )
        })?,
    };
    let template = source.load().await?;

    let elements = match &inputs.elements {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => workspace.elements()?,
    };

    Ok((template, elements, fonts))
}

fn load_recipients(
    workspace: &Workspace,
    path: Option<&Path>,
) -> Result<RecipientList, CertigenError> {
    let Some(path) = path else {
        return workspace.recipients();
    };

    let rows: Vec<RecipientRow> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let mut recipients = RecipientList::new();
    let summary = recipients.import(rows);
    if summary.skipped > 0 {
        eprintln!("Skipped {} rows without a name", summary.skipped);
    }
    Ok(recipients)
}

fn load_mail_settings(
    workspace: &Workspace,
    path: Option<&Path>,
) -> Result<MailSettings, CertigenError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => workspace.mail_settings()?.ok_or_else(|| {
            CertigenError::InvalidInput(
                "No mail settings given and none stored in the workspace (use --mail-settings)"
                    .to_string(),
            )
        }),
    }
}
