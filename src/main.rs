use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{debug, warn};
use salsa_pdfs::{
    config::Config,
    renderer::RendererKind,
    runner::{ExportOptions, Exporter},
    salsa::{Session, SessionOptions},
    utils::DEFAULT_PDF_DIR,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Find Salsa Classic public-facing pages and write them as PDFs", long_about = None)]
struct Args {
    /// YAML file with login credentials and the content types to export
    #[arg(short = 'l', long)]
    login: PathBuf,
    /// Directory to store PDFs, created as needed
    #[arg(short = 'p', long, default_value = DEFAULT_PDF_DIR)]
    pdfs: PathBuf,
    /// Also keep the normalized HTML of every page in this directory
    #[arg(long)]
    html: Option<PathBuf>,
    /// Only export email blasts
    #[arg(short = 'b', long)]
    just_blasts: bool,
    /// Program used to turn HTML into PDF
    #[arg(short = 'r', long, value_enum, default_value_t = RendererKind::Wkhtmltopdf)]
    renderer: RendererKind,
    /// Name files "<date> <key> <title>.pdf" instead of "<key>.pdf"
    #[arg(long)]
    descriptive_names: bool,
    /// Render records again even if their PDF already exists
    #[arg(long)]
    overwrite: bool,
    /// HTTP timeout in seconds
    #[arg(short = 't', long, default_value_t = 60)]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    debug!("Starting with {:#?}", args);

    let config = Config::load(&args.login)?;
    let selector = if args.just_blasts {
        config.selector.just_blasts()
    } else {
        config.selector.clone()
    };
    if selector.is_empty() {
        warn!("email_blast is not enabled in {:?}, nothing to do", args.login);
        return Ok(());
    }

    let renderer = args.renderer.create()?;

    let session_options = SessionOptions::default_builder()
        .timeout(args.timeout)
        .build()?;
    let session = Session::authenticate(&config.credentials, &session_options)
        .context(format!("could not log in to {}", config.credentials.host))?;
    println!("Salsa: creating PDFs for {}", session.org_name());

    let options = ExportOptions::default_builder()
        .pdf_dir(args.pdfs)
        .html_dir(args.html)
        .descriptive_names(args.descriptive_names)
        .overwrite(args.overwrite)
        .domain_rewrites(config.domain_rewrites.clone())
        .build()?;

    let summary = Exporter::new(&session, renderer.as_ref(), options).run(&selector);
    println!("{}", summary);

    Ok(())
}
