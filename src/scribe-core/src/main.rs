//! Scribe - Tesseract OCR from the command line

use anyhow::Result;
use clap::{Parser, Subcommand};
use scribe_core::colored_logger::{init_component_logger, Component};
use scribe_core::commands;
use scribe_core::config::Config;
use scribe_ocr::{EngineConfig, PageIteratorLevel, PageSegMode, Rect, RenderFormat};
use std::path::PathBuf;
use tracing::{debug, warn, Level};

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "OCR images into text, hOCR and searchable PDF with Tesseract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the traineddata files
    #[arg(long, global = true)]
    datapath: Option<PathBuf>,

    /// Recognition language(s), e.g. "eng+deu"
    #[arg(short, long, global = true)]
    lang: Option<String>,

    /// Page segmentation mode (0-13)
    #[arg(long, global = true, value_parser = parse_psm)]
    psm: Option<PageSegMode>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize image files and print their text
    Ocr {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Restrict recognition to x,y,width,height
        #[arg(long)]
        rect: Option<Rect>,

        /// Print hOCR instead of plain text
        #[arg(long)]
        hocr: bool,
    },

    /// List recognized elements with confidence and bounding box
    Words {
        file: PathBuf,

        /// block, paragraph, line, word or symbol
        #[arg(long, default_value = "word")]
        level: PageIteratorLevel,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Render image files into output documents
    Documents {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output basename per input, in order (default: input file stem)
        #[arg(short, long)]
        output: Vec<PathBuf>,

        /// Output formats: text, hocr, pdf, box, unlv
        #[arg(short, long, value_delimiter = ',')]
        format: Vec<RenderFormat>,

        /// Directory for outputs when no basename is given
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Check the engine and language data
    Check,
}

fn parse_psm(s: &str) -> std::result::Result<PageSegMode, String> {
    let n: u32 = s.parse().map_err(|_| format!("not a number: '{}'", s))?;
    PageSegMode::from_number(n).ok_or_else(|| format!("page segmentation mode out of range: {}", n))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let component = match cli.command {
        Commands::Ocr { .. } | Commands::Words { .. } => Component::Ocr,
        Commands::Documents { .. } => Component::Documents,
        Commands::Check => Component::Main,
    };
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_component_logger(component, level)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(profile) = &cli.profile {
        config = config.apply_profile(profile)?;
        debug!("applied profile '{}'", profile);
    }
    if let Some(datapath) = cli.datapath {
        config.engine.datapath = datapath;
    }
    if let Some(lang) = cli.lang {
        config.engine.language = lang;
    }
    if cli.psm.is_some() {
        config.engine.page_seg_mode = cli.psm;
    }
    if let Commands::Ocr { hocr: true, .. } = cli.command {
        config.output.hocr = true;
    }

    match cli.command {
        Commands::Check => cmd_check(&config.engine),
        command => run_engine_command(command, &config),
    }
}

#[cfg(feature = "native")]
fn run_engine_command(command: Commands, config: &Config) -> Result<()> {
    use scribe_ocr::{NativeApi, Tesseract};

    match command {
        Commands::Ocr { files, rect, .. } => {
            let ocr = Tesseract::with_config(NativeApi, config.engine_config());
            commands::run_ocr(&ocr, &files, rect, &mut std::io::stdout().lock())
        }
        Commands::Words { file, level, json } => {
            let ocr = Tesseract::with_config(NativeApi, config.engine.clone());
            commands::run_words(&ocr, &file, level, json, &mut std::io::stdout().lock())
        }
        Commands::Documents {
            inputs,
            output,
            format,
            output_dir,
        } => {
            let formats = if format.is_empty() {
                config.output.formats.clone()
            } else {
                format
            };
            let directory = output_dir.or_else(|| config.output.directory.clone());
            if let Some(dir) = &directory {
                std::fs::create_dir_all(dir)?;
            }
            let basenames = commands::document_basenames(&inputs, &output, directory.as_deref())?;

            let ocr = Tesseract::with_config(NativeApi, config.engine.clone());
            commands::run_documents(&ocr, &inputs, &basenames, &formats)
        }
        Commands::Check => cmd_check(&config.engine),
    }
}

#[cfg(not(feature = "native"))]
fn run_engine_command(_command: Commands, _config: &Config) -> Result<()> {
    anyhow::bail!("scribe was built without libtesseract; rebuild with `--features native`")
}

fn cmd_check(engine: &EngineConfig) -> Result<()> {
    println!("checking OCR setup...\n");

    #[cfg(feature = "native")]
    println!("  tesseract: {}", scribe_ocr::native_version());
    #[cfg(not(feature = "native"))]
    println!("  tesseract: not linked (build with --features native)");

    println!("  datapath:  {}", engine.datapath.display());
    println!("  language:  {}", engine.language);

    let missing = commands::missing_languages(engine);
    println!();
    if missing.is_empty() {
        println!("all checks passed!");
    } else {
        for lang in &missing {
            warn!("no {}.traineddata in {:?}", lang, engine.datapath);
        }
        println!("WARNING: missing language data: {}", missing.join(", "));
    }

    Ok(())
}
