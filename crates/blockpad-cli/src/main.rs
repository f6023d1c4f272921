//! Command-line front end for blockpad.
//!
//! Usage:
//!   blockpad [path] [--detect] [--write]
//!
//! Prints the block outline of a document. `--detect` runs one language
//! auto-detection pass over the blocks marked `-a` first, and `--write`
//! saves the result back. Without a path the configured `document_path` is
//! used; a missing file starts a new document.

use anyhow::{Context, Result, bail};
use blockpad_config::Config;
use blockpad_engine::detection::{AutoDetector, ClassifierWorker, DetectionSettings};
use blockpad_engine::{Document, IoError, io};
use blockpad_syntax::Language;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let matches = Command::new("blockpad")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and auto-detect the blocks of a blockpad document")
        .arg(Arg::new("path").help("Path to the document").index(1))
        .arg(
            Arg::new("detect")
                .long("detect")
                .short('d')
                .help("Run language auto-detection on auto blocks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("write")
                .long("write")
                .short('w')
                .help("Write the document back after detection")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let path = match matches.get_one::<String>("path") {
        Some(path) => PathBuf::from(path),
        None => match &config.document_path {
            Some(path) => path.clone(),
            None => {
                eprintln!("Error: No document path provided and none configured");
                eprintln!("Usage: blockpad <document-path> [--detect] [--write]");
                eprintln!(
                    "Or set document_path in the config file at {}",
                    config_path.display()
                );
                process::exit(1);
            }
        },
    };

    let default_language = match Language::from_token(&config.default_language) {
        Some(language) => language,
        None => {
            log::warn!(
                "unknown default_language '{}' in config, using {}",
                config.default_language,
                Language::DEFAULT.token()
            );
            Language::DEFAULT
        }
    };

    let mut doc = match io::read_document(&path) {
        Ok(doc) => doc,
        Err(IoError::NotFound(_)) => {
            log::info!("{} not found, starting a new document", path.display());
            Document::new()
        }
        Err(e) => bail!("Failed to read {}: {e}", path.display()),
    }
    .with_default_language(default_language);

    if matches.get_flag("detect") {
        let detected = detect(&mut doc, &config);
        log::info!("{detected} block(s) retyped");
    }

    print_outline(&doc);

    if matches.get_flag("write") {
        io::write_document(&path, &doc)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}

fn settings_from(config: &Config) -> DetectionSettings {
    let d = &config.detection;
    DetectionSettings {
        enabled: d.enabled,
        min_content_length: d.min_content_length,
        diff_fraction: d.diff_fraction,
        confidence_threshold: d.confidence_threshold,
        request_timeout: Duration::from_millis(d.request_timeout_ms),
    }
}

fn detect(doc: &mut Document, config: &Config) -> usize {
    let settings = settings_from(config);
    if !settings.enabled {
        log::info!("auto-detection disabled in config");
        return 0;
    }
    let timeout = settings.request_timeout;
    let mut detector = AutoDetector::new(settings);

    let mut applied = detector.detect_all(doc).len();
    applied += detector.wait(doc, timeout).len();
    ClassifierWorker::shutdown();
    applied
}

fn print_outline(doc: &Document) {
    for block in doc.index().blocks() {
        let content = doc.block_content(block);
        let language = block
            .language
            .language
            .map(|l| l.display_name())
            .unwrap_or("unknown language");
        let nested = match doc.nested().tree(block.id) {
            Some(tree) if tree.has_errors() => " [syntax errors]",
            Some(_) => " [parsed]",
            None => "",
        };
        println!(
            "{:>3}  {:<12} {:<18} {:>6}..{:<6} {} line(s){}",
            block.ordinal,
            format!(
                "{}{}",
                block.language.token,
                if block.language.auto_detect { "-a" } else { "" }
            ),
            language,
            block.range.start,
            block.range.end,
            content.lines().count(),
            nested
        );
    }
}
