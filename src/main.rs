//! kindling - Markdown to MOBI converter

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use kindling::{Compression, Config, ExthKind, MobiWriter, builder, markdown};

#[derive(Parser)]
#[command(name = "kindling")]
#[command(version, about = "Markdown to MOBI converter", long_about = None)]
#[command(after_help = "EXAMPLES:
    kindling -f book.md -o book.mobi      Convert a single file
    kindling -d chapters/ -c book.json    Convert a directory with settings")]
struct Cli {
    /// Convert a single Markdown file
    #[arg(short = 'f', value_name = "FILE", required_unless_present = "dir", conflicts_with = "dir")]
    file: Option<PathBuf>,

    /// Convert all *.md files under a directory into a single book
    #[arg(short = 'd', value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output path
    #[arg(short = 'o', value_name = "FILE", default_value = "out.mobi")]
    output: PathBuf,

    /// Settings file (JSON)
    #[arg(short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> kindling::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let sources = collect_sources(cli)?;

    let mut writer = MobiWriter::create(&cli.output)?;

    let title = if config.title.is_empty() {
        sources
            .first()
            .map(|path| file_stem(path))
            .unwrap_or_else(|| "Untitled".to_string())
    } else {
        config.title.clone()
    };
    writer.set_title(&title);
    writer.set_author(&config.author);
    writer.set_compression(if config.compress {
        Compression::PalmDoc
    } else {
        Compression::None
    });

    writer.add_metadata_record(ExthKind::DocType, "EBOK");
    writer.add_metadata_record(ExthKind::Author, &config.author);

    if let (Some(cover), Some(thumb)) = (&config.cover, &config.thumb) {
        writer.add_cover(fs::read(cover)?, fs::read(thumb)?);
    }

    for path in &sources {
        convert_file(&mut writer, path, &config)?;
    }

    writer.finalize()?;
    Ok(())
}

/// The files to convert, in reading order.
fn collect_sources(cli: &Cli) -> kindling::Result<Vec<PathBuf>> {
    if let Some(file) = &cli.file {
        return Ok(vec![file.clone()]);
    }

    let dir = cli.dir.as_deref().expect("clap requires -f or -d");
    let mut sources: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    sources.sort();
    Ok(sources)
}

/// Add one source file as a root chapter of the accumulating writer.
fn convert_file<W: std::io::Write>(
    writer: &mut MobiWriter<W>,
    path: &Path,
    config: &Config,
) -> kindling::Result<()> {
    let stem = file_stem(path);
    let name = config.names.get(&stem).cloned().unwrap_or(stem);

    let source = fs::read_to_string(path)?;
    let doc = markdown::parse_document(&source);

    let root = writer.new_chapter(&name, b"");
    builder::populate_chapter(writer.chapters_mut(), root, &doc, config.max_level)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chapter".to_string())
}
