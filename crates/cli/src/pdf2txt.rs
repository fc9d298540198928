//! pdf2txt: dump the text of a PDF to stdout or a file.

use anyhow::{Context, Result};
use clap::Parser;
use slate_core::{ExtractOptions, Pdf};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdf2txt", version, about = "Extract plain text from PDF files")]
struct Args {
    /// PDF file to read.
    input: PathBuf,

    /// Write output here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Password for encrypted files.
    #[arg(short = 'P', long, default_value = "")]
    password: String,

    /// Stop after this many pages (0 = all).
    #[arg(short = 'm', long, default_value_t = 0)]
    maxpages: usize,

    /// Emit raw page buffers (form-feed separated) instead of one
    /// cleaned string.
    #[arg(long)]
    raw: bool,

    /// Ignore the copy-protection flag on encrypted files.
    #[arg(long)]
    no_check_extractable: bool,

    /// Maximum in-line gap (in glyph widths) before a word break.
    #[arg(long, default_value_t = 0.1)]
    word_margin: f64,

    /// Maximum in-line gap (in glyph widths) between glyphs.
    #[arg(long, default_value_t = 1.0)]
    char_margin: f64,

    /// Maximum gap (in line heights) between lines of one paragraph.
    #[arg(long, default_value_t = 0.1)]
    line_margin: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    log::info!("{}: {} bytes", args.input.display(), data.len());

    let options = ExtractOptions {
        password: args.password.clone(),
        check_extractable: !args.no_check_extractable,
        char_margin: args.char_margin,
        line_margin: args.line_margin,
        word_margin: args.word_margin,
        maxpages: args.maxpages,
        ..ExtractOptions::default()
    };
    let pdf = Pdf::open(data, &options)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    log::info!("extracted {} pages", pdf.len());

    let out: Vec<u8> = if args.raw {
        pdf.raw_bytes()
    } else {
        let mut text = pdf.text().context("decoding extracted text")?;
        text.push('\n');
        text.into_bytes()
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))?
        }
        None => std::io::stdout().write_all(&out)?,
    }
    Ok(())
}
