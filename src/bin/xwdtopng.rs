use anyhow::{Context, Result};
use image::{DynamicImage, ImageDecoder, ImageFormat};
use image_xwd::xwd::{HeaderOptions, XwdDecoder};
use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

fn print_usage(program: &str) {
    eprintln!("XWD to PNG Converter");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] [input.xwd]", program);
    eprintln!();
    eprintln!("Reads standard input when no file is given.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -i, --info           Print the header fields instead of converting");
    eprintln!("  --raw                Print decoded pixel values, one row per line");
    eprintln!("  -v, --verbose        Show debug logging");
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    input: Option<PathBuf>,
    info: bool,
    raw: bool,
    verbose: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "-i" | "--info" => options.info = true,
            "--raw" => options.raw = true,
            "-v" | "--verbose" => options.verbose = true,
            "-h" | "--help" => options.help = true,
            s if s.starts_with('-') && s != "-" => {
                return Err(anyhow::anyhow!("Unknown option: {}", s));
            }
            s => {
                if options.input.is_some() {
                    return Err(anyhow::anyhow!("Only one input file can be given"));
                }
                if s != "-" {
                    options.input = Some(PathBuf::from(s));
                }
            }
        }
    }
    Ok(options)
}

/// PNG path for `input`: same name with a `.png` extension, never the input itself.
fn output_path(input: Option<&Path>) -> PathBuf {
    let Some(input) = input else {
        return PathBuf::from("out.png");
    };
    let output = input.with_extension("png");
    if output == input {
        let mut name = output.into_os_string();
        name.push(".png");
        PathBuf::from(name)
    } else {
        output
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("xwdtopng");
    let options = parse_args(args.get(1..).unwrap_or_default())?;

    if options.help {
        print_usage(program);
        return Ok(());
    }

    let default_filter = if options.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match &options.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            convert(BufReader::new(file), &options)
        }
        None => convert(io::stdin().lock(), &options),
    }
}

fn convert<R: BufRead>(reader: R, options: &Options) -> Result<()> {
    let decoder = XwdDecoder::with_options(reader, HeaderOptions::default())
        .context("Failed to read XWD header")?;

    let header = decoder.header();
    log::debug!(
        "{}x{} pixmap, {} bits per pixel, {} bytes per line, window {:?}",
        header.pixmap_width,
        header.pixmap_height,
        header.bits_per_pixel,
        header.bytes_per_line,
        String::from_utf8_lossy(&header.window_name),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if options.info {
        for (name, value) in header.info() {
            writeln!(out, "{} {}", name, value)?;
        }
        return Ok(());
    }

    if options.raw {
        for row in decoder.into_rows() {
            let row = row.context("Failed to decode scanline")?;
            let values: Vec<String> = row
                .iter()
                .flat_map(|px| [px.r, px.g, px.b])
                .map(|v| v.to_string())
                .collect();
            writeln!(out, "{}", values.join(" "))?;
        }
        return Ok(());
    }

    let output = output_path(options.input.as_deref());
    let (width, height) = decoder.dimensions();
    log::info!("Writing {}x{} image to {}", width, height, output.display());

    let img = DynamicImage::from_decoder(decoder).context("Failed to decode XWD image")?;
    img.save_with_format(&output, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(())
}
