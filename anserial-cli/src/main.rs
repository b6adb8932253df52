use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anserial::prelude::*;
use anserial::printer::terminal_width;
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use clap::{Parser as ClapParser, Subcommand};
use log::{info, warn};
use termcolor::{ColorChoice, StandardStream};

#[derive(ClapParser)]
#[command(name = "anserial", version, about = "Encode, decode and inspect anserial streams")]
pub struct Arguments {
    /// Enable verbose logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample results stream in the canonical envelope
    Generate {
        /// Number of result entries
        #[arg(short, long, default_value_t = 100)]
        entries: u32,
        /// Output file (stdout by default)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a binary stream and pretty-print it
    Dump {
        /// Input file (stdin by default)
        input: Option<PathBuf>,
    },
    /// Parse s-expression text and pretty-print it
    Parse {
        /// Input file (stdin by default)
        input: Option<PathBuf>,
    },
    /// Decode a results stream and print every result entry
    Results {
        /// Input file (stdin by default)
        input: Option<PathBuf>,
    },
}

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin().lock()),
    })
}

fn generate(entries: u32, output: Option<&Path>) -> anserial::Result<()> {
    let mut ser = Serializer::new();
    let data = ser.default_layout()?;
    let results = ser.add_container(data)?;

    for i in 0..entries {
        ser.add_literal(
            results,
            &literal![
                "results",
                ["i-19937", (i.wrapping_mul(19937))],
                ["i-2048", (i.wrapping_mul(2048))]
            ],
        )?;
    }
    ser.add_symtab(0)?;
    info!("Generated {} entities for {} entries.", ser.len(), entries);

    match output {
        Some(path) => ser.write_to(BufWriter::new(File::create(path)?))?,
        None => ser.write_to(io::stdout().lock())?,
    }
    Ok(())
}

fn decode(input: Option<&Path>) -> anserial::Result<Document> {
    let mut session = Deserializer::new();
    session.ingest_reader(open_input(input)?)?;
    if session.pending_bytes() != 0 {
        warn!(
            "Ignoring {} trailing bytes of an incomplete record.",
            session.pending_bytes()
        );
    }
    Ok(Document::from_deserializer(session))
}

fn dump(input: Option<&Path>) -> anserial::Result<()> {
    let doc = decode(input)?;
    if let Some(version) = doc.version() {
        info!("Stream written by format version {version}.");
    }

    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut stdout = stdout.lock();
    doc.pretty_render_to(terminal_width(), &mut stdout)?;
    Ok(())
}

fn parse_text(input: Option<&Path>) -> anserial::Result<()> {
    let mut source = String::new();
    open_input(input)?.read_to_string(&mut source)?;

    match parse(&source) {
        Ok(tree) => {
            if let Some(root) = tree.root() {
                root.pretty_print()?;
            }
            Ok(())
        }
        Err(Error::Syntax {
            line,
            span,
            message,
        }) => {
            let file = input
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<stdin>".to_string());
            let mut colors = ColorGenerator::new();

            Report::build(ReportKind::Error, (file.clone(), span.clone()))
                .with_message(format!("invalid syntax on line {line}"))
                .with_label(
                    Label::new((file.clone(), span))
                        .with_message(message)
                        .with_color(colors.next()),
                )
                .finish()
                .eprint((file, Source::from(source)))?;
            std::process::exit(1);
        }
        Err(error) => Err(error),
    }
}

fn results(input: Option<&Path>) -> anserial::Result<()> {
    let doc = decode(input)?;
    let tree = doc.tree();
    let mut out = io::stdout().lock();

    let mut captures = Captures::new();
    let container = captures.node();
    if !destructure(doc.data(), &pattern![container], &mut captures)? {
        writeln!(out, "; couldn't find results container...")?;
        std::process::exit(1);
    }
    let Some(container) = captures.get_node(container).and_then(|id| tree.get(id)) else {
        writeln!(out, "; couldn't find results container...")?;
        std::process::exit(1);
    };

    let (i_19937, i_2048) = (captures.integer(), captures.integer());
    let entry = pattern!["results", ["i-19937", i_19937], ["i-2048", i_2048]];
    for node in container.children() {
        captures.clear();
        let found = destructure(Some(node), &entry, &mut captures)?;
        match (found, captures.get_integer(i_19937), captures.get_integer(i_2048)) {
            (true, Some(a), Some(b)) => writeln!(out, "; have result: {a} and {b}")?,
            _ => writeln!(out, "; invalid result structure, continuing...")?,
        }
    }
    Ok(())
}

fn main() {
    let args = Arguments::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let outcome = match &args.command {
        Command::Generate { entries, output } => generate(*entries, output.as_deref()),
        Command::Dump { input } => dump(input.as_deref()),
        Command::Parse { input } => parse_text(input.as_deref()),
        Command::Results { input } => results(input.as_deref()),
    };

    if let Err(error) = outcome {
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}
