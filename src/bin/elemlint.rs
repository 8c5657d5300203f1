//! Command-line tool for parsing and reformatting documents.
//!
//! Reads each input, checks well-formedness, and (unless suppressed)
//! writes the serialized tree back out.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use elemtree::build::{read_document_with, BuildOptions};
use elemtree::serial::{serialize_with_options, SerializeOptions};

/// elemlint -- parse, check, and reformat element-tree documents.
#[derive(Parser, Debug)]
#[command(name = "elemlint", version, about, long_about = None)]
struct Cli {
    /// Files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Pretty-print (indent) the output.
    #[arg(long)]
    format: bool,

    /// Drop ignorable blank (whitespace-only) text nodes while reading.
    #[arg(long)]
    noblanks: bool,

    /// Do not output the result tree (well-formedness check only).
    #[arg(long)]
    noout: bool,

    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Print timing information for reading and writing.
    #[arg(long)]
    timing: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut worst_exit = EXIT_SUCCESS;

    for file in &cli.files {
        let exit = process_file(&cli, file);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }

    ExitCode::from(worst_exit)
}

fn process_file(cli: &Cli, file: &str) -> u8 {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("elemlint: cannot read {file}: {err}");
            return EXIT_IO_ERROR;
        }
    };

    let options = BuildOptions::default().ignore_whitespace(cli.noblanks);
    let started = Instant::now();
    let doc = match read_document_with(&source, &options) {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("elemlint: {file}: {err}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        eprintln!("elemlint: read {file} in {:?}", started.elapsed());
    }

    if cli.noout {
        return EXIT_SUCCESS;
    }

    let serialize_options = SerializeOptions::default().indent(cli.format);
    let started = Instant::now();
    let output = match serialize_with_options(&doc, &serialize_options) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("elemlint: {file}: {err}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        eprintln!("elemlint: wrote {file} in {:?}", started.elapsed());
    }

    let result = match &cli.output {
        Some(path) => fs::write(path, output),
        None => io::stdout().write_all(output.as_bytes()),
    };
    if let Err(err) = result {
        eprintln!("elemlint: cannot write output: {err}");
        return EXIT_IO_ERROR;
    }

    EXIT_SUCCESS
}

fn read_source(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(file)
    }
}
