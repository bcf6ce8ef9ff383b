//! CLI entry point for the `lc4-trace` binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use simulator_core::{load_object, run, MachineState};
#[cfg(test)]
use tempfile as _;
use tracer::dump::write_memory_dump;
use tracer::writer::TextTraceWriter;

const USAGE_TEXT: &str = "\
Usage: lc4-trace <trace-output.txt> <program.obj>... [options]

Arguments:
  <trace-output.txt>   Destination for the per-cycle trace (must be .txt)
  <program.obj>...     One or more object files, loaded in order

Options:
  --dump <file>        Write every nonzero memory cell after the run
  -h, --help           Show this help message

Examples:
  lc4-trace trace.txt program.obj
  lc4-trace trace.txt os.obj program.obj --dump memory.txt
";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    output: PathBuf,
    objects: Vec<PathBuf>,
    dump: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Args(Args),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut positional: Vec<PathBuf> = Vec::new();
    let mut dump: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--dump" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --dump".to_string())?;
            dump = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        positional.push(PathBuf::from(arg));
    }

    if positional.len() < 2 {
        return Err("expected an output file and at least one object file".to_string());
    }

    let output = positional.remove(0);
    if !has_extension(&output, "txt") {
        return Err(format!(
            "destination file {} is not a text file",
            output.display()
        ));
    }
    for object in &positional {
        if !has_extension(object, "obj") {
            return Err(format!("{} is not an object file", object.display()));
        }
    }

    Ok(ParseResult::Args(Args {
        output,
        objects: positional,
        dump,
    }))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}

fn run_trace(args: &Args) -> Result<(), i32> {
    let mut machine = MachineState::new();

    for path in &args.objects {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) => {
                eprintln!("error: could not open {}: {error}", path.display());
                return Err(1);
            }
        };
        if let Err(error) = load_object(&mut machine, &bytes) {
            eprintln!("error: {}: {error}", path.display());
            return Err(1);
        }
    }

    let output = match fs::File::create(&args.output) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("error: could not create {}: {error}", args.output.display());
            return Err(1);
        }
    };

    let mut sink = TextTraceWriter::new(BufWriter::new(output));
    let outcome = run(&mut machine, &mut sink);

    // Flush whatever was traced, even when the run faulted mid-program.
    if let Err(error) = sink.finish() {
        eprintln!("error: could not write {}: {error}", args.output.display());
        return Err(1);
    }

    let cycles = match outcome {
        Ok(cycles) => cycles,
        Err(fault) => {
            eprintln!("error: {fault}");
            return Err(1);
        }
    };

    if let Some(path) = &args.dump {
        let result = fs::File::create(path)
            .map(BufWriter::new)
            .and_then(|out| write_memory_dump(&machine, out));
        if let Err(error) = result {
            eprintln!("error: could not write {}: {error}", path.display());
            return Err(1);
        }
    }

    println!(
        "Executed {cycles} cycles -> {}",
        args.output.display()
    );

    Ok(())
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Args(args)) => match run_trace(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
