//! Prefix CLI

use std::path::Path;

use prefixc::{check_file, init_tracing, parse_run_args, run_file, CliError, LOG_ENV};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => parse_run_args(&args[2..]).and_then(|options| run_file(&options).map(drop)),
        "check" => match args.get(2) {
            Some(path) => check_file(Path::new(path)).map(|count| {
                println!("{path}: ok ({count} top-level statements)");
            }),
            None => Err(CliError::Usage("missing program path".to_owned())),
        },
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-v" => {
            println!("Prefix {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => Err(CliError::Usage(format!("unknown command '{command}'"))),
    };

    if let Err(err) = result {
        report(&err);
        std::process::exit(err.exit_code());
    }
}

fn report(err: &CliError) {
    match err {
        CliError::Usage(message) => {
            eprintln!("error: {message}");
            eprintln!();
            print_usage();
        }
        CliError::Check { problems } => {
            for problem in problems {
                eprintln!("error: {problem}");
            }
            eprintln!("{err}");
        }
        CliError::Runtime(eval) => {
            eprintln!("error: {err}");
            if let Some(trace) = &eval.backtrace {
                eprint!("{trace}");
            }
        }
        _ => eprintln!("error: {err}"),
    }
}

fn print_usage() {
    println!("Prefix interpreter");
    println!();
    println!("Usage: prefix <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <program.json>     Run a program tree");
    println!("  check <program.json>   Check a program tree without running it");
    println!("  help                   Show this help message");
    println!("  version                Show version information");
    println!();
    println!("Run options:");
    println!("  --direct               Apply environment writes without the write-buffer");
    println!("  --max-depth=<n|none>   Maximum function call depth");
    println!();
    println!("Environment:");
    println!("  {LOG_ENV}             Log filter (falls back to RUST_LOG)");
    println!();
    println!("Exit codes: 0 success, 1 usage, 2 I/O, 3 malformed program, 4 runtime error");
}
