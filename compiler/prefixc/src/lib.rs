//! Prefix command-line driver.
//!
//! Programs arrive as JSON-serialized [`Program`] trees produced by an
//! external parser. The driver loads one, optionally checks it, runs it on
//! a fresh interpreter and maps the outcome to an exit code.

mod check;

pub use check::check_program;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;

use prefix_eval::{
    stdout_handler, EvalError, Interpreter, Namespace, SharedPrintHandler, Value,
    DEFAULT_MAX_DEPTH,
};
use prefix_ir::Program;

/// Environment variable holding the log filter. `RUST_LOG` is the fallback.
pub const LOG_ENV: &str = "PREFIX_LOG";

static TRACING_INIT: Once = Once::new();

/// Install the `tracing` subscriber once, and only when a filter is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter =
            EnvFilter::try_from_env(LOG_ENV).or_else(|_| EnvFilter::try_from_default_env());
        if let Ok(filter) = filter {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}

/// Driver failures.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed program {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} problem(s) found", problems.len())]
    Check { problems: Vec<String> },
    #[error("Failed to start the namespace dispatcher: {0}")]
    Dispatcher(#[source] io::Error),
    #[error("{}", .0.describe())]
    Runtime(EvalError),
}

impl CliError {
    /// Process exit code: `1` usage, `2` I/O, `3` malformed program,
    /// `4` runtime error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 1,
            CliError::Io { .. } | CliError::Dispatcher(_) => 2,
            CliError::Malformed { .. } | CliError::Check { .. } => 3,
            CliError::Runtime(_) => 4,
        }
    }
}

/// Options for `prefix run`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub path: PathBuf,
    /// Apply environment writes on the caller's thread instead of through
    /// the write-buffer.
    pub direct: bool,
    /// `None` for unlimited recursion.
    pub max_depth: Option<usize>,
}

impl RunOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RunOptions {
            path: path.into(),
            direct: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

/// Parse the arguments following `run`.
pub fn parse_run_args(args: &[String]) -> Result<RunOptions, CliError> {
    let mut path = None;
    let mut direct = false;
    let mut max_depth = Some(DEFAULT_MAX_DEPTH);
    for arg in args {
        if arg == "--direct" {
            direct = true;
        } else if let Some(depth) = arg.strip_prefix("--max-depth=") {
            max_depth = parse_depth(depth)?;
        } else if arg.starts_with('-') {
            return Err(CliError::Usage(format!("unknown option '{arg}'")));
        } else if path.is_none() {
            path = Some(PathBuf::from(arg));
        } else {
            return Err(CliError::Usage(format!("unexpected argument '{arg}'")));
        }
    }
    let path = path.ok_or_else(|| CliError::Usage("missing program path".to_owned()))?;
    Ok(RunOptions {
        path,
        direct,
        max_depth,
    })
}

fn parse_depth(s: &str) -> Result<Option<usize>, CliError> {
    if s == "none" {
        return Ok(None);
    }
    match s.parse::<usize>() {
        Ok(0) | Err(_) => Err(CliError::Usage(format!(
            "--max-depth expects a positive integer or 'none', got '{s}'"
        ))),
        Ok(n) => Ok(Some(n)),
    }
}

/// Deserialize a program. `path` is only used in the error.
pub fn parse_program(text: &str, path: &Path) -> Result<Program, CliError> {
    serde_json::from_str(text).map_err(|source| CliError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_program(path: &Path) -> Result<Program, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_program(&text, path)
}

/// Run `program` on a fresh interpreter.
///
/// The namespace is shut down whether or not the run succeeds.
pub fn execute(
    program: &Program,
    options: &RunOptions,
    print: SharedPrintHandler,
) -> Result<Value, CliError> {
    let ns = if options.direct {
        Namespace::direct()
    } else {
        Namespace::buffered().map_err(CliError::Dispatcher)?
    };
    let mut interp = Interpreter::builder()
        .namespace(ns.clone())
        .max_depth(options.max_depth)
        .print_handler(print)
        .build();
    let result = interp.run(program);
    ns.shutdown();
    tracing::debug!(
        statements = interp.executed_statements(),
        buffered_ops = ns.applied_ops(),
        "run finished"
    );
    result.map_err(CliError::Runtime)
}

/// `prefix run`: load, then execute with output on stdout.
pub fn run_file(options: &RunOptions) -> Result<Value, CliError> {
    let program = load_program(&options.path)?;
    execute(&program, options, stdout_handler())
}

/// `prefix check`: load and statically check. Returns the number of
/// top-level statements.
pub fn check_file(path: &Path) -> Result<usize, CliError> {
    let program = load_program(path)?;
    let problems = check_program(&program);
    if !problems.is_empty() {
        return Err(CliError::Check { problems });
    }
    Ok(program.body.len())
}
