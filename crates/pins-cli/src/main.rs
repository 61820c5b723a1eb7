use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use pins_codegen::{memory, Segments};
use pins_lexer::{Lexer, Token};
use pins_parser::Program;
use tracing::{debug, Level};

/// PINS'24 compiler.
///
/// Compiles a PINS'24 source file to a listing of stack-machine code and
/// data segments.
///
/// EXAMPLES:
///     pins tokens prog.pins          Print the token stream
///     pins layout prog.pins          Print frames and variable accesses
///     pins build prog.pins -o a.lst  Write the assembled listing
#[derive(Parser)]
#[command(name = "pins")]
#[command(version)]
struct Cli {
    /// Log compiler phases to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every token with its location
    Tokens {
        /// Path to the source file
        file: PathBuf,
    },
    /// Print the frame and access of every definition
    Layout {
        /// Path to the source file
        file: PathBuf,
    },
    /// Compile and print the code and data segments
    Build {
        /// Path to the source file
        file: PathBuf,
        /// Write the listing here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Tokens { file } => cmd_tokens(&file),
        Commands::Layout { file } => cmd_layout(&file),
        Commands::Build { file, output } => cmd_build(&file, output.as_deref()),
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

// ── Pipeline ─────────────────────────────────────────────────────

fn read_source(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Error reading file '{}': {}", path.display(), e))
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    Lexer::new(source).tokenize().map_err(|e| e.to_string())
}

fn front_end(path: &Path) -> Result<(Program, pins_seman::Bindings), String> {
    let source = read_source(path)?;
    let program = pins_parser::parse_source(&source).map_err(|e| e.to_string())?;
    debug!(definitions = program.definitions.len(), "parsed");
    let bindings = pins_seman::resolve(&program).map_err(|e| e.to_string())?;
    debug!(uses = bindings.len(), "names resolved");
    Ok((program, bindings))
}

fn compile(path: &Path) -> Result<Segments, String> {
    let (program, bindings) = front_end(path)?;
    pins_codegen::compile(&program, &bindings).map_err(|e| e.to_string())
}

// ── Commands ─────────────────────────────────────────────────────

fn cmd_tokens(path: &Path) -> Result<(), String> {
    let source = read_source(path)?;
    for token in tokenize(&source)? {
        println!("{:>8} {:<12} {}", token.span.to_string(), format!("{:?}", token.token_type), token.value);
    }
    Ok(())
}

fn cmd_layout(path: &Path) -> Result<(), String> {
    let (program, _) = front_end(path)?;
    let layout = memory::organize(&program).map_err(|e| e.to_string())?;
    print!("{}", memory::report(&program, &layout));
    Ok(())
}

fn cmd_build(path: &Path, output: Option<&Path>) -> Result<(), String> {
    let segments = compile(path)?;
    let listing = segments.listing().to_string();
    match output {
        Some(out) => {
            fs::write(out, &listing)
                .map_err(|e| format!("Error writing '{}': {}", out.display(), e))?;
            println!(
                "Compiled {} -> {} ({} code bytes, {} data bytes)",
                path.display(),
                out.display(),
                segments.code_size(),
                segments.data_size()
            );
        }
        None => print!("{listing}"),
    }
    Ok(())
}
