mod config;
mod session;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use config::Config;
use gcode::ParseError;
use session::Session;

const SUBCOMMANDS: &[&str] = &["dump", "test", "help"];

#[derive(Parser)]
#[command(name = "gcdump", version, about = "Parse and dump G-code")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a G-code file and send its lines to the output
    Dump(DumpArgs),

    /// Run .test.gcode fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct DumpArgs {
    /// G-code file to dump; `-` or nothing reads standard input
    file: Option<String>,

    /// G-code file to dump (same as the positional argument)
    #[arg(short = 'f', long = "file", conflicts_with = "file")]
    file_path: Option<String>,

    /// Write lines to this file instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// No output unless an error occurs
    #[arg(short, long)]
    quiet: bool,

    /// Print progress information
    #[arg(short, long)]
    verbose: bool,

    /// Send normalized blocks instead of the raw line text
    #[arg(short = 'c', long)]
    strip: bool,

    /// Parse only, don't send anything (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump parsed blocks
    #[arg(long)]
    ast: bool,

    /// Send the valid lines even if some lines are malformed
    #[arg(long)]
    keep_going: bool,

    /// Configuration file (defaults to ./gcdump.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.gcode file or a directory containing them
    path: String,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// Effective dump settings: config file values with flags layered on top.
struct DumpOptions {
    input: String,
    output: Option<PathBuf>,
    quiet: bool,
    verbose: bool,
    strip: bool,
    keep_going: bool,
    no_color: bool,
}

impl DumpOptions {
    fn resolve(args: DumpArgs, config: Config, no_color: bool) -> Self {
        DumpOptions {
            input: args
                .file
                .or(args.file_path)
                .unwrap_or_else(|| "-".to_string()),
            output: args.output.or(config.output),
            quiet: args.quiet || config.quiet,
            verbose: args.verbose || config.verbose,
            strip: args.strip || config.strip,
            keep_going: args.keep_going || config.keep_going,
            no_color: no_color || config.no_color,
        }
    }
}

fn main() {
    // `gcdump file.gcode` works like `gcdump dump file.gcode`.
    let mut args: Vec<String> = std::env::args().collect();
    let first_pos = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let wants_info = args
        .iter()
        .skip(1)
        .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version"));
    let inject = match first_pos {
        Some(pos) => !SUBCOMMANDS.contains(&pos.as_str()),
        None => !wants_info,
    };
    if inject {
        args.insert(1, "dump".to_string());
    }

    let cli = Cli::parse_from(&args);

    let code = match cli.command {
        Command::Dump(dump_args) => do_dump(dump_args, cli.no_color),
        Command::Test(test_args) => {
            init_logging(false);
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                0
            } else {
                test_runner::run_tests(path, cli.no_color, &test_args.category)
            }
        }
    };
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn do_dump(args: DumpArgs, no_color: bool) -> i32 {
    let check = args.check;
    let ast = args.ast;

    let config = match Config::load(args.config.as_deref(), Path::new(".")) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };
    let options = DumpOptions::resolve(args, config, no_color);
    init_logging(options.verbose);

    let (name, source) = match session::read_input(&options.input) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", options.input, e);
            return 1;
        }
    };
    if options.verbose {
        eprintln!("G-code file:\t{}", name);
        if let Some(output) = &options.output {
            eprintln!("Output:\t\t{}", output.display());
        }
    }

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(name.clone(), source.clone());

    let parser = gcode::Parser::new(source, file_id);
    let (program, errors) = parser.parse_lossy();
    if !errors.is_empty() {
        emit_errors(&files, &errors, options.no_color);
    }

    let failed = !errors.is_empty();
    match next_step(failed, check, ast, options.keep_going) {
        Step::Abort => return 1,
        Step::ReportOk => {
            eprintln!("ok: {} parsed successfully", name);
            return 0;
        }
        Step::DumpAst => {
            println!("{:#?}", program);
            return exit_code(failed);
        }
        Step::Transmit => {}
    }

    let sink = match session::open_sink(options.output.as_deref(), options.quiet) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("error: cannot open output: {}", e);
            return 1;
        }
    };
    let mut session = Session::new(name, sink);
    match session.transmit(&program, options.strip) {
        Ok(_) => {
            if options.verbose {
                eprintln!(
                    "Sent {} of {} lines",
                    session.sent(),
                    program.lines.len() + errors.len()
                );
            }
        }
        Err(e) => {
            eprintln!("error: write failed: {}", e);
            return 1;
        }
    }

    exit_code(failed)
}

/// What a dump does once the input has been parsed.
#[derive(Debug, PartialEq)]
enum Step {
    /// Malformed input and nothing more to do: exit 1 without sending.
    Abort,
    ReportOk,
    DumpAst,
    Transmit,
}

/// `--check` never goes past parsing. Malformed input stops everything
/// unless `--keep-going` is set.
fn next_step(failed: bool, check: bool, ast: bool, keep_going: bool) -> Step {
    if failed && (check || !keep_going) {
        Step::Abort
    } else if check {
        Step::ReportOk
    } else if ast {
        Step::DumpAst
    } else {
        Step::Transmit
    }
}

/// Any malformed line fails the run, even when the valid ones were sent.
fn exit_code(failed: bool) -> i32 {
    if failed { 1 } else { 0 }
}

fn emit_errors(files: &SimpleFiles<String, String>, errors: &[ParseError], no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_sends_nothing_by_default() {
        assert_eq!(next_step(true, false, false, false), Step::Abort);
        assert_eq!(next_step(true, false, true, false), Step::Abort);
    }

    #[test]
    fn keep_going_sends_valid_lines_but_still_fails() {
        assert_eq!(next_step(true, false, false, true), Step::Transmit);
        assert_eq!(exit_code(true), 1);
    }

    #[test]
    fn check_succeeds_only_on_valid_input() {
        assert_eq!(next_step(false, true, false, false), Step::ReportOk);
        assert_eq!(next_step(true, true, false, false), Step::Abort);
        assert_eq!(next_step(true, true, false, true), Step::Abort);
        assert_eq!(next_step(false, true, true, false), Step::ReportOk);
    }

    #[test]
    fn valid_input_is_sent() {
        assert_eq!(next_step(false, false, false, false), Step::Transmit);
        assert_eq!(next_step(false, false, true, false), Step::DumpAst);
        assert_eq!(exit_code(false), 0);
    }

    #[test]
    fn dump_flags_parse() {
        let cli = Cli::try_parse_from(["gcdump", "dump", "--check", "part.gcode"]).unwrap();
        match cli.command {
            Command::Dump(args) => {
                assert!(args.check);
                assert_eq!(args.file.as_deref(), Some("part.gcode"));
            }
            Command::Test(_) => panic!("expected dump"),
        }
    }
}
