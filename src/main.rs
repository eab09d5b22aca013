//! Loris CLI

use clap::{Parser, Subcommand};
use loris::error::{report_error, report_runtime_error};
use loris::interp::{new_root_env, Evaluator, Value};
use loris::repl::{Engine, Repl};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "loris", version, about = "Loris - a small scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file
    Run {
        /// Source file to run
        file: PathBuf,
        /// Execute through the bytecode compiler and VM
        #[arg(long)]
        bytecode: bool,
    },
    /// Start the interactive shell (the default)
    Repl {
        /// Execute through the bytecode compiler and VM
        #[arg(long)]
        bytecode: bool,
    },
    /// Tokenize a source file and dump the tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
    /// Parse a source file and dump the AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => start_repl(Engine::TreeWalk),
        Some(Command::Repl { bytecode }) => start_repl(engine_for(bytecode)),
        Some(Command::Run { file, bytecode }) => run_file(&file, engine_for(bytecode)),
        Some(Command::Tokens { file }) => tokenize_file(&file),
        Some(Command::Parse { file }) => parse_file(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn engine_for(bytecode: bool) -> Engine {
    if bytecode {
        Engine::Bytecode
    } else {
        Engine::TreeWalk
    }
}

fn start_repl(engine: Engine) -> Result<(), Box<dyn std::error::Error>> {
    Repl::new(engine)?.run()?;
    Ok(())
}

fn run_file(path: &PathBuf, engine: Engine) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let program = match loris::parser::parse_source(&source) {
        Ok(program) => program,
        Err(errors) => {
            for err in &errors {
                report_error(&filename, &source, err);
            }
            std::process::exit(1);
        }
    };

    match engine {
        Engine::TreeWalk => {
            let env = new_root_env();
            match Evaluator::new().run(&program, &env) {
                Ok(results) => print_results(&results),
                Err(err) => {
                    report_runtime_error(&filename, &source, &err);
                    std::process::exit(1);
                }
            }
        }
        Engine::Bytecode => {
            let mut compiler = loris::compiler::Compiler::new();
            if let Err(err) = compiler.compile(&program) {
                report_error(&filename, &source, &err);
                std::process::exit(1);
            }
            let bytecode = compiler.bytecode();

            let mut vm = loris::vm::Vm::new();
            if let Err(err) = vm.run(&bytecode) {
                report_runtime_error(&filename, &source, &err);
                std::process::exit(1);
            }

            let result = vm.last_popped();
            if !result.is_null() {
                println!("{}", result.inspect());
            }
        }
    }

    Ok(())
}

fn print_results(results: &[Value]) {
    let output = results
        .iter()
        .filter(|value| !value.is_null())
        .map(Value::inspect)
        .collect::<Vec<_>>()
        .join("\n");
    if !output.is_empty() {
        println!("{output}");
    }
}

fn tokenize_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    match loris::lexer::tokenize(&source) {
        Ok(tokens) => {
            for (tok, span) in &tokens {
                println!("{:?} @ {}..{}", tok, span.start, span.end);
            }
            Ok(())
        }
        Err(err) => {
            report_error(&filename, &source, &err);
            std::process::exit(1);
        }
    }
}

fn parse_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    match loris::parser::parse_source(&source) {
        Ok(program) => {
            println!("{}", serde_json::to_string_pretty(&program)?);
            Ok(())
        }
        Err(errors) => {
            for err in &errors {
                report_error(&filename, &source, err);
            }
            std::process::exit(1);
        }
    }
}
