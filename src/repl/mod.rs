//! Interactive shell

use crate::ast::Position;
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::interp::{new_root_env, EnvRef, Evaluator, RuntimeError, Value};
use crate::lexer;
use crate::parser;
use crate::vm::Vm;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "loris >> ";
const CONT: &str = "... ";
const HISTORY_FILE: &str = ".loris_history";

/// Which execution path the shell feeds entries into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Tree-walking evaluator against a persistent environment
    TreeWalk,
    /// Bytecode compiler plus stack VM
    Bytecode,
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    evaluator: Evaluator,
    env: EnvRef,
    engine: Engine,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL running entries through `engine`
    pub fn new(engine: Engine) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = home_dir().map(|home| home.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            evaluator: Evaluator::new(),
            env: new_root_env(),
            engine,
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL until the user quits
    pub fn run(&mut self) -> RlResult<()> {
        println!(
            "Loris Interactive Shell v{} ({} {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH,
        );
        println!("Type :help for a list of commands\n");

        loop {
            let entry = match self.read_entry() {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            };

            let _ = self.editor.add_history_entry(entry.trim_end());

            if let Some(command) = entry.trim().strip_prefix(':') {
                if self.handle_command(command) {
                    break;
                }
                continue;
            }

            self.eval_entry(&entry);
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Read one complete entry, prompting for continuation lines while
    /// brackets or braces are unbalanced
    fn read_entry(&mut self) -> Result<Option<String>, ReadlineError> {
        let mut entry = self.editor.readline(PROMPT)?;
        if entry.trim().is_empty() {
            return Ok(None);
        }

        while nesting_depth(&entry) > 0 {
            let line = self.editor.readline(CONT)?;
            entry.push('\n');
            entry.push_str(&line);
        }

        Ok(Some(entry))
    }

    /// Handle a `:`-prefixed command; returns true to exit
    fn handle_command(&mut self, command: &str) -> bool {
        match command {
            "quit" | "q" | "exit" => {
                println!("Goodbye!");
                true
            }
            "help" | "h" | "?" => {
                self.print_help();
                false
            }
            "clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("No command `{command}` found");
                println!("Type :help for a list of commands");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  :help, :h, :?    Show this help");
        println!("  :quit, :q        Leave the shell");
        println!("  :exit            Alias for quit");
        println!("  :clear           Clear the screen");
        println!();
        println!("Built-in functions:");
        println!("  len(x)           Length of a string, array or map");
        println!("  push(arr, ...)   Append items to an array in place");
        println!("  first(arr)       First element of an array, or Null");
        println!("  print(...)       Print the arguments, space separated");
        println!("  quit()           Leave with status 0");
        println!("  exit(code)       Leave with the given status");
    }

    fn eval_entry(&mut self, input: &str) {
        let tokens = match lexer::tokenize(input) {
            Ok(tokens) => tokens,
            Err(err) => {
                print_compile_error(input, &err);
                return;
            }
        };

        let (program, errors) = parser::parse(tokens);
        if !errors.is_empty() {
            for err in &errors {
                print_compile_error(input, err);
            }
            return;
        }

        match self.engine {
            Engine::TreeWalk => match self.evaluator.run(&program, &self.env) {
                Ok(results) => {
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
                Err(err) => print_runtime_error(input, &err),
            },

            Engine::Bytecode => {
                let mut compiler = Compiler::new();
                if let Err(err) = compiler.compile(&program) {
                    print_compile_error(input, &err);
                    return;
                }
                let bytecode = compiler.bytecode();

                let mut vm = Vm::new();
                if let Err(err) = vm.run(&bytecode) {
                    print_runtime_error(input, &err);
                    return;
                }

                let result = vm.last_popped();
                if !result.is_null() {
                    println!("{}", result.inspect());
                }
            }
        }
    }
}

fn print_compile_error(input: &str, err: &CompileError) {
    let pos = Position::locate(input, err.span().unwrap_or_default().start);
    println!("{}: {pos}", err.message());
}

fn print_runtime_error(input: &str, err: &RuntimeError) {
    let pos = Position::locate(input, err.span.start);
    println!("{}: {pos}", err.message);
}

/// Count unbalanced brackets and braces to decide whether an entry is
/// complete. A negative depth is a syntax error the parser will report;
/// treat it as complete.
fn nesting_depth(input: &str) -> i32 {
    let mut depth = 0;
    for c in input.chars() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    depth
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_depth() {
        assert_eq!(nesting_depth("1 + 2"), 0);
        assert_eq!(nesting_depth("while (true) {"), 1);
        assert_eq!(nesting_depth("[1, [2, {"), 3);
        assert_eq!(nesting_depth("} }"), -2);
        assert_eq!(nesting_depth("let m = {1 : [2]};"), 0);
    }
}
