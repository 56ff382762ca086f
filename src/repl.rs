// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive console over a single execution context.

use binder_core::{BinderConfig, ExecutionContext, QuickJsEngine, QuickJsFactory};
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::path::{Path, PathBuf};

const HISTORY_FILE: &str = ".binder_history";
const MAX_HISTORY_SIZE: usize = 1000;

/// Console commands, entered with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Import,
    Call,
    Release,
    Modules,
}

impl ReplCommand {
    /// Parse a command and its (trimmed) argument string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let input = input.trim().strip_prefix('.')?;

        let (cmd, arg) = match input.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (input, None),
        };

        let cmd = match cmd.to_lowercase().as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "import" | "i" => ReplCommand::Import,
            "call" | "c" => ReplCommand::Call,
            "release" | "r" => ReplCommand::Release,
            "modules" | "ls" => ReplCommand::Modules,
            _ => return None,
        };

        Some((cmd, arg))
    }

    /// Commands and their descriptions, for `.help` and completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".import <specifier>", "Load a module, e.g. .import @shared/math.js"),
            (".call <module> <fn> [args...]", "Call an exported function"),
            (".release <name>", "Release a loaded module"),
            (".modules", "List loaded modules"),
            (".help", "Show this help message"),
            (".exit", "Exit the console"),
        ]
    }
}

/// Script source for `.call`: each argument is passed through as an expression
fn call_source(arg: &str) -> Option<String> {
    let mut parts = arg.split_whitespace();
    let module = parts.next()?;
    let function = parts.next()?;

    let mut source = format!("binder.call({module:?}, {function:?}");
    for value in parts {
        source.push_str(", ");
        source.push_str(value);
    }
    source.push(')');
    Some(source)
}

/// Completion, hints and multi-line validation for rustyline
struct BinderHelper {
    words: Vec<&'static str>,
}

impl BinderHelper {
    fn new() -> Self {
        let mut words = vec![
            "binder.import",
            "binder.call",
            "binder.release",
            "binder.modules",
            "binder.hello",
            "console.log",
            "console.error",
            "console.warn",
        ];
        words.extend(
            ReplCommand::all_commands()
                .iter()
                .filter_map(|(usage, _)| usage.split_whitespace().next()),
        );
        Self { words }
    }

    /// Byte offset where the identifier ending at `line`'s end starts
    fn word_start(line: &str) -> usize {
        line.char_indices()
            .rev()
            .find(|&(_, c)| !c.is_alphanumeric() && c != '_' && c != '.')
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0)
    }
}

impl Completer for BinderHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[Self::word_start(&line[..pos])..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches = self
            .words
            .iter()
            .filter(|w| w.starts_with(word))
            .map(|w| Pair {
                display: w.to_string(),
                replacement: w[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for BinderHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }

        let word = &line[Self::word_start(line)..];
        if word.len() < 2 {
            return None;
        }

        self.words
            .iter()
            .find(|w| w.starts_with(word) && w.len() > word.len())
            .map(|w| w[word.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for BinderHelper {}

impl Validator for BinderHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();

        if input.trim_start().starts_with('.') || is_balanced(input) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

impl Helper for BinderHelper {}

/// Check if brackets, braces and parentheses are balanced outside strings
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match in_string {
            Some(_) if c == '\\' => escape_next = true,
            Some(quote) if c == quote => in_string = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '(' => stack.push(')'),
                '[' => stack.push(']'),
                '{' => stack.push('}'),
                // a stray closer is left for the engine to report
                ')' | ']' | '}' if stack.pop() != Some(c) => return true,
                _ => {}
            },
        }
    }

    stack.is_empty() && in_string.is_none()
}

enum CommandResult {
    Continue,
    Exit,
}

/// The interactive console
pub struct Repl {
    context: ExecutionContext<QuickJsEngine>,
    editor: Editor<BinderHelper, DefaultHistory>,
    history_path: PathBuf,
    root: PathBuf,
}

impl Repl {
    /// Create a console whose `@` specifiers resolve against `root`
    pub fn new(config: BinderConfig, root: &Path) -> anyhow::Result<Self> {
        let editor_config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(editor_config)?;
        editor.set_helper(Some(BinderHelper::new()));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("binder")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        let context = ExecutionContext::new(&QuickJsFactory, &config, root)?;

        Ok(Self {
            context,
            editor,
            history_path,
            root: root.to_path_buf(),
        })
    }

    /// Run the read-eval-print loop until `.exit` or end of input
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "binder>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        if let Err(err) = self.editor.save_history(&self.history_path) {
            tracing::debug!(error = %err, "could not save console history");
        }
        self.context.terminate();
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "binder".bright_cyan().bold(),
            "v".dimmed(),
            binder_core::VERSION.bright_yellow()
        );
        println!("  {} {}", "module root:".dimmed(), self.root.display());
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match (cmd, arg) {
            (ReplCommand::Help, _) => self.print_help(),
            (ReplCommand::Exit, _) => return CommandResult::Exit,
            (ReplCommand::Import, Some(specifier)) => {
                self.eval_and_print(&format!("binder.import({specifier:?})"))
            }
            (ReplCommand::Call, Some(arg)) => match call_source(arg) {
                Some(source) => self.eval_and_print(&source),
                None => print_usage(".call <module> <fn> [args...]"),
            },
            (ReplCommand::Release, Some(name)) => {
                if self.context.modules().release(name) {
                    println!("{} {}", "released".green(), name.cyan());
                } else {
                    println!("{} {}", "not loaded:".yellow(), name.cyan());
                }
            }
            (ReplCommand::Modules, _) => {
                let names = self.context.modules().modules();
                if names.is_empty() {
                    println!("{}", "(no modules loaded)".dimmed());
                }
                for name in names {
                    println!("  {}", name.cyan());
                }
            }
            (ReplCommand::Import, None) => print_usage(".import <specifier>"),
            (ReplCommand::Call, None) => print_usage(".call <module> <fn> [args...]"),
            (ReplCommand::Release, None) => print_usage(".release <name>"),
        }

        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Console Commands:".white().bold());
        println!();
        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:32} {}", cmd.cyan(), desc.dimmed());
        }
        println!();
        println!("  {}", "Anything else is evaluated as script.".dimmed());
        println!();
    }

    fn eval_and_print(&mut self, source: &str) {
        match self.context.eval(source) {
            Ok(value) => println!("{}", value.yellow()),
            Err(err) => eprintln!("{}: {}", "Error".red().bold(), err),
        }
    }
}

fn print_usage(usage: &str) {
    eprintln!("{}: {}", "Usage".red().bold(), usage.cyan());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert_eq!(ReplCommand::parse(".help"), Some((ReplCommand::Help, None)));
        assert_eq!(ReplCommand::parse(".q"), Some((ReplCommand::Exit, None)));
        assert_eq!(
            ReplCommand::parse(".import   @shared/math.js "),
            Some((ReplCommand::Import, Some("@shared/math.js")))
        );
        assert_eq!(
            ReplCommand::parse(".call math add 1 2"),
            Some((ReplCommand::Call, Some("math add 1 2")))
        );
        assert_eq!(ReplCommand::parse(".release "), Some((ReplCommand::Release, None)));
        assert_eq!(ReplCommand::parse(".unknown"), None);
        assert_eq!(ReplCommand::parse("binder.modules()"), None);
    }

    #[test]
    fn test_call_source() {
        assert_eq!(
            call_source("math add 1 2").as_deref(),
            Some(r#"binder.call("math", "add", 1, 2)"#)
        );
        assert_eq!(call_source("math now").as_deref(), Some(r#"binder.call("math", "now")"#));
        assert_eq!(call_source("math"), None);
    }

    #[test]
    fn test_word_start_after_multibyte_delimiter() {
        assert_eq!(BinderHelper::word_start("binder.imp"), 0);
        assert_eq!(BinderHelper::word_start("x = binder.c"), 4);
        assert_eq!(BinderHelper::word_start("€con"), '€'.len_utf8());
        assert_eq!(BinderHelper::word_start("a €"), "a €".len());

        let line = "1 €binder.m";
        let start = BinderHelper::word_start(line);
        assert_eq!(&line[start..], "binder.m");
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("(1 + 2)"));
        assert!(is_balanced("{ a: 1 }"));
        assert!(is_balanced("function() { return 1; }"));
        assert!(!is_balanced("(1 + 2"));
        assert!(!is_balanced("{ a: 1"));
        assert!(is_balanced("'string with (unbalanced'"));
        assert!(is_balanced(r#""escaped \" quote""#));
    }
}
