use std::borrow::Cow;
use std::cell::RefCell;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;

use macrocalc::{Environment, TokenKind, evaluate_line, tokenize};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{EditMode, Helper, Highlighter, Hinter, Validator};

const PROMPT: &str = "-> ";
const DEFAULT_HISTORY_FILE: &str = "macrocalc_history.txt";
const KEYWORDS: [&str; 1] = ["macro"];

/// Settings read once at startup.
struct ReplConfig {
    history_file: PathBuf,
    edit_mode: EditMode,
}

impl ReplConfig {
    fn from_env() -> Self {
        let history_file = env::var_os("MACROCALC_HISTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_FILE));
        let edit_mode = match env::var("MACROCALC_EDIT_MODE") {
            Ok(mode) if mode.eq_ignore_ascii_case("vi") => EditMode::Vi,
            _ => EditMode::Emacs,
        };
        ReplConfig {
            history_file,
            edit_mode,
        }
    }
}

struct NameCompleter {
    env: Rc<RefCell<Environment>>,
}

impl NameCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        NameCompleter { env }
    }
}

impl rustyline::completion::Completer for NameCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last() {
                Some(token) if token.kind == TokenKind::Identifier && token.span.end == pos => {
                    token.text.clone()
                }
                _ => return Ok((pos, vec![])),
            },
            Err(_) => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .env
            .borrow()
            .identifiers()
            .into_iter()
            .chain(KEYWORDS.iter().map(|k| k.to_string()))
            .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: NameCompleter,
}

/// Keeps reading lines while a `(` is open, so a macro body can span
/// several lines.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut depth = 0usize;
        for (i, c) in ctx.input().char_indices() {
            match c {
                '(' => depth += 1,
                ')' if depth == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        i
                    ))));
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        if depth > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct ParenHighlighter;

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        // (offset in line, offset in highlighted) of each open '('
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut highlighted = String::with_capacity(line.len());
        let at_cursor = |i: usize| i + 1 == pos;

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push((i, highlighted.len()));
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some((open, matching_pos)) if at_cursor(open) || at_cursor(i) => {
                        highlighted.push_str("\x1b[34m)\x1b[0m"); // Blue for matching brackets
                        highlighted.replace_range(matching_pos..=matching_pos, "\x1b[1;34m(\x1b[0m");
                    }
                    Some(_) => highlighted.push(c),
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red for unmatched closing brackets
                },
                _ => highlighted.push(c),
            }
        }

        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn format_results(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_quit_command(line: &str) -> bool {
    line == "q()" || line == "quit()"
}

fn main() -> rustyline::Result<()> {
    println!("macrocalc v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'q()' or 'quit()', or press Ctrl-D to quit.");

    let config = ReplConfig::from_env();
    let global_env = Rc::new(RefCell::new(Environment::new_global_populated()));
    let h = InputHelper {
        highlighter: ParenHighlighter,
        validator: ParenValidator,
        completer: NameCompleter::new(global_env.clone()),
    };
    let rl_config = rustyline::config::Config::builder()
        .edit_mode(config.edit_mode)
        .build();
    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(h));
    // Ctrl-S inserts a newline, which separates statements like a comma
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(&config.history_file).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                if is_quit_command(&line) {
                    break;
                }
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }

                let result = evaluate_line(trimmed_input, &mut global_env.borrow_mut());
                match result {
                    Ok(values) => println!("{}", format_results(&values)),
                    Err(e) => {
                        if e.pretty_print(trimmed_input).is_err() {
                            eprintln!("error: {}", e);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'q()' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(&config.history_file)
}
