//! Parsing stdin lines into editing commands.
//!
//! Plain text appends a line. Lines starting with `:` are commands:
//!
//! ```text
//! :i L C TEXT          insert TEXT at line L, character C
//! :d L1 C1 L2 C2       delete the range
//! :r L1 C1 L2 C2 TEXT  replace the range with TEXT
//! :sync                send the whole buffer to every peer
//! :show                print the buffer
//! :who                 list collaborators
//! :stats               print metrics
//! :w                   write the buffer back to --file
//! :q / :quit           leave the room
//! ```
//!
//! In TEXT, `\n` is a newline and `\\` a backslash. Lines and characters are
//! zero-based.

use miette::Diagnostic;
use tandem_sync::{Position, TextRange};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Append(String),
    Replace { range: TextRange, text: String },
    HardSync,
    Show,
    Who,
    Stats,
    Write,
    Help,
    Quit,
}

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command {0:?}")]
    #[diagnostic(code(tandem::input::unknown), help("type :help for the command list"))]
    Unknown(String),

    #[error("{command} expects {expected}")]
    #[diagnostic(code(tandem::input::arguments))]
    Arguments {
        command: &'static str,
        expected: &'static str,
    },

    #[error("{0:?} is not a line or character number")]
    #[diagnostic(code(tandem::input::number))]
    Number(String),
}

pub const HELP: &str = "\
text                 append a line
:i L C TEXT          insert at line L, character C
:d L1 C1 L2 C2       delete a range
:r L1 C1 L2 C2 TEXT  replace a range
:sync                overwrite every peer's buffer with yours
:show  :who  :stats  :w  :quit";

pub fn parse(line: &str) -> Result<Input, InputError> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Append(line.to_string()));
    };

    let (name, rest) = command
        .split_once(' ')
        .map_or((command, ""), |(name, rest)| (name, rest));

    match name {
        "i" | "insert" => {
            let (nums, text) = take_numbers::<2>(rest, "i", "L C TEXT")?;
            let at = Position::new(nums[0], nums[1]);
            Ok(Input::Replace {
                range: TextRange::at(at),
                text: unescape(text),
            })
        }
        "d" | "delete" => {
            let (nums, rest) = take_numbers::<4>(rest, "d", "L1 C1 L2 C2")?;
            if !rest.is_empty() {
                return Err(InputError::Arguments {
                    command: "d",
                    expected: "L1 C1 L2 C2",
                });
            }
            Ok(Input::Replace {
                range: range_of(nums),
                text: String::new(),
            })
        }
        "r" | "replace" => {
            let (nums, text) = take_numbers::<4>(rest, "r", "L1 C1 L2 C2 TEXT")?;
            Ok(Input::Replace {
                range: range_of(nums),
                text: unescape(text),
            })
        }
        "sync" => Ok(Input::HardSync),
        "show" | "p" => Ok(Input::Show),
        "who" => Ok(Input::Who),
        "stats" => Ok(Input::Stats),
        "w" | "write" => Ok(Input::Write),
        "h" | "help" => Ok(Input::Help),
        "q" | "quit" => Ok(Input::Quit),
        other => Err(InputError::Unknown(other.to_string())),
    }
}

fn range_of(nums: [usize; 4]) -> TextRange {
    TextRange::new(Position::new(nums[0], nums[1]), Position::new(nums[2], nums[3]))
}

/// Split `N` whitespace-separated numbers off the front of `input`.
/// Returns them and whatever follows the single space after the last one.
fn take_numbers<'a, const N: usize>(
    input: &'a str,
    command: &'static str,
    expected: &'static str,
) -> Result<([usize; N], &'a str), InputError> {
    let mut nums = [0usize; N];
    let mut rest = input.trim_start();
    for slot in nums.iter_mut() {
        if rest.is_empty() {
            return Err(InputError::Arguments { command, expected });
        }
        let (word, tail) = rest.split_once(' ').unwrap_or((rest, ""));
        *slot = word
            .parse()
            .map_err(|_| InputError::Number(word.to_string()))?;
        rest = tail;
    }
    Ok((nums, rest))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
