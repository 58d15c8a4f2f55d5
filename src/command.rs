//! Command parsing for argv and script lines.
//!
//! ```text
//! set <cell> <formula>     (alias: eval)
//! get <cell>
//! rm <cell>
//! copy <dest> <src>
//! clear
//! dump [values]
//! load <file>
//! ```

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { cell: String, formula: String },
    Get { cell: String },
    Remove { cell: String },
    Copy { dest: String, src: String },
    Clear,
    Dump { values: bool },
    Load { path: PathBuf },
}

impl Command {
    /// Parse one command line. Verbs are case-insensitive; the formula of
    /// `set` is everything after the cell id.
    pub fn parse(line: &str) -> Result<Command> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^\s*(?<verb>[A-Za-z]+)(?:\s+(?<rest>.*?))?\s*$")
                .expect("command regex must compile")
        });
        let caps = re
            .captures(line)
            .ok_or_else(|| CliError::Usage(format!("Cannot parse command: {:?}", line.trim())))?;
        let verb = caps["verb"].to_ascii_lowercase();
        let rest = caps.name("rest").map_or("", |m| m.as_str());
        let args: Vec<&str> = rest.split_whitespace().collect();

        match (verb.as_str(), args.as_slice()) {
            ("set" | "eval", [cell, _, ..]) => {
                let formula = rest[cell.len()..].trim();
                Ok(Command::Set {
                    cell: cell.to_string(),
                    formula: formula.to_string(),
                })
            }
            ("get", [cell]) => Ok(Command::Get {
                cell: cell.to_string(),
            }),
            ("rm", [cell]) => Ok(Command::Remove {
                cell: cell.to_string(),
            }),
            ("copy", [dest, src]) => Ok(Command::Copy {
                dest: dest.to_string(),
                src: src.to_string(),
            }),
            ("clear", []) => Ok(Command::Clear),
            ("dump", []) => Ok(Command::Dump { values: false }),
            ("dump", [v]) if v.eq_ignore_ascii_case("values") => Ok(Command::Dump { values: true }),
            ("load", [_, ..]) => Ok(Command::Load {
                path: PathBuf::from(rest),
            }),
            ("set" | "eval" | "get" | "rm" | "copy" | "clear" | "dump" | "load", _) => Err(CliError::Usage(
                format!("Wrong arguments for '{}': {:?}", verb, rest),
            )),
            _ => Err(CliError::Usage(format!("Unknown command: {}", verb))),
        }
    }
}

/// Lines of a script that carry commands: blank lines and `#` comments are
/// skipped. Yields (line number, line).
pub fn script_lines(script: &str) -> impl Iterator<Item = (usize, &str)> {
    script
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_keeps_formula_spacing() {
        assert_eq!(
            Command::parse("set a1 a2 + max(b1, 3)").unwrap(),
            Command::Set {
                cell: "a1".into(),
                formula: "a2 + max(b1, 3)".into()
            }
        );
        assert_eq!(
            Command::parse("  EVAL B2   =5  ").unwrap(),
            Command::Set {
                cell: "B2".into(),
                formula: "=5".into()
            }
        );
    }

    #[test]
    fn test_parse_simple_verbs() {
        assert_eq!(
            Command::parse("get a1").unwrap(),
            Command::Get { cell: "a1".into() }
        );
        assert_eq!(
            Command::parse("rm c3").unwrap(),
            Command::Remove { cell: "c3".into() }
        );
        assert_eq!(
            Command::parse("copy b2 b1").unwrap(),
            Command::Copy {
                dest: "b2".into(),
                src: "b1".into()
            }
        );
        assert_eq!(Command::parse("clear").unwrap(), Command::Clear);
        assert_eq!(
            Command::parse("dump").unwrap(),
            Command::Dump { values: false }
        );
        assert_eq!(
            Command::parse("dump VALUES").unwrap(),
            Command::Dump { values: true }
        );
        assert_eq!(
            Command::parse("load my sheets/q3.sheet").unwrap(),
            Command::Load {
                path: PathBuf::from("my sheets/q3.sheet")
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("set a1").is_err());
        assert!(Command::parse("get").is_err());
        assert!(Command::parse("copy a1").is_err());
        assert!(Command::parse("clear now").is_err());
        assert!(Command::parse("dump everything").is_err());
        assert!(Command::parse("load").is_err());
        let err = Command::parse("frobnicate a1").unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: frobnicate");
    }

    #[test]
    fn test_script_lines_skip_comments() {
        let script = "# setup\nset a1 1\n\n   \n  # note\nget a1\n";
        let lines: Vec<_> = script_lines(script).collect();
        assert_eq!(lines, vec![(2, "set a1 1"), (6, "get a1")]);
    }
}
