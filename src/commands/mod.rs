use crate::config::EventDefaults;
use crate::state::EventStorage;
use crate::store::EventStore;
use anyhow::{anyhow, Result};
use std::collections::HashMap;

pub mod calendar;

/// Command line arguments structure
#[derive(Debug, PartialEq, Eq)]
pub struct CommandArgs {
    pub command: String,
    pub args: Vec<String>,
    pub flags: HashMap<String, Option<String>>,
}

impl CommandArgs {
    pub fn parse(input: &str) -> Result<Self> {
        // Normalize non-breaking spaces so they split like ordinary ones
        let normalized_input = input.replace('\u{a0}', " ");

        let mut parts = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut quoted = false;
        let mut escaped = false;

        for c in normalized_input.trim().chars() {
            match c {
                '\\' if !escaped => {
                    escaped = true;
                }
                '"' if !escaped => {
                    in_quotes = !in_quotes;
                    quoted = true;
                }
                ' ' | '\t' if !in_quotes && !escaped => {
                    if !current.is_empty() || quoted {
                        parts.push(std::mem::take(&mut current));
                    }
                    quoted = false;
                }
                _ => {
                    if escaped && c != '"' {
                        current.push('\\');
                    }
                    current.push(c);
                    escaped = false;
                }
            }
        }
        if in_quotes {
            return Err(anyhow!("Unterminated quote in command"));
        }
        if !current.is_empty() || quoted {
            parts.push(current);
        }

        if parts.is_empty() {
            return Err(anyhow!("No command provided"));
        }

        let command = parts.remove(0).to_lowercase();
        let mut args = Vec::new();
        let mut flags = HashMap::new();
        let mut i = 0;

        while i < parts.len() {
            if parts[i].starts_with("--") {
                let flag = parts[i].clone();
                if i + 1 < parts.len() && !parts[i + 1].starts_with("--") {
                    flags.insert(flag, Some(parts[i + 1].clone()));
                    i += 1;
                } else {
                    flags.insert(flag, None);
                }
            } else {
                args.push(parts[i].clone());
            }
            i += 1;
        }

        log::debug!("Parsed command: {:?}, args: {:?}, flags: {:?}", command, args, flags);

        Ok(CommandArgs { command, args, flags })
    }

    pub fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(|v| v.as_deref())
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// What the terminal should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Exit,
}

pub fn execute<S: EventStorage>(
    store: &mut EventStore<S>,
    defaults: &EventDefaults,
    args: &CommandArgs,
) -> Result<Reply> {
    let text = match args.command.as_str() {
        "add" | "create" => calendar::add_event(store, defaults, args)?,
        "edit" => calendar::edit_event(store, args)?,
        "move" => calendar::move_event(store, args)?,
        "delete" => calendar::delete_event(store, args)?,
        "delete-series" => calendar::delete_series(store, args)?,
        "day" => calendar::show_day(store, args)?,
        "month" => calendar::show_month(store, args)?,
        "search" => calendar::search_events(store, args),
        "categories" => calendar::list_categories(store),
        "conflicts" => calendar::check_conflicts(store, defaults, args)?,
        "list" => calendar::list_events(store),
        "clear" => calendar::clear_events(store),
        "env-template" => calendar::write_env_template()?,
        "help" => help_text().to_string(),
        "exit" | "quit" => return Ok(Reply::Exit),
        other => format!("Unknown command '{}'. Type 'help' for available commands.", other),
    };
    Ok(Reply::Text(text))
}

pub fn help_text() -> &'static str {
    r#"Available commands:
  add "<title>" <YYYY-MM-DD> <HH:MM> [--duration N] [--color C] [--category C] [--description D]
      [--repeat daily|weekly|monthly|custom] [--every N] [--days 1,3] [--until YYYY-MM-DD] [--count N]
  edit <id> [--title T] [--date YYYY-MM-DD] [--time HH:MM] [--duration N] [--color C] [--category C] [--description D]
  move <id> <YYYY-MM-DD>            - Move an event to another day, keeping its time
  delete <id>                       - Delete a single event
  delete-series <recurring-id>      - Delete every event of a recurring series
  day <YYYY-MM-DD>                  - Events on a day
  month <YYYY-MM> [--search T] [--category C]
  search [term] [--category C]      - Search titles and descriptions
  categories                        - List categories in use
  conflicts <YYYY-MM-DD> <HH:MM> [--duration N] [--exclude id]
  list                              - All stored events
  clear                             - Delete all events
  env-template                      - Write a .env template in the current directory
  help                              - Show this help
  exit                              - Exit the application"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_quoted_args_and_flags() {
        let args = CommandArgs::parse(r#"add "Team lunch" 2024-05-10 12:30 --category "Social events" --all"#).unwrap();
        assert_eq!(args.command, "add");
        assert_eq!(args.args, vec!["Team lunch", "2024-05-10", "12:30"]);
        assert_eq!(args.flag("--category"), Some("Social events"));
        assert!(args.has_flag("--all"));
        assert_eq!(args.flag("--all"), None);
    }

    #[test]
    fn test_parse_keeps_empty_quoted_arg() {
        let args = CommandArgs::parse(r#"search "" --category Work"#).unwrap();
        assert_eq!(args.args, vec![""]);
        assert_eq!(args.flag("--category"), Some("Work"));
    }

    #[test]
    fn test_parse_escaped_quote() {
        let args = CommandArgs::parse(r#"add "Say \"hi\"" 2024-05-10 09:00"#).unwrap();
        assert_eq!(args.arg(0), Some(r#"Say "hi""#));
    }

    #[test]
    fn test_parse_errors() {
        assert!(CommandArgs::parse("   ").is_err());
        assert!(CommandArgs::parse(r#"add "unterminated"#).is_err());
    }

    #[test]
    fn test_command_is_lowercased() {
        assert_eq!(CommandArgs::parse("HELP").unwrap().command, "help");
    }
}
