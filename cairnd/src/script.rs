//! # Event Script Parser
//!
//! Provides a simple scripted event format for deterministic runs and demos.
//!
//! ## Format
//!
//! Scripts are line-based, with each line representing one node event:
//! - Delays: `wait 100ms`, `wait 5s` (advances the virtual clock)
//! - Barriers: `settle` (holds later events until the sequence queue is empty)
//! - Crashes: `crash db` (the named service's process exits)
//! - Role changes: `promote`, `demote`
//! - Group changes: `allow group2`, `deny group2`
//! - Client requests: `status`, `shutdown`
//! - Comments: `# This is a comment`, also after an event
//!
//! ## Example
//!
//! ```text
//! # Crash the database twice in quick succession
//! settle
//! crash db
//! settle
//! wait 2s
//! crash db   # second restart
//! promote
//! status
//! ```

use core_types::{Duration, Filter};
use std::collections::VecDeque;
use thiserror::Error;

/// Event script error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Empty script")]
    EmptyScript,

    #[error("Invalid delay format: {0}")]
    InvalidDelay(String),
}

/// A single scripted node event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedEvent {
    /// Advance virtual time
    Wait(Duration),
    /// Hold later events until no sequence is queued
    Settle,
    /// The named service's process exits
    Crash(String),
    /// The cluster elects this node master (`true`) or demotes it
    MasterRole(bool),
    /// A client adds (`true`) or removes groups from the allowed set
    Groups { add: bool, filter: Filter },
    /// A client asks for the scheduler status
    Status,
    /// A client asks the scheduler to stop
    Shutdown,
}

/// Event script
#[derive(Debug, Clone, Default)]
pub struct EventScript {
    events: VecDeque<ScriptedEvent>,
}

impl EventScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a script from text
    pub fn from_text(text: &str) -> Result<Self, ScriptError> {
        let mut events = VecDeque::new();

        for (line_num, line) in text.lines().enumerate() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            events.push_back(Self::parse_line(line, line_num + 1)?);
        }

        if events.is_empty() {
            return Err(ScriptError::EmptyScript);
        }

        Ok(Self { events })
    }

    fn parse_line(line: &str, line_num: usize) -> Result<ScriptedEvent, ScriptError> {
        let parse_error = |message: String| ScriptError::ParseError {
            line: line_num,
            message,
        };

        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(parse_error(format!("unexpected argument: {}", extra)));
        }

        let event = match (command, argument) {
            ("wait", Some(delay)) => ScriptedEvent::Wait(
                Self::parse_duration(delay).map_err(|err| parse_error(err.to_string()))?,
            ),
            ("crash", Some(service)) => ScriptedEvent::Crash(service.to_string()),
            ("allow" | "deny", Some(group)) => {
                let filter: Filter = group
                    .parse()
                    .map_err(|err: core_types::FilterParseError| parse_error(err.to_string()))?;
                if filter.groups().is_empty() {
                    return Err(parse_error(format!("{} is not a group", group)));
                }
                ScriptedEvent::Groups {
                    add: command == "allow",
                    filter,
                }
            }
            ("settle", None) => ScriptedEvent::Settle,
            ("promote", None) => ScriptedEvent::MasterRole(true),
            ("demote", None) => ScriptedEvent::MasterRole(false),
            ("status", None) => ScriptedEvent::Status,
            ("shutdown", None) => ScriptedEvent::Shutdown,
            ("wait" | "crash" | "allow" | "deny", None) => {
                return Err(parse_error(format!("{} needs an argument", command)));
            }
            ("settle" | "promote" | "demote" | "status" | "shutdown", Some(arg)) => {
                return Err(parse_error(format!("unexpected argument: {}", arg)));
            }
            (other, _) => return Err(parse_error(format!("unknown event: {}", other))),
        };
        Ok(event)
    }

    /// Parses a delay such as `250ms` or `5s`
    fn parse_duration(s: &str) -> Result<Duration, ScriptError> {
        let invalid = || ScriptError::InvalidDelay(s.to_string());
        let delay = if let Some(millis) = s.strip_suffix("ms") {
            millis
                .parse::<u64>()
                .ok()
                .and_then(Duration::checked_from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>().ok().and_then(Duration::checked_from_secs)
        } else {
            None
        };
        delay.ok_or_else(invalid)
    }

    /// Returns the next event without taking it
    pub fn peek(&self) -> Option<&ScriptedEvent> {
        self.events.front()
    }

    /// Takes the next event
    pub fn next_event(&mut self) -> Option<ScriptedEvent> {
        self.events.pop_front()
    }

    /// Returns the number of events left
    pub fn remaining(&self) -> usize {
        self.events.len()
    }

    /// Checks if every event has been taken
    pub fn is_exhausted(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_event() {
        let mut script = EventScript::from_text(
            "wait 250ms\nwait 5s\ncrash db\nsettle\npromote\ndemote\nallow group2\ndeny system\nstatus\nshutdown\n",
        )
        .unwrap();

        assert_eq!(script.remaining(), 10);
        assert_eq!(
            script.next_event(),
            Some(ScriptedEvent::Wait(Duration::from_millis(250)))
        );
        assert_eq!(
            script.next_event(),
            Some(ScriptedEvent::Wait(Duration::from_secs(5)))
        );
        assert_eq!(
            script.next_event(),
            Some(ScriptedEvent::Crash("db".to_string()))
        );
        assert_eq!(script.peek(), Some(&ScriptedEvent::Settle));
        assert_eq!(script.next_event(), Some(ScriptedEvent::Settle));
        assert_eq!(script.next_event(), Some(ScriptedEvent::MasterRole(true)));
        assert_eq!(script.next_event(), Some(ScriptedEvent::MasterRole(false)));
        assert_eq!(
            script.next_event(),
            Some(ScriptedEvent::Groups {
                add: true,
                filter: Filter::group(2).unwrap()
            })
        );
        assert_eq!(
            script.next_event(),
            Some(ScriptedEvent::Groups {
                add: false,
                filter: Filter::SYSTEM
            })
        );
        assert_eq!(script.next_event(), Some(ScriptedEvent::Status));
        assert_eq!(script.next_event(), Some(ScriptedEvent::Shutdown));
        assert!(script.is_exhausted());
        assert_eq!(script.next_event(), None);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let script = EventScript::from_text(
            r#"
            # bring-up only
            wait 1s   # let sequences drain

            status
            "#,
        )
        .unwrap();
        assert_eq!(script.remaining(), 2);
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(
            EventScript::from_text("# nothing\n\n").unwrap_err(),
            ScriptError::EmptyScript
        );
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let err = EventScript::from_text("status\nreboot\n").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError { line: 2, .. }));

        let err = EventScript::from_text("wait soon").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError { line: 1, .. }));

        let err = EventScript::from_text("crash").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError { line: 1, .. }));

        let err = EventScript::from_text("status now").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError { line: 1, .. }));
    }

    #[test]
    fn test_rejects_oversized_durations() {
        let err = EventScript::from_text("status\nwait 20000000000s\n").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError { line: 2, .. }));

        let err = EventScript::from_text("wait 20000000000000ms").unwrap_err();
        assert!(matches!(err, ScriptError::ParseError { line: 1, .. }));

        let mut script = EventScript::from_text("wait 18446744073s").unwrap();
        assert_eq!(
            script.next_event(),
            Some(ScriptedEvent::Wait(Duration::from_secs(18_446_744_073)))
        );
    }

    #[test]
    fn test_group_events_reject_roles() {
        assert!(EventScript::from_text("allow master").is_err());
        assert!(EventScript::from_text("deny group99").is_err());
    }
}
