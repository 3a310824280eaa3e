//! Line-oriented command language for `zenfan run`.
//!
//! Each stdin line is one command, e.g. `set 128` or `event suspend`. Thermal
//! commands go to the registered cooling device; `event` commands are
//! delivered to the power notifier chains.

use std::str::FromStr;

use crate::power::PowerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Get,
    Set(i64),
    Auto,
    Max,
    Status,
    Event(PowerEvent),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  get                 current speed
  set <0-255>         claim manual control at the given speed
  auto                hand the fan back to the firmware
  max                 maximum speed
  status              mode, lifecycle and stored speed
  event <name>        deliver a power event: suspend, resume, hibernate,
                      thaw, shutdown, halt, restart, poweroff
  quit                tear down and exit";

impl FromStr for PowerEvent {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "suspend" | "suspend-prepare" => Ok(PowerEvent::SuspendPrepare),
            "resume" | "post-suspend" => Ok(PowerEvent::PostSuspend),
            "hibernate" | "hibernation-prepare" => Ok(PowerEvent::HibernationPrepare),
            "thaw" | "post-hibernation" => Ok(PowerEvent::PostHibernation),
            "shutdown" | "down" => Ok(PowerEvent::Down),
            "halt" => Ok(PowerEvent::Halt),
            "restart" | "reboot" => Ok(PowerEvent::Restart),
            "poweroff" | "power-off" => Ok(PowerEvent::PowerOff),
            other => Err(format!("unknown power event '{}'", other)),
        }
    }
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Option<Result<SessionCommand, String>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let argument = words.next();
    if words.next().is_some() {
        return Some(Err(format!("too many arguments: '{}'", line)));
    }

    let command = match (verb.as_str(), argument) {
        ("get", None) => Ok(SessionCommand::Get),
        ("auto", None) => Ok(SessionCommand::Auto),
        ("max", None) => Ok(SessionCommand::Max),
        ("status", None) => Ok(SessionCommand::Status),
        ("help", None) => Ok(SessionCommand::Help),
        ("quit" | "exit", None) => Ok(SessionCommand::Quit),
        ("set", Some(value)) => value
            .parse::<i64>()
            .map(SessionCommand::Set)
            .map_err(|error| format!("invalid speed '{}': {}", value, error)),
        ("event", Some(name)) => name
            .parse::<PowerEvent>()
            .map(SessionCommand::Event),
        ("set" | "event", None) => Err(format!("'{}' needs an argument", verb)),
        _ => Err(format!("unknown command: '{}' (try 'help')", line)),
    };
    Some(command)
}
