//! Line-based player input for the headless binary.
//!
//! ```text
//!  buy <ticket>                 buy a ticket
//!  pause <game> | quit <game>   pause/resume or leave a game
//!  create <goals> <airports> [ai]
//!  join <game>
//!  hold | go                    stop / restart polling
//!  exit
//! ```

use std::str::FromStr;

use crate::transport::UserCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(UserCommand),
    HoldPolling,
    ResumePolling,
    Exit,
}

/// Parse one input line.  `Err` carries a short usage hint.
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    fn number<T: FromStr>(args: &[&str], i: usize, verb: &str, what: &str) -> Result<T, String> {
        args.get(i)
            .ok_or_else(|| format!("{}: missing {}", verb, what))?
            .parse::<T>()
            .map_err(|_| format!("{}: {} must be a number in range", verb, what))
    }

    let input = match verb {
        "buy" => ConsoleInput::Command(UserCommand::BuyTicket {
            ticket_number: number(&args, 0, verb, "ticket number")?,
        }),
        "pause" => ConsoleInput::Command(UserCommand::TogglePause {
            game_id: number(&args, 0, verb, "game id")?,
        }),
        "quit" => ConsoleInput::Command(UserCommand::Quit {
            game_id: number(&args, 0, verb, "game id")?,
        }),
        "create" => ConsoleInput::Command(UserCommand::CreateGame {
            goals: number(&args, 0, verb, "goal count")?,
            airports: number(&args, 1, verb, "airport count")?,
            ai_player: args.get(2).is_some_and(|a| *a == "ai"),
        }),
        "join" => ConsoleInput::Command(UserCommand::JoinGame {
            game_id: number(&args, 0, verb, "game id")?,
        }),
        "hold" => ConsoleInput::HoldPolling,
        "go" => ConsoleInput::ResumePolling,
        "exit" => ConsoleInput::Exit,
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Some(input))
}
