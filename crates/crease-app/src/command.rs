// Line-oriented command parsing for the scorer's console.
//
// Each input line becomes one UserCommand for the app loop. Parsing only
// checks shape; whether a command makes sense right now is the engine's call.

use std::path::PathBuf;

use thiserror::Error;

use crease_core::bracket::{Overs, TossDecision};
use crease_core::roster::Role;
use crease_core::scoring::{parse_delivery, Delivery};
use crease_core::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Show,
    Leaders,
    Help,
    Toss {
        match_id: String,
        team: String,
        decision: TossDecision,
    },
    /// Start scoring an innings of a match.
    Start {
        match_id: String,
        innings: u8,
    },
    Ball(Delivery),
    Bowler(String),
    /// Bank the first innings and start the chase.
    Second,
    /// Decide the match from the finished chase.
    Finish,
    /// Abandon the open innings without recording a result.
    Abandon,
    Result {
        match_id: String,
        winner: String,
        loser: String,
    },
    Quick {
        match_id: String,
        winner: String,
    },
    Edit {
        match_id: String,
        score1: u32,
        score2: u32,
        overs1: Overs,
        overs2: Overs,
    },
    ResetMatch(String),
    Rename {
        team: String,
        player: String,
        name: String,
    },
    SetRole {
        team: String,
        player: String,
        role: Role,
    },
    Export(PathBuf),
    Import(PathBuf),
    Push,
    Pull,
    /// When the tournament was last saved locally and backed up.
    Status,
    /// Start over: new tournament, local and remote copies removed.
    HardReset,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`; type `help` for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Invalid(#[from] EngineError),
}

pub const HELP: &str = "\
show                              bracket and live score
leaders                           top batters and bowlers
toss <match> <team> bat|bowl      record the toss
start <match> [1|2]               start scoring an innings
ball <0-6|WD|NB|W> [how]          score a delivery (W runout-ns: non-striker out)
bowler <player>                   change the bowler
second                            start the chase
finish                            decide the match from the chase
abandon                           drop the open innings
result <match> <winner> <loser>   record a result without scores
quick <match> <winner>            same, naming only the winner
edit <match> <s1> <s2> <o1> <o2>  correct a finished match
reset-match <match>               reopen a match
rename <team> <player> <name..>   rename a player
role <team> <player> <role>       change a player's role
export <file> / import <file>     save or load the tournament as JSON
push / pull                       remote backup
status                            last local save and last backup
hard-reset                        wipe everything, including the backup
quit";

/// Parse one line of input.
pub fn parse_command(line: &str) -> Result<UserCommand, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandError::Empty);
    };
    let args: Vec<&str> = words.collect();

    let cmd = match (head.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("show" | "s", []) => UserCommand::Show,
        ("leaders" | "l", []) => UserCommand::Leaders,
        ("help" | "?", []) => UserCommand::Help,
        ("quit" | "exit" | "q", []) => UserCommand::Quit,
        ("second", []) => UserCommand::Second,
        ("finish", []) => UserCommand::Finish,
        ("abandon", []) => UserCommand::Abandon,
        ("push", []) => UserCommand::Push,
        ("pull", []) => UserCommand::Pull,
        ("status", []) => UserCommand::Status,
        ("hard-reset", []) => UserCommand::HardReset,

        ("toss", [m, team, decision]) => UserCommand::Toss {
            match_id: match_id(m),
            team: team_id(team),
            decision: match decision.to_ascii_lowercase().as_str() {
                "bat" => TossDecision::Bat,
                "bowl" | "field" => TossDecision::Bowl,
                _ => return Err(CommandError::Usage("toss <match> <team> bat|bowl")),
            },
        },
        ("toss", _) => return Err(CommandError::Usage("toss <match> <team> bat|bowl")),

        ("start", [m]) => UserCommand::Start {
            match_id: match_id(m),
            innings: 1,
        },
        ("start", [m, n]) => UserCommand::Start {
            match_id: match_id(m),
            innings: match *n {
                "1" => 1,
                "2" => 2,
                _ => return Err(CommandError::Usage("start <match> [1|2]")),
            },
        },
        ("start", _) => return Err(CommandError::Usage("start <match> [1|2]")),

        ("ball" | "b", [token]) => UserCommand::Ball(parse_delivery(token, None)?),
        ("ball" | "b", [token, how]) if is_non_striker_run_out(how) => {
            if !token.eq_ignore_ascii_case("w") {
                return Err(CommandError::Usage("ball W runout-ns"));
            }
            UserCommand::Ball(Delivery::run_out_non_striker())
        }
        ("ball" | "b", [token, how]) => UserCommand::Ball(parse_delivery(token, Some(how))?),
        ("ball" | "b", _) => return Err(CommandError::Usage("ball <0-6|WD|NB|W> [how]")),

        ("bowler", [player]) => UserCommand::Bowler(player.to_string()),
        ("bowler", _) => return Err(CommandError::Usage("bowler <player>")),

        ("result", [m, winner, loser]) => UserCommand::Result {
            match_id: match_id(m),
            winner: team_id(winner),
            loser: team_id(loser),
        },
        ("result", _) => return Err(CommandError::Usage("result <match> <winner> <loser>")),

        ("quick", [m, winner]) => UserCommand::Quick {
            match_id: match_id(m),
            winner: team_id(winner),
        },
        ("quick", _) => return Err(CommandError::Usage("quick <match> <winner>")),

        ("edit", [m, s1, s2, o1, o2]) => {
            const USAGE: &str = "edit <match> <score1> <score2> <overs1> <overs2>";
            UserCommand::Edit {
                match_id: match_id(m),
                score1: s1.parse().map_err(|_| CommandError::Usage(USAGE))?,
                score2: s2.parse().map_err(|_| CommandError::Usage(USAGE))?,
                overs1: o1.parse()?,
                overs2: o2.parse()?,
            }
        }
        ("edit", _) => {
            return Err(CommandError::Usage(
                "edit <match> <score1> <score2> <overs1> <overs2>",
            ))
        }

        ("reset-match", [m]) => UserCommand::ResetMatch(match_id(m)),
        ("reset-match", _) => return Err(CommandError::Usage("reset-match <match>")),

        ("rename", [team, player, name @ ..]) if !name.is_empty() => UserCommand::Rename {
            team: team_id(team),
            player: player.to_string(),
            name: name.join(" "),
        },
        ("rename", _) => return Err(CommandError::Usage("rename <team> <player> <name>")),

        ("role", [team, player, role]) => UserCommand::SetRole {
            team: team_id(team),
            player: player.to_string(),
            role: role.parse()?,
        },
        ("role", _) => return Err(CommandError::Usage("role <team> <player> <role>")),

        ("export", [path]) => UserCommand::Export(PathBuf::from(path)),
        ("export", _) => return Err(CommandError::Usage("export <file>")),
        ("import", [path]) => UserCommand::Import(PathBuf::from(path)),
        ("import", _) => return Err(CommandError::Usage("import <file>")),

        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(cmd)
}

fn match_id(raw: &str) -> String {
    raw.to_ascii_uppercase()
}

fn team_id(raw: &str) -> String {
    raw.to_ascii_uppercase()
}

fn is_non_striker_run_out(how: &str) -> bool {
    matches!(
        how.to_ascii_lowercase().as_str(),
        "runout-ns" | "run-out-ns" | "ns"
    )
}
