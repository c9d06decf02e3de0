//! Subcommand parsing and dispatch.

use cup_engine::{
    db::TournamentRepository,
    fixtures,
    standings::ScopeFilter,
    tournament::{
        Category, EliminationPhase, Gender, GroupId, MatchId, ModalityId, Score, ScheduledFixture,
        TeamId, TournamentId, TournamentManager,
    },
};
use pico_args::Arguments;
use serde::Serialize;
use std::str::FromStr;

/// Command-line usage errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing command. Run with --help for usage")]
    MissingCommand,

    #[error("Unknown command '{0}'. Run with --help for usage")]
    UnknownCommand(String),

    #[error("Invalid arguments for {command}: {source}")]
    Arguments {
        command: &'static str,
        #[source]
        source: pico_args::Error,
    },

    #[error("Unexpected arguments: {0:?}")]
    Unexpected(Vec<String>),
}

/// One operator action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Apply the bundled schema
    Migrate,
    /// Show the ordered round-robin of a group without saving it
    Fixtures { group_id: GroupId },
    /// Persist the schedule of one group
    ScheduleGroup { group_id: GroupId },
    /// Persist the schedule of every group of a category
    ScheduleCategory {
        tournament_id: TournamentId,
        category: Category,
    },
    Standings { scope: ScopeFilter },
    Start { match_id: MatchId },
    Result {
        match_id: MatchId,
        score: Score,
        penalties: Option<Score>,
    },
    Forfeit { match_id: MatchId, team_id: TeamId },
    Bracket {
        tournament_id: TournamentId,
        category: Category,
        phase: Option<EliminationPhase>,
    },
}

impl Command {
    /// Parse the subcommand and its options; global options must be consumed first
    pub fn parse(mut pargs: Arguments) -> Result<Self, CommandError> {
        let name = pargs
            .subcommand()
            .map_err(|source| CommandError::Arguments {
                command: "command",
                source,
            })?
            .ok_or(CommandError::MissingCommand)?;

        let command = match name.as_str() {
            "migrate" => Command::Migrate,
            "fixtures" => Command::Fixtures {
                group_id: required(&mut pargs, "fixtures", "--group")?,
            },
            "schedule" => {
                let group: Option<GroupId> = optional(&mut pargs, "schedule", "--group")?;
                match group {
                    Some(group_id) => Command::ScheduleGroup { group_id },
                    None => Command::ScheduleCategory {
                        tournament_id: required(&mut pargs, "schedule", "--tournament")?,
                        category: category(&mut pargs, "schedule")?,
                    },
                }
            }
            "standings" => Command::Standings {
                scope: pargs
                    .value_from_fn("--scope", |s| ScopeFilter::from_str(s))
                    .map_err(|source| CommandError::Arguments {
                        command: "standings",
                        source,
                    })?,
            },
            "start" => Command::Start {
                match_id: required(&mut pargs, "start", "--match")?,
            },
            "result" => Command::Result {
                match_id: required(&mut pargs, "result", "--match")?,
                score: pargs
                    .value_from_fn("--score", parse_score)
                    .map_err(|source| CommandError::Arguments {
                        command: "result",
                        source,
                    })?,
                penalties: pargs
                    .opt_value_from_fn("--penalties", parse_score)
                    .map_err(|source| CommandError::Arguments {
                        command: "result",
                        source,
                    })?,
            },
            "forfeit" => Command::Forfeit {
                match_id: required(&mut pargs, "forfeit", "--match")?,
                team_id: required(&mut pargs, "forfeit", "--team")?,
            },
            "bracket" => Command::Bracket {
                tournament_id: required(&mut pargs, "bracket", "--tournament")?,
                category: category(&mut pargs, "bracket")?,
                phase: optional(&mut pargs, "bracket", "--phase")?,
            },
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };

        let rest = pargs.finish();
        if !rest.is_empty() {
            return Err(CommandError::Unexpected(
                rest.into_iter()
                    .map(|s| s.to_string_lossy().into_owned())
                    .collect(),
            ));
        }

        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Migrate => "migrate",
            Command::Fixtures { .. } => "fixtures",
            Command::ScheduleGroup { .. } | Command::ScheduleCategory { .. } => "schedule",
            Command::Standings { .. } => "standings",
            Command::Start { .. } => "start",
            Command::Result { .. } => "result",
            Command::Forfeit { .. } => "forfeit",
            Command::Bracket { .. } => "bracket",
        }
    }
}

fn required<T>(pargs: &mut Arguments, command: &'static str, key: &'static str) -> Result<T, CommandError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    pargs
        .value_from_str(key)
        .map_err(|source| CommandError::Arguments { command, source })
}

fn optional<T>(
    pargs: &mut Arguments,
    command: &'static str,
    key: &'static str,
) -> Result<Option<T>, CommandError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    pargs
        .opt_value_from_str(key)
        .map_err(|source| CommandError::Arguments { command, source })
}

fn category(pargs: &mut Arguments, command: &'static str) -> Result<Category, CommandError> {
    let modality: ModalityId = required(pargs, command, "--modality")?;
    let gender: Gender = required(pargs, command, "--gender")?;
    Ok(Category::new(modality, gender))
}

/// Parse `home-away`, e.g. `2-1`
pub fn parse_score(s: &str) -> Result<Score, String> {
    let (home, away) = s
        .split_once('-')
        .ok_or_else(|| format!("expected HOME-AWAY, got '{s}'"))?;
    let goals = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid goal count '{v}'"))
    };
    Ok(Score::new(goals(home)?, goals(away)?))
}

#[derive(Debug, Serialize)]
struct FixturePreview {
    group_id: GroupId,
    min_rest: Option<u32>,
    fixtures: Vec<ScheduledFixture>,
}

/// Run one command against the manager and render its outcome as JSON
pub async fn run(
    command: Command,
    manager: &TournamentManager,
    repo: &dyn TournamentRepository,
) -> anyhow::Result<String> {
    let json = match command {
        Command::Migrate => anyhow::bail!("migrate is handled before the engine starts"),
        Command::Fixtures { group_id } => {
            let teams = repo.list_group_teams(group_id).await?;
            let generated = manager.generate_fixtures(group_id, &teams)?;
            let scheduled = manager.schedule_matches(&generated);
            serde_json::to_string_pretty(&FixturePreview {
                group_id,
                min_rest: fixtures::min_rest(&scheduled),
                fixtures: scheduled,
            })?
        }
        Command::ScheduleGroup { group_id } => {
            serde_json::to_string_pretty(&manager.generate_group_schedule(group_id).await?)?
        }
        Command::ScheduleCategory {
            tournament_id,
            category,
        } => serde_json::to_string_pretty(
            &manager
                .generate_category_schedule(tournament_id, category)
                .await?,
        )?,
        Command::Standings { scope } => {
            serde_json::to_string_pretty(&manager.compute_standings(&scope).await?)?
        }
        Command::Start { match_id } => {
            serde_json::to_string_pretty(&manager.start_match(match_id).await?)?
        }
        Command::Result {
            match_id,
            score,
            penalties,
        } => serde_json::to_string_pretty(
            &manager.record_result(match_id, score, penalties).await?,
        )?,
        Command::Forfeit { match_id, team_id } => {
            serde_json::to_string_pretty(&manager.record_forfeit(match_id, team_id).await?)?
        }
        Command::Bracket {
            tournament_id,
            category,
            phase,
        } => serde_json::to_string_pretty(
            &manager.seed_bracket(tournament_id, category, phase).await?,
        )?,
    };

    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> Result<Command, CommandError> {
        Command::parse(Arguments::from_vec(
            args.iter().map(OsString::from).collect(),
        ))
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("2-1"), Ok(Score::new(2, 1)));
        assert_eq!(parse_score(" 0 - 0 "), Ok(Score::new(0, 0)));
        assert!(parse_score("2:1").is_err());
        assert!(parse_score("a-1").is_err());
    }

    #[test]
    fn test_parse_result_with_penalties() {
        let command = parse(&["result", "--match", "4", "--score", "1-1", "--penalties", "5-4"]).unwrap();
        assert_eq!(
            command,
            Command::Result {
                match_id: 4,
                score: Score::new(1, 1),
                penalties: Some(Score::new(5, 4)),
            }
        );
    }

    #[test]
    fn test_parse_schedule_variants() {
        assert_eq!(
            parse(&["schedule", "--group", "3"]).unwrap(),
            Command::ScheduleGroup { group_id: 3 }
        );
        assert_eq!(
            parse(&["schedule", "--tournament", "1", "--modality", "2", "--gender", "female"]).unwrap(),
            Command::ScheduleCategory {
                tournament_id: 1,
                category: Category::new(2, Gender::Female),
            }
        );
    }

    #[test]
    fn test_parse_bracket_phase() {
        let command = parse(&[
            "bracket",
            "--tournament",
            "1",
            "--modality",
            "2",
            "--gender",
            "male",
            "--phase",
            "qf",
        ])
        .unwrap();
        assert!(matches!(
            command,
            Command::Bracket {
                phase: Some(EliminationPhase::Quarterfinals),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_standings_scope() {
        let command = parse(&["standings", "--scope", "tournament=1,group=4"]).unwrap();
        assert_eq!(
            command,
            Command::Standings {
                scope: ScopeFilter::group(1, 4)
            }
        );
        assert!(parse(&["standings", "--scope", "group=4"]).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(&[]), Err(CommandError::MissingCommand)));
        assert!(matches!(
            parse(&["reseed"]),
            Err(CommandError::UnknownCommand(_))
        ));
        assert!(matches!(
            parse(&["forfeit", "--match", "1"]),
            Err(CommandError::Arguments { command: "forfeit", .. })
        ));
        assert!(matches!(
            parse(&["start", "--match", "1", "--extra"]),
            Err(CommandError::Unexpected(_))
        ));
    }
}
