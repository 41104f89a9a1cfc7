// Courtside command-line host.
//
// Startup sequence:
// 0. Parse arguments
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config (copying defaults on first run)
// 3. Open database
// 4. Dispatch the subcommand through RotationService

use std::collections::BTreeSet;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use courtside_core::config;
use courtside_core::db::Database;
use courtside_core::model::{GameId, Player, PlayerId, Slot, StatKind, Strategy};
use courtside_rotation::{RotationPlan, RotationService};

/// Settings key holding the id of the game commands act on by default.
const ACTIVE_GAME_KEY: &str = "active_game";

#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Fair rotation planning for youth basketball", long_about = None)]
struct Cli {
    /// Game to act on (defaults to the active game)
    #[arg(long, global = true)]
    game: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the roster
    Player {
        #[command(subcommand)]
        command: PlayerCommand,
    },

    /// Create, select and run games
    Game {
        #[command(subcommand)]
        command: GameCommand,
    },

    /// Record the opening lineup of a slot (1-8)
    Record {
        slot: u8,
        /// Players by id or jersey number
        #[arg(required = true)]
        players: Vec<String>,
    },

    /// Count a stat for a player
    Stat {
        player: String,
        /// steal, rebound, attempt1, made1, attempt2, made2, attempt3, made3
        kind: String,
    },

    /// Show a player's season totals
    Stats { player: String },

    /// Rank attendees for the next slot
    Recommend {
        #[arg(long)]
        strategy: Option<Strategy>,
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Leave these players out (e.g. already on court)
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Plan all 8 slots of the game
    Plan {
        #[arg(long)]
        strategy: Option<Strategy>,
        /// Print the full plan as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Substitute one player for another inside a played slot
    Sub {
        slot: u8,
        player_out: String,
        player_in: String,
    },

    /// Correct the minutes credited to a player in a played slot
    Minutes {
        slot: u8,
        player: String,
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },

    /// Manual lineups used by the `manual` strategy
    Manual {
        #[command(subcommand)]
        command: ManualCommand,
    },

    /// Delete every game to start a new season (the roster is kept)
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum PlayerCommand {
    Add {
        name: String,
        #[arg(long)]
        jersey: u16,
    },
    List,
}

#[derive(Subcommand)]
enum GameCommand {
    /// Create a game and make it active
    New {
        #[arg(long)]
        opponent: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        location: String,
    },
    List,
    /// Make a game the active one
    Use { id: String },
    Show,
    /// Mark players as attending (or absent with --absent)
    Attend {
        #[arg(required = true)]
        players: Vec<String>,
        #[arg(long, default_value = "false")]
        absent: bool,
    },
    /// Record how many slots a player was present for
    Swaps { player: String, swaps: u8 },
    Start,
    Advance,
    End,
}

#[derive(Subcommand)]
enum ManualCommand {
    Show,
    Set {
        slot: u8,
        players: Vec<String>,
    },
    Toggle {
        slot: u8,
        player: String,
    },
    /// Clear one slot, or every slot when none is given
    Clear { slot: Option<u8> },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: default strategy {}, database {}",
        config.rotation.default_strategy,
        config.db_path.display()
    );

    // 3. Open database
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path = config.db_path.to_string_lossy().into_owned();
    let db = Database::open(&db_path).context("failed to open database")?;
    let svc = RotationService::new(db, config.weights);

    // 4. Dispatch
    run(&svc, cli, config.rotation.default_strategy)
}

fn run(svc: &RotationService<Database>, cli: Cli, default_strategy: Strategy) -> anyhow::Result<()> {
    match cli.command {
        Commands::Player { command } => match command {
            PlayerCommand::Add { name, jersey } => {
                let player = svc.add_player(&name, jersey)?;
                println!("added #{} {} ({})", player.jersey_number, player.name, player.id);
            }
            PlayerCommand::List => {
                for p in svc.players()? {
                    println!("#{:<3} {:<24} {}", p.jersey_number, p.name, p.id);
                }
            }
        },

        Commands::Game { command } => run_game(svc, cli.game.as_deref(), command)?,

        Commands::Record { slot, players } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let roster = svc.players()?;
            let ids = resolve_players(&roster, &players)?;
            let rotation = svc.record_rotation(&game, Slot::from_number(slot)?, ids)?;
            println!("{}: {}", rotation.slot, names(&roster, &rotation.players_on_court));
        }

        Commands::Stat { player, kind } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let roster = svc.players()?;
            let id = resolve_player(&roster, &player)?;
            svc.record_stat(&game, &id, parse_stat(&kind)?)?;
        }

        Commands::Stats { player } => {
            let roster = svc.players()?;
            let id = resolve_player(&roster, &player)?;
            let stats = svc.season_stats(&id)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Recommend {
            strategy,
            count,
            exclude,
        } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let roster = svc.players()?;
            let exclude: BTreeSet<PlayerId> = resolve_players(&roster, &exclude)?.into_iter().collect();
            let strategy = strategy.unwrap_or(default_strategy);
            for (rank, r) in svc.recommend(&game, strategy, count, &exclude)?.iter().enumerate() {
                println!(
                    "{:>2}. {:<24} {:>7.2}  {:<13} {}",
                    rank + 1,
                    name(&roster, &r.player_id),
                    r.score,
                    r.priority.label(),
                    r.reason
                );
            }
        }

        Commands::Plan { strategy, json } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let plan = svc.optimize(&game, strategy.unwrap_or(default_strategy))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&svc.players()?, &plan);
            }
        }

        Commands::Sub {
            slot,
            player_out,
            player_in,
        } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let roster = svc.players()?;
            let out = resolve_player(&roster, &player_out)?;
            let inn = resolve_player(&roster, &player_in)?;
            let rotation = svc.substitute(&game, Slot::from_number(slot)?, &out, &inn)?;
            for (id, minutes) in &rotation.player_minutes {
                println!("{:<24} {minutes}", name(&roster, id));
            }
        }

        Commands::Minutes {
            slot,
            player,
            minutes,
        } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let roster = svc.players()?;
            let id = resolve_player(&roster, &player)?;
            svc.edit_minutes(&game, Slot::from_number(slot)?, &id, minutes)?;
        }

        Commands::Manual { command } => {
            let game = active_game(svc, cli.game.as_deref())?;
            let roster = svc.players()?;
            match command {
                ManualCommand::Show => {
                    for slot in Slot::all() {
                        if let Some(players) = svc.manual_lineup(&game, slot)? {
                            println!("{slot}: {}", names(&roster, &players));
                        }
                    }
                }
                ManualCommand::Set { slot, players } => {
                    let ids = resolve_players(&roster, &players)?;
                    svc.set_manual_lineup(&game, Slot::from_number(slot)?, ids)?;
                }
                ManualCommand::Toggle { slot, player } => {
                    let id = resolve_player(&roster, &player)?;
                    let now = svc.toggle_manual_player(&game, Slot::from_number(slot)?, &id)?;
                    println!("{}", names(&roster, &now));
                }
                ManualCommand::Clear { slot } => {
                    let slot = slot.map(Slot::from_number).transpose()?;
                    svc.clear_manual(&game, slot)?;
                }
            }
        }

        Commands::Reset { yes } => {
            if !yes {
                bail!("this deletes every game; rerun with --yes to confirm");
            }
            svc.store().clear_games()?;
            info!("all games cleared");
            println!("all games deleted; {} players kept", svc.players()?.len());
        }
    }
    Ok(())
}

fn run_game(svc: &RotationService<Database>, selected: Option<&str>, command: GameCommand) -> anyhow::Result<()> {
    match command {
        GameCommand::New {
            opponent,
            date,
            location,
        } => {
            let game = svc.create_game(&opponent, date, &location)?;
            set_active_game(svc, &game.id)?;
            println!("created game {} vs {} on {}", game.id, game.opponent, game.date);
        }
        GameCommand::List => {
            for g in svc.games()? {
                println!("{} {:<20} {:?} {}", g.date, g.opponent, g.status, g.id);
            }
        }
        GameCommand::Use { id } => {
            let game = svc.game(&GameId::from(id))?;
            set_active_game(svc, &game.id)?;
            println!("active game: {} vs {}", game.date, game.opponent);
        }
        GameCommand::Show => {
            let game = svc.game(&active_game(svc, selected)?)?;
            println!("{}", serde_json::to_string_pretty(&game)?);
        }
        GameCommand::Attend { players, absent } => {
            let game = active_game(svc, selected)?;
            let roster = svc.players()?;
            for id in resolve_players(&roster, &players)? {
                svc.set_attendance(&game, &id, !absent)?;
            }
        }
        GameCommand::Swaps { player, swaps } => {
            let game = active_game(svc, selected)?;
            let id = resolve_player(&svc.players()?, &player)?;
            svc.set_swaps_attended(&game, &id, swaps)?;
        }
        GameCommand::Start => {
            let slot = svc.start_game(&active_game(svc, selected)?)?;
            println!("started: {slot}");
        }
        GameCommand::Advance => match svc.advance(&active_game(svc, selected)?)? {
            Some(slot) => println!("now playing {slot}"),
            None => println!("game complete"),
        },
        GameCommand::End => svc.end_game(&active_game(svc, selected)?)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn active_game(svc: &RotationService<Database>, selected: Option<&str>) -> anyhow::Result<GameId> {
    if let Some(id) = selected {
        return Ok(GameId::from(id));
    }
    match svc.store().load_setting(ACTIVE_GAME_KEY)? {
        Some(serde_json::Value::String(id)) => Ok(GameId::from(id)),
        _ => bail!("no active game; create one with `courtside game new` or pass --game"),
    }
}

fn set_active_game(svc: &RotationService<Database>, id: &GameId) -> anyhow::Result<()> {
    svc.store()
        .save_setting(ACTIVE_GAME_KEY, &serde_json::Value::String(id.to_string()))
}

/// Resolve a player by id, or by jersey number when unambiguous.
fn resolve_player(roster: &[Player], key: &str) -> anyhow::Result<PlayerId> {
    if let Some(p) = roster.iter().find(|p| p.id.as_str() == key) {
        return Ok(p.id.clone());
    }
    let jersey: u16 = key
        .trim_start_matches('#')
        .parse()
        .with_context(|| format!("unknown player `{key}`"))?;
    let mut matches = roster.iter().filter(|p| p.jersey_number == jersey);
    match (matches.next(), matches.next()) {
        (Some(p), None) => Ok(p.id.clone()),
        (Some(_), Some(_)) => bail!("jersey #{jersey} is shared; use the player id"),
        (None, _) => bail!("no player wears #{jersey}"),
    }
}

fn resolve_players(roster: &[Player], keys: &[String]) -> anyhow::Result<Vec<PlayerId>> {
    keys.iter().map(|k| resolve_player(roster, k)).collect()
}

fn parse_stat(kind: &str) -> anyhow::Result<StatKind> {
    Ok(match kind.to_ascii_lowercase().as_str() {
        "steal" => StatKind::Steal,
        "rebound" => StatKind::Rebound,
        "attempt1" => StatKind::Attempt1pt,
        "made1" => StatKind::Made1pt,
        "attempt2" => StatKind::Attempt2pt,
        "made2" => StatKind::Made2pt,
        "attempt3" => StatKind::Attempt3pt,
        "made3" => StatKind::Made3pt,
        other => bail!("unknown stat `{other}`"),
    })
}

fn name(roster: &[Player], id: &PlayerId) -> String {
    roster
        .iter()
        .find(|p| &p.id == id)
        .map(|p| format!("#{} {}", p.jersey_number, p.name))
        .unwrap_or_else(|| id.to_string())
}

fn names(roster: &[Player], ids: &[PlayerId]) -> String {
    ids.iter().map(|id| name(roster, id)).collect::<Vec<_>>().join(", ")
}

fn print_plan(roster: &[Player], plan: &RotationPlan) {
    println!("strategy: {}  fairness: {:.1}", plan.strategy, plan.fairness_score);
    for r in &plan.rotations {
        println!("{:<12} [{}] {}", r.slot.to_string(), r.reasoning, names(roster, &r.player_ids));
    }
    println!();
    for (id, summary) in &plan.player_summary {
        println!(
            "{:<24} {:>3} min  {:<13} {}",
            name(roster, id),
            summary.total_minutes,
            summary.priority.label(),
            summary.notes
        );
    }
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("courtside.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtside=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
