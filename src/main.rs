//! Meltdown headless runner
//!
//! Hosts the kernel on its simulation thread, plays with a simple autopilot,
//! and prints every event as a JSON line.

use std::error::Error;
use std::time::{Duration, Instant};

use meltdown::sim::{CounterType, SimulationState};
use meltdown::{Command, Outbound, SimulationHost, Tuning};

/// Panic level at which the autopilot spends its nuke
const AUTOPILOT_NUKE_PANIC: f32 = 60.0;

#[derive(Debug)]
struct Args {
    tuning: Option<String>,
    seed: Option<u64>,
    endless: bool,
    seconds: u64,
    autopilot: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(mut iter: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut args = Args {
            tuning: None,
            seed: None,
            endless: false,
            seconds: 60,
            autopilot: true,
        };
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--tuning" => args.tuning = Some(iter.next().ok_or("--tuning needs a path")?),
                "--seed" => {
                    let value = iter.next().ok_or("--seed needs a number")?;
                    args.seed = Some(value.parse().map_err(|_| format!("bad seed: {value}"))?);
                }
                "--seconds" => {
                    let value = iter.next().ok_or("--seconds needs a number")?;
                    args.seconds = value.parse().map_err(|_| format!("bad duration: {value}"))?;
                }
                "--endless" => args.endless = true,
                "--manual" => args.autopilot = false,
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        // Endless runs derive their own seed
        if args.endless && args.seed.is_some() {
            return Err("--seed cannot be combined with --endless".into());
        }
        Ok(args)
    }
}

/// Counter whatever is on screen, and nuke when things get hot
fn autopilot(state: &SimulationState) -> Vec<Command> {
    let mut commands = Vec::new();
    for kind in CounterType::ALL {
        let ready = state.ability_cooldowns.get(kind) <= 0.0;
        let target = state.enemies.iter().any(|e| e.counter_type == kind && !e.encrypted);
        if ready && target {
            commands.push(Command::TriggerAbility { kind });
        }
    }
    let crowded = state.boss.is_some() || state.panic >= AUTOPILOT_NUKE_PANIC;
    if crowded && state.nuke_cooldown <= 0.0 {
        commands.push(Command::TriggerNuke);
    }
    for powerup in &state.powerups {
        commands.push(Command::SelectAt {
            x: powerup.pos.x,
            y: powerup.pos.y,
        });
    }
    commands
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse()?;
    log::info!("Meltdown (headless) starting...");

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let host = SimulationHost::spawn(tuning)?;
    host.send(if args.endless {
        Command::StartEndless
    } else {
        Command::Start { seed: args.seed }
    })?;

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut final_score = None;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        let Ok(msg) = host.outbound().recv_timeout(left) else {
            break;
        };
        match msg {
            Outbound::State { snapshot, events } => {
                for event in &events {
                    println!("{}", serde_json::to_string(event)?);
                    if event.is_game_over() {
                        final_score = Some(snapshot.score);
                    }
                }
                if final_score.is_some() {
                    break;
                }
                if args.autopilot && snapshot.is_live() {
                    for cmd in autopilot(&snapshot) {
                        host.send(cmd)?;
                    }
                }
            }
            Outbound::Error { message } => {
                log::error!("Simulation failed: {message}");
                host.shutdown()?;
                return Err(message.into());
            }
        }
    }

    match final_score {
        Some(score) => log::info!("Run finished with score {score}"),
        None => log::info!("Time limit reached"),
    }
    host.shutdown()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        Args::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.seed, None);
        assert!(!args.endless);
        assert!(args.autopilot);
        assert_eq!(args.seconds, 60);
    }

    #[test]
    fn test_seeded_run() {
        let args = parse(&["--seed", "7", "--seconds", "5", "--manual"]).unwrap();
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.seconds, 5);
        assert!(!args.autopilot);
    }

    #[test]
    fn test_endless_rejects_seed() {
        let err = parse(&["--endless", "--seed", "7"]).unwrap_err();
        assert!(err.contains("--endless"));
        assert!(parse(&["--endless"]).unwrap().endless);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--seed"]).is_err());
        assert!(parse(&["--seed", "abc"]).is_err());
        assert!(parse(&["--fast"]).is_err());
    }
}
