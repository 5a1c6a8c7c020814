//! Line protocol over stdin/stdout.
//!
//! - Plain lines (optionally prefixed with `>`) are actions
//! - Lines starting with `#` are meta commands (save, load, status, score, quit)
//! - Everything printed back is run history or a bracketed status tag

use crate::commands::{parse_action, ACTION_HELP};
use crawl_core::{RunSession, SessionConfig, SessionError};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the protocol until `#quit` or end of input.
pub async fn run_headless(config: SessionConfig) -> Result<(), SessionError> {
    let mut session = RunSession::new(config)?;

    println!("=== Crawl Headless Mode ===");
    println!("Seed: {}", session.state().seed);
    for line in &session.state().history {
        println!("{line}");
    }
    println!();
    println!("Type #help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("save") => match parts.get(1) {
                    Some(path) => match session.save(path).await {
                        Ok(()) => println!("[SAVED] Run saved to {path}"),
                        Err(e) => println!("[ERROR] Save failed: {e}"),
                    },
                    None => match session.auto_save().await {
                        Ok(path) => println!("[SAVED] Run saved to {}", path.display()),
                        Err(e) => println!("[ERROR] Usage: #save <path> ({e})"),
                    },
                },
                Some("load") => {
                    if let Some(path) = parts.get(1) {
                        match RunSession::load(path, session.config().clone()).await {
                            Ok(loaded) => {
                                session = loaded;
                                println!("[LOADED] Run loaded from {path}");
                                print_status(&session);
                            }
                            Err(e) => println!("[ERROR] Load failed: {e}"),
                        }
                    } else {
                        println!("[ERROR] Usage: #load <path>");
                    }
                }
                Some("status") => print_status(&session),
                Some("score") => println!("[SCORE] {}", session.score()),
                Some("help") => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        match parse_action(line, session.state()) {
            Ok(action) => {
                debug!(action = action.name(), "headless action");
                let response = session.apply(action).await;
                for line in &response.new_lines {
                    println!("{line}");
                }
                if response.in_combat {
                    println!("[COMBAT] Your turn: {}", response.is_player_turn);
                }
                if response.game_over {
                    println!("[GAME OVER] Score: {}", session.score());
                }
            }
            Err(e) => println!("[ERROR] {e}"),
        }
        stdout.flush().ok();
    }

    Ok(())
}

fn print_status(session: &RunSession) {
    let state = session.state();
    println!("[STATUS]");
    println!("  Seed: {}  Depth: {}  Gold: {}", state.seed, state.depth, state.party.gold);
    if let Some(room) = &state.current_room {
        println!(
            "  Room: {} ({}){}",
            room.room_type,
            room.theme_id,
            if state.room_resolved { " resolved" } else { "" }
        );
        for enemy in room.living_enemies() {
            println!(
                "    {} [{}] HP {}/{} AC {}",
                enemy.name, enemy.id, enemy.hp, enemy.max_hp, enemy.ac
            );
        }
    }
    for member in &state.party.members {
        println!(
            "  {} [{}] {} L{} HP {}/{}{}",
            member.name,
            member.id,
            member.role,
            member.level,
            member.hp.current,
            member.hp.max,
            if member.is_alive { "" } else { " (fallen)" }
        );
    }
    if !state.inventory.items.is_empty() {
        let items: Vec<String> = state
            .inventory
            .items
            .iter()
            .map(|i| format!("{} [{}]", i.display_name(), i.id))
            .collect();
        println!("  Inventory: {}", items.join(", "));
    }
    println!("  Short rests: {}", state.short_rests_remaining);
    if !state.mutations.is_empty() {
        println!("  Mutations: {}", state.mutations.join(", "));
    }
    if session.in_combat() {
        println!("  Round: {}  Your turn: {}", state.combat_round, session.is_player_turn());
    }
}

fn print_help() {
    println!("[HELP]");
    for (usage, what) in ACTION_HELP {
        println!("  {usage:<36} - {what}");
    }
    println!("  #save [path]  - Save the run (auto-save file by default)");
    println!("  #load <path>  - Load a saved run");
    println!("  #status       - Show the party and room");
    println!("  #score        - Show the current score");
    println!("  #quit         - Exit");
}

/// Build the session config from the environment and command line.
///
/// Flags win over `CRAWL_*` variables.
pub fn parse_config_from_args(args: &[String]) -> Result<SessionConfig, SessionError> {
    let mut config = SessionConfig::from_env()?;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                if let Some(seed) = args.get(i + 1) {
                    config = config.with_seed(seed.clone());
                    i += 1;
                }
            }
            "--save-dir" => {
                if let Some(dir) = args.get(i + 1) {
                    config = config.with_save_dir(dir.clone());
                    i += 1;
                }
            }
            "--autosave" => config = config.with_autosave(true),
            _ => {}
        }
        i += 1;
    }

    Ok(config)
}
