//! RBMK-1000 Control Panel - Main Entry Point
//!
//! Headless panel driver: operator commands arrive on stdin, panel
//! snapshots go to stdout as JSON lines.

use rbmk_panel_lib::commands::{dispatch, Command, PanelSnapshot};
use rbmk_panel_lib::{PanelConfig, ReactorSimulator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, MissedTickBehavior};

fn report(snapshot: &PanelSnapshot, as_json: bool) {
    if !as_json {
        println!("{}", snapshot.summary());
        return;
    }
    match serde_json::to_string(snapshot) {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("failed to encode snapshot: {}", e),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let config = PanelConfig::load();
    let mut simulator = ReactorSimulator::with_system_clock(&config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    // Frame cadence for input and rendering; the simulator applies its own
    // once-per-second tick gate on top of this
    let mut frames = interval(config.frame_interval());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    report(&PanelSnapshot::take(&mut simulator), config.json_snapshots);

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    log::info!("stdin closed, simulation keeps running until Ctrl-C");
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse_line(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        let snapshot = dispatch(&mut simulator, command);
                        report(&snapshot, config.json_snapshots);
                    }
                    Err(e) => log::warn!("{}", e),
                }
            }
            _ = frames.tick() => {
                if simulator.poll() {
                    report(&PanelSnapshot::take(&mut simulator), config.json_snapshots);
                }
            }
            _ = &mut shutdown => break,
        }
    }

    log::info!("panel shut down");
    Ok(())
}
