//! Operator commands for the reactor panel
//!
//! These are the entry points a front end binds its buttons and keys to.
//! Commands arrive either as short text (`select 4 4`, `cool low`) or as JSON
//! (`{"command":"select","row":4,"col":4}`), and every command answers with a
//! snapshot of the panel for the render layer.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::alarms::AlarmEvent;
use crate::clock::Clock;
use crate::reactor::{CoolantMode, ReactorSimulator};
use crate::rods::{Rod, RodId, RodState};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },
    #[error("invalid number `{0}`")]
    BadNumber(String),
    #[error("invalid JSON command: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Az5,
    Saor,
    /// MUF scram from the keyboard shortcut
    Muf,
    /// Turn the MUF key switch
    Switch,
    Raise,
    Lower,
    Reset,
    Select { row: usize, col: usize },
    Click { x: i32, y: i32 },
    CoolLow,
    CoolHigh,
    Auto,
    Tick,
    State,
    Quit,
}

impl Command {
    /// Parse a text line, or a JSON object if the line starts with `{`
    pub fn parse_line(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.starts_with('{') {
            Ok(serde_json::from_str(line)?)
        } else {
            line.parse()
        }
    }
}

fn number<T: FromStr>(
    arg: Option<&str>,
    command: &'static str,
    expected: &'static str,
) -> Result<T, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument { command, expected })?;
    arg.parse().map_err(|_| CommandError::BadNumber(arg.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();

        let command = match head.as_str() {
            "az5" | "az-5" => Command::Az5,
            "saor" => Command::Saor,
            "m" | "muf" => Command::Muf,
            "switch" => Command::Switch,
            "raise" | "up" => Command::Raise,
            "lower" | "down" => Command::Lower,
            "reset" => Command::Reset,
            "select" => Command::Select {
                row: number(words.next(), "select", "<row> <col>")?,
                col: number(words.next(), "select", "<row> <col>")?,
            },
            "click" => Command::Click {
                x: number(words.next(), "click", "<x> <y>")?,
                y: number(words.next(), "click", "<x> <y>")?,
            },
            "cool" => match words.next() {
                Some("low") | Some("-") => Command::CoolLow,
                Some("high") | Some("+") => Command::CoolHigh,
                _ => {
                    return Err(CommandError::MissingArgument {
                        command: "cool",
                        expected: "low|high",
                    })
                }
            },
            "auto" => Command::Auto,
            "tick" => Command::Tick,
            "state" => Command::State,
            "quit" | "exit" | "q" => Command::Quit,
            _ => return Err(CommandError::Unknown(head)),
        };
        Ok(command)
    }
}

/// Rod state as the render layer colours it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RodDisplay {
    Inserted,
    Raising,
    FullyRaised,
    Lowering,
}

impl From<RodState> for RodDisplay {
    fn from(state: RodState) -> Self {
        match state {
            RodState::Inserted => RodDisplay::Inserted,
            RodState::Raising { .. } => RodDisplay::Raising,
            RodState::FullyRaised => RodDisplay::FullyRaised,
            RodState::Lowering { .. } => RodDisplay::Lowering,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RodView {
    pub row: usize,
    pub col: usize,
    pub x: i32,
    pub y: i32,
    pub state: RodDisplay,
    pub selected: bool,
}

impl RodView {
    fn new(rod: &Rod, selected: bool) -> Self {
        Self {
            row: rod.id.row,
            col: rod.id.col,
            x: rod.x,
            y: rod.y,
            state: rod.state.into(),
            selected,
        }
    }
}

/// Everything the render and audio layers need for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSnapshot {
    pub time: f64, // Seconds since start
    pub temperature: f64, // [°C]
    pub reactivity: i64, // SFKRE
    pub coolant: CoolantMode,
    pub auto_protection: bool,
    pub exploded: bool,
    pub az5_alarm: bool,
    pub muf_switch_on: bool,
    pub rods: Vec<RodView>,
    pub alarms: Vec<AlarmEvent>,
}

impl PanelSnapshot {
    /// Capture the panel and drain pending alarm events
    pub fn take<C: Clock>(sim: &mut ReactorSimulator<C>) -> Self {
        let alarms = sim.take_alarm_events();
        let state = sim.state();
        let selection = sim.selection();
        let rods = sim
            .rods()
            .iter()
            .map(|rod| RodView::new(rod, selection.contains(rod.id)))
            .collect();

        Self {
            time: sim.now().as_secs_f64(),
            temperature: state.temperature,
            reactivity: state.reactivity,
            coolant: state.coolant,
            auto_protection: state.auto_protection,
            exploded: state.exploded,
            az5_alarm: sim.az5_alarm_active(),
            muf_switch_on: sim.muf_switch().is_on(),
            rods,
            alarms,
        }
    }

    /// One-line status for the console
    pub fn summary(&self) -> String {
        let mut line = format!(
            "T={:.0}°C SFKRE={:05} coolant={:?} auto={}",
            self.temperature,
            self.reactivity,
            self.coolant,
            if self.auto_protection { "on" } else { "off" }
        );
        if self.az5_alarm {
            line.push_str(" [AZ-5]");
        }
        if self.exploded {
            line.push_str(" *** EXPLODED ***");
        }
        line
    }
}

/// Apply one operator command and report the resulting panel
pub fn dispatch<C: Clock>(sim: &mut ReactorSimulator<C>, command: Command) -> PanelSnapshot {
    log::debug!("command: {:?}", command);
    match command {
        Command::Az5 => sim.az5(),
        Command::Saor => sim.saor(),
        Command::Muf => sim.muf_scram(),
        Command::Switch => sim.flip_muf_switch(),
        Command::Raise => sim.raise_selected(),
        Command::Lower => sim.lower_selected(),
        Command::Reset => sim.clear_selection(),
        Command::Select { row, col } => sim.select_rod(RodId::new(row, col)),
        Command::Click { x, y } => sim.click(x, y),
        Command::CoolLow => sim.set_coolant_low(),
        Command::CoolHigh => sim.set_coolant_high(),
        Command::Auto => sim.toggle_auto_protection(),
        Command::Tick => sim.step(),
        Command::State | Command::Quit => {}
    }
    PanelSnapshot::take(sim)
}
