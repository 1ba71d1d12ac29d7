//! RBMK Reactor Panel State
//!
//! This module contains the reactor state and the per-tick update rule.
//! The model is deliberately coarse: an integer reactivity (SFKRE) drives a
//! temperature that chases a target set by reactivity and coolant flow.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::alarms::{AlarmEvent, AlarmSignals};
use crate::clock::{Clock, SimulationClock, SystemClock};
use crate::config::PanelConfig;
use crate::controls::{ActionCooldowns, MufSwitch};
use crate::rods::{RodSet, RodTick, Selection};

/// Rule constants for the panel model
pub mod constants {
    use std::time::Duration;

    pub const AMBIENT_TEMP: f64 = 20.0;
    pub const AUTO_PROTECTION_TEMP: f64 = 900.0;
    pub const EXPLOSION_TEMP: f64 = 1300.0;
    pub const MAX_TEMP_STEP: f64 = 10.0; // Per tick, toward target

    pub const ROD_REACTIVITY_STEP: i64 = 10; // Per moving rod per tick
    pub const AZ5_DECAY_STEP: i64 = 50;
    pub const MUF_DECAY_STEP: i64 = 100;

    // Every full 25 SFKRE gained adds 5 degrees
    pub const COUPLING_QUANTUM: i64 = 25;
    pub const TEMP_PER_QUANTUM: f64 = 5.0;

    pub const AZ5_COOLDOWN: Duration = Duration::from_secs(5);
    pub const AZ5_REACTIVITY_SPIKE: i64 = 100;
    pub const AZ5_TEMP_SPIKE: f64 = 50.0;

    pub const MUF_COOLDOWN: Duration = Duration::from_secs(2);
    pub const MUF_REACTIVITY_SPIKE: i64 = 50;
    pub const MUF_TEMP_SPIKE: f64 = 20.0;

    pub const SAOR_COOLDOWN: Duration = Duration::from_secs(60);
    pub const SAOR_COOLING: f64 = 300.0;

    pub const COOLANT_TEMP_STEP: f64 = 100.0;
    pub const COOLANT_REACTIVITY_STEP: i64 = 10;
    pub const COOLANT_LOW_TEMP_CAP: f64 = 2000.0;
    pub const COOLANT_LOW_REACTIVITY_CAP: i64 = 99_999;
}

/// Main circulation pump setting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolantMode {
    #[default]
    Normal,
    Low,
    High,
}

impl CoolantMode {
    /// Scale applied to the equilibrium temperature
    pub fn cooling_modifier(self) -> f64 {
        match self {
            CoolantMode::Normal => 1.0,
            CoolantMode::Low => 1.2, // Less water, hotter core
            CoolantMode::High => 0.7,
        }
    }
}

/// Stepwise ramp of reactivity down to a target after a scram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayProcess {
    pub active: bool,
    pub target: i64,
    pub step: i64,
}

impl DecayProcess {
    pub fn new(step: i64) -> Self {
        Self {
            active: false,
            target: 0,
            step,
        }
    }

    pub fn start(&mut self, target: i64) {
        self.active = true;
        self.target = target;
    }

    /// Apply one tick of decay to `reactivity` and return the new value.
    /// The process switches off on the first tick that finds nothing to do.
    pub fn apply(&mut self, reactivity: i64) -> i64 {
        if !self.active {
            return reactivity;
        }
        if reactivity > self.target && reactivity > 0 {
            (reactivity - self.step).max(self.target)
        } else {
            self.active = false;
            reactivity
        }
    }
}

/// Complete reactor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorState {
    pub temperature: f64, // [°C]
    pub reactivity: i64, // SFKRE
    pub coupled_reactivity: i64, // SFKRE already converted into heat
    pub coolant: CoolantMode,
    pub auto_protection: bool,
    pub exploded: bool,
    pub az5_decay: DecayProcess,
    pub muf_decay: DecayProcess,
}

impl Default for ReactorState {
    fn default() -> Self {
        Self {
            temperature: constants::AMBIENT_TEMP,
            reactivity: 0,
            coupled_reactivity: 0,
            coolant: CoolantMode::Normal,
            auto_protection: true,
            exploded: false,
            az5_decay: DecayProcess::new(constants::AZ5_DECAY_STEP),
            muf_decay: DecayProcess::new(constants::MUF_DECAY_STEP),
        }
    }
}

impl ReactorState {
    /// Withdrawing rods add reactivity, inserting rods remove it
    fn apply_rod_travel(&mut self, travel: &RodTick) {
        let step = constants::ROD_REACTIVITY_STEP;
        self.reactivity += step * travel.raising as i64;
        self.reactivity = (self.reactivity - step * travel.lowering as i64).max(0);
    }

    fn apply_decay(&mut self) {
        self.reactivity = self.az5_decay.apply(self.reactivity);
        self.reactivity = self.muf_decay.apply(self.reactivity);
    }

    /// Convert reactivity gained since the last tick into heat, in whole quanta.
    /// A drop in reactivity only resets the baseline.
    fn couple_temperature(&mut self) {
        let delta = self.reactivity - self.coupled_reactivity;
        if delta > 0 {
            let quanta = delta / constants::COUPLING_QUANTUM;
            if quanta > 0 {
                self.temperature += quanta as f64 * constants::TEMP_PER_QUANTUM;
                self.coupled_reactivity += quanta * constants::COUPLING_QUANTUM;
            }
        } else if delta < 0 {
            self.coupled_reactivity = self.reactivity;
        }
    }

    /// Equilibrium temperature for the current reactivity and coolant flow
    pub fn target_temperature(&self) -> f64 {
        let quanta = self.reactivity / constants::COUPLING_QUANTUM;
        quanta as f64 * constants::TEMP_PER_QUANTUM * self.coolant.cooling_modifier()
    }

    /// Move toward the equilibrium by a bounded step without overshooting
    fn settle_temperature(&mut self) {
        let target = self.target_temperature();
        if self.temperature < target {
            self.temperature += (target - self.temperature).min(constants::MAX_TEMP_STEP);
        } else if self.temperature > target {
            self.temperature -= (self.temperature - target).min(constants::MAX_TEMP_STEP);
        }
        self.temperature = self.temperature.max(constants::AMBIENT_TEMP);
    }
}

/// Reactor panel simulation engine
///
/// Owns every piece of mutable state; there is exactly one mutator at a time.
pub struct ReactorSimulator<C: Clock = SystemClock> {
    pub(crate) clock: C,
    pub(crate) ticker: SimulationClock,
    pub(crate) state: ReactorState,
    pub(crate) rods: RodSet,
    pub(crate) selection: Selection,
    pub(crate) cooldowns: ActionCooldowns,
    pub(crate) muf_switch: MufSwitch,
    pub(crate) alarms: AlarmSignals,
}

impl ReactorSimulator<SystemClock> {
    pub fn with_system_clock(config: &PanelConfig) -> Self {
        Self::new(config, SystemClock::new())
    }
}

impl<C: Clock> ReactorSimulator<C> {
    pub fn new(config: &PanelConfig, clock: C) -> Self {
        let rods = RodSet::generate(&config.layout);
        let ticker = SimulationClock::new(config.tick_interval(), clock.now());
        let state = ReactorState {
            auto_protection: config.auto_protection,
            ..ReactorState::default()
        };

        log::info!(
            "reactor panel ready: {} control rods, tick every {:?}",
            rods.len(),
            ticker.interval()
        );

        Self {
            clock,
            ticker,
            state,
            rods,
            selection: Selection::new(),
            cooldowns: ActionCooldowns::default(),
            muf_switch: MufSwitch::default(),
            alarms: AlarmSignals::default(),
        }
    }

    /// Run one update if the tick interval has elapsed. Returns true if it did.
    pub fn poll(&mut self) -> bool {
        if self.state.exploded {
            return false;
        }
        let now = self.clock.now();
        if self.ticker.poll(now) {
            self.update(now);
            true
        } else {
            false
        }
    }

    /// Force one update now. The next scheduled update is a full interval later.
    pub fn step(&mut self) {
        if self.state.exploded {
            return;
        }
        let now = self.clock.now();
        self.ticker.restart(now);
        self.update(now);
    }

    fn update(&mut self, now: Duration) {
        if self.state.exploded {
            return;
        }

        let travel = self.rods.tick(now);
        self.state.apply_rod_travel(&travel);
        self.state.apply_decay();
        self.state.couple_temperature();
        self.state.settle_temperature();

        if travel.completed_raises + travel.completed_lowers > 0 {
            log::debug!(
                "rod travel complete: {} withdrawn, {} inserted",
                travel.completed_raises,
                travel.completed_lowers
            );
        }

        if self.state.auto_protection && self.state.temperature >= constants::AUTO_PROTECTION_TEMP {
            log::warn!(
                "auto-protection trip at {:.0}°C",
                self.state.temperature
            );
            self.az5_at(now);
        }

        if !self.state.exploded && self.state.temperature >= constants::EXPLOSION_TEMP {
            self.state.exploded = true;
            self.alarms.explosion();
            log::error!(
                "*** REACTOR EXPLOSION *** temperature {:.0}°C, SFKRE {}",
                self.state.temperature,
                self.state.reactivity
            );
        }

        if self.state.reactivity <= 0 || self.state.exploded {
            self.alarms.clear_az5();
        }

        log::debug!(
            "tick: T={:.1} SFKRE={} raising={} lowering={}",
            self.state.temperature,
            self.state.reactivity,
            travel.raising,
            travel.lowering
        );
    }

    /// Current time on the injected clock
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    /// Get current state snapshot
    pub fn get_state(&self) -> ReactorState {
        self.state.clone()
    }

    pub fn rods(&self) -> &RodSet {
        &self.rods
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn muf_switch(&self) -> &MufSwitch {
        &self.muf_switch
    }

    pub fn az5_alarm_active(&self) -> bool {
        self.alarms.az5_active()
    }

    /// Drain alarm edges queued since the last call
    pub fn take_alarm_events(&mut self) -> Vec<AlarmEvent> {
        self.alarms.drain()
    }

    pub fn is_exploded(&self) -> bool {
        self.state.exploded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::rods::{RodId, RodState};

    fn simulator() -> (ReactorSimulator<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let sim = ReactorSimulator::new(&PanelConfig::default(), clock.clone());
        (sim, clock)
    }

    #[test]
    fn test_initial_state() {
        let (sim, _) = simulator();
        let state = sim.get_state();
        assert_eq!(state.temperature, 20.0);
        assert_eq!(state.reactivity, 0);
        assert!(state.auto_protection);
        assert!(!state.exploded);
        assert_eq!(sim.rods().len(), 61);
    }

    #[test]
    fn test_decay_process_deactivates_on_following_tick() {
        let mut decay = DecayProcess::new(50);
        decay.start(0);
        assert_eq!(decay.apply(120), 70);
        assert_eq!(decay.apply(70), 20);
        assert_eq!(decay.apply(20), 0);
        assert!(decay.active);
        assert_eq!(decay.apply(0), 0);
        assert!(!decay.active);
        // Inactive decay leaves reactivity alone
        assert_eq!(decay.apply(500), 500);
    }

    #[test]
    fn test_coupling_quantizes_to_25() {
        let mut state = ReactorState {
            reactivity: 60,
            ..ReactorState::default()
        };
        state.couple_temperature();
        // 60 = two full quanta, 10 left over for later
        assert_eq!(state.temperature, 30.0);
        assert_eq!(state.coupled_reactivity, 50);

        state.reactivity = 74;
        state.couple_temperature();
        assert_eq!(state.temperature, 30.0);
        assert_eq!(state.coupled_reactivity, 50);

        state.reactivity = 75;
        state.couple_temperature();
        assert_eq!(state.temperature, 35.0);
        assert_eq!(state.coupled_reactivity, 75);

        // Decrease resets the baseline without cooling
        state.reactivity = 40;
        state.couple_temperature();
        assert_eq!(state.temperature, 35.0);
        assert_eq!(state.coupled_reactivity, 40);
    }

    #[test]
    fn test_settle_temperature_bounded_step() {
        let mut state = ReactorState {
            reactivity: 1000, // target 200
            ..ReactorState::default()
        };
        state.settle_temperature();
        assert_eq!(state.temperature, 30.0);

        state.temperature = 195.0;
        state.settle_temperature();
        assert_eq!(state.temperature, 200.0);

        state.reactivity = 0;
        state.temperature = 25.0;
        state.settle_temperature();
        assert_eq!(state.temperature, 20.0);
    }

    #[test]
    fn test_coolant_modifies_target() {
        let mut state = ReactorState {
            reactivity: 1000,
            ..ReactorState::default()
        };
        assert_eq!(state.target_temperature(), 200.0);
        state.coolant = CoolantMode::High;
        assert!((state.target_temperature() - 140.0).abs() < 1e-9);
        state.coolant = CoolantMode::Low;
        assert!((state.target_temperature() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_poll_follows_tick_cadence() {
        let (mut sim, clock) = simulator();
        assert!(!sim.poll());
        clock.advance(Duration::from_millis(500));
        assert!(!sim.poll());
        clock.advance(Duration::from_millis(500));
        assert!(sim.poll());
        assert!(!sim.poll());
    }

    #[test]
    fn test_forced_step_restarts_cadence() {
        let (mut sim, clock) = simulator();
        sim.select_rod(RodId::new(4, 4));
        sim.raise_selected();

        clock.advance(Duration::from_millis(900));
        sim.step();
        assert_eq!(sim.state().reactivity, 10);

        // Less than a second since the forced update
        clock.advance(Duration::from_millis(100));
        assert!(!sim.poll());
        assert_eq!(sim.state().reactivity, 10);

        clock.advance(Duration::from_millis(900));
        assert!(sim.poll());
        assert_eq!(sim.state().reactivity, 20);
    }

    #[test]
    fn test_raising_rods_heat_the_core() {
        let (mut sim, clock) = simulator();
        sim.select_rod(RodId::new(4, 4));
        sim.select_rod(RodId::new(4, 5));
        sim.raise_selected();

        let mut reactivity = Vec::new();
        for _ in 0..6 {
            clock.advance_secs(1);
            assert!(sim.poll());
            reactivity.push(sim.state().reactivity);
        }
        // Rods contribute on every tick up to and including completion at t+5
        assert_eq!(reactivity, vec![20, 40, 60, 80, 100, 100]);
        assert!(sim.rods().get(RodId::new(4, 4)).unwrap().is_fully_raised());
        assert!(sim.state().temperature > 20.0);
    }

    #[test]
    fn test_lowering_rods_floor_reactivity() {
        let (mut sim, clock) = simulator();
        sim.select_rod(RodId::new(4, 4));
        sim.raise_selected();
        for _ in 0..5 {
            clock.advance_secs(1);
            sim.poll();
        }
        assert_eq!(sim.state().reactivity, 50);

        sim.lower_selected();
        for _ in 0..8 {
            clock.advance_secs(1);
            sim.poll();
            assert!(sim.state().reactivity >= 0);
        }
        assert_eq!(sim.state().reactivity, 0);
        assert!(sim.rods().get(RodId::new(4, 4)).unwrap().is_inserted());
    }

    #[test]
    fn test_invariants_hold_every_tick() {
        let (mut sim, clock) = simulator();
        for col in 2..6 {
            sim.select_rod(RodId::new(4, col));
        }
        sim.raise_selected();
        sim.set_coolant_high();
        for second in 0..120 {
            clock.advance_secs(1);
            sim.poll();
            if second == 30 {
                sim.lower_selected();
            }
            if second == 60 {
                sim.muf_scram();
            }
            let state = sim.state();
            assert!(state.temperature >= 20.0);
            assert!(state.reactivity >= 0);
        }
    }

    #[test]
    fn test_auto_protection_fires_az5_same_tick() {
        let (mut sim, clock) = simulator();
        sim.state.temperature = 890.0;
        sim.state.reactivity = 5000; // target 1000
        sim.state.coupled_reactivity = 5000;
        sim.select_rod(RodId::new(4, 4));
        sim.raise_selected();

        clock.advance_secs(1);
        assert!(sim.poll());

        let state = sim.state();
        // +10 rod, 890 -> 900, then AZ-5: +100 SFKRE, +50 degrees
        assert_eq!(state.reactivity, 5110);
        assert_eq!(state.temperature, 950.0);
        assert!(state.az5_decay.active);
        assert!(sim.rods().iter().all(|r| r.state == RodState::Inserted));
        assert!(sim.az5_alarm_active());
    }

    #[test]
    fn test_auto_protection_disabled() {
        let (mut sim, clock) = simulator();
        sim.toggle_auto_protection();
        sim.state.temperature = 890.0;
        sim.state.reactivity = 5000;
        sim.state.coupled_reactivity = 5000;

        clock.advance_secs(1);
        sim.poll();
        assert_eq!(sim.state().temperature, 900.0);
        assert!(!sim.state().az5_decay.active);
    }

    #[test]
    fn test_explosion_latches_and_freezes() {
        let (mut sim, clock) = simulator();
        sim.toggle_auto_protection();
        sim.state.temperature = 1295.0;
        sim.state.reactivity = 99_999;
        sim.state.coupled_reactivity = 99_999;

        clock.advance_secs(1);
        sim.poll();
        assert!(sim.is_exploded());
        assert_eq!(sim.state().temperature, 1305.0);
        assert_eq!(sim.take_alarm_events(), vec![AlarmEvent::Explosion]);

        let frozen = sim.get_state();
        for _ in 0..5 {
            clock.advance_secs(1);
            assert!(!sim.poll());
            sim.step();
        }
        assert_eq!(sim.get_state(), frozen);
        assert!(sim.take_alarm_events().is_empty());
    }

    #[test]
    fn test_explosion_stops_az5_alarm() {
        let (mut sim, clock) = simulator();
        sim.state.temperature = 1245.0;
        sim.state.reactivity = 99_999;
        sim.state.coupled_reactivity = 99_999;

        clock.advance_secs(1);
        sim.poll();
        // 1255 trips auto-protection, AZ-5 adds 50 and the core goes
        assert!(sim.is_exploded());
        assert_eq!(sim.state().temperature, 1305.0);
        assert!(!sim.az5_alarm_active());
        assert_eq!(
            sim.take_alarm_events(),
            vec![
                AlarmEvent::Az5Started,
                AlarmEvent::Explosion,
                AlarmEvent::Az5Stopped
            ]
        );
    }

    #[test]
    fn test_az5_alarm_clears_when_reactivity_reaches_zero() {
        let (mut sim, clock) = simulator();
        sim.state.reactivity = 40;
        sim.state.coupled_reactivity = 40;
        sim.az5();
        assert!(sim.az5_alarm_active());
        assert_eq!(sim.state().reactivity, 140);

        clock.advance_secs(1);
        sim.poll();
        assert_eq!(sim.state().reactivity, 90);
        assert!(sim.az5_alarm_active());

        clock.advance_secs(1);
        sim.poll();
        clock.advance_secs(1);
        sim.poll();
        assert_eq!(sim.state().reactivity, 0);
        assert!(!sim.az5_alarm_active());
    }
}
