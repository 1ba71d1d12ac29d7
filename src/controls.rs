//! Operator actions on the control panel
//!
//! Every action is silently ignored once the reactor has exploded. Rejected
//! actions (cooldown running, nothing to do) are logged at debug level only.

use std::time::Duration;

use crate::clock::{Clock, Cooldown};
use crate::reactor::{constants, CoolantMode, ReactorSimulator};
use crate::rods::RodId;

/// Cooldowns for the emergency controls, measured from each one's last use
#[derive(Debug, Clone)]
pub struct ActionCooldowns {
    pub az5: Cooldown,
    pub saor: Cooldown,
    pub muf: Cooldown,
}

impl Default for ActionCooldowns {
    fn default() -> Self {
        Self {
            az5: Cooldown::new(constants::AZ5_COOLDOWN),
            saor: Cooldown::new(constants::SAOR_COOLDOWN),
            muf: Cooldown::new(constants::MUF_COOLDOWN),
        }
    }
}

/// Rotary "coupling power" key switch
///
/// Only turning it from off to on fires the MUF scram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MufSwitch {
    on: bool,
}

impl MufSwitch {
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Turn the key; returns true on the off -> on edge
    pub fn flip(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }
}

impl<C: Clock> ReactorSimulator<C> {
    /// AZ-5: emergency scram of all rods
    pub fn az5(&mut self) {
        let now = self.clock.now();
        self.az5_at(now);
    }

    pub(crate) fn az5_at(&mut self, now: Duration) {
        if self.state.exploded {
            return;
        }
        if !self.cooldowns.az5.try_fire(now) {
            log::debug!("AZ-5 ignored: cooldown");
            return;
        }

        self.rods.scram_all();
        // A shut-down core gets no spike from the rod tips
        if self.state.reactivity > 0 {
            self.state.reactivity += constants::AZ5_REACTIVITY_SPIKE;
        }
        self.state.temperature += constants::AZ5_TEMP_SPIKE;
        self.state.az5_decay.start(0);
        self.alarms.raise_az5();

        log::info!(
            "AZ-5 activated: SFKRE {}, T={:.0}",
            self.state.reactivity,
            self.state.temperature
        );
    }

    /// SAOR: emergency core cooling
    pub fn saor(&mut self) {
        if self.state.exploded {
            return;
        }
        let now = self.clock.now();
        if !self.cooldowns.saor.try_fire(now) {
            log::debug!("SAOR ignored: cooldown");
            return;
        }

        self.state.temperature =
            (self.state.temperature - constants::SAOR_COOLING).max(constants::AMBIENT_TEMP);
        self.alarms.saor();

        log::info!("SAOR activated: T={:.0}", self.state.temperature);
    }

    /// Coupling power cut: a smaller, faster scram on its own decay channel
    pub fn muf_scram(&mut self) {
        if self.state.exploded {
            return;
        }
        let now = self.clock.now();
        if !self.cooldowns.muf.try_fire(now) {
            log::debug!("MUF scram ignored: cooldown");
            return;
        }

        self.rods.scram_all();
        if self.state.reactivity > 0 {
            self.state.reactivity += constants::MUF_REACTIVITY_SPIKE;
        }
        self.state.temperature += constants::MUF_TEMP_SPIKE;
        self.state.muf_decay.start(0);

        log::info!(
            "MUF scram: SFKRE {}, T={:.0}",
            self.state.reactivity,
            self.state.temperature
        );
    }

    /// Turn the MUF key switch, scramming on the off -> on edge
    pub fn flip_muf_switch(&mut self) {
        if self.state.exploded {
            return;
        }
        if self.muf_switch.flip() {
            self.muf_scram();
        }
    }

    /// Start withdrawing the selected rods
    pub fn raise_selected(&mut self) {
        if self.state.exploded || self.selection.is_empty() {
            return;
        }
        let now = self.clock.now();
        let started = self.rods.begin_raise(&self.selection, now);
        log::debug!("raising {} rods", started);
    }

    /// Start inserting the selected rods
    pub fn lower_selected(&mut self) {
        if self.state.exploded || self.selection.is_empty() {
            return;
        }
        let now = self.clock.now();
        let started = self.rods.begin_lower(&self.selection, now);
        log::debug!("lowering {} rods", started);
    }

    /// Toggle a rod in the selection (at most four at once)
    pub fn select_rod(&mut self, id: RodId) {
        if self.state.exploded || !self.rods.contains(id) {
            return;
        }
        if !self.selection.toggle(id) {
            log::debug!("selection full, rod ({}, {}) ignored", id.row, id.col);
        }
    }

    /// Toggle every rod under a panel click
    pub fn click(&mut self, x: i32, y: i32) {
        for id in self.rods.hit_test(x, y) {
            self.select_rod(id);
        }
    }

    pub fn clear_selection(&mut self) {
        if self.state.exploded {
            return;
        }
        self.selection.clear();
    }

    /// Reduce main circulation: hotter core, more reactivity if running
    pub fn set_coolant_low(&mut self) {
        if self.state.exploded {
            return;
        }
        self.state.coolant = CoolantMode::Low;
        if self.state.reactivity > 0 {
            self.state.temperature = (self.state.temperature + constants::COOLANT_TEMP_STEP)
                .min(constants::COOLANT_LOW_TEMP_CAP);
            self.state.reactivity = (self.state.reactivity + constants::COOLANT_REACTIVITY_STEP)
                .min(constants::COOLANT_LOW_REACTIVITY_CAP);
        }
        log::info!("coolant flow reduced");
    }

    /// Increase main circulation: suppresses temperature and reactivity
    pub fn set_coolant_high(&mut self) {
        if self.state.exploded {
            return;
        }
        self.state.coolant = CoolantMode::High;
        self.state.temperature = (self.state.temperature - constants::COOLANT_TEMP_STEP).max(0.0);
        self.state.reactivity = (self.state.reactivity - constants::COOLANT_REACTIVITY_STEP).max(0);
        log::info!("coolant flow increased");
    }

    pub fn toggle_auto_protection(&mut self) {
        if self.state.exploded {
            return;
        }
        self.state.auto_protection = !self.state.auto_protection;
        log::info!(
            "auto-protection {}",
            if self.state.auto_protection { "on" } else { "off" }
        );
    }
}
