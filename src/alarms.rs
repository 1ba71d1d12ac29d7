//! Alarm signals for the audio layer
//!
//! The core never plays sound. It keeps the AZ-5 loop flag, a latch for the
//! explosion siren, and a queue of edge events that the audio collaborator
//! drains once per frame.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmEvent {
    /// AZ-5 siren should start looping
    Az5Started,
    /// AZ-5 siren should stop
    Az5Stopped,
    /// SAOR horn, one shot per activation
    Saor,
    /// Explosion siren, fired once and never interrupted
    Explosion,
}

#[derive(Debug, Clone, Default)]
pub struct AlarmSignals {
    az5_active: bool,
    explosion_fired: bool,
    pending: Vec<AlarmEvent>,
}

impl AlarmSignals {
    pub fn az5_active(&self) -> bool {
        self.az5_active
    }

    pub fn explosion_fired(&self) -> bool {
        self.explosion_fired
    }

    pub fn raise_az5(&mut self) {
        if !self.az5_active {
            self.az5_active = true;
            self.pending.push(AlarmEvent::Az5Started);
        }
    }

    pub fn clear_az5(&mut self) {
        if self.az5_active {
            self.az5_active = false;
            self.pending.push(AlarmEvent::Az5Stopped);
        }
    }

    pub fn saor(&mut self) {
        self.pending.push(AlarmEvent::Saor);
    }

    /// Latches the explosion siren; later calls are ignored
    pub fn explosion(&mut self) {
        if !self.explosion_fired {
            self.explosion_fired = true;
            self.pending.push(AlarmEvent::Explosion);
        }
    }

    /// Hand queued edge events to the caller
    pub fn drain(&mut self) -> Vec<AlarmEvent> {
        std::mem::take(&mut self.pending)
    }
}
