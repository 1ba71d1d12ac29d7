//! Control rods and their insertion/withdrawal state machine
//!
//! The rod field is a square grid clipped to a circle, generated once at
//! startup. Each rod travels independently; travel is advanced only by the
//! periodic reactor tick.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time for a rod to travel fully in either direction
pub const ROD_TRAVEL_TIME: Duration = Duration::from_secs(5);

/// Maximum number of rods the operator can select at once
pub const MAX_SELECTED: usize = 4;

/// Rod identity: grid row and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RodId {
    pub row: usize,
    pub col: usize,
}

impl RodId {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RodState {
    Inserted,
    Raising { since: Duration },
    FullyRaised,
    Lowering { since: Duration },
}

/// A single control rod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rod {
    pub id: RodId,
    pub x: i32, // Display square, top-left corner [px]
    pub y: i32,
    pub state: RodState,
}

impl Rod {
    pub fn is_inserted(&self) -> bool {
        self.state == RodState::Inserted
    }

    pub fn is_fully_raised(&self) -> bool {
        self.state == RodState::FullyRaised
    }

    pub fn is_moving(&self) -> bool {
        matches!(
            self.state,
            RodState::Raising { .. } | RodState::Lowering { .. }
        )
    }
}

/// Geometry of the rod field on the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RodLayout {
    pub grid_size: usize,
    pub rod_size: i32,
    pub gap: i32,
    pub zone_center: (i32, i32),
    pub zone_radius: i32,
}

impl Default for RodLayout {
    fn default() -> Self {
        Self {
            grid_size: 9,
            rod_size: 38,
            gap: 4,
            zone_center: (350, 350),
            zone_radius: 180,
        }
    }
}

impl RodLayout {
    /// Distance between neighbouring rods
    pub fn pitch(&self) -> i32 {
        self.rod_size + self.gap
    }
}

/// Counts reported by one tick of the rod field
///
/// `raising` and `lowering` are counted before this tick's completions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RodTick {
    pub raising: usize,
    pub lowering: usize,
    pub completed_raises: usize,
    pub completed_lowers: usize,
}

/// Ordered collection of all rods on the panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RodSet {
    rods: Vec<Rod>,
    rod_size: i32,
}

impl RodSet {
    /// Build the rod field: every grid cell whose position falls inside the zone
    pub fn generate(layout: &RodLayout) -> Self {
        let (cx, cy) = layout.zone_center;
        let half = layout.grid_size as i32 / 2;
        let pitch = layout.pitch();
        let r2 = i64::from(layout.zone_radius).pow(2);

        let mut rods = Vec::new();
        for i in 0..layout.grid_size {
            for j in 0..layout.grid_size {
                let x = cx + (j as i32 - half) * pitch;
                let y = cy + (i as i32 - half) * pitch;
                let dx = i64::from(x - cx);
                let dy = i64::from(y - cy);
                if dx * dx + dy * dy <= r2 {
                    rods.push(Rod {
                        id: RodId::new(i, j),
                        x,
                        y,
                        state: RodState::Inserted,
                    });
                }
            }
        }

        log::debug!("generated {} control rods", rods.len());
        Self {
            rods,
            rod_size: layout.rod_size,
        }
    }

    pub fn len(&self) -> usize {
        self.rods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rod> {
        self.rods.iter()
    }

    pub fn get(&self, id: RodId) -> Option<&Rod> {
        self.rods.iter().find(|rod| rod.id == id)
    }

    pub fn contains(&self, id: RodId) -> bool {
        self.get(id).is_some()
    }

    /// Start withdrawing every selected rod that is fully inserted
    pub fn begin_raise(&mut self, selection: &Selection, now: Duration) -> usize {
        let mut started = 0;
        for rod in self.rods.iter_mut() {
            if selection.contains(rod.id) && rod.state == RodState::Inserted {
                rod.state = RodState::Raising { since: now };
                started += 1;
            }
        }
        started
    }

    /// Start inserting every selected rod that is fully withdrawn
    pub fn begin_lower(&mut self, selection: &Selection, now: Duration) -> usize {
        let mut started = 0;
        for rod in self.rods.iter_mut() {
            if selection.contains(rod.id) && rod.state == RodState::FullyRaised {
                rod.state = RodState::Lowering { since: now };
                started += 1;
            }
        }
        started
    }

    /// Drop every rod into the core, cancelling any travel in progress
    pub fn scram_all(&mut self) {
        for rod in self.rods.iter_mut() {
            rod.state = RodState::Inserted;
        }
    }

    /// Count moving rods, then complete any travel that has run its course
    pub fn tick(&mut self, now: Duration) -> RodTick {
        let mut report = RodTick::default();

        for rod in self.rods.iter_mut() {
            match rod.state {
                RodState::Raising { since } => {
                    report.raising += 1;
                    if now.saturating_sub(since) >= ROD_TRAVEL_TIME {
                        rod.state = RodState::FullyRaised;
                        report.completed_raises += 1;
                    }
                }
                RodState::Lowering { since } => {
                    report.lowering += 1;
                    if now.saturating_sub(since) >= ROD_TRAVEL_TIME {
                        rod.state = RodState::Inserted;
                        report.completed_lowers += 1;
                    }
                }
                RodState::Inserted | RodState::FullyRaised => {}
            }
        }

        report
    }

    /// Rods whose display square contains the point.
    /// The right and bottom edges lie outside the square.
    pub fn hit_test(&self, px: i32, py: i32) -> Vec<RodId> {
        self.rods
            .iter()
            .filter(|rod| {
                px >= rod.x
                    && px < rod.x + self.rod_size
                    && py >= rod.y
                    && py < rod.y + self.rod_size
            })
            .map(|rod| rod.id)
            .collect()
    }
}

/// Rods picked by the operator for the next raise/lower command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<RodId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: RodId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_SELECTED
    }

    pub fn ids(&self) -> &[RodId] {
        &self.ids
    }

    /// Deselect `id` if selected, otherwise select it if there is room.
    /// Returns false when the selection was full and nothing changed.
    pub fn toggle(&mut self, id: RodId) -> bool {
        if let Some(pos) = self.ids.iter().position(|&s| s == id) {
            self.ids.remove(pos);
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
