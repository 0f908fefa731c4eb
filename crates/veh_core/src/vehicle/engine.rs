//! Engine run states and the per-tick idle step.
//!
//! `Off -> Starting -> Running <-> Overspeed`; fuel starvation or breakage
//! moves a burning engine to `Fault`, which clears to `Off` on the next idle.

use rand::Rng;

use super::Vehicle;
use crate::{EngineState, EngineStopReason, Event, ItemTypeId, FUEL_BATTERY};

impl Vehicle {
    /// Engine part indices, broken ones included.
    pub fn engines(&self) -> Vec<usize> {
        self.index.engines.clone()
    }

    pub fn is_engine_on(&self, e: usize) -> bool {
        self.live_part(e)
            .is_some_and(|p| p.is_engine() && p.engine_state.is_on())
    }

    /// Whether any engine is delivering power.
    pub fn engine_on(&self) -> bool {
        self.engine_on
    }

    fn refresh_engine_on(&mut self) {
        self.engine_on = self
            .index
            .engines
            .iter()
            .any(|&e| self.parts[e].engine_state.is_on());
    }

    /// First engine currently delivering power.
    pub fn current_engine(&self) -> Option<usize> {
        self.index
            .engines
            .iter()
            .copied()
            .find(|&e| self.parts[e].engine_state.is_on() && !self.parts[e].is_broken())
    }

    /// Whether engine `e` has fuel for at least one idle tick.
    pub fn is_engine_fueled(&self, e: usize) -> bool {
        let Some(engine) = self.live_part(e).and_then(|p| p.info().engine.as_ref()) else {
            return false;
        };
        self.fuel_left(&engine.fuel, true) >= engine.idle_fuel_per_tick.max(1)
    }

    /// Combined output in watts of engines that are on, or with `fueled`, of
    /// every enabled engine that could run.
    pub fn total_power(&self, fueled: bool) -> i32 {
        self.index
            .engines
            .iter()
            .copied()
            .filter(|&e| {
                let part = &self.parts[e];
                if fueled {
                    part.enabled && self.is_engine_fueled(e)
                } else {
                    part.engine_state.is_on()
                }
            })
            .map(|e| self.parts[e].power(&self.content.constants))
            .sum()
    }

    /// Try to start engine `e`. Worn engines may fail and, below their
    /// backfire threshold, backfire.
    pub fn start_engine(&mut self, e: usize, rng: &mut impl Rng) -> bool {
        let Some(part) = self.live_part(e) else {
            return false;
        };
        let Some(engine) = part.info().engine.clone() else {
            tracing::debug!(vehicle = %self.id, part = e, "start_engine on non-engine part");
            return false;
        };
        if part.engine_state.is_burning() {
            return true;
        }
        let health = part.health_fraction();
        if part.is_broken() || !self.is_engine_fueled(e) {
            self.emit(Event::EngineStartFailed {
                part: e,
                backfire: false,
            });
            return false;
        }
        let threshold = self.content.constants.engine_start_fault_threshold;
        if health < threshold && threshold > 0.0 {
            let chance = f64::from((threshold - health) / threshold).clamp(0.0, 1.0);
            if rng.gen_bool(chance) {
                let backfire = health < engine.backfire_threshold;
                if backfire {
                    self.backfire(e);
                }
                self.emit(Event::EngineStartFailed { part: e, backfire });
                return false;
            }
        }
        let part = &mut self.parts[e];
        part.enabled = true;
        part.engine_state = if engine.start_ticks > 0 {
            EngineState::Starting {
                ticks_left: engine.start_ticks,
            }
        } else {
            EngineState::Running
        };
        self.refresh_engine_on();
        self.emit(Event::EngineStarted { part: e });
        true
    }

    /// Start every enabled engine. Returns how many are now burning.
    pub fn start_engines(&mut self, rng: &mut impl Rng) -> usize {
        let mut started = 0;
        for e in self.engines() {
            if self.parts[e].enabled && self.start_engine(e, rng) {
                started += 1;
            }
        }
        started
    }

    pub fn stop_engines(&mut self) {
        for e in self.engines() {
            if self.parts[e].engine_state.is_burning() {
                self.parts[e].engine_state = EngineState::Off;
                self.emit(Event::EngineStopped {
                    part: e,
                    reason: EngineStopReason::Manual,
                });
            }
        }
        self.refresh_engine_on();
    }

    /// Enable or disable a single engine; disabling a burning engine stops it.
    pub fn toggle_engine(&mut self, e: usize, enabled: bool) {
        let Some(part) = self.parts.get_mut(e).filter(|p| !p.removed && p.is_engine()) else {
            return;
        };
        part.enabled = enabled;
        if !enabled && part.engine_state.is_burning() {
            part.engine_state = EngineState::Off;
            self.emit(Event::EngineStopped {
                part: e,
                reason: EngineStopReason::Manual,
            });
        }
        self.refresh_engine_on();
    }

    pub(crate) fn stall_engine(&mut self, e: usize, reason: EngineStopReason) {
        if !self.parts[e].engine_state.is_burning() {
            return;
        }
        self.parts[e].engine_state = EngineState::Fault;
        tracing::debug!(vehicle = %self.id, part = e, ?reason, "engine stalled");
        self.emit(Event::EngineStopped { part: e, reason });
        self.refresh_engine_on();
    }

    /// Feed every burning engine for one tick at `load`. Engines that cannot
    /// be fed stall. Returns false when any engine stalled.
    pub(crate) fn consume_fuel(&mut self, load: f32) -> bool {
        let mut all_fed = true;
        for e in self.engines() {
            let part = &self.parts[e];
            if !part.engine_state.is_burning() {
                continue;
            }
            let cost = part.fuel_cost(load);
            let Some(fuel) = part.info().engine.as_ref().map(|d| d.fuel.clone()) else {
                continue;
            };
            if cost <= 0 {
                continue;
            }
            let drawn = if fuel.as_str() == FUEL_BATTERY {
                cost - self.discharge_battery(cost, true)
            } else {
                self.drain(&fuel, cost)
            };
            if drawn < cost {
                self.stall_engine(e, EngineStopReason::OutOfFuel);
                all_fed = false;
            }
        }
        all_fed
    }

    /// Engine load in `[0, 1]`: road friction plus alternators.
    pub fn engine_load(&self) -> f32 {
        let power = self.total_power(false);
        if power <= 0 {
            return 0.0;
        }
        (self.friction_load() / power as f32 + self.alternator_load).clamp(0.0, 1.0)
    }

    /// One tick of running in place: fuel, alternators, consumers, leaks,
    /// overspeed and emissions.
    pub fn idle(&mut self, on_map: bool) {
        for e in self.engines() {
            if self.parts[e].engine_state == EngineState::Fault {
                self.parts[e].engine_state = EngineState::Off;
            }
        }
        let load = self.engine_load();
        self.consume_fuel(load);
        self.advance_starting();
        self.charge_from_alternators();
        self.power_consumers();
        self.slow_leak();
        self.update_engine_overspeed();
        self.refresh_engine_on();
        if on_map && self.engine_on {
            self.noise_and_smoke(load);
        }
    }

    fn advance_starting(&mut self) {
        for e in self.engines() {
            if let EngineState::Starting { ticks_left } = self.parts[e].engine_state {
                self.parts[e].engine_state = if ticks_left <= 1 {
                    EngineState::Running
                } else {
                    EngineState::Starting {
                        ticks_left: ticks_left - 1,
                    }
                };
            }
        }
    }

    fn charge_from_alternators(&mut self) {
        let watts = self.alternator_power();
        let engine_power = self.total_power(false);
        if watts <= 0 || engine_power <= 0 {
            self.alternator_load = 0.0;
            return;
        }
        self.alternator_load = (watts as f32 / engine_power as f32).min(1.0);
        let energy = self.epower_to_charge(watts);
        self.charge_battery(energy);
    }

    /// Power lights and other consumers; switch them off when the batteries
    /// cannot keep up.
    fn power_consumers(&mut self) {
        let energy = self.epower_to_charge(self.power_usage());
        if energy <= 0 || self.discharge_battery(energy, true) == 0 {
            return;
        }
        tracing::debug!(vehicle = %self.id, "batteries flat, switching consumers off");
        for part in &mut self.parts {
            if !part.removed && part.epower() < 0 {
                part.enabled = false;
            }
        }
    }

    pub(crate) fn update_engine_overspeed(&mut self) {
        let damage = self.content.constants.engine_overspeed_damage;
        for e in self.engines() {
            let state = self.parts[e].engine_state;
            if !state.is_on() {
                continue;
            }
            if self.overspeed(e) {
                if state == EngineState::Running {
                    self.parts[e].engine_state = EngineState::Overspeed;
                    self.emit(Event::EngineOverspeed { part: e });
                }
                self.mod_hp(e, -damage);
            } else if state == EngineState::Overspeed {
                self.parts[e].engine_state = EngineState::Running;
            }
        }
    }

    /// Emit engine noise for the whole vehicle and smoke from worn engines.
    pub fn noise_and_smoke(&mut self, load: f32) {
        let c = &self.content.constants;
        let threshold = c.smoke_health_threshold;
        let load = load.clamp(0.0, 1.0);
        let mut noise = 0.0_f32;
        let mut smoke = Vec::new();
        for &e in &self.index.engines {
            let part = &self.parts[e];
            let Some(engine) = part.info().engine.as_ref() else {
                continue;
            };
            if !part.engine_state.is_on() {
                continue;
            }
            noise += engine.noise * (0.5 + 0.5 * load);
            let health = part.health_fraction();
            if threshold > 0.0 && health < threshold {
                let density = ((threshold - health) / threshold * 10.0 * (0.5 + load)).ceil();
                smoke.push((e, density as u32));
            }
        }
        for (e, density) in smoke {
            let pos = self.global_part_pos3(e);
            self.emit(Event::Smoke { pos, density });
        }
        if noise > 0.0 {
            let pos = self.global_pos3();
            self.emit(Event::Noise { pos, volume: noise });
        }
    }

    pub fn backfire(&mut self, e: usize) {
        let Some(part) = self.live_part(e) else {
            return;
        };
        let power = part.info().engine.as_ref().map_or(0, |d| d.power_w);
        let volume = 40.0 + power as f32 / 10_000.0;
        let pos = self.global_part_pos3(e);
        self.emit(Event::Noise { pos, volume });
    }

    /// Fuel the engine at `e` burns, if it is an engine.
    pub fn engine_fuel(&self, e: usize) -> Option<&ItemTypeId> {
        self.live_part(e)?.info().engine.as_ref().map(|d| &d.fuel)
    }
}
