//! Fuel tanks, batteries and reactors.
//!
//! `fuel_left` and `drain` walk the same set of sources, so a drain never
//! takes more than the last `fuel_left` reported. Battery charge is in kJ.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::Vehicle;
use crate::part::VehiclePart;
use crate::{ItemTypeId, VehicleId, FUEL_BATTERY};

fn is_fuel_source(part: &VehiclePart) -> bool {
    !part.removed && !part.is_broken() && (part.is_tank() || part.is_battery() || part.is_reactor())
}

impl Vehicle {
    fn fuel_sources(&self, ftype: &ItemTypeId) -> Vec<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| is_fuel_source(p) && p.ammo_current() == Some(ftype))
            .map(|(i, _)| i)
            .collect()
    }

    fn batteries(&self) -> Vec<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.removed && !p.is_broken() && p.is_battery())
            .map(|(i, _)| i)
            .collect()
    }

    /// Fuel of type `ftype` held by intact tanks, batteries and reactors.
    ///
    /// With `include_reactors`, battery queries also count the energy the
    /// enabled reactors could still produce.
    pub fn fuel_left(&self, ftype: &ItemTypeId, include_reactors: bool) -> i64 {
        let stored: i64 = self
            .fuel_sources(ftype)
            .into_iter()
            .map(|p| self.parts[p].ammo_remaining())
            .sum();
        if include_reactors && ftype.as_str() == FUEL_BATTERY {
            stored + self.reactor_energy()
        } else {
            stored
        }
    }

    fn reactor_energy(&self) -> i64 {
        self.index
            .reactors
            .iter()
            .map(|&r| &self.parts[r])
            .filter(|p| p.enabled && !p.is_broken())
            .map(|p| {
                let per_unit = p
                    .ammo_current()
                    .and_then(|fuel| self.content.item(fuel))
                    .map_or(0, |def| def.energy_kj);
                p.ammo_remaining() * per_unit
            })
            .sum()
    }

    /// Every fuel on board with its quantity.
    pub fn fuels_left(&self) -> BTreeMap<ItemTypeId, i64> {
        let mut fuels = BTreeMap::new();
        for part in self.parts.iter().filter(|p| is_fuel_source(p)) {
            if let Some(fuel) = part.ammo_current() {
                *fuels.entry(fuel.clone()).or_insert(0) += part.ammo_remaining();
            }
        }
        fuels
    }

    /// Capacity of intact containers holding, or able to hold, `ftype`.
    pub fn fuel_capacity(&self, ftype: &ItemTypeId) -> i64 {
        self.parts
            .iter()
            .filter(|p| is_fuel_source(p))
            .filter(|p| match p.ammo_current() {
                Some(current) if p.ammo_remaining() > 0 || p.is_battery() => current == ftype,
                _ => p.info().fuel_type.as_ref() == Some(ftype),
            })
            .map(VehiclePart::ammo_capacity)
            .sum()
    }

    /// Take up to `amount` of `ftype` from sources in part order. Returns the
    /// amount drawn.
    pub fn drain(&mut self, ftype: &ItemTypeId, amount: i64) -> i64 {
        let mut left = amount.max(0);
        for p in self.fuel_sources(ftype) {
            if left == 0 {
                break;
            }
            left -= self.parts[p].ammo_consume(left);
        }
        let drawn = amount.max(0) - left;
        if drawn > 0 {
            self.invalidate_mass();
        }
        drawn
    }

    /// Add `qty` of `ammo` to part `p`. Returns the quantity added.
    pub fn refill(&mut self, p: usize, ammo: &ItemTypeId, qty: i64) -> i64 {
        let content = Arc::clone(&self.content);
        let Some(part) = self.parts.get_mut(p).filter(|part| !part.removed) else {
            return 0;
        };
        if part.ammo_remaining() > 0 && part.ammo_current() != Some(ammo) {
            return 0;
        }
        let before = part.ammo_remaining();
        let Some(after) = part.ammo_set(ammo, Some(before + qty.max(0)), &content) else {
            return 0;
        };
        self.invalidate_mass();
        after - before
    }

    /// Store `amount` kJ across batteries in part order. Returns the leftover
    /// that did not fit, always in `0..=amount`.
    pub fn charge_battery(&mut self, amount: i64) -> i64 {
        let mut left = amount.max(0);
        for p in self.batteries() {
            if left == 0 {
                break;
            }
            let part = &mut self.parts[p];
            let room = part.ammo_capacity() - part.ammo_remaining();
            let qty = room.min(left);
            if qty > 0 {
                part.base.ammo = Some(ItemTypeId::new(FUEL_BATTERY));
                part.base.ammo_charges += qty;
                left -= qty;
            }
        }
        left
    }

    /// Draw `amount` kJ from batteries, then from enabled reactors when
    /// allowed. Returns the unmet remainder, always in `0..=amount`.
    pub fn discharge_battery(&mut self, amount: i64, reactors: bool) -> i64 {
        let mut left = amount.max(0);
        for p in self.batteries() {
            if left == 0 {
                break;
            }
            left -= self.parts[p].ammo_consume(left);
        }
        if left > 0 && reactors {
            left = self.draw_from_reactors(left);
        }
        left
    }

    fn draw_from_reactors(&mut self, mut left: i64) -> i64 {
        for r in self.index.reactors.clone() {
            let part = &self.parts[r];
            if !part.enabled || part.is_broken() {
                continue;
            }
            let per_unit = part
                .ammo_current()
                .and_then(|fuel| self.content.item(fuel))
                .map_or(0, |def| def.energy_kj);
            if per_unit <= 0 {
                continue;
            }
            let units = (left + per_unit - 1) / per_unit;
            let produced = self.parts[r].ammo_consume(units) * per_unit;
            self.invalidate_mass();
            if produced >= left {
                let surplus = produced - left;
                self.charge_battery(surplus);
                return 0;
            }
            left -= produced;
        }
        left
    }

    /// Energy in kJ delivered by `watts` over one tick.
    pub fn epower_to_charge(&self, watts: i32) -> i64 {
        (watts as f32 * self.content.constants.seconds_per_tick / 1000.0).round() as i64
    }

    /// Watts drawn by enabled electrical consumers.
    pub fn power_usage(&self) -> i32 {
        self.parts
            .iter()
            .filter(|p| !p.removed && p.enabled && p.epower() < 0)
            .map(|p| -p.epower())
            .sum()
    }

    /// Light parts, optionally only those switched on.
    pub fn lights(&self, active: bool) -> Vec<usize> {
        self.index
            .lights
            .iter()
            .copied()
            .filter(|&l| {
                let part = &self.parts[l];
                !part.is_broken() && (!active || part.enabled)
            })
            .collect()
    }

    pub fn alternator_power(&self) -> i32 {
        self.producer_power(&self.index.alternators)
    }

    pub fn solar_power(&self) -> i32 {
        self.producer_power(&self.index.solar_panels)
    }

    fn producer_power(&self, list: &[usize]) -> i32 {
        list.iter()
            .map(|&p| &self.parts[p])
            .filter(|p| p.enabled)
            .map(|p| p.epower().max(0))
            .sum()
    }

    /// Catch up on time-dependent effects since the last update. `sunlight`
    /// is the fraction of full sun in `[0, 1]`.
    pub fn update_time(&mut self, update_to: u64, sunlight: f32) {
        if update_to <= self.last_update_turn {
            return;
        }
        let elapsed = update_to - self.last_update_turn;
        self.last_update_turn = update_to;
        let watts = self.solar_power();
        if watts <= 0 {
            return;
        }
        let per_tick = watts as f32 * self.content.constants.seconds_per_tick / 1000.0;
        let energy = (per_tick * sunlight.clamp(0.0, 1.0) * elapsed as f32).round() as i64;
        if energy > 0 {
            self.charge_battery(energy);
        }
    }

    /// Intact power cables: (local part, remote vehicle, loss percent).
    pub fn power_links(&self) -> Vec<(usize, VehicleId, i32)> {
        self.index
            .power_transfer
            .iter()
            .filter_map(|&p| {
                let part = &self.parts[p];
                if part.is_broken() {
                    return None;
                }
                let remote = part.target_vehicle.clone()?;
                Some((p, remote, part.info().transfer_loss_pct.clamp(0, 100)))
            })
            .collect()
    }
}
