//! Turret status, ammo selection and firing.
//!
//! A turret either carries its own magazine or, with `uses_tanks`, feeds from
//! any compatible tank on the vehicle. Energy weapons draw battery charge per
//! shot. Automatic turrets fire on their own at an aimed point or at the
//! nearest hostile the world reports.

use std::collections::BTreeSet;

use super::Vehicle;
use crate::{
    Event, ItemTypeId, Tripoint, TurretDef, TurretFireMode, TurretTargeting, FUEL_BATTERY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurretStatus {
    /// Removed, broken or not a turret.
    Invalid,
    NoAmmo,
    NoPower,
    Ready,
}

/// Handle for one turret part. Borrows the vehicle so ammo and power can be
/// drawn from anywhere on it.
pub struct TurretData<'a> {
    veh: &'a mut Vehicle,
    part: usize,
}

impl Vehicle {
    /// Intact turret parts.
    pub fn turrets(&self) -> Vec<usize> {
        self.index
            .turrets
            .iter()
            .copied()
            .filter(|&t| !self.parts[t].is_broken())
            .collect()
    }

    /// Ready turrets with `target` in range.
    pub fn turrets_at(&self, target: Tripoint) -> Vec<usize> {
        self.turrets()
            .into_iter()
            .filter(|&t| {
                let range = self.parts[t].info().turret.as_ref().map_or(0, |d| d.range);
                self.turret_status(t) == TurretStatus::Ready
                    && self.global_part_pos3(t).square_dist(target) <= range
            })
            .collect()
    }

    /// Switch the listed turrets to `mode`, dropping any stale aim. Returns
    /// how many changed.
    pub fn turrets_set_targeting(&mut self, turrets: &[usize], mode: TurretTargeting) -> usize {
        let mut changed = 0;
        for &t in turrets {
            if self.turret_def(t).is_none() || self.parts[t].targeting == mode {
                continue;
            }
            let part = &mut self.parts[t];
            part.targeting = mode;
            part.target = None;
            changed += 1;
        }
        changed
    }

    /// Set single-shot or burst fire on the listed turrets. Returns how many
    /// changed.
    pub fn turrets_set_mode(&mut self, turrets: &[usize], mode: TurretFireMode) -> usize {
        let mut changed = 0;
        for &t in turrets {
            if self.turret_def(t).is_none() || self.parts[t].fire_mode == mode {
                continue;
            }
            self.parts[t].fire_mode = mode;
            changed += 1;
        }
        changed
    }

    /// Aim every ready automatic turret that can reach `target` at it. The
    /// aim is used by the next automatic shot. False when none could.
    pub fn turrets_aim(&mut self, target: Tripoint) -> bool {
        let aimed: Vec<usize> = self
            .turrets_at(target)
            .into_iter()
            .filter(|&t| self.parts[t].targeting == TurretTargeting::Automatic)
            .collect();
        for &t in &aimed {
            self.parts[t].target = Some((target, target));
        }
        !aimed.is_empty()
    }

    /// Let automatic turret `t` pick a target and fire one round: the aimed
    /// point if still in range, else the nearest of `hostiles`. Manual
    /// turrets never fire here. Returns the shots fired.
    pub fn automatic_fire_turret(&mut self, t: usize, hostiles: &[Tripoint]) -> u32 {
        let Some(range) = self.turret_def(t).map(|d| d.range) else {
            return 0;
        };
        if self.parts[t].targeting != TurretTargeting::Automatic {
            return 0;
        }
        let pos = self.global_part_pos3(t);
        let aimed = self.parts[t]
            .target
            .map(|(first, _)| first)
            .filter(|&at| pos.square_dist(at) <= range);
        let target = aimed.or_else(|| {
            hostiles
                .iter()
                .copied()
                .filter(|&h| pos.square_dist(h) <= range)
                .min_by_key(|&h| pos.square_dist(h))
        });
        let Some(target) = target else {
            return 0;
        };
        let shots = self.turret_query(t).fire(target);
        self.parts[t].target = None;
        shots
    }

    /// One automatic-fire step for every intact turret.
    pub fn automatic_fire_turrets(&mut self, hostiles: &[Tripoint]) -> u32 {
        self.turrets()
            .into_iter()
            .map(|t| self.automatic_fire_turret(t, hostiles))
            .sum()
    }

    pub fn turret_query(&mut self, part: usize) -> TurretData<'_> {
        TurretData { veh: self, part }
    }

    fn turret_def(&self, part: usize) -> Option<&TurretDef> {
        let p = self.live_part(part)?;
        if p.is_broken() {
            return None;
        }
        p.info().turret.as_ref()
    }

    /// Ammo the turret would fire next.
    pub fn turret_ammo_current(&self, part: usize) -> Option<ItemTypeId> {
        let def = self.turret_def(part)?;
        if !def.uses_tanks {
            return self.parts[part].ammo_current().cloned();
        }
        let options = self.turret_ammo_options(part);
        match &self.parts[part].ammo_pref {
            Some(pref) if options.contains(pref) => Some(pref.clone()),
            _ => options.into_iter().next(),
        }
    }

    /// Ammo types the turret could fire right now.
    pub fn turret_ammo_options(&self, part: usize) -> BTreeSet<ItemTypeId> {
        let Some(def) = self.turret_def(part) else {
            return BTreeSet::new();
        };
        if def.uses_tanks {
            def.ammo_types
                .iter()
                .filter(|ammo| self.fuel_left(ammo, false) > 0)
                .cloned()
                .collect()
        } else {
            let own = &self.parts[part];
            own.ammo_current()
                .filter(|_| own.ammo_remaining() > 0)
                .cloned()
                .into_iter()
                .collect()
        }
    }

    pub fn turret_ammo_remaining(&self, part: usize) -> i64 {
        let Some(def) = self.turret_def(part) else {
            return 0;
        };
        if def.uses_tanks {
            self.turret_ammo_current(part)
                .map_or(0, |ammo| self.fuel_left(&ammo, false))
        } else {
            self.parts[part].ammo_remaining()
        }
    }

    pub fn turret_status(&self, part: usize) -> TurretStatus {
        let Some(def) = self.turret_def(part) else {
            return TurretStatus::Invalid;
        };
        if def.ammo_per_shot > 0 && self.turret_ammo_remaining(part) < def.ammo_per_shot {
            return TurretStatus::NoAmmo;
        }
        let battery = ItemTypeId::new(FUEL_BATTERY);
        if def.energy_per_shot > 0 && self.fuel_left(&battery, true) < def.energy_per_shot {
            return TurretStatus::NoPower;
        }
        TurretStatus::Ready
    }
}

impl TurretData<'_> {
    pub fn part(&self) -> usize {
        self.part
    }

    pub fn name(&self) -> String {
        self.veh.parts.get(self.part).map_or_else(String::new, |p| p.name())
    }

    pub fn query(&self) -> TurretStatus {
        self.veh.turret_status(self.part)
    }

    pub fn range(&self) -> i32 {
        self.veh.turret_def(self.part).map_or(0, |d| d.range)
    }

    pub fn ammo_current(&self) -> Option<ItemTypeId> {
        self.veh.turret_ammo_current(self.part)
    }

    pub fn ammo_options(&self) -> BTreeSet<ItemTypeId> {
        self.veh.turret_ammo_options(self.part)
    }

    /// Prefer `ammo` for tank-fed turrets. False when it is not available.
    pub fn ammo_select(&mut self, ammo: &ItemTypeId) -> bool {
        if !self.ammo_options().contains(ammo) {
            return false;
        }
        self.veh.parts[self.part].ammo_pref = Some(ammo.clone());
        true
    }

    pub fn ammo_remaining(&self) -> i64 {
        self.veh.turret_ammo_remaining(self.part)
    }

    /// Own magazine size; 0 for tank-fed turrets.
    pub fn ammo_capacity(&self) -> i64 {
        match self.veh.turret_def(self.part) {
            Some(def) if !def.uses_tanks => self.veh.parts[self.part].ammo_capacity(),
            _ => 0,
        }
    }

    pub fn can_reload(&self) -> bool {
        match self.veh.turret_def(self.part) {
            Some(def) if !def.uses_tanks => {
                self.veh.parts[self.part].can_reload(None, &self.veh.content)
            }
            _ => false,
        }
    }

    pub fn can_unload(&self) -> bool {
        self.ammo_capacity() > 0 && self.ammo_remaining() > 0
    }

    /// Fire one burst at `target`. Each shot consumes ammo and energy; the
    /// burst stops early when either runs out. Returns the shots fired.
    pub fn fire(&mut self, target: Tripoint) -> u32 {
        if self.query() != TurretStatus::Ready {
            return 0;
        }
        let Some(def) = self.veh.turret_def(self.part).cloned() else {
            return 0;
        };
        let pos = self.veh.global_part_pos3(self.part);
        if pos.square_dist(target) > def.range {
            return 0;
        }
        let ammo = self.ammo_current();
        let rounds = match self.veh.parts[self.part].fire_mode {
            TurretFireMode::Single => 1,
            TurretFireMode::Burst => def.burst.max(1),
        };
        let mut shots = 0;
        for _ in 0..rounds {
            if self.query() != TurretStatus::Ready || !self.take_shot(&def, ammo.as_ref()) {
                break;
            }
            shots += 1;
        }
        let veh = &mut *self.veh;
        veh.parts[self.part].target = Some((target, target));
        veh.invalidate_mass();
        veh.emit(Event::TurretFired {
            part: self.part,
            target,
            shots,
            ammo,
        });
        shots
    }

    fn take_shot(&mut self, def: &TurretDef, ammo: Option<&ItemTypeId>) -> bool {
        let veh = &mut *self.veh;
        if def.ammo_per_shot > 0 {
            let taken = match (def.uses_tanks, ammo) {
                (true, Some(ammo)) => veh.drain(ammo, def.ammo_per_shot),
                (true, None) => 0,
                (false, _) => veh.parts[self.part].ammo_consume(def.ammo_per_shot),
            };
            if taken < def.ammo_per_shot {
                return false;
            }
        }
        if def.energy_per_shot > 0 && veh.discharge_battery(def.energy_per_shot, true) > 0 {
            return false;
        }
        true
    }
}
