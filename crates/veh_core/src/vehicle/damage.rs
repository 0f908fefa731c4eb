//! Part damage, destruction, tearing off and fuel explosions.
//!
//! Destroying a part releases its fuel and cargo and drops every cache that
//! depends on it. A frame never outlives its support: destroying one breaks
//! everything on its mount, and hitting a broken frame again tears the whole
//! mount off.

use rand::seq::SliceRandom;
use rand::Rng;

use super::Vehicle;
use crate::{DamageType, EngineStopReason, Event, PartFlag, Point, Tripoint};

impl Vehicle {
    /// Set hp directly, without destruction side effects.
    pub fn set_hp(&mut self, p: usize, qty: i32) {
        let Some(part) = self.parts.get_mut(p).filter(|part| !part.removed) else {
            return;
        };
        part.set_health(qty);
        self.after_health_change(p);
    }

    /// Adjust hp by `qty`. Returns true when this change broke the part.
    pub fn mod_hp(&mut self, p: usize, qty: i32) -> bool {
        let Some(part) = self.parts.get_mut(p).filter(|part| !part.removed) else {
            return false;
        };
        let was_broken = part.is_broken();
        let hp = part.hp().saturating_add(qty);
        part.set_health(hp);
        let now_broken = part.is_broken();
        self.after_health_change(p);
        !was_broken && now_broken
    }

    fn after_health_change(&mut self, p: usize) {
        self.invalidate_mass();
        self.insides_dirty = true;
        if self.parts[p].is_broken() && self.parts[p].engine_state.is_burning() {
            self.stall_engine(p, EngineStopReason::Broken);
        }
    }

    /// Hit the tile of part `p`. Unaimed hits pass through tiles without an
    /// obstacle. Armor on the tile absorbs its reduction before the part
    /// behind it is hit. Returns the damage that went through.
    pub fn damage(
        &mut self,
        p: usize,
        dmg: i32,
        dt: DamageType,
        aimed: bool,
        rng: &mut impl Rng,
    ) -> i32 {
        if dmg < 1 {
            return dmg;
        }
        let Some(mount) = self.live_part(p).map(|part| part.mount) else {
            return dmg;
        };
        let here = self.parts_at_relative(mount).to_vec();
        if !aimed && self.obstacle_at_part(p).is_none() {
            return dmg;
        }
        let Some(&target) = here.choose(rng) else {
            return dmg;
        };
        let Some(armor) = self.part_with_feature(p, PartFlag::Armor, false) else {
            return self.damage_direct(target, dmg, dt, rng);
        };
        if armor == target {
            return self.damage_direct(armor, dmg, dt, rng);
        }
        let overhead = self.parts[target].info().location == "on_roof";
        if overhead {
            return self.damage_direct(target, dmg, dt, rng);
        }
        let protection = self.parts[armor].info().damage_reduction(dt);
        let dealt = self.damage_direct(armor, dmg, dt, rng);
        self.damage_direct(target, (dmg - protection).max(0), dt, rng);
        dealt
    }

    /// Damage part `p` itself. Hits below the part's threshold are shrugged
    /// off unless the type is `True`; `Null` adjusts hp with no side effects.
    /// Returns the damage exceeding the part's remaining hp.
    pub fn damage_direct(
        &mut self,
        p: usize,
        dmg: i32,
        dt: DamageType,
        rng: &mut impl Rng,
    ) -> i32 {
        let Some(part) = self.live_part(p) else {
            return dmg;
        };
        if dmg <= 0 {
            return 0;
        }
        if dt == DamageType::Null {
            let bypass = (dmg - part.hp()).max(0);
            self.mod_hp(p, -dmg);
            return bypass;
        }
        if part.is_broken() {
            return self.break_off(p, dmg, rng);
        }
        let c = &self.content.constants;
        let info = part.info();
        let threshold = (info.durability / c.damage_threshold_divisor.max(1))
            .min(c.damage_threshold_cap);
        if dt != DamageType::True && dmg < threshold {
            if dt == DamageType::Heat && part.is_tank() {
                self.explode_fuel(p, dt, rng);
            }
            return dmg;
        }
        let dmg = if dt == DamageType::True {
            dmg
        } else {
            dmg - info.damage_reduction(dt).clamp(0, dmg.max(0))
        };
        let bypass = (dmg - part.hp()).max(0);
        let destroyed = self.mod_hp(p, -dmg);
        if self.parts[p].is_tank() {
            self.explode_fuel(p, dt, rng);
        }
        if destroyed && !self.parts[p].removed {
            self.on_part_destroyed(p);
        }
        bypass
    }

    /// Release fuel and cargo of a part that just broke and cascade to the
    /// parts a broken frame no longer supports.
    fn on_part_destroyed(&mut self, p: usize) {
        self.leak_fuel(p);
        let pos = self.global_part_pos3(p);
        let items = std::mem::take(&mut self.parts[p].items);
        if !items.is_empty() {
            self.emit(Event::CargoSpilled { part: p, items, pos });
        }
        self.parts[p].ammo_unset();
        self.invalidate_mass();
        self.insides_dirty = true;
        let (part_type, mount) = (self.parts[p].id().clone(), self.parts[p].mount);
        self.emit(Event::PartDestroyed {
            part: p,
            part_type,
            mount,
        });
        if !self.parts[p].is_structure() {
            return;
        }
        for q in self.parts_at_relative(mount).to_vec() {
            if q != p && !self.parts[q].is_broken() {
                self.parts[q].set_health(0);
                self.after_health_change(q);
                self.on_part_destroyed(q);
            }
        }
    }

    /// Dump a tank's whole contents onto the ground.
    fn leak_fuel(&mut self, p: usize) {
        let part = &self.parts[p];
        if !part.is_tank() || part.ammo_remaining() <= 0 {
            return;
        }
        let Some(fuel) = part.ammo_current().cloned() else {
            return;
        };
        let amount = self.parts[p].ammo_consume(i64::MAX);
        let pos = self.global_part_pos3(p);
        self.emit(Event::FuelLeaked {
            part: p,
            fuel,
            amount,
            pos,
        });
    }

    /// Badly damaged tanks lose a little liquid every tick.
    pub fn slow_leak(&mut self) {
        let fraction = self.content.constants.tank_leak_fraction;
        for p in 0..self.parts.len() {
            let part = &self.parts[p];
            if part.removed || !part.is_tank() || part.is_broken() || part.ammo_remaining() <= 0 {
                continue;
            }
            let health = part.health_fraction();
            let Some(fuel) = part.ammo_current().cloned() else {
                continue;
            };
            let liquid = self.content.item(&fuel).is_some_and(|d| d.liquid);
            if health > 0.5 || !liquid {
                continue;
            }
            let exposure = (0.5 - health) * (0.5 - health) * 4.0;
            let qty = ((part.ammo_remaining() as f32 * fraction * exposure).round() as i64).max(1);
            let amount = self.parts[p].ammo_consume(qty);
            let pos = self.global_part_pos3(p);
            self.invalidate_mass();
            self.emit(Event::FuelLeaked {
                part: p,
                fuel,
                amount,
                pos,
            });
        }
    }

    /// Set off an explosive tank. Heat ignites it readily; other damage only
    /// occasionally ignites a broken tank.
    pub fn explode_fuel(&mut self, p: usize, dt: DamageType, rng: &mut impl Rng) -> bool {
        let Some(part) = self.live_part(p) else {
            return false;
        };
        if !part.is_tank() || part.ammo_remaining() <= 0 {
            return false;
        }
        let Some(fuel) = part.ammo_current().cloned() else {
            return false;
        };
        if !self.content.item(&fuel).is_some_and(|d| d.explosive) {
            return false;
        }
        let chance = match (dt, part.is_broken()) {
            (DamageType::Heat, true) => 1.0,
            (DamageType::Heat, false) => 0.5,
            (_, true) => 0.1,
            (_, false) => 0.0,
        };
        if !rng.gen_bool(chance) {
            return false;
        }
        let mount = part.mount;
        let amount = self.parts[p].ammo_consume(i64::MAX);
        let pos = self.global_part_pos3(p);
        self.invalidate_mass();
        self.emit(Event::FuelExploded {
            part: p,
            fuel,
            amount,
            pos,
        });
        let blast = ((amount.min(10_000) as f32).sqrt() * 10.0).round() as i32;
        self.damage_all(blast / 2, blast, DamageType::Bash, mount, rng);
        true
    }

    /// A broken part hit again may be ripped away. Intact parts on a torn
    /// frame come off whole; broken ones scatter as debris.
    pub fn break_off(&mut self, p: usize, dmg: i32, rng: &mut impl Rng) -> i32 {
        let Some(part) = self.live_part(p) else {
            return dmg;
        };
        let durability = part.info().durability.max(1);
        let chance = (f64::from(dmg) / f64::from(durability)).clamp(0.0, 1.0);
        if !rng.gen_bool(chance) {
            return dmg;
        }
        if part.is_structure() {
            let mount = part.mount;
            for q in self.parts_at_relative(mount).to_vec() {
                if q == p {
                    continue;
                }
                if self.parts[q].is_broken() {
                    self.break_part_into_pieces(q, true, rng);
                } else {
                    let item = self.parts[q].properties_to_item();
                    let pos = self.global_part_pos3(q);
                    self.emit(Event::PartTornOff { item, pos });
                }
                self.spill_cargo(q);
                self.remove_part(q);
            }
            self.break_part_into_pieces(p, false, rng);
        } else {
            self.break_part_into_pieces(p, true, rng);
        }
        self.spill_cargo(p);
        self.remove_part(p);
        dmg
    }

    fn spill_cargo(&mut self, p: usize) {
        let items = std::mem::take(&mut self.parts[p].items);
        if items.is_empty() {
            return;
        }
        let pos = self.global_part_pos3(p);
        self.invalidate_mass();
        self.emit(Event::CargoSpilled { part: p, items, pos });
    }

    /// Emit debris for part `p`, optionally scattered around it.
    pub fn break_part_into_pieces(&mut self, p: usize, scatter: bool, rng: &mut impl Rng) {
        let Some(part) = self.live_part(p) else {
            return;
        };
        let part_type = part.id().clone();
        let c = &self.content.constants;
        let (spread, max_pieces) = (c.scatter_distance.max(0), c.debris_pieces_max.max(1));
        let origin = self.global_part_pos3(p);
        for _ in 0..rng.gen_range(1..=max_pieces) {
            let offset = if scatter {
                Point::new(
                    rng.gen_range(-spread..=spread),
                    rng.gen_range(-spread..=spread),
                )
            } else {
                Point::default()
            };
            let pos: Tripoint = origin.offset(offset);
            self.emit(Event::Debris {
                part_type: part_type.clone(),
                pos,
            });
        }
    }

    /// Blast damage falling off with distance from `impact`, applied to
    /// frames only. The impact tile itself is left to the caller.
    pub fn damage_all(
        &mut self,
        dmg1: i32,
        dmg2: i32,
        dt: DamageType,
        impact: Point,
        rng: &mut impl Rng,
    ) {
        let (lo, hi) = (dmg1.min(dmg2), dmg1.max(dmg2));
        if hi <= 0 {
            return;
        }
        for p in 0..self.parts.len() {
            let part = &self.parts[p];
            if part.removed || !part.is_structure() || part.has_flag(PartFlag::Protrusion) {
                continue;
            }
            let distance = 1 + part.mount.square_dist(impact);
            if distance > 1 {
                let dmg = rng.gen_range(lo.max(0)..=hi) / (distance * distance);
                self.damage_direct(p, dmg, dt, rng);
            }
        }
    }

    /// Knock every intact part down to a random fraction of its durability.
    pub fn smash(&mut self, rng: &mut impl Rng) {
        let min = self.content.constants.smash_min_fraction.clamp(0.0, 1.0);
        for p in 0..self.parts.len() {
            let part = &self.parts[p];
            if part.removed || part.is_broken() {
                continue;
            }
            let durability = part.info().durability;
            let frac: f32 = rng.gen_range(min..=1.0);
            let hp = ((durability as f32 * frac).round() as i32).max(1);
            self.set_hp(p, hp);
        }
    }
}
