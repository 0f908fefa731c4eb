//! Collisions for a pending move.
//!
//! Each frame's next-turn position (precalc slot 1 plus the displacement) is
//! checked against the terrain. Impacts are one-dimensional and partially
//! inelastic: the restitution falls with relative speed, the lost kinetic
//! energy becomes damage split between the two parties by mass.

use rand::Rng;

use super::physics::collision_factor;
use super::Vehicle;
use crate::grid::{Obstacle, Terrain};
use crate::{
    ActorId, CollisionKind, DamageType, Event, Point, Tripoint, VehicleId, LOCATION_STRUCTURE,
};

/// Stand-in mass for terrain that does not move.
const IMMOVABLE_MASS_KG: f32 = 1.0e6;

#[derive(Debug, Clone, PartialEq)]
pub enum CollisionTarget {
    Actor(ActorId),
    Vehicle { id: VehicleId, part: usize },
    Terrain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehCollision {
    pub part: usize,
    pub kind: CollisionKind,
    pub target: Option<CollisionTarget>,
    pub target_name: String,
    pub pos: Tripoint,
    pub impulse: f32,
    /// Damage owed to the other party; applying it is up to the world.
    pub target_damage: i32,
}

impl VehCollision {
    fn nothing(part: usize, pos: Tripoint) -> Self {
        Self {
            part,
            kind: CollisionKind::Nothing,
            target: None,
            target_name: String::new(),
            pos,
            impulse: 0.0,
            target_damage: 0,
        }
    }
}

struct Contact {
    kind: CollisionKind,
    target: CollisionTarget,
    name: String,
    mass: f32,
    velocity: f32,
    /// Breaking strength of bashable terrain.
    strength: Option<i32>,
}

impl Vehicle {
    /// Check every frame for a collision if the vehicle moved by `dp` with
    /// the pending turn. In `just_detect` mode nothing is changed and the
    /// scan stops at the first hit. Call `prepare_turn` first.
    pub fn collision(
        &mut self,
        colls: &mut Vec<VehCollision>,
        dp: Point,
        just_detect: bool,
        terrain: &impl Terrain,
        rng: &mut impl Rng,
    ) -> bool {
        let start = colls.len();
        let origin = self.global_pos3();
        for p in self.all_parts_at_location(LOCATION_STRUCTURE) {
            if self.parts[p].removed {
                continue;
            }
            let pos = origin.offset(dp + self.parts[p].precalc[1]);
            let coll = self.part_collision(p, pos, just_detect, terrain, rng);
            if coll.kind != CollisionKind::Nothing {
                colls.push(coll);
                if just_detect {
                    break;
                }
            }
        }
        colls.len() > start
    }

    fn contact(&self, obstacle: Obstacle) -> Option<Contact> {
        let c = &self.content.constants;
        let contact = match obstacle {
            Obstacle::Creature { id, name, mass_kg } => Contact {
                kind: CollisionKind::Body,
                target: CollisionTarget::Actor(id),
                name,
                mass: mass_kg,
                velocity: 0.0,
                strength: None,
            },
            Obstacle::Vehicle {
                id,
                name,
                part,
                mass_kg,
                velocity,
            } => {
                if id == self.id {
                    return None;
                }
                Contact {
                    kind: CollisionKind::Vehicle,
                    target: CollisionTarget::Vehicle { id, part },
                    name,
                    mass: mass_kg,
                    velocity,
                    strength: None,
                }
            }
            Obstacle::Bashable { name, strength } => Contact {
                kind: CollisionKind::Bashable,
                target: CollisionTarget::Terrain,
                name,
                mass: c.bash_mass_kg * strength.max(1) as f32 / 10.0,
                velocity: 0.0,
                strength: Some(strength),
            },
            Obstacle::Impassable { name } => Contact {
                kind: CollisionKind::Other,
                target: CollisionTarget::Terrain,
                name,
                mass: IMMOVABLE_MASS_KG,
                velocity: 0.0,
                strength: None,
            },
        };
        Some(contact)
    }

    /// Resolve a collision of frame `p` with whatever is at `pos`.
    pub fn part_collision(
        &mut self,
        p: usize,
        pos: Tripoint,
        just_detect: bool,
        terrain: &impl Terrain,
        rng: &mut impl Rng,
    ) -> VehCollision {
        let Some(contact) = terrain.obstacle_at(pos).and_then(|o| self.contact(o)) else {
            return VehCollision::nothing(p, pos);
        };
        let mut coll = VehCollision {
            part: p,
            kind: contact.kind,
            target: Some(contact.target),
            target_name: contact.name,
            pos,
            impulse: 0.0,
            target_damage: 0,
        };
        let m1 = self.total_mass();
        if just_detect || m1 <= 0.0 {
            return coll;
        }

        let (m2, v1, v2) = (contact.mass.max(0.0), self.velocity, contact.velocity);
        let e = collision_factor(v1 - v2);
        let total = m1 + m2;
        let v1_after = (m1 * v1 + m2 * v2 - m2 * e * (v1 - v2)) / total;
        let v2_after = (m1 * v1 + m2 * v2 + m1 * e * (v1 - v2)) / total;
        let energy_lost = 0.5 * m1 * (v1 * v1 - v1_after * v1_after)
            + 0.5 * m2 * (v2 * v2 - v2_after * v2_after);
        let scale = self.content.constants.collision_damage_scale.max(f32::EPSILON);
        let dmg = (energy_lost.max(0.0) / scale).round() as i32;
        let part_dmg = (dmg as f32 * m2 / total).round() as i32;
        coll.target_damage = dmg - part_dmg;
        coll.impulse = (m1 * (v1 - v1_after)).abs();

        let smashed = contact
            .strength
            .is_some_and(|strength| coll.target_damage >= strength);
        let stops = contact.kind == CollisionKind::Other
            || (contact.kind == CollisionKind::Bashable && !smashed);
        self.velocity = if stops { 0.0 } else { v1_after };
        if part_dmg > 0 {
            self.damage(p, part_dmg, DamageType::Bash, true, rng);
        }
        self.emit(Event::Collision {
            part: p,
            kind: coll.kind,
            impulse: coll.impulse,
            target: Some(coll.target_name.clone()),
        });
        coll
    }
}
