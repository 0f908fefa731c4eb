//! Actors are owned elsewhere. Vehicles only hold ids and re-resolve them
//! through an `ActorRegistry` on every query.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{ActorId, Tripoint};

pub trait ActorRegistry {
    fn is_alive(&self, id: &ActorId) -> bool;
    /// Friendly to the player; only allies can crew a vehicle.
    fn is_ally(&self, id: &ActorId) -> bool;
    fn position(&self, id: &ActorId) -> Option<Tripoint>;
    fn weight_kg(&self, id: &ActorId) -> f32;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorInfo {
    pub name: String,
    pub pos: Tripoint,
    pub ally: bool,
    pub alive: bool,
    pub weight_kg: f32,
}

/// Simple in-memory registry, used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct ActorRoster {
    actors: AHashMap<ActorId, ActorInfo>,
}

impl ActorRoster {
    pub fn insert(&mut self, id: ActorId, info: ActorInfo) {
        self.actors.insert(id, info);
    }

    pub fn get(&self, id: &ActorId) -> Option<&ActorInfo> {
        self.actors.get(id)
    }

    pub fn get_mut(&mut self, id: &ActorId) -> Option<&mut ActorInfo> {
        self.actors.get_mut(id)
    }

    pub fn kill(&mut self, id: &ActorId) {
        if let Some(actor) = self.actors.get_mut(id) {
            actor.alive = false;
        }
    }
}

impl ActorRegistry for ActorRoster {
    fn is_alive(&self, id: &ActorId) -> bool {
        self.actors.get(id).is_some_and(|a| a.alive)
    }

    fn is_ally(&self, id: &ActorId) -> bool {
        self.actors.get(id).is_some_and(|a| a.ally)
    }

    fn position(&self, id: &ActorId) -> Option<Tripoint> {
        self.actors.get(id).map(|a| a.pos)
    }

    fn weight_kg(&self, id: &ActorId) -> f32 {
        self.actors.get(id).map_or(0.0, |a| a.weight_kg)
    }
}
