use super::Vehicle;
use crate::crew::ActorRegistry;
use crate::part::Occupant;
use crate::ActorId;

impl Vehicle {
    /// Assign `who` as the crew member responsible for seat or turret `p`.
    /// An actor crews at most one part per vehicle.
    pub fn assign_seat(&mut self, p: usize, who: &ActorId, actors: &impl ActorRegistry) -> bool {
        let crews_elsewhere = self
            .parts
            .iter()
            .enumerate()
            .any(|(i, part)| i != p && !part.removed && part.crew_id.as_ref() == Some(who));
        if crews_elsewhere {
            return false;
        }
        match self.parts.get_mut(p) {
            Some(part) if !part.removed => part.set_crew(who, actors),
            _ => false,
        }
    }

    /// Living crew member for seat `p`, re-resolved through the registry.
    pub fn crew_at<'a>(&'a self, p: usize, actors: &impl ActorRegistry) -> Option<&'a ActorId> {
        self.live_part(p)?.crew(actors)
    }

    /// Seat `who` on part `p`. The actor's current weight joins the vehicle mass.
    pub fn board(&mut self, p: usize, who: &ActorId, actors: &impl ActorRegistry) -> bool {
        let already_aboard = self
            .boarded_parts()
            .iter()
            .any(|&b| self.get_passenger(b) == Some(who));
        if already_aboard || !actors.is_alive(who) {
            return false;
        }
        let Some(part) = self.parts.get_mut(p) else {
            return false;
        };
        if part.removed || !part.is_seat() || part.is_broken() || part.passenger.is_some() {
            return false;
        }
        part.passenger = Some(Occupant {
            id: who.clone(),
            weight_kg: actors.weight_kg(who),
        });
        self.invalidate_mass();
        true
    }

    pub fn unboard(&mut self, p: usize) -> Option<ActorId> {
        let occupant = self.parts.get_mut(p)?.passenger.take()?;
        self.invalidate_mass();
        Some(occupant.id)
    }

    pub fn unboard_all(&mut self) -> Vec<ActorId> {
        self.boarded_parts()
            .into_iter()
            .filter_map(|p| self.unboard(p))
            .collect()
    }

    pub fn boarded_parts(&self) -> Vec<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.removed && p.passenger.is_some())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn get_passenger(&self, p: usize) -> Option<&ActorId> {
        self.live_part(p)?.passenger.as_ref().map(|o| &o.id)
    }

    /// First intact, empty seat.
    pub fn free_seat(&self) -> Option<usize> {
        self.parts.iter().position(|p| {
            !p.removed && p.is_seat() && !p.is_broken() && p.passenger.is_none()
        })
    }
}
