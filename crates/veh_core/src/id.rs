use rand::Rng;
use uuid::Uuid;

use crate::VehicleId;

/// Generate a deterministic v4-format UUID from a seeded RNG.
pub fn generate_uuid(rng: &mut impl Rng) -> Uuid {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// Fresh vehicle id drawn from the simulation RNG, so replays reproduce ids.
pub fn new_vehicle_id(rng: &mut impl Rng) -> VehicleId {
    VehicleId(format!("veh_{}", generate_uuid(rng)))
}
