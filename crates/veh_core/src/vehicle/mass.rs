//! Total mass and centre of mass, computed lazily.

use super::Vehicle;
use crate::part::VehiclePart;
use crate::Point;

impl Vehicle {
    /// Part weight plus its contents, cargo and passenger.
    pub(crate) fn part_mass(&self, part: &VehiclePart) -> f32 {
        let content = &*self.content;
        let cargo: f32 = part.items.iter().map(|i| i.weight(content)).sum();
        let passenger = part.passenger.as_ref().map_or(0.0, |o| o.weight_kg);
        part.info().weight_kg + part.base.contained_weight(content) + cargo + passenger
    }

    /// Mass from scratch, bypassing the cache.
    pub fn recompute_mass(&self) -> f32 {
        self.parts
            .iter()
            .filter(|p| !p.removed)
            .map(|p| self.part_mass(p))
            .sum()
    }

    /// Total mass in kg.
    pub fn total_mass(&self) -> f32 {
        self.mass.get_or(|| self.recompute_mass())
    }

    fn calc_mass_center(&self, use_precalc: bool) -> Point {
        let (mut xf, mut yf, mut total) = (0.0_f32, 0.0_f32, 0.0_f32);
        for part in self.parts.iter().filter(|p| !p.removed) {
            let m = self.part_mass(part);
            let at = if use_precalc { part.precalc[0] } else { part.mount };
            xf += at.x as f32 * m;
            yf += at.y as f32 * m;
            total += m;
        }
        if total <= 0.0 {
            return Point::default();
        }
        Point::new((xf / total).round() as i32, (yf / total).round() as i32)
    }

    /// Mass-weighted centre in mount coordinates.
    pub fn local_center_of_mass(&self) -> Point {
        self.mass_center_mount.get_or(|| self.calc_mass_center(false))
    }

    /// Mass-weighted centre in the current orientation, relative to the pivot.
    pub fn rotated_center_of_mass(&self) -> Point {
        self.mass_center_precalc.get_or(|| self.calc_mass_center(true))
    }
}
