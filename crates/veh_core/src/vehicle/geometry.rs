//! Orientation, pivot and the mount-to-map coordinate transform.
//!
//! Mount coordinates are fixed at install time. Every part also carries two
//! precalculated offsets from the pivot: slot 0 for the current orientation
//! and slot 1 for a pending turn, so a move can be validated before it is
//! committed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Vehicle;
use crate::{PartFlag, Point, Tripoint, SUBMAP_SIZE};

/// Heading in whole degrees, normalized to `0..360`. 0 faces +x.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    dir: i32,
}

impl Direction {
    pub fn new(degrees: i32) -> Self {
        Self {
            dir: degrees.rem_euclid(360),
        }
    }

    pub fn dir(self) -> i32 {
        self.dir
    }

    pub fn unit(self) -> (f32, f32) {
        let (sin, cos) = (self.dir as f32).to_radians().sin_cos();
        (cos, sin)
    }
}

/// Rotate `p` around `pivot` by `degrees`, returning the offset from the
/// pivot rounded to whole tiles.
pub fn coord_translate(degrees: i32, pivot: Point, p: Point) -> Point {
    let v = p - pivot;
    let (sin, cos) = (degrees as f32).to_radians().sin_cos();
    let (x, y) = (v.x as f32, v.y as f32);
    Point::new(
        (x * cos - y * sin).round() as i32,
        (x * sin + y * cos).round() as i32,
    )
}

impl Vehicle {
    pub fn face(&self) -> Direction {
        self.face
    }

    pub fn move_dir(&self) -> Direction {
        self.move_dir
    }

    pub fn turn_dir(&self) -> i32 {
        self.turn_dir
    }

    pub fn face_vec(&self) -> (f32, f32) {
        self.face.unit()
    }

    pub fn move_vec(&self) -> (f32, f32) {
        self.move_dir.unit()
    }

    pub fn dir_vec(&self) -> (f32, f32) {
        Direction::new(self.turn_dir).unit()
    }

    pub(crate) fn precalc_mounts(&mut self, slot: usize, degrees: i32, pivot: Point) {
        for part in &mut self.parts {
            if !part.removed {
                part.precalc[slot] = coord_translate(degrees, pivot, part.mount);
            }
        }
        self.pivot_anchor[slot] = pivot;
        self.pivot_rotation[slot] = degrees;
        if slot == 0 {
            self.occupied_dirty = true;
            self.mass_center_precalc.invalidate();
        }
    }

    /// Re-anchor the current orientation on the current pivot.
    pub fn anchor_at_pivot(&mut self) {
        let pivot = self.pivot_point();
        self.precalc_mounts(0, self.face.dir(), pivot);
    }

    /// Mount point the vehicle rotates around.
    pub fn pivot_point(&self) -> Point {
        self.pivot.get_or(|| self.compute_pivot())
    }

    fn compute_pivot(&self) -> Point {
        let wheels: Vec<usize> = self
            .index
            .wheelcache
            .iter()
            .copied()
            .filter(|&p| !self.parts[p].removed)
            .collect();
        if wheels.is_empty() {
            return self.structure_center();
        }
        let c = &self.content.constants;
        let (mut xc, mut yc, mut xw, mut yw) = (0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32);
        for p in wheels {
            let part = &self.parts[p];
            let area = part.wheel_area();
            let (inline, perpendicular) = if part.is_broken() {
                (c.pivot_weight_broken, c.pivot_weight_broken)
            } else if part.has_flag(PartFlag::Steerable) {
                (
                    c.pivot_weight_steerable_inline,
                    c.pivot_weight_steerable_perpendicular,
                )
            } else {
                (
                    c.pivot_weight_fixed_inline,
                    c.pivot_weight_fixed_perpendicular,
                )
            };
            let (wx, wy) = (area * perpendicular, area * inline);
            xc += part.mount.x as f32 * wx;
            yc += part.mount.y as f32 * wy;
            xw += wx;
            yw += wy;
        }
        let (x, y) = (xc / xw, yc / yw);
        if !(x.is_finite() && y.is_finite()) || xw <= 0.0 || yw <= 0.0 {
            tracing::debug!(vehicle = %self.id, "degenerate pivot weights, using structure centre");
            return self.structure_center();
        }
        Point::new(x.round() as i32, y.round() as i32)
    }

    /// Geometric centre of the structural mounts.
    fn structure_center(&self) -> Point {
        let mounts: Vec<Point> = self
            .parts
            .iter()
            .filter(|p| !p.removed && p.is_structure())
            .map(|p| p.mount)
            .collect();
        if mounts.is_empty() {
            return Point::default();
        }
        let n = mounts.len() as f32;
        let (sx, sy) = mounts
            .iter()
            .fold((0.0_f32, 0.0_f32), |(x, y), m| (x + m.x as f32, y + m.y as f32));
        Point::new((sx / n).round() as i32, (sy / n).round() as i32)
    }

    /// Offset the old pivot appears to move by when the pivot changes. The
    /// world subtracts this when displacing the vehicle.
    pub fn pivot_displacement(&self) -> Point {
        coord_translate(
            self.pivot_rotation[0],
            self.pivot_anchor[1],
            self.pivot_anchor[0],
        )
    }

    /// Request a change of heading. Reversing mirrors the turn; a hard turn
    /// at speed starts a skid.
    pub fn turn(&mut self, degrees: i32) {
        if degrees == 0 {
            return;
        }
        let degrees = if self.velocity < 0.0 { -degrees } else { degrees };
        if self.velocity.abs() > self.content.constants.skid_turn_velocity && degrees.abs() > 15 {
            self.skidding = true;
        }
        self.last_turn = degrees;
        self.turn_dir = (self.turn_dir + degrees).rem_euclid(360);
    }

    /// Precalculate slot 1 for the pending heading around the current pivot.
    pub fn prepare_turn(&mut self) {
        let pivot = self.pivot_point();
        self.precalc_mounts(1, self.turn_dir, pivot);
    }

    /// Commit the pending heading: slot 1 becomes slot 0.
    pub fn complete_move(&mut self) {
        for part in &mut self.parts {
            part.precalc[0] = part.precalc[1];
        }
        self.pivot_anchor[0] = self.pivot_anchor[1];
        self.pivot_rotation[0] = self.pivot_rotation[1];
        self.face = Direction::new(self.turn_dir);
        if !self.skidding {
            self.move_dir = self.face;
        }
        self.occupied_dirty = true;
        self.mass_center_precalc.invalidate();
    }

    // -- world anchor ----------------------------------------------------------

    pub fn global_pos3(&self) -> Tripoint {
        Tripoint::new(
            self.submap.x * SUBMAP_SIZE + self.pos.x,
            self.submap.y * SUBMAP_SIZE + self.pos.y,
            self.submap.z,
        )
    }

    pub fn global_part_pos3(&self, p: usize) -> Tripoint {
        let offset = self.parts.get(p).map_or(Point::default(), |part| part.precalc[0]);
        self.global_pos3().offset(offset)
    }

    pub fn submap(&self) -> Tripoint {
        self.submap
    }

    pub fn pos_in_submap(&self) -> Point {
        self.pos
    }

    pub fn set_submap_moved(&mut self, x: i32, y: i32) {
        self.submap.x = x;
        self.submap.y = y;
        self.occupied_dirty = true;
    }

    pub fn set_pos_in_submap(&mut self, pos: Point) {
        self.pos = pos;
        self.occupied_dirty = true;
    }

    pub fn set_z(&mut self, z: i32) {
        self.submap.z = z;
        self.occupied_dirty = true;
    }

    /// Move the vehicle by `dp` map squares, carrying across submaps.
    pub fn translate(&mut self, dp: Point) {
        let target = self.global_pos3().offset(dp);
        self.submap = Tripoint::new(
            target.x.div_euclid(SUBMAP_SIZE),
            target.y.div_euclid(SUBMAP_SIZE),
            target.z,
        );
        self.pos = Point::new(
            target.x.rem_euclid(SUBMAP_SIZE),
            target.y.rem_euclid(SUBMAP_SIZE),
        );
        self.occupied_dirty = true;
    }

    /// Every map square covered by a part, cached until the vehicle moves.
    pub fn get_points(&mut self, force_refresh: bool) -> &BTreeSet<Tripoint> {
        if force_refresh || self.occupied_dirty {
            let origin = self.global_pos3();
            self.occupied_points = self
                .parts
                .iter()
                .filter(|p| !p.removed)
                .map(|p| origin.offset(p.precalc[0]))
                .collect();
            self.occupied_dirty = false;
        }
        &self.occupied_points
    }

    // -- re-origin -------------------------------------------------------------

    /// Re-origin mount coordinates by `delta` without moving on the map.
    pub fn shift_parts(&mut self, delta: Point) {
        for part in &mut self.parts {
            part.mount = part.mount - delta;
        }
        self.labels = std::mem::take(&mut self.labels)
            .into_iter()
            .map(|(at, text)| (at - delta, text))
            .collect();
        self.pivot_anchor[0] = self.pivot_anchor[0] - delta;
        self.refresh();
    }

    /// Shift so a structural part sits at mount (0, 0) when the old origin
    /// has been removed. Prefers non-protruding frames.
    pub fn shift_if_needed(&mut self) -> bool {
        if !self.parts_at_relative(Point::default()).is_empty() {
            return false;
        }
        let frame = self
            .parts
            .iter()
            .find(|p| !p.removed && p.is_structure() && !p.has_flag(PartFlag::Protrusion))
            .or_else(|| self.parts.iter().find(|p| !p.removed))
            .map(|p| p.mount);
        match frame {
            Some(mount) => {
                self.shift_parts(mount);
                true
            }
            None => false,
        }
    }
}
