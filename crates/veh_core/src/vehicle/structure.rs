//! Installing and removing parts, mount lookups, doors, insides and labels.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashSet;

use super::Vehicle;
use crate::part::VehiclePart;
use crate::{
    EngineState, Event, InstallError, Item, ItemTypeId, PartDef, PartFlag, PartTypeId, Point,
    Tripoint, FUEL_BATTERY, LOCATION_STRUCTURE,
};

const NEIGHBOURS: [Point; 4] = [
    Point::new(-1, 0),
    Point::new(1, 0),
    Point::new(0, -1),
    Point::new(0, 1),
];

impl Vehicle {
    /// Check whether part type `id` can go at `mount` without installing it.
    pub fn can_mount(&self, mount: Point, id: &PartTypeId) -> Result<(), InstallError> {
        let info = self
            .content
            .part(id)
            .ok_or_else(|| InstallError::UnknownPart(id.clone()))?;
        let here = self.parts_at_relative(mount);
        let has_structure = here.iter().any(|&p| self.parts[p].is_structure());

        if info.is_structure() {
            if has_structure {
                return Err(InstallError::SlotOccupied {
                    mount,
                    location: LOCATION_STRUCTURE.to_string(),
                });
            }
            let touches = NEIGHBOURS
                .iter()
                .any(|d| !self.parts_at_relative(mount + *d).is_empty());
            if self.part_count() > 0 && !touches {
                return Err(InstallError::NotAdjacent(mount));
            }
            return Ok(());
        }

        if !has_structure {
            return Err(InstallError::NoStructure(mount));
        }
        for &p in here {
            let other = &self.parts[p];
            if other.id() == id {
                return Err(InstallError::Duplicate {
                    mount,
                    part: id.clone(),
                });
            }
            if !info.location.is_empty() && other.info().location == info.location {
                return Err(InstallError::SlotOccupied {
                    mount,
                    location: info.location.clone(),
                });
            }
        }
        Ok(())
    }

    /// Install a new, undamaged part. Returns its index.
    pub fn install_part(&mut self, mount: Point, id: &PartTypeId) -> Result<usize, InstallError> {
        self.install_part_from_item(mount, id, Item::new(ItemTypeId::new(id.as_str())))
    }

    /// Install a part from an existing item, keeping its damage and contents.
    pub fn install_part_from_item(
        &mut self,
        mount: Point,
        id: &PartTypeId,
        base: Item,
    ) -> Result<usize, InstallError> {
        self.can_mount(mount, id)?;
        let info = self
            .content
            .part(id)
            .map(Arc::clone)
            .ok_or_else(|| InstallError::UnknownPart(id.clone()))?;
        Ok(self.push_part(info, mount, base))
    }

    fn push_part(&mut self, info: Arc<PartDef>, mount: Point, base: Item) -> usize {
        let mut part = VehiclePart::new(info, mount, base);
        if part.is_battery() && part.base.ammo.is_none() {
            part.base.ammo = Some(ItemTypeId::new(FUEL_BATTERY));
        }
        let part_type = part.id().clone();
        let p = self.parts.len();
        self.parts.push(part);
        self.refresh();
        self.emit(Event::PartInstalled {
            part: p,
            part_type,
            mount,
        });
        p
    }

    /// Whether part `p` may be removed right now.
    ///
    /// Occupied seats stay put. A frame must be the last part on its mount
    /// and its removal must not split the vehicle in two.
    pub fn can_unmount(&self, p: usize) -> bool {
        let Some(part) = self.live_part(p) else {
            return false;
        };
        if part.passenger.is_some() {
            return false;
        }
        if !part.is_structure() {
            return true;
        }
        if self.parts_at_relative(part.mount).len() > 1 {
            return false;
        }
        self.structure_connected_without(part.mount)
    }

    fn structure_connected_without(&self, hole: Point) -> bool {
        let frames: AHashSet<Point> = self
            .parts
            .iter()
            .filter(|p| !p.removed && p.is_structure() && p.mount != hole)
            .map(|p| p.mount)
            .collect();
        let Some(&start) = frames.iter().next() else {
            return true;
        };
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(at) = queue.pop_front() {
            for d in NEIGHBOURS {
                let next = at + d;
                if frames.contains(&next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited.len() == frames.len()
    }

    /// Mark part `p` removed. The slot stays a tombstone until
    /// `part_removal_cleanup`, so other indices remain valid this tick.
    /// A structural part is only removed once nothing else is mounted on it.
    pub fn remove_part(&mut self, p: usize) -> bool {
        let Some(part) = self.live_part(p) else {
            tracing::debug!(vehicle = %self.id, part = p, "remove_part on missing part");
            return false;
        };
        let mount = part.mount;
        if part.is_structure() && self.parts_at_relative(mount).len() > 1 {
            tracing::debug!(vehicle = %self.id, part = p, "structure still carries parts");
            return false;
        }
        let part_type = part.id().clone();
        let remote = part
            .has_flag(PartFlag::PowerTransfer)
            .then(|| part.target_vehicle.clone())
            .flatten();
        if let Some(remote) = remote {
            self.pending_unplug.push(remote);
        }

        let part = &mut self.parts[p];
        part.passenger = None;
        part.crew_id = None;
        part.target_vehicle = None;
        if part.engine_state.is_burning() {
            part.engine_state = EngineState::Off;
        }
        part.removed = true;
        self.removed_part_count += 1;
        self.refresh();
        if self.parts_at_relative(mount).is_empty() {
            self.labels.remove(&mount);
        }
        self.emit(Event::PartRemoved {
            part: p,
            part_type,
            mount,
        });
        true
    }

    /// Compact removed parts out of the list. Indices change afterwards.
    pub fn part_removal_cleanup(&mut self) -> bool {
        if self.removed_part_count == 0 {
            return false;
        }
        self.parts.retain(|p| !p.removed);
        self.removed_part_count = 0;
        self.refresh();
        self.shift_if_needed();
        true
    }

    // -- lookups ---------------------------------------------------------------

    /// Live parts at a mount, in install order.
    pub fn parts_at_relative(&self, mount: Point) -> &[usize] {
        self.relative_parts
            .get(&mount)
            .map_or(&[][..], |list| list.as_slice())
    }

    /// First part sharing `p`'s mount that has `flag`.
    pub fn part_with_feature(&self, p: usize, flag: PartFlag, unbroken: bool) -> Option<usize> {
        let mount = self.live_part(p)?.mount;
        self.part_with_feature_at_relative(mount, flag, unbroken)
    }

    pub fn part_with_feature_at_relative(
        &self,
        mount: Point,
        flag: PartFlag,
        unbroken: bool,
    ) -> Option<usize> {
        self.parts_at_relative(mount).iter().copied().find(|&i| {
            let part = &self.parts[i];
            part.has_flag(flag) && !(unbroken && part.is_broken())
        })
    }

    pub fn all_parts_with_feature(&self, flag: PartFlag, unbroken: bool) -> Vec<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.removed && p.has_flag(flag) && !(unbroken && p.is_broken()))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn all_parts_at_location(&self, location: &str) -> Vec<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.removed && p.info().location == location)
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether any live part has `flag`, optionally only enabled ones.
    pub fn has_part(&self, flag: PartFlag, enabled: bool) -> bool {
        self.parts
            .iter()
            .any(|p| !p.removed && p.has_flag(flag) && (!enabled || p.enabled))
    }

    pub fn part_flag(&self, p: usize, flag: PartFlag) -> bool {
        self.live_part(p).is_some_and(|part| part.has_flag(flag))
    }

    /// Unbroken obstacle at `p`'s mount, ignoring open doors.
    pub fn obstacle_at_part(&self, p: usize) -> Option<usize> {
        let o = self.part_with_feature(p, PartFlag::Obstacle, true)?;
        let part = &self.parts[o];
        if part.has_flag(PartFlag::Openable) && part.open {
            None
        } else {
            Some(o)
        }
    }

    /// Part occupying the given offset from the vehicle origin in the current
    /// orientation, preferring the frame.
    pub fn part_at(&self, local: Point) -> Option<usize> {
        let mut fallback = None;
        for (i, part) in self.parts.iter().enumerate() {
            if part.removed || part.precalc[0] != local {
                continue;
            }
            if part.is_structure() {
                return Some(i);
            }
            fallback.get_or_insert(i);
        }
        fallback
    }

    pub fn global_part_at(&self, pos: Tripoint) -> Option<usize> {
        let origin = self.global_pos3();
        if pos.z != origin.z {
            return None;
        }
        self.part_at(pos.xy() - origin.xy())
    }

    // -- doors -----------------------------------------------------------------

    pub fn next_part_to_open(&self, p: usize) -> Option<usize> {
        self.openable_at(p, false)
    }

    pub fn next_part_to_close(&self, p: usize) -> Option<usize> {
        self.openable_at(p, true)
    }

    fn openable_at(&self, p: usize, open: bool) -> Option<usize> {
        let mount = self.live_part(p)?.mount;
        self.parts_at_relative(mount).iter().copied().find(|&i| {
            let part = &self.parts[i];
            part.has_flag(PartFlag::Openable) && !part.is_broken() && part.open == open
        })
    }

    pub fn open(&mut self, p: usize) {
        self.open_or_close(p, true);
    }

    pub fn close(&mut self, p: usize) {
        self.open_or_close(p, false);
    }

    /// Open every openable part at `p`'s mount.
    pub fn open_all_at(&mut self, p: usize) {
        while let Some(door) = self.next_part_to_open(p) {
            self.open(door);
        }
    }

    /// Multi-square doors swing together with every adjacent part of the
    /// same type.
    fn open_or_close(&mut self, p: usize, opening: bool) {
        let Some(part) = self.live_part(p) else {
            return;
        };
        if !part.has_flag(PartFlag::Openable) {
            tracing::debug!(vehicle = %self.id, part = p, "open/close on non-openable part");
            return;
        }
        let id = part.id().clone();
        let multi = part.has_flag(PartFlag::MultiSquare);
        let start = part.mount;
        self.parts[p].open = opening;
        self.insides_dirty = true;
        if !multi {
            return;
        }
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(at) = queue.pop_front() {
            for d in NEIGHBOURS {
                let next = at + d;
                let door = self
                    .parts_at_relative(next)
                    .iter()
                    .copied()
                    .find(|&i| self.parts[i].id() == &id && self.parts[i].open != opening);
                if let Some(door) = door {
                    self.parts[door].open = opening;
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    // -- insides ---------------------------------------------------------------

    /// A part is inside when it has an intact roof and every side is covered
    /// by another roof or a closed obstacle.
    pub fn refresh_insides(&mut self) {
        self.insides_dirty = false;
        for p in 0..self.parts.len() {
            if self.parts[p].removed {
                continue;
            }
            let covered = self.part_with_feature(p, PartFlag::Roof, true).is_some()
                && !self.parts[p].is_broken();
            let inside = covered && self.sides_covered(self.parts[p].mount);
            self.parts[p].inside = inside;
        }
    }

    fn sides_covered(&self, mount: Point) -> bool {
        NEIGHBOURS.iter().all(|d| {
            self.parts_at_relative(mount + *d).iter().any(|&j| {
                let part = &self.parts[j];
                if part.is_broken() {
                    return false;
                }
                if part.has_flag(PartFlag::Roof) {
                    return true;
                }
                part.has_flag(PartFlag::Obstacle)
                    && !part.inside
                    && !(part.has_flag(PartFlag::Openable) && part.open)
            })
        })
    }

    pub fn is_inside(&mut self, p: usize) -> bool {
        if self.insides_dirty {
            self.refresh_insides();
        }
        self.live_part(p).is_some_and(|part| part.inside)
    }

    // -- labels ----------------------------------------------------------------

    pub fn get_label(&self, mount: Point) -> Option<&str> {
        self.labels.get(&mount).map(String::as_str)
    }

    /// Set or clear (with an empty string) the label at a mount.
    pub fn set_label(&mut self, mount: Point, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            self.labels.remove(&mount);
        } else {
            self.labels.insert(mount, text);
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = (Point, &str)> {
        self.labels.iter().map(|(at, text)| (*at, text.as_str()))
    }

    // -- loose parts -----------------------------------------------------------

    /// Drop every unmount-on-move part as a loose item.
    pub fn shed_loose_parts(&mut self) {
        for p in self.index.loose_parts.clone() {
            let Some(part) = self.live_part(p) else {
                continue;
            };
            let item = part.properties_to_item();
            let pos = self.global_part_pos3(p);
            if self.remove_part(p) {
                self.emit(Event::PartShed { item, pos });
            }
        }
    }
}
