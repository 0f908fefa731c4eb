//! Cargo stored in parts with the `Cargo` flag, limited by volume.

use super::Vehicle;
use crate::{Item, PartFlag};

/// Slack for float volume comparisons.
const VOLUME_EPSILON: f32 = 1e-4;

impl Vehicle {
    /// Cargo capacity in litres; 0 for broken or non-cargo parts.
    pub fn max_volume(&self, p: usize) -> f32 {
        match self.live_part(p) {
            Some(part) if part.has_flag(PartFlag::Cargo) && !part.is_broken() => {
                part.info().cargo_volume_l
            }
            _ => 0.0,
        }
    }

    pub fn stored_volume(&self, p: usize) -> f32 {
        self.live_part(p).map_or(0.0, |part| {
            part.items.iter().map(|i| i.volume(&self.content)).sum()
        })
    }

    pub fn free_volume(&self, p: usize) -> f32 {
        (self.max_volume(p) - self.stored_volume(p)).max(0.0)
    }

    /// Store `item` whole, merging into a matching stack. False when it does
    /// not fit.
    pub fn add_item(&mut self, p: usize, item: Item) -> bool {
        if self.max_volume(p) <= 0.0 || item.charges <= 0 {
            return false;
        }
        if item.volume(&self.content) > self.free_volume(p) + VOLUME_EPSILON {
            return false;
        }
        let part = &mut self.parts[p];
        match part.items.iter_mut().find(|stack| stack.stacks_with(&item)) {
            Some(stack) => stack.charges += item.charges,
            None => part.items.push(item),
        }
        self.invalidate_mass();
        true
    }

    /// Store as many charges of `item` as fit. Returns the charges stored.
    pub fn add_charges(&mut self, p: usize, item: &Item) -> i64 {
        let per_charge = self
            .content
            .item(&item.type_id)
            .map_or(0.0, |def| def.volume_l);
        let fit = if per_charge <= 0.0 {
            item.charges
        } else {
            ((self.free_volume(p) + VOLUME_EPSILON) / per_charge).floor() as i64
        }
        .min(item.charges);
        if fit <= 0 {
            return 0;
        }
        let mut stack = item.clone();
        stack.charges = fit;
        if self.add_item(p, stack) {
            fit
        } else {
            0
        }
    }

    /// Take the `index`-th stored stack out of part `p`.
    pub fn remove_item(&mut self, p: usize, index: usize) -> Option<Item> {
        let part = self.parts.get_mut(p).filter(|part| !part.removed)?;
        if index >= part.items.len() {
            return None;
        }
        let item = part.items.remove(index);
        self.invalidate_mass();
        Some(item)
    }
}
