//! Vehicles linked by power cables.
//!
//! Cables hold the remote vehicle's id, never a pointer, so a fleet walks
//! the graph by lookup. Transfer loss accumulates per hop.

use std::collections::{BTreeMap, VecDeque};

use ahash::AHashSet;

use crate::{Event, ItemTypeId, PartFlag, Vehicle, VehicleId, FUEL_BATTERY};

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vehicles: BTreeMap<VehicleId, Vehicle>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vehicle: Vehicle) -> Option<Vehicle> {
        self.vehicles.insert(vehicle.id.clone(), vehicle)
    }

    pub fn remove(&mut self, id: &VehicleId) -> Option<Vehicle> {
        self.vehicles.remove(id)
    }

    pub fn get(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn get_mut(&mut self, id: &VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Vehicle> {
        self.vehicles.values_mut()
    }

    /// Plug cable part `a_part` on `a` into cable part `b_part` on `b`.
    pub fn link(&mut self, a: &VehicleId, a_part: usize, b: &VehicleId, b_part: usize) -> bool {
        if a == b {
            return false;
        }
        let is_cable = |fleet: &Fleet, id: &VehicleId, p: usize| {
            fleet
                .get(id)
                .and_then(|v| v.part(p))
                .is_some_and(|part| !part.is_removed() && part.has_flag(PartFlag::PowerTransfer))
        };
        if !is_cable(self, a, a_part) || !is_cable(self, b, b_part) {
            return false;
        }
        for (id, p, remote) in [(a, a_part, b), (b, b_part, a)] {
            if let Some(part) = self.vehicles.get_mut(id).and_then(|v| v.part_mut(p)) {
                part.target_vehicle = Some(remote.clone());
            }
        }
        true
    }

    /// Vehicles reachable over cables from `start`, breadth first, each with
    /// the transfer loss accumulated on the way there. Excludes `start`.
    pub fn linked_vehicles(&self, start: &VehicleId) -> Vec<(VehicleId, i32)> {
        let mut found = Vec::new();
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back((start.clone(), 0_i32));
        while let Some((id, loss_pct)) = queue.pop_front() {
            let Some(veh) = self.vehicles.get(&id) else {
                continue;
            };
            for (_, remote, hop_loss) in veh.power_links() {
                if !self.vehicles.contains_key(&remote) || !visited.insert(remote.clone()) {
                    continue;
                }
                let total_loss = (loss_pct + hop_loss).clamp(0, 100);
                found.push((remote.clone(), total_loss));
                queue.push_back((remote, total_loss));
            }
        }
        found
    }

    /// Visit the vehicles linked to `start` in breadth-first order.
    ///
    /// `visitor(vehicle, amount, loss_pct)` receives the amount still to
    /// move, counted at `start`, and the loss on the way to that vehicle. It
    /// returns the new amount. The walk stops once less than one unit remains.
    pub fn traverse_vehicle_graph<F>(
        &mut self,
        start: &VehicleId,
        amount: i64,
        mut visitor: F,
    ) -> i64
    where
        F: FnMut(&mut Vehicle, i64, i32) -> i64,
    {
        let mut amount = amount;
        for (id, loss_pct) in self.linked_vehicles(start) {
            if amount < 1 {
                break;
            }
            if let Some(target) = self.vehicles.get_mut(&id) {
                amount = visitor(target, amount, loss_pct);
            }
        }
        amount.max(0)
    }

    /// Charge `id`'s batteries, spilling over to linked vehicles when
    /// `include_other`. Returns the leftover that found no room.
    pub fn charge_battery(&mut self, id: &VehicleId, amount: i64, include_other: bool) -> i64 {
        let Some(veh) = self.vehicles.get_mut(id) else {
            return amount.max(0);
        };
        let left = veh.charge_battery(amount);
        if left <= 0 || !include_other {
            return left;
        }
        self.traverse_vehicle_graph(id, left, |v, amt, loss_pct| {
            let arriving = amt * i64::from(100 - loss_pct) / 100;
            if arriving <= 0 {
                return amt;
            }
            let stored = arriving - v.charge_battery(arriving);
            amt - before_loss(stored, loss_pct).min(amt)
        })
    }

    /// Draw from `id`'s batteries and reactors, then from linked vehicles
    /// when `include_other`. Remote vehicles pay the transfer loss on top of
    /// what arrives. Returns the unmet remainder.
    pub fn discharge_battery(&mut self, id: &VehicleId, amount: i64, include_other: bool) -> i64 {
        let Some(veh) = self.vehicles.get_mut(id) else {
            return amount.max(0);
        };
        let left = veh.discharge_battery(amount, true);
        if left <= 0 || !include_other {
            return left;
        }
        self.traverse_vehicle_graph(id, left, |v, amt, loss_pct| {
            if loss_pct >= 100 {
                return amt;
            }
            let request = before_loss(amt, loss_pct);
            let drawn = request - v.discharge_battery(request, false);
            let delivered = if drawn >= request {
                amt
            } else {
                drawn * i64::from(100 - loss_pct) / 100
            };
            amt - delivered.min(amt)
        })
    }

    /// Fuel on `id`, plus battery charge across linked vehicles when
    /// `recurse`.
    pub fn fuel_left(&self, id: &VehicleId, ftype: &ItemTypeId, recurse: bool) -> i64 {
        let Some(local) = self.vehicles.get(id).map(|v| v.fuel_left(ftype, true)) else {
            return 0;
        };
        if !recurse || ftype.as_str() != FUEL_BATTERY {
            return local;
        }
        let linked: i64 = self
            .linked_vehicles(id)
            .iter()
            .filter_map(|(remote, _)| self.vehicles.get(remote))
            .map(|v| v.fuel_left(ftype, false))
            .sum();
        local + linked
    }

    /// Remove part `p` of vehicle `id`, unplugging the far end of a cable.
    pub fn remove_remote_part(&mut self, id: &VehicleId, p: usize) -> bool {
        let removed = self
            .vehicles
            .get_mut(id)
            .is_some_and(|veh| veh.remove_part(p));
        self.process_unplugs();
        removed
    }

    fn process_unplugs(&mut self) {
        loop {
            let mut work = Vec::new();
            for (id, veh) in &mut self.vehicles {
                work.extend(veh.take_unplugged().into_iter().map(|r| (id.clone(), r)));
            }
            if work.is_empty() {
                return;
            }
            for (origin, remote) in work {
                if let Some(veh) = self.vehicles.get_mut(&remote) {
                    veh.unplug_from(&origin);
                }
            }
        }
    }

    /// End-of-tick bookkeeping: unplug dangling cables, compact removed parts
    /// and drop vehicles with nothing left. Returns the dropped ids.
    pub fn end_of_tick(&mut self) -> Vec<VehicleId> {
        self.process_unplugs();
        for veh in self.vehicles.values_mut() {
            veh.part_removal_cleanup();
        }
        let empty: Vec<VehicleId> = self
            .vehicles
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        for id in &empty {
            tracing::debug!(vehicle = %id, "vehicle has no parts left, removing");
            self.vehicles.remove(id);
        }
        empty
    }
}

impl Vehicle {
    /// Drop every cable plugged into `other`. Returns how many came off.
    pub fn unplug_from(&mut self, other: &VehicleId) -> usize {
        let cables: Vec<usize> = self
            .index
            .power_transfer
            .iter()
            .copied()
            .filter(|&p| self.parts[p].target_vehicle.as_ref() == Some(other))
            .collect();
        for &p in &cables {
            self.parts[p].target_vehicle = None;
            let item = self.parts[p].properties_to_item();
            let pos = self.global_part_pos3(p);
            if self.remove_part(p) {
                self.emit(Event::PartShed { item, pos });
            }
        }
        cables.len()
    }
}

/// Amount that has to leave one end of a link so `arrived` reaches the
/// other across `loss_pct`.
fn before_loss(arrived: i64, loss_pct: i32) -> i64 {
    let kept = i64::from(100 - loss_pct.clamp(0, 99));
    (arrived * 100 + kept - 1) / kept
}
