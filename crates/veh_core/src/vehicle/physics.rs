//! Dimensionless dynamics coefficients, speed limits, thrust and handling.
//!
//! Every `k_*` coefficient lies in `[0, 1]`; `k_dynamics` is their product
//! and scales both top speed and acceleration.

use rand::Rng;

use super::Vehicle;
use crate::{PartFlag, Point, LOCATION_STRUCTURE};

/// Velocities below this are treated as stationary (m/s).
const VELOCITY_EPSILON: f32 = 0.01;

/// Relative speed (m/s, ~31 mph) above which collisions are fully inelastic.
const INELASTIC_DELTA_V: f32 = 13.86;

/// Coefficient of restitution for a collision at relative speed `delta_v`.
pub(crate) fn collision_factor(delta_v: f32) -> f32 {
    let dv = delta_v.abs();
    if dv <= INELASTIC_DELTA_V {
        1.0 - 0.9 * dv / INELASTIC_DELTA_V
    } else {
        0.1
    }
}

impl Vehicle {
    /// Floats but has no wheels.
    pub fn is_boat(&self) -> bool {
        self.index.wheelcache.is_empty() && !self.index.floating.is_empty()
    }

    /// Contact area of intact wheels, or of floats when `boat`.
    pub fn wheel_area(&self, boat: bool) -> f32 {
        let list = if boat {
            &self.index.floating
        } else {
            &self.index.wheelcache
        };
        list.iter()
            .map(|&p| &self.parts[p])
            .filter(|p| !p.is_broken())
            .map(|p| p.wheel_area())
            .sum()
    }

    /// Share of power left after rolling friction; shrinks as contact area
    /// grows.
    pub fn k_friction(&self) -> f32 {
        let base = self.content.constants.friction_base;
        let area = self.wheel_area(self.is_boat());
        if base + area <= 0.0 {
            return 1.0;
        }
        (base / (base + area)).clamp(0.0, 1.0)
    }

    /// Share of power left after air resistance, from a ray cast along each
    /// lateral row of the frame. Rows with an obstacle cost more.
    pub fn k_aerodynamics(&self) -> f32 {
        let c = &self.content.constants;
        let structure = self.all_parts_at_location(LOCATION_STRUCTURE);
        let Some(min_y) = structure.iter().map(|&p| self.parts[p].mount.y).min() else {
            return 1.0;
        };
        let rows = usize::try_from(c.aero_max_rows.max(0)).unwrap_or(0);
        let mut penalties = vec![0.0_f32; rows];
        for &p in &structure {
            let mount = self.parts[p].mount;
            let Ok(row) = usize::try_from(mount.y - min_y) else {
                continue;
            };
            let Some(slot) = penalties.get_mut(row) else {
                continue;
            };
            let cost = if self.obstacle_at_part(p).is_some() {
                c.aero_obstacle_penalty
            } else {
                c.aero_passable_penalty
            };
            *slot = slot.max(cost);
        }
        let total: f32 = penalties.iter().sum();
        if c.aero_base + total <= 0.0 {
            return 1.0;
        }
        (c.aero_base / (c.aero_base + total)).clamp(0.0, 1.0)
    }

    /// Penalty for mass carried per unit of contact area. 0 without wheels.
    pub fn k_mass(&self) -> f32 {
        let c = &self.content.constants;
        let area = self.wheel_area(self.is_boat());
        if area <= 0.0 {
            return 0.0;
        }
        let loading = self.total_mass() / (c.mass_wheel_scale.max(f32::EPSILON) * area);
        (c.mass_base / (c.mass_base + loading)).clamp(0.0, 1.0)
    }

    /// Grip given the contact area on supportive ground: 0 with nothing
    /// touching, 1 on fully supportive terrain, floored otherwise.
    pub fn k_traction(&self, wheel_traction_area: f32) -> f32 {
        if wheel_traction_area <= 0.01 {
            return 0.0;
        }
        let area = self.wheel_area(self.is_boat());
        if area <= 0.0 {
            return 0.0;
        }
        if wheel_traction_area >= area {
            return 1.0;
        }
        let mass_penalty = (1.0 - wheel_traction_area / area) * self.total_mass();
        let traction = if mass_penalty <= 0.0 {
            1.0
        } else {
            (wheel_traction_area / mass_penalty).min(1.0)
        };
        traction.max(self.content.constants.traction_floor)
    }

    pub fn k_dynamics(&self) -> f32 {
        self.k_friction() * self.k_aerodynamics() * self.k_mass()
    }

    /// Extra drag from enabled parts.
    pub fn drag(&self) -> f32 {
        self.parts
            .iter()
            .filter(|p| !p.removed && !p.is_broken() && p.enabled)
            .map(|p| p.info().drag)
            .sum()
    }

    // -- speed limits ----------------------------------------------------------

    /// Engine whose rpm band sets the speed limits.
    fn primary_engine(&self) -> Option<usize> {
        self.current_engine().or_else(|| {
            self.index
                .engines
                .iter()
                .copied()
                .find(|&e| self.parts[e].enabled && !self.parts[e].is_broken())
        })
    }

    /// Top speed in m/s with every fueled, enabled engine at redline.
    pub fn max_velocity(&self) -> f32 {
        let kw = self.total_power(true) as f32 / 1000.0;
        kw * self.content.constants.velocity_per_kw * self.k_dynamics()
    }

    pub fn max_reverse_velocity(&self) -> f32 {
        self.max_velocity() * self.content.constants.max_reverse_fraction
    }

    fn rpm_fraction(&self, pick: impl Fn(&crate::EngineDef) -> i32) -> f32 {
        self.primary_engine()
            .and_then(|e| self.parts[e].info().engine.as_ref())
            .filter(|d| d.redline_rpm > 0)
            .map_or(0.0, |d| pick(d) as f32 / d.redline_rpm as f32)
    }

    /// Fastest speed the engines sustain without overspeed damage.
    pub fn safe_velocity(&self) -> f32 {
        self.max_velocity() * self.rpm_fraction(|d| d.safe_rpm)
    }

    /// Speed with the best fuel efficiency.
    pub fn optimal_velocity(&self) -> f32 {
        self.max_velocity() * self.rpm_fraction(|d| d.optimal_rpm)
    }

    /// Engine rpm, linear in speed between idle and redline.
    pub fn rpm(&self, e: usize) -> i32 {
        let Some(part) = self.live_part(e) else {
            return 0;
        };
        let Some(engine) = part.info().engine.as_ref() else {
            return 0;
        };
        if !part.engine_state.is_burning() {
            return 0;
        }
        let max = self.max_velocity();
        if max <= 0.0 {
            return engine.idle_rpm;
        }
        let rpm = (self.velocity.abs() / max * engine.redline_rpm as f32).round() as i32;
        rpm.max(engine.idle_rpm)
    }

    /// Current gear, 0 for gearless engines and engines that are off.
    pub fn gear(&self, e: usize) -> u32 {
        let Some(part) = self.live_part(e) else {
            return 0;
        };
        let gears = part.info().engine.as_ref().map_or(0, |d| d.gears);
        if gears == 0 || !part.engine_state.is_on() {
            return 0;
        }
        let max = self.max_velocity();
        if max <= 0.0 {
            return 1;
        }
        let frac = (self.velocity.abs() / max).clamp(0.0, 1.0);
        (1 + (frac * gears as f32) as u32).min(gears)
    }

    /// Running above the engine's safe rpm.
    pub fn overspeed(&self, e: usize) -> bool {
        let Some(part) = self.live_part(e) else {
            return false;
        };
        let safe = part.info().engine.as_ref().map_or(0, |d| d.safe_rpm);
        part.engine_state.is_on() && self.rpm(e) > safe
    }

    /// Watts lost to rolling resistance and air drag at the current speed.
    pub fn friction_load(&self) -> f32 {
        let c = &self.content.constants;
        let v = self.velocity.abs();
        if v < VELOCITY_EPSILON {
            return 0.0;
        }
        let rolling = c.rolling_resistance * self.total_mass() * 9.81 * v;
        let k_aero = self.k_aerodynamics().max(0.01);
        let air = c.air_density_factor * (1.0 / k_aero + self.drag()) * v.powi(3);
        rolling + air
    }

    /// m/s² available from the running engines at the current speed.
    pub fn acceleration(&self) -> f32 {
        let c = &self.content.constants;
        let power = self.total_power(false) as f32;
        let net = power - self.friction_load();
        let mass = self.total_mass();
        if net <= 0.0 || mass <= 0.0 {
            return 0.0;
        }
        net / (mass * self.velocity.abs().max(c.min_accel_velocity)) * self.k_dynamics()
    }

    // -- handling --------------------------------------------------------------

    /// Share of steerable wheels still intact; -1 without any.
    pub fn steering_effectiveness(&self) -> f32 {
        if self.index.steering.is_empty() {
            return -1.0;
        }
        let working = self
            .index
            .steering
            .iter()
            .filter(|&&p| !self.parts[p].is_broken())
            .count();
        working as f32 / self.index.steering.len() as f32
    }

    /// Skill needed to keep control at the current speed.
    pub fn handling_difficulty(&self, wheel_traction_area: f32) -> f32 {
        let steer = self.steering_effectiveness().max(0.0);
        let ktraction = self.k_traction(wheel_traction_area);
        let kmass = self.k_mass();
        let (fx, fy) = self.face_vec();
        let (dx, dy) = self.dir_vec();
        let misalignment = ((fx - dx).powi(2) + (fy - dy).powi(2)).sqrt();
        let aligned = (1.0 - misalignment).max(0.0);
        let diff_mod = (1.0 - steer) + (1.0 - kmass) + (1.0 - ktraction) + (1.0 - aligned);
        let scale = self.content.constants.handling_velocity_scale.max(f32::EPSILON);
        self.velocity.abs() * diff_mod / scale
    }

    /// Enough wheels to stand: a lone wheel must be stable and carry at most
    /// three frames.
    pub fn sufficient_wheel_config(&self, boat: bool) -> bool {
        if boat {
            return !self.index.floating.is_empty();
        }
        match self.index.wheelcache.as_slice() {
            [] => false,
            [only] => {
                self.parts[*only].has_flag(PartFlag::Stable)
                    && self.all_parts_at_location(LOCATION_STRUCTURE).len() <= 3
            }
            _ => true,
        }
    }

    /// Centre of mass inside the wheel (or float) bounding box.
    pub fn balanced_wheel_config(&self, boat: bool) -> bool {
        let list = if boat {
            &self.index.floating
        } else {
            &self.index.wheelcache
        };
        let mounts: Vec<Point> = list.iter().map(|&p| self.parts[p].mount).collect();
        let Some(first) = mounts.first() else {
            return false;
        };
        let (mut lo, mut hi) = (*first, *first);
        for m in &mounts {
            lo = Point::new(lo.x.min(m.x), lo.y.min(m.y));
            hi = Point::new(hi.x.max(m.x), hi.y.max(m.y));
        }
        let com = self.local_center_of_mass();
        (lo.x..=hi.x).contains(&com.x) && (lo.y..=hi.y).contains(&com.y)
    }

    pub fn valid_wheel_config(&self, boat: bool) -> bool {
        self.sufficient_wheel_config(boat) && self.balanced_wheel_config(boat)
    }

    // -- driving ---------------------------------------------------------------

    /// Accelerate (`thd > 0`) or brake and reverse (`thd < 0`) for one tick.
    pub fn thrust(&mut self, thd: i32, wheel_traction_area: f32) {
        if thd == 0 {
            return;
        }
        if !self.valid_wheel_config(self.is_boat()) {
            tracing::debug!(vehicle = %self.id, "thrust with an invalid wheel configuration");
            self.velocity = 0.0;
            self.cruise_velocity = 0.0;
            return;
        }
        let c = &self.content.constants;
        let (spt, brake, floor) = (c.seconds_per_tick, c.brake_decel, c.traction_floor);
        let ktraction = self.k_traction(wheel_traction_area);
        let braking = (thd > 0 && self.velocity < 0.0) || (thd < 0 && self.velocity > 0.0);
        if braking {
            let decel = brake * ktraction.max(floor) * spt;
            self.velocity = if self.velocity > 0.0 {
                (self.velocity - decel).max(0.0)
            } else {
                (self.velocity + decel).min(0.0)
            };
            return;
        }
        if self.current_engine().is_none() {
            return;
        }
        let load = 1.0;
        self.consume_fuel(load);
        if self.current_engine().is_none() {
            return;
        }
        if ktraction > 0.01 {
            let accel = self.acceleration() * ktraction * spt;
            if thd > 0 {
                let max = self.max_velocity();
                if self.velocity < max {
                    self.velocity = (self.velocity + accel).min(max);
                }
            } else {
                let max = self.max_reverse_velocity();
                if self.velocity > -max {
                    self.velocity = (self.velocity - accel).max(-max);
                }
            }
        }
        self.update_engine_overspeed();
        self.noise_and_smoke(load);
    }

    /// Nudge the cruise setpoint by `amount`, snapping to the safe speed when
    /// crossing it and clamping to the reachable range.
    pub fn cruise_thrust(&mut self, amount: f32) {
        if amount.abs() < VELOCITY_EPSILON {
            return;
        }
        let safe = self.safe_velocity();
        let max = self.max_velocity();
        let next = self.cruise_velocity + amount;
        let crosses_safe = (self.cruise_velocity < safe && safe < next)
            || (self.cruise_velocity > safe && safe > next);
        self.cruise_velocity = if crosses_safe { safe } else { next };
        let max_reverse = self.max_reverse_velocity();
        self.cruise_velocity = self.cruise_velocity.clamp(-max_reverse, max.max(0.0));
    }

    pub fn stop(&mut self) {
        self.velocity = 0.0;
        self.cruise_velocity = 0.0;
        self.of_turn_carry = 0.0;
        self.skidding = false;
        self.move_dir = self.face;
    }

    pub fn current_velocity(&self) -> f32 {
        self.velocity
    }

    /// Velocity component along the facing direction.
    pub fn forward_velocity(&self) -> f32 {
        let (fx, fy) = self.face_vec();
        let (mx, my) = self.move_vec();
        self.velocity * (fx * mx + fy * my)
    }

    fn coast(&mut self) {
        let c = &self.content.constants;
        let decel = c.coast_decel * c.seconds_per_tick * (2.0 - self.k_friction());
        self.velocity = if self.velocity > 0.0 {
            (self.velocity - decel).max(0.0)
        } else {
            (self.velocity + decel).min(0.0)
        };
    }

    /// Per-tick movement step: friction, cruise control, skid recovery and
    /// the move budget for this turn.
    pub fn gain_moves(&mut self, wheel_traction_area: f32, rng: &mut impl Rng) {
        if self.velocity.abs() >= VELOCITY_EPSILON {
            self.coast();
        }
        if self.cruise_on {
            let target = self.cruise_velocity;
            let diff = target - self.velocity;
            if diff.abs() >= VELOCITY_EPSILON {
                let thd = if diff > 0.0 { 1 } else { -1 };
                self.thrust(thd, wheel_traction_area);
                let overshot = (thd > 0 && self.velocity > target)
                    || (thd < 0 && self.velocity < target);
                if overshot {
                    self.velocity = target;
                }
            }
        }
        self.of_turn = 1.0 + self.of_turn_carry;
        self.of_turn_carry = 0.0;
        if self.velocity.abs() >= VELOCITY_EPSILON {
            self.shed_loose_parts();
        }
        if self.skidding {
            self.possibly_recover_from_skid(rng);
        }
        self.last_turn = 0;
    }

    /// Roll against the alignment of facing and motion to end a skid. Never
    /// recovers on the tick of a sharp turn.
    pub fn possibly_recover_from_skid(&mut self, rng: &mut impl Rng) {
        if !self.skidding || self.last_turn.abs() > 13 {
            return;
        }
        let (fx, fy) = self.face_vec();
        let (mx, my) = self.move_vec();
        let dot = fx * mx + fy * my;
        let roll: i32 = (0..9).map(|_| rng.gen_range(1..=20)).sum();
        if dot.abs() * 100.0 > roll as f32 {
            self.skidding = false;
            self.velocity *= dot.abs();
            self.move_dir = self.face;
        }
    }
}
