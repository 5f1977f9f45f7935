use cgmath::{InnerSpace, Quaternion, Rad, Rotation, Rotation3, Vector3};
use rand::Rng;
use std::f32::consts::TAU;

use crate::space_curve::{wrap_unit, ArcLengthCurve, ParametricCurve};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObstacleId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    /// Curve parameter the obstacle was placed around.
    pub t: f32,
    pub position: Vector3<f32>,
}

/// Unit axis perpendicular to `tangent`, taken from whichever coordinate
/// plane cross product is longer.
pub fn perpendicular_axis(tangent: Vector3<f32>) -> Vector3<f32> {
    let xz = Vector3::new(-tangent.z, 0.0, tangent.x);
    let yz = Vector3::new(0.0, -tangent.z, tangent.y);
    let axis = if xz.magnitude2() > yz.magnitude2() { xz } else { yz };
    // Only a zero tangent gets here; both candidates vanish then.
    if axis.magnitude2() <= f32::EPSILON {
        return Vector3::unit_x();
    }
    axis.normalize()
}

/// Offset of length `distance` perpendicular to `tangent`, rotated by `angle`
/// about it.
pub fn radial_offset(tangent: Vector3<f32>, angle: f32, distance: f32) -> Vector3<f32> {
    let axis = perpendicular_axis(tangent);
    if tangent.magnitude2() <= f32::EPSILON {
        return axis * distance;
    }
    let rotation = Quaternion::from_axis_angle(tangent.normalize(), Rad(angle));
    rotation.rotate_vector(axis).normalize() * distance
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRules {
    /// Minimum curve distance, both ahead and behind, from the rider.
    pub exclusion: f32,
    pub offset: f32,
    pub collision_distance_squared: f32,
}

#[derive(Debug)]
pub struct ObstacleField {
    rules: SpawnRules,
    obstacles: Vec<Obstacle>,
    next_id: u64,
}

impl ObstacleField {
    pub fn new(rules: SpawnRules) -> Self {
        ObstacleField {
            rules,
            obstacles: Vec::new(),
            next_id: 0,
        }
    }

    pub fn rules(&self) -> &SpawnRules {
        &self.rules
    }

    /// Places an obstacle at an exact position.
    pub fn place(&mut self, t: f32, position: Vector3<f32>) -> ObstacleId {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;
        self.obstacles.push(Obstacle { id, t, position });
        id
    }

    /// Spawns an obstacle somewhere on the tunnel wall out of the rider's
    /// immediate reach around `tpos`.
    pub fn spawn<C, R>(&mut self, curve: &ArcLengthCurve<C>, tpos: f32, rng: &mut R) -> &Obstacle
    where
        C: ParametricCurve,
        R: Rng + ?Sized,
    {
        let exclusion = self.rules.exclusion.clamp(0.0, 0.5);
        let t = if exclusion < 0.5 {
            wrap_unit(tpos + rng.gen_range(exclusion..1.0 - exclusion))
        } else {
            wrap_unit(tpos + 0.5)
        };
        let angle = rng.gen_range(0.0..TAU);

        let center = curve.point_at(t);
        let tangent = curve.tangent_at(t);
        let position = center + radial_offset(tangent, angle, self.rules.offset);
        let id = self.place(t, position);
        log::debug!("spawned obstacle {} at t = {t:.4}", id.0);

        let last = self.obstacles.len() - 1;
        &self.obstacles[last]
    }

    /// Removes and returns the most recently placed obstacle within collision
    /// range of `player`. At most one obstacle is resolved per call.
    pub fn check_collision(&mut self, player: Vector3<f32>) -> Option<Obstacle> {
        let threshold = self.rules.collision_distance_squared;
        let hit = self
            .obstacles
            .iter()
            .rposition(|obstacle| (player - obstacle.position).magnitude2() < threshold)?;
        Some(self.obstacles.remove(hit))
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.obstacles.len();
        self.obstacles.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CurveConfig, RideConfig};
    use crate::space_curve::TunnelCurve;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rules() -> SpawnRules {
        let ride = RideConfig::default();
        SpawnRules {
            exclusion: ride.spawn_exclusion,
            offset: ride.obstacle_offset,
            collision_distance_squared: ride.collision_distance_squared,
        }
    }

    #[test]
    fn spawns_stay_out_of_the_exclusion_window() {
        let curve = TunnelCurve::from_config(&CurveConfig::default());
        let mut field = ObstacleField::new(rules());
        let mut rng = SmallRng::seed_from_u64(7);
        for i in 0..400 {
            let tpos = wrap_unit(i as f32 * 0.0731);
            let t = field.spawn(&curve, tpos, &mut rng).t;
            assert!((0.0..1.0).contains(&t));
            let gap = wrap_unit(t - tpos);
            assert!((0.1 - 1e-4..=0.9 + 1e-4).contains(&gap), "tpos {tpos} t {t}");
        }
        assert_eq!(field.len(), 400);
    }

    #[test]
    fn spawned_obstacles_sit_on_the_tunnel_wall() {
        let curve = TunnelCurve::from_config(&CurveConfig::default());
        let mut field = ObstacleField::new(rules());
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let tpos = rng.gen_range(0.0..1.0);
            let obstacle = *field.spawn(&curve, tpos, &mut rng);
            let offset = obstacle.position - curve.point_at(obstacle.t);
            assert!((offset.magnitude() - 0.185).abs() < 1e-3);
            assert!(offset.normalize().dot(curve.tangent_at(obstacle.t)).abs() < 1e-2);
        }
    }

    #[test]
    fn perpendicular_axis_handles_principal_tangents() {
        for tangent in [
            Vector3::unit_x(),
            Vector3::unit_y(),
            Vector3::unit_z(),
            -Vector3::unit_y(),
            Vector3::new(0.6, 0.8, 0.0),
        ] {
            let axis = perpendicular_axis(tangent);
            assert!((axis.magnitude() - 1.0).abs() < 1e-6);
            assert!(axis.dot(tangent).abs() < 1e-6);
        }
        assert_eq!(perpendicular_axis(Vector3::new(0.0, 0.0, 0.0)), Vector3::unit_x());
    }

    #[test]
    fn radial_offset_rotates_around_the_tangent() {
        let tangent = Vector3::unit_z();
        let quarter = radial_offset(tangent, std::f32::consts::FRAC_PI_2, 0.185);
        let zero = radial_offset(tangent, 0.0, 0.185);
        assert!((quarter.magnitude() - 0.185).abs() < 1e-6);
        assert!(quarter.dot(zero).abs() < 1e-6);
        assert!(quarter.dot(tangent).abs() < 1e-6);
    }

    #[test]
    fn collision_boundary_is_exclusive() {
        let mut field = ObstacleField::new(rules());
        field.place(0.5, Vector3::new(0.0, 0.0, 0.0));

        assert_eq!(field.check_collision(Vector3::new(0.02, 0.05, 0.0)), None);
        assert_eq!(field.check_collision(Vector3::new(0.02, 0.051, 0.0)), None);
        assert_eq!(field.len(), 1);

        let hit = field.check_collision(Vector3::new(0.02, 0.049, 0.0));
        assert!(hit.is_some());
        assert!(field.is_empty());
    }

    #[test]
    fn only_the_latest_overlapping_obstacle_is_removed() {
        let mut field = ObstacleField::new(rules());
        let first = field.place(0.2, Vector3::new(1.0, 0.0, 0.0));
        let far = field.place(0.3, Vector3::new(5.0, 0.0, 0.0));
        let second = field.place(0.4, Vector3::new(1.01, 0.0, 0.0));

        let hit = field.check_collision(Vector3::new(1.0, 0.0, 0.0)).map(|o| o.id);
        assert_eq!(hit, Some(second));
        let remaining: Vec<_> = field.iter().map(|o| o.id).collect();
        assert_eq!(remaining, vec![first, far]);

        let hit = field.check_collision(Vector3::new(1.0, 0.0, 0.0)).map(|o| o.id);
        assert_eq!(hit, Some(first));
        assert_eq!(field.clear(), 1);
    }

    #[test]
    fn ids_keep_increasing_after_clear() {
        let mut field = ObstacleField::new(rules());
        let a = field.place(0.0, Vector3::new(0.0, 0.0, 0.0));
        field.clear();
        let b = field.place(0.0, Vector3::new(0.0, 0.0, 0.0));
        assert!(b > a);
    }
}
