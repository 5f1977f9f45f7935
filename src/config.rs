use std::time::Duration;

pub const DEFAULT_WINDOW_WIDTH: u32 = 960;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(15);

/// Shape of the torus knot the tunnel follows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveConfig {
    pub radius: f32,
    pub p: u32,
    pub q: u32,
    pub arc_length_divisions: usize,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            p: 7,
            q: 9,
            arc_length_divisions: 1000,
        }
    }
}

/// Tuning of the ride: speeds are in curve fractions per second, distances in
/// world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RideConfig {
    pub acceleration: f32,
    pub max_speed: f32,
    /// Seconds between timed spawns while playing. Non-positive disables them.
    pub spawn_interval: f32,
    /// Most timed spawns a single tick may catch up on after a stall.
    pub max_catch_up_spawns: usize,
    pub initial_obstacles: usize,
    /// Obstacles never spawn closer than this (in curve fraction) to the rider.
    pub spawn_exclusion: f32,
    pub obstacle_offset: f32,
    pub obstacle_radius: f32,
    pub collision_distance_squared: f32,
    pub camera_look_ahead: f32,
    pub marker_lead: f32,
    pub marker_orbit_radius: f32,
    pub marker_radius: f32,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            acceleration: 0.001,
            max_speed: 0.01,
            spawn_interval: 0.2,
            max_catch_up_spawns: 50,
            initial_obstacles: 10,
            spawn_exclusion: 0.1,
            obstacle_offset: 0.185,
            obstacle_radius: 0.03,
            collision_distance_squared: 0.02 * 0.02 + 0.05 * 0.05,
            camera_look_ahead: 0.001,
            marker_lead: 0.002,
            marker_orbit_radius: 0.2,
            marker_radius: 0.05,
        }
    }
}

/// Resolution of the tunnel mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TubeConfig {
    pub tubular_segments: usize,
    pub radius: f32,
    pub radial_segments: usize,
}

impl Default for TubeConfig {
    fn default() -> Self {
        Self {
            tubular_segments: 920,
            radius: 0.2,
            radial_segments: 32,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub curve: CurveConfig,
    pub ride: RideConfig,
    pub tube: TubeConfig,
    pub min_tick_interval: Duration,
    pub seed: Option<u64>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            curve: CurveConfig::default(),
            ride: RideConfig::default(),
            tube: TubeConfig::default(),
            min_tick_interval: MIN_TICK_INTERVAL,
            seed: None,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}
