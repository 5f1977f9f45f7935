use cgmath::{InnerSpace, Quaternion, Rad, Rotation, Rotation3, Vector3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{GameConfig, RideConfig};
use crate::frame::{next_frame, Frame};
use crate::obstacles::{ObstacleField, SpawnRules};
use crate::scene::{CameraPose, Renderable, RenderableKey, SceneSnapshot};
use crate::space_curve::{wrap_unit, ParametricCurve, TunnelCurve};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RidePhase {
    Menu,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RideState {
    /// Arc-length position of the camera on the curve, in [0, 1).
    pub tpos: f32,
    pub speed: f32,
    pub player_angle: f32,
    /// Seconds survived in the current ride.
    pub score: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Owns everything that moves: the ride position, the obstacles around it and
/// the camera frame. Advanced once per tick by the game loop.
pub struct RideController {
    curve: TunnelCurve,
    config: RideConfig,
    state: RideState,
    phase: RidePhase,
    high_score: f64,
    obstacle_timer: f64,
    obstacles: ObstacleField,
    frame: Frame,
    marker: Vector3<f32>,
    viewport: Viewport,
    rng: SmallRng,
}

impl RideController {
    pub fn new(curve: TunnelCurve, config: RideConfig, mut rng: SmallRng) -> Self {
        let tpos = rng.gen_range(0.0..1.0);
        let obstacles = ObstacleField::new(SpawnRules {
            exclusion: config.spawn_exclusion,
            offset: config.obstacle_offset,
            collision_distance_squared: config.collision_distance_squared,
        });
        let mut ride = RideController {
            curve,
            config,
            state: RideState {
                tpos,
                speed: 0.0,
                player_angle: 0.0,
                score: 0.0,
            },
            phase: RidePhase::Menu,
            high_score: 0.0,
            obstacle_timer: 0.0,
            obstacles,
            frame: Frame::default(),
            marker: Vector3::new(0.0, 0.0, 0.0),
            viewport: Viewport::default(),
            rng,
        };
        ride.refresh_pose();
        ride
    }

    pub fn from_config(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        RideController::new(TunnelCurve::from_config(&config.curve), config.ride, rng)
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.viewport = Viewport { width, height };
    }

    /// Points the marker towards the pointer, measured from the screen center.
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.viewport.is_degenerate() {
            log::debug!("ignoring pointer at ({x}, {y}) on a {:?} viewport", self.viewport);
            return;
        }
        let nx = x / self.viewport.width - 0.5;
        let ny = y / self.viewport.height - 0.5;
        let angle = ny.atan2(nx);
        if angle.is_finite() {
            self.state.player_angle = angle;
        }
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        if self.phase == RidePhase::Menu {
            self.start();
            self.on_pointer_move(x, y);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt < 0.0 {
            log::debug!("skipping tick with dt = {dt}");
            return;
        }

        self.state.tpos = wrap_unit(self.state.tpos + dt * self.state.speed);
        self.state.speed = (self.state.speed + dt * self.config.acceleration).min(self.config.max_speed);

        if self.phase == RidePhase::Playing {
            for _ in 0..self.due_spawns(dt) {
                self.obstacles.spawn(&self.curve, self.state.tpos, &mut self.rng);
            }

            if let Some(hit) = self.obstacles.check_collision(self.marker) {
                log::debug!("marker hit obstacle {}", hit.id.0);
                self.state.speed = 0.0;
                self.game_over();
            } else {
                self.state.score += f64::from(dt);
            }
        }

        self.refresh_pose();
    }

    /// Advances the spawn timer by `dt` and returns how many timed spawns fell
    /// due, capped at `max_catch_up_spawns`.
    fn due_spawns(&mut self, dt: f32) -> usize {
        let interval = f64::from(self.config.spawn_interval);
        if interval.is_nan() || interval <= 0.0 {
            return 0;
        }
        self.obstacle_timer += f64::from(dt);
        let due = (self.obstacle_timer / interval).floor();
        self.obstacle_timer = (self.obstacle_timer - due * interval).max(0.0);
        if due > self.config.max_catch_up_spawns as f64 {
            log::debug!("dropping {} overdue spawns", due - self.config.max_catch_up_spawns as f64);
        }
        (due as usize).min(self.config.max_catch_up_spawns)
    }

    fn start(&mut self) {
        self.state.score = 0.0;
        self.obstacle_timer = 0.0;
        self.enter_phase(RidePhase::Playing);
        for _ in 0..self.config.initial_obstacles {
            self.obstacles.spawn(&self.curve, self.state.tpos, &mut self.rng);
        }
        log::info!(
            "ride started at t = {:.4} with {} obstacles",
            self.state.tpos,
            self.obstacles.len()
        );
    }

    fn game_over(&mut self) {
        self.high_score = self.high_score.max(self.state.score);
        let cleared = self.obstacles.clear();
        log::info!(
            "game over: score {} (best {}), cleared {cleared} obstacles",
            self.score(),
            self.high_score()
        );
        self.enter_phase(RidePhase::Menu);
    }

    /// Both transitions drop the rider on a fresh stretch of tunnel at rest.
    fn enter_phase(&mut self, phase: RidePhase) {
        self.phase = phase;
        self.state.tpos = self.rng.gen_range(0.0..1.0);
        self.state.speed = 0.0;
        self.refresh_pose();
    }

    fn refresh_pose(&mut self) {
        self.frame = next_frame(
            &self.curve,
            self.state.tpos,
            self.config.camera_look_ahead,
            self.frame.up,
        );
        self.marker = self.marker_position_for(self.state.tpos, self.state.player_angle);
    }

    /// The marker orbits the centerline slightly ahead of the camera, with
    /// angle zero along the frame's right axis.
    fn marker_position_for(&self, tpos: f32, angle: f32) -> Vector3<f32> {
        let raw = wrap_unit(self.curve.raw_param_at(wrap_unit(tpos + self.config.marker_lead), None));
        let center = self.curve.point(raw);
        let direction = self.curve.tangent(raw);

        let mut radial = direction.cross(self.frame.up);
        if radial.magnitude2() <= f32::EPSILON {
            radial = self.frame.right;
        }
        let rotation = Quaternion::from_axis_angle(direction, Rad(angle));
        center + rotation.rotate_vector(radial.normalize()) * self.config.marker_orbit_radius
    }

    pub fn scene(&self) -> SceneSnapshot {
        let mut renderables = Vec::with_capacity(self.obstacles.len() + 1);
        if self.phase == RidePhase::Playing {
            renderables.push(Renderable {
                key: RenderableKey::Player,
                position: self.marker,
                radius: self.config.marker_radius,
            });
        }
        renderables.extend(self.obstacles.iter().map(|obstacle| Renderable {
            key: RenderableKey::Obstacle(obstacle.id),
            position: obstacle.position,
            radius: self.config.obstacle_radius,
        }));

        SceneSnapshot {
            camera: CameraPose {
                position: self.frame.position,
                target: self.frame.position + self.frame.tangent,
                up: self.frame.up,
            },
            renderables,
            playing: self.is_playing(),
        }
    }

    pub fn curve(&self) -> &TunnelCurve {
        &self.curve
    }

    pub fn config(&self) -> &RideConfig {
        &self.config
    }

    pub fn state(&self) -> &RideState {
        &self.state
    }

    pub fn phase(&self) -> RidePhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == RidePhase::Playing
    }

    pub fn score(&self) -> u32 {
        self.state.score.floor() as u32
    }

    pub fn high_score(&self) -> u32 {
        self.high_score.floor() as u32
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn marker_position(&self) -> Vector3<f32> {
        self.marker
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}
