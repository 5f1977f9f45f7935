use cgmath::Vector3;
use wasm_bindgen::prelude::*;

use crate::config::GameConfig;
use crate::ride::RideController;

fn to_array(v: Vector3<f32>) -> Vec<f32> {
    vec![v.x, v.y, v.z]
}

/// Ride controller for pages that run their own frame loop and renderer.
#[wasm_bindgen]
pub struct WebRide {
    ride: RideController,
}

#[wasm_bindgen]
impl WebRide {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> WebRide {
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        WebRide {
            ride: RideController::from_config(&config),
        }
    }

    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.ride.on_resize(width, height);
    }

    #[wasm_bindgen(js_name = onPointerMove)]
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.ride.on_pointer_move(x, y);
    }

    #[wasm_bindgen(js_name = onPointerDown)]
    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.ride.on_pointer_down(x, y);
    }

    /// Advances the ride by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.ride.tick(dt);
    }

    pub fn score(&self) -> u32 {
        self.ride.score()
    }

    #[wasm_bindgen(js_name = highScore)]
    pub fn high_score(&self) -> u32 {
        self.ride.high_score()
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.ride.is_playing()
    }

    #[wasm_bindgen(js_name = cameraPosition)]
    pub fn camera_position(&self) -> Vec<f32> {
        to_array(self.ride.frame().position)
    }

    #[wasm_bindgen(js_name = cameraTarget)]
    pub fn camera_target(&self) -> Vec<f32> {
        to_array(self.ride.scene().camera.target)
    }

    #[wasm_bindgen(js_name = cameraUp)]
    pub fn camera_up(&self) -> Vec<f32> {
        to_array(self.ride.frame().up)
    }

    #[wasm_bindgen(js_name = playerPosition)]
    pub fn player_position(&self) -> Vec<f32> {
        to_array(self.ride.marker_position())
    }

    /// Obstacle centers, flattened as x, y, z triples.
    #[wasm_bindgen(js_name = obstaclePositions)]
    pub fn obstacle_positions(&self) -> Vec<f32> {
        self.ride
            .obstacles()
            .iter()
            .flat_map(|obstacle| to_array(obstacle.position))
            .collect()
    }
}
