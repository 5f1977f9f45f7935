pub mod config;
pub mod error;
pub mod frame;
pub mod game_loop;
pub mod geometry;
pub mod matrix_operations;
mod mesh_pass;
pub mod obstacles;
pub mod renderer;
pub mod ride;
pub mod scene;
pub mod space_curve;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::sync::Arc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use web_time::Instant;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, Event, MouseButton, TouchPhase, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

pub use crate::config::GameConfig;
pub use crate::error::AppError;
use crate::game_loop::{GameLoop, LoopControl};
use crate::renderer::Renderer;
use crate::ride::RideController;

#[cfg(target_arch = "wasm32")]
const CANVAS_HOST_ID: &str = "knot-runner";

fn window_title(score: u32, best: u32) -> String {
    format!("Knot Runner | score {score} | best {best}")
}

fn init_logging() {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            std::panic::set_hook(Box::new(console_error_panic_hook::hook));
            if let Err(err) = console_log::init_with_level(log::Level::Info) {
                web_sys::console::log_1(&format!("logger unavailable: {err}").into());
            }
        } else {
            env_logger::init();
        }
    }
}

async fn arun(config: GameConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(window_title(0, 0))
            .with_inner_size(winit::dpi::PhysicalSize::new(
                config.window_width,
                config.window_height,
            ))
            .build(&event_loop)?,
    );

    #[cfg(target_arch = "wasm32")]
    {
        // Winit prevents sizing with CSS, so the size is set by hand on web.
        use winit::dpi::PhysicalSize;
        let _ = window.request_inner_size(PhysicalSize::new(config.window_width, config.window_height));

        use winit::platform::web::WindowExtWebSys;
        web_sys::window()
            .and_then(|win| win.document())
            .and_then(|doc| {
                let dst = doc.get_element_by_id(CANVAS_HOST_ID)?;
                let canvas = web_sys::Element::from(window.canvas()?);
                dst.append_child(&canvas).ok()?;
                Some(())
            })
            .ok_or(AppError::MissingCanvasHost(CANVAS_HOST_ID))?;
    }

    let ride = RideController::from_config(&config);
    let mut renderer = Renderer::new(window.clone(), ride.curve(), &config.tube).await?;

    let redraw_window = window.clone();
    let mut game = GameLoop::new(ride, config.min_tick_interval, move || {
        redraw_window.request_redraw()
    });
    let size = window.inner_size();
    game.on_resize(size.width as f32, size.height as f32);
    game.start();

    let mut cursor = PhysicalPosition::new(0.0f64, 0.0f64);
    let mut shown_scores = (0, 0);

    event_loop.run(move |event, target| {
        let Event::WindowEvent { event, .. } = event else {
            return;
        };
        match event {
            WindowEvent::Resized(new_size) => {
                renderer.resize(new_size.width, new_size.height);
                game.on_resize(new_size.width as f32, new_size.height as f32);
                // On macos the window needs to be redrawn manually after resizing
                window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = position;
                game.on_pointer_move(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => game.on_pointer_down(cursor.x as f32, cursor.y as f32),
            WindowEvent::Touch(touch) => {
                cursor = touch.location;
                let (x, y) = (touch.location.x as f32, touch.location.y as f32);
                match touch.phase {
                    TouchPhase::Started => game.on_pointer_down(x, y),
                    TouchPhase::Moved | TouchPhase::Ended => game.on_pointer_move(x, y),
                    TouchPhase::Cancelled => {}
                }
            }
            WindowEvent::RedrawRequested => {
                if game.on_frame(Instant::now(), &mut renderer) == LoopControl::Stop {
                    return;
                }
                let ride = game.ride();
                let scores = (ride.score(), ride.high_score());
                if scores != shown_scores {
                    shown_scores = scores;
                    window.set_title(&window_title(scores.0, scores.1));
                }
            }
            WindowEvent::CloseRequested => {
                game.stop();
                target.exit();
            }
            _ => {}
        }
    })?;
    Ok(())
}

async fn arun_logged(config: GameConfig) {
    if let Err(err) = arun(config).await {
        log::error!("{err}");
    }
}

/// Opens a window and plays until it is closed.
pub fn run_with_config(config: GameConfig) {
    init_logging();
    log::info!("starting with {config:?}");

    #[cfg(not(target_arch = "wasm32"))]
    {
        pollster::block_on(arun_logged(config));
    }
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(arun_logged(config));
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen(start))]
pub fn run() {
    run_with_config(GameConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_shows_both_scores() {
        assert_eq!(window_title(3, 12), "Knot Runner | score 3 | best 12");
    }
}
