use std::time::Duration;
use web_time::Instant;

use crate::ride::RideController;
use crate::scene::SceneView;

/// Asks the host for another frame callback.
pub trait TickScheduler {
    fn request_tick(&mut self);
}

impl<F: FnMut()> TickScheduler for F {
    fn request_tick(&mut self) {
        self()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Turns host frame callbacks into simulation steps no shorter than
/// `min_interval`. Callbacks arriving sooner are coalesced into the next one.
#[derive(Debug)]
pub struct FrameClock {
    min_interval: Duration,
    last_tick: Option<Instant>,
}

impl FrameClock {
    pub fn new(min_interval: Duration) -> Self {
        FrameClock {
            min_interval,
            last_tick: None,
        }
    }

    /// Seconds to simulate for a callback at `now`, or `None` when the
    /// callback is coalesced. The first callback only primes the clock.
    pub fn advance(&mut self, now: Instant) -> Option<f32> {
        let Some(last) = self.last_tick else {
            self.last_tick = Some(now);
            return None;
        };
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_interval {
            return None;
        }
        self.last_tick = Some(now);
        Some(elapsed.as_secs_f32())
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}

/// Drives a ride from host frame callbacks: one tick, then one draw, then a
/// request for the next callback while running.
pub struct GameLoop<S> {
    ride: RideController,
    clock: FrameClock,
    scheduler: S,
    running: bool,
}

impl<S: TickScheduler> GameLoop<S> {
    pub fn new(ride: RideController, min_interval: Duration, scheduler: S) -> Self {
        GameLoop {
            ride,
            clock: FrameClock::new(min_interval),
            scheduler,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.clock.reset();
        self.scheduler.request_tick();
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_frame<V: SceneView + ?Sized>(&mut self, now: Instant, view: &mut V) -> LoopControl {
        if !self.running {
            return LoopControl::Stop;
        }
        match self.clock.advance(now) {
            Some(dt) => {
                self.ride.tick(dt);
                view.draw(&self.ride.scene());
            }
            None => log::trace!("coalescing frame callback"),
        }
        self.scheduler.request_tick();
        LoopControl::Continue
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.ride.on_pointer_move(x, y);
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.ride.on_pointer_down(x, y);
    }

    pub fn on_resize(&mut self, width: f32, height: f32) {
        self.ride.on_resize(width, height);
    }

    pub fn ride(&self) -> &RideController {
        &self.ride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::scene::SceneSnapshot;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingView {
        frames: Vec<SceneSnapshot>,
    }

    impl SceneView for RecordingView {
        fn draw(&mut self, scene: &SceneSnapshot) {
            self.frames.push(scene.clone());
        }
    }

    fn game(requests: Rc<Cell<u32>>) -> GameLoop<impl TickScheduler> {
        let config = GameConfig {
            seed: Some(99),
            ..GameConfig::default()
        };
        GameLoop::new(
            RideController::from_config(&config),
            config.min_tick_interval,
            move || requests.set(requests.get() + 1),
        )
    }

    #[test]
    fn clock_primes_then_enforces_the_minimum_interval() {
        let mut clock = FrameClock::new(Duration::from_millis(15));
        let t0 = Instant::now();
        assert_eq!(clock.advance(t0), None);
        assert_eq!(clock.advance(t0 + Duration::from_millis(10)), None);
        let dt = clock.advance(t0 + Duration::from_millis(20)).unwrap();
        assert!((dt - 0.020).abs() < 1e-6);
        // Coalesced callbacks do not move the reference point.
        assert_eq!(clock.advance(t0 + Duration::from_millis(30)), None);
        let dt = clock.advance(t0 + Duration::from_millis(36)).unwrap();
        assert!((dt - 0.016).abs() < 1e-6);
    }

    #[test]
    fn long_stalls_are_passed_through() {
        let mut clock = FrameClock::new(Duration::from_millis(15));
        let t0 = Instant::now();
        clock.advance(t0);
        let dt = clock.advance(t0 + Duration::from_secs(2)).unwrap();
        assert!((dt - 2.0).abs() < 1e-6);
    }

    #[test]
    fn each_frame_requests_the_next_one_until_stopped() {
        let requests = Rc::new(Cell::new(0));
        let mut game = game(requests.clone());
        let mut view = RecordingView::default();
        let t0 = Instant::now();

        assert_eq!(game.on_frame(t0, &mut view), LoopControl::Stop);
        assert_eq!(requests.get(), 0);

        game.start();
        assert_eq!(requests.get(), 1);
        assert_eq!(game.on_frame(t0, &mut view), LoopControl::Continue);
        assert_eq!(game.on_frame(t0 + Duration::from_millis(5), &mut view), LoopControl::Continue);
        assert_eq!(game.on_frame(t0 + Duration::from_millis(20), &mut view), LoopControl::Continue);
        assert_eq!(requests.get(), 4);
        assert_eq!(view.frames.len(), 1);

        game.stop();
        assert_eq!(game.on_frame(t0 + Duration::from_millis(40), &mut view), LoopControl::Stop);
        assert_eq!(requests.get(), 4);
        assert_eq!(view.frames.len(), 1);
    }

    #[test]
    fn input_reaches_the_ride_and_shows_up_in_the_scene() {
        let requests = Rc::new(Cell::new(0));
        let mut game = game(requests);
        let mut view = RecordingView::default();
        game.on_resize(640.0, 480.0);
        game.start();
        game.on_pointer_down(320.0, 100.0);
        assert!(game.ride().is_playing());
        assert!((game.ride().state().player_angle + std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let t0 = Instant::now();
        game.on_frame(t0, &mut view);
        game.on_frame(t0 + Duration::from_millis(16), &mut view);
        let scene = view.frames.last().unwrap();
        assert!(scene.playing);
        assert_eq!(scene.renderables.len(), 11);
    }
}
