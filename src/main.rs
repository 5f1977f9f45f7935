#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use knot_runner::config::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, MIN_TICK_INTERVAL};
#[cfg(not(target_arch = "wasm32"))]
use knot_runner::GameConfig;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    /// Window width in pixels
    #[arg(long, default_value_t = DEFAULT_WINDOW_WIDTH)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = DEFAULT_WINDOW_HEIGHT)]
    height: u32,

    /// Seed for obstacle placement and start positions
    #[arg(long)]
    seed: Option<u64>,

    /// Windings of the tunnel knot around its axis of rotational symmetry
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
    knot_p: u32,

    /// Windings of the tunnel knot around the interior circle of the torus
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u32).range(1..))]
    knot_q: u32,

    #[arg(long, default_value_t = 5.0)]
    knot_radius: f32,

    /// Minimum time between simulation ticks
    #[arg(long, default_value_t = MIN_TICK_INTERVAL.as_millis() as u64)]
    min_tick_ms: u64,
}

#[cfg(not(target_arch = "wasm32"))]
impl Args {
    fn into_config(self) -> GameConfig {
        let mut config = GameConfig {
            seed: self.seed,
            window_width: self.width,
            window_height: self.height,
            min_tick_interval: std::time::Duration::from_millis(self.min_tick_ms),
            ..GameConfig::default()
        };
        config.curve.p = self.knot_p;
        config.curve.q = self.knot_q;
        config.curve.radius = self.knot_radius;
        config
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    let args = Args::parse();
    knot_runner::run_with_config(args.into_config());
}

// The web build starts from the library's wasm entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}
