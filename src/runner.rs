//! Driving the world in real time
//!
//! [`FramePacer`] turns wall-clock frame times into a whole number of fixed
//! steps. [`BackgroundRunner`] runs that loop on its own thread and publishes
//! a snapshot after each batch of steps, so readers never hold the world lock
//! while they draw.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::WorldConfig;
use crate::error::Result;
use crate::sim::{World, WorldSnapshot};

/// Fixed-timestep accumulator
#[derive(Debug, Clone)]
pub struct FramePacer {
    fixed_dt: f32,
    time_scale: f32,
    dt_threshold: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FramePacer {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            fixed_dt: config.fixed_dt,
            time_scale: config.time_scale,
            dt_threshold: config.dt_threshold,
            max_substeps: config.max_substeps,
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// 0 pauses; values below 1 slow the simulation down
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }

    /// Fraction of a step left in the accumulator, for interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }

    /// Feed one frame's wall-clock seconds; returns how many steps to run
    ///
    /// A frame whose scaled time exceeds the threshold (a stall, a debugger
    /// pause) is dropped entirely.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        let scaled = elapsed * self.time_scale;
        if scaled > self.dt_threshold {
            log::debug!("Skipping {:.3}s frame (threshold {:.3}s)", scaled, self.dt_threshold);
            return 0;
        }
        self.accumulator += scaled;

        let mut substeps = 0;
        while self.accumulator >= self.fixed_dt && substeps < self.max_substeps {
            self.accumulator -= self.fixed_dt;
            substeps += 1;
        }
        // Drop the backlog rather than spiral
        if substeps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.fixed_dt);
        }
        substeps
    }

    /// Advance and step `world` accordingly
    pub fn run(&mut self, world: &mut World, elapsed: f32) -> u32 {
        let substeps = self.advance(elapsed);
        for _ in 0..substeps {
            world.step(self.fixed_dt);
        }
        substeps
    }
}

fn lock(world: &Mutex<World>) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Steps a world on a dedicated thread
pub struct BackgroundRunner {
    world: Arc<Mutex<World>>,
    snapshot: Arc<RwLock<WorldSnapshot>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BackgroundRunner {
    /// Move `world` onto a new physics thread paced by `config`
    pub fn spawn(world: World, config: &WorldConfig) -> Result<Self> {
        config.validate()?;
        let initial = world.snapshot();
        let world = Arc::new(Mutex::new(world));
        let snapshot = Arc::new(RwLock::new(initial));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let world = Arc::clone(&world);
            let snapshot = Arc::clone(&snapshot);
            let stop = Arc::clone(&stop);
            let mut pacer = FramePacer::new(config);
            thread::Builder::new()
                .name("physics".into())
                .spawn(move || physics_loop(&world, &snapshot, &stop, &mut pacer))?
        };
        log::info!("Physics thread started");

        Ok(Self {
            world,
            snapshot,
            stop,
            thread: Some(thread),
        })
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> WorldSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Locked access to the live world; stepping waits until `f` returns
    pub fn with_world<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut lock(&self.world))
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the thread and wait for it; safe to call more than once
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Physics thread panicked");
            } else {
                log::info!("Physics thread stopped");
            }
        }
    }
}

impl Drop for BackgroundRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn physics_loop(
    world: &Mutex<World>,
    snapshot: &RwLock<WorldSnapshot>,
    stop: &AtomicBool,
    pacer: &mut FramePacer,
) {
    let nap = Duration::from_secs_f32(pacer.fixed_dt() / 2.0);
    let mut last = Instant::now();
    while !stop.load(Ordering::Acquire) {
        let now = Instant::now();
        let elapsed = now.duration_since(last).as_secs_f32();
        last = now;

        let latest = {
            let mut world = lock(world);
            (pacer.run(&mut world, elapsed) > 0).then(|| world.snapshot())
        };
        if let Some(latest) = latest {
            *snapshot.write().unwrap_or_else(PoisonError::into_inner) = latest;
        }

        thread::sleep(nap);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::{Body, Shape};

    fn pacer(fixed_dt: f32, max_substeps: u32) -> FramePacer {
        FramePacer::new(&WorldConfig {
            fixed_dt,
            max_substeps,
            ..WorldConfig::default()
        })
    }

    #[test]
    fn test_pacer_accumulates() {
        let mut p = pacer(0.01, 8);
        assert_eq!(p.advance(0.025), 2);
        assert!((p.alpha() - 0.5).abs() < 1e-3);
        assert_eq!(p.advance(0.006), 1);
    }

    #[test]
    fn test_pacer_skips_slow_frames() {
        let mut p = pacer(0.01, 8);
        assert_eq!(p.advance(0.25), 0);
        assert_eq!(p.alpha(), 0.0);

        // Time scale counts toward the threshold
        p.set_time_scale(4.0);
        assert_eq!(p.advance(0.06), 0);
    }

    #[test]
    fn test_pacer_caps_substeps() {
        let mut p = pacer(0.01, 8);
        assert_eq!(p.advance(0.15), 8);
        assert!(p.alpha() <= 1.0);
    }

    #[test]
    fn test_pacer_pause() {
        let mut p = pacer(0.01, 8);
        p.set_time_scale(0.0);
        assert_eq!(p.advance(0.1), 0);
        p.set_time_scale(-3.0);
        assert_eq!(p.time_scale(), 0.0);
    }

    #[test]
    fn test_pacer_run_steps_world() {
        let mut p = pacer(0.01, 8);
        let mut world = World::default();
        assert_eq!(p.run(&mut world, 0.035), 3);
        assert_eq!(world.frame(), 3);
    }

    #[test]
    fn test_background_runner_publishes() {
        let mut world = World::default();
        let h = world.register(
            Body::builder(Shape::circle(Vec2::ZERO, 1.0).unwrap())
                .build()
                .unwrap(),
        );
        let mut runner = BackgroundRunner::spawn(world, &WorldConfig::default()).unwrap();
        assert!(runner.is_running());

        let deadline = Instant::now() + Duration::from_secs(5);
        while runner.snapshot().frame == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        let snap = runner.snapshot();
        assert!(snap.frame > 0);
        assert_eq!(snap.bodies[0].handle, h);

        runner.stop();
        assert!(!runner.is_running());
        let falling = runner.with_world(|w| w.get(h).unwrap().velocity.y);
        assert!(falling > 0.0);
        runner.stop();
    }
}
