//! Preset scenes
//!
//! Headless versions of the demo games. Layouts and body parameters follow
//! the games; simple AI stands in for keyboard and mouse input. All
//! randomness comes from a seeded PCG so a seed always replays the same run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::WorldConfig;
use crate::direction_between;
use crate::error::Result;
use crate::sim::{Axis, AxisHits, Body, BodyHandle, CollisionHooks, Shape, World};

/// Ball speed gained on every paddle return
pub const PONG_SPEED_GAIN: f32 = 20.0;
/// Vertical offset (in paddle half-heights) to velocity tilt
pub const ENGLISH_FACTOR: f32 = 0.75;
/// Upper bound on the tilt a paddle can put on the ball
pub const MAX_ENGLISH: f32 = 1.0;
/// Upward velocity added by a platformer hop (pixels/s)
pub const JUMP_SPEED: f32 = 300.0;
/// Attractiveness of the gravity well's centre
pub const WELL_STRENGTH: f32 = 1.0e7;

/// Available preset scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Pong,
    Football,
    Platformer,
    GravityWell,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::Pong,
        Scenario::Football,
        Scenario::Platformer,
        Scenario::GravityWell,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Pong => "pong",
            Scenario::Football => "football",
            Scenario::Platformer => "platformer",
            Scenario::GravityWell => "well",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pong" => Some(Scenario::Pong),
            "football" | "soccer" => Some(Scenario::Football),
            "platformer" => Some(Scenario::Platformer),
            "well" | "gravity-well" | "gravity_well" => Some(Scenario::GravityWell),
            _ => None,
        }
    }

    /// Screen size in pixels
    pub fn size(&self) -> Vec2 {
        match self {
            Scenario::Football => Vec2::new(600.0, 480.0),
            _ => Vec2::new(800.0, 600.0),
        }
    }

    /// Apply the scene's own world settings on top of `base`
    pub fn world_config(&self, base: &WorldConfig) -> WorldConfig {
        let mut config = base.clone();
        config.resistance = Vec2::ZERO;
        match self {
            Scenario::Pong => {
                config.gravity_magnitude = 0.0;
                config.time_scale = 2.0;
            }
            Scenario::Football => {
                config.gravity_magnitude = 0.0;
                config.time_scale = 0.7;
            }
            Scenario::Platformer => {
                // A player of radius 25 is 1.7 m tall
                config.pixels_per_metre = 50.0 / 1.7;
            }
            Scenario::GravityWell => {
                config.gravity_magnitude = 0.0;
            }
        }
        config
    }

    pub fn build(self, base: &WorldConfig, seed: u64) -> Result<Scene> {
        let config = self.world_config(base);
        let world = World::try_new(&config)?;

        let mut scene = Scene {
            scenario: self,
            world,
            size: self.size(),
            balls: Vec::new(),
            players: Vec::new(),
            score: [0, 0],
            grounded: None,
            ball_spawn: self.size() / 2.0,
            ball_speed: 0.0,
            player_speed: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        match self {
            Scenario::Pong => scene.setup_pong()?,
            Scenario::Football => scene.setup_football()?,
            Scenario::Platformer => scene.setup_platformer()?,
            Scenario::GravityWell => scene.setup_well()?,
        }
        log::info!(
            "Built {} scene with {} bodies (seed {})",
            self.name(),
            scene.world.len(),
            seed
        );
        Ok(scene)
    }
}

/// Sends the ball back away from a paddle, tilted by where it struck
struct PaddleEnglish {
    /// +1 sends the ball right, -1 left
    side: f32,
}

impl CollisionHooks for PaddleEnglish {
    fn on_other_collision(&mut self, own: &mut Body, mover: &mut Body, _axis: Axis) {
        if !mover.collider().is_circle() {
            return;
        }
        let half_height = own.collider().as_rect().map_or(1.0, |r| r.size.y / 2.0);
        let offset = (mover.collider().centre().y - own.collider().centre().y) / half_height;
        let english = (offset * ENGLISH_FACTOR).clamp(-MAX_ENGLISH, MAX_ENGLISH);
        let speed = mover.velocity.length() + PONG_SPEED_GAIN;
        mover.velocity = Vec2::new(self.side, english).normalize() * speed;
    }
}

/// Flags contact with an immobile body below the owner's centre
struct GroundSensor {
    grounded: Arc<AtomicBool>,
}

impl CollisionHooks for GroundSensor {
    fn on_own_collision(&mut self, own: &mut Body, hits: &AxisHits, world: &World) {
        let feet = own.collider().centre().y;
        let landed = hits
            .iter()
            .filter_map(|h| world.get(h))
            .any(|b| b.is_immobile() && b.collider().bounds().0.y > feet);
        if landed {
            self.grounded.store(true, Ordering::Relaxed);
        }
    }
}

/// A built preset: the world plus the handles its driver needs
pub struct Scene {
    pub scenario: Scenario,
    pub world: World,
    pub size: Vec2,
    pub balls: Vec<BodyHandle>,
    /// Paddles or players, left side first
    pub players: Vec<BodyHandle>,
    /// Goals scored by the left and right side
    pub score: [u32; 2],
    grounded: Option<Arc<AtomicBool>>,
    ball_spawn: Vec2,
    ball_speed: f32,
    player_speed: f32,
    rng: Pcg32,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("scenario", &self.scenario)
            .field("world", &self.world)
            .field("score", &self.score)
            .finish()
    }
}

impl Scene {
    /// Drive the AI, step the world, then respawn anything that left the screen
    pub fn step(&mut self, dt: f32) {
        self.drive();
        self.world.step(dt);
        self.respawn_escaped();
    }

    /// Whether the platformer player is standing on something
    pub fn is_grounded(&self) -> bool {
        self.grounded
            .as_ref()
            .is_some_and(|g| g.load(Ordering::Relaxed))
    }

    /// Put every ball whose centre left the screen back at its spawn point
    ///
    /// Pong and football count a goal for the side the ball escaped past.
    pub fn respawn_escaped(&mut self) -> usize {
        let mut respawned = 0;
        for i in 0..self.balls.len() {
            let handle = self.balls[i];
            let Some(centre) = self.world.get(handle).map(|b| b.collider().centre()) else {
                continue;
            };
            if self.on_screen(centre) {
                continue;
            }

            match self.scenario {
                Scenario::Pong | Scenario::Football => {
                    if centre.x < 0.0 {
                        self.score[1] += 1;
                    } else if centre.x > self.size.x {
                        self.score[0] += 1;
                    }
                }
                _ => {}
            }

            let (position, velocity) = self.spawn_state();
            if let Some(ball) = self.world.get_mut(handle) {
                ball.set_position(position);
                ball.velocity = velocity;
            }
            log::debug!("Respawned {} at {}", handle, position);
            respawned += 1;
        }
        respawned
    }

    fn on_screen(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x < self.size.x && point.y < self.size.y
    }

    fn spawn_state(&mut self) -> (Vec2, Vec2) {
        match self.scenario {
            Scenario::Pong => (self.ball_spawn, self.serve()),
            Scenario::Football => (self.ball_spawn, self.random_direction() * self.ball_speed),
            _ => self.random_orbit(),
        }
    }

    fn serve(&mut self) -> Vec2 {
        let side = if self.rng.random_bool(0.5) { -1.0 } else { 1.0 };
        Vec2::new(side * self.ball_speed, 0.0)
    }

    fn random_direction(&mut self) -> Vec2 {
        loop {
            let v = Vec2::new(self.rng.random_range(-1.0..1.0), self.rng.random_range(-1.0..1.0));
            if let Some(dir) = v.try_normalize() {
                return dir;
            }
        }
    }

    /// Position and circular-orbit velocity around the screen centre
    fn random_orbit(&mut self) -> (Vec2, Vec2) {
        let centre = self.size / 2.0;
        let radius = self.rng.random_range(100.0..250.0_f32);
        let theta = self.rng.random_range(0.0..std::f32::consts::TAU);
        let offset = Vec2::from_angle(theta) * radius;
        let speed = (WELL_STRENGTH / radius).sqrt();
        (centre + offset, offset.perp().normalize() * speed)
    }

    fn drive(&mut self) {
        match self.scenario {
            Scenario::Pong => self.drive_paddles(),
            Scenario::Football => self.drive_players(),
            Scenario::Platformer => self.drive_jumper(),
            Scenario::GravityWell => {}
        }
    }

    /// Paddles track the ball vertically
    fn drive_paddles(&mut self) {
        let Some(target) = self.first_ball_centre() else {
            return;
        };
        for &handle in &self.players {
            if let Some(paddle) = self.world.get_mut(handle) {
                let mut dir = direction_between(paddle.collider().centre(), target);
                dir.x = 0.0;
                paddle.velocity = dir.normalize_or_zero() * self.player_speed;
            }
        }
    }

    /// Players chase the ball
    fn drive_players(&mut self) {
        let Some(target) = self.first_ball_centre() else {
            return;
        };
        for &handle in &self.players {
            if let Some(player) = self.world.get_mut(handle) {
                player.velocity = direction_between(player.collider().centre(), target) * self.player_speed;
            }
        }
    }

    /// The player hops whenever it lands
    fn drive_jumper(&mut self) {
        let landed = self
            .grounded
            .as_ref()
            .is_some_and(|g| g.swap(false, Ordering::Relaxed));
        if !landed {
            return;
        }
        if let Some(player) = self.players.first().and_then(|&h| self.world.get_mut(h)) {
            player.velocity.x = 0.0;
            player.velocity.y -= JUMP_SPEED;
        }
    }

    fn first_ball_centre(&self) -> Option<Vec2> {
        self.balls
            .first()
            .and_then(|&h| self.world.get(h))
            .map(|b| b.collider().centre())
    }

    fn add_bound(&mut self, origin: Vec2, size: Vec2, bounciness: f32) -> Result<BodyHandle> {
        self.world.spawn(
            Body::builder(Shape::rect(origin, size)?)
                .immobile(true)
                .bounciness(bounciness),
        )
    }

    fn setup_pong(&mut self) -> Result<()> {
        let Vec2 { x: w, y: h } = self.size;
        self.ball_speed = 300.0;
        self.player_speed = 300.0;

        let paddle_size = Vec2::new(20.0, w / 6.0);
        for (x, side) in [(w / 8.0, 1.0), (w * 7.0 / 8.0, -1.0)] {
            let origin = Vec2::new(x, (h - paddle_size.y) / 2.0);
            let paddle = self.world.spawn(
                Body::builder(Shape::rect(origin, paddle_size)?)
                    .kinematic(true)
                    .hooks(Box::new(PaddleEnglish { side })),
            )?;
            self.players.push(paddle);
        }

        let velocity = self.serve();
        let ball = self.world.spawn(
            Body::builder(Shape::circle(self.ball_spawn, 5.0)?).velocity(velocity),
        )?;
        self.balls.push(ball);

        self.add_bound(Vec2::new(0.0, -100.0), Vec2::new(w, 100.0), 1.0)?;
        self.add_bound(Vec2::new(0.0, h), Vec2::new(w, 100.0), 1.0)?;
        Ok(())
    }

    fn setup_football(&mut self) -> Result<()> {
        let Vec2 { x: w, y: h } = self.size;
        self.ball_speed = 200.0;
        self.player_speed = 400.0;

        let radius = 15.0;
        for x in [w / 8.0, w * 7.0 / 8.0] {
            let player = self
                .world
                .spawn(Body::builder(Shape::circle(Vec2::new(x, h / 2.0 - radius), radius)?))?;
            self.players.push(player);
        }

        let ball = self.world.spawn(
            Body::builder(Shape::circle(self.ball_spawn, 7.0)?)
                .density(4.0)
                .bounciness(1.0),
        )?;
        self.balls.push(ball);

        // Pitch edges with a goal mouth in the middle third of each end
        let third = h / 3.0;
        let walls = [
            (Vec2::new(20.0, -1000.0), Vec2::new(w - 20.0, 1020.0)),
            (Vec2::new(-1000.0, 0.0), Vec2::new(1020.0, third)),
            (Vec2::new(-1000.0, 2.0 * third), Vec2::new(1020.0, third)),
            (Vec2::new(w - 20.0, 0.0), Vec2::new(1020.0, third)),
            (Vec2::new(w - 20.0, 2.0 * third), Vec2::new(1020.0, third)),
            (Vec2::new(20.0, h - 20.0), Vec2::new(w - 20.0, 1020.0)),
        ];
        for (origin, size) in walls {
            self.add_bound(origin, size, 1.0)?;
        }
        Ok(())
    }

    fn setup_platformer(&mut self) -> Result<()> {
        let Vec2 { x: w, y: h } = self.size;
        self.player_speed = 200.0;

        let grounded = Arc::new(AtomicBool::new(false));
        let player = self.world.spawn(
            Body::builder(Shape::circle(Vec2::new(w / 2.0, h / 2.0), 25.0)?).hooks(Box::new(GroundSensor {
                grounded: grounded.clone(),
            })),
        )?;
        self.players.push(player);
        self.grounded = Some(grounded);

        for _ in 0..3 {
            let centre = Vec2::new(self.rng.random_range(0.0..w), self.rng.random_range(0.0..h / 3.0));
            let ball = self.world.spawn(
                Body::builder(Shape::circle(centre, 12.0)?)
                    .bounciness(0.9)
                    .density(2.0),
            )?;
            self.balls.push(ball);
        }

        let platforms = [
            (Vec2::new(100.0, 400.0), Vec2::new(400.0, 100.0), 0.3, 0.0),
            (Vec2::new(-400.0, 500.0), Vec2::new(400.0, 100.0), 0.3, 0.0),
            (Vec2::new(600.0, 500.0), Vec2::new(400.0, 100.0), 0.3, 0.0),
            (Vec2::new(800.0, 200.0), Vec2::new(80.0, 80.0), 0.3, WELL_STRENGTH),
            (Vec2::new(650.0, 200.0), Vec2::new(80.0, 80.0), 0.3, WELL_STRENGTH),
            (Vec2::new(-800.0, 500.0), Vec2::new(200.0, 80.0), 1.0, 0.0),
        ];
        for (origin, size, bounciness, attractiveness) in platforms {
            self.world.spawn(
                Body::builder(Shape::rect(origin, size)?)
                    .immobile(true)
                    .bounciness(bounciness)
                    .attractiveness(attractiveness),
            )?;
        }
        Ok(())
    }

    fn setup_well(&mut self) -> Result<()> {
        let centre = self.size / 2.0;
        self.world.spawn(
            Body::builder(Shape::circle(centre, 30.0)?)
                .immobile(true)
                .attractiveness(WELL_STRENGTH),
        )?;

        for _ in 0..8 {
            let (position, velocity) = self.random_orbit();
            let orbiter = self.world.spawn(
                Body::builder(Shape::circle(position, 6.0)?)
                    .velocity(velocity)
                    .bounciness(0.8),
            )?;
            self.balls.push(orbiter);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::parse(scenario.name()), Some(scenario));
        }
        assert_eq!(Scenario::parse("Gravity-Well"), Some(Scenario::GravityWell));
        assert_eq!(Scenario::parse("tetris"), None);
    }

    #[test]
    fn test_world_config_overrides() {
        let base = WorldConfig::default();
        assert_eq!(Scenario::Pong.world_config(&base).gravity(), Vec2::ZERO);
        assert_eq!(Scenario::Pong.world_config(&base).time_scale, 2.0);
        let platformer = Scenario::Platformer.world_config(&base);
        assert!(platformer.gravity().y > 0.0);
        assert!((platformer.pixels_per_metre - 50.0 / 1.7).abs() < 1e-4);
    }

    #[test]
    fn test_build_all() {
        for scenario in Scenario::ALL {
            let scene = scenario.build(&WorldConfig::default(), 7).unwrap();
            assert!(!scene.world.is_empty(), "{} is empty", scenario.name());
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let mut scene = Scenario::GravityWell.build(&WorldConfig::default(), seed).unwrap();
            for _ in 0..60 {
                scene.step(1.0 / 120.0);
            }
            // Collider ids are process-wide, so compare geometry and motion only
            scene
                .world
                .iter()
                .map(|(_, b)| (*b.collider().kind(), b.velocity))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_pong_serve_is_horizontal() {
        let scene = Scenario::Pong.build(&WorldConfig::default(), 1).unwrap();
        let ball = scene.world.get(scene.balls[0]).unwrap();
        assert_eq!(ball.velocity.y, 0.0);
        assert_eq!(ball.velocity.x.abs(), 300.0);
        assert_eq!(scene.players.len(), 2);
    }

    #[test]
    fn test_escaped_ball_scores_and_respawns() {
        let mut scene = Scenario::Pong.build(&WorldConfig::default(), 3).unwrap();
        let ball = scene.balls[0];
        scene.world.get_mut(ball).unwrap().set_position(Vec2::new(-50.0, 300.0));

        assert_eq!(scene.respawn_escaped(), 1);
        assert_eq!(scene.score, [0, 1]);
        assert_eq!(scene.world.get(ball).unwrap().collider().centre(), Vec2::new(400.0, 300.0));
        assert_eq!(scene.respawn_escaped(), 0);
    }

    #[test]
    fn test_paddle_english() {
        let mut hooks = PaddleEnglish { side: 1.0 };
        let mut paddle = Body::builder(Shape::rect(Vec2::ZERO, Vec2::new(20.0, 100.0)).unwrap())
            .kinematic(true)
            .build()
            .unwrap();
        let mut ball = Body::builder(Shape::circle(Vec2::new(25.0, 50.0), 5.0).unwrap())
            .velocity(Vec2::new(-100.0, 0.0))
            .build()
            .unwrap();

        hooks.on_other_collision(&mut paddle, &mut ball, Axis::X);

        // Struck dead centre: straight back, a little faster
        assert!((ball.velocity - Vec2::new(120.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_platformer_player_lands() {
        let mut scene = Scenario::Platformer.build(&WorldConfig::default(), 5).unwrap();
        let player = scene.players[0];
        let mut landed = false;
        for _ in 0..240 {
            scene.world.step(1.0 / 120.0);
            if scene.is_grounded() {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(scene.world.get(player).unwrap().collider().centre().y < 400.0);
    }
}
