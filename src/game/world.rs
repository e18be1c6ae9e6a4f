use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{
    GRAVITY, GROUND_Y, JUMP_VELOCITY, LAND_DURATION, OBS_H, OBS_W, OBSTACLE_FLOAT_CHANCE,
    OBSTACLE_FLOAT_OFFSETS, OBSTACLE_SPAWN_MARGIN, OBSTACLE_SPEED, PLAYER_H, PLAYER_W, PLAYER_X,
    WINDOW_WIDTH,
};

/// Integer screen-space hitbox. Positions are truncated toward zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn from_f32(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
            w: w as i32,
            h: h as i32,
        }
    }

    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Jump,
    Land,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub on_ground: bool,
    pub state: PlayerState,
    land_time_remaining: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            x: PLAYER_X,
            y: Self::ground_y(),
            vy: 0.0,
            on_ground: true,
            state: PlayerState::Idle,
            land_time_remaining: 0.0,
        }
    }

    #[inline(always)]
    fn ground_y() -> f32 {
        GROUND_Y - PLAYER_H
    }

    pub fn rect(&self) -> Rect {
        Rect::from_f32(self.x, self.y, PLAYER_W, PLAYER_H)
    }

    /// Starts a jump. Does nothing while airborne. Returns whether the jump started.
    pub fn try_jump(&mut self) -> bool {
        if !self.on_ground {
            return false;
        }
        self.vy = JUMP_VELOCITY;
        self.on_ground = false;
        self.state = PlayerState::Jump;
        self.land_time_remaining = 0.0;
        true
    }

    pub fn update(&mut self, dt: f32) {
        self.vy += GRAVITY * dt;
        self.y += self.vy * dt;

        let ground_y = Self::ground_y();
        if self.y >= ground_y {
            let landed = !self.on_ground;
            self.y = ground_y;
            self.vy = 0.0;
            self.on_ground = true;
            if landed {
                self.state = PlayerState::Land;
                self.land_time_remaining = LAND_DURATION;
            }
        } else {
            self.on_ground = false;
        }

        if self.state == PlayerState::Land {
            self.land_time_remaining -= dt;
            if self.land_time_remaining <= 0.0 {
                self.state = PlayerState::Idle;
                self.land_time_remaining = 0.0;
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[derive(Clone, Debug)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
}

impl Obstacle {
    /// Obstacle entering just past the right edge. Some float above the ground.
    pub fn spawn<R: Rng>(rng: &mut R) -> Self {
        let mut y = GROUND_Y - OBS_H;
        if rng.random_bool(OBSTACLE_FLOAT_CHANCE) {
            if let Some(offset) = OBSTACLE_FLOAT_OFFSETS.choose(rng) {
                y -= *offset;
            }
        }
        Self::at(WINDOW_WIDTH + OBSTACLE_SPAWN_MARGIN, y)
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_f32(self.x, self.y, OBS_W, OBS_H)
    }

    pub fn is_floating(&self) -> bool {
        self.y < GROUND_Y - OBS_H
    }

    pub fn update(&mut self, dt: f32) {
        self.x -= OBSTACLE_SPEED * dt;
    }

    pub fn is_offscreen(&self) -> bool {
        self.x + OBS_W < 0.0
    }
}

/// Index of the first obstacle overlapping the player, if any.
pub fn first_collision(player: &Player, obstacles: &[Obstacle]) -> Option<usize> {
    let hitbox = player.rect();
    obstacles.iter().position(|o| hitbox.intersects(&o.rect()))
}
