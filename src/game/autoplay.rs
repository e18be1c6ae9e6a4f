use crate::config::{OBSTACLE_SPEED, PLAYER_W};
use crate::game::gameplay::Session;

/// Jump bot used by the headless driver.
///
/// Only grounded obstacles need clearing; a raised obstacle's bottom edge sits
/// at or above the standing player's head. Within the lead window the bot
/// waits for a beat so its jumps score, and jumps anyway once contact is close.
#[derive(Copy, Clone, Debug)]
pub struct Autoplay {
    /// Earliest time-to-contact, in seconds, at which a jump still clears the obstacle.
    pub lead_max: f32,
    /// Time-to-contact below which the bot jumps regardless of the beat.
    pub emergency: f32,
}

impl Default for Autoplay {
    fn default() -> Self {
        Self {
            lead_max: 0.45,
            emergency: 0.12,
        }
    }
}

impl Autoplay {
    pub fn new(lead_max: f32, emergency: f32) -> Self {
        Self {
            lead_max: lead_max.max(emergency),
            emergency,
        }
    }

    /// Seconds until the nearest grounded obstacle ahead reaches the player.
    pub fn time_to_contact(session: &Session) -> Option<f32> {
        let front = session.player().x + PLAYER_W;
        session
            .obstacles()
            .iter()
            .filter(|o| !o.is_floating() && o.x >= front)
            .map(|o| (o.x - front) / OBSTACLE_SPEED)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn wants_jump(&self, session: &Session) -> bool {
        if !session.player().on_ground {
            return false;
        }
        let Some(tc) = Self::time_to_contact(session) else {
            return false;
        };
        if tc > self.lead_max {
            return false;
        }
        if tc <= self.emergency {
            return true;
        }
        session
            .clock()
            .is_on_beat(session.settings().tolerances.perfect)
    }
}
