//! Collaborator interfaces
//!
//! The simulation never renders, plays audio, or reads devices itself. It
//! queues requests as [`GameEvent`](crate::sim::GameEvent)s and polls input
//! through [`InputSource`]; the host forwards events to whatever implements
//! these traits.

use glam::Vec3;

/// Visual effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Asteroid explosion particles
    AsteroidExplosion,
    /// Ship destruction burst
    ShipExplosion,
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Bullet fired
    Shoot,
    /// Asteroid destroyed
    AsteroidExplosion,
    /// Ship destroyed
    ShipExplosion,
    /// Ship teleported
    Teleport,
    /// Ship reappeared after dying
    Respawn,
}

/// Fire-and-forget visual/audio playback
pub trait EffectSink {
    fn play_effect(&mut self, kind: EffectKind, position: Vec3);
    fn play_sound(&mut self, sound: SoundEffect);
    /// Drop the trail attached to an entity (after wrapping or teleporting)
    fn clear_trail(&mut self, _entity: u32) {}
}

/// Score display collaborator; the core never reads the total back
pub trait ScoreSink {
    fn add_score(&mut self, points: u32);
}

/// Logical input actions, polled once per frame tick
pub trait InputSource {
    /// Rotation axis in [-1, 1]
    fn rotate_axis(&self) -> f32;
    fn thrust_held(&self) -> bool;
    /// True only on the frame the button went down
    fn shoot_pressed(&self) -> bool;
    /// True only on the frame the button went down
    fn teleport_pressed(&self) -> bool;
}

/// Camera-derived arena size
pub trait ArenaBounds {
    fn visible_half_extent(&self) -> f32;
}

/// Arena with a constant half-extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBounds(pub f32);

impl ArenaBounds for FixedBounds {
    fn visible_half_extent(&self) -> f32 {
        self.0
    }
}

/// Input snapshot for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub rotate: f32,
    pub thrust: bool,
    pub shoot: bool,
    pub teleport: bool,
}

impl InputSource for FrameInput {
    fn rotate_axis(&self) -> f32 {
        self.rotate.clamp(-1.0, 1.0)
    }

    fn thrust_held(&self) -> bool {
        self.thrust
    }

    fn shoot_pressed(&self) -> bool {
        self.shoot
    }

    fn teleport_pressed(&self) -> bool {
        self.teleport
    }
}

/// Effect sink that only logs requests (headless runs)
#[derive(Debug, Default)]
pub struct LogEffects {
    pub effects_played: u32,
    pub sounds_played: u32,
}

impl EffectSink for LogEffects {
    fn play_effect(&mut self, kind: EffectKind, position: Vec3) {
        self.effects_played += 1;
        log::debug!("effect {:?} at ({:.2}, {:.2})", kind, position.x, position.z);
    }

    fn play_sound(&mut self, sound: SoundEffect) {
        self.sounds_played += 1;
        log::trace!("sound {:?}", sound);
    }

    fn clear_trail(&mut self, entity: u32) {
        log::trace!("trail cleared for entity {}", entity);
    }
}

/// Running score total that logs each display update
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBoard {
    pub score: u64,
}

impl ScoreSink for ScoreBoard {
    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(u64::from(points));
        log::info!("Score: {}", self.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_input_clamps_axis() {
        let input = FrameInput {
            rotate: 3.0,
            ..Default::default()
        };
        assert_eq!(input.rotate_axis(), 1.0);
    }

    #[test]
    fn test_score_board_accumulates() {
        let mut board = ScoreBoard::default();
        board.add_score(20);
        board.add_score(50);
        assert_eq!(board.score, 70);
    }
}
