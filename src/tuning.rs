//! Data-driven game balance
//!
//! Every section defaults to the values the arena was balanced with, so a
//! tuning file only needs the keys it wants to override.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{AsteroidSize, FlowPreset, FlowTarget};

/// Errors raised while loading or validating a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Physical parameters shared by every moving entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyTuning {
    /// Multiplier applied to every injected force
    pub acceleration_scalar: f32,
    /// Velocity magnitude cap
    pub max_velocity: f32,
    /// Collision radius on the plane
    pub radius: f32,
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            acceleration_scalar: 1.0,
            max_velocity: 1.0,
            radius: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    /// Visible half-extent used when no camera collaborator is attached
    pub half_extent: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self { half_extent: 10.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceshipTuning {
    pub body: BodyTuning,
    /// Turn rate (degrees per input step, also used as the slerp rate)
    pub rotation_speed: f32,
    /// Distance ahead of the ship where bullets appear
    pub shoot_offset: f32,
    /// Minimum seconds between shots
    pub shoot_cooldown: f32,
    /// Linear drag while coasting
    pub idle_drag: f32,
    /// Linear drag while thrusting
    pub thrust_drag: f32,
    /// Seconds hidden before reappearing
    pub respawn_delay: f32,
    /// Seconds of post-respawn invincibility
    pub invincibility_duration: f32,
    /// Seconds between blink toggles while invincible
    pub blink_interval: f32,
    /// Required distance from every live asteroid when respawning
    pub respawn_clearance: f32,
}

impl Default for SpaceshipTuning {
    fn default() -> Self {
        Self {
            body: BodyTuning {
                acceleration_scalar: 0.2,
                max_velocity: 8.0,
                radius: 0.5,
            },
            rotation_speed: 10.0,
            shoot_offset: 1.0,
            shoot_cooldown: 0.2,
            idle_drag: 0.5,
            thrust_drag: 0.1,
            respawn_delay: 1.5,
            invincibility_duration: 2.0,
            blink_interval: 0.1,
            respawn_clearance: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub body: BodyTuning,
    /// Seconds before a bullet expires on its own
    pub lifetime: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            body: BodyTuning {
                acceleration_scalar: 15.0,
                max_velocity: 15.0,
                radius: 0.15,
            },
            lifetime: 1.0,
        }
    }
}

/// What a dying asteroid breaks into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicationTuning {
    /// Size class of the children
    pub child: AsteroidSize,
    /// Number of children spawned on death
    pub count: u32,
    /// Bias children away from the shooter
    pub easy_duplication: bool,
    /// Random directions whose dot with the bullet direction falls below this are dropped
    pub dot_offset: f32,
    /// Child velocity scale used when a big asteroid splits
    pub min_velocity_multiplier: f32,
    /// Child velocity scale used when a medium asteroid splits
    pub max_velocity_multiplier: f32,
}

impl Default for DuplicationTuning {
    fn default() -> Self {
        Self {
            child: AsteroidSize::Small,
            count: 2,
            easy_duplication: true,
            dot_offset: -0.8,
            min_velocity_multiplier: 2.0,
            max_velocity_multiplier: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidTuning {
    pub body: BodyTuning,
    /// Score awarded when shot
    pub points: u32,
    /// Upper bound of the random acceleration-scalar adjustment at creation (0..=1)
    pub acceleration_randomization: f32,
    /// Split behaviour; `None` for asteroids that never split
    pub duplication: Option<DuplicationTuning>,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        Self {
            body: BodyTuning::default(),
            points: 100,
            acceleration_randomization: 0.5,
            duplication: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidsTuning {
    pub small: AsteroidTuning,
    pub medium: AsteroidTuning,
    pub big: AsteroidTuning,
    /// Seconds between a lethal hit and final removal (effect playback window)
    pub destroy_delay: f32,
}

impl Default for AsteroidsTuning {
    fn default() -> Self {
        Self {
            small: AsteroidTuning {
                body: BodyTuning {
                    acceleration_scalar: 2.0,
                    max_velocity: 6.0,
                    radius: 0.4,
                },
                points: 100,
                acceleration_randomization: 0.5,
                duplication: None,
            },
            medium: AsteroidTuning {
                body: BodyTuning {
                    acceleration_scalar: 1.5,
                    max_velocity: 4.0,
                    radius: 0.8,
                },
                points: 50,
                acceleration_randomization: 0.5,
                duplication: Some(DuplicationTuning {
                    child: AsteroidSize::Small,
                    ..DuplicationTuning::default()
                }),
            },
            big: AsteroidTuning {
                body: BodyTuning {
                    acceleration_scalar: 1.0,
                    max_velocity: 3.0,
                    radius: 1.4,
                },
                points: 20,
                acceleration_randomization: 0.5,
                duplication: Some(DuplicationTuning {
                    child: AsteroidSize::Medium,
                    ..DuplicationTuning::default()
                }),
            },
            destroy_delay: 1.0,
        }
    }
}

impl AsteroidsTuning {
    /// Tuning for a size class
    pub fn for_size(&self, size: AsteroidSize) -> &AsteroidTuning {
        match size {
            AsteroidSize::Small => &self.small,
            AsteroidSize::Medium => &self.medium,
            AsteroidSize::Big => &self.big,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorTuning {
    /// Concurrent live asteroid cap
    pub max_asteroids_on_screen: usize,
    /// Total top-level asteroids ever spawned
    pub asteroids_to_spawn: u32,
    /// Initial seconds between top-level spawns
    pub initial_spawn_delay: f32,
    /// Floor the spawn delay approaches
    pub min_spawn_delay: f32,
    /// Amount the delay shrinks after each spawn
    pub spawn_delay_step: f32,
    /// Minimum distance from the ship for top-level spawns
    pub spawn_clearance: f32,
}

impl Default for DirectorTuning {
    fn default() -> Self {
        Self {
            max_asteroids_on_screen: 6,
            asteroids_to_spawn: 20,
            initial_spawn_delay: 2.0,
            min_spawn_delay: 0.75,
            spawn_delay_step: 0.1,
            spawn_clearance: 4.0,
        }
    }
}

/// Per-entity-type force scales for flow field zones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceMultipliers {
    pub spaceship: f32,
    pub big_asteroid: f32,
    pub medium_asteroid: f32,
    pub small_asteroid: f32,
}

impl Default for ForceMultipliers {
    fn default() -> Self {
        Self {
            spaceship: 1.0,
            big_asteroid: 1.0,
            medium_asteroid: 1.0,
            small_asteroid: 1.0,
        }
    }
}

impl ForceMultipliers {
    /// Multiplier for an asteroid size class
    pub fn for_size(&self, size: AsteroidSize) -> f32 {
        match size {
            AsteroidSize::Small => self.small_asteroid,
            AsteroidSize::Medium => self.medium_asteroid,
            AsteroidSize::Big => self.big_asteroid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTuning {
    /// Zones per side of the square grid covering the arena
    pub grid_size: u32,
    pub multipliers: ForceMultipliers,
    /// Noise offset step for the wave preset
    pub wave_step: f32,
    /// Preset applied when the simulation starts
    pub preset: FlowPreset,
    /// Moving point followed by the target presets
    pub target: FlowTarget,
}

impl Default for FlowTuning {
    fn default() -> Self {
        Self {
            grid_size: 10,
            multipliers: ForceMultipliers::default(),
            wave_step: 0.03,
            preset: FlowPreset::None,
            target: FlowTarget::default(),
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub spaceship: SpaceshipTuning,
    pub bullet: BulletTuning,
    pub asteroids: AsteroidsTuning,
    pub director: DirectorTuning,
    pub flow: FlowTuning,
}

impl Tuning {
    /// Parse and validate tuning from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Check every value the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("arena.half_extent", self.arena.half_extent)?;

        check_body("spaceship.body", &self.spaceship.body)?;
        positive("spaceship.blink_interval", self.spaceship.blink_interval)?;
        non_negative("spaceship.shoot_cooldown", self.spaceship.shoot_cooldown)?;
        non_negative("spaceship.respawn_delay", self.spaceship.respawn_delay)?;
        non_negative("spaceship.invincibility_duration", self.spaceship.invincibility_duration)?;
        non_negative("spaceship.respawn_clearance", self.spaceship.respawn_clearance)?;
        non_negative("spaceship.idle_drag", self.spaceship.idle_drag)?;
        non_negative("spaceship.thrust_drag", self.spaceship.thrust_drag)?;

        check_body("bullet.body", &self.bullet.body)?;
        positive("bullet.lifetime", self.bullet.lifetime)?;

        for size in AsteroidSize::ALL {
            let asteroid = self.asteroids.for_size(size);
            check_body("asteroids.body", &asteroid.body)?;
            in_range(
                "asteroids.acceleration_randomization",
                asteroid.acceleration_randomization,
                0.0,
                1.0,
            )?;
            if let Some(dup) = &asteroid.duplication {
                in_range("asteroids.duplication.dot_offset", dup.dot_offset, -1.0, 1.0)?;
                positive("asteroids.duplication.min_velocity_multiplier", dup.min_velocity_multiplier)?;
                positive("asteroids.duplication.max_velocity_multiplier", dup.max_velocity_multiplier)?;
                if dup.child >= size {
                    return Err(TuningError::Invalid {
                        field: "asteroids.duplication.child",
                        reason: format!("{:?} cannot split into {:?}", size, dup.child),
                    });
                }
            }
        }
        non_negative("asteroids.destroy_delay", self.asteroids.destroy_delay)?;

        if self.director.max_asteroids_on_screen == 0 {
            return Err(TuningError::Invalid {
                field: "director.max_asteroids_on_screen",
                reason: "must be at least 1".to_string(),
            });
        }
        positive("director.min_spawn_delay", self.director.min_spawn_delay)?;
        non_negative("director.spawn_delay_step", self.director.spawn_delay_step)?;
        non_negative("director.spawn_clearance", self.director.spawn_clearance)?;
        let half_diagonal = self.arena.half_extent * std::f32::consts::SQRT_2;
        if self.director.spawn_clearance > half_diagonal {
            return Err(TuningError::Invalid {
                field: "director.spawn_clearance",
                reason: format!(
                    "{} exceeds the arena half-diagonal {:.2}",
                    self.director.spawn_clearance, half_diagonal
                ),
            });
        }
        if self.director.initial_spawn_delay < self.director.min_spawn_delay {
            return Err(TuningError::Invalid {
                field: "director.initial_spawn_delay",
                reason: format!(
                    "{} is below min_spawn_delay {}",
                    self.director.initial_spawn_delay, self.director.min_spawn_delay
                ),
            });
        }

        if self.flow.grid_size == 0 {
            return Err(TuningError::Invalid {
                field: "flow.grid_size",
                reason: "must be at least 1".to_string(),
            });
        }
        non_negative("flow.wave_step", self.flow.wave_step)?;
        let m = &self.flow.multipliers;
        in_range("flow.multipliers.spaceship", m.spaceship, 0.0, 3.0)?;
        in_range("flow.multipliers.big_asteroid", m.big_asteroid, 0.0, 3.0)?;
        in_range("flow.multipliers.medium_asteroid", m.medium_asteroid, 0.0, 3.0)?;
        in_range("flow.multipliers.small_asteroid", m.small_asteroid, 0.0, 3.0)?;

        Ok(())
    }
}

fn check_body(field: &'static str, body: &BodyTuning) -> Result<(), TuningError> {
    non_negative(field, body.acceleration_scalar)?;
    positive(field, body.max_velocity)?;
    positive(field, body.radius)
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("{value} must be greater than zero"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("{value} must not be negative"),
        })
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), TuningError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("{value} is outside [{min}, {max}]"),
        })
    }
}
