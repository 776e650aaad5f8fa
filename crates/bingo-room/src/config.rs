//! Room configuration and the room phase machine.

use bingo_card::{CardSpec, Number};
use bingo_draw::DrawConfig;

use crate::ConfigError;

// ---------------------------------------------------------------------------
// BingoConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room the registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingoConfig {
    /// Numbers run from 1 to `range_max`, for cards and draws alike.
    pub range_max: Number,

    /// Draw cadence.
    pub draw: DrawConfig,

    /// Capacity of each room actor's command channel. A full channel makes
    /// callers wait.
    pub channel_size: usize,
}

impl Default for BingoConfig {
    fn default() -> Self {
        Self {
            range_max: CardSpec::REFERENCE_RANGE,
            draw: DrawConfig::default(),
            channel_size: 64,
        }
    }
}

impl BingoConfig {
    /// Checks the configuration once, up front.
    ///
    /// A range that cannot fill a card is a deployment mistake, so it is
    /// reported here rather than on the first `createRoom`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.card_spec()?;
        if self.channel_size == 0 {
            return Err(ConfigError::ZeroChannelSize);
        }
        Ok(Self {
            draw: self.draw.validated(),
            ..self
        })
    }

    /// The card generator this configuration describes.
    pub fn card_spec(&self) -> Result<CardSpec, ConfigError> {
        Ok(CardSpec::new(self.range_max)?)
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Lifecycle of a room.
///
/// ```text
/// WaitingForPlayer ──(second player joins)──→ Running ──(win / pool exhausted)──→ Finished
///         │                                      │                                  │
///         └──────────────(any player leaves)─────┴──────────────────────────────────┴──→ Closed
/// ```
///
/// Only `WaitingForPlayer` accepts a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    WaitingForPlayer,
    Running,
    Finished,
    Closed,
}

impl RoomPhase {
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::WaitingForPlayer)
    }

    /// `true` while numbers are being drawn.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayer => write!(f, "WaitingForPlayer"),
            Self::Running => write!(f, "Running"),
            Self::Finished => write!(f, "Finished"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_default_config_matches_reference_game() {
        let config = BingoConfig::default();
        assert_eq!(config.range_max, 75);
        assert_eq!(config.draw.interval, Duration::from_secs(5));
        assert_eq!(config.channel_size, 64);
        assert!(config.validated().is_ok());
    }

    #[test]
    fn test_validated_rejects_range_smaller_than_card() {
        let config = BingoConfig {
            range_max: 24,
            ..BingoConfig::default()
        };
        assert!(matches!(config.validated(), Err(ConfigError::Range(_))));
    }

    #[test]
    fn test_validated_rejects_zero_channel() {
        let config = BingoConfig {
            channel_size: 0,
            ..BingoConfig::default()
        };
        assert!(matches!(
            config.validated(),
            Err(ConfigError::ZeroChannelSize)
        ));
    }

    #[test]
    fn test_validated_clamps_draw_interval() {
        let config = BingoConfig {
            draw: DrawConfig::with_interval(Duration::ZERO),
            ..BingoConfig::default()
        }
        .validated()
        .unwrap();
        assert_eq!(config.draw.interval, DrawConfig::MIN_INTERVAL);
    }

    #[test]
    fn test_room_phase_only_waiting_is_joinable() {
        assert!(RoomPhase::WaitingForPlayer.is_joinable());
        assert!(!RoomPhase::Running.is_joinable());
        assert!(!RoomPhase::Finished.is_joinable());
        assert!(!RoomPhase::Closed.is_joinable());
    }

    #[test]
    fn test_room_phase_display() {
        assert_eq!(RoomPhase::WaitingForPlayer.to_string(), "WaitingForPlayer");
        assert_eq!(RoomPhase::Closed.to_string(), "Closed");
    }
}
