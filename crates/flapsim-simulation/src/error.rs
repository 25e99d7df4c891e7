//! Configuration validation errors

use thiserror::Error;

/// Reasons a [`crate::SimConfig`] is rejected before any generation starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("jump velocity must point upward (negative), got {0}")]
    JumpNotUpward(f32),
    #[error("gap of {gap_height}px with {gap_margin}px margins does not fit between 0 and floor {floor_y}")]
    GapDoesNotFit {
        gap_height: f32,
        gap_margin: f32,
        floor_y: f32,
    },
    #[error("obstacle spacing {spacing} must exceed obstacle width + agent width ({min})")]
    SpacingTooSmall { spacing: f32, min: f32 },
    #[error("scroll speed {speed} must stay below {max} or pairs skip past the agent")]
    ScrollTooFast { speed: f32, max: f32 },
    #[error("ceiling {ceiling_y} must be above floor {floor_y}")]
    InvertedBounds { ceiling_y: f32, floor_y: f32 },
    #[error("agent start ({x}, {y}) lies outside the playfield")]
    AgentOutsidePlayfield { x: f32, y: f32 },
    #[error("obstacle lip inset {inset} leaves no shaft in a {width}px wide obstacle")]
    LipTooWide { inset: u32, width: u32 },
    #[error("score ceiling must be at least 1")]
    ZeroScoreCeiling,
}
