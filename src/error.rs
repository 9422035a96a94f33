use thiserror::Error;

use crate::types::Index;

/// Everything that can go wrong while loading a .bvh file or evaluating its pose.
#[derive(Debug, Error)]
pub enum BvhError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bad structure of .bvh file (line {line}). Expected {expected}, but found \"{found}\"")]
    Structural {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Not a valid channel for joint \"{joint}\" (line {line}): \"{found}\"")]
    UnknownChannel {
        joint: String,
        found: String,
        line: usize,
    },

    #[error("Joint \"{joint}\" declares {declared} channels, which does not match the channel names that follow (line {line})")]
    ChannelCountMismatch {
        joint: String,
        declared: usize,
        line: usize,
    },

    #[error("Expected {expected} (line {line}), but found \"{found}\"")]
    Token {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Unexpected end of file. Expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Joint index {0} does not exist")]
    InvalidJoint(Index),

    #[error("Joint \"{joint}\" has {found} frames of channel data, expected {expected}")]
    MissingFrames {
        joint: String,
        expected: usize,
        found: usize,
    },

    #[error("Joint \"{joint}\" has {found} channel values in frame {frame}, expected {expected}")]
    ChannelDataMismatch {
        joint: String,
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("Parent \"{parent}\" of joint \"{joint}\" has no computed transforms")]
    ParentNotEvaluated { joint: String, parent: String },
}

impl BvhError {
    /// True for errors raised while reading the file (as opposed to IO or evaluation errors).
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            BvhError::Structural { .. }
                | BvhError::UnknownChannel { .. }
                | BvhError::ChannelCountMismatch { .. }
                | BvhError::Token { .. }
                | BvhError::UnexpectedEof { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BvhError>;
