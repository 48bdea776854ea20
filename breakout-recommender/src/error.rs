use std::time::Duration;

use thiserror::Error;

use crate::environment::ActionId;

/// Failures of the recommender / learning driver hand-off
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    /// The game loop has not produced a new frame yet (or it was consumed already).
    /// Not fatal - the caller retries later.
    #[error("no observation available")]
    NoObservationAvailable,
    /// The game loop did not deliver a reward in time. It has stalled or died.
    #[error("no reward received within {0:?}")]
    RewardTimeout(Duration),
    #[error("recommend probability {0} is not within [0, 1]")]
    InvalidProbability(f64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("input queue is closed")]
    QueueClosed,
    #[error("key injection worker is gone")]
    WorkerGone,
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("action value {0} out of range")]
    ActionOutOfRange(ActionId),
    #[error("unknown game variant '{0}'")]
    UnknownVariant(String),
    #[error("an action space needs at least one action")]
    EmptyActionSpace,
}
