pub mod config;
pub mod environment;
pub mod error;
pub mod observer;
pub mod player;
pub mod recommender;
pub mod session;
pub mod signal;
pub mod util;
