// Engine modules: frame clock, timers, input and environment snapshots

pub mod environment;
pub mod game_loop;
pub mod input;
pub mod timer;

pub use environment::EnvironmentSnapshot;
pub use game_loop::GameLoop;
pub use timer::{Scheduler, TimerHandle};
