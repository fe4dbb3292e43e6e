// Input handling
//
// The combat core never polls devices. The outer game loop turns whatever it
// reads from the window into an `InputSnapshot` once per frame and hands it to
// each character's `update`.
//
// ## Usage Example
//
// ```rust
// use rusted_combat::engine::input::{Action, InputSnapshot};
//
// let input = InputSnapshot::from_actions(&[Action::MoveRight], &[Action::Attack]);
// assert!(input.attack_pressed);
// ```

pub mod action;
pub mod snapshot;

// Re-export commonly used types
pub use action::Action;
pub use snapshot::InputSnapshot;
