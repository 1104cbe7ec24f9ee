mod toggles;

pub use toggles::{KnobDesc, ToggleDesc, ToggleEffect, ToggleRegistry};
