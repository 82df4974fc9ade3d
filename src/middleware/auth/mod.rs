pub mod gate;

pub use gate::{AuthGate, UninitializedPolicy, apply};
