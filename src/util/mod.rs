pub mod clock;
pub mod links;
pub mod telemetry;
pub mod text;

pub use clock::*;
pub use links::*;
pub use telemetry::*;
pub use text::*;
