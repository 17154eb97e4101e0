//! Domain models for HealthRoute.

mod health;
mod meal_plan;
mod observation;
mod reference;

pub use health::*;
pub use meal_plan::*;
pub use observation::*;
pub use reference::*;
