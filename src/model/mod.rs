//! Plain data carried between the entity actors, the aggregator and the feed.

pub mod entity;
pub mod event;
pub mod ids;

pub use entity::*;
pub use event::*;
pub use ids::*;
