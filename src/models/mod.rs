pub mod events;
pub mod matches;
