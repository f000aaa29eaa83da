pub mod foul_handler;
pub mod lifecycle_handler;
pub mod match_handler;
pub mod score_handler;
pub mod timer_handler;
