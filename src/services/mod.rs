pub mod match_service;
pub mod teams_client;

pub use match_service::MatchOrchestrationService;
pub use teams_client::{HttpTeamsClient, TeamResolver};

use crate::db::postgres::PgMatchRepository;

/// The concrete service wired into the HTTP application.
pub type AppMatchService = MatchOrchestrationService<PgMatchRepository, HttpTeamsClient>;
