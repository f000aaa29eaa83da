mod common;

use tokio::sync::broadcast::error::TryRecvError;
use uuid::Uuid;

use courtside_backend::models::events::{MatchEvent, WinnerSide};
use courtside_backend::models::matches::{
    AdjustScoreRequest, FinishMatchRequest, FoulRequest, StartTimerRequest,
};

use common::spawn_service;

#[tokio::test]
async fn a_foul_publishes_one_fouls_updated_event_to_the_room() {
    let harness = spawn_service();
    let id = harness.program_match().await;
    let mut room = harness.broadcaster.subscribe(id);

    harness
        .service
        .add_foul(
            id,
            FoulRequest {
                team_id: harness.home_team_id,
                player_id: None,
                foul_type: None,
                registered_at: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(
        room.try_recv().unwrap(),
        MatchEvent::FoulsUpdated {
            match_id: id,
            home_fouls: 1,
            away_fouls: 0,
        }
    );
    assert!(matches!(room.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn rejected_operations_publish_nothing() {
    let harness = spawn_service();
    let id = harness.program_match().await;
    let mut room = harness.broadcaster.subscribe(id);

    let result = harness
        .service
        .adjust_score(
            id,
            AdjustScoreRequest {
                team_id: harness.home_team_id,
                delta: -2,
            },
        )
        .await;

    assert!(result.is_err());
    assert!(matches!(room.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn starting_the_timer_publishes_the_countdown() {
    let harness = spawn_service();
    let id = harness.program_match().await;
    let mut room = harness.broadcaster.subscribe(id);

    harness
        .service
        .start_timer(id, StartTimerRequest { quarter_duration_seconds: None })
        .await
        .unwrap();

    match room.try_recv().unwrap() {
        MatchEvent::TimerStarted {
            match_id,
            remaining_seconds,
            quarter_ends_at_utc,
        } => {
            assert_eq!(match_id, id);
            assert_eq!(remaining_seconds, 600);
            assert!(quarter_ends_at_utc.is_some());
        }
        other => panic!("Expected TimerStarted, got {:?}", other),
    }
}

#[tokio::test]
async fn finishing_publishes_game_ended_with_the_winner() {
    let harness = spawn_service();
    let id = harness.program_match().await;
    let mut room = harness.broadcaster.subscribe(id);

    harness
        .service
        .finish(
            id,
            FinishMatchRequest {
                home_score: 40,
                away_score: 52,
                home_fouls: 0,
                away_fouls: 0,
                score_events: vec![],
                fouls: vec![],
            },
        )
        .await
        .unwrap();

    assert_eq!(
        room.try_recv().unwrap(),
        MatchEvent::GameEnded {
            match_id: id,
            home: 40,
            away: 52,
            winner: WinnerSide::Away,
        }
    );
}

#[tokio::test]
async fn rooms_only_see_their_own_match() {
    let harness = spawn_service();
    let first = harness.program_match().await;
    let second = harness.program_match().await;
    let mut other_room = harness.broadcaster.subscribe(second);

    harness
        .service
        .add_foul(
            first,
            FoulRequest {
                team_id: harness.away_team_id,
                player_id: None,
                foul_type: None,
                registered_at: None,
            },
        )
        .await
        .unwrap();

    assert!(matches!(other_room.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn cancelation_notifies_the_room() {
    let harness = spawn_service();
    let id = harness.program_match().await;
    let mut room = harness.broadcaster.subscribe(id);

    harness.service.cancel(id).await.unwrap();

    assert_eq!(
        room.try_recv().unwrap(),
        MatchEvent::GameCanceled { match_id: id }
    );
}

#[tokio::test]
async fn publishing_without_subscribers_is_a_quiet_no_op() {
    let harness = spawn_service();
    let id = harness.program_match().await;

    // No room exists yet for this match
    let detail = harness.service.cancel(id).await.unwrap();
    assert_eq!(
        detail.status,
        courtside_backend::models::matches::MatchStatus::Canceled
    );
    assert_eq!(harness.broadcaster.subscriber_count(Uuid::new_v4()), 0);
}
