mod utils;

use chrono::Utc;
use fab_league::{
    league::{
        backup::BackupFile,
        models::{NewPlayerSpec, Player, TournamentFormat},
        projection::{self, FormatFilter},
    },
    Account, LeagueError, LeagueEvent, LeagueRepository, Role,
};
use utils::{result, seeded_player, submission, TestSetupBuilder};

fn assert_invariants(players: &[Player]) {
    for p in players {
        assert_eq!(
            p.total_points,
            p.tournaments_played + p.total_wins,
            "points invariant broken for {}",
            p.id
        );
        assert_eq!(
            p.recent_performance.len(),
            p.tournaments_played as usize,
            "history length broken for {}",
            p.id
        );
    }
}

#[tokio::test]
async fn existing_player_result_updates_aggregates_and_history() {
    let setup = TestSetupBuilder::new()
        .with_player(seeded_player("P", "Pat", &[1, 2], "Kano"))
        .build();

    setup
        .service
        .record_tournament(submission(
            "2024-01-10",
            TournamentFormat::StandardConstructed,
            vec![result("P", 2, "Dash")],
            vec![],
        ))
        .await
        .expect("submission should commit");

    let pat = setup.store.get_player("P").await.unwrap().unwrap();
    assert_eq!(pat.tournaments_played, 3);
    assert_eq!(pat.total_wins, 5);
    assert_eq!(pat.total_points, 8);
    assert_eq!(pat.recent_performance, vec![1, 2, 2]);
    assert_eq!(pat.hero_stats.get("Dash"), Some(&1));
    assert_eq!(pat.hero_stats.get("Kano"), Some(&2));

    let history = setup.store.list_tournaments().await.unwrap();
    assert_eq!(history.len(), 1);
    let entry = history[0].entry_for("P").expect("entry for P");
    assert_eq!(entry.player_name, "Pat");
    assert_eq!(entry.hero_played, "Dash");
    assert_eq!(entry.wins, 2);
}

#[tokio::test]
async fn new_player_is_created_and_scored_once() {
    let setup = TestSetupBuilder::new().build();

    let recorded = setup
        .service
        .record_tournament(submission(
            "2024-01-10",
            TournamentFormat::StandardConstructed,
            vec![],
            vec![NewPlayerSpec {
                name: "NewGuy".to_string(),
                initial_wins: 1,
                hero_played: "Kano".to_string(),
            }],
        ))
        .await
        .unwrap();

    let players = setup.store.list_players().await.unwrap();
    assert_eq!(players.len(), 1);
    let new_guy = &players[0];
    assert_eq!(new_guy.name, "NewGuy");
    assert_eq!(new_guy.tournaments_played, 1);
    assert_eq!(new_guy.total_wins, 1);
    assert_eq!(new_guy.total_points, 2);
    assert_eq!(new_guy.hero_stats.len(), 1);
    assert_eq!(new_guy.hero_stats.get("Kano"), Some(&1));

    assert_eq!(recorded.tournament.results.len(), 1);
    assert_eq!(recorded.tournament.results[0].player_id, new_guy.id);
}

#[tokio::test]
async fn new_players_sharing_a_name_stay_distinct() {
    let setup = TestSetupBuilder::new().build();
    let spec = |wins| NewPlayerSpec {
        name: "Sam".to_string(),
        initial_wins: wins,
        hero_played: "Fai".to_string(),
    };

    let recorded = setup
        .service
        .record_tournament(submission(
            "2024-01-10",
            TournamentFormat::Limited,
            vec![],
            vec![spec(0), spec(3)],
        ))
        .await
        .unwrap();

    let players = setup.store.list_players().await.unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0].total_wins, 0);
    assert_eq!(players[1].total_wins, 3);
    assert_ne!(players[0].id, players[1].id);
    assert_eq!(recorded.tournament.results.len(), 2);
}

#[tokio::test]
async fn empty_submission_is_rejected_before_any_write() {
    let setup = TestSetupBuilder::new()
        .with_player(seeded_player("P", "Pat", &[1], "Kano"))
        .build();
    let mut events = setup.event_bus.subscribe();

    let err = setup
        .service
        .record_tournament(submission(
            "2024-01-10",
            TournamentFormat::StandardConstructed,
            vec![],
            vec![],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, LeagueError::Validation(_)));
    assert_eq!(setup.store.tournament_count().await, 0);
    assert_eq!(
        setup.store.list_players().await.unwrap(),
        vec![seeded_player("P", "Pat", &[1], "Kano")]
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn format_filter_with_no_matching_tournaments_zeroes_everyone() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![Player::new("A", "Ann"), Player::new("B", "Bo")])
        .build();
    setup
        .service
        .record_tournament(submission(
            "2024-01-10",
            TournamentFormat::StandardConstructed,
            vec![result("A", 2, "Dash"), result("B", 1, "Kano")],
            vec![],
        ))
        .await
        .unwrap();

    let sage = setup
        .service
        .stats(FormatFilter::Only(TournamentFormat::Skirmish))
        .await
        .unwrap();

    assert_eq!(sage.players.len(), 2);
    for stats in &sage.players {
        assert_eq!(stats.total_points, 0);
        assert_eq!(stats.tournaments_played, 0);
        assert!(stats.hero_stats.is_empty());
    }
    assert!(sage.hero_distribution.is_empty());
}

#[tokio::test]
async fn failed_player_update_leaves_exactly_one_stale_player() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![
            Player::new("A", "Ann"),
            Player::new("B", "Bo"),
            Player::new("C", "Cy"),
        ])
        .failing_player_update(2)
        .build();

    let err = setup
        .service
        .record_tournament(submission(
            "2024-01-10",
            TournamentFormat::StandardConstructed,
            vec![
                result("A", 3, "Dash"),
                result("B", 2, "Kano"),
                result("C", 1, "Fai"),
            ],
            vec![],
        ))
        .await
        .unwrap_err();

    match &err {
        LeagueError::PartialWrite {
            committed, failed, ..
        } => {
            assert_eq!(failed, &vec!["B".to_string()]);
            assert!(committed.contains(&"A".to_string()));
            assert!(committed.contains(&"C".to_string()));
        }
        other => panic!("expected partial write, got {other:?}"),
    }

    // The record committed even though one aggregate did not
    let history = setup.store.list_tournaments().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].results.len(), 3);

    let players = setup.store.list_players().await.unwrap();
    let stale: Vec<&Player> = players
        .iter()
        .filter(|p| {
            let expected = fab_league::league::aggregation::replay_history(p, &history);
            !expected.same_aggregates(p)
        })
        .collect();
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id, "B");
    assert_eq!(stale[0].tournaments_played, 0);

    let report = setup.service.reconcile_all().await.unwrap();
    assert_eq!(report.repaired, vec!["B".to_string()]);

    let bo = setup.store.get_player("B").await.unwrap().unwrap();
    assert_eq!(bo.tournaments_played, 1);
    assert_eq!(bo.total_points, 3);
    assert_invariants(&setup.store.list_players().await.unwrap());
}

#[tokio::test]
async fn invariants_hold_across_a_season() {
    let setup = TestSetupBuilder::new()
        .with_players(vec![Player::new("A", "Ann"), Player::new("B", "Bo")])
        .build();

    let rounds = [
        ("2024-01-05", TournamentFormat::StandardConstructed, 3, 0),
        ("2024-01-12", TournamentFormat::Skirmish, 1, 2),
        ("2024-01-19", TournamentFormat::Limited, 0, 4),
        ("2024-01-26", TournamentFormat::StandardConstructed, 2, 2),
    ];
    for (date, format, a_wins, b_wins) in rounds {
        setup
            .service
            .record_tournament(submission(
                date,
                format,
                vec![result("A", a_wins, "Dash"), result("B", b_wins, "")],
                vec![],
            ))
            .await
            .unwrap();
        assert_invariants(&setup.store.list_players().await.unwrap());
    }

    let first_read = setup.store.list_players().await.unwrap();
    let second_read = setup.store.list_players().await.unwrap();
    assert_eq!(first_read, second_read);

    let bo = setup.store.get_player("B").await.unwrap().unwrap();
    assert_eq!(bo.tournaments_played, 4);
    assert!(bo.hero_stats.is_empty());

    // Totals across all formats match the stored aggregates
    let history = setup.store.list_tournaments().await.unwrap();
    let all = projection::format_stats(&first_read, &history, FormatFilter::All);
    for (stats, player) in all.iter().zip(&first_read) {
        assert_eq!(stats.total_points, player.total_points);
    }
}

#[tokio::test]
async fn committed_records_never_change() {
    let setup = TestSetupBuilder::new()
        .with_player(Player::new("A", "Ann"))
        .build();

    setup
        .service
        .record_tournament(submission(
            "2024-01-05",
            TournamentFormat::StandardConstructed,
            vec![result("A", 1, "Dash")],
            vec![],
        ))
        .await
        .unwrap();
    let original = setup.store.list_tournaments().await.unwrap()[0].clone();

    setup.service.rename_player("A", "Annie").await.unwrap();
    setup
        .service
        .record_tournament(submission(
            "2024-01-12",
            TournamentFormat::Limited,
            vec![result("A", 4, "Kano")],
            vec![],
        ))
        .await
        .unwrap();

    let history = setup.store.list_tournaments().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], original);
    assert_eq!(history[1].results[0].player_name, "Annie");
}

#[tokio::test]
async fn non_participants_are_untouched() {
    let idle = seeded_player("I", "Idle", &[2], "Kano");
    let setup = TestSetupBuilder::new()
        .with_players(vec![Player::new("A", "Ann"), idle.clone()])
        .build();

    let recorded = setup
        .service
        .record_tournament(submission(
            "2024-01-05",
            TournamentFormat::StandardConstructed,
            vec![result("A", 1, "Dash")],
            vec![],
        ))
        .await
        .unwrap();

    assert!(recorded.tournament.entry_for("I").is_none());
    assert_eq!(setup.store.get_player("I").await.unwrap(), Some(idle));
}

#[tokio::test]
async fn admin_linked_player_cannot_be_deleted() {
    let setup = TestSetupBuilder::new()
        .with_player(seeded_player("boss", "Boss", &[3], "Dash"))
        .build();
    setup
        .store
        .save_account(&Account::new("u-boss", "boss@example.com", Role::Admin).linked_to("boss"))
        .await
        .unwrap();
    let players_before = setup.store.list_players().await.unwrap();
    let accounts_before = setup.store.list_accounts().await.unwrap();

    let err = setup.service.delete_player("boss").await.unwrap_err();

    assert!(matches!(err, LeagueError::AdminProtected(_)));
    assert_eq!(setup.store.list_players().await.unwrap(), players_before);
    assert_eq!(setup.store.list_accounts().await.unwrap(), accounts_before);
}

#[tokio::test]
async fn subscribers_see_record_then_player_updates() {
    let setup = TestSetupBuilder::new()
        .with_player(Player::new("A", "Ann"))
        .build();
    let mut events = setup.event_bus.subscribe();

    let recorded = setup
        .service
        .record_tournament(submission(
            "2024-01-05",
            TournamentFormat::StandardConstructed,
            vec![result("A", 1, "Dash")],
            vec![],
        ))
        .await
        .unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        LeagueEvent::TournamentRecorded {
            tournament_id: recorded.tournament.id.clone()
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        LeagueEvent::PlayersChanged {
            player_ids: vec!["A".to_string()]
        }
    );
}

#[tokio::test]
async fn interrupted_import_still_announces_overwritten_players() {
    let setup = TestSetupBuilder::new().failing_account_saves().build();
    let mut events = setup.event_bus.subscribe();
    let backup = BackupFile::new(
        vec![
            seeded_player("A", "Ann", &[2], "Dash"),
            seeded_player("B", "Bo", &[1], "Kano"),
        ],
        vec![Account::new("A", "ann@example.com", Role::Player).linked_to("A")],
        vec![],
        Utc::now(),
    );
    let raw = serde_json::to_string(&backup).unwrap();

    let err = setup.service.import_backup(&raw).await.unwrap_err();

    match &err {
        LeagueError::PartialWrite {
            committed, failed, ..
        } => {
            assert_eq!(committed, &vec!["A".to_string(), "B".to_string()]);
            assert_eq!(failed, &vec!["A".to_string()]);
        }
        other => panic!("expected partial write, got {other:?}"),
    }
    assert_eq!(setup.store.player_count().await, 2);
    assert_eq!(events.recv().await.unwrap(), LeagueEvent::DataImported);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn import_with_no_committed_writes_is_silent() {
    let setup = TestSetupBuilder::new().failing_account_saves().build();
    let mut events = setup.event_bus.subscribe();
    let backup = BackupFile::new(
        vec![],
        vec![Account::new("A", "ann@example.com", Role::Player)],
        vec![],
        Utc::now(),
    );
    let raw = serde_json::to_string(&backup).unwrap();

    let err = setup.service.import_backup(&raw).await.unwrap_err();

    assert!(matches!(err, LeagueError::Persistence(_)));
    assert!(events.try_recv().is_err());
}
