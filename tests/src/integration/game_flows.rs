//! # Tic-Tac-Toe Flows
//!
//! A full game driven through the store: slice reducer, per-cell locks,
//! nested dispatches from listeners and the final full-state lock.

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use reactive_store::{
        Action, ChangeType, Command, DiagnosticMode, DispatchReason, StoreConfigBuilder,
    };
    use serde_json::json;

    use crate::fixtures::{cell_path, new_game, new_game_with, Board, Game, TicTacToeAction};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn init() {
        store_telemetry::init_for_tests();
    }

    // =============================================================================
    // BARE STORE: REDUCER + LOCKS
    // =============================================================================

    #[test]
    fn test_go_marks_cell_without_switching_turn() -> Result<()> {
        init();
        let store = new_game()?;

        let outcome = store.dispatch_action(TicTacToeAction::go(0));
        assert!(outcome.committed);

        let game = Game::from_state(&store.get_state())?;
        assert_eq!(game.board[0], "X");
        assert_eq!(game.turn, "X");
        assert_eq!(game.winner, "");
        Ok(())
    }

    #[test]
    fn test_repeated_go_is_no_change() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch_action(TicTacToeAction::go(0));
        let history = store.history().len();

        let outcome = store.dispatch_action(TicTacToeAction::go(0));
        assert_eq!(outcome.reason, DispatchReason::NoChange);
        assert!(outcome.changes.is_empty());
        assert_eq!(store.history().len(), history);
        Ok(())
    }

    #[test]
    fn test_locked_cell_rejects_overwrite() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch_action(TicTacToeAction::go(0));
        store.dispatch(Command::lock_key_paths([cell_path(0)]));

        let outcome = store.dispatch_action(TicTacToeAction::Go {
            id: 0,
            value: Some("O".to_string()),
        });
        assert_eq!(outcome.reason, DispatchReason::LockedPaths);
        assert!(outcome.conflicts.contains(&cell_path(0)));
        assert_eq!(store.get_at(&cell_path(0))?, json!("X"));

        let outcome = store.dispatch_action(TicTacToeAction::go(4));
        assert!(outcome.committed, "other cells stay writable");
        Ok(())
    }

    #[test]
    fn test_scoped_action_reports_only_declared_paths() -> Result<()> {
        init();
        let store = new_game()?;
        let action = Action::new(TicTacToeAction::go(4)).with_keypaths_to_change([cell_path(4)]);
        let outcome = store.dispatch(action);

        let changed: Vec<String> = outcome.changes.keys().map(ToString::to_string).collect();
        assert_eq!(changed, vec!["game", "game.board", "game.board.4"]);
        Ok(())
    }

    #[test]
    fn test_json_actions_from_ui() -> Result<()> {
        init();
        let store = new_game()?;

        let outcome = store.dispatch_json(json!({"type": "GO", "id": 4}))?;
        assert!(outcome.committed);

        store.dispatch_json(json!({"lockKeys": ["game.board.4"]}))?;
        let outcome = store.dispatch_json(json!({"type": "GO", "id": 4, "value": "O"}))?;
        assert_eq!(outcome.reason, DispatchReason::LockedPaths);

        assert!(store.dispatch_json(json!({"type": "FLIP_TABLE"})).is_err());
        Ok(())
    }

    // =============================================================================
    // WIRED BOARD: LISTENERS DRIVE THE GAME
    // =============================================================================

    #[test]
    fn test_move_locks_cell_and_switches_turn() -> Result<()> {
        init();
        let board = Board::new()?;

        assert!(board.click(0).committed);
        let game = board.game()?;
        assert_eq!(game.board[0], "X");
        assert_eq!(game.turn, "O");
        assert!(board.store().locked_paths().contains(&cell_path(0)));

        // The square listener unsubscribed itself after its move
        let counts = board.store().listener_counts();
        assert_eq!(counts.partial.len(), 8);
        assert!(!counts.partial.contains_key(&cell_path(0)));
        Ok(())
    }

    #[test]
    fn test_clicking_taken_cell_is_rejected() -> Result<()> {
        init();
        let board = Board::new()?;
        board.click(0);

        let outcome = board.click(0);
        assert_eq!(outcome.reason, DispatchReason::LockedPaths);
        let game = board.game()?;
        assert_eq!(game.board[0], "X");
        assert_eq!(game.turn, "O");
        Ok(())
    }

    #[test]
    fn test_full_game_x_wins_and_locks_state() -> Result<()> {
        init();
        let board = Board::new()?;
        let span = store_telemetry::store_span!("game", winner = "X");
        let _entered = span.enter();

        for cell in [0, 3, 1, 4] {
            assert!(board.click(cell).committed);
            assert!(board.announcement().is_none());
        }
        assert!(board.click(2).committed);

        let game = board.game()?;
        assert_eq!(game.winner, "X");
        assert_eq!(game.turn, "X", "switch after the winning move is rejected");
        assert_eq!(board.announcement().as_deref(), Some("Player X won!!!"));
        assert!(board.store().is_state_locked());

        let outcome = board.click(8);
        assert_eq!(outcome.reason, DispatchReason::Locked);
        assert_eq!(board.game()?.board[8], "-");
        Ok(())
    }

    #[test]
    fn test_o_wins_on_diagonal() -> Result<()> {
        init();
        let board = Board::new()?;
        for cell in [0, 2, 1, 4, 8, 6] {
            board.click(cell);
        }
        assert_eq!(board.game()?.winner, "O");
        assert_eq!(board.announcement().as_deref(), Some("Player O won!!!"));
        Ok(())
    }

    #[test]
    fn test_game_history_in_devlite_mode() -> Result<()> {
        init();
        let config = StoreConfigBuilder::new().mode(DiagnosticMode::DevLite).build();
        let board = Board::wire(new_game_with(config)?)?;
        board.click(4);

        let store = board.store();
        assert_eq!(store.history_of(ChangeType::Init).len(), 1);
        assert_eq!(store.history_of(ChangeType::AddListener).len(), 10);
        assert_eq!(store.history_of(ChangeType::DelListener).len(), 1);

        let commits = store.history_of(ChangeType::State);
        assert_eq!(commits.len(), 2, "GO and SWITCH commit, CHECK_WIN is a no-op");
        assert_eq!(commits[0].action, Some(json!({"type": "GO", "id": 4})));
        assert!(commits[0].changed_paths.is_some());
        assert!(commits[0].state.is_none());

        let exported = store.history_json()?;
        assert_eq!(exported[0]["change_type"], json!("INIT"));
        Ok(())
    }

    #[test]
    fn test_metrics_after_game() -> Result<()> {
        init();
        let board = Board::new()?;
        for cell in [0, 3, 1, 4, 2] {
            board.click(cell);
        }
        board.click(8);

        let metrics = board.store().metrics();
        assert_eq!(metrics.rejected_locked, 2, "final SWITCH and the late click");
        assert!(metrics.commands >= 6);
        assert!(metrics.no_ops >= 4);
        assert_eq!(metrics.rejected(), metrics.rejected_locked);
        Ok(())
    }
}
