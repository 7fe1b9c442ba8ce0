//! # Lock Flows
//!
//! Full-state and per-path locks on a realistic state shape.

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use reactive_store::{ChangeType, Command, DispatchReason, KeyPath, SkipReason};
    use serde_json::json;

    use crate::fixtures::{cell_path, new_game, TicTacToeAction};

    fn init() {
        store_telemetry::init_for_tests();
    }

    fn path(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    // =============================================================================
    // FULL-STATE LOCK
    // =============================================================================

    #[test]
    fn test_state_lock_blocks_every_action() -> Result<()> {
        init();
        let store = new_game()?;
        let before = store.get_state();
        store.dispatch(Command::LockState);

        for action in [TicTacToeAction::go(0), TicTacToeAction::Switch, TicTacToeAction::Init] {
            let outcome = store.dispatch_action(action);
            assert!(!outcome.committed);
            assert_eq!(outcome.reason, DispatchReason::Locked);
            assert!(outcome.changes.is_empty());
        }
        assert_eq!(store.get_state(), before);
        assert!(store.history_of(ChangeType::State).is_empty());
        Ok(())
    }

    #[test]
    fn test_state_lock_dominates_unlocked_paths() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::LockState);
        store.dispatch(Command::unlock_key_paths([cell_path(0)]));

        assert_eq!(store.dispatch_action(TicTacToeAction::go(0)).reason, DispatchReason::Locked);
        Ok(())
    }

    #[test]
    fn test_unlock_state_keeps_path_locks() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([path("game.turn")]));
        store.dispatch(Command::LockState);
        store.dispatch(Command::UnlockState);

        assert!(!store.is_state_locked());
        assert_eq!(store.dispatch_action(TicTacToeAction::Switch).reason, DispatchReason::LockedPaths);
        assert!(store.dispatch_action(TicTacToeAction::go(1)).committed);
        Ok(())
    }

    // =============================================================================
    // PATH LOCKS
    // =============================================================================

    #[test]
    fn test_ancestor_lock_protects_subtree() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([path("game.board")]));

        for id in [0, 4, 8] {
            let outcome = store.dispatch_action(TicTacToeAction::go(id));
            assert_eq!(outcome.reason, DispatchReason::LockedPaths);
            assert!(outcome.conflicts.contains(&cell_path(id)));
        }
        assert!(store.dispatch_action(TicTacToeAction::Switch).committed);
        Ok(())
    }

    #[test]
    fn test_sibling_cells_stay_writable() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([cell_path(0), cell_path(1)]));

        let outcome = store.dispatch_action(TicTacToeAction::go(2));
        assert!(outcome.committed);
        assert!(outcome.changes.contains_key(&path("game.board")));
        Ok(())
    }

    #[test]
    fn test_locking_twice_and_unlocking_unknown_path() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([cell_path(3)]));
        store.dispatch(Command::lock_key_paths([cell_path(3)]));
        assert_eq!(store.locked_paths().len(), 1);

        let outcome = store.dispatch(Command::unlock_key_paths([path("game.nowhere")]));
        assert_eq!(outcome.reason, DispatchReason::Control);
        assert_eq!(store.locked_paths().len(), 1);

        store.dispatch(Command::unlock_key_paths([cell_path(3)]));
        assert!(store.locked_paths().is_empty());
        assert!(store.dispatch_action(TicTacToeAction::go(3)).committed);
        Ok(())
    }

    #[test]
    fn test_lock_on_path_not_in_state_yet() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([path("game.board.9")]));

        // Nothing at the path before or after, so the write elsewhere passes
        assert!(store.dispatch_action(TicTacToeAction::go(0)).committed);
        Ok(())
    }

    #[test]
    fn test_rejected_dispatch_is_skipped_not_committed() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([cell_path(5)]));
        let history = store.history();

        let outcome = store.dispatch_action(TicTacToeAction::go(5));
        assert_eq!(outcome.reason, DispatchReason::LockedPaths);
        assert_eq!(outcome.state, store.get_state());
        assert_eq!(store.get_at(&cell_path(5))?, json!("-"));
        assert_eq!(store.history(), history);

        let skipped = store.skipped_dispatches();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].reason, SkipReason::LockedPaths);
        assert_eq!(skipped[0].action, Some(json!({"type": "GO", "id": 5})));
        assert!(skipped[0].conflicts.contains(&cell_path(5)));
        Ok(())
    }

    // =============================================================================
    // JSON CONTROL COMMANDS
    // =============================================================================

    #[test]
    fn test_json_lock_commands() -> Result<()> {
        init();
        let store = new_game()?;

        store.dispatch_json(json!({"lockKeyPaths": ["game.turn", "game.winner"]}))?;
        assert_eq!(store.locked_paths().len(), 2);

        store.dispatch_json(json!({"unlockKeys": "game.winner"}))?;
        assert_eq!(store.locked_paths().len(), 1);

        store.dispatch_json(json!({"lockState": 1}))?;
        assert!(store.is_state_locked());
        store.dispatch_json(json!({"unlockState": true}))?;
        assert!(!store.is_state_locked());

        assert!(store.dispatch_json(json!({"lockKeyPaths": ["game..turn"]})).is_err());
        Ok(())
    }

    #[test]
    fn test_lock_metrics() -> Result<()> {
        init();
        let store = new_game()?;
        store.dispatch(Command::lock_key_paths([cell_path(0)]));
        store.dispatch_action(TicTacToeAction::go(0));
        store.dispatch(Command::LockState);
        store.dispatch_action(TicTacToeAction::go(1));

        let reasons: Vec<SkipReason> = store.skipped_dispatches().iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::LockedPaths, SkipReason::Locked]);

        let metrics = store.metrics();
        assert_eq!(metrics.dispatches, 4);
        assert_eq!(metrics.commands, 2);
        assert_eq!(metrics.rejected_locked_paths, 1);
        assert_eq!(metrics.rejected_locked, 1);
        assert_eq!(metrics.commits, 0);
        Ok(())
    }
}
