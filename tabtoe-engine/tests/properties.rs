//! Property-based tests for the state machine and the engine.

use proptest::prelude::*;
use tabtoe_core::{Board, MemoryStore, Symbol, BOARD_SIZE};
use tabtoe_engine::{
    BotPolicy, Engine, EngineConfig, GameState, Intent, Mode, Outcome, Phase, RandomBot,
};

/// Generate a board by placing symbols on random cells
fn arb_board() -> impl Strategy<Value = Board> {
    proptest::collection::vec(
        prop_oneof![Just(None), Just(Some(Symbol::X)), Just(Some(Symbol::O))],
        BOARD_SIZE,
    )
    .prop_map(|values| {
        let mut cells = [None; BOARD_SIZE];
        cells.copy_from_slice(&values);
        Board::from_values(cells)
    })
}

fn count(board: &Board, symbol: Symbol) -> usize {
    board.values().iter().filter(|v| **v == Some(symbol)).count()
}

proptest! {
    #[test]
    fn prop_random_bot_never_picks_occupied(board in arb_board(), seed in any::<u64>()) {
        let empty = board.empty_indices();
        let mut bot = RandomBot::with_seed(seed);

        match bot.select_cell(&board, &empty) {
            Some(cell) => prop_assert!(board.value(cell).is_none()),
            None => prop_assert!(empty.is_empty()),
        }
    }

    #[test]
    fn prop_bot_turn_fills_one_empty_cell(
        clicks in proptest::collection::vec(0..BOARD_SIZE, 1..4),
        seed in any::<u64>(),
    ) {
        let config = EngineConfig::default();
        let mut bot = RandomBot::with_seed(seed);
        let mut state = GameState::new(Mode::SinglePlayer);

        for index in clicks {
            let Ok(placed) = state.place_player(index, &config) else {
                continue;
            };
            let (next, cell) = placed.play_bot(&mut bot, &config);

            if placed.is_game_over() {
                prop_assert_eq!(cell, None);
                prop_assert_eq!(next, placed);
                break;
            }
            let cell = cell.unwrap();
            prop_assert!(placed.board().value(cell).is_none());
            prop_assert_eq!(next.board().value(cell), Some(Symbol::O));
            prop_assert_eq!(next.board().empty_count() + 1, placed.board().empty_count());
            state = next;
            if state.is_game_over() {
                break;
            }
        }
    }

    #[test]
    fn prop_full_board_bot_turn_ends_game_untouched(seed in any::<u64>()) {
        let config = EngineConfig::default();
        let mut bot = RandomBot::with_seed(seed);
        let (x, o) = (Some(Symbol::X), Some(Symbol::O));

        // X takes the last cell without completing a line
        let state = GameState::new(Mode::SinglePlayer)
            .with_shared_board([x, o, x, x, o, o, o, x, None], &config);
        let placed = state.place_player(8, &config).unwrap();
        prop_assert!(placed.board().is_full());

        let (next, cell) = placed.play_bot(&mut bot, &config);
        prop_assert_eq!(cell, None);
        prop_assert!(next.is_game_over());
        prop_assert_eq!(next.board(), placed.board());
    }

    #[test]
    fn prop_single_player_engine_invariants(
        clicks in proptest::collection::vec(0..BOARD_SIZE, 1..40),
        seed in any::<u64>(),
    ) {
        let config = EngineConfig { bot_seed: Some(seed), ..EngineConfig::default() };
        let mut engine = Engine::new(config, MemoryStore::new(), MemoryStore::new()).unwrap();
        let mut wins = (0, 0);

        for index in clicks {
            let before = engine.snapshot();
            let update = engine.dispatch(Intent::CellClick(index)).unwrap();
            let snapshot = update.snapshot;
            let board = snapshot.board;

            // the cycle always completes before control returns
            prop_assert!(!snapshot.status.is_bot_turn);
            prop_assert_ne!(snapshot.status.phase, Phase::PlayerMoved);

            let x = count(&board, Symbol::X);
            let o = count(&board, Symbol::O);
            prop_assert!(x == o || x == o + 1);

            // tallies only ever grow, by at most one per click
            let now = (snapshot.status.player_wins, snapshot.status.bot_wins);
            prop_assert!(now.0 >= wins.0 && now.1 >= wins.1);
            prop_assert!((now.0 - wins.0) + (now.1 - wins.1) <= 1);
            wins = now;

            match update.outcome {
                Outcome::Reset => {
                    prop_assert!(before.status.is_game_over);
                    prop_assert_eq!(board, Board::new());
                }
                Outcome::Rejected(_) => prop_assert_eq!(snapshot, before),
                Outcome::Placed { index: placed, bot_reply, .. } => {
                    prop_assert_eq!(placed, index);
                    prop_assert!(before.board.value(index).is_none());
                    prop_assert_eq!(board.value(index), Some(Symbol::X));
                    if let Some(reply) = bot_reply {
                        prop_assert!(before.board.value(reply).is_none());
                        prop_assert_eq!(board.value(reply), Some(Symbol::O));
                    }
                }
                other => prop_assert!(false, "unexpected outcome {:?}", other),
            }
        }
    }
}
