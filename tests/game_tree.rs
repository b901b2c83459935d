use std::collections::HashSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tictactoe_core::ai::{find_winning_move, minimax, select_move, AiDifficulty, WIN_SCORE};
use tictactoe_core::game::{evaluate, winning_line, Board, Mark, Outcome, Player};

/// 从空棋盘、X 先手出发可达的所有局面，以及该局面下的行棋方。
fn reachable_positions() -> Vec<(Board, Player)> {
    fn walk(board: Board, to_move: Player, seen: &mut HashSet<Board>, out: &mut Vec<(Board, Player)>) {
        if !seen.insert(board) {
            return;
        }
        out.push((board, to_move));
        if evaluate(&board) != Outcome::InProgress {
            return;
        }
        for index in board.empty_cells() {
            let next = board.with_mark(index, to_move).expect("cell is empty");
            walk(next, to_move.opponent(), seen, out);
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    walk(Board::new(), Player::X, &mut seen, &mut out);
    out
}

#[test]
fn reachable_state_count() {
    assert_eq!(reachable_positions().len(), 5478);
}

#[test]
fn evaluator_properties_hold_everywhere() {
    for (board, _) in reachable_positions() {
        let outcome = evaluate(&board);
        assert_eq!(outcome, evaluate(&board), "evaluate must be pure");

        match winning_line(&board) {
            Some((winner, line)) => {
                assert_eq!(outcome, Outcome::Win { winner });
                assert!(line.iter().all(|&i| board.get(i) == Some(winner.mark())));
            }
            None if board.is_full() => assert_eq!(outcome, Outcome::Draw, "{board}"),
            None => assert_eq!(outcome, Outcome::InProgress, "{board}"),
        }
    }
}

#[test]
fn full_board_with_line_is_a_win() {
    let full_wins = reachable_positions()
        .into_iter()
        .filter(|(board, _)| board.is_full() && winning_line(board).is_some())
        .count();
    assert!(full_wins > 0);
    for (board, _) in reachable_positions() {
        if board.is_full() {
            assert_ne!(
                evaluate(&board) == Outcome::Draw,
                winning_line(&board).is_some()
            );
        }
    }
}

#[test]
fn medium_never_misses_a_win_and_always_blocks() {
    let mut rng = SmallRng::seed_from_u64(5);
    for (board, to_move) in reachable_positions() {
        if evaluate(&board) != Outcome::InProgress {
            continue;
        }
        let ai = to_move;
        let opponent = ai.opponent();
        let chosen = select_move(&board, AiDifficulty::Medium, ai, opponent, &mut rng)
            .expect("board is in progress");
        assert!(board.is_empty_at(chosen));

        if let Some(win) = find_winning_move(&board, ai) {
            assert_eq!(chosen, win, "{board}");
            let after = board.with_mark(chosen, ai).expect("cell is empty");
            assert_eq!(evaluate(&after), Outcome::Win { winner: ai });
        } else if let Some(block) = find_winning_move(&board, opponent) {
            assert_eq!(chosen, block, "{board}");
        }
    }
}

#[test]
fn impossible_converts_available_wins() {
    let mut rng = SmallRng::seed_from_u64(5);
    for (board, to_move) in reachable_positions() {
        if evaluate(&board) != Outcome::InProgress || find_winning_move(&board, to_move).is_none() {
            continue;
        }
        let chosen = select_move(&board, AiDifficulty::Impossible, to_move, to_move.opponent(), &mut rng)
            .expect("board is in progress");
        let after = board.with_mark(chosen, to_move).expect("cell is empty");
        let score = minimax(&after, to_move.opponent(), to_move).score;
        assert_eq!(score, WIN_SCORE, "{board}");
    }
}

fn assert_never_loses(board: Board, to_move: Player, ai: Player, rng: &mut SmallRng) {
    match evaluate(&board) {
        Outcome::Win { winner } => {
            assert_eq!(winner, ai, "impossible AI lost:\n{board}");
            return;
        }
        Outcome::Draw => return,
        Outcome::InProgress => {}
    }

    if to_move == ai {
        let index = select_move(&board, AiDifficulty::Impossible, ai, ai.opponent(), rng)
            .expect("board is in progress");
        let next = board.with_mark(index, ai).expect("ai must pick an empty cell");
        assert_never_loses(next, to_move.opponent(), ai, rng);
    } else {
        for index in board.empty_cells() {
            let next = board.with_mark(index, to_move).expect("cell is empty");
            assert_never_loses(next, to_move.opponent(), ai, rng);
        }
    }
}

#[test]
fn impossible_as_o_never_loses() {
    let mut rng = SmallRng::seed_from_u64(0);
    assert_never_loses(Board::new(), Player::X, Player::O, &mut rng);
}

#[test]
fn impossible_as_x_never_loses() {
    let mut rng = SmallRng::seed_from_u64(0);
    assert_never_loses(Board::new(), Player::X, Player::X, &mut rng);
}

#[test]
fn optimal_self_play_is_a_draw() {
    let mut rng = SmallRng::seed_from_u64(0);
    let mut board = Board::new();
    let mut to_move = Player::X;
    while evaluate(&board) == Outcome::InProgress {
        let index = select_move(&board, AiDifficulty::Impossible, to_move, to_move.opponent(), &mut rng)
            .expect("board is in progress");
        board = board.with_mark(index, to_move).expect("cell is empty");
        to_move = to_move.opponent();
    }
    assert_eq!(evaluate(&board), Outcome::Draw);
    assert_eq!(board.count(Mark::Empty), 0);
}

#[test]
fn scenario_block_completing_cell() {
    let board: Board = "XX..O....".parse().expect("fixture board should parse");
    let mut rng = SmallRng::seed_from_u64(1);
    for difficulty in [AiDifficulty::Medium, AiDifficulty::Impossible] {
        assert_eq!(
            select_move(&board, difficulty, Player::O, Player::X, &mut rng),
            Ok(2)
        );
    }
}

#[test]
fn scenario_complete_own_column() {
    let board: Board = "OXOXXO...".parse().expect("fixture board should parse");
    let mut rng = SmallRng::seed_from_u64(1);
    for difficulty in [AiDifficulty::Medium, AiDifficulty::Impossible] {
        assert_eq!(
            select_move(&board, difficulty, Player::O, Player::X, &mut rng),
            Ok(8)
        );
    }
}
