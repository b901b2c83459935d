use crate::game::{evaluate, Board, Outcome, Player, BOARD_CELLS};

pub const WIN_SCORE: i8 = 1;
pub const DRAW_SCORE: i8 = 0;
pub const LOSS_SCORE: i8 = -1;

/// 搜索结果：终局叶子节点没有落子位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub index: Option<usize>,
    pub score: i8,
}

impl SearchResult {
    fn leaf(score: i8) -> Self {
        Self { index: None, score }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
}

/// 从 `board` 出发、由 `to_move` 先走的完整极小化极大搜索。
/// 分数站在 `ai` 一方：胜 +1，负 -1，和 0。
pub fn minimax(board: &Board, to_move: Player, ai: Player) -> SearchResult {
    let mut stats = SearchStats::default();
    search(board, to_move, ai, &mut stats)
}

/// 同 [`minimax`]，并把访问的节点数累加到 `stats`。
pub fn search(board: &Board, to_move: Player, ai: Player, stats: &mut SearchStats) -> SearchResult {
    stats.nodes += 1;

    match evaluate(board) {
        Outcome::Win { winner } if winner == ai => return SearchResult::leaf(WIN_SCORE),
        Outcome::Win { .. } => return SearchResult::leaf(LOSS_SCORE),
        Outcome::Draw => return SearchResult::leaf(DRAW_SCORE),
        Outcome::InProgress => {}
    }

    let maximizing = to_move == ai;
    let mut best: Option<SearchResult> = None;

    // 升序扫描，只有严格更优才替换，分数相同时保留最小下标。
    for index in 0..BOARD_CELLS {
        let Some(child) = board.with_mark(index, to_move) else {
            continue;
        };
        let score = search(&child, to_move.opponent(), ai, stats).score;
        let improves = match best {
            None => true,
            Some(current) if maximizing => score > current.score,
            Some(current) => score < current.score,
        };
        if improves {
            best = Some(SearchResult {
                index: Some(index),
                score,
            });
        }
    }

    best.unwrap_or(SearchResult::leaf(DRAW_SCORE))
}
