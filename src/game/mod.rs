//! 游戏核心逻辑模块（棋盘状态、胜负判定、规则引擎）。

pub mod rules;
pub mod state;

pub use rules::{evaluate, winning_line, Outcome, RuleEngine, RuleError, RuleResolution, WINNING_LINES};
pub use state::{
    Board,
    BoardError,
    GameEvent,
    GameMode,
    GameState,
    Mark,
    Player,
    Score,
    BOARD_CELLS,
    BOARD_SIDE,
};
