//! AI 对手：难度分级的落子策略与完整的极小化极大搜索。

pub mod agent;
pub mod minimax;

pub use agent::{
    find_winning_move, select_move, AiAgent, AiConfig, AiDecision, AiDifficulty, AiError,
    DecisionReason, DEFAULT_THINK_DELAY_MS,
};
pub use minimax::{minimax, search, SearchResult, SearchStats, DRAW_SCORE, LOSS_SCORE, WIN_SCORE};
