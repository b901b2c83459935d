use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::game::{evaluate, Board, Outcome, Player};

use super::minimax::{search, SearchStats};

/// 前端在 AI 落子前等待的默认时长（毫秒）。
pub const DEFAULT_THINK_DELAY_MS: u32 = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    #[default]
    Easy,
    Medium,
    Impossible,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" | "random" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "impossible" | "hard" | "expert" => Ok(AiDifficulty::Impossible),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum AiError {
    #[error("cannot select a move: game is {outcome}")]
    InvalidState { outcome: Outcome },
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

/// AI 配置；JSON 中缺省的字段取默认值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AiConfig {
    pub difficulty: AiDifficulty,
    pub ai_player: Player,
    pub think_delay_ms: u32,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        Self {
            difficulty,
            ai_player: Player::O,
            think_delay_ms: DEFAULT_THINK_DELAY_MS,
        }
    }

    pub fn with_ai_player(mut self, player: Player) -> Self {
        self.ai_player = player;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Easy)
    }
}

/// 选中某一步的原因。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionReason {
    Random,
    Win,
    Block,
    Search,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    pub index: usize,
    pub difficulty: AiDifficulty,
    pub reason: DecisionReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i8>,
    pub nodes: u64,
}

/// 按升序找到第一个能让 `player` 连成一线的空格。
pub fn find_winning_move(board: &Board, player: Player) -> Option<usize> {
    board.empty_cells().into_iter().find(|&index| {
        board
            .with_mark(index, player)
            .map(|next| evaluate(&next) == Outcome::Win { winner: player })
            .unwrap_or(false)
    })
}

/// 按难度为 `ai` 选择下一步。
///
/// 棋盘必须仍在进行中；已分胜负或已满的棋盘返回 [`AiError::InvalidState`]。
pub fn select_move<R: Rng + ?Sized>(
    board: &Board,
    difficulty: AiDifficulty,
    ai: Player,
    opponent: Player,
    rng: &mut R,
) -> Result<usize, AiError> {
    decide(board, difficulty, ai, opponent, rng).map(|decision| decision.index)
}

fn decide<R: Rng + ?Sized>(
    board: &Board,
    difficulty: AiDifficulty,
    ai: Player,
    opponent: Player,
    rng: &mut R,
) -> Result<AiDecision, AiError> {
    if ai == opponent {
        return Err(AiError::InvalidInput {
            reason: format!("ai and opponent are both {ai}"),
        });
    }
    let outcome = evaluate(board);
    if outcome != Outcome::InProgress {
        return Err(AiError::InvalidState { outcome });
    }

    let decision = match difficulty {
        AiDifficulty::Easy => random_decision(board, difficulty, rng)?,
        AiDifficulty::Medium => {
            if let Some(index) = find_winning_move(board, ai) {
                fixed_decision(index, difficulty, DecisionReason::Win)
            } else if let Some(index) = find_winning_move(board, opponent) {
                fixed_decision(index, difficulty, DecisionReason::Block)
            } else {
                random_decision(board, difficulty, rng)?
            }
        }
        AiDifficulty::Impossible => {
            let mut stats = SearchStats::default();
            let result = search(board, ai, ai, &mut stats);
            let index = result.index.ok_or(AiError::InvalidState { outcome })?;
            AiDecision {
                index,
                difficulty,
                reason: DecisionReason::Search,
                score: Some(result.score),
                nodes: stats.nodes,
            }
        }
    };

    debug!(
        "{ai} ({difficulty:?}) picks {} [{:?}]",
        decision.index, decision.reason
    );
    Ok(decision)
}

fn fixed_decision(index: usize, difficulty: AiDifficulty, reason: DecisionReason) -> AiDecision {
    AiDecision {
        index,
        difficulty,
        reason,
        score: None,
        nodes: 0,
    }
}

fn random_decision<R: Rng + ?Sized>(
    board: &Board,
    difficulty: AiDifficulty,
    rng: &mut R,
) -> Result<AiDecision, AiError> {
    let index = board
        .empty_cells()
        .choose(rng)
        .copied()
        .ok_or(AiError::InvalidState {
            outcome: evaluate(board),
        })?;
    Ok(fixed_decision(index, difficulty, DecisionReason::Random))
}

/// AI 对手：持有配置与随机数源。需要可复现时用 [`AiAgent::with_seed`]。
pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AiConfig) {
        self.config = config;
    }

    /// 按自身配置决策。
    pub fn decide(&mut self, board: &Board) -> Result<AiDecision, AiError> {
        let AiConfig {
            difficulty,
            ai_player,
            ..
        } = self.config;
        self.choose(board, difficulty, ai_player)
    }

    pub fn choose(
        &mut self,
        board: &Board,
        difficulty: AiDifficulty,
        ai: Player,
    ) -> Result<AiDecision, AiError> {
        decide(board, difficulty, ai, ai.opponent(), &mut self.rng)
    }
}
