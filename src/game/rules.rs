use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ai::{AiAgent, AiConfig, AiDecision, AiDifficulty, AiError};

use super::state::{Board, GameEvent, GameMode, GameState, Player, BOARD_CELLS};

/// 八条获胜线：三行、三列、两条对角线。检查顺序固定。
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 棋盘的胜负判定结果，每次按需从棋盘推导。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Outcome {
    InProgress,
    Win { winner: Player },
    Draw,
}

impl Outcome {
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Win { winner } => Some(*winner),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::InProgress => f.write_str("in progress"),
            Outcome::Win { winner } => write!(f, "won by {winner}"),
            Outcome::Draw => f.write_str("drawn"),
        }
    }
}

/// 第一条三子相同且非空的线，以及占据它的玩家。
pub fn winning_line(board: &Board) -> Option<(Player, [usize; 3])> {
    WINNING_LINES.iter().find_map(|&[a, b, c]| {
        let player = board.get(a)?.player()?;
        let mark = player.mark();
        (board.get(b) == Some(mark) && board.get(c) == Some(mark)).then_some((player, [a, b, c]))
    })
}

pub fn evaluate(board: &Board) -> Outcome {
    if let Some((winner, _)) = winning_line(board) {
        return Outcome::Win { winner };
    }
    if board.is_full() {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("game is already finished")]
    GameFinished,
    #[error("cell {index} is outside the board")]
    InvalidCell { index: usize },
    #[error("cell {index} is already occupied")]
    CellOccupied { index: usize },
    #[error("it is not the AI's turn")]
    NotAiTurn,
    #[error("it is the AI's turn")]
    NotPlayerTurn,
    #[error(transparent)]
    Ai {
        #[from]
        error: AiError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<AiDecision>,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let outcome = state.outcome();
        Self {
            state,
            events,
            outcome,
            decision: None,
        }
    }

    pub fn with_decision(mut self, decision: AiDecision) -> Self {
        self.decision = Some(decision);
        self
    }
}

/// 规则引擎：落子、轮到 AI 时替 AI 落子、重置与切换设置。
pub struct RuleEngine {
    agent: AiAgent,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::with_agent(AiAgent::new(AiConfig::default()))
    }

    pub fn with_agent(agent: AiAgent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &AiAgent {
        &self.agent
    }

    /// 由当前行棋方在 `index` 落子。
    pub fn play(&mut self, state: &mut GameState, index: usize) -> Result<Vec<GameEvent>, RuleError> {
        if state.is_finished() {
            warn!("rejected move at {index}: game is {}", state.outcome());
            return Err(RuleError::GameFinished);
        }
        if index >= BOARD_CELLS {
            warn!("rejected move at {index}: outside the board");
            return Err(RuleError::InvalidCell { index });
        }

        let player = state.next_player;
        state.board = state
            .board
            .with_mark(index, player)
            .ok_or(RuleError::CellOccupied { index })?;
        state.next_player = player.opponent();

        let mut events = vec![GameEvent::MovePlayed { player, index }];
        if let Some((winner, line)) = winning_line(&state.board) {
            state.score.record_win(winner);
            info!("{winner} wins with {line:?}; score X {} - O {}", state.score.x, state.score.o);
            events.push(GameEvent::GameWon { winner, line });
        } else if state.board.is_full() {
            info!("game drawn");
            events.push(GameEvent::GameDrawn);
        }

        for event in &events {
            state.record_event(event.clone());
        }
        Ok(events)
    }

    /// 人类玩家落子；AI 模式下轮到 AI 时拒绝。
    pub fn human_move(
        &mut self,
        state: &mut GameState,
        index: usize,
    ) -> Result<Vec<GameEvent>, RuleError> {
        if state.is_ai_turn() {
            return Err(RuleError::NotPlayerTurn);
        }
        self.play(state, index)
    }

    /// 用引擎自身的 AI 为当前局面决策，不落子。
    pub fn decide(&mut self, state: &GameState) -> Result<AiDecision, RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        if !state.is_ai_turn() {
            return Err(RuleError::NotAiTurn);
        }

        self.sync_agent(state);
        let decision = self.agent.decide(&state.board)?;
        debug!(
            "ai ({:?}) picks {} after {} nodes",
            state.difficulty, decision.index, decision.nodes
        );
        Ok(decision)
    }

    pub fn ai_turn(
        &mut self,
        state: &mut GameState,
    ) -> Result<(AiDecision, Vec<GameEvent>), RuleError> {
        let decision = self.decide(state)?;
        let events = self.play(state, decision.index)?;
        Ok((decision, events))
    }

    // 状态可能被整体替换，决策前以状态中的难度与 AI 执子为准。
    fn sync_agent(&mut self, state: &GameState) {
        let config = self.agent.config();
        if config.difficulty != state.difficulty || config.ai_player != state.ai_player {
            let mut config = config.clone();
            config.difficulty = state.difficulty;
            config.ai_player = state.ai_player;
            self.agent.set_config(config);
        }
    }

    pub fn reset(state: &mut GameState) -> Vec<GameEvent> {
        state.clear_board();
        state.record_event(GameEvent::BoardReset);
        info!("board reset ({:?}, {:?})", state.mode, state.difficulty);
        vec![GameEvent::BoardReset]
    }

    pub fn set_mode(state: &mut GameState, mode: GameMode) -> Vec<GameEvent> {
        state.mode = mode;
        Self::reset(state)
    }

    pub fn set_difficulty(&mut self, state: &mut GameState, difficulty: AiDifficulty) -> Vec<GameEvent> {
        state.difficulty = difficulty;
        self.sync_agent(state);
        Self::reset(state)
    }

    /// 整体替换 AI 配置（难度、AI 执子、思考延迟），并重置棋盘。
    pub fn configure(&mut self, state: &mut GameState, config: AiConfig) -> Vec<GameEvent> {
        state.difficulty = config.difficulty;
        state.ai_player = config.ai_player;
        info!("ai configured: {config:?}");
        self.agent.set_config(config);
        Self::reset(state)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
