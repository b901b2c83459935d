use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ai::{AiConfig, AiDifficulty};

use super::rules::{evaluate, Outcome};

/// 棋盘格子数量（3x3）。
pub const BOARD_CELLS: usize = 9;
/// 棋盘边长。
pub const BOARD_SIDE: usize = 3;

/// 玩家标识，同时也是落在棋盘上的两种棋子。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn mark(self) -> Mark {
        match self {
            Player::X => Mark::X,
            Player::O => Mark::O,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Player::X),
            "O" | "o" => Ok(Player::O),
            _ => Err(()),
        }
    }
}

/// 单个格子的内容。序列化为 `"X"`、`"O"` 或 `null`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(from = "Option<Player>", into = "Option<Player>")]
pub enum Mark {
    #[default]
    Empty,
    X,
    O,
}

impl Mark {
    pub fn player(self) -> Option<Player> {
        match self {
            Mark::Empty => None,
            Mark::X => Some(Player::X),
            Mark::O => Some(Player::O),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Mark::Empty
    }

    fn to_char(self) -> char {
        match self {
            Mark::Empty => '.',
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }
}

impl From<Option<Player>> for Mark {
    fn from(value: Option<Player>) -> Self {
        value.map(Player::mark).unwrap_or(Mark::Empty)
    }
}

impl From<Mark> for Option<Player> {
    fn from(value: Mark) -> Self {
        value.player()
    }
}

impl From<Player> for Mark {
    fn from(value: Player) -> Self {
        value.mark()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum BoardError {
    #[error("board must have exactly 9 cells, got {len}")]
    InvalidLength { len: usize },
    #[error("unrecognised cell value {value:?}")]
    InvalidCell { value: char },
}

/// 3x3 棋盘，按行优先存储（index = row * 3 + col）。
///
/// 棋盘是一个小的值类型，搜索时每个分支都复制一份，调用方的棋盘不会被修改。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(try_from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct Board {
    cells: [Mark; BOARD_CELLS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Mark; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Mark; BOARD_CELLS] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied()
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Mark::Empty))
    }

    /// 所有空格的下标，升序。
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..BOARD_CELLS).filter(|&index| self.is_empty_at(index)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|&&cell| cell == mark).count()
    }

    /// 返回在 `index` 落子后的新棋盘；越界或已占用时返回 `None`。
    pub fn with_mark(&self, index: usize, player: Player) -> Option<Board> {
        if !self.is_empty_at(index) {
            return None;
        }
        let mut next = *self;
        next.cells[index] = player.mark();
        Some(next)
    }
}

impl TryFrom<Vec<Mark>> for Board {
    type Error = BoardError;

    fn try_from(value: Vec<Mark>) -> Result<Self, Self::Error> {
        let len = value.len();
        let cells: [Mark; BOARD_CELLS] = value
            .try_into()
            .map_err(|_| BoardError::InvalidLength { len })?;
        Ok(Self { cells })
    }
}

impl From<Board> for Vec<Mark> {
    fn from(value: Board) -> Self {
        value.cells.to_vec()
    }
}

impl FromStr for Board {
    type Err = BoardError;

    /// 解析紧凑文本形式，例如 `"XX..O...."`；`.`、`_` 或空格表示空格子，换行会被忽略。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let marks = s
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .map(|c| match c {
                '.' | '_' | ' ' => Ok(Mark::Empty),
                'X' | 'x' => Ok(Mark::X),
                'O' | 'o' => Ok(Mark::O),
                other => Err(BoardError::InvalidCell { value: other }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Board::try_from(marks)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.chunks(BOARD_SIDE).enumerate() {
            if row > 0 {
                f.write_str("\n")?;
            }
            for cell in cells {
                write!(f, "{}", cell.to_char())?;
            }
        }
        Ok(())
    }
}

/// 对战模式：两名玩家轮流，或与 AI 对战。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Friend,
    Ai,
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "friend" | "pvp" | "human" => Ok(GameMode::Friend),
            "ai" | "computer" => Ok(GameMode::Ai),
            _ => Err(()),
        }
    }
}

/// 累计比分，跨越多局保留，重置棋盘时不清零。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Score {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
}

impl Score {
    pub fn get(&self, player: Player) -> u32 {
        match player {
            Player::X => self.x,
            Player::O => self.o,
        }
    }

    pub fn record_win(&mut self, player: Player) {
        match player {
            Player::X => self.x += 1,
            Player::O => self.o += 1,
        }
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MovePlayed { player: Player, index: usize },
    GameWon { winner: Player, line: [usize; 3] },
    GameDrawn,
    BoardReset,
}

/// 一局对战的完整状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub next_player: Player,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub difficulty: AiDifficulty,
    #[serde(default = "default_ai_player")]
    pub ai_player: Player,
    #[serde(default)]
    pub score: Score,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

fn default_ai_player() -> Player {
    Player::O
}

impl GameState {
    pub fn new(mode: GameMode, difficulty: AiDifficulty) -> Self {
        Self {
            board: Board::new(),
            next_player: Player::X,
            mode,
            difficulty,
            ai_player: default_ai_player(),
            score: Score::default(),
            event_log: Vec::new(),
        }
    }

    pub fn with_config(mode: GameMode, config: &AiConfig) -> Self {
        let mut state = Self::new(mode, config.difficulty);
        state.ai_player = config.ai_player;
        state
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn outcome(&self) -> Outcome {
        evaluate(&self.board)
    }

    pub fn is_finished(&self) -> bool {
        self.outcome() != Outcome::InProgress
    }

    pub fn is_ai_turn(&self) -> bool {
        self.mode == GameMode::Ai && self.next_player == self.ai_player && !self.is_finished()
    }

    /// 清空棋盘并由 X 先手；比分保留，事件流只保留当前一局。
    pub fn clear_board(&mut self) {
        self.board = Board::new();
        self.next_player = Player::X;
        self.event_log.clear();
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new(GameMode::default(), AiDifficulty::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compact_board() {
        let board: Board = "XX..O....".parse().expect("board should parse");
        assert_eq!(board.get(0), Some(Mark::X));
        assert_eq!(board.get(4), Some(Mark::O));
        assert_eq!(board.empty_cells(), vec![2, 3, 5, 6, 7, 8]);
        assert_eq!(board.to_string(), "XX.\n.O.\n...");
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(
            "XX..O...".parse::<Board>(),
            Err(BoardError::InvalidLength { len: 8 })
        );
        assert_eq!(
            "XX..Q....".parse::<Board>(),
            Err(BoardError::InvalidCell { value: 'Q' })
        );
    }

    #[test]
    fn board_json_uses_null_for_empty_cells() {
        let board: Board = "X...O....".parse().expect("board should parse");
        let json = serde_json::to_string(&board).expect("board should serialize");
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);

        let short = serde_json::from_str::<Board>(r#"["X",null]"#);
        assert!(short.is_err(), "short boards must be rejected");
    }

    #[test]
    fn with_mark_leaves_original_untouched() {
        let board = Board::new();
        let next = board.with_mark(4, Player::X).expect("cell should be free");
        assert!(board.is_empty_at(4));
        assert_eq!(next.get(4), Some(Mark::X));
        assert!(next.with_mark(4, Player::O).is_none());
        assert!(next.with_mark(BOARD_CELLS, Player::O).is_none());
    }

    #[test]
    fn score_tracks_each_player() {
        let mut score = Score::default();
        score.record_win(Player::O);
        score.record_win(Player::O);
        score.record_win(Player::X);
        assert_eq!(score.get(Player::X), 1);
        assert_eq!(score.get(Player::O), 2);
        assert_eq!(
            serde_json::to_value(score).expect("score should serialize"),
            serde_json::json!({ "X": 1, "O": 2 })
        );
    }
}
