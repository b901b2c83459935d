pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use log::warn;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::fmt::Display;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    find_winning_move, minimax, select_move, AiAgent, AiConfig, AiDecision, AiDifficulty, AiError,
    DecisionReason, SearchResult, DEFAULT_THINK_DELAY_MS,
};
pub use game::{
    evaluate, winning_line, Board, BoardError, GameEvent, GameMode, GameState, Mark, Outcome,
    Player, RuleEngine, RuleError, RuleResolution, Score,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_console_logger(log::LevelFilter::Info);
}

fn to_js_error<E: Serialize + Display>(error: E) -> JsValue {
    warn!("{error}");
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn parse_or_default<T: FromStr + Default>(value: Option<&str>, what: &str) -> T {
    match value {
        None => T::default(),
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("unknown {what} {raw:?}, falling back to default");
            T::default()
        }),
    }
}

fn parse_setting<T: FromStr>(raw: &str, what: &str) -> Result<T, JsValue> {
    raw.parse().map_err(|_| {
        to_js_error(AiError::InvalidInput {
            reason: format!("unknown {what} {raw:?}"),
        })
    })
}

#[wasm_bindgen]
pub struct GameEngine {
    state: GameState,
    engine: RuleEngine,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: Option<String>, difficulty: Option<String>) -> GameEngine {
        let mode: GameMode = parse_or_default(mode.as_deref(), "mode");
        let difficulty: AiDifficulty = parse_or_default(difficulty.as_deref(), "difficulty");
        let config = AiConfig::from_difficulty(difficulty);
        GameEngine {
            state: GameState::with_config(mode, &config),
            engine: RuleEngine::with_agent(AiAgent::new(config)),
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    pub fn score_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.score).map_err(serde_to_js_error)
    }

    pub fn outcome_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state.outcome()).map_err(serde_to_js_error)
    }

    pub fn is_ai_turn(&self) -> bool {
        self.state.is_ai_turn()
    }

    /// 人类玩家落子。
    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let events = self
            .engine
            .human_move(&mut self.state, index)
            .map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }

    /// 立即替 AI 决策并落子。
    pub fn ai_move(&mut self) -> Result<String, JsValue> {
        let (decision, events) = self.engine.ai_turn(&mut self.state).map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.state.clone(), events).with_decision(decision))
    }

    pub fn reset(&mut self) -> Result<String, JsValue> {
        let events = RuleEngine::reset(&mut self.state);
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<String, JsValue> {
        let mode: GameMode = parse_setting(mode, "mode")?;
        let events = RuleEngine::set_mode(&mut self.state, mode);
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<String, JsValue> {
        let difficulty: AiDifficulty = parse_setting(difficulty, "difficulty")?;
        let events = self.engine.set_difficulty(&mut self.state, difficulty);
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }

    /// 以 JSON 形式的 `AiConfig` 重新配置 AI，例如 `{"ai_player":"X"}`；缺省字段取默认值。
    pub fn configure_ai_json(&mut self, config_json: &str) -> Result<String, JsValue> {
        let config: AiConfig = serde_json::from_str(config_json).map_err(serde_to_js_error)?;
        let events = self.engine.configure(&mut self.state, config);
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }

    /// 应用 `think_ai` 给出的落子。
    pub fn apply_ai_move(&mut self, index: usize) -> Result<String, JsValue> {
        if !self.state.is_ai_turn() {
            return Err(to_js_error(RuleError::NotAiTurn));
        }
        let events = self
            .engine
            .play(&mut self.state, index)
            .map_err(to_js_error)?;
        make_resolution_json(RuleResolution::new(self.state.clone(), events))
    }

    /// 立即用引擎的 AI 决策，延迟后以决策 JSON 兑现 Promise；不落子，前端随后调用 `apply_ai_move`。
    /// 未指定延迟时使用 AI 配置中的 `think_delay_ms`。
    pub fn think_ai(&mut self, delay_ms: Option<u32>) -> Promise {
        let delay = delay_ms.unwrap_or(self.engine.agent().config().think_delay_ms);
        let decided = self
            .engine
            .decide(&self.state)
            .map_err(to_js_error)
            .and_then(|decision| serde_json::to_string(&decision).map_err(serde_to_js_error));

        future_to_promise(async move {
            let json = decided?;
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            Ok(JsValue::from_str(&json))
        })
    }
}

/// 返回一个空棋盘（9 个 `null`）。
#[wasm_bindgen(js_name = "createBoard")]
pub fn create_board() -> Result<JsValue, JsValue> {
    to_value(&Board::new()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&evaluate(&board)).map_err(JsValue::from)
}

/// 无状态的选步入口；传入 `seed` 时 easy / medium 的随机部分可复现。
#[wasm_bindgen(js_name = "selectMove")]
pub fn pick_move(
    board: JsValue,
    difficulty: &str,
    ai_mark: &str,
    opponent_mark: &str,
    seed: Option<u32>,
) -> Result<usize, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    let difficulty: AiDifficulty = parse_setting(difficulty, "difficulty")?;
    let ai: Player = parse_setting(ai_mark, "mark")?;
    let opponent: Player = parse_setting(opponent_mark, "mark")?;
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(u64::from(seed)),
        None => SmallRng::from_entropy(),
    };
    select_move(&board, difficulty, ai, opponent, &mut rng).map_err(to_js_error)
}
