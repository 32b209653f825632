//! JSON wire messages exchanged over the WebSocket
//!
//! Each text frame carries one or more JSON objects separated by newlines.
//! Server messages are distinguished by their fields rather than by a tag,
//! which is why [`ServerMessage`] is untagged and its variants are ordered
//! from most to least specific.

use crate::action::{Action, Direction};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Board layout as sent to clients at the start of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub id: u32,
    pub width: i32,
    pub height: i32,
    pub player: [i32; 2],
    pub walls: Vec<[i32; 2]>,
    pub targets: Vec<[i32; 2]>,
    pub boxes: Vec<[i32; 2]>,
}

/// Request sent by a client once its session has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub action: String,
    /// A direction that is not a string decodes as `None`, so the move still
    /// reaches the session and fails there.
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub direction: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(direction)) => Ok(Some(direction)),
        _ => Ok(None),
    }
}

impl ClientMessage {
    pub fn new(action: &str, direction: Option<&str>) -> Self {
        Self {
            action: action.to_string(),
            direction: direction.map(str::to_string),
        }
    }

    pub fn from_action(action: &Action) -> Self {
        Self::new(
            action.kind.wire_name(),
            action.direction.map(Direction::wire_name),
        )
    }

    /// Decodes a single client frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text.trim())
    }

    pub fn to_action(&self) -> Action {
        Action::from_wire(&self.action, self.direction.as_deref())
    }
}

/// Personalised start message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStart {
    pub num_players: usize,
    pub me: usize,
    pub board: BoardView,
}

/// Acknowledgement sent to the player who submitted an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub player: usize,
    pub move_valid: bool,
}

/// Another player's successful action, or a win notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub player: usize,
    pub action: String,
    pub direction: String,
}

/// Reply to a frame that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub player: usize,
    pub error: String,
}

pub const WIN_ACTION: &str = "win";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Start(GameStart),
    Result(ActionResult),
    Action(PlayerAction),
    Error(ErrorReply),
}

impl ServerMessage {
    pub fn start(num_players: usize, me: usize, board: BoardView) -> Self {
        ServerMessage::Start(GameStart {
            num_players,
            me,
            board,
        })
    }

    pub fn result(player: usize, move_valid: bool) -> Self {
        ServerMessage::Result(ActionResult { player, move_valid })
    }

    pub fn opponent_action(player: usize, action: &Action) -> Self {
        ServerMessage::Action(PlayerAction {
            player,
            action: action.kind.label().to_string(),
            direction: action.direction_label().to_string(),
        })
    }

    pub fn win(player: usize) -> Self {
        ServerMessage::Action(PlayerAction {
            player,
            action: WIN_ACTION.to_string(),
            direction: "?".to_string(),
        })
    }

    pub fn error(player: usize, error: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorReply {
            player,
            error: error.into(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Splits a text frame into its newline-separated messages.
    pub fn parse_frame(text: &str) -> Vec<Result<Self, serde_json::Error>> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, Direction};
    use serde_json::json;

    fn as_value(message: &ServerMessage) -> Value {
        serde_json::from_str(&message.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_client_message_with_direction() {
        let msg = ClientMessage::parse(r#"{"action":"move","direction":"up"}"#).unwrap();
        assert_eq!(msg.to_action(), Action::walk(Direction::Up));
    }

    #[test]
    fn test_client_message_direction_is_optional() {
        let msg = ClientMessage::parse("  {\"action\":\"undo\"}\n").unwrap();
        assert_eq!(msg.direction, None);
        assert_eq!(msg.to_action().kind, ActionKind::Undo);
    }

    #[test]
    fn test_client_message_rejects_non_string_action() {
        assert!(ClientMessage::parse(r#"{"action":3}"#).is_err());
        assert!(ClientMessage::parse(r#"{"direction":"up"}"#).is_err());
        assert!(ClientMessage::parse("not json").is_err());
    }

    #[test]
    fn test_client_message_non_string_direction_fails_the_move() {
        for frame in [
            r#"{"action":"move","direction":7}"#,
            r#"{"action":"move","direction":["up"]}"#,
            r#"{"action":"move","direction":null}"#,
        ] {
            let msg = ClientMessage::parse(frame).unwrap();
            assert_eq!(msg.direction, None);
            let action = msg.to_action();
            assert_eq!(action.kind, ActionKind::Move);
            assert_eq!(action.direction, None);
        }
    }

    #[test]
    fn test_start_message_shape() {
        let board = BoardView {
            id: 2,
            width: 3,
            height: 1,
            player: [0, 0],
            walls: vec![],
            targets: vec![[2, 0]],
            boxes: vec![[1, 0]],
        };
        let value = as_value(&ServerMessage::start(2, 1, board));
        assert_eq!(
            value,
            json!({
                "num_players": 2,
                "me": 1,
                "board": {
                    "id": 2, "width": 3, "height": 1, "player": [0, 0],
                    "walls": [], "targets": [[2, 0]], "boxes": [[1, 0]]
                }
            })
        );
    }

    #[test]
    fn test_result_and_broadcast_shapes() {
        assert_eq!(
            as_value(&ServerMessage::result(0, false)),
            json!({"player": 0, "move_valid": false})
        );
        assert_eq!(
            as_value(&ServerMessage::opponent_action(1, &Action::walk(Direction::Left))),
            json!({"player": 1, "action": "Move", "direction": "Left"})
        );
        assert_eq!(
            as_value(&ServerMessage::opponent_action(1, &Action::undo())),
            json!({"player": 1, "action": "Undo", "direction": "?"})
        );
        assert_eq!(
            as_value(&ServerMessage::win(0)),
            json!({"player": 0, "action": "win", "direction": "?"})
        );
        assert_eq!(
            as_value(&ServerMessage::error(1, "bad request")),
            json!({"player": 1, "error": "bad request"})
        );
    }

    #[test]
    fn test_parse_frame_splits_merged_messages() {
        let frame = "{\"player\":0,\"move_valid\":true}\n{\"player\":0,\"action\":\"win\",\"direction\":\"?\"}";
        let messages: Vec<ServerMessage> = ServerMessage::parse_frame(frame)
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert_eq!(
            messages,
            vec![ServerMessage::result(0, true), ServerMessage::win(0)]
        );
    }
}
