//! Wire protocol between browser clients and the server.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`; `data` may be absent.
//! Field names and integer encodings follow the browser client the
//! protocol was written for.

use crate::invite::InviteCode;
use derive_more::{Display, Error, From};
use naughts_rules::{Mark, Outcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

/// Inbound event names.
pub mod event {
    /// Public matchmaking request.
    pub const FIND_GAME: &str = "find_game";
    /// Private matchmaking request, hosting or joining by code.
    pub const FIND_GAME_PRIVATE: &str = "find_game_private";
    /// Move submission.
    pub const SET_BOARD: &str = "set_board";
    /// Leave the queue or the current session.
    pub const LEAVE_GAME: &str = "leave_game";
    /// Start over after a finished session.
    pub const REPLAY_GAME: &str = "replay_game";
}

/// How a private matchmaking request wants to pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateRequest {
    /// No code supplied: wait under a freshly generated code.
    Host,
    /// Join the pending entry holding this code.
    Join(InviteCode),
    /// A code was supplied but is not a string.
    Unreadable,
}

/// A decoded client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `find_game`
    FindGame,
    /// `find_game_private`
    FindGamePrivate(PrivateRequest),
    /// `set_board`
    SetBoard {
        /// Cell index as sent; range is checked by the session.
        index: usize,
    },
    /// `leave_game`
    LeaveGame,
    /// `replay_game`
    ReplayGame,
}

/// Why an inbound frame was not understood.
#[derive(Debug, Display, Error, From)]
pub enum ProtocolError {
    /// Frame is not a JSON envelope.
    #[display("Malformed frame: {}", _0)]
    Json(serde_json::Error),
    /// Event name is not part of the protocol.
    #[display("Unknown event {:?}", _0)]
    #[from(ignore)]
    UnknownEvent(#[error(not(source))] String),
    /// `set_board` without a non-negative integer `index`.
    #[display("set_board without a usable index")]
    #[from(ignore)]
    BadIndex,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ClientMessage {
    /// Decodes a JSON text frame.
    #[instrument(err(level = "debug"))]
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let Envelope { event: name, data } = serde_json::from_str(text)?;
        match name.as_str() {
            event::FIND_GAME => Ok(Self::FindGame),
            event::FIND_GAME_PRIVATE => Ok(Self::FindGamePrivate(private_request(&data))),
            event::SET_BOARD => {
                let index = data
                    .get("index")
                    .and_then(cell_index)
                    .ok_or(ProtocolError::BadIndex)?;
                Ok(Self::SetBoard { index })
            }
            event::LEAVE_GAME => Ok(Self::LeaveGame),
            event::REPLAY_GAME => Ok(Self::ReplayGame),
            _ => Err(ProtocolError::UnknownEvent(name)),
        }
    }
}

/// Any non-negative whole number; browsers may send `4.0` for `4`.
fn cell_index(value: &Value) -> Option<usize> {
    let index = match value.as_u64() {
        Some(index) => index,
        None => {
            let float = value.as_f64()?;
            if float < 0.0 || float.fract() != 0.0 || float > u32::MAX as f64 {
                return None;
            }
            float as u64
        }
    };
    usize::try_from(index).ok()
}

fn private_request(data: &Value) -> PrivateRequest {
    let code = data.get("private_id").or_else(|| data.get("inviteCode"));
    match code {
        None | Some(Value::Null) => PrivateRequest::Host,
        Some(Value::String(code)) => PrivateRequest::Join(InviteCode::parse(code)),
        Some(_) => PrivateRequest::Unreadable,
    }
}

/// Outcome of a move as the client encodes it.
///
/// `-1` in progress, `0` won by X, `1` won by O, `2` draw.
#[instrument]
pub fn wire_result(outcome: Outcome, mover: Mark) -> i8 {
    match outcome {
        Outcome::InProgress => -1,
        Outcome::Won => u8::from(mover) as i8,
        Outcome::Draw => 2,
    }
}

/// A message sent to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session (re)started; tells the client which mark it plays.
    StartGame {
        /// The recipient's mark.
        player: Mark,
        /// Mark to move first.
        turn: Mark,
    },
    /// Queued and waiting for an opponent.
    WaitForPlayer {
        /// Code to share for a private session.
        #[serde(skip_serializing_if = "Option::is_none")]
        private_id: Option<InviteCode>,
        /// Ready-made link embedding the code, when a public URL is configured.
        #[serde(skip_serializing_if = "Option::is_none")]
        invite_url: Option<String>,
    },
    /// The opponent's accepted move.
    GameUpdate {
        /// See [`wire_result`].
        result: i8,
        /// Mark to move next.
        turn: Mark,
        /// Cell the opponent played.
        index: usize,
    },
    /// Opponent left, disconnected, or the session no longer exists.
    OpponentDisconnect,
    /// Supplied invite code matched no pending private entry.
    InvalidPrivateId,
}

impl ServerMessage {
    /// Encodes the message as a JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_set_board() {
        let msg = ClientMessage::decode(r#"{"event":"set_board","data":{"index":4}}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetBoard { index: 4 });
    }

    #[test]
    fn test_decode_set_board_keeps_out_of_range_index() {
        let msg = ClientMessage::decode(r#"{"event":"set_board","data":{"index":12}}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetBoard { index: 12 });
    }

    #[test]
    fn test_decode_accepts_whole_float_index() {
        let msg = ClientMessage::decode(r#"{"event":"set_board","data":{"index":4.0}}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetBoard { index: 4 });
    }

    #[test]
    fn test_decode_rejects_unusable_index() {
        for frame in [
            r#"{"event":"set_board"}"#,
            r#"{"event":"set_board","data":{}}"#,
            r#"{"event":"set_board","data":{"index":"4"}}"#,
            r#"{"event":"set_board","data":{"index":-1}}"#,
            r#"{"event":"set_board","data":{"index":1.5}}"#,
            r#"{"event":"set_board","data":{"index":-2.0}}"#,
        ] {
            assert!(
                matches!(ClientMessage::decode(frame), Err(ProtocolError::BadIndex)),
                "{frame} should be rejected"
            );
        }
    }

    #[test]
    fn test_decode_private_requests() {
        let host = ClientMessage::decode(r#"{"event":"find_game_private"}"#).unwrap();
        assert_eq!(host, ClientMessage::FindGamePrivate(PrivateRequest::Host));

        let join =
            ClientMessage::decode(r#"{"event":"find_game_private","data":{"private_id":"AB12CD"}}"#)
                .unwrap();
        assert_eq!(
            join,
            ClientMessage::FindGamePrivate(PrivateRequest::Join(InviteCode::parse("AB12CD")))
        );

        let alias =
            ClientMessage::decode(r#"{"event":"find_game_private","data":{"inviteCode":"ZZ0000"}}"#)
                .unwrap();
        assert_eq!(
            alias,
            ClientMessage::FindGamePrivate(PrivateRequest::Join(InviteCode::parse("ZZ0000")))
        );

        let bad = ClientMessage::decode(r#"{"event":"find_game_private","data":{"private_id":7}}"#)
            .unwrap();
        assert_eq!(bad, ClientMessage::FindGamePrivate(PrivateRequest::Unreadable));
    }

    #[test]
    fn test_decode_unknown_and_garbage() {
        assert!(matches!(
            ClientMessage::decode(r#"{"event":"cheat"}"#),
            Err(ProtocolError::UnknownEvent(name)) if name == "cheat"
        ));
        assert!(matches!(
            ClientMessage::decode("not json"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_encode_messages() {
        let start = ServerMessage::StartGame {
            player: Mark::O,
            turn: Mark::X,
        };
        assert_eq!(
            serde_json::to_value(&start).unwrap(),
            json!({"event": "start_game", "data": {"player": 1, "turn": 0}})
        );

        let wait = ServerMessage::WaitForPlayer {
            private_id: None,
            invite_url: None,
        };
        assert_eq!(
            serde_json::to_value(&wait).unwrap(),
            json!({"event": "wait_for_player", "data": {}})
        );

        let update = ServerMessage::GameUpdate {
            result: wire_result(Outcome::Won, Mark::O),
            turn: Mark::X,
            index: 6,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"event": "game_update", "data": {"result": 1, "turn": 0, "index": 6}})
        );

        assert_eq!(
            ServerMessage::OpponentDisconnect.encode().unwrap(),
            r#"{"event":"opponent_disconnect"}"#
        );
    }

    #[test]
    fn test_wire_result_codes() {
        assert_eq!(wire_result(Outcome::InProgress, Mark::X), -1);
        assert_eq!(wire_result(Outcome::Won, Mark::X), 0);
        assert_eq!(wire_result(Outcome::Won, Mark::O), 1);
        assert_eq!(wire_result(Outcome::Draw, Mark::O), 2);
    }
}
