use rosc::{OscMessage, OscPacket, OscType, decoder, encoder};

use crate::error::MessageError;
use crate::osc::types::type_code;

/// A decoded OSC message. Immutable once built; the argument count always equals the
/// length of the type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    path: String,
    types: String,
    args: Vec<OscType>,
    // Wire bytes exactly as received (or as encoded, for locally built messages)
    raw: Vec<u8>,
}

impl Message {
    /// Builds a message for sending. The path needs a leading `/` and no empty segments, and
    /// arrays are refused since they don't map onto a single type code.
    pub fn new(path: impl Into<String>, args: Vec<OscType>) -> Result<Message, MessageError> {
        let osc = OscMessage {
            addr: path.into(),
            args,
        };
        let raw = encoder::encode(&OscPacket::Message(osc.clone())).map_err(|err| {
            MessageError::Encode {
                reason: format!("{err:?}"),
            }
        })?;
        Message::from_osc(osc, raw)
    }

    /// Wraps a message produced by the rosc decoder together with the bytes it came from.
    pub fn from_osc(osc: OscMessage, raw: Vec<u8>) -> Result<Message, MessageError> {
        if !is_concrete_path(&osc.addr) {
            return Err(MessageError::InvalidPath { path: osc.addr });
        }
        let types = osc
            .args
            .iter()
            .enumerate()
            .map(|(index, arg)| type_code(arg).ok_or(MessageError::UnsupportedArgument { index }))
            .collect::<Result<String, _>>()?;

        Ok(Message {
            path: osc.addr,
            types,
            args: osc.args,
            raw,
        })
    }

    /// Decodes a single message datagram. Bundles go through [`decode_packet`].
    pub fn decode(bytes: &[u8]) -> Result<Message, MessageError> {
        let mut messages = decode_packet(bytes)?.into_iter();
        match (messages.next(), messages.next()) {
            (Some(message), None) => Ok(message),
            _ => Err(MessageError::Decode {
                reason: "expected exactly one message".to_string(),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn types(&self) -> &str {
        &self.types
    }

    pub fn args(&self) -> &[OscType] {
        &self.args
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw.clone()
    }
}

/// A leading `/` followed by one or more non-empty segments. The bare root `/` has a
/// single empty segment and is refused along with `/a//b` and `/a/`.
fn is_concrete_path(path: &str) -> bool {
    path.strip_prefix('/')
        .is_some_and(|body| body.split('/').all(|segment| !segment.is_empty()))
}

/// Decodes one datagram into the messages it carries, in order.
///
/// A top-level bundle is flattened immediately and its time tag ignored; there is no
/// scheduling. Bundles inside bundles are refused. Messages lifted out of a bundle carry
/// their own re-encoded bytes as `raw`.
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<Message>, MessageError> {
    let (_, packet) = decoder::decode_udp(bytes).map_err(|err| MessageError::Decode {
        reason: format!("{err:?}"),
    })?;

    match packet {
        OscPacket::Message(osc) => Ok(vec![Message::from_osc(osc, bytes.to_vec())?]),
        OscPacket::Bundle(bundle) => bundle
            .content
            .into_iter()
            .map(|inner| match inner {
                OscPacket::Message(osc) => {
                    let raw = encoder::encode(&OscPacket::Message(osc.clone())).map_err(|err| {
                        MessageError::Encode {
                            reason: format!("{err:?}"),
                        }
                    })?;
                    Message::from_osc(osc, raw)
                }
                OscPacket::Bundle(_) => Err(MessageError::NestedBundle),
            })
            .collect(),
    }
}
