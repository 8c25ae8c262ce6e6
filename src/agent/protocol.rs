//! ssh-agent wire protocol subset
//!
//! Every message is `[u32 BE length][u8 type][fields]`, where byte strings
//! are `[u32 BE length][bytes]`. Only two requests are spoken here:
//! add-identity-constrained and remove-identity. Every reply we accept is
//! exactly `[0 0 0 1][status]`.

use std::io::{Read, Write};

use crate::crypto::{key_blob, Ed25519Identity, ScratchBuffer, ALGORITHM, PUBLIC_KEY_LEN};
use crate::error::{Result, SlpmError};

pub const SSH_AGENT_FAILURE: u8 = 5;
pub const SSH_AGENT_SUCCESS: u8 = 6;
pub const SSH2_AGENTC_REMOVE_IDENTITY: u8 = 18;
pub const SSH2_AGENTC_ADD_ID_CONSTRAINED: u8 = 25;

/// Constraint: ask the user before every signature
pub const SSH_AGENT_CONSTRAIN_CONFIRM: u8 = 2;

/// Length field plus one status byte
pub const RESPONSE_LEN: usize = 5;

const FRAME_CAPACITY: usize = 4096;

/// One outgoing request. Zeroed on drop since add requests carry the secret key.
pub type Frame = ScratchBuffer<FRAME_CAPACITY>;

fn begin(message_type: u8) -> Frame {
    let mut frame = Frame::new();
    frame.put_u32(0).push(message_type);
    frame
}

fn finish(frame: &mut Frame) {
    let body_len = (frame.len() - 4) as u32;
    frame.set_u32_at(0, body_len);
}

/// SSH2_AGENTC_ADD_ID_CONSTRAINED for an Ed25519 identity
pub fn add_identity_request(identity: &Ed25519Identity, comment: &str) -> Frame {
    let mut frame = begin(SSH2_AGENTC_ADD_ID_CONSTRAINED);
    frame
        .put_string(ALGORITHM.as_bytes())
        .put_string(identity.public_key())
        .put_string(identity.secret_key())
        .put_string(comment.as_bytes())
        .push(SSH_AGENT_CONSTRAIN_CONFIRM);
    finish(&mut frame);
    frame
}

/// SSH2_AGENTC_REMOVE_IDENTITY; the key travels as a length-prefixed key blob
pub fn remove_identity_request(public_key: &[u8; PUBLIC_KEY_LEN]) -> Frame {
    let mut frame = begin(SSH2_AGENTC_REMOVE_IDENTITY);
    frame.put_string(key_blob(public_key).as_bytes());
    finish(&mut frame);
    frame
}

/// Validate a 5-byte agent reply
pub fn parse_response(response: &[u8; RESPONSE_LEN]) -> Result<()> {
    let len = u32::from_be_bytes([response[0], response[1], response[2], response[3]]);
    if len != 1 {
        return Err(SlpmError::AgentUnexpectedLength(len));
    }
    match response[4] {
        SSH_AGENT_SUCCESS => Ok(()),
        status => Err(SlpmError::AgentFailure(status)),
    }
}

/// Send `frame` and wait for the agent's verdict
pub fn transact<S: Read + Write>(stream: &mut S, frame: &Frame) -> Result<()> {
    frame.write_to(stream).map_err(SlpmError::AgentIo)?;

    let mut response = [0u8; RESPONSE_LEN];
    stream.read_exact(&mut response).map_err(SlpmError::AgentIo)?;
    parse_response(&response)
}
