//! Session protocol envelopes
//!
//! Inbound frames come from an untrusted dApp peer: decoding is lenient at
//! the JSON layer and strict at the field layer, so a frame missing required
//! fields yields a typed error the receive loop can log and drop without
//! destabilizing the session. Outbound frames are serde-tagged enums.

use crate::error::{ConnectError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata describing the requesting dApp
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappMetadata {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// dApp origin URL
    #[serde(default)]
    pub url: Option<String>,
    /// Icon URLs
    #[serde(default)]
    pub icons: Vec<String>,
}

/// An inbound request to establish a signing relationship
///
/// Created on receipt, consumed by the host approval/rejection, destroyed
/// after the approve/reject response is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProposal {
    /// Correlation id for the approve/reject round trip
    pub id: String,
    /// Session topic
    pub topic: String,
    /// Chains the dApp wants access to
    pub chains: Vec<String>,
    /// Methods the dApp wants to call
    pub methods: Vec<String>,
    /// Requesting dApp metadata
    #[serde(default)]
    pub dapp: DappMetadata,
}

/// What kind of host decision an inbound request needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Address disclosure request
    Address,
    /// Transaction signing/submission request
    Transaction,
    /// Message signing request
    Message,
}

/// An inbound signing-class request within an established session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Correlation id for the approve/reject round trip
    pub id: String,
    /// Session topic
    pub topic: String,
    /// Chain the request targets, if the dApp scoped it
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Wire method name
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
}

impl SessionRequest {
    /// Classify the request for method-specific host payloads
    pub fn kind(&self) -> RequestKind {
        match self.method.as_str() {
            "eth_requestAccounts" | "eth_accounts" => RequestKind::Address,
            "eth_sendTransaction" | "eth_sendRawTransaction" | "sol_signTransaction"
            | "sol_signAllTransactions" | "sol_signAndSendTransaction" => {
                RequestKind::Transaction
            }
            _ => RequestKind::Message,
        }
    }
}

/// Decoded inbound protocol message
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Session establishment proposal
    Proposal(SessionProposal),
    /// Signing-class request
    Request(SessionRequest),
}

/// Raw wire envelope, lenient by design
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

/// Decode an inbound frame
///
/// Any missing required field is a [`ConnectError::Protocol`]; the caller
/// logs and drops, it never propagates to the host.
pub fn decode_inbound(frame: &str) -> Result<Inbound> {
    let raw: RawEnvelope = serde_json::from_str(frame)
        .map_err(|e| ConnectError::Protocol(format!("undecodable frame: {}", e)))?;

    if raw.event != "session_request" {
        return Err(ConnectError::Protocol(format!(
            "unknown event: {}",
            raw.event
        )));
    }

    let id = match raw.id {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ConnectError::Protocol("missing id".into())),
    };

    let topic = match raw.topic {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ConnectError::Protocol("missing topic".into())),
    };

    match raw.method {
        // Signing-class request: method plus positional params
        Some(method) => {
            let params = match raw.params {
                Some(Value::Array(values)) => values,
                None => Vec::new(),
                Some(_) => {
                    return Err(ConnectError::Protocol(
                        "request params must be an array".into(),
                    ));
                }
            };

            let chain_id = params
                .iter()
                .find_map(|p| p.get("chainId").and_then(|v| v.as_str()))
                .map(|s| s.to_string());

            Ok(Inbound::Request(SessionRequest {
                id,
                topic,
                chain_id,
                method,
                params,
            }))
        }
        // Session proposal: params object carrying chains and methods
        None => {
            let params = raw
                .params
                .ok_or_else(|| ConnectError::Protocol("missing proposal params".into()))?;

            let chains = string_list(params.get("chains"))
                .ok_or_else(|| ConnectError::Protocol("missing proposal chains".into()))?;
            let methods = string_list(params.get("methods"))
                .ok_or_else(|| ConnectError::Protocol("missing proposal methods".into()))?;

            let dapp = params
                .get("dappMetadata")
                .cloned()
                .map(serde_json::from_value::<DappMetadata>)
                .transpose()
                .map_err(|e| ConnectError::Protocol(format!("bad dapp metadata: {}", e)))?
                .unwrap_or_default();

            Ok(Inbound::Proposal(SessionProposal {
                id,
                topic,
                chains,
                methods,
                dapp,
            }))
        }
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let array = value?.as_array()?;
    array
        .iter()
        .map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

/// Outbound protocol messages sent over the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum Outbound {
    /// Host approved the session proposal
    #[serde(rename = "portal_dappSessionApproved")]
    SessionApproved {
        id: String,
        topic: String,
        chains: Vec<String>,
        accounts: Vec<String>,
    },
    /// Host rejected the session proposal
    #[serde(rename = "portal_dappSessionRejected")]
    SessionRejected { id: String, topic: String },
    /// Host approved a signing request; carries the signed result
    #[serde(rename = "portal_signingApproved")]
    SigningApproved {
        id: String,
        topic: String,
        result: Value,
    },
    /// Host rejected a signing request, or execution failed
    #[serde(rename = "portal_signingRejected")]
    SigningRejected {
        id: String,
        topic: String,
        error: String,
    },
}

impl Outbound {
    /// Serialize to a wire frame
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ConnectError::from)
    }
}
