//! Entity change notifications from contract logs
//!
//! [`RpcEventPoller`] tails `eth_getLogs` for a configurable set of event
//! signatures and turns each matching log into an [`EntityEvent`]. Which
//! topic or data word carries the entity id is part of each [`EventRule`].

use super::abi;
use super::rpc::{RpcClient, RpcLog};
use super::{Address, EntityEvent, EventKind};
use crate::error::ReadError;
use futures::stream::{self, Stream, StreamExt};
use hnforge_traits::{keccak256, EntityId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Where a value sits inside a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdLocation {
    /// Indexed topic (0 is the signature hash)
    Topic(usize),
    /// Word of the non-indexed data
    Data(usize),
}

/// Event kind a rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Mint
    Created,
    /// Live attribute update
    AttributesChanged,
    /// Ownership transfer, needs a recipient location
    Transfer,
}

/// Maps one event signature to [`EntityEvent`]s
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRule {
    /// Produced kind
    pub kind: RuleKind,
    /// Solidity event signature, e.g. `Transfer(address,address,uint256)`
    pub signature: String,
    /// Location of the entity id
    pub id: IdLocation,
    /// Location of the recipient, for transfers
    #[serde(default)]
    pub recipient: Option<IdLocation>,
}

impl EventRule {
    /// Default rules for the entity contract
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                kind: RuleKind::Created,
                signature: "SpawnHn(address,uint256)".to_string(),
                id: IdLocation::Data(1),
                recipient: None,
            },
            Self {
                kind: RuleKind::AttributesChanged,
                signature: "SetHashrates(uint256,uint256[])".to_string(),
                id: IdLocation::Data(0),
                recipient: None,
            },
            Self {
                kind: RuleKind::Transfer,
                signature: "Transfer(address,address,uint256)".to_string(),
                id: IdLocation::Topic(3),
                recipient: Some(IdLocation::Topic(2)),
            },
        ]
    }

    /// `0x`-prefixed signature hash matched against `topics[0]`
    #[must_use]
    pub fn topic(&self) -> String {
        format!("0x{}", hex::encode(keccak256(self.signature.as_bytes())))
    }

    /// Decode a log already known to match this rule
    ///
    /// # Errors
    /// `ReadError::Decode` when a location is missing or malformed
    pub fn decode(&self, log: &RpcLog) -> Result<EntityEvent, ReadError> {
        let id = EntityId::new(abi::word_to_u64(&locate(log, self.id)?)?);
        let kind = match self.kind {
            RuleKind::Created => EventKind::Created,
            RuleKind::AttributesChanged => EventKind::AttributesChanged,
            RuleKind::Transfer => {
                let at = self.recipient.ok_or_else(|| {
                    ReadError::Decode(format!("rule {} has no recipient location", self.signature))
                })?;
                EventKind::TransferredTo(Address::from_word(&locate(log, at)?))
            }
        };
        Ok(EntityEvent { id, kind })
    }
}

fn locate(log: &RpcLog, at: IdLocation) -> Result<[u8; 32], ReadError> {
    match at {
        IdLocation::Topic(i) => {
            let topic = log
                .topics
                .get(i)
                .ok_or_else(|| ReadError::Decode(format!("log has no topic {i}")))?;
            abi::word_at(&abi::parse_hex_data(topic)?, 0)
        }
        IdLocation::Data(i) => abi::word_at(&abi::parse_hex_data(&log.data)?, i),
    }
}

/// Polls contract logs and yields entity events
#[derive(Debug, Clone)]
pub struct RpcEventPoller {
    client: RpcClient,
    contract: Address,
    rules: Vec<(String, EventRule)>,
    interval: Duration,
    max_span: u64,
    next_block: Option<u64>,
}

impl RpcEventPoller {
    /// Create poller for `contract` matching `rules`
    ///
    /// Starts at the chain head unless [`RpcEventPoller::starting_at`] is set.
    #[must_use]
    pub fn new(client: RpcClient, contract: Address, rules: Vec<EventRule>) -> Self {
        Self {
            client,
            contract,
            rules: rules.into_iter().map(|r| (r.topic(), r)).collect(),
            interval: Duration::from_secs(5),
            max_span: 2_000,
            next_block: None,
        }
    }

    /// With poll interval
    #[inline]
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// With maximum blocks per `eth_getLogs` request
    #[inline]
    #[must_use]
    pub fn with_max_span(mut self, blocks: u64) -> Self {
        self.max_span = blocks.max(1);
        self
    }

    /// Start from `block` instead of the head
    #[inline]
    #[must_use]
    pub fn starting_at(mut self, block: u64) -> Self {
        self.next_block = Some(block);
        self
    }

    /// Next block to be scanned, once known
    #[inline]
    #[must_use]
    pub fn next_block(&self) -> Option<u64> {
        self.next_block
    }

    /// Scan the next block window once
    ///
    /// Logs that match no rule or fail to decode are skipped with a warning.
    ///
    /// # Errors
    /// Any RPC failure; the window is retried on the next call
    pub async fn poll_once(&mut self) -> Result<Vec<EntityEvent>, ReadError> {
        let head = self.client.block_number().await?;
        let from = *self.next_block.get_or_insert(head.saturating_add(1));
        if from > head {
            return Ok(Vec::new());
        }
        let to = head.min(from.saturating_add(self.max_span - 1));

        let topics: Vec<String> = self.rules.iter().map(|(t, _)| t.clone()).collect();
        let logs = self.client.get_logs(self.contract, &topics, from, to).await?;
        self.next_block = Some(to + 1);

        let events: Vec<EntityEvent> = logs.iter().filter_map(|log| self.decode(log)).collect();
        debug!(from, to, logs = logs.len(), events = events.len(), "logs scanned");
        Ok(events)
    }

    fn decode(&self, log: &RpcLog) -> Option<EntityEvent> {
        let topic0 = log.topics.first()?.to_ascii_lowercase();
        let (_, rule) = self.rules.iter().find(|(t, _)| *t == topic0)?;
        match rule.decode(log) {
            Ok(event) => Some(event),
            Err(error) => {
                warn!(%error, signature = %rule.signature, "undecodable log skipped");
                None
            }
        }
    }

    /// Endless event stream, polling every interval
    ///
    /// Poll failures are logged and retried; the stream never ends on its own.
    pub fn into_stream(self) -> impl Stream<Item = EntityEvent> + Send {
        stream::unfold(self, |mut poller| async move {
            loop {
                match poller.poll_once().await {
                    Ok(batch) if !batch.is_empty() => return Some((stream::iter(batch), poller)),
                    Ok(_) => {}
                    Err(error) => warn!(%error, "event poll failed"),
                }
                tokio::time::sleep(poller.interval).await;
            }
        })
        .flatten()
    }
}
