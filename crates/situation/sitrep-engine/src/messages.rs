//! Field message triage
//!
//! Messages arrive from the field (already scored by the NLP classifier) or are
//! issued by operators at the command center. Both flow through a caller-owned
//! [`MessageBoard`], which assigns creation order and ids, enforces the
//! forward-only status lifecycle and produces the ranked feed.

use crate::classification::Tier;
use crate::config::{EngineConfig, SubmitScores};
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Active,
    Responding,
    Assigned,
    Investigating,
    Resolved,
}

impl MessageStatus {
    /// Position in the lifecycle: active(0) -> in progress(1) -> resolved(2)
    fn stage(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Responding | Self::Assigned | Self::Investigating => 1,
            Self::Resolved => 2,
        }
    }

    /// Whether moving to `next` keeps the lifecycle moving forward
    ///
    /// Moves between the in-progress states are allowed; moving back to an
    /// earlier stage or "moving" to the current status is not.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        next != self && next.stage() >= self.stage()
    }

    pub fn is_open(self) -> bool {
        self != Self::Resolved
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Responding => "responding",
            Self::Assigned => "assigned",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
        }
    }
}

impl FromStr for MessageStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "responding" => Ok(Self::Responding),
            "assigned" => Ok(Self::Assigned),
            "investigating" => Ok(Self::Investigating),
            "resolved" => Ok(Self::Resolved),
            _ => Err(EngineError::label("message status", s)),
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message identity
///
/// Field reports and operator submissions are numbered independently, so a
/// feed's own ids never collide with the board's operator entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "source", content = "seq", rename_all = "lowercase")]
pub enum MessageId {
    Field(u64),
    Operator(u64),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(seq) => write!(f, "field-{seq}"),
            Self::Operator(seq) => write!(f, "operator-{seq}"),
        }
    }
}

/// Message as received from the field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(alias = "type")]
    pub tier: String,
    /// Classifier urgency score; defaults to the tier's submission score
    #[serde(default, alias = "priority")]
    pub score: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub responder: Option<String>,
    #[serde(default)]
    pub created_order: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Triaged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub tier: Tier,
    /// Urgency score, 0-100
    pub score: u8,
    pub title: String,
    pub category: String,
    pub location: String,
    pub details: Option<String>,
    pub status: MessageStatus,
    /// `None` until dispatched
    pub responder: Option<String>,
    /// Monotonic creation order, used as the recency tiebreak
    pub created_order: u64,
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn is_high_priority(&self) -> bool {
        self.tier.is_high_priority()
    }

    /// Copy of this message moved to `status`
    pub fn transition(&self, status: MessageStatus) -> Result<Message> {
        if !self.status.can_transition_to(status) {
            return Err(EngineError::transition(self.status, status));
        }
        Ok(Message {
            status,
            ..self.clone()
        })
    }
}

/// Copy of `message` moved to `status`, rejecting backward moves
pub fn transition(message: &Message, status: MessageStatus) -> Result<Message> {
    message.transition(status)
}

fn required(field: &str, value: &Option<String>) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(EngineError::message(format!("missing required field '{field}'"))),
    }
}

fn successor(value: u64, field: &str) -> Result<u64> {
    value
        .checked_add(1)
        .ok_or_else(|| EngineError::message(format!("{field} {value} is out of range")))
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl RawMessage {
    /// Validate into a message with the given id and creation order
    pub fn validate(&self, id: MessageId, created_order: u64, scores: &SubmitScores) -> Result<Message> {
        let tier = self.tier.parse::<Tier>()?;
        let title = required("title", &self.title)?;
        let category = required("category", &self.category)?;

        let score = match self.score {
            Some(score) => u8::try_from(score)
                .ok()
                .filter(|s| *s <= 100)
                .ok_or_else(|| EngineError::message(format!("score must be within 0-100, got {score}")))?,
            None => scores.for_tier(tier),
        };

        let status = match non_blank(&self.status) {
            Some(label) => label.parse::<MessageStatus>()?,
            None => MessageStatus::Active,
        };

        Ok(Message {
            id,
            tier,
            score,
            title,
            category,
            location: non_blank(&self.location).unwrap_or_default(),
            details: non_blank(&self.details),
            status,
            responder: non_blank(&self.responder),
            created_order,
            created_at: self.created_at,
        })
    }
}

/// Ranking order: score desc, then most recently created first
pub fn rank_order(a: &Message, b: &Message) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.created_order.cmp(&a.created_order))
}

/// Messages sorted for the triage feed
pub fn rank(messages: &[Message]) -> Vec<Message> {
    let mut ranked = messages.to_vec();
    ranked.sort_by(rank_order);
    ranked
}

/// Caller-owned message store for one session
///
/// The board is a plain value; callers sharing it between threads must
/// serialize access so creation order stays monotonic.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBoard {
    messages: Vec<Message>,
    next_order: u64,
    next_field_id: u64,
    next_operator_id: u64,
    scores: SubmitScores,
    command_center: String,
}

impl MessageBoard {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            messages: Vec::new(),
            next_order: 0,
            next_field_id: 1,
            next_operator_id: 1,
            scores: config.submit_scores,
            command_center: config.command_center_location.clone(),
        }
    }

    /// Validate a field message and add it to the board
    pub fn ingest(&mut self, raw: &RawMessage) -> Result<Message> {
        let seq = raw.id.unwrap_or(self.next_field_id);
        let id = MessageId::Field(seq);
        if self.get(id).is_some() {
            return Err(EngineError::message(format!("duplicate message id {id}")));
        }
        let order = raw.created_order.unwrap_or(self.next_order);
        let next_field_id = successor(seq, "message id")?;
        let next_order = successor(order, "created_order")?;

        let message = raw.validate(id, order, &self.scores)?;
        self.next_field_id = self.next_field_id.max(next_field_id);
        self.next_order = self.next_order.max(next_order);

        tracing::debug!(id = %id, tier = %message.tier, score = message.score, "Ingested message");
        self.messages.push(message.clone());
        Ok(message)
    }

    /// Issue an operator message, prepended to the board pending dispatch
    pub fn submit(&mut self, title: &str, tier: Tier, category: &str) -> Result<Message> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::message("missing required field 'title'"));
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(EngineError::message("missing required field 'category'"));
        }

        let id = MessageId::Operator(self.next_operator_id);
        let next_operator_id = successor(self.next_operator_id, "operator id")?;
        let next_order = successor(self.next_order, "created_order")?;

        let message = Message {
            id,
            tier,
            score: self.scores.for_tier(tier),
            title: title.to_string(),
            category: category.to_string(),
            location: self.command_center.clone(),
            details: None,
            status: MessageStatus::Active,
            responder: None,
            created_order: self.next_order,
            created_at: Some(Utc::now()),
        };
        self.next_operator_id = next_operator_id;
        self.next_order = next_order;

        tracing::info!(id = %id, tier = %tier, "Operator message submitted");
        self.messages.insert(0, message.clone());
        Ok(message)
    }

    /// Board for one refresh cycle: `feed` ingested into a fresh board, with
    /// this board's entries carried over and ordered after the feed
    ///
    /// `self` is not modified. Carried entries keep their relative order and
    /// stay at the front of the board.
    pub fn with_feed(&self, feed: &[RawMessage]) -> Result<MessageBoard> {
        let mut session = MessageBoard {
            messages: Vec::with_capacity(feed.len() + self.messages.len()),
            next_order: 0,
            next_field_id: self.next_field_id,
            next_operator_id: self.next_operator_id,
            scores: self.scores,
            command_center: self.command_center.clone(),
        };
        for raw in feed {
            session.ingest(raw)?;
        }

        let base = session.next_order;
        let mut carried = Vec::with_capacity(feed.len() + self.messages.len());
        for message in &self.messages {
            if session.get(message.id).is_some() {
                return Err(EngineError::message(format!("duplicate message id {}", message.id)));
            }
            let created_order = base
                .checked_add(message.created_order)
                .ok_or_else(|| EngineError::message(format!("created_order for {} is out of range", message.id)))?;
            carried.push(Message {
                created_order,
                ..message.clone()
            });
        }
        session.next_order = base
            .checked_add(self.next_order)
            .ok_or_else(|| EngineError::message("created_order is out of range"))?;

        carried.append(&mut session.messages);
        session.messages = carried;
        Ok(session)
    }

    /// Move a message forward in its lifecycle
    pub fn transition(&mut self, id: MessageId, status: MessageStatus) -> Result<&Message> {
        let slot = self.slot_mut(id)?;
        *slot = slot.transition(status)?;
        Ok(slot)
    }

    /// Assign a responder; an active message becomes assigned
    pub fn dispatch(&mut self, id: MessageId, responder: &str) -> Result<&Message> {
        let responder = responder.trim();
        if responder.is_empty() {
            return Err(EngineError::message("responder must not be blank"));
        }

        let slot = self.slot_mut(id)?;
        if !slot.is_open() {
            return Err(EngineError::transition(slot.status, MessageStatus::Assigned));
        }
        if slot.status == MessageStatus::Active {
            *slot = slot.transition(MessageStatus::Assigned)?;
        }
        slot.responder = Some(responder.to_string());

        tracing::info!(id = %id, responder, "Message dispatched");
        Ok(slot)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Messages in board order (operator submissions first)
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn ranked(&self) -> Vec<Message> {
        rank(&self.messages)
    }

    /// Unresolved messages
    pub fn open(&self) -> impl Iterator<Item = &Message> + Clone {
        self.messages.iter().filter(|m| m.is_open())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn slot_mut(&mut self, id: MessageId) -> Result<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| EngineError::message(format!("no message with id {id}")))
    }
}
