//! # Core Domain Entities
//!
//! Defines the entities shared by every pipeline-sync subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: `DealId`, `PipelineId`, `StageId`, `ContactId`
//! - **Deals**: `DealRecord`, `DealDraft`, `DealPatch`
//! - **Pipelines**: `PipelineConfig`, `StageConfig`, `LifecycleStage`
//! - **Related Entities**: `Contact`, `HistoryEntry`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Prefix carried by placeholder ids minted for optimistic creates.
pub const TEMP_ID_PREFIX: &str = "temp-";

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id! {
    /// Identifier of a deal record.
    ///
    /// Optimistic creates mint a placeholder id via [`DealId::temp`]; the id
    /// transitions temp → confirmed at most once, when the remote create
    /// settles.
    DealId
}

string_id! {
    /// Identifier of a pipeline. Doubles as the dataset key: one authoritative
    /// cache exists per `PipelineId`.
    PipelineId
}

string_id! {
    /// Identifier of a stage within a pipeline.
    StageId
}

string_id! {
    /// Identifier of a contact record.
    ContactId
}

impl DealId {
    /// Mint a placeholder id for an optimistic create.
    #[must_use]
    pub fn temp() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4()))
    }

    /// Whether this id is an unconfirmed placeholder.
    #[must_use]
    pub fn is_temp(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }
}

/// Current unix timestamp in milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// CLUSTER B: DEALS
// =============================================================================

/// A denormalized view record for one deal.
///
/// This is the read-model projection held by the cache: raw remote fields
/// plus display fields (`stage_label`, `contact_name`) resolved lazily from
/// related entities. Push payloads never carry the display fields, so merges
/// must be field-level to keep them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    /// Record identity. Placeholder until the remote create confirms.
    pub id: DealId,
    /// Owning pipeline (the dataset key).
    pub pipeline_id: PipelineId,
    /// Current stage within the owning pipeline.
    pub stage_id: StageId,
    /// Display title.
    pub title: String,
    /// Monetary value in minor units.
    pub value: i64,
    /// Related contact, if any.
    pub contact_id: Option<ContactId>,
    /// Success terminal flag. Never true together with `is_lost`.
    pub is_won: bool,
    /// Failure terminal flag. Never true together with `is_won`.
    pub is_lost: bool,
    /// Close timestamp (unix ms). Set iff `is_won || is_lost`.
    pub closed_at: Option<u64>,
    /// Denormalized stage label, resolved from the pipeline configuration.
    pub stage_label: Option<String>,
    /// Denormalized contact name, resolved from the contact record.
    pub contact_name: Option<String>,
    /// Originating deal, set on records created by forwarding.
    pub source_deal_id: Option<DealId>,
    /// Last modification timestamp (unix ms).
    pub updated_at: u64,
}

impl DealRecord {
    /// Apply the won transition: set `is_won`, clear `is_lost`, stamp
    /// `closed_at`. Keeps the flag invariants in one place.
    pub fn close_won(&mut self, now: u64) {
        self.is_won = true;
        self.is_lost = false;
        self.closed_at = Some(now);
    }

    /// Apply the lost transition: set `is_lost`, clear `is_won`, stamp
    /// `closed_at`.
    pub fn close_lost(&mut self, now: u64) {
        self.is_won = false;
        self.is_lost = true;
        self.closed_at = Some(now);
    }

    /// Reopen a closed deal: clear both flags and the close timestamp.
    pub fn reopen(&mut self) {
        self.is_won = false;
        self.is_lost = false;
        self.closed_at = None;
    }

    /// Whether the deal sits in a terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.is_won || self.is_lost
    }
}

/// Input for creating a deal, before any id exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealDraft {
    pub pipeline_id: PipelineId,
    pub stage_id: StageId,
    pub title: String,
    pub value: i64,
    pub contact_id: Option<ContactId>,
    /// Set when the draft is produced by forwarding, for traceability.
    pub source_deal_id: Option<DealId>,
}

impl DealDraft {
    /// Build the view record for this draft under the given id.
    ///
    /// Used twice: with a temp id at optimistic begin, and remotely with the
    /// confirmed id.
    #[must_use]
    pub fn materialize(&self, id: DealId, now: u64) -> DealRecord {
        DealRecord {
            id,
            pipeline_id: self.pipeline_id.clone(),
            stage_id: self.stage_id.clone(),
            title: self.title.clone(),
            value: self.value,
            contact_id: self.contact_id.clone(),
            is_won: false,
            is_lost: false,
            closed_at: None,
            stage_label: None,
            contact_name: None,
            source_deal_id: self.source_deal_id.clone(),
            updated_at: now,
        }
    }
}

/// A partial update: only present fields are merged.
///
/// This is both the optimistic diff applied at mutation begin and the payload
/// shape of push `Updated` notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<StageId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<ContactId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_won: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_lost: Option<bool>,
    /// `Some(None)` clears the close timestamp; `None` leaves it untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<Option<u64>>,
}

impl DealPatch {
    /// Merge present fields into `record`, stamping `updated_at`.
    pub fn apply(&self, record: &mut DealRecord, now: u64) {
        if let Some(stage_id) = &self.stage_id {
            record.stage_id = stage_id.clone();
        }
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(value) = self.value {
            record.value = value;
        }
        if let Some(contact_id) = &self.contact_id {
            record.contact_id = Some(contact_id.clone());
        }
        // Flags merge as a unit so a partial payload carrying only the
        // remotely-changed flag can never leave the record both won and
        // lost, and closed_at stays set iff a flag is.
        match (self.is_won, self.is_lost) {
            (Some(true), _) => record.close_won(self.closed_at.flatten().unwrap_or(now)),
            (_, Some(true)) => record.close_lost(self.closed_at.flatten().unwrap_or(now)),
            (Some(false), Some(false)) => record.reopen(),
            (is_won, is_lost) => {
                if let Some(is_won) = is_won {
                    record.is_won = is_won;
                }
                if let Some(is_lost) = is_lost {
                    record.is_lost = is_lost;
                }
                if let Some(closed_at) = self.closed_at {
                    record.closed_at = closed_at;
                }
                if !record.is_closed() {
                    record.closed_at = None;
                }
            }
        }
        record.updated_at = now;
    }

    #[must_use]
    pub fn with_stage(mut self, stage_id: StageId) -> Self {
        self.stage_id = Some(stage_id);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }
}

// =============================================================================
// CLUSTER C: PIPELINES
// =============================================================================

/// External lifecycle marker a stage may be linked to.
///
/// Mirrors the contact lifecycle ladder of the remote CRM. `Customer` is the
/// canonical won marker; `SalesQualifiedLead` and `Opportunity` are the two
/// designated intermediate markers that also qualify a move for forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Subscriber,
    Lead,
    MarketingQualifiedLead,
    SalesQualifiedLead,
    Opportunity,
    Customer,
    Evangelist,
    Other,
}

impl LifecycleStage {
    /// Human-readable label, used in history messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscriber => "Subscriber",
            Self::Lead => "Lead",
            Self::MarketingQualifiedLead => "Marketing Qualified Lead",
            Self::SalesQualifiedLead => "Sales Qualified Lead",
            Self::Opportunity => "Opportunity",
            Self::Customer => "Customer",
            Self::Evangelist => "Evangelist",
            Self::Other => "Other",
        }
    }

    /// Whether reaching this marker counts as a qualifying success for the
    /// forwarding side effect.
    #[must_use]
    pub fn is_success_marker(self) -> bool {
        matches!(
            self,
            Self::Customer | Self::SalesQualifiedLead | Self::Opportunity
        )
    }
}

/// Terminal outcome a stage may be designated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDesignation {
    Won,
    Lost,
}

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: StageId,
    pub label: String,
    /// Linked external lifecycle marker, propagated to the contact on entry.
    pub lifecycle_marker: Option<LifecycleStage>,
    /// Stage-level won/lost designation, the fallback when the pipeline does
    /// not configure terminal stages itself.
    pub designation: Option<OutcomeDesignation>,
}

impl StageConfig {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: StageId::new(id),
            label: label.into(),
            lifecycle_marker: None,
            designation: None,
        }
    }

    #[must_use]
    pub fn with_marker(mut self, marker: LifecycleStage) -> Self {
        self.lifecycle_marker = Some(marker);
        self
    }

    #[must_use]
    pub fn with_designation(mut self, designation: OutcomeDesignation) -> Self {
        self.designation = Some(designation);
        self
    }
}

/// Configuration of one pipeline: ordered stages plus outcome designations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub id: PipelineId,
    pub name: String,
    /// Ordered stage list; forwarding lands new deals in the first stage.
    pub stages: Vec<StageConfig>,
    /// Stage designated as the won terminal, if configured.
    pub won_stage: Option<StageId>,
    /// Stage designated as the lost terminal, if configured.
    pub lost_stage: Option<StageId>,
    /// Pipeline that qualifying success moves forward into, if declared.
    pub forward_to: Option<PipelineId>,
}

impl PipelineConfig {
    /// Look up a stage by id.
    #[must_use]
    pub fn stage(&self, id: &StageId) -> Option<&StageConfig> {
        self.stages.iter().find(|s| &s.id == id)
    }

    /// First stage of the pipeline, where forwarded deals land.
    #[must_use]
    pub fn first_stage(&self) -> Option<&StageConfig> {
        self.stages.first()
    }
}

// =============================================================================
// CLUSTER D: RELATED ENTITIES
// =============================================================================

/// A contact record, the target of lifecycle-marker propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub lifecycle_stage: Option<LifecycleStage>,
}

/// What a history entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    /// The deal moved to another stage.
    StageMoved,
    /// The related contact's lifecycle marker changed.
    LifecycleChanged,
    /// The deal was handed off into a forwarding pipeline.
    Forwarded,
}

/// An immutable audit entry appended by the automation side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub deal_id: DealId,
    pub kind: HistoryKind,
    pub message: String,
    /// Loss reason supplied with the move request, if any.
    pub loss_reason: Option<String>,
    pub recorded_at: u64,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(deal_id: DealId, kind: HistoryKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            deal_id,
            kind,
            message: message.into(),
            loss_reason: None,
            recorded_at: now_ms(),
        }
    }

    #[must_use]
    pub fn with_loss_reason(mut self, reason: impl Into<String>) -> Self {
        self.loss_reason = Some(reason.into());
        self
    }
}
