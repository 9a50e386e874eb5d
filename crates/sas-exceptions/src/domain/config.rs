//! Per-client exception queue configuration.
//!
//! # Example
//!
//! ```ignore
//! use sas_exceptions::domain::ExceptionQueueConfigBuilder;
//!
//! let config = ExceptionQueueConfigBuilder::new(0)
//!     .discard_oldest(true)
//!     .aft(true)
//!     .validation(true)
//!     .build()?;
//! ```

use super::codes::DeliveryGroup;
use super::errors::ExceptionError;
use serde::{Deserialize, Serialize};

/// Maximum normal (non-priority) exceptions held per client.
pub const MAX_NORMAL_EXCEPTIONS: usize = 25;

/// Number of host clients an EGM can serve concurrently.
pub const MAX_HOST_CLIENTS: u8 = 2;

/// Jurisdiction settings that change ordering and overflow behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JurisdictionOptions {
    /// Deliver `HandpayIsPending` ahead of `HandpayValidated`.
    pub legacy_handpay_ordering: bool,
    /// Validation type "none": ticket-printed and handpay-validated are
    /// ordinary FIFO exceptions.
    pub none_validation: bool,
    /// On overflow evict the oldest exception instead of dropping the newest.
    pub discard_oldest: bool,
}

/// What happens to a normal exception arriving at a full FIFO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    DiscardOldest,
    DiscardNewest,
}

impl JurisdictionOptions {
    pub fn overflow_policy(&self) -> OverflowPolicy {
        if self.discard_oldest {
            OverflowPolicy::DiscardOldest
        } else {
            OverflowPolicy::DiscardNewest
        }
    }
}

/// Optional delivery groups a client subscribes to.
///
/// `General` is implied for every client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSubscriptions {
    pub aft: bool,
    pub validation: bool,
    pub general_control: bool,
    pub legacy_bonus: bool,
    pub progressive: bool,
    pub game_start_end: bool,
}

impl GroupSubscriptions {
    /// Subscribe to every group.
    pub fn all() -> Self {
        Self {
            aft: true,
            validation: true,
            general_control: true,
            legacy_bonus: true,
            progressive: true,
            game_start_end: true,
        }
    }

    /// Groups this client joins, `General` first.
    pub fn groups(&self) -> Vec<DeliveryGroup> {
        let optional = [
            (self.aft, DeliveryGroup::Aft),
            (self.validation, DeliveryGroup::Validation),
            (self.general_control, DeliveryGroup::GeneralControl),
            (self.legacy_bonus, DeliveryGroup::LegacyBonus),
            (self.progressive, DeliveryGroup::Progressive),
            (self.game_start_end, DeliveryGroup::GameStartEnd),
        ];

        std::iter::once(DeliveryGroup::General)
            .chain(
                optional
                    .into_iter()
                    .filter_map(|(enabled, group)| enabled.then_some(group)),
            )
            .collect()
    }
}

/// Configuration for one host client's exception queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionQueueConfig {
    /// Host client (SAS port) this queue answers polls for.
    pub client_id: u8,
    #[serde(default)]
    pub jurisdiction: JurisdictionOptions,
    #[serde(default)]
    pub subscriptions: GroupSubscriptions,
}

impl ExceptionQueueConfig {
    /// Create a validated configuration.
    pub fn new(
        client_id: u8,
        jurisdiction: JurisdictionOptions,
        subscriptions: GroupSubscriptions,
    ) -> Result<Self, ExceptionError> {
        let config = Self {
            client_id,
            jurisdiction,
            subscriptions,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ExceptionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExceptionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ExceptionError> {
        if self.client_id >= MAX_HOST_CLIENTS {
            return Err(ExceptionError::InvalidClient {
                client_id: self.client_id,
                max: MAX_HOST_CLIENTS - 1,
            });
        }
        Ok(())
    }
}

/// Builder for [`ExceptionQueueConfig`].
#[derive(Debug, Default)]
pub struct ExceptionQueueConfigBuilder {
    client_id: u8,
    jurisdiction: JurisdictionOptions,
    subscriptions: GroupSubscriptions,
}

impl ExceptionQueueConfigBuilder {
    pub fn new(client_id: u8) -> Self {
        Self {
            client_id,
            ..Self::default()
        }
    }

    pub fn legacy_handpay_ordering(mut self, enabled: bool) -> Self {
        self.jurisdiction.legacy_handpay_ordering = enabled;
        self
    }

    pub fn none_validation(mut self, enabled: bool) -> Self {
        self.jurisdiction.none_validation = enabled;
        self
    }

    pub fn discard_oldest(mut self, enabled: bool) -> Self {
        self.jurisdiction.discard_oldest = enabled;
        self
    }

    pub fn aft(mut self, enabled: bool) -> Self {
        self.subscriptions.aft = enabled;
        self
    }

    pub fn validation(mut self, enabled: bool) -> Self {
        self.subscriptions.validation = enabled;
        self
    }

    pub fn general_control(mut self, enabled: bool) -> Self {
        self.subscriptions.general_control = enabled;
        self
    }

    pub fn legacy_bonus(mut self, enabled: bool) -> Self {
        self.subscriptions.legacy_bonus = enabled;
        self
    }

    pub fn progressive(mut self, enabled: bool) -> Self {
        self.subscriptions.progressive = enabled;
        self
    }

    pub fn game_start_end(mut self, enabled: bool) -> Self {
        self.subscriptions.game_start_end = enabled;
        self
    }

    pub fn subscriptions(mut self, subscriptions: GroupSubscriptions) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    /// Build the configuration, validating the client id.
    pub fn build(self) -> Result<ExceptionQueueConfig, ExceptionError> {
        ExceptionQueueConfig::new(self.client_id, self.jurisdiction, self.subscriptions)
    }
}
