//! Ban records: who is banned, why, and until when.
//!
//! A ban targets exactly one identity, either a Steam account id or an IPv4
//! address. [`BanTarget`] makes "exactly one" a property of the type: there
//! is no way to build a record that carries both identities, or neither.
//!
//! Storage is someone else's problem. Records only know how to describe
//! themselves and whether they have run out. An expired record is still a
//! valid record; removing it is up to whoever stores it.
//!
//! # Serialized form
//!
//! Stored bans use a flat shape with a `type` discriminator and one
//! optional field per identity:
//!
//! ```json
//! { "type": "Ip", "ip": "10.0.0.7", "reason": "griefing",
//!   "expiration_date": "2026-11-01T00:00:00Z" }
//! ```
//!
//! That shape can express invalid combinations, so it only exists as a
//! private intermediate. Deserialization goes through
//! [`BanRecord::from_parts`], which rejects a missing or conflicting
//! identity.

use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BanError;

/// Which kind of identity a ban applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BanType {
    SteamId,
    Ip,
}

/// The identity a ban applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BanTarget {
    SteamId(u64),
    Ip(Ipv4Addr),
}

impl BanTarget {
    pub fn ban_type(&self) -> BanType {
        match self {
            Self::SteamId(_) => BanType::SteamId,
            Self::Ip(_) => BanType::Ip,
        }
    }
}

impl fmt::Display for BanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SteamId(id) => write!(f, "steam:{id}"),
            Self::Ip(addr) => write!(f, "ip:{addr}"),
        }
    }
}

/// A single ban.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBanRecord", into = "RawBanRecord")]
pub struct BanRecord {
    target: BanTarget,
    reason: Option<String>,
    expiration_date: Option<DateTime<Utc>>,
}

impl BanRecord {
    /// A permanent ban on a Steam account.
    pub fn for_steam_id(steam_id: u64) -> Self {
        Self::new(BanTarget::SteamId(steam_id))
    }

    /// A permanent ban on an IPv4 address.
    pub fn for_ip(addr: Ipv4Addr) -> Self {
        Self::new(BanTarget::Ip(addr))
    }

    pub fn new(target: BanTarget) -> Self {
        Self {
            target,
            reason: None,
            expiration_date: None,
        }
    }

    /// Rebuilds a record from loosely typed storage fields.
    ///
    /// # Errors
    /// - [`BanError::MissingIdentity`] if the field named by `ban_type` is
    ///   absent
    /// - [`BanError::ConflictingIdentity`] if the other identity field is
    ///   present too
    pub fn from_parts(
        ban_type: BanType,
        steam_id: Option<u64>,
        ip: Option<Ipv4Addr>,
    ) -> Result<Self, BanError> {
        let target = match (ban_type, steam_id, ip) {
            (BanType::SteamId, Some(id), None) => BanTarget::SteamId(id),
            (BanType::Ip, None, Some(addr)) => BanTarget::Ip(addr),
            (BanType::SteamId, _, Some(_)) => {
                return Err(BanError::ConflictingIdentity(ban_type, "ip"));
            }
            (BanType::Ip, Some(_), _) => {
                return Err(BanError::ConflictingIdentity(ban_type, "steam_id"));
            }
            (_, None, None) => return Err(BanError::MissingIdentity(ban_type)),
        };
        Ok(Self::new(target))
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn expiring_at(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn target(&self) -> BanTarget {
        self.target
    }

    pub fn ban_type(&self) -> BanType {
        self.target.ban_type()
    }

    /// The banned Steam id, if this is a Steam ban.
    pub fn steam_id(&self) -> Option<u64> {
        match self.target {
            BanTarget::SteamId(id) => Some(id),
            BanTarget::Ip(_) => None,
        }
    }

    /// The banned address, if this is an IP ban.
    pub fn ip(&self) -> Option<Ipv4Addr> {
        match self.target {
            BanTarget::Ip(addr) => Some(addr),
            BanTarget::SteamId(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    /// `true` for bans without an expiration date.
    pub fn is_permanent(&self) -> bool {
        self.expiration_date.is_none()
    }

    /// Whether the ban has run out as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the ban has run out as of `now`. A ban expires at the
    /// instant of its expiration date; permanent bans never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|until| until <= now)
    }
}

impl fmt::Display for BanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({reason})")?;
        }
        match self.expiration_date {
            Some(until) => write!(f, " until {}", until.to_rfc3339()),
            None => write!(f, " permanently"),
        }
    }
}

/// Flat storage shape. Only ever converted through [`BanRecord::from_parts`].
#[derive(Serialize, Deserialize)]
struct RawBanRecord {
    #[serde(rename = "type")]
    ban_type: BanType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    steam_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip: Option<Ipv4Addr>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    expiration_date: Option<DateTime<Utc>>,
}

impl TryFrom<RawBanRecord> for BanRecord {
    type Error = BanError;

    fn try_from(raw: RawBanRecord) -> Result<Self, Self::Error> {
        let mut record = Self::from_parts(raw.ban_type, raw.steam_id, raw.ip)?;
        record.reason = raw.reason;
        record.expiration_date = raw.expiration_date;
        Ok(record)
    }
}

impl From<BanRecord> for RawBanRecord {
    fn from(record: BanRecord) -> Self {
        Self {
            ban_type: record.ban_type(),
            steam_id: record.steam_id(),
            ip: record.ip(),
            reason: record.reason,
            expiration_date: record.expiration_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // =====================================================================
    // Expiration
    // =====================================================================

    #[test]
    fn test_is_expired_without_expiration_is_false() {
        let ban = BanRecord::for_steam_id(76561198000000001);
        assert!(!ban.is_expired());
        assert!(ban.is_permanent());
    }

    #[test]
    fn test_is_expired_future_expiration_is_false() {
        let ban = BanRecord::for_ip(Ipv4Addr::new(10, 0, 0, 7))
            .expiring_at(Utc::now() + Duration::hours(1));
        assert!(!ban.is_expired());
    }

    #[test]
    fn test_is_expired_past_expiration_is_true() {
        let ban = BanRecord::for_ip(Ipv4Addr::new(10, 0, 0, 7))
            .expiring_at(Utc::now() - Duration::minutes(1));
        assert!(ban.is_expired());
    }

    #[test]
    fn test_is_expired_at_boundary_is_true() {
        let until = Utc::now();
        let ban = BanRecord::for_steam_id(1).expiring_at(until);
        assert!(!ban.is_expired_at(until - Duration::seconds(1)));
        assert!(ban.is_expired_at(until));
    }

    #[test]
    fn test_is_expired_does_not_change_record() {
        let ban = BanRecord::for_steam_id(1).expiring_at(Utc::now() - Duration::days(1));
        let before = ban.clone();
        assert!(ban.is_expired());
        assert_eq!(ban, before);
    }

    // =====================================================================
    // Identity
    // =====================================================================

    #[test]
    fn test_ip_ban_never_carries_steam_id() {
        let ban = BanRecord::for_ip(Ipv4Addr::new(192, 168, 1, 2));
        assert_eq!(ban.ban_type(), BanType::Ip);
        assert_eq!(ban.ip(), Some(Ipv4Addr::new(192, 168, 1, 2)));
        assert_eq!(ban.steam_id(), None);
    }

    #[test]
    fn test_steam_ban_never_carries_ip() {
        let ban = BanRecord::for_steam_id(42);
        assert_eq!(ban.ban_type(), BanType::SteamId);
        assert_eq!(ban.steam_id(), Some(42));
        assert_eq!(ban.ip(), None);
    }

    #[test]
    fn test_from_parts_missing_identity_returns_error() {
        assert_eq!(
            BanRecord::from_parts(BanType::Ip, None, None),
            Err(BanError::MissingIdentity(BanType::Ip))
        );
    }

    #[test]
    fn test_from_parts_conflicting_identity_returns_error() {
        let result = BanRecord::from_parts(
            BanType::SteamId,
            Some(1),
            Some(Ipv4Addr::LOCALHOST),
        );
        assert_eq!(
            result,
            Err(BanError::ConflictingIdentity(BanType::SteamId, "ip"))
        );

        let result = BanRecord::from_parts(BanType::Ip, Some(1), None);
        assert_eq!(
            result,
            Err(BanError::ConflictingIdentity(BanType::Ip, "steam_id"))
        );
    }

    // =====================================================================
    // Serialized form
    // =====================================================================

    #[test]
    fn test_serialize_ip_ban_omits_steam_id() {
        let ban = BanRecord::for_ip(Ipv4Addr::new(10, 0, 0, 7)).with_reason("griefing");
        let json = serde_json::to_value(&ban).unwrap();

        assert_eq!(json["type"], "Ip");
        assert_eq!(json["ip"], "10.0.0.7");
        assert_eq!(json["reason"], "griefing");
        assert!(json.get("steam_id").is_none());
    }

    #[test]
    fn test_deserialize_valid_steam_ban() {
        let json = r#"{
            "type": "SteamId",
            "steam_id": 76561198000000001,
            "reason": "cheating",
            "expiration_date": "2030-01-01T00:00:00Z"
        }"#;
        let ban: BanRecord = serde_json::from_str(json).unwrap();

        assert_eq!(ban.steam_id(), Some(76561198000000001));
        assert_eq!(ban.reason(), Some("cheating"));
        assert!(ban.expiration_date().is_some());
    }

    #[test]
    fn test_deserialize_missing_identity_is_rejected() {
        let json = r#"{ "type": "SteamId", "reason": "cheating" }"#;
        let result: Result<BanRecord, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_conflicting_identity_is_rejected() {
        let json = r#"{ "type": "Ip", "ip": "1.2.3.4", "steam_id": 5 }"#;
        let result: Result<BanRecord, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_display_mentions_target_reason_and_duration() {
        let ban = BanRecord::for_steam_id(9).with_reason("spam");
        assert_eq!(ban.to_string(), "steam:9 (spam) permanently");
    }
}
