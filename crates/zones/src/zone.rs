use serde::{Deserialize, Serialize};

use acm_core::{Entity, define_id};

define_id!(
    /// Zone identifier (analytic group in the host ERP).
    ZoneId
);

define_id!(
    /// Market zone map identifier.
    MarketZoneMapId
);

/// Which locks of a zone a map image is used for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockUsage {
    /// Every lock of the zone.
    #[default]
    All,
    /// Locks whose number falls within the map's bounds.
    Custom,
}

/// A map image attached to a zone.
///
/// Lock numbers and bounds are kept as entered (free text); they are only
/// interpreted as numbers when a lookup happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketZoneMap {
    id: MarketZoneMapId,
    usage: LockUsage,
    start_lock_number: Option<String>,
    end_lock_number: Option<String>,
    map: Option<Vec<u8>>,
}

impl MarketZoneMap {
    pub fn new(id: MarketZoneMapId) -> Self {
        Self {
            id,
            usage: LockUsage::All,
            start_lock_number: None,
            end_lock_number: None,
            map: None,
        }
    }

    pub fn with_map(mut self, image: impl Into<Vec<u8>>) -> Self {
        self.map = Some(image.into());
        self
    }

    /// Switch to `Custom` with the given bounds.
    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.usage = LockUsage::Custom;
        self.start_lock_number = Some(start.into());
        self.end_lock_number = Some(end.into());
        self
    }

    pub fn usage(&self) -> LockUsage {
        self.usage
    }

    pub fn start_lock_number(&self) -> Option<&str> {
        self.start_lock_number.as_deref()
    }

    pub fn end_lock_number(&self) -> Option<&str> {
        self.end_lock_number.as_deref()
    }

    pub fn map(&self) -> Option<&[u8]> {
        self.map.as_deref()
    }

    /// Change the usage mode. Bounds are always cleared, even when the mode
    /// does not actually change.
    pub fn set_usage(&mut self, usage: LockUsage) {
        self.usage = usage;
        self.start_lock_number = None;
        self.end_lock_number = None;
    }

    pub fn set_bounds(&mut self, start: Option<String>, end: Option<String>) {
        self.start_lock_number = start;
        self.end_lock_number = end;
    }

    /// Whether this map applies to the lock with the given number.
    ///
    /// Never fails: a lock number or bound that is missing or not numeric
    /// makes the map not applicable.
    pub fn has_map(&self, lock_number: &str) -> bool {
        if self.map.is_none() {
            return false;
        }
        match self.usage {
            LockUsage::All => true,
            LockUsage::Custom => self.in_range(lock_number).unwrap_or(false),
        }
    }

    fn in_range(&self, lock_number: &str) -> Option<bool> {
        let start = parse_number(self.start_lock_number.as_deref()?)?;
        let end = parse_number(self.end_lock_number.as_deref()?)?;
        let lock = parse_number(lock_number)?;
        Some(start <= lock && lock <= end)
    }
}

impl Entity for MarketZoneMap {
    type Id = MarketZoneMapId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Lightweight reference to a zone, embedded in product locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneRef {
    pub id: ZoneId,
    pub name: String,
}

/// A zone of the market (e.g. "1A").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    id: ZoneId,
    name: String,
    /// Free-text load weight label.
    pub load_weight: Option<String>,
    /// Free-text label for any other weight limit.
    pub other_weight: Option<String>,
    maps: Vec<MarketZoneMap>,
}

impl Zone {
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            load_weight: None,
            other_weight: None,
            maps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn maps(&self) -> &[MarketZoneMap] {
        &self.maps
    }

    pub fn add_map(&mut self, map: MarketZoneMap) {
        self.maps.push(map);
    }

    pub fn to_ref(&self) -> ZoneRef {
        ZoneRef {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// First map of this zone that applies to `lock_number`.
    pub fn map_for_lock(&self, lock_number: &str) -> Option<&MarketZoneMap> {
        self.maps.iter().find(|m| m.has_map(lock_number))
    }
}

impl Entity for Zone {
    type Id = ZoneId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
