//! Market zones and their lock maps.
//!
//! A zone groups rental locks (e.g. "1A"); each zone may carry map images,
//! either for every lock of the zone or for a numeric range of lock numbers.

pub mod zone;

pub use zone::{LockUsage, MarketZoneMap, MarketZoneMapId, Zone, ZoneId, ZoneRef};
