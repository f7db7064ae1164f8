//! Space entity.

use common::SpaceId;
use serde::{Deserialize, Serialize};

use crate::value_objects::{Money, RateUnit};

/// A rentable space as held by the space catalog.
///
/// `available` is a derived projection: it must be false exactly while a
/// confirmed booking with a future end time occupies the space. Only the
/// orchestrator's commit step and the reconciliation pass mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub description: String,
    pub location: String,
    pub price_per_hour: Money,
    pub price_per_day: Money,
    pub available: bool,
    pub image_url: Option<String>,
}

impl Space {
    /// Returns the price for one unit of the given billing granularity.
    pub fn rate(&self, unit: RateUnit) -> Money {
        match unit {
            RateUnit::Hour => self.price_per_hour,
            RateUnit::Day => self.price_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_space() -> Space {
        Space {
            id: SpaceId::new(),
            name: "Rooftop Studio".to_string(),
            description: "Open-plan studio with natural light".to_string(),
            location: "Westlands, Nairobi".to_string(),
            price_per_hour: Money::from_units(10),
            price_per_day: Money::from_units(60),
            available: true,
            image_url: None,
        }
    }

    #[test]
    fn test_rate_selects_unit_price() {
        let space = sample_space();
        assert_eq!(space.rate(RateUnit::Hour), Money::from_units(10));
        assert_eq!(space.rate(RateUnit::Day), Money::from_units(60));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let space = sample_space();
        let json = serde_json::to_string(&space).unwrap();
        let deserialized: Space = serde_json::from_str(&json).unwrap();
        assert_eq!(space, deserialized);
    }
}
