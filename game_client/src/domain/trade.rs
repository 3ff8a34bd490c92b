// Resource to currency conversion.
//
// Rates are exact fractions so the per-type floor matches the backend bit for bit.

use crate::domain::resources::{ResourceAmounts, ResourceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionRate {
    pub numerator: u64,
    pub denominator: u64,
}

pub fn rate_for(kind: ResourceType) -> ConversionRate {
    let (numerator, denominator) = match kind {
        ResourceType::Nickel => (1, 10),
        ResourceType::Cobalt => (1, 2),
        ResourceType::Copper => (1, 1),
        ResourceType::Manganese => (2, 1),
    };
    ConversionRate {
        numerator,
        denominator,
    }
}

/// Currency earned for `resources`, floored per type before summing.
pub fn convert(resources: &ResourceAmounts) -> u64 {
    ResourceType::ALL
        .iter()
        .map(|kind| {
            let rate = rate_for(*kind);
            u64::from(resources.get(*kind)) * rate.numerator / rate.denominator
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_basket_converts_to_forty() {
        let resources = ResourceAmounts {
            nickel: 100,
            cobalt: 20,
            copper: 10,
            manganese: 5,
        };

        assert_eq!(convert(&resources), 40);
    }

    #[test]
    fn flooring_is_per_type_not_on_the_total() {
        // 9 nickel -> 0.9 and 1 cobalt -> 0.5: a floor on the sum would give 1.
        let resources = ResourceAmounts {
            nickel: 9,
            cobalt: 1,
            ..Default::default()
        };

        assert_eq!(convert(&resources), 0);
    }
}
