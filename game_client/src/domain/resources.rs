// Per-type resource counters and the capacity rules that bound them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Nickel,
    Cobalt,
    Copper,
    Manganese,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Nickel,
        ResourceType::Cobalt,
        ResourceType::Copper,
        ResourceType::Manganese,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Nickel => "nickel",
            ResourceType::Cobalt => "cobalt",
            ResourceType::Copper => "copper",
            ResourceType::Manganese => "manganese",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unsigned quantity per resource type. Used for both held resources and capacities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceAmounts {
    pub nickel: u32,
    pub cobalt: u32,
    pub copper: u32,
    pub manganese: u32,
}

impl ResourceAmounts {
    /// Same value for every type (tier capacities are uniform).
    pub fn uniform(value: u32) -> Self {
        Self {
            nickel: value,
            cobalt: value,
            copper: value,
            manganese: value,
        }
    }

    pub fn get(&self, kind: ResourceType) -> u32 {
        match kind {
            ResourceType::Nickel => self.nickel,
            ResourceType::Cobalt => self.cobalt,
            ResourceType::Copper => self.copper,
            ResourceType::Manganese => self.manganese,
        }
    }

    pub fn get_mut(&mut self, kind: ResourceType) -> &mut u32 {
        match kind {
            ResourceType::Nickel => &mut self.nickel,
            ResourceType::Cobalt => &mut self.cobalt,
            ResourceType::Copper => &mut self.copper,
            ResourceType::Manganese => &mut self.manganese,
        }
    }

    pub fn total(&self) -> u64 {
        ResourceType::ALL
            .iter()
            .map(|kind| u64::from(self.get(*kind)))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Result of asking whether storage can take `requested` more units of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceptance {
    /// Units that fit, `min(requested, free)`.
    pub accepted: u32,
    /// True when part of the request did not fit.
    pub overflow: bool,
}

pub fn free_capacity(current: &ResourceAmounts, capacity: &ResourceAmounts, kind: ResourceType) -> u32 {
    capacity.get(kind).saturating_sub(current.get(kind))
}

pub fn can_accept_more(
    current: &ResourceAmounts,
    capacity: &ResourceAmounts,
    kind: ResourceType,
    requested: u32,
) -> Acceptance {
    let accepted = requested.min(free_capacity(current, capacity, kind));
    Acceptance {
        accepted,
        overflow: accepted < requested,
    }
}

/// Summed usage over summed capacity, rounded to a whole percent in `0..=100`.
pub fn storage_percentage(current: &ResourceAmounts, capacity: &ResourceAmounts) -> u8 {
    let capacity_total = capacity.total();
    if capacity_total == 0 {
        return 0;
    }
    let used = current.total().min(capacity_total);
    ((used as f64 / capacity_total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_everything_that_fits() {
        let current = ResourceAmounts::default();
        let capacity = ResourceAmounts::uniform(100);

        let result = can_accept_more(&current, &capacity, ResourceType::Copper, 40);

        assert_eq!(
            result,
            Acceptance {
                accepted: 40,
                overflow: false
            }
        );
    }

    #[test]
    fn clamps_to_remaining_space_and_flags_overflow() {
        let current = ResourceAmounts {
            cobalt: 95,
            ..Default::default()
        };
        let capacity = ResourceAmounts::uniform(100);

        let result = can_accept_more(&current, &capacity, ResourceType::Cobalt, 10);

        assert_eq!(result.accepted, 5);
        assert!(result.overflow);
    }

    #[test]
    fn zero_capacity_type_never_accepts() {
        let capacity = ResourceAmounts {
            manganese: 0,
            ..ResourceAmounts::uniform(50)
        };

        let result = can_accept_more(
            &ResourceAmounts::default(),
            &capacity,
            ResourceType::Manganese,
            1,
        );

        assert_eq!(result.accepted, 0);
        assert!(result.overflow);
    }

    #[test]
    fn over_full_storage_never_goes_negative() {
        let current = ResourceAmounts::uniform(120);
        let capacity = ResourceAmounts::uniform(100);

        assert_eq!(free_capacity(&current, &capacity, ResourceType::Nickel), 0);
        assert_eq!(storage_percentage(&current, &capacity), 100);
    }

    #[test]
    fn storage_percentage_is_summed_over_all_types() {
        let current = ResourceAmounts {
            nickel: 100,
            cobalt: 80,
            copper: 0,
            manganese: 0,
        };
        let capacity = ResourceAmounts::uniform(100);

        assert_eq!(storage_percentage(&current, &capacity), 45);
        // Same inputs, same answer.
        assert_eq!(storage_percentage(&current, &capacity), 45);
    }

    #[test]
    fn storage_percentage_with_no_capacity_is_zero() {
        assert_eq!(
            storage_percentage(&ResourceAmounts::uniform(3), &ResourceAmounts::default()),
            0
        );
    }
}
