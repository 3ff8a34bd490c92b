use crate::domain::state::{ResourceAmounts, ResourceType};

// (numerator, denominator) per resource; exact so the floor matches the client.
fn rate(kind: ResourceType) -> (u64, u64) {
    match kind {
        ResourceType::Nickel => (1, 10),
        ResourceType::Cobalt => (1, 2),
        ResourceType::Copper => (1, 1),
        ResourceType::Manganese => (2, 1),
    }
}

/// Currency for `resources`, floored per type before summing.
pub fn convert(resources: &ResourceAmounts) -> u64 {
    ResourceType::ALL
        .iter()
        .map(|kind| {
            let (numerator, denominator) = rate(*kind);
            u64::from(resources.get(*kind)) * numerator / denominator
        })
        .sum()
}
