// Domain-level session entities and snapshot types.

pub type NodeId = u32;

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

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceAmounts {
    pub nickel: u32,
    pub cobalt: u32,
    pub copper: u32,
    pub manganese: u32,
}

impl ResourceAmounts {
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

    pub fn is_empty(&self) -> bool {
        ResourceType::ALL.iter().all(|kind| self.get(*kind) == 0)
    }

    /// Per-type minimum of two baskets.
    pub fn min_each(&self, other: &ResourceAmounts) -> ResourceAmounts {
        let mut out = ResourceAmounts::default();
        for kind in ResourceType::ALL {
            *out.get_mut(kind) = self.get(kind).min(other.get(kind));
        }
        out
    }
}

/// Per-wallet authoritative record. `version` increments on every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: String,
    pub tier: u8,
    pub balance: u64,
    /// Resources mined in sessions and not yet traded.
    pub resources: ResourceAmounts,
    pub version: u64,
}

impl Account {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            tier: 1,
            balance: 0,
            resources: ResourceAmounts::default(),
            version: 0,
        }
    }
}

pub struct SessionNode {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub kind: ResourceType,
    pub amount: u32,
    pub depleted: bool,
    pub radius: f32,
}

pub struct SessionPlayer {
    pub conn_id: u64,
    pub address: String,
    pub tier: u8,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub kind: ResourceType,
    pub amount: u32,
    pub depleted: bool,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub address: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub tier: u8,
}

impl From<&SessionNode> for NodeSnapshot {
    fn from(n: &SessionNode) -> Self {
        Self {
            id: n.id,
            x: n.x,
            y: n.y,
            kind: n.kind,
            amount: n.amount,
            depleted: n.depleted,
            radius: n.radius,
        }
    }
}

impl From<&SessionPlayer> for PlayerSnapshot {
    fn from(p: &SessionPlayer) -> Self {
        Self {
            address: p.address.clone(),
            x: p.x,
            y: p.y,
            rotation: p.rotation,
            tier: p.tier,
        }
    }
}
