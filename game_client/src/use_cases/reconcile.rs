// Reconciliation of optimistic local mining with the authoritative session.
//
// Consistency model: a session snapshot supersedes everything since the previous
// snapshot. The node list is replaced wholesale and the ack queue is dropped; no
// per-field merge is attempted. Between snapshots, `resource-mined` events can only
// lower node amounts, so nodes never become mineable again without a snapshot.

use crate::domain::{NodeId, ResourceNode, ResourceType};
use crate::use_cases::mining::MineReceipt;
use crate::use_cases::types::MinedEvent;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Upper bound on remembered unacknowledged mines.
const MAX_PENDING: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMine {
    pub seq: u64,
    pub node_id: NodeId,
    pub kind: ResourceType,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinedOutcome {
    /// Our own request, matched to the oldest pending entry for that node.
    Acknowledged { seq: u64, shortfall: u32 },
    /// Another player's mine, or an ack we no longer track.
    Foreign,
    /// The event names a node we do not know.
    UnknownNode,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    pending: VecDeque<PendingMine>,
    next_seq: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Remembers an optimistic mine until the session acknowledges it.
    pub fn record(&mut self, receipt: &MineReceipt) -> u64 {
        self.next_seq += 1;
        if self.pending.len() == MAX_PENDING {
            if let Some(dropped) = self.pending.pop_front() {
                warn!(seq = dropped.seq, node_id = dropped.node_id, "ack queue full; dropping oldest");
            }
        }
        self.pending.push_back(PendingMine {
            seq: self.next_seq,
            node_id: receipt.node_id,
            kind: receipt.kind,
            amount: receipt.amount,
        });
        self.next_seq
    }

    /// Replaces the local node list with the snapshot's and forgets pending acks.
    pub fn apply_snapshot(&mut self, nodes: &mut Vec<ResourceNode>, snapshot: Vec<ResourceNode>) {
        if !self.pending.is_empty() {
            debug!(
                dropped = self.pending.len(),
                "snapshot supersedes unacknowledged mines"
            );
        }
        *nodes = snapshot;
        self.pending.clear();
    }

    /// Folds a `resource-mined` event into local node state.
    pub fn apply_mined(
        &mut self,
        nodes: &mut [ResourceNode],
        event: &MinedEvent,
        own_address: Option<&str>,
    ) -> MinedOutcome {
        let Some(node) = nodes.iter_mut().find(|node| node.id == event.node_id) else {
            return MinedOutcome::UnknownNode;
        };
        node.settle_remaining(event.remaining);

        let is_own = own_address.is_some_and(|address| address.eq_ignore_ascii_case(&event.address));
        if !is_own {
            return MinedOutcome::Foreign;
        }

        match self.take_oldest_for(event.node_id) {
            Some(pending) => MinedOutcome::Acknowledged {
                seq: pending.seq,
                shortfall: pending.amount.saturating_sub(event.amount),
            },
            None => MinedOutcome::Foreign,
        }
    }

    /// Drops the oldest pending mine for a node the session refused.
    pub fn reject(&mut self, node_id: Option<NodeId>) -> Option<PendingMine> {
        match node_id {
            Some(node_id) => self.take_oldest_for(node_id),
            None => None,
        }
    }

    fn take_oldest_for(&mut self, node_id: NodeId) -> Option<PendingMine> {
        let index = self.pending.iter().position(|p| p.node_id == node_id)?;
        self.pending.remove(index)
    }
}
