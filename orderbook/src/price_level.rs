//! FIFO of resting orders at one price.
//!
//! A head/tail pair over doubly-linked arena handles lets a partial cancel
//! shrink a node in place (no re-insertion, priority preserved) while a full
//! cancel of an arbitrary interior order unlinks it in O(1) given the
//! handle the `OrderBook`'s id index already holds.

use crate::arena::{NodeArena, NodeHandle, OrderNode};
use crate::error::{EngineError, Result};

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct PriceLevelQueue {
    head: Option<NodeHandle>,
    tail: Option<NodeHandle>,
    num_orders: u32,
    depth: u64,
}

impl PriceLevelQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.num_orders == 0
    }

    pub fn num_orders(&self) -> u32 {
        self.num_orders
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    pub fn head(&self) -> Option<NodeHandle> {
        self.head
    }

    /// Appends a new node as the tail. O(1).
    pub fn append(&mut self, arena: &mut NodeArena, mut node: OrderNode) -> NodeHandle {
        node.prev = self.tail;
        node.next = None;
        let size = u64::from(node.size);
        let handle = arena.insert(node);

        match self.tail {
            Some(tail) => arena.get_mut(tail).next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.num_orders += 1;
        self.depth += size;
        handle
    }

    /// Decrements a node's size by `amount`. Returns `true` if the node was
    /// fully consumed and unlinked, `false` if it still rests with reduced
    /// size. O(1).
    pub fn remove(&mut self, arena: &mut NodeArena, handle: NodeHandle, amount: u32) -> Result<bool> {
        let node = arena.get_mut(handle);
        if amount > node.size {
            return Err(EngineError::InvariantViolation(format!(
                "cannot remove {amount} shares from order {} resting with size {}",
                node.order_id, node.size
            )));
        }

        node.size -= amount;
        self.depth -= u64::from(amount);

        if node.size != 0 {
            return Ok(false);
        }

        let prev = node.prev;
        let next = node.next;
        match prev {
            Some(p) => arena.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => arena.get_mut(n).prev = prev,
            None => self.tail = prev,
        }
        arena.remove(handle);
        self.num_orders -= 1;
        Ok(true)
    }
}
