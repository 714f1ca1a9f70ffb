use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, amount: u32) -> Self {
        Self {
            item: item.into(),
            amount,
        }
    }
}

/// Fixed-size slot container used by hosts that keep inventories in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    max_stack: u32,
}

impl Inventory {
    pub const DEFAULT_MAX_STACK: u32 = 64;

    pub fn new(size: usize) -> Self {
        Self::with_max_stack(size, Self::DEFAULT_MAX_STACK)
    }

    pub fn with_max_stack(size: usize, max_stack: u32) -> Self {
        Self {
            slots: vec![None; size],
            max_stack: max_stack.max(1),
        }
    }

    /// Adds items, topping up matching stacks before using empty slots.
    /// Returns whatever did not fit.
    pub fn add_items(&mut self, items: Vec<ItemStack>) -> Vec<ItemStack> {
        let mut overflow = Vec::new();
        for stack in items {
            let mut remaining = stack.amount;

            for slot in self.slots.iter_mut().flatten() {
                if remaining == 0 {
                    break;
                }
                if slot.item == stack.item && slot.amount < self.max_stack {
                    let moved = remaining.min(self.max_stack - slot.amount);
                    slot.amount += moved;
                    remaining -= moved;
                }
            }

            for slot in self.slots.iter_mut().filter(|s| s.is_none()) {
                if remaining == 0 {
                    break;
                }
                let moved = remaining.min(self.max_stack);
                *slot = Some(ItemStack::new(stack.item.clone(), moved));
                remaining -= moved;
            }

            if remaining > 0 {
                overflow.push(ItemStack::new(stack.item, remaining));
            }
        }
        overflow
    }

    pub fn take_all(&mut self) -> Vec<ItemStack> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    pub fn contents(&self) -> Vec<ItemStack> {
        self.slots.iter().flatten().cloned().collect()
    }

    pub fn count(&self, item: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item == item)
            .map(|s| s.amount)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_merges_into_existing_stacks() {
        let mut inv = Inventory::new(2);
        assert!(inv.add_items(vec![ItemStack::new("arrow", 40)]).is_empty());
        assert!(inv.add_items(vec![ItemStack::new("arrow", 30)]).is_empty());
        assert_eq!(inv.count("arrow"), 70);
        // 64 + 6 across two slots
        assert_eq!(inv.contents().len(), 2);
    }

    #[test]
    fn full_inventory_returns_overflow() {
        let mut inv = Inventory::new(1);
        let overflow = inv.add_items(vec![
            ItemStack::new("sword", 1),
            ItemStack::new("shield", 1),
        ]);
        assert_eq!(overflow, vec![ItemStack::new("shield", 1)]);
        assert_eq!(inv.count("sword"), 1);
    }

    #[test]
    fn partial_fit_splits_the_stack() {
        let mut inv = Inventory::with_max_stack(1, 16);
        let overflow = inv.add_items(vec![ItemStack::new("pearl", 20)]);
        assert_eq!(overflow, vec![ItemStack::new("pearl", 4)]);
        assert_eq!(inv.count("pearl"), 16);
    }

    #[test]
    fn take_all_empties() {
        let mut inv = Inventory::new(3);
        inv.add_items(vec![ItemStack::new("apple", 3)]);
        let taken = inv.take_all();
        assert_eq!(taken, vec![ItemStack::new("apple", 3)]);
        assert!(inv.is_empty());
    }
}
