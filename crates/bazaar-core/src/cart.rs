//! # Cart
//!
//! The shopper's item list and the operations that change it.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  CartOp                      Effect on items                            │
//! │  ──────                      ───────────────                            │
//! │  Add(item)          ───────► merge quantity into same id, else push     │
//! │  SetQuantity(id, n) ───────► n ≤ 0 → remove, else items[i].qty = n     │
//! │  Remove(id)         ───────► retain(id != ...)                          │
//! │  Clear              ───────► items.clear()                              │
//! │                                                                         │
//! │  Unknown ids are a no-op: the caller still gets a fresh snapshot.       │
//! │  Ops that would lift the subtotal past Money::MAX are rejected.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::CartItem;
use crate::validation::validate_cart_item;

/// A mutation request against the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "snake_case")]
pub enum CartOp {
    /// Adds an item; an existing id has its quantity increased instead.
    Add(CartItem),
    /// Removes the item with this id.
    Remove(String),
    /// Sets the quantity; zero or below removes the item.
    SetQuantity { id: String, quantity: i64 },
    /// Empties the cart.
    Clear,
}

/// What a [`CartOp`] actually did.
#[derive(Debug, Clone, PartialEq)]
pub enum CartChange {
    Added,
    Merged { quantity: u32 },
    Removed,
    QuantitySet { quantity: u32 },
    Cleared,
    /// The op referenced an unknown id or was otherwise a no-op.
    Unchanged,
    /// The op was refused: the item failed validation or the cart would
    /// become too large to price.
    Rejected(ValidationError),
}

impl CartChange {
    /// Returns true if the item list changed.
    pub fn is_change(&self) -> bool {
        !matches!(self, CartChange::Unchanged | CartChange::Rejected(_))
    }
}

/// The shopper's cart.
///
/// ## Invariants
/// - Items are unique by `id`
/// - Every quantity is ≥ 1
/// - The subtotal never exceeds [`Money::MAX`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Rebuilds a cart from a persisted item list.
    ///
    /// Invalid entries are dropped and duplicate ids merged, so a
    /// hand-edited or outdated store cannot break the invariants.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            cart.apply(CartOp::Add(item));
        }
        cart
    }

    /// Applies one operation.
    pub fn apply(&mut self, op: CartOp) -> CartChange {
        match op {
            CartOp::Add(item) => self.add_item(item),
            CartOp::Remove(id) => self.remove_item(&id),
            CartOp::SetQuantity { id, quantity } => self.set_quantity(&id, quantity),
            CartOp::Clear => {
                self.items.clear();
                CartChange::Cleared
            }
        }
    }

    fn add_item(&mut self, item: CartItem) -> CartChange {
        if let Err(err) = validate_cart_item(&item) {
            return CartChange::Rejected(err);
        }

        match self.position(&item.id) {
            Some(index) => {
                let existing = &self.items[index];
                let Some(quantity) = existing.quantity.checked_add(item.quantity) else {
                    return too_large("quantity");
                };
                if !self.fits_with_line(index, existing.price.checked_multiply_quantity(quantity)) {
                    return too_large("quantity");
                }
                self.items[index].quantity = quantity;
                CartChange::Merged { quantity }
            }
            None => {
                if !self.fits_with_line(self.items.len(), item.line_total()) {
                    return too_large("price");
                }
                self.items.push(item);
                CartChange::Added
            }
        }
    }

    fn set_quantity(&mut self, id: &str, quantity: i64) -> CartChange {
        if quantity <= 0 {
            return self.remove_item(id);
        }

        let Some(index) = self.position(id) else {
            return CartChange::Unchanged;
        };
        let Ok(quantity) = u32::try_from(quantity) else {
            return too_large("quantity");
        };
        if !self.fits_with_line(index, self.items[index].price.checked_multiply_quantity(quantity)) {
            return too_large("quantity");
        }

        self.items[index].quantity = quantity;
        CartChange::QuantitySet { quantity }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    /// Checks the subtotal stays within [`Money::MAX`] once the line at
    /// `index` (or a new line at the end) is priced at `line`.
    fn fits_with_line(&self, index: usize, line: Option<Money>) -> bool {
        let Some(line) = line else {
            return false;
        };
        self.items
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .try_fold(line, |total, (_, item)| total.checked_add(item.line_total()?))
            .is_some_and(|total| total <= Money::MAX)
    }

    fn remove_item(&mut self, id: &str) -> CartChange {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != id);

        if self.items.len() == initial_len {
            CartChange::Unchanged
        } else {
            CartChange::Removed
        }
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Returns the number of unique items in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn too_large(field: &str) -> CartChange {
    CartChange::Rejected(ValidationError::TooLarge {
        field: field.to_string(),
    })
}
