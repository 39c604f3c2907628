use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfwiseError};

// ─── Category ───────────────────────────────────────────────

/// Fixed set of shelving categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Computer,
    Electronics,
    Electrical,
    Civil,
    Mechanical,
}

impl Category {
    /// All categories in menu order.
    pub const ALL: [Category; 5] = [
        Self::Computer,
        Self::Electronics,
        Self::Electrical,
        Self::Civil,
        Self::Mechanical,
    ];

    /// Look up a category by its 1-based menu position.
    pub fn from_index(index: usize) -> Option<Self> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Computer => "Computer",
            Self::Electronics => "Electronics",
            Self::Electrical => "Electrical",
            Self::Civil => "Civil",
            Self::Mechanical => "Mechanical",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Invalid category: {s}"))
    }
}

// ─── BookRecord ─────────────────────────────────────────────

/// One inventory entry in the catalog.
///
/// `id` is assigned by the caller and never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: i32,
    pub name: String,
    pub author: String,
    pub quantity: u32,
    pub price: Decimal,
    pub rack_no: i32,
    pub category: Category,
}

impl BookRecord {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        author: impl Into<String>,
        quantity: u32,
        price: Decimal,
        rack_no: i32,
        category: Category,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            author: author.into(),
            quantity,
            price,
            rack_no,
            category,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_price(self.price)
    }

    /// Case-insensitive exact comparison against the book name.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn is_in_stock(&self) -> bool {
        self.quantity > 0
    }
}

fn validate_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ShelfwiseError::Validation(format!(
            "price must not be negative, got {price}"
        )));
    }
    Ok(())
}

// ─── BookUpdate ─────────────────────────────────────────────

/// Field diff for an edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookUpdate {
    pub name: Option<String>,
    pub author: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<Decimal>,
    pub rack_no: Option<i32>,
    pub category: Option<Category>,
}

impl BookUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        match self.price {
            Some(price) => validate_price(price),
            None => Ok(()),
        }
    }

    pub fn apply(&self, book: &mut BookRecord) {
        if let Some(name) = &self.name {
            book.name = name.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(quantity) = self.quantity {
            book.quantity = quantity;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(rack_no) = self.rack_no {
            book.rack_no = rack_no;
        }
        if let Some(category) = self.category {
            book.category = category;
        }
    }
}
