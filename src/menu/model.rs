use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE: &str =
    "https://images.unsplash.com/photo-1546069901-ba9599a7e63c?auto=format&fit=crop&w=400&q=80";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Rice,
    Noodles,
    Breads,
    Specials,
    Drinks,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Rice,
        Category::Noodles,
        Category::Breads,
        Category::Specials,
        Category::Drinks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Rice => "Rice",
            Category::Noodles => "Noodles",
            Category::Breads => "Breads",
            Category::Specials => "Specials",
            Category::Drinks => "Drinks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category `{s}`"))
    }
}

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub price: i64, // whole rupees
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

fn in_stock_default() -> bool {
    true
}

/// Payload for adding a dish from menu management.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFoodItem {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
}

impl NewFoodItem {
    /// Trims fields and fills in the placeholder image.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.image = self.image.trim().to_string();
        if self.image.is_empty() {
            self.image = DEFAULT_IMAGE.to_string();
        }
        self
    }

    pub fn into_item(self, id: String) -> FoodItem {
        FoodItem {
            id,
            name: self.name,
            price: self.price,
            image: self.image,
            description: self.description,
            category: self.category,
            in_stock: true,
        }
    }
}

/// Partial edit of a dish; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodItemPatch {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub in_stock: Option<bool>,
}

impl FoodItemPatch {
    pub fn stock(in_stock: bool) -> Self {
        Self { in_stock: Some(in_stock), ..Self::default() }
    }

    /// Trims text fields the same way [`NewFoodItem::normalized`] does.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }

    pub fn apply(&self, item: &mut FoodItem) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(image) = &self.image {
            item.image = image.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(in_stock) = self.in_stock {
            item.in_stock = in_stock;
        }
    }
}

fn bundled(id: &str, name: &str, price: i64, image: &str, description: &str, category: Category) -> FoodItem {
    FoodItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        image: image.to_string(),
        description: description.to_string(),
        category,
        in_stock: true,
    }
}

/// Menu shown when the store has nothing to offer.
pub fn default_items() -> Vec<FoodItem> {
    vec![
        bundled(
            "1",
            "Chicken Rice",
            180,
            "https://images.unsplash.com/photo-1563379091339-03b21ab4a4f8?auto=format&fit=crop&w=800&q=80",
            "Flavorful basmati rice cooked with tender chicken pieces.",
            Category::Rice,
        ),
        bundled(
            "2",
            "Chicken Noodles",
            160,
            "https://images.unsplash.com/photo-1585032226651-759b368d7246?auto=format&fit=crop&w=400&q=80",
            "Stir-fried noodles with succulent chicken and fresh veggies.",
            Category::Noodles,
        ),
        bundled(
            "3",
            "Egg Rice",
            140,
            "https://images.unsplash.com/photo-1603133872878-684f208fb84b?auto=format&fit=crop&w=400&q=80",
            "A comforting mix of scrambled eggs and rice.",
            Category::Rice,
        ),
        bundled(
            "4",
            "Egg Noodles",
            130,
            "https://images.unsplash.com/photo-1526318896980-cf78c088247c?auto=format&fit=crop&w=400&q=80",
            "Savory noodles tossed with scrambled eggs.",
            Category::Noodles,
        ),
        bundled(
            "5",
            "Parotta (2pcs)",
            45,
            "https://images.unsplash.com/photo-1613292443284-8d8595c57384?auto=format&fit=crop&w=800&q=80",
            "Layered, flaky, and crispy traditional Indian flatbread.",
            Category::Breads,
        ),
        bundled(
            "6",
            "Kothu Parotta",
            150,
            "https://images.unsplash.com/photo-1631452180519-c014fe946bc7?auto=format&fit=crop&w=400&q=80",
            "Minced parotta stir-fried with eggs and spicy salna.",
            Category::Specials,
        ),
        bundled(
            "7",
            "Chilli Parotta",
            145,
            "https://images.unsplash.com/photo-1541014741259-de529411b96a?auto=format&fit=crop&w=400&q=80",
            "Crispy parotta pieces sautéed with chillies and sauces.",
            Category::Specials,
        ),
        bundled(
            "8",
            "Coca Cola",
            40,
            "https://images.unsplash.com/photo-1622483767028-3f66f32aef97?auto=format&fit=crop&w=400&q=80",
            "",
            Category::Drinks,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("rice".parse::<Category>(), Ok(Category::Rice));
        assert_eq!(" Drinks ".parse::<Category>(), Ok(Category::Drinks));
        assert!("Desserts".parse::<Category>().is_err());
    }

    #[test]
    fn bundled_menu_has_eight_in_stock_items() {
        let items = default_items();
        assert_eq!(items.len(), 8);
        assert!(items.iter().all(|i| i.in_stock && i.price > 0));
    }

    #[test]
    fn normalized_fills_placeholder_image() {
        let item = NewFoodItem {
            name: "  Veg Rice ".into(),
            price: 120,
            image: "   ".into(),
            description: String::new(),
            category: Category::Rice,
        }
        .normalized();
        assert_eq!(item.name, "Veg Rice");
        assert_eq!(item.image, DEFAULT_IMAGE);
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut item = default_items().remove(0);
        FoodItemPatch { price: Some(200), ..Default::default() }.apply(&mut item);
        assert_eq!(item.price, 200);
        assert_eq!(item.name, "Chicken Rice");
        FoodItemPatch::stock(false).apply(&mut item);
        assert!(!item.in_stock);
    }
}
