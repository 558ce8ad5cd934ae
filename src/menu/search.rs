use super::model::{Category, FoodItem};

/// Case-insensitive match on name, category or description. A blank query
/// matches everything.
pub fn matches(item: &FoodItem, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    item.name.to_lowercase().contains(&q)
        || item.category.as_str().to_lowercase().contains(&q)
        || item.description.to_lowercase().contains(&q)
}

/// Menu browsing: free-text query, then an optional category tab.
pub fn filter_items(items: &[FoodItem], query: Option<&str>, category: Option<Category>) -> Vec<FoodItem> {
    items
        .iter()
        .filter(|i| query.map_or(true, |q| matches(i, q)))
        .filter(|i| category.map_or(true, |c| i.category == c))
        .cloned()
        .collect()
}

/// Parses a category tab; `All` (or nothing) means no filter.
pub fn parse_category_tab(tab: Option<&str>) -> Result<Option<Category>, String> {
    match tab.map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) if t.eq_ignore_ascii_case("all") => Ok(None),
        Some(t) => t.parse().map(Some),
    }
}
