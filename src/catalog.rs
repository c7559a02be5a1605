//! Product normalization and the filter/sort helpers used by listing pages.
//!
//! Everything here is pure: raw API payloads go in, display shapes come out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use serde_json::{Map, Value};

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder-product.png";
pub const DEFAULT_RECENT_DAYS: i64 = 7;

const DEFAULT_COLOR: &str = "Black";
const DEFAULT_SIZE: &str = "M";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayProduct {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub sale_price: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<Decimal>,
}

/// Maps one raw API product record to its display shape. Returns `None` for
/// null or non-object payloads.
pub fn normalize_product(raw: &Value) -> Option<DisplayProduct> {
    let obj = raw.as_object()?;

    let image = string_field(obj, "image_url")
        .or_else(|| string_field(obj, "image"))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());

    let (colors, sizes) = attribute_options(obj.get("specifications"));

    Some(DisplayProduct {
        id: id_field(obj),
        name: string_field(obj, "name").unwrap_or_default(),
        price: coerce_decimal(obj.get("price")).unwrap_or(Decimal::ZERO),
        image,
        category: named_field(obj, "category", "category_name"),
        brand: named_field(obj, "brand", "brand_name"),
        description: string_field(obj, "description").unwrap_or_default(),
        colors,
        sizes,
        created_at: obj
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        sale_price: coerce_decimal(obj.get("sale_price")),
        discount: coerce_decimal(obj.get("discount")),
        original_price: coerce_decimal(obj.get("original_price")),
    })
}

/// Maps a raw list, dropping anything that does not normalize. Non-array
/// input yields an empty list.
pub fn normalize_products(raw: &Value) -> Vec<DisplayProduct> {
    raw.as_array()
        .map(|items| items.iter().filter_map(normalize_product).collect())
        .unwrap_or_default()
}

/// Inclusive, floor-based day count: a product created exactly
/// `within_days` calendar days ago still counts, and future timestamps
/// count as well since the day difference goes non-positive. Listing pages
/// rely on this exact boundary behavior.
pub fn is_recently_created(created_at: Option<DateTime<Utc>>, within_days: i64) -> bool {
    is_recently_created_at(created_at, Utc::now(), within_days)
}

pub fn is_recently_created_at(
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    within_days: i64,
) -> bool {
    match created_at {
        Some(ts) => (now - ts).num_days() <= within_days,
        None => false,
    }
}

pub fn filter_recent_products(products: &[DisplayProduct], within_days: i64) -> Vec<DisplayProduct> {
    products
        .iter()
        .filter(|p| is_recently_created(p.created_at, within_days))
        .cloned()
        .collect()
}

/// Filters by category slug. `"all"` or an empty slug returns the input
/// unchanged. The `sale` slug matches on price fields rather than the
/// category string; the taxonomy is inconsistent here on purpose and
/// changing it would alter visible behavior.
pub fn filter_by_category(products: &[DisplayProduct], category: &str) -> Vec<DisplayProduct> {
    let slug = category.trim().to_lowercase();
    if slug.is_empty() || slug == "all" {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| matches_category(p, &slug))
        .cloned()
        .collect()
}

fn matches_category(product: &DisplayProduct, slug: &str) -> bool {
    if slug == "sale" {
        return product.sale_price.is_some()
            || product.discount.is_some()
            || product.original_price.is_some();
    }
    let cat = product.category.to_lowercase();
    match slug {
        "men" => cat.contains("men") || cat.contains("male") || cat == "men's" || cat == "mens",
        "women" => {
            cat.contains("women") || cat.contains("female") || cat == "women's" || cat == "womens"
        }
        "kids" => {
            cat.contains("kids") || cat.contains("children") || cat.contains("child")
                || cat == "kids'"
        }
        "accessories" => cat.contains("accessories") || cat.contains("accessory"),
        _ => cat == slug,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortBy {
    #[default]
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Stable sort on the chosen key. Products without a `created_at` order
/// before any timestamp.
pub fn sort_products(
    products: &[DisplayProduct],
    sort_by: ProductSortBy,
    order: SortOrder,
) -> Vec<DisplayProduct> {
    let mut sorted = products.to_vec();
    sorted.sort_by(|a, b| {
        let cmp = match sort_by {
            ProductSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortBy::Price => a.price.cmp(&b.price),
            ProductSortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        match order {
            SortOrder::Asc => cmp,
            SortOrder::Desc => cmp.reverse(),
        }
    });
    sorted
}

/// Case-insensitive substring search over name, description, category, and
/// brand. An empty or whitespace query returns the input unchanged.
pub fn search_products(products: &[DisplayProduct], query: &str) -> Vec<DisplayProduct> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p.brand.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn category_display_title(slug: &str) -> &'static str {
    match slug {
        "all" => "All Products",
        "men" => "Men's Collection",
        "women" => "Women's Collection",
        "kids" => "Kids' Collection",
        "accessories" => "Accessories",
        "sale" => "Sale",
        "new-arrivals" => "New Arrivals",
        _ => "All Products",
    }
}

fn id_field(obj: &Map<String, Value>) -> String {
    match obj.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolves a name from a nested `{ "name": .. }` object, a flat string, or
/// the `<key>_name` fallback field.
fn named_field(obj: &Map<String, Value>, key: &str, flat_key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(nested)) => string_field(nested, "name").unwrap_or_default(),
        _ => string_field(obj, flat_key).unwrap_or_default(),
    }
}

fn coerce_decimal(value: Option<&Value>) -> Option<Decimal> {
    match value? {
        Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extracts color and size options from a flat list of `{name, value}`
/// attribute records. Attribute names match case-insensitively on
/// containing "color" / "size"; missing options get a single default.
fn attribute_options(specs: Option<&Value>) -> (Vec<String>, Vec<String>) {
    let mut colors: Vec<String> = Vec::new();
    let mut sizes: Vec<String> = Vec::new();
    if let Some(items) = specs.and_then(Value::as_array) {
        for item in items {
            let Some(attr) = item.as_object() else {
                continue;
            };
            let name = attr
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase();
            let Some(value) = attr.get("value").and_then(Value::as_str) else {
                continue;
            };
            if name.contains("color") && !colors.iter().any(|c| c == value) {
                colors.push(value.to_string());
            }
            if name.contains("size") && !sizes.iter().any(|s| s == value) {
                sizes.push(value.to_string());
            }
        }
    }
    if colors.is_empty() {
        colors.push(DEFAULT_COLOR.to_string());
    }
    if sizes.is_empty() {
        sizes.push(DEFAULT_SIZE.to_string());
    }
    (colors, sizes)
}
