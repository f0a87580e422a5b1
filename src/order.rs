//! Order data model as supplied by the ordering UI.
//!
//! Input is accepted leniently: field names follow the camelCase JSON the cart
//! produces, selection maps keep their input order, and quantities are kept as
//! raw JSON values until aggregation decides how to treat them.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::OrderError;

/// Option name -> chosen quantity, in selection order.
pub type ChoiceCounts = Map<String, Value>;

/// A quantity as it arrived from upstream. Usually a JSON number, but
/// strings and garbage are tolerated and resolved by [`Quantity::count`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Value);

impl Quantity {
    pub fn new(count: u32) -> Self {
        Self(Value::from(count))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Whole count, or `None` when the value is not a finite non-negative number.
    pub fn count(&self) -> Option<u32> {
        parse_count(&self.0)
    }

    /// Like [`Quantity::count`], but fractional values are rejected instead of rounded.
    pub fn whole_count(&self) -> Option<u32> {
        parse_whole(&self.0)
    }
}

impl From<u32> for Quantity {
    fn from(count: u32) -> Self {
        Self::new(count)
    }
}

/// Fractional counts round to the nearest whole unit.
pub(crate) fn parse_count(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return Some(n.min(u32::MAX as u64) as u32);
    }
    let number = if let Some(n) = value.as_f64() {
        n
    } else if let Some(text) = value.as_str() {
        text.trim().parse::<f64>().ok()?
    } else {
        return None;
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number.round().min(u32::MAX as f64) as u32)
}

pub(crate) fn parse_whole(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if number.fract() != 0.0 {
        return None;
    }
    parse_count(value)
}

/// `null` reads as the field's default, same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One entry of a list-style selection (sauces, desserts, pastas, add-ons).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedSelection {
    pub name: String,
    #[serde(default)]
    pub quantity: Quantity,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
}

impl NamedSelection {
    pub fn new(name: impl Into<String>, quantity: u32, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity: Quantity::new(quantity),
            price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricedOption {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SingleChoiceAddonSchema {
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<PricedOption>,
}

/// Menu item a cart entry refers to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_choice_addon: Option<SingleChoiceAddonSchema>,
    /// Remaining customization schema, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }

    /// Price of a single-choice add-on option, zero when the schema does not list it.
    pub fn single_choice_addon_price(&self, option: &str) -> f64 {
        self.single_choice_addon
            .as_ref()
            .and_then(|schema| schema.options.iter().find(|o| o.name == option))
            .map(|o| o.price)
            .unwrap_or(0.0)
    }
}

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<MenuItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_price: f64,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub selected_donenesses: ChoiceCounts,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub selected_component: ChoiceCounts,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub selected_side_choices: ChoiceCounts,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub selected_multi_choice: ChoiceCounts,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub selected_drinks: ChoiceCounts,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selected_sauces: Vec<NamedSelection>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selected_desserts: Vec<NamedSelection>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selected_pastas: Vec<NamedSelection>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selected_addons: Vec<NamedSelection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_single_choice_addon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_notes: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    pub fn new(item: MenuItem, quantity: u32, total_price: f64) -> Self {
        Self {
            item: Some(item),
            quantity: Some(Quantity::new(quantity)),
            total_price,
            ..Self::default()
        }
    }

    /// Menu item and whole quantity, or `MalformedLineItem` when either is
    /// missing or the quantity is not a positive whole number.
    pub fn validate(&self, index: usize) -> Result<(&MenuItem, u32), OrderError> {
        let item = self
            .item
            .as_ref()
            .ok_or_else(|| OrderError::malformed(index, "missing menu item reference"))?;
        let raw = self
            .quantity
            .as_ref()
            .ok_or_else(|| OrderError::malformed(index, "missing quantity"))?;
        match raw.whole_count() {
            Some(count) if count > 0 => Ok((item, count)),
            _ => Err(OrderError::malformed(
                index,
                format!("quantity {} is not a positive whole number", raw.raw()),
            )),
        }
    }

    /// Merge identity. Uses the cart-supplied key when present, otherwise one
    /// derived from the menu item and every selection including quantities.
    pub fn configuration_key(&self) -> String {
        match self.cart_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => self.derived_configuration_key(),
        }
    }

    /// Key independent of selection order: two entries with the same menu item
    /// and the same selections produce the same key.
    pub fn derived_configuration_key(&self) -> String {
        let identity = self
            .item
            .as_ref()
            .map(|item| item.id.as_deref().unwrap_or(&item.name))
            .unwrap_or_default();
        let canonical = CanonicalConfiguration {
            item: identity,
            donenesses: canonical_counts(&self.selected_donenesses),
            components: canonical_counts(&self.selected_component),
            side_choices: canonical_counts(&self.selected_side_choices),
            multi_choice: canonical_counts(&self.selected_multi_choice),
            drinks: canonical_counts(&self.selected_drinks),
            sauces: canonical_list(&self.selected_sauces),
            desserts: canonical_list(&self.selected_desserts),
            pastas: canonical_list(&self.selected_pastas),
            addons: canonical_list(&self.selected_addons),
            single_choice_addon: self.selected_single_choice_addon.as_deref(),
            notes: self
                .selected_notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty()),
        };
        // Serializing a struct of BTreeMaps and sorted Vecs cannot fail.
        let encoded = serde_json::to_string(&canonical).unwrap_or_default();
        format!("{identity}:{:x}", md5::compute(encoded))
    }
}

#[derive(Serialize)]
struct CanonicalConfiguration<'a> {
    item: &'a str,
    donenesses: BTreeMap<&'a str, String>,
    components: BTreeMap<&'a str, String>,
    side_choices: BTreeMap<&'a str, String>,
    multi_choice: BTreeMap<&'a str, String>,
    drinks: BTreeMap<&'a str, String>,
    sauces: Vec<(&'a str, String)>,
    desserts: Vec<(&'a str, String)>,
    pastas: Vec<(&'a str, String)>,
    addons: Vec<(&'a str, String)>,
    single_choice_addon: Option<&'a str>,
    notes: Option<&'a str>,
}

fn canonical_quantity(value: &Value) -> String {
    parse_count(value)
        .map(|n| n.to_string())
        .unwrap_or_else(|| value.to_string())
}

fn canonical_counts(counts: &ChoiceCounts) -> BTreeMap<&str, String> {
    counts
        .iter()
        .filter(|(_, qty)| parse_count(qty) != Some(0))
        .map(|(name, qty)| (name.as_str(), canonical_quantity(qty)))
        .collect()
}

fn canonical_list(list: &[NamedSelection]) -> Vec<(&str, String)> {
    let mut entries: Vec<(&str, String)> = list
        .iter()
        .filter(|s| parse_count(s.quantity.raw()) != Some(0))
        .map(|s| (s.name.as_str(), canonical_quantity(s.quantity.raw())))
        .collect();
    entries.sort();
    entries
}

/// Dine-in / takeout as labelled by the ordering UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeout,
    Other(String),
}

impl OrderType {
    pub fn label(&self) -> &str {
        match self {
            Self::DineIn => "內用",
            Self::Takeout => "外帶",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for OrderType {
    fn from(value: String) -> Self {
        match value.trim() {
            "內用" => Self::DineIn,
            "外帶" => Self::Takeout,
            other => match other.to_ascii_lowercase().as_str() {
                "dine-in" | "dine_in" | "dinein" => Self::DineIn,
                "takeout" | "take-out" | "takeaway" | "pickup" => Self::Takeout,
                _ => Self::Other(other.to_string()),
            },
        }
    }
}

impl From<OrderType> for String {
    fn from(value: OrderType) -> Self {
        value.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub table_number: Option<String>,
}

/// Order body shared by drafts and persisted orders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<LineItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedOrder {
    pub id: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub order: Order,
}

/// The two shapes an order arrives in. Resolved once at the boundary: a
/// payload carrying an `id` is a persisted order, anything else is a draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderRecord {
    Persisted(PersistedOrder),
    Draft(Order),
}

impl OrderRecord {
    pub fn from_value(value: Value) -> Result<Self, OrderError> {
        if !value.is_object() {
            return Err(OrderError::InvalidOrder(
                "order payload must be a JSON object".into(),
            ));
        }
        let persisted = value
            .get("id")
            .map(|id| !id.is_null())
            .unwrap_or(false);
        if persisted {
            Ok(Self::Persisted(serde_json::from_value(value)?))
        } else {
            Ok(Self::Draft(serde_json::from_value(value)?))
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, OrderError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn order(&self) -> &Order {
        match self {
            Self::Persisted(p) => &p.order,
            Self::Draft(order) => order,
        }
    }

    /// Persisted id, falling back to an id the caller tracks for a draft.
    pub fn order_id<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        match self {
            Self::Persisted(p) => Some(p.id.as_str()),
            Self::Draft(_) => fallback,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Persisted(p) => p.created_at,
            Self::Draft(_) => None,
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// RFC 3339 strings or epoch milliseconds; anything else is dropped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    })
}
