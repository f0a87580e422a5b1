//! Line-item merging and kitchen prep roll-up.
//!
//! Both passes are pure: they read the caller's items and build new values,
//! never touching the input. Iteration order is the input order, so repeated
//! runs over the same items produce identical output.

use std::collections::{BTreeMap, HashMap};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::OrderError;
use crate::order::{parse_count, ChoiceCounts, LineItem, NamedSelection, Quantity};

// ---------------------------------------------------------------------------
// Merge policy
// ---------------------------------------------------------------------------

/// What makes two line items the same receipt row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKey {
    /// Same menu item with the same full set of selections.
    #[default]
    Configuration,
    /// Same menu item name, customizations ignored.
    ProductName,
}

/// How the merged row's total is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStrategy {
    /// Sum of the members' own totals.
    #[default]
    SumTotals,
    /// `(menu price + single-choice add-on price) * quantity + add-on charges`.
    Recompute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedAction {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    pub key: MergeKey,
    pub pricing: PriceStrategy,
    pub on_malformed: MalformedAction,
}

// ---------------------------------------------------------------------------
// Item merger
// ---------------------------------------------------------------------------

struct MergeGroup {
    row: LineItem,
    quantity: u32,
    total: f64,
    addon_charge: f64,
}

impl MergeGroup {
    fn new(item: &LineItem, quantity: u32) -> Self {
        Self {
            row: item.clone(),
            quantity,
            total: item.total_price,
            addon_charge: addon_charge(&item.selected_addons),
        }
    }

    fn absorb(&mut self, item: &LineItem, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
        self.total += item.total_price;
        self.addon_charge += addon_charge(&item.selected_addons);
    }

    fn finish(mut self, pricing: PriceStrategy) -> LineItem {
        self.row.total_price = match pricing {
            PriceStrategy::SumTotals => self.total,
            PriceStrategy::Recompute => {
                let unit = self
                    .row
                    .item
                    .as_ref()
                    .map(|menu| {
                        let option_price = self
                            .row
                            .selected_single_choice_addon
                            .as_deref()
                            .map(|option| menu.single_choice_addon_price(option))
                            .unwrap_or(0.0);
                        menu.price + option_price
                    })
                    .unwrap_or(0.0);
                unit * f64::from(self.quantity) + self.addon_charge
            }
        };
        self.row.quantity = Some(Quantity::new(self.quantity));
        self.row
    }
}

fn addon_charge(addons: &[NamedSelection]) -> f64 {
    addons
        .iter()
        .map(|addon| addon.price * f64::from(addon.quantity.count().unwrap_or(0)))
        .sum()
}

/// Merge line items sharing a configuration key, using the default policy.
pub fn merge_line_items(items: &[LineItem]) -> Result<Vec<LineItem>, OrderError> {
    merge_line_items_with(items, &MergePolicy::default())
}

/// Merge line items into receipt rows.
///
/// Rows come out in first-seen order. Each row is a copy of the first member
/// of its group with quantity and total replaced by the group aggregates.
pub fn merge_line_items_with(
    items: &[LineItem],
    policy: &MergePolicy,
) -> Result<Vec<LineItem>, OrderError> {
    let mut groups: Vec<MergeGroup> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let (menu_item, quantity) = match item.validate(index) {
            Ok(valid) => valid,
            Err(err) => match policy.on_malformed {
                MalformedAction::Abort => return Err(err),
                MalformedAction::Skip => {
                    warn!(index, error = %err, "Skipping malformed line item");
                    continue;
                }
            },
        };
        let key = match policy.key {
            MergeKey::Configuration => item.configuration_key(),
            MergeKey::ProductName => menu_item.name.clone(),
        };
        match slots.get(&key) {
            Some(&slot) => groups[slot].absorb(item, quantity),
            None => {
                slots.insert(key, groups.len());
                groups.push(MergeGroup::new(item, quantity));
            }
        }
    }

    let rows: Vec<LineItem> = groups
        .into_iter()
        .map(|group| group.finish(policy.pricing))
        .collect();
    debug!(
        input = items.len(),
        rows = rows.len(),
        key = ?policy.key,
        pricing = ?policy.pricing,
        "Merged line items"
    );
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Category summary
// ---------------------------------------------------------------------------

/// Summary categories, declared in output order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum SummaryCategory {
    Components,
    Drinks,
    SideChoices,
    Sauces,
    Desserts,
    Pastas,
    Addons,
    SingleChoiceAddons,
    Donenesses,
    MultiChoice,
}

impl SummaryCategory {
    pub const ALL: [SummaryCategory; 10] = [
        Self::Components,
        Self::Drinks,
        Self::SideChoices,
        Self::Sauces,
        Self::Desserts,
        Self::Pastas,
        Self::Addons,
        Self::SingleChoiceAddons,
        Self::Donenesses,
        Self::MultiChoice,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Components => "components",
            Self::Drinks => "drinks",
            Self::SideChoices => "sideChoices",
            Self::Sauces => "sauces",
            Self::Desserts => "desserts",
            Self::Pastas => "pastas",
            Self::Addons => "addons",
            Self::SingleChoiceAddons => "singleChoiceAddons",
            Self::Donenesses => "donenesses",
            Self::MultiChoice => "multiChoice",
        }
    }

    /// Kitchen-facing heading.
    pub fn label(self) -> &'static str {
        match self {
            Self::Components => "炸物",
            Self::Drinks => "飲料",
            Self::SideChoices => "簡餐",
            Self::Sauces => "醬料",
            Self::Desserts => "甜品",
            Self::Pastas => "義麵",
            Self::Addons => "加購",
            Self::SingleChoiceAddons => "單點加購",
            Self::Donenesses => "熟度",
            Self::MultiChoice => "口味",
        }
    }
}

/// Option name -> total quantity, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    entries: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, name: &str, quantity: u32) {
        match self.index.get(name) {
            Some(&slot) => {
                let entry = &mut self.entries[slot].1;
                *entry = entry.saturating_add(quantity);
            }
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), quantity));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, qty) in &self.entries {
            map.serialize_entry(name, qty)?;
        }
        map.end()
    }
}

/// Category -> option totals. Empty categories are never present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategorySummary {
    categories: BTreeMap<SummaryCategory, Tally>,
}

impl CategorySummary {
    pub fn get(&self, category: SummaryCategory) -> Option<&Tally> {
        self.categories.get(&category)
    }

    pub fn quantity(&self, category: SummaryCategory, name: &str) -> Option<u32> {
        self.get(category).and_then(|tally| tally.get(name))
    }

    pub fn contains(&self, category: SummaryCategory) -> bool {
        self.categories.contains_key(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SummaryCategory, &Tally)> {
        self.categories.iter().map(|(category, tally)| (*category, tally))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn add(&mut self, category: SummaryCategory, name: &str, quantity: u32) {
        self.categories
            .entry(category)
            .or_default()
            .add(name, quantity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    /// Count each single-choice add-on once, at its line item's quantity.
    pub single_choice_addons: bool,
    /// Also roll up doneness and multi-choice selections.
    pub dish_choices: bool,
}

/// Summary plus the data-quality problems seen while building it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    pub summary: CategorySummary,
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<OrderError>,
}

fn serialize_warnings<S: Serializer>(
    warnings: &[OrderError],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(ToString::to_string))
}

struct SummaryBuilder {
    summary: CategorySummary,
    warnings: Vec<OrderError>,
}

impl SummaryBuilder {
    fn record(
        &mut self,
        index: usize,
        category: SummaryCategory,
        name: &str,
        raw: &serde_json::Value,
    ) {
        match parse_count(raw) {
            Some(0) => {}
            Some(qty) => self.summary.add(category, name, qty),
            None => {
                let field = format!("{}.{}", category.key(), name);
                warn!(
                    index,
                    field = %field,
                    raw = %raw,
                    "Non-numeric quantity counted as zero"
                );
                self.warnings.push(OrderError::NonNumericQuantity {
                    index,
                    field,
                    raw: raw.to_string(),
                });
            }
        }
    }

    fn add_counts(&mut self, index: usize, category: SummaryCategory, counts: &ChoiceCounts) {
        for (name, raw) in counts {
            self.record(index, category, name, raw);
        }
    }

    fn add_list(&mut self, index: usize, category: SummaryCategory, list: &[NamedSelection]) {
        for selection in list {
            self.record(index, category, &selection.name, selection.quantity.raw());
        }
    }
}

/// Roll up every line item's selections with the default options.
/// Data-quality problems are logged and otherwise dropped.
pub fn summarize_customizations(items: &[LineItem]) -> CategorySummary {
    summarize_with(items, &SummaryOptions::default()).summary
}

pub fn summarize_with(items: &[LineItem], options: &SummaryOptions) -> SummaryReport {
    let mut builder = SummaryBuilder {
        summary: CategorySummary::default(),
        warnings: Vec::new(),
    };

    for (index, item) in items.iter().enumerate() {
        builder.add_counts(index, SummaryCategory::Components, &item.selected_component);
        builder.add_counts(index, SummaryCategory::Drinks, &item.selected_drinks);
        builder.add_counts(index, SummaryCategory::SideChoices, &item.selected_side_choices);
        builder.add_list(index, SummaryCategory::Sauces, &item.selected_sauces);
        builder.add_list(index, SummaryCategory::Desserts, &item.selected_desserts);
        builder.add_list(index, SummaryCategory::Pastas, &item.selected_pastas);
        builder.add_list(index, SummaryCategory::Addons, &item.selected_addons);

        if options.single_choice_addons {
            if let Some(option) = item
                .selected_single_choice_addon
                .as_deref()
                .map(str::trim)
                .filter(|o| !o.is_empty())
            {
                let raw = item
                    .quantity
                    .as_ref()
                    .map(|q| q.raw().clone())
                    .unwrap_or(serde_json::Value::Null);
                builder.record(index, SummaryCategory::SingleChoiceAddons, option, &raw);
            }
        }
        if options.dish_choices {
            builder.add_counts(index, SummaryCategory::Donenesses, &item.selected_donenesses);
            builder.add_counts(index, SummaryCategory::MultiChoice, &item.selected_multi_choice);
        }
    }

    debug!(
        items = items.len(),
        categories = builder.summary.categories.len(),
        warnings = builder.warnings.len(),
        "Summarized customizations"
    );
    SummaryReport {
        summary: builder.summary,
        warnings: builder.warnings,
    }
}
