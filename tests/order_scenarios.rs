//! End-to-end scenarios over orders as the ordering UI serializes them.

use kitchen_ticket::{
    build_kitchen_ticket_doc, merge_line_items, render_text, summarize_customizations,
    summarize_with, KitchenConfig, OrderError, OrderRecord, Quantity, SummaryCategory,
    SummaryOptions,
};
use serde_json::json;

fn record(value: serde_json::Value) -> OrderRecord {
    OrderRecord::from_value(value).expect("valid order")
}

#[test]
fn identical_configurations_merge_and_sauces_roll_up() {
    let order = record(json!({
        "customerInfo": {"name": "陳先生", "phone": "0911222333"},
        "orderType": "外帶",
        "totalPrice": 1500,
        "items": [
            {
                "cartKey": "A|泡菜x2",
                "item": {"name": "A", "price": 300},
                "quantity": 3,
                "totalPrice": 900,
                "selectedSauces": [{"name": "泡菜", "quantity": 2, "price": 0}]
            },
            {
                "cartKey": "A|泡菜x2",
                "item": {"name": "A", "price": 300},
                "quantity": 2,
                "totalPrice": 600,
                "selectedSauces": [{"name": "泡菜", "quantity": 2, "price": 0}]
            }
        ]
    }));
    let items = &order.order().items;

    let rows = merge_line_items(items).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item.as_ref().unwrap().name, "A");
    assert_eq!(rows[0].quantity.as_ref().and_then(Quantity::count), Some(5));
    assert_eq!(rows[0].total_price, 1500.0);

    let summary = summarize_customizations(items);
    assert_eq!(
        serde_json::to_value(&summary).unwrap(),
        json!({"sauces": {"泡菜": 4}})
    );
}

#[test]
fn items_without_cart_key_merge_on_derived_configuration() {
    let order = record(json!({
        "customerInfo": {"name": "Lin", "phone": "0900"},
        "orderType": "內用",
        "totalPrice": 780,
        "items": [
            {
                "item": {"id": "steak-01", "name": "菲力牛排", "price": 390},
                "quantity": 1,
                "totalPrice": 390,
                "selectedDonenesses": {"五分熟": 1},
                "selectedDrinks": {"紅茶": 1}
            },
            {
                "item": {"id": "steak-01", "name": "菲力牛排", "price": 390},
                "quantity": 1,
                "totalPrice": 390,
                "selectedDrinks": {"紅茶": 1},
                "selectedDonenesses": {"五分熟": 1}
            },
            {
                "item": {"id": "steak-01", "name": "菲力牛排", "price": 390},
                "quantity": 1,
                "totalPrice": 390,
                "selectedDonenesses": {"全熟": 1}
            }
        ]
    }));
    let rows = merge_line_items(&order.order().items).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].quantity.as_ref().and_then(Quantity::count), Some(2));
    assert_eq!(rows[1].quantity.as_ref().and_then(Quantity::count), Some(1));
}

#[test]
fn missing_menu_item_surfaces_as_malformed() {
    let order = record(json!({
        "customerInfo": {"name": "x", "phone": "y"},
        "orderType": "外帶",
        "totalPrice": 0,
        "items": [{"quantity": 1, "totalPrice": 100}]
    }));
    let err = merge_line_items(&order.order().items).unwrap_err();
    assert!(matches!(err, OrderError::MalformedLineItem { index: 0, .. }));
}

#[test]
fn string_and_garbage_quantities_are_fail_soft() {
    let order = record(json!({
        "customerInfo": {"name": "x", "phone": "y"},
        "orderType": "外帶",
        "totalPrice": 200,
        "items": [
            {
                "item": {"name": "雞塊餐", "price": 100},
                "quantity": 1,
                "totalPrice": 100,
                "selectedComponent": {"雞塊": "2", "薯條": "many"},
                "selectedDesserts": [{"name": "布丁", "quantity": null}]
            },
            {
                "item": {"name": "雞塊餐", "price": 100},
                "quantity": 1,
                "totalPrice": 100,
                "selectedComponent": {"雞塊": 1}
            }
        ]
    }));
    let report = summarize_with(&order.order().items, &SummaryOptions::default());
    assert_eq!(
        report.summary.quantity(SummaryCategory::Components, "雞塊"),
        Some(3)
    );
    assert!(!report.summary.contains(SummaryCategory::Desserts));
    assert_eq!(report.warnings.len(), 2);
    assert!(report
        .warnings
        .iter()
        .all(|w| matches!(w, OrderError::NonNumericQuantity { index: 0, .. })));
}

#[test]
fn persisted_order_renders_full_ticket() {
    let order = record(json!({
        "id": "-NxA7qZ3kP0w9lmn",
        "createdAt": 1760848200000_i64,
        "customerInfo": {"name": "王小明", "phone": "0912345678", "tableNumber": "12"},
        "orderType": "內用",
        "totalPrice": 720,
        "items": [
            {
                "cartKey": "set-1",
                "item": {"name": "豬排半套餐", "price": 360},
                "quantity": 2,
                "totalPrice": 720,
                "selectedSideChoices": {"白飯": 2},
                "selectedPastas": [{"name": "青醬", "quantity": 1, "price": 0}],
                "selectedSingleChoiceAddon": "玉米濃湯"
            }
        ]
    }));
    let doc = build_kitchen_ticket_doc(&order, None, &KitchenConfig::default()).unwrap();
    assert_eq!(doc.order_number.as_deref(), Some("0w9lmn"));
    let text = render_text(&doc, &KitchenConfig::default().layout);
    assert!(text.contains("類型: 內用 (12桌)"));
    assert!(text.contains("2x 豬排套餐"));
    assert!(text.contains("- 簡餐: 白飯x2"));
    assert!(text.contains("- 義麵: 青醬x1"));
    assert!(text.contains("- 單點加購: 玉米濃湯"));
    assert!(text.contains("簡餐: 白飯x2"));
    assert!(!text.contains("單點加購: 玉米濃湯x"));
}

#[test]
fn fractional_line_quantities_are_malformed() {
    let order = record(json!({
        "customerInfo": {"name": "x", "phone": "y"},
        "orderType": "外帶",
        "totalPrice": 300,
        "items": [
            {"cartKey": "k", "item": {"name": "A", "price": 100}, "quantity": 1.5, "totalPrice": 150},
            {"cartKey": "k", "item": {"name": "A", "price": 100}, "quantity": 1.5, "totalPrice": 150}
        ]
    }));
    let err = merge_line_items(&order.order().items).unwrap_err();
    assert!(matches!(err, OrderError::MalformedLineItem { index: 0, .. }));
}

#[test]
fn zero_quantity_sauce_does_not_split_rows() {
    let order = record(json!({
        "customerInfo": {"name": "x", "phone": "y"},
        "orderType": "外帶",
        "totalPrice": 200,
        "items": [
            {
                "item": {"name": "A", "price": 100},
                "quantity": 1,
                "totalPrice": 100,
                "selectedSauces": [{"name": "泡菜", "quantity": 0, "price": 0}]
            },
            {"item": {"name": "A", "price": 100}, "quantity": 1, "totalPrice": 100}
        ]
    }));
    let rows = merge_line_items(&order.order().items).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity.as_ref().and_then(Quantity::count), Some(2));
}
