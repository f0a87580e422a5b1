use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{
    merge_line_items_with, summarize_with, CategorySummary, MergePolicy, SummaryOptions,
};
use crate::config::KitchenConfig;
use crate::error::OrderError;
use crate::escpos::{char_width, display_width, EscPosBuilder, PaperWidth, TextEncoding};
use crate::order::{ChoiceCounts, LineItem, NamedSelection, OrderRecord, OrderType, Quantity};

/// Receipt variant. One template, two densities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptTemplate {
    Classic,
    #[default]
    Modern,
}

impl ReceiptTemplate {
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("classic") => Self::Classic,
            _ => Self::Modern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub paper_mm: i32,
    pub template: ReceiptTemplate,
    pub store_name: String,
    pub title: String,
    pub footer_text: Option<String>,
    /// Printer cannot take UTF-8; non-ASCII prints as `?`.
    pub ascii_only: bool,
    pub show_summary: bool,
    pub cut_paper: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper_mm: 80,
            template: ReceiptTemplate::Modern,
            store_name: "無名牛排".to_string(),
            title: "廚房工作單".to_string(),
            footer_text: Some("感謝您的訂購！".to_string()),
            ascii_only: false,
            show_summary: true,
            cut_paper: true,
        }
    }
}

impl LayoutConfig {
    pub fn paper_width(&self) -> PaperWidth {
        PaperWidth::from_mm(self.paper_mm)
    }

    pub fn encoding(&self) -> TextEncoding {
        if self.ascii_only {
            TextEncoding::Ascii
        } else {
            TextEncoding::Utf8
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDetail {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketLine {
    pub quantity: u32,
    pub name: String,
    pub total: f64,
    #[serde(default)]
    pub details: Vec<TicketDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KitchenTicketDoc {
    pub order_number: Option<String>,
    pub created_at: String,
    pub customer: String,
    pub order_type: String,
    pub items: Vec<TicketLine>,
    pub summary: CategorySummary,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderWarning {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct EscPosRender {
    pub bytes: Vec<u8>,
    pub warnings: Vec<RenderWarning>,
}

// ---------------------------------------------------------------------------
// Document building
// ---------------------------------------------------------------------------

const ORDER_NUMBER_LEN: usize = 6;

/// Set-menu variants print under one kitchen name.
pub fn display_name(name: &str) -> String {
    name.replace("半全餐", "套餐").replace("半套餐", "套餐")
}

fn short_order_number(id: &str) -> String {
    let chars: Vec<char> = id.trim().chars().collect();
    let start = chars.len().saturating_sub(ORDER_NUMBER_LEN);
    chars[start..].iter().collect()
}

fn format_created_at(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .unwrap_or_else(Utc::now)
        .with_timezone(&Local)
        .format("%Y/%m/%d %H:%M:%S")
        .to_string()
}

fn order_type_line(order_type: &OrderType, table_number: Option<&str>) -> String {
    match (order_type, table_number.map(str::trim).filter(|t| !t.is_empty())) {
        (OrderType::DineIn, Some(table)) => format!("{} ({table}桌)", order_type.label()),
        _ => order_type.label().to_string(),
    }
}

fn quantity_text(raw: &serde_json::Value) -> String {
    Quantity::from_value(raw.clone())
        .count()
        .map(|n| n.to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn counts_text(counts: &ChoiceCounts) -> Option<String> {
    if counts.is_empty() {
        return None;
    }
    Some(
        counts
            .iter()
            .map(|(name, qty)| format!("{name}x{}", quantity_text(qty)))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn list_text(list: &[NamedSelection], separator: &str) -> Option<String> {
    if list.is_empty() {
        return None;
    }
    Some(
        list.iter()
            .map(|s| format!("{}{separator}x{}", s.name, quantity_text(s.quantity.raw())))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Per-dish detail lines in kitchen reading order.
pub fn item_details(item: &LineItem) -> Vec<TicketDetail> {
    let non_empty = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    };
    [
        ("熟度", counts_text(&item.selected_donenesses)),
        ("炸物", counts_text(&item.selected_component)),
        ("簡餐", counts_text(&item.selected_side_choices)),
        ("口味", counts_text(&item.selected_multi_choice)),
        ("飲料", counts_text(&item.selected_drinks)),
        ("醬料", list_text(&item.selected_sauces, "")),
        ("甜品", list_text(&item.selected_desserts, "")),
        ("義麵", list_text(&item.selected_pastas, "")),
        ("單點加購", non_empty(item.selected_single_choice_addon.as_deref())),
        ("加購", list_text(&item.selected_addons, " ")),
        ("備註", non_empty(item.selected_notes.as_deref())),
    ]
    .into_iter()
    .filter_map(|(label, text)| {
        text.map(|text| TicketDetail {
            label: label.to_string(),
            text,
        })
    })
    .collect()
}

/// Merge, summarize and lay out an order as a kitchen ticket.
///
/// `fallback_id` is the id the caller holds for a draft that has not been
/// persisted yet.
pub fn build_kitchen_ticket_doc(
    record: &OrderRecord,
    fallback_id: Option<&str>,
    cfg: &KitchenConfig,
) -> Result<KitchenTicketDoc, OrderError> {
    build_ticket(record, fallback_id, &cfg.merge, &cfg.summary)
}

fn build_ticket(
    record: &OrderRecord,
    fallback_id: Option<&str>,
    merge: &MergePolicy,
    summary: &SummaryOptions,
) -> Result<KitchenTicketDoc, OrderError> {
    let order = record.order();
    let rows = merge_line_items_with(&order.items, merge)?;
    let report = summarize_with(&order.items, summary);

    let items = rows
        .iter()
        .map(|row| TicketLine {
            quantity: row.quantity.as_ref().and_then(Quantity::count).unwrap_or(0),
            name: row
                .item
                .as_ref()
                .map(|menu| display_name(&menu.name))
                .unwrap_or_default(),
            total: row.total_price,
            details: item_details(row),
        })
        .collect::<Vec<_>>();

    let customer = &order.customer_info;
    let doc = KitchenTicketDoc {
        order_number: record
            .order_id(fallback_id)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(short_order_number),
        created_at: format_created_at(record.created_at()),
        customer: format!("{} ({})", customer.name.trim(), customer.phone.trim()),
        order_type: order_type_line(&order.order_type, customer.table_number.as_deref()),
        items,
        summary: report.summary,
        total: order.total_price,
    };
    debug!(
        order_number = ?doc.order_number,
        rows = doc.items.len(),
        warnings = report.warnings.len(),
        "Built kitchen ticket"
    );
    Ok(doc)
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn money(value: f64) -> String {
    if (value.round() - value).abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Wrap by display width; words longer than a line are broken by character.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(8);
    let mut out = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;
    for token in text.split_whitespace() {
        let token_width = display_width(token);
        let sep = usize::from(!line.is_empty());
        if line_width + sep + token_width <= width {
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(token);
            line_width += sep + token_width;
            continue;
        }
        if !line.is_empty() {
            out.push(std::mem::take(&mut line));
            line_width = 0;
        }
        for ch in token.chars() {
            let w = char_width(ch);
            if line_width + w > width {
                out.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(ch);
            line_width += w;
        }
    }
    if !line.is_empty() {
        out.push(line);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn detail_line(detail: &TicketDetail) -> String {
    format!("- {}: {}", detail.label, detail.text)
}

fn summary_lines(summary: &CategorySummary) -> Vec<String> {
    summary
        .iter()
        .map(|(category, tally)| {
            let entries = tally
                .iter()
                .map(|(name, qty)| format!("{name}x{qty}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {}", category.label(), entries)
        })
        .collect()
}

fn header_lines(doc: &KitchenTicketDoc) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();
    if let Some(number) = &doc.order_number {
        lines.push(("單號", number.clone()));
    }
    lines.push(("時間", doc.created_at.clone()));
    lines.push(("顧客", doc.customer.clone()));
    lines.push(("類型", doc.order_type.clone()));
    lines
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

fn pad_pair(label: &str, value: &str, width: usize) -> String {
    let gap = width
        .saturating_sub(display_width(label) + display_width(value))
        .max(1);
    format!("{label}{}{value}", " ".repeat(gap))
}

fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text)) / 2;
    format!("{}{text}", " ".repeat(pad))
}

/// Plain-text rendering for previews and logs.
pub fn render_text(doc: &KitchenTicketDoc, cfg: &LayoutConfig) -> String {
    let width = cfg.paper_width().chars();
    let modern = cfg.template == ReceiptTemplate::Modern;
    let separator = "-".repeat(width);
    let section = |title: &str| {
        if modern {
            format!("【{title}】")
        } else {
            title.to_string()
        }
    };
    let mut out: Vec<String> = vec![
        center(&cfg.store_name, width),
        center(&cfg.title, width),
        separator.clone(),
    ];
    for (label, value) in header_lines(doc) {
        out.extend(wrap(&format!("{label}: {value}"), width));
    }
    out.push(separator.clone());
    if doc.items.is_empty() {
        out.push("(無品項)".to_string());
    }
    for item in &doc.items {
        out.push(pad_pair(
            &format!("{}x {}", item.quantity, item.name),
            &money(item.total),
            width,
        ));
        for detail in &item.details {
            let lines = wrap(&detail_line(detail), width.saturating_sub(2));
            out.extend(lines.into_iter().map(|line| format!("  {line}")));
        }
    }
    if cfg.show_summary && !doc.summary.is_empty() {
        out.push(separator.clone());
        out.push(section("備料統計"));
        for line in summary_lines(&doc.summary) {
            out.extend(wrap(&line, width));
        }
    }
    out.push(separator);
    out.push(pad_pair("", &format!("總計: ${}", money(doc.total)), width));
    if let Some(footer) = cfg
        .footer_text
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        out.push(center(footer, width));
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

// ---------------------------------------------------------------------------
// ESC/POS
// ---------------------------------------------------------------------------

fn emit_pair(builder: &mut EscPosBuilder, label: &str, value: &str, width: usize) {
    if display_width(label) + display_width(value) < width {
        builder.line_pair(label, value);
        return;
    }
    for line in wrap(label, width.saturating_sub(display_width(value) + 1)) {
        builder.text(&line).lf();
    }
    builder.right().text(value).lf().left();
}

fn emit_wrapped(builder: &mut EscPosBuilder, text: &str, width: usize) {
    for line in wrap(text, width) {
        builder.text(&line).lf();
    }
}

#[derive(Debug, Clone, Copy)]
struct EscPosStyle {
    modern: bool,
    compact_width: bool,
}

fn escpos_style(cfg: &LayoutConfig) -> EscPosStyle {
    EscPosStyle {
        modern: cfg.template == ReceiptTemplate::Modern,
        compact_width: cfg.paper_width().chars() <= 32,
    }
}

fn emit_section_header(builder: &mut EscPosBuilder, title: &str, style: EscPosStyle) {
    builder.separator();
    if style.modern && !style.compact_width {
        builder
            .bold(true)
            .double_height()
            .text(title)
            .lf()
            .normal_size()
            .bold(false);
    } else {
        builder.bold(true).text(title).lf().bold(false);
    }
}

fn emit_item_line(
    builder: &mut EscPosBuilder,
    item: &TicketLine,
    width: usize,
    style: EscPosStyle,
) {
    let label = format!("{}x {}", item.quantity, item.name);
    let value = money(item.total);
    builder.bold(true);
    if style.modern {
        builder.double_height();
    }
    emit_pair(builder, &label, &value, width);
    if style.modern {
        builder.normal_size();
    }
    builder.bold(false);
    for detail in &item.details {
        for line in wrap(&detail_line(detail), width.saturating_sub(2)) {
            builder.text("  ").text(&line).lf();
        }
    }
}

fn emit_header(
    builder: &mut EscPosBuilder,
    doc: &KitchenTicketDoc,
    cfg: &LayoutConfig,
    style: EscPosStyle,
) {
    let width = cfg.paper_width().chars();
    builder.center();
    if style.modern && !style.compact_width {
        builder
            .bold(true)
            .double_size()
            .text(&cfg.store_name)
            .lf()
            .normal_size()
            .double_height()
            .text(&cfg.title)
            .lf()
            .normal_size()
            .bold(false);
    } else {
        builder
            .bold(true)
            .text(&cfg.store_name)
            .lf()
            .text(&cfg.title)
            .lf()
            .bold(false);
    }
    builder.left().separator();
    builder.bold(true);
    for (label, value) in header_lines(doc) {
        emit_wrapped(builder, &format!("{label}: {value}"), width);
    }
    builder.bold(false);
}

fn has_non_ascii(doc: &KitchenTicketDoc, cfg: &LayoutConfig) -> bool {
    let mut texts = vec![cfg.store_name.clone(), cfg.title.clone()];
    texts.extend(
        header_lines(doc)
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}")),
    );
    for item in &doc.items {
        texts.push(item.name.clone());
        texts.extend(item.details.iter().map(detail_line));
    }
    if cfg.show_summary {
        texts.extend(summary_lines(&doc.summary));
    }
    texts.extend(cfg.footer_text.clone());
    texts.iter().any(|t| !t.is_ascii())
}

pub fn render_escpos(doc: &KitchenTicketDoc, cfg: &LayoutConfig) -> EscPosRender {
    let width = cfg.paper_width().chars();
    let style = escpos_style(cfg);
    let mut warnings = Vec::new();
    if cfg.ascii_only && has_non_ascii(doc, cfg) {
        warnings.push(RenderWarning {
            code: "non_ascii_replaced".to_string(),
            message: "Printer is ASCII-only; non-ASCII text printed as '?'".to_string(),
        });
    }

    let mut builder = EscPosBuilder::new()
        .with_paper(cfg.paper_width())
        .with_encoding(cfg.encoding());
    builder.init();
    emit_header(&mut builder, doc, cfg, style);

    emit_section_header(&mut builder, "品項", style);
    if doc.items.is_empty() {
        builder.text("(無品項)").lf();
    }
    for item in &doc.items {
        emit_item_line(&mut builder, item, width, style);
    }

    if cfg.show_summary && !doc.summary.is_empty() {
        emit_section_header(&mut builder, "備料統計", style);
        for line in summary_lines(&doc.summary) {
            emit_wrapped(&mut builder, &line, width);
        }
    }

    builder.separator().right().bold(true);
    if style.modern {
        builder.double_size();
    }
    builder
        .text(&format!("總計: ${}", money(doc.total)))
        .lf()
        .normal_size()
        .bold(false);
    if let Some(footer) = cfg
        .footer_text
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
    {
        builder.center().text(footer).lf().left();
    }
    builder.feed(4);
    if cfg.cut_paper {
        builder.cut();
    }

    EscPosRender {
        bytes: builder.build(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{MenuItem, Order, PersistedOrder};
    use serde_json::json;

    fn count_sequence(bytes: &[u8], seq: &[u8]) -> usize {
        if seq.is_empty() {
            return 0;
        }
        bytes
            .windows(seq.len())
            .filter(|window| *window == seq)
            .count()
    }

    fn sample_record() -> OrderRecord {
        let mut steak = LineItem::new(MenuItem::new("沙朗牛排半全餐", 300.0), 1, 300.0);
        steak.cart_key = Some("sirloin-medium".into());
        steak.selected_donenesses.insert("五分熟".into(), json!(1));
        steak.selected_sauces = vec![NamedSelection::new("蘑菇醬", 1, 0.0)];
        steak.selected_addons = vec![NamedSelection::new("加蛋", 1, 15.0)];
        steak.selected_notes = Some("醬分開".into());
        let mut second = steak.clone();
        second.quantity = Some(Quantity::new(2));
        second.total_price = 600.0;

        OrderRecord::Persisted(PersistedOrder {
            id: "ord-20261019-4F2A91".into(),
            created_at: None,
            order: Order {
                customer_info: crate::order::CustomerInfo {
                    name: "王小明".into(),
                    phone: "0912345678".into(),
                    table_number: Some("5".into()),
                },
                order_type: OrderType::DineIn,
                items: vec![steak, second],
                total_price: 900.0,
            },
        })
    }

    fn sample_doc() -> KitchenTicketDoc {
        build_kitchen_ticket_doc(&sample_record(), None, &KitchenConfig::default()).unwrap()
    }

    #[test]
    fn display_name_folds_set_menu_variants() {
        assert_eq!(display_name("沙朗牛排半全餐"), "沙朗牛排套餐");
        assert_eq!(display_name("雞排半套餐"), "雞排套餐");
        assert_eq!(display_name("濃湯"), "濃湯");
    }

    #[test]
    fn ticket_merges_rows_and_shortens_order_number() {
        let doc = sample_doc();
        assert_eq!(doc.order_number.as_deref(), Some("4F2A91"));
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.items[0].quantity, 3);
        assert_eq!(doc.items[0].total, 900.0);
        assert_eq!(doc.items[0].name, "沙朗牛排套餐");
        assert_eq!(doc.order_type, "內用 (5桌)");
        assert_eq!(doc.customer, "王小明 (0912345678)");
    }

    #[test]
    fn item_details_follow_kitchen_order() {
        let doc = sample_doc();
        let labels: Vec<&str> = doc.items[0].details.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["熟度", "醬料", "加購", "備註"]);
        assert_eq!(doc.items[0].details[0].text, "五分熟x1");
        assert_eq!(doc.items[0].details[2].text, "加蛋 x1");
    }

    #[test]
    fn takeout_omits_table_number() {
        assert_eq!(order_type_line(&OrderType::Takeout, Some("5")), "外帶");
        assert_eq!(order_type_line(&OrderType::DineIn, None), "內用");
    }

    #[test]
    fn draft_without_fallback_has_no_order_number() {
        let record = OrderRecord::Draft(sample_record().order().clone());
        let doc = build_kitchen_ticket_doc(&record, None, &KitchenConfig::default()).unwrap();
        assert_eq!(doc.order_number, None);
        let doc =
            build_kitchen_ticket_doc(&record, Some("abc"), &KitchenConfig::default()).unwrap();
        assert_eq!(doc.order_number.as_deref(), Some("abc"));
    }

    #[test]
    fn text_render_contains_sections() {
        let text = render_text(&sample_doc(), &LayoutConfig::default());
        assert!(text.contains("無名牛排"));
        assert!(text.contains("單號: 4F2A91"));
        assert!(text.contains("3x 沙朗牛排套餐"));
        assert!(text.contains("- 醬料: 蘑菇醬x1"));
        assert!(text.contains("【備料統計】"));
        assert!(text.contains("醬料: 蘑菇醬x2"));
        assert!(text.contains("加購: 加蛋x2"));
        assert!(text.contains("總計: $900"));
        assert!(text.contains("感謝您的訂購！"));
    }

    #[test]
    fn summary_section_hidden_when_disabled() {
        let cfg = LayoutConfig {
            show_summary: false,
            ..LayoutConfig::default()
        };
        let text = render_text(&sample_doc(), &cfg);
        assert!(!text.contains("備料統計"));
    }

    #[test]
    fn modern_template_emits_more_large_text_commands_than_classic() {
        let doc = sample_doc();
        let classic = LayoutConfig {
            template: ReceiptTemplate::Classic,
            ..LayoutConfig::default()
        };
        let modern = LayoutConfig::default();
        let classic_render = render_escpos(&doc, &classic);
        let modern_render = render_escpos(&doc, &modern);
        let classic_large = count_sequence(&classic_render.bytes, &[0x1D, 0x21, 0x01]);
        let modern_large = count_sequence(&modern_render.bytes, &[0x1D, 0x21, 0x01]);
        assert!(modern_large > classic_large);
    }

    #[test]
    fn escpos_ends_with_cut_unless_disabled() {
        let doc = sample_doc();
        let out = render_escpos(&doc, &LayoutConfig::default());
        assert!(out.bytes.ends_with(&[0x1D, 0x56, 0x41, 0x10]));
        let text = String::from_utf8_lossy(&out.bytes);
        assert!(text.contains("蘑菇醬"));

        let no_cut = LayoutConfig {
            cut_paper: false,
            ..LayoutConfig::default()
        };
        let out = render_escpos(&doc, &no_cut);
        assert!(out.bytes.ends_with(&[0x1B, 0x64, 4]));
    }

    #[test]
    fn ascii_only_printer_warns() {
        let cfg = LayoutConfig {
            ascii_only: true,
            ..LayoutConfig::default()
        };
        let out = render_escpos(&sample_doc(), &cfg);
        assert!(out.warnings.iter().any(|w| w.code == "non_ascii_replaced"));
        assert!(out.bytes.iter().all(|b| *b < 0x80));
    }

    #[test]
    fn wrap_breaks_long_cjk_runs() {
        let lines = wrap("醬料: 蘑菇醬x1, 黑胡椒醬x2, 紅酒醬x3", 12);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| display_width(l) <= 12));
    }

    #[test]
    fn template_from_value_defaults_to_modern() {
        assert_eq!(ReceiptTemplate::from_value(Some(" Classic ")), ReceiptTemplate::Classic);
        assert_eq!(ReceiptTemplate::from_value(None), ReceiptTemplate::Modern);
    }

    #[test]
    fn ascii_warning_tracks_replaced_text() {
        let doc = KitchenTicketDoc {
            order_number: Some("000123".into()),
            created_at: "2026/10/19 12:30:00".into(),
            customer: "Amy (0988)".into(),
            order_type: "takeout".into(),
            items: vec![TicketLine {
                quantity: 1,
                name: "Burger".into(),
                total: 120.0,
                details: Vec::new(),
            }],
            summary: CategorySummary::default(),
            total: 120.0,
        };
        let cfg = LayoutConfig {
            ascii_only: true,
            store_name: "Diner".into(),
            title: "Kitchen".into(),
            footer_text: Some("Thanks".into()),
            ..LayoutConfig::default()
        };
        // Header labels are CJK, so they still print as '?'.
        let out = render_escpos(&doc, &cfg);
        assert!(out.bytes.contains(&b'?'));
        assert!(out.warnings.iter().any(|w| w.code == "non_ascii_replaced"));

        let utf8 = LayoutConfig {
            ascii_only: false,
            ..cfg.clone()
        };
        assert!(render_escpos(&doc, &utf8).warnings.is_empty());
    }

    #[test]
    fn non_ascii_check_covers_header_labels() {
        let mut doc = sample_doc();
        doc.items.clear();
        doc.summary = CategorySummary::default();
        let cfg = LayoutConfig {
            store_name: "Diner".into(),
            title: "Kitchen".into(),
            footer_text: None,
            ..LayoutConfig::default()
        };
        assert!(has_non_ascii(&doc, &cfg));
        let lines: Vec<String> = header_lines(&doc)
            .into_iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect();
        assert!(lines.iter().any(|l| !l.is_ascii()));
    }
}
