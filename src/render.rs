//! Plain-text painter for the editor render model.
//!
//! Stands in for a widget toolkit: walks the [`EditorTree`] from its roots and
//! writes one line per widget, indenting accordion panels. Collapsed panels
//! show only their header.

use std::fmt::Write as _;

use crate::editor::{EditorTree, PanelItem, SliderView, View, Widget};
use crate::param::ParamId;

const INDENT: &str = "  ";

/// Format a number for a slider readout.
///
/// Values with `0.001 < |v| < 10000` are cut to six characters. Outside that
/// range, anything longer than six characters is shown with two significant
/// digits.
pub fn format_num(value: f64) -> String {
    let text = value.to_string();
    let magnitude = value.abs();
    if magnitude > 0.001 && magnitude < 10000.0 {
        return text.chars().take(6).collect();
    }
    if text.len() > 6 {
        return two_significant(value);
    }
    text
}

/// Two significant digits, switching to exponent form for very large or very
/// small magnitudes.
fn two_significant(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if !(-6..2).contains(&exponent) {
        let formatted = format!("{value:.1e}");
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let mantissa = trim_zeros(mantissa);
        let sign = if exp.starts_with('-') { "" } else { "+" };
        return format!("{mantissa}e{sign}{exp}");
    }
    let decimals = usize::try_from(1 - exponent).unwrap_or(0);
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Paint every root of `tree`, one widget per line.
pub fn render_tree(tree: &EditorTree) -> String {
    let mut out = String::new();
    for id in tree.roots() {
        render_editor(tree, *id, 0, &mut out);
    }
    out
}

fn render_editor(tree: &EditorTree, id: ParamId, depth: usize, out: &mut String) {
    let Some(editor) = tree.get(id) else {
        let _ = writeln!(out, "{}<missing editor {id}>", INDENT.repeat(depth));
        return;
    };
    let view = editor.view();
    let pad = INDENT.repeat(depth);
    let _ = writeln!(out, "{pad}{}  ({id})", widget_line(view));

    if let Widget::Accordion {
        expanded: true,
        panel,
        ..
    } = &view.widget
    {
        for (index, item) in panel.iter().enumerate() {
            match item {
                PanelItem::Editor(child) => render_editor(tree, *child, depth + 1, out),
                PanelItem::Slider(slider) => {
                    let _ = writeln!(out, "{pad}{INDENT}[{index}] {}", slider_line(slider));
                }
            }
        }
    }
}

fn widget_line(view: &View) -> String {
    let label = view.label.as_deref().map(|l| format!("{l}: ")).unwrap_or_default();
    match &view.widget {
        Widget::Empty => format!("{label}<empty>"),
        Widget::Slider(slider) => format!("{label}{}", slider_line(slider)),
        Widget::Checkbox { checked } => {
            let mark = if *checked { "x" } else { " " };
            format!("{label}[{mark}]")
        }
        Widget::Select { options, selected } => {
            let items: Vec<String> = options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    if Some(i) == *selected {
                        format!("[{option}]")
                    } else {
                        option.clone()
                    }
                })
                .collect();
            format!("{label}{}", items.join(" | "))
        }
        Widget::TextInput { value } => format!("{label}{value:?}"),
        Widget::Accordion {
            title, expanded, ..
        } => {
            let arrow = if *expanded { "v" } else { ">" };
            if title.is_empty() {
                arrow.to_string()
            } else {
                format!("{arrow} {title}")
            }
        }
        Widget::Placeholder { reason } => format!("{label}<unresolved: {reason}>"),
    }
}

fn slider_line(slider: &SliderView) -> String {
    let scale = if slider.log_scale { " log" } else { "" };
    format!(
        "{} [{} .. {}{scale}]",
        slider.readout,
        format_num(slider.min),
        format_num(slider.max)
    )
}
