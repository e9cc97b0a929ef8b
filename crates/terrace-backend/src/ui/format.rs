//! Human-readable plan rendering

use super::colorize::Colorize;
use std::fmt::Write as _;
use terrace_engine::{DiffAction, InstanceDiff, Plan};

/// Render every resource action in `plan`, sorted by address
#[must_use]
pub fn format_plan(plan: &Plan, color: &Colorize) -> String {
    if plan.diff.is_empty() {
        return color.color("[reset][bold]This plan does nothing.");
    }

    let mut out = String::new();
    for (address, diff) in &plan.diff.resources {
        write_resource(&mut out, address, diff);
    }
    color.color(out.trim_end())
}

fn write_resource(out: &mut String, address: &str, diff: &InstanceDiff) {
    let (code, symbol) = match diff.action {
        DiffAction::Create => ("green", "+"),
        DiffAction::Replace => ("green", "-/+"),
        DiffAction::Update => ("yellow", "~"),
        DiffAction::Destroy => ("red", "-"),
        DiffAction::Read => ("cyan", "<="),
    };
    let _ = writeln!(out, "[reset][{code}]{symbol} {address}");

    if diff.action == DiffAction::Destroy {
        out.push('\n');
        return;
    }

    let width = diff.attributes.keys().map(String::len).max().unwrap_or(0);
    for (name, attr) in &diff.attributes {
        let new = if attr.computed {
            "<computed>".to_string()
        } else {
            format!("{:?}", attr.new)
        };
        let label = format!("{name}:");
        let _ = write!(out, "[reset]    {label:<pad$} {old:?} => {new}", pad = width + 1, old = attr.old);
        if attr.requires_new {
            out.push_str(" [red](forces new resource)");
        }
        out.push('\n');
    }
    out.push('\n');
}
