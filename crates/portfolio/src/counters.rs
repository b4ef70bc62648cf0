//! Statistic counters that count up from zero once visible.

use anyhow::Result;
use dom::NodeKey;
use log::{debug, warn};
use page_runtime::{IntersectionObserverInit, Page};
use std::collections::HashMap;

/// Frames a count-up takes: two seconds at sixty frames per second.
pub const FRAMES: f64 = 125.0;

/// Leading-integer parse: optional whitespace and sign, then digits up to the
/// first non-digit. `None` when no digit leads.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = rest
        .find(|ch: char| !ch.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    let value = digits.parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

fn tick(page: &mut Page, node: NodeKey, target: i64, current: f64) -> Result<()> {
    if !page.document().contains(node) {
        return Ok(());
    }
    let goal = target as f64;
    if current < goal {
        let next = current + goal / FRAMES;
        let shown = (next.ceil() as i64).min(target);
        page.document_mut().set_text_content(node, &shown.to_string())?;
        page.request_animation_frame(move |page, _| tick(page, node, target, next));
    } else {
        page.document_mut().set_text_content(node, &target.to_string())?;
    }
    Ok(())
}

/// Start counting `node` up to `target`; the first step happens immediately.
///
/// # Errors
/// Returns an error if the counter's text cannot be written.
pub fn animate(page: &mut Page, node: NodeKey, target: i64) -> Result<()> {
    tick(page, node, target, 0.0)
}

/// # Errors
/// Propagates selector and observer failures.
pub fn init(page: &mut Page) -> Result<()> {
    let mut targets = Vec::new();
    for counter in page.document().query_selector_all(".counter")? {
        let raw = page.document().attribute(counter, "data-target").unwrap_or_default();
        match parse_leading_int(raw) {
            Some(target) => targets.push((counter, target)),
            None => warn!("counter {counter:?} has no integer data-target {raw:?}; skipped"),
        }
    }
    if targets.is_empty() {
        debug!("no counters");
        return Ok(());
    }
    if !page.supports_intersection_observer() {
        debug!("intersection unsupported; counters stay static");
        return Ok(());
    }
    let goals: HashMap<NodeKey, i64> = targets.iter().copied().collect();
    let observer = page.create_intersection_observer(
        IntersectionObserverInit::default(),
        move |page, entries, observer| {
            for entry in entries.iter().filter(|entry| entry.is_intersecting) {
                page.unobserve(observer, entry.target);
                if let Some(target) = goals.get(&entry.target) {
                    animate(page, entry.target, *target)?;
                }
            }
            Ok(())
        },
    )?;
    for (counter, _) in targets {
        page.observe(observer, counter)?;
    }
    Ok(())
}
