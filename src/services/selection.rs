use std::collections::{HashMap, HashSet};

use crate::models::{ChannelKey, ContentItem, SelectionRequest, SelectionResult};

use super::shuffle;

/// Drops id-less items and repeated ids, keeping the first occurrence
pub fn normalize(items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());

    items
        .into_iter()
        .filter(|item| match item.key() {
            Some(id) => seen.insert(id.to_string()),
            None => false,
        })
        .collect()
}

/// Greedy pass accepting at most `max_per_channel` items per channel
///
/// Walks `items` in order and stops as soon as `target` items are accepted.
pub fn select_capped(items: &[ContentItem], target: usize, max_per_channel: usize) -> Vec<ContentItem> {
    let mut per_channel: HashMap<ChannelKey, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(target.min(items.len()));

    for (position, item) in items.iter().enumerate() {
        if selected.len() >= target {
            break;
        }

        let count = per_channel.entry(item.channel_key(position)).or_insert(0);
        if *count < max_per_channel {
            *count += 1;
            selected.push(item.clone());
        }
    }

    selected
}

/// Runs the capped pass with caps `initial_cap ..= initial_cap + max_steps`
///
/// Each step re-selects from the whole pool rather than topping up the previous
/// partial list. Returns the first result that reaches `target`, otherwise the one
/// computed at the highest cap, along with that cap.
pub fn select_with_relaxation(
    items: &[ContentItem],
    target: usize,
    initial_cap: usize,
    max_steps: usize,
) -> (Vec<ContentItem>, usize) {
    let mut cap = initial_cap;
    let mut result = select_capped(items, target, cap);

    for step in 1..=max_steps {
        // A wider cap cannot add anything once the whole pool is taken
        if result.len() >= target || result.len() == items.len() || cap == usize::MAX {
            break;
        }
        cap = initial_cap.saturating_add(step);
        result = select_capped(items, target, cap);
        tracing::debug!(cap, selected = result.len(), target, "Relaxed channel cap");
    }

    result.truncate(target);
    (result, cap)
}

/// Appends not-yet-selected items in pool order, ignoring channels, up to `target`
pub fn backfill(mut partial: Vec<ContentItem>, all_items: &[ContentItem], target: usize) -> Vec<ContentItem> {
    let mut present: HashSet<String> = partial
        .iter()
        .filter_map(ContentItem::key)
        .map(str::to_string)
        .collect();

    for item in all_items {
        if partial.len() >= target {
            break;
        }
        if let Some(id) = item.key() {
            if present.insert(id.to_string()) {
                partial.push(item.clone());
            }
        }
    }

    partial
}

/// Full engine pass: exclusion, optional shuffle, dedup, relaxation ladder, backfill
///
/// Never fails; an undersized pool simply yields a shorter list.
pub fn select(pool: Vec<ContentItem>, request: &SelectionRequest) -> SelectionResult {
    if request.target == 0 {
        return SelectionResult::empty();
    }

    let pool: Vec<ContentItem> = if request.exclude.is_empty() {
        pool
    } else {
        let excluded: HashSet<&str> = request.exclude.iter().map(String::as_str).collect();
        pool.into_iter()
            .filter(|item| item.key().map_or(true, |id| !excluded.contains(id)))
            .collect()
    };

    let (pool, seed) = if request.shuffle {
        let seed = request.seed.unwrap_or_else(rand::random);
        (shuffle::shuffle_seeded(pool, seed), Some(seed))
    } else {
        (pool, None)
    };

    let candidates = normalize(pool);
    let (capped, final_cap) = select_with_relaxation(
        &candidates,
        request.target,
        request.initial_cap.max(1),
        request.max_relaxation_steps,
    );
    let capped_len = capped.len();
    let items = backfill(capped, &candidates, request.target);
    let backfilled = items.len() - capped_len;

    tracing::debug!(
        candidates = candidates.len(),
        selected = items.len(),
        target = request.target,
        final_cap,
        backfilled,
        "Selection completed"
    );

    SelectionResult {
        items,
        final_cap,
        backfilled,
        seed,
    }
}
