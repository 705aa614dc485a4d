use loupe_core::{CategoryId, HandlerRef, SelectorTable};

use super::{scan, Enumeration, EnumerationStrategy, HandlerSelectors};

/// Count pass, then exact-size fill pass
///
/// The first pass finds every unique handler and how many selectors it
/// owns; the second allocates each group at exactly that size and fills
/// it. Dedup is still a linear scan, so time stays quadratic, but nothing
/// is over-allocated or trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoPass;

impl EnumerationStrategy for TwoPass {
    fn name(&self) -> &'static str {
        "two-pass"
    }

    fn enumerate(&self, table: &dyn SelectorTable, category: Option<CategoryId>) -> Enumeration {
        let mut counts: Vec<(HandlerRef, usize)> = Vec::new();
        for entry in scan(table, category) {
            match counts.iter_mut().find(|(h, _)| *h == entry.handler) {
                Some((_, count)) => *count += 1,
                None => counts.push((entry.handler, 1)),
            }
        }

        let mut groups: Vec<HandlerSelectors> = Vec::with_capacity(counts.len());
        groups.extend(counts.iter().map(|&(handler, count)| HandlerSelectors {
            handler,
            selectors: Vec::with_capacity(count),
        }));

        for entry in scan(table, category) {
            if let Some(group) = groups.iter_mut().find(|g| g.handler == entry.handler) {
                group.selectors.push(entry.selector);
            }
        }

        Enumeration::from_groups(groups)
    }
}
