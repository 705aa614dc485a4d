use loupe_core::{CategoryId, SelectorTable};

use super::{scan, Enumeration, EnumerationStrategy, HandlerSelectors};

/// Linear-scan dedup against every handler seen so far
///
/// Sizes its group list for the worst case (every selector on its own
/// handler) and trims once the scan is done. The correctness baseline for
/// the other strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Naive;

impl EnumerationStrategy for Naive {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn enumerate(&self, table: &dyn SelectorTable, category: Option<CategoryId>) -> Enumeration {
        let mut groups: Vec<HandlerSelectors> = Vec::with_capacity(table.len());

        for entry in scan(table, category) {
            match groups.iter_mut().find(|g| g.handler == entry.handler) {
                Some(group) => group.selectors.push(entry.selector),
                None => groups.push(HandlerSelectors::new(entry.handler, entry.selector)),
            }
        }

        groups.shrink_to_fit();
        Enumeration::from_groups(groups)
    }
}
