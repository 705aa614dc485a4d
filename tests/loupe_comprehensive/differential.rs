//! Differential oracle: every strategy over every registry variant agrees
//! with a plain std-collections enumeration.

use crate::common::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(Vec<(u8, u8, Vec<u16>)>),
    Remove(u16),
    Replace(u16, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::collection::vec(
            (any::<u8>(), 0u8..3, prop::collection::vec(0u16..300, 1..6)),
            1..4
        )
        .prop_map(Op::Add),
        2 => (0u16..300).prop_map(Op::Remove),
        1 => (0u16..300, any::<u8>()).prop_map(|(sel, handler)| Op::Replace(sel, handler)),
    ]
}

fn apply<T: MutableSelectorTable>(table: &mut T, op: &Op) {
    match op {
        Op::Add(groups) => {
            let owned: Vec<(HandlerRef, CategoryId, Vec<Selector>)> = groups
                .iter()
                .map(|(handler, category, sels)| {
                    (
                        // spread handlers across few low bytes to force collisions
                        h((*handler as u64) << 8 | (*handler as u64 % 4)),
                        CategoryId(*category as u32),
                        sels.iter().map(|&sel| s(sel as u32)).collect(),
                    )
                })
                .collect();
            let batch: Vec<HandlerGroup<'_>> = owned
                .iter()
                .map(|(handler, category, sels)| HandlerGroup::new(*handler, sels).in_category(*category))
                .collect();
            let _ = table.add(&batch);
        }
        Op::Remove(sel) => {
            let _ = table.remove(s(*sel as u32));
        }
        Op::Replace(sel, handler) => {
            let _ = table.replace(s(*sel as u32), h(*handler as u64));
        }
    }
}

fn check<T: SelectorTable>(table: &T) -> Result<(), TestCaseError> {
    for category in (0..3).map(CategoryId) {
        let expected = oracle(table, category);
        for strategy in loupe::Strategy::ALL {
            let result = strategy.enumerate(table, Some(category));
            prop_assert_eq!(
                &result.normalized(),
                &expected,
                "strategy {} diverged in {}",
                strategy,
                category
            );
            prop_assert_eq!(result.handler_count(), expected.len());
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_strategies_agree_on_array_registry(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut table = SelectorRegistry::new();
        for op in &ops {
            apply(&mut table, op);
        }
        check(&table)?;
    }

    #[test]
    fn test_strategies_agree_on_linked_registry(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut table = LinkedRegistry::new();
        for op in &ops {
            apply(&mut table, op);
        }
        check(&table)?;
    }

    #[test]
    fn test_registries_enumerate_alike(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut array = SelectorRegistry::new();
        let mut linked = LinkedRegistry::new();
        for op in &ops {
            apply(&mut array, op);
            apply(&mut linked, op);
        }
        for category in (0..3).map(CategoryId) {
            let a = loupe::Strategy::Bucket.enumerate(&array, Some(category));
            let l = loupe::Strategy::Bucket.enumerate(&linked, Some(category));
            prop_assert!(a.same_mapping(&l));
        }
    }
}
