//! Disabled vs Enabled cache semantics

use crate::common::*;
use loupe::CacheState;
use proptest::prelude::*;

const CAT: CategoryId = CategoryId::DEFAULT;

#[test]
fn test_rebuild_then_read_matches_live() {
    init_tracing();
    let mut loupe = Loupe::new();
    loupe
        .add(&Batch::new(&[(1, &[1, 2]), (2, &[3]), (3, &[4, 5, 6])]).groups())
        .unwrap();
    loupe.enable_cache(CAT).unwrap();

    loupe.remove(s(2)).unwrap();
    loupe.replace(s(4), h(1)).unwrap();
    loupe.rebuild(CAT).unwrap();

    let cached = loupe.read(CAT).unwrap();
    assert_eq!(cached, loupe.enumerate(Some(CAT)));
    assert_eq!(cached.normalized(), oracle(loupe.registry(), CAT));
}

#[test]
fn test_consecutive_rebuilds_are_byte_identical() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1, 2]), (2, &[3])]).groups()).unwrap();
    let first = loupe.enable_cache(CAT).unwrap();
    let packed_first = loupe.read_packed(CAT).unwrap();

    let second = loupe.rebuild(CAT).unwrap();
    assert_eq!(first, second);
    assert_eq!(loupe.read_packed(CAT).unwrap(), packed_first);
    assert_eq!(loupe.cache().store().object_count(), 1);
}

#[test]
fn test_rebuild_after_change_writes_new_blob() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1, 2])]).groups()).unwrap();
    let first = loupe.enable_cache(CAT).unwrap();
    loupe.remove(s(2)).unwrap();
    let second = loupe.rebuild(CAT).unwrap();

    assert_ne!(first, second);
    assert_eq!(loupe.cache_state(CAT), CacheState::Enabled { blob: second });
    // the superseded snapshot is orphaned, not deleted
    assert!(loupe.cache().store().contains(&first));
}

#[test]
fn test_admin_errors() {
    let mut loupe = Loupe::new();
    assert!(matches!(
        loupe.enable_cache(CAT),
        Err(Error::NoEntriesForCategory(_))
    ));
    assert!(matches!(loupe.rebuild(CAT), Err(Error::CacheNotEnabled(_))));

    loupe.add(&Batch::new(&[(1, &[1])]).groups()).unwrap();
    loupe.enable_cache(CAT).unwrap();
    assert!(matches!(
        loupe.enable_cache(CAT),
        Err(Error::CacheAlreadyEnabled(_))
    ));
}

#[test]
fn test_packed_forms() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1, 2]), (2, &[3])]).groups()).unwrap();
    let disabled_packed = loupe.read_packed(CAT).unwrap();
    loupe.enable_cache(CAT).unwrap();

    let packed = loupe.read_packed(CAT).unwrap();
    assert_eq!(packed, disabled_packed);
    // two (handler, count) records plus three selectors
    assert_eq!(packed.len(), 2 * 24 + 3 * 4);
    assert_eq!(packed.len() % 4, 0);

    let handlers = loupe.read_handlers_packed(CAT).unwrap();
    assert_eq!(handlers.len(), 2 * 20);
    assert_eq!(&handlers[..20], h(1).as_bytes());
}

#[test]
fn test_category_sharding() {
    let mut loupe = Loupe::new();
    loupe
        .add(&Batch::new(&[(1, &[1, 2])]).in_category(CategoryId(1)).groups())
        .unwrap();
    loupe
        .add(&Batch::new(&[(2, &[3, 4])]).in_category(CategoryId(2)).groups())
        .unwrap();

    loupe.enable_cache(CategoryId(1)).unwrap();
    loupe.enable_cache(CategoryId(2)).unwrap();
    assert_eq!(
        loupe.cache().enabled_categories(),
        vec![CategoryId(1), CategoryId(2)]
    );
    assert_eq!(loupe.handlers(CategoryId(1)).unwrap(), vec![h(1)]);
    assert_eq!(loupe.handlers(CategoryId(2)).unwrap(), vec![h(2)]);
}

#[derive(Debug, Clone)]
enum Op {
    Add(u8, Vec<u16>),
    Remove(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u8>(), prop::collection::vec(0u16..200, 1..5)).prop_map(|(handler, sels)| Op::Add(handler, sels)),
        (0u16..200).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn test_disabled_read_always_live(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut loupe = Loupe::new();
        for op in &ops {
            match op {
                Op::Add(handler, sels) => {
                    let sels: Vec<Selector> = sels.iter().map(|&sel| s(sel as u32)).collect();
                    let _ = loupe.add(&[HandlerGroup::new(h(*handler as u64), &sels)]);
                }
                Op::Remove(sel) => {
                    let _ = loupe.remove(s(*sel as u32));
                }
            }
            let read = loupe.read(CAT).unwrap();
            prop_assert_eq!(read.normalized(), oracle(loupe.registry(), CAT));
        }
    }

    #[test]
    fn test_enabled_read_frozen_between_rebuilds(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let mut loupe = Loupe::new();
        loupe.add(&Batch::new(&[(1000, &[5000])]).groups()).unwrap();
        loupe.enable_cache(CAT).unwrap();
        let frozen = loupe.read(CAT).unwrap();

        for op in &ops {
            match op {
                Op::Add(handler, sels) => {
                    let sels: Vec<Selector> = sels.iter().map(|&sel| s(sel as u32)).collect();
                    let _ = loupe.add(&[HandlerGroup::new(h(*handler as u64), &sels)]);
                }
                Op::Remove(sel) => {
                    let _ = loupe.remove(s(*sel as u32));
                }
            }
            prop_assert_eq!(&loupe.read(CAT).unwrap(), &frozen);
        }

        loupe.rebuild(CAT).unwrap();
        prop_assert_eq!(loupe.read(CAT).unwrap().normalized(), oracle(loupe.registry(), CAT));
    }
}
