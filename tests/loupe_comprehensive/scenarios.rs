//! Fixed scenarios

use crate::common::*;

#[test]
fn test_two_three_four_batch() {
    init_tracing();
    let mut loupe = Loupe::new();
    let batch = Batch::new(&[(1, &[1, 2]), (2, &[10, 11, 12]), (3, &[20, 21, 22, 23])]);
    loupe.add(&batch.groups()).unwrap();

    assert_eq!(loupe.registry().len(), 9);
    let enumeration = loupe.enumerate(None);
    assert_eq!(enumeration.handler_count(), 3);
    assert_eq!(group_sizes(&enumeration), vec![2, 3, 4]);
}

#[test]
fn test_enabled_read_returns_pre_mutation_snapshot() {
    init_tracing();
    let mut loupe = Loupe::new();
    let batch = Batch::new(&[(1, &[1, 2]), (2, &[3])]);
    loupe.add(&batch.groups()).unwrap();
    loupe.enable_cache(CategoryId::DEFAULT).unwrap();
    let before = loupe.read(CategoryId::DEFAULT).unwrap();

    loupe.remove(s(3)).unwrap();
    let more = Batch::new(&[(4, &[40, 41])]);
    loupe.add(&more.groups()).unwrap();

    // no rebuild: the snapshot is intentionally stale
    let after = loupe.read(CategoryId::DEFAULT).unwrap();
    assert_eq!(after, before);
    assert!(!after.same_mapping(&loupe.enumerate(Some(CategoryId::DEFAULT))));
}

#[test]
fn test_duplicate_aborts_batch_without_events() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1])]).groups()).unwrap();
    loupe.drain_events();

    let conflicting = Batch::new(&[(2, &[5, 6]), (3, &[1])]);
    assert!(matches!(
        loupe.add(&conflicting.groups()),
        Err(Error::DuplicateOperationId(sel)) if sel == s(1)
    ));
    assert_eq!(loupe.registry().len(), 1);
    assert!(loupe.lookup(s(5)).is_none());
    assert!(loupe.drain_events().is_empty());
}

#[test]
fn test_events_follow_iteration_order() {
    let mut loupe = Loupe::new();
    let batch = Batch::new(&[(1, &[3, 1]), (2, &[9]), (3, &[7, 8, 2])]);
    loupe.add(&batch.groups()).unwrap();

    let events: Vec<Selector> = loupe.drain_events().iter().map(|e| e.selector()).collect();
    let iteration: Vec<Selector> = loupe.entries().map(|e| e.selector).collect();
    assert_eq!(events, iteration);
    assert_eq!(iteration, [3, 1, 9, 7, 8, 2].map(s).to_vec());
}

#[test]
fn test_router_ignores_cache() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1]), (2, &[2])]).groups()).unwrap();
    loupe.router_mut().bind_fn(h(1), |_, _| Ok(b"one".to_vec()));
    loupe.router_mut().bind_fn(h(2), |_, _| Ok(b"two".to_vec()));
    loupe.enable_cache(CategoryId::DEFAULT).unwrap();

    loupe.replace(s(1), h(2)).unwrap();
    // the snapshot still says h(1), routing follows the registry
    assert_eq!(
        loupe.handler_of(CategoryId::DEFAULT, s(1)).unwrap(),
        Some(h(1))
    );
    assert_eq!(loupe.route(s(1), b"").unwrap(), b"two");
}

#[test]
fn test_route_errors() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1])]).groups()).unwrap();
    assert!(matches!(
        loupe.route(s(2), b""),
        Err(Error::OperationNotFound(_))
    ));
    assert!(matches!(
        loupe.route(s(1), b""),
        Err(Error::HandlerUnavailable(_))
    ));
}

#[test]
fn test_selector_reassigned_after_removal() {
    let mut loupe = Loupe::new();
    loupe.add(&Batch::new(&[(1, &[1, 2])]).groups()).unwrap();
    loupe.remove(s(1)).unwrap();
    loupe.add(&Batch::new(&[(2, &[1])]).groups()).unwrap();
    assert_eq!(loupe.lookup(s(1)), Some(h(2)));
    assert_eq!(loupe.registry().len(), 2);
}
