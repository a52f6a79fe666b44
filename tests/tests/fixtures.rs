// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ledger_mavryk::MavrykClient;
use mavryk_sim::Model;
use mavryk_tests::{
    fixtures::{standard, FixtureError, FixtureRegistry, Fixtures},
    MavrykNavigator,
};

use helpers::{mock_base, MockBackend};

#[test]
fn order_dependencies_first() {
    let mut r = FixtureRegistry::new();
    r.register("c", &["b", "a"], |_| Ok(3u32));
    r.register("b", &["a"], |_| Ok(2u32));
    r.register("a", &["seed"], |_| Ok(1u32));
    r.register("unused", &[], |_| Ok(0u32));

    let base = Fixtures::new().with("seed", 0u32);

    assert_eq!(r.order(&["c"], &base).unwrap(), vec!["a", "b", "c"]);
    assert_eq!(r.order(&["b", "unused"], &base).unwrap(), vec!["a", "unused", "b"]);
}

#[test]
fn resolve_passes_values() {
    let mut r = FixtureRegistry::new();
    r.register("double", &["value"], |f| Ok(*f.get::<u32>("value")? * 2));
    r.register("label", &["double"], |f| {
        Ok(format!("{}", f.get::<u32>("double")?))
    });

    let f = r
        .resolve(&["label"], Fixtures::new().with("value", 21u32))
        .unwrap();

    assert_eq!(*f.get::<String>("label").unwrap(), "42");
    assert_eq!(*f.get::<u32>("double").unwrap(), 42);
}

#[test]
fn cycle_rejected() {
    let mut r = FixtureRegistry::new();
    r.register("a", &["b"], |_| Ok(()));
    r.register("b", &["c"], |_| Ok(()));
    r.register("c", &["a"], |_| Ok(()));

    match r.resolve(&["a"], Fixtures::new()) {
        Err(FixtureError::Cycle(c)) => assert_eq!(c, vec!["a", "b", "c"]),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("cycle resolved"),
    }
}

#[test]
fn missing_and_unknown() {
    let mut r = FixtureRegistry::new();
    r.register("a", &["backend"], |_| Ok(()));

    assert!(matches!(
        r.resolve(&["a"], Fixtures::new()),
        Err(FixtureError::Missing { fixture, name }) if fixture == "a" && name == "backend"
    ));

    assert!(matches!(
        r.resolve(&["b"], Fixtures::new()),
        Err(FixtureError::Unknown(n)) if n == "b"
    ));
}

#[test]
fn type_and_setup_errors() {
    let mut r = FixtureRegistry::new();
    r.register("wrong", &["value"], |f| {
        Ok(f.get::<String>("value")?.as_ref().clone())
    });
    r.register("failing", &[], |_| -> anyhow::Result<()> {
        anyhow::bail!("no device")
    });

    let base = Fixtures::new().with("value", 1u32);

    assert!(matches!(
        r.resolve(&["wrong"], base.clone()),
        Err(FixtureError::Type(n)) if n == "value"
    ));
    assert!(matches!(
        r.resolve(&["failing"], base),
        Err(FixtureError::Setup { name, .. }) if name == "failing"
    ));
}

#[test]
fn absent_value_lookup() {
    let f = Fixtures::new().with("value", 1u32);

    match f.get::<u32>("other") {
        Err(FixtureError::NotFound(n)) => assert_eq!(n, "other"),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("absent value found"),
    }

    // Lookups inside a factory keep the absent name
    let mut r = FixtureRegistry::new();
    r.register("reader", &[], |f| Ok(*f.get::<u32>("value")?));

    assert!(matches!(
        r.resolve(&["reader"], Fixtures::new()),
        Err(FixtureError::NotFound(n)) if n == "value"
    ));
}

#[test]
fn fresh_instance_per_resolution() {
    let count = Arc::new(AtomicUsize::new(0));

    let mut r = FixtureRegistry::new();
    let c = count.clone();
    r.register("counter", &[], move |_| Ok(c.fetch_add(1, Ordering::SeqCst)));

    let a = r.resolve(&["counter"], Fixtures::new()).unwrap();
    let b = r.resolve(&["counter"], Fixtures::new()).unwrap();

    assert_eq!(*a.get::<usize>("counter").unwrap(), 0);
    assert_eq!(*b.get::<usize>("counter").unwrap(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn standard_registrations() {
    let r = standard::<MockBackend>();

    assert_eq!(r.dependencies("client"), Some(vec!["backend"]));
    assert_eq!(
        r.dependencies("mavryk_navigator"),
        Some(vec![
            "backend",
            "device",
            "client",
            "navigator",
            "golden_run",
            "test_name"
        ])
    );
}

#[test]
fn standard_navigator_composition() {
    let (b, base) = mock_base(Model::NanoSP, &["a"], "test_compose");
    let r = standard::<MockBackend>();

    let f = r.resolve(&["mavryk_navigator"], base.clone()).unwrap();
    let n = f
        .get::<MavrykNavigator<MockBackend>>("mavryk_navigator")
        .unwrap();

    assert_eq!(n.test_name(), "test_compose");
    assert!(!n.golden_run());
    assert_eq!(n.device().model, Model::NanoSP);
    assert!(Arc::ptr_eq(n.backend(), &b));
    assert!(Arc::ptr_eq(n.client().transport(), &b));

    // Each resolution constructs a new client over the same backend
    let g = r.resolve(&["client"], base).unwrap();
    let c = g.get::<MavrykClient<MockBackend>>("client").unwrap();
    let c0 = f.get::<MavrykClient<MockBackend>>("client").unwrap();

    assert!(!Arc::ptr_eq(&c, &c0));
    assert!(Arc::ptr_eq(c.transport(), c0.transport()));
}
