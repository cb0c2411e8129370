use std::time::Instant;

use sol_colony::{
    catalog::BuildingKind,
    config::{ConfigLoader, Variant},
    error::ActionError,
    session::Session,
};
use tempfile::tempdir;

fn loader() -> ConfigLoader {
    ConfigLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn bundled_scenarios_load() {
    let red = loader()
        .load("scenarios/red_plains.yaml")
        .expect("red plains should load");
    assert_eq!(red.variant, Variant::Extended);
    assert_eq!(red.map_size.get(), 24);
    assert!(red.narrative.base_url.is_none());

    let outpost = loader()
        .load("scenarios/basic_outpost.yaml")
        .expect("outpost should load");
    assert_eq!(outpost.variant, Variant::Basic);
    assert!(!outpost.ai_enabled);
    assert_eq!(outpost.ticks(None), 60);
}

#[test]
fn headless_session_runs_offline() {
    let config = loader().load("scenarios/red_plains.yaml").unwrap();
    let mut session = Session::from_config(config, true).unwrap();
    assert!(!session.narrator().is_online());
    session.set_auto_build(true);

    let mut days = Vec::new();
    for _ in 0..30 {
        let summary = session.tick(Instant::now()).unwrap();
        days.push(summary.day);
    }
    assert_eq!(days, (1..=30).collect::<Vec<_>>());
    assert!(session.world().goal().is_some());
    assert!(session.world().grid().has_buildings());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.colony, "red_plains");
    assert_eq!(snapshot.tiles.len(), 24 * 24);
    assert_eq!(snapshot.history.len(), 30);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"variant\":\"extended\""));
}

#[test]
fn player_actions_go_through_the_session() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("flat.yaml"),
        "name: flat\nvariant: basic\nmap_size: 16\nstarting_money: 1000\n",
    )
    .unwrap();
    let config = ConfigLoader::new(dir.path()).load("flat.yaml").unwrap();
    let mut session = Session::new(config, None);

    let placed = session.place(BuildingKind::Habitat, 2, 2).unwrap();
    assert_eq!(placed.cost, 150);
    assert_eq!(
        session.place(BuildingKind::Road, 2, 2),
        Err(ActionError::Occupied { x: 2, y: 2 })
    );
    session.demolish(2, 2).unwrap();
    assert_eq!(session.world().stats().money, 1_000 - 150 - 25);
    assert_eq!(
        session.research("fusion"),
        Err(ActionError::MissingPrerequisite {
            tech: "fusion".into(),
            missing: "extraction".into()
        })
    );
    assert_eq!(session.claim_goal(), Err(ActionError::NoActiveGoal));
}
