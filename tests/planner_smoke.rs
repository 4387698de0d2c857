use bag_transfer_planner::config::PlannerConfig;
use bag_transfer_planner::graph::AirportGraph;
use bag_transfer_planner::metric::EuclideanMetric;
use bag_transfer_planner::model::{Bag, Flight, Handler, PlanningModel};
use bag_transfer_planner::solution::Solution;
use bag_transfer_planner::solver::solve;

fn terminal() -> AirportGraph {
    AirportGraph::builder()
        .gate("A1", 0.0, 0.0)
        .gate("A2", 100.0, 0.0)
        .gate("B1", 0.0, 250.0)
        .gate("B2", 100.0, 250.0)
        .symmetric_travel_time("A1", "B2", 45)
        .default_metric(EuclideanMetric::default())
        .build()
        .unwrap()
}

#[test]
fn smoke_plan_transfer_morning() {
    let flights = vec![
        Flight::arriving("LX100", "A1", 21_600),
        Flight::arriving("BA200", "A2", 22_200),
        Flight::departing("LH300", "B1", 27_000),
        Flight::departing("AF400", "B2", 28_800),
    ];
    let mut bags = Bag::batch("LX100", "LX100", "LH300", 4, 1);
    bags.extend(Bag::batch("BA200", "BA200", "AF400", 3, 2));
    bags.push(Bag::new("BA200-oversize", "BA200", "LH300", 9));

    let config = PlannerConfig::default();
    let model = PlanningModel::load(
        terminal(),
        flights,
        bags,
        Handler::fleet(2, 4, "A1", 20_000),
        &config,
    )
    .unwrap();

    let outcome = solve(&model, &config).unwrap();
    assert!(outcome.is_accepted(), "{:?}", outcome.report.violations);
    assert_eq!(outcome.solution.routed_bags().len(), 7);
    assert_eq!(outcome.solution.infeasible.len(), 1);
    assert_eq!(outcome.stats.workers.len(), config.workers);
}

#[test]
fn smoke_config_from_json() {
    let config: PlannerConfig = serde_json::from_str(
        r#"{"minimumConnectionTime": 1800, "allowLateDelivery": true, "timeBudgetMs": 250}"#,
    )
    .unwrap();
    assert_eq!(config.minimum_connection_time, 1_800);
    assert!(config.allow_late_delivery);
    assert_eq!(config.time_budget_ms, Some(250));
    assert_eq!(config.workers, PlannerConfig::default().workers);
}

#[test]
fn smoke_solution_json_roundtrip() {
    let config = PlannerConfig::default();
    let model = PlanningModel::load(
        terminal(),
        vec![
            Flight::arriving("LX100", "A1", 21_600),
            Flight::departing("LH300", "B1", 27_000),
        ],
        vec![Bag::new("tag-1", "LX100", "LH300", 1)],
        vec![Handler::new("tug-1", 4, "A2", 0)],
        &config,
    )
    .unwrap();
    let outcome = solve(&model, &config).unwrap();

    let json = serde_json::to_string(&outcome.solution).unwrap();
    assert!(json.contains(r#""action":"pickup""#));
    let parsed: Solution = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, outcome.solution);
}
