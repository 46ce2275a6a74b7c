//! Aggregation over an in-memory task source.

mod common;

use asana_export::{AggregateOptions, Aggregator, ExportError, TaskRecord};
use common::FakeSource;

fn collect_gids(record: &TaskRecord, out: &mut Vec<String>) {
    out.push(record.gid.clone());
    for child in &record.subtasks {
        collect_gids(child, out);
    }
}

#[tokio::test]
async fn test_tree_size_matches_depth_and_fan_out() {
    for (depth, fan_out) in [(1, 3), (2, 2), (3, 2), (4, 3)] {
        let source = FakeSource::new().tree("r", depth, fan_out);
        let aggregator = Aggregator::new(&source, AggregateOptions::default());

        let record = aggregator.aggregate("r").await.unwrap();
        let expected: usize = (0..depth).map(|i| fan_out.pow(i)).sum();

        assert_eq!(record.tree_size(), expected, "depth {depth}, fan-out {fan_out}");
        assert_eq!(source.detail_calls(), expected);
    }
}

#[tokio::test]
async fn test_children_keep_listing_order() {
    let source = FakeSource::new()
        .task("root", false)
        .task("b", false)
        .task("a", true)
        .task("c", false)
        .child("root", "b")
        .child("root", "a")
        .child("root", "c");

    for concurrency in [1, 4] {
        let aggregator = Aggregator::new(
            &source,
            AggregateOptions {
                concurrency,
                ..AggregateOptions::default()
            },
        );
        let record = aggregator.aggregate("root").await.unwrap();
        let gids: Vec<&str> = record.subtasks.iter().map(|s| s.gid.as_str()).collect();
        assert_eq!(gids, ["b", "a", "c"]);
    }
}

#[tokio::test]
async fn test_concurrent_walk_matches_sequential() {
    let source = FakeSource::new().tree("r", 3, 3);

    let sequential = Aggregator::new(&source, AggregateOptions::default())
        .aggregate("r")
        .await
        .unwrap();
    let concurrent = Aggregator::new(
        &source,
        AggregateOptions {
            concurrency: 8,
            ..AggregateOptions::default()
        },
    )
    .aggregate("r")
    .await
    .unwrap();

    let (mut a, mut b) = (Vec::new(), Vec::new());
    collect_gids(&sequential, &mut a);
    collect_gids(&concurrent, &mut b);
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_only_user_comments_are_kept() {
    let source = FakeSource::new()
        .task("1", false)
        .comment("1", "first")
        .activity("1", "assigned to Ada")
        .comment("1", "second");

    let record = Aggregator::new(&source, AggregateOptions::default())
        .aggregate("1")
        .await
        .unwrap();

    let texts: Vec<&str> = record.comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["first", "second"]);
    assert_eq!(record.comments[0].creator, "Grace");
}

#[tokio::test]
async fn test_cycle_is_reported() {
    let source = FakeSource::new()
        .task("a", false)
        .task("b", false)
        .child("a", "b")
        .child("b", "a");

    let err = Aggregator::new(&source, AggregateOptions::default())
        .aggregate("a")
        .await
        .unwrap_err();

    match err {
        ExportError::CycleDetected { gid, path } => {
            assert_eq!(gid, "a");
            assert_eq!(path, ["a", "b", "a"]);
        }
        other => panic!("expected CycleDetected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_self_referencing_task_is_a_cycle() {
    let source = FakeSource::new().task("a", false).child("a", "a");

    let err = Aggregator::new(&source, AggregateOptions::default())
        .aggregate("a")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::CycleDetected { .. }));
}

#[tokio::test]
async fn test_depth_limit() {
    let source = FakeSource::new().tree("r", 4, 1);
    let options = |max_depth| AggregateOptions {
        max_depth,
        ..AggregateOptions::default()
    };

    let ok = Aggregator::new(&source, options(3)).aggregate("r").await;
    assert_eq!(ok.unwrap().tree_size(), 4);

    let err = Aggregator::new(&source, options(2))
        .aggregate("r")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::DepthExceeded { max_depth: 2, .. }));
}

#[tokio::test]
async fn test_failing_subtask_fails_the_root() {
    let source = FakeSource::new()
        .task("root", false)
        .task("bad", false)
        .child("root", "bad")
        .broken("bad");

    let err = Aggregator::new(&source, AggregateOptions::default())
        .aggregate("root")
        .await
        .unwrap_err();
    assert!(err.is_task_local());
    assert!(err.to_string().contains("task bad"));
}

#[tokio::test]
async fn test_unauthorized_becomes_authentication_error() {
    let mut source = FakeSource::new().task("1", false);
    source.unauthorized = true;

    let err = Aggregator::new(&source, AggregateOptions::default())
        .aggregate("1")
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Authentication(_)));
    assert!(!err.is_task_local());
}
