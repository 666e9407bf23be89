//! Tests for error aggregation and display.

use rstest::rstest;

use super::{GraphError, InjectconfError};
use crate::model::ElementId;

#[rstest]
fn empty_input_does_not_aggregate() {
    assert!(InjectconfError::try_aggregate(Vec::<InjectconfError>::new()).is_none());
}

#[rstest]
fn single_error_is_unwrapped() {
    let err = InjectconfError::try_aggregate([InjectconfError::graph(
        "app.Root",
        GraphError::NotAComponent {
            name: "app.Root".into(),
        },
    )]);
    assert!(matches!(err, Some(InjectconfError::Graph { .. })));
}

#[rstest]
fn multiple_errors_are_numbered() {
    let err = InjectconfError::try_aggregate([
        InjectconfError::graph(
            "app.A",
            GraphError::MissingDeclaration {
                name: "app.A".into(),
            },
        ),
        InjectconfError::graph(
            "app.B",
            GraphError::VoidProvision {
                element: ElementId::new("app.B#run()"),
            },
        ),
    ]);
    let Some(InjectconfError::Aggregate(agg)) = err else {
        panic!("expected aggregate, got {err:?}");
    };
    assert_eq!(agg.len(), 2);
    let rendered = agg.to_string();
    assert!(rendered.starts_with("1: analysis of 'app.A' failed"), "{rendered}");
    assert!(rendered.contains("2: analysis of 'app.B' failed: provision method app.B#run() must not return void"));
}
