//! Test assertions for traversals.

use crate::pipeline::TraversalReport;

/// Asserts that stages were visited exactly in the expected order.
pub fn assert_visit_order(visited: &[String], expected: &[&str]) {
    let actual: Vec<&str> = visited.iter().map(String::as_str).collect();
    assert_eq!(
        actual, expected,
        "Expected visit order {expected:?}, got {actual:?}"
    );
}

/// Asserts that none of the given stages were visited.
pub fn assert_not_visited(visited: &[String], stages: &[&str]) {
    for stage in stages {
        assert!(
            !visited.iter().any(|name| name == stage),
            "Expected stage '{stage}' not to be visited, visits: {visited:?}"
        );
    }
}

/// Asserts the failed stages of a report, in failure order.
pub fn assert_failed_stages(report: &TraversalReport, expected: &[&str]) {
    assert_eq!(
        report.failed_stages(),
        expected,
        "Expected failed stages {expected:?}, got {:?}",
        report.failed_stages()
    );
}
