use super::*;
use acp_controller_k8s_api::{
    Connection, Flavor, ORYAccessControlPolicyRole, ORYAccessControlPolicyRoleSpec, ObjectMeta,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn status(observed_generation: i64, error: Option<(StatusCode, &str)>) -> ReconciliationStatus {
    ReconciliationStatus {
        observed_generation,
        last_error: error.map(|(status_code, description)| ReconciliationError {
            status_code,
            description: description.to_string(),
        }),
    }
}

fn role(
    generation: Option<i64>,
    status: Option<ReconciliationStatus>,
) -> ORYAccessControlPolicyRole {
    ORYAccessControlPolicyRole {
        metadata: ObjectMeta {
            name: Some("admins".to_string()),
            namespace: Some("ns".to_string()),
            generation,
            ..Default::default()
        },
        spec: ORYAccessControlPolicyRoleSpec {
            flavor: Flavor::Exact,
            id: None,
            members: vec!["alice".to_string()],
            keto: Connection::default(),
        },
        status,
    }
}

#[test]
fn first_sync_sets_generation() {
    assert_eq!(
        next_status(None, Outcome::Synced { generation: 1 }),
        Some(status(1, None))
    );
}

#[test]
fn success_clears_error() {
    let current = status(2, Some((StatusCode::UpsertFailed, "500 Internal Server Error")));
    assert_eq!(
        next_status(Some(&current), Outcome::Synced { generation: 3 }),
        Some(status(3, None))
    );
}

#[test]
fn repeated_success_needs_no_write() {
    let current = status(3, None);
    assert_eq!(
        next_status(Some(&current), Outcome::Synced { generation: 3 }),
        None
    );
}

#[test]
fn failure_keeps_observed_generation() {
    let current = status(2, None);
    assert_eq!(
        next_status(
            Some(&current),
            Outcome::failed(StatusCode::UpsertFailed, "PUT failed")
        ),
        Some(status(2, Some((StatusCode::UpsertFailed, "PUT failed"))))
    );
}

#[test]
fn repeated_failure_needs_no_write() {
    let current = status(2, Some((StatusCode::InvalidBackendAddress, "bad url")));
    assert_eq!(
        next_status(
            Some(&current),
            Outcome::failed(StatusCode::InvalidBackendAddress, "bad url")
        ),
        None
    );
}

#[test]
fn changed_failure_is_written() {
    let current = status(2, Some((StatusCode::InvalidBackendAddress, "bad url")));
    assert_eq!(
        next_status(
            Some(&current),
            Outcome::failed(StatusCode::UpsertFailed, "timed out")
        ),
        Some(status(2, Some((StatusCode::UpsertFailed, "timed out"))))
    );
}

#[rstest]
#[case(Some(1), None, true)]
#[case(Some(3), Some(status(2, None)), true)]
#[case(Some(3), Some(status(3, None)), false)]
#[case(Some(3), Some(status(3, Some((StatusCode::UpsertFailed, "x")))), false)]
#[case(None, None, false)]
fn pending(
    #[case] generation: Option<i64>,
    #[case] current: Option<ReconciliationStatus>,
    #[case] expected: bool,
) {
    assert_eq!(is_pending(&role(generation, current)), expected);
}

#[test]
fn patch_replaces_status() {
    let patch = make_patch::<ORYAccessControlPolicyRole>(&status(4, None));
    let expected = k8s::Patch::Merge(serde_json::json!({
        "apiVersion": "keto.ory.sh/v1alpha1",
        "kind": "ORYAccessControlPolicyRole",
        "status": { "observedGeneration": 4, "lastError": null },
    }));
    assert_eq!(patch, expected);
}
