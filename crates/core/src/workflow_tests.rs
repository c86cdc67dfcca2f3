// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_workflow_starts_draft_and_not_executable() {
    let wf = Workflow::new(WorkflowId::new(), "wf1", vec![1, 2, 3]);
    assert_eq!(wf.status, WorkflowStatus::Draft);
    assert!(!wf.is_executable());
    assert_eq!(wf.version, 1);
    assert!(wf.retry_safe);
}

#[test]
fn publish_makes_it_executable() {
    let mut wf = Workflow::new(WorkflowId::new(), "wf1", vec![]);
    wf.publish().unwrap();
    assert!(wf.is_executable());
}

#[test]
fn archived_workflow_cannot_republish_or_publish() {
    let mut wf = Workflow::new(WorkflowId::new(), "wf1", vec![]);
    wf.publish().unwrap();
    wf.archive();
    assert_eq!(wf.status, WorkflowStatus::Archived);
    assert!(wf.publish().is_err());
    assert!(wf.republish(vec![9]).is_err());
}

#[test]
fn republish_bumps_version_and_definition() {
    let mut wf = Workflow::new(WorkflowId::new(), "wf1", vec![1]);
    wf.publish().unwrap();
    wf.republish(vec![2, 3]).unwrap();
    assert_eq!(wf.version, 2);
    assert_eq!(wf.definition, vec![2, 3]);
    assert!(wf.is_executable());
}
