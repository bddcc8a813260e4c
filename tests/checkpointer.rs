//! Checkpointer backend and instance-resume tests.

use std::sync::Arc;

use stateloom::message::Message;
use stateloom::node::NodePartial;
use stateloom::runtimes::{
    Checkpointer, InMemoryCheckpointer, InstanceInit, RunOptions, WorkflowInstance, WorkflowRunner,
};
use stateloom::state::VersionedState;

mod common;
use common::*;

fn query(text: &str) -> NodePartial {
    NodePartial::new()
        .with_query(text)
        .with_messages(vec![Message::user(text)])
}

#[tokio::test]
async fn fresh_instance_runs_and_is_saved() {
    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let runner = WorkflowRunner::new(stub_assistant().unwrap(), checkpointer.clone());

    let report = runner
        .run_instance(
            "conv-1",
            query("What is my account balance?"),
            &RunOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.init, InstanceInit::Fresh);
    assert!(report.checkpoint_error.is_none());
    assert!(report.state.latest_response().unwrap().contains("42"));

    let saved = checkpointer.load("conv-1").await.unwrap().expect("saved");
    assert_eq!(saved.state, report.state);
    assert!(saved.current_step > 0);
}

#[tokio::test]
async fn existing_checkpoint_is_resumed_not_reseeded() {
    let checkpointer = Arc::new(InMemoryCheckpointer::new());

    // Pre-seed a checkpoint carrying an earlier conversation.
    let prior = VersionedState::builder()
        .with_query("Is this product in stock?")
        .with_message(Message::assistant("Yes, 7 left."))
        .with_session("sess-2")
        .build();
    checkpointer
        .save(WorkflowInstance::new("conv-2", prior, 3))
        .await
        .unwrap();

    let runner = WorkflowRunner::new(stub_assistant().unwrap(), checkpointer.clone());
    let report = runner
        .run_instance("conv-2", query("ignored for resumed runs"), &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.init, InstanceInit::Resumed { checkpoint_step: 3 });
    let snapshot = report.state.snapshot();
    // The resumed state, not the new initial partial, seeded the run.
    assert_eq!(snapshot.query, "Is this product in stock?");
    assert_eq!(snapshot.session.as_deref(), Some("sess-2"));
    assert!(
        snapshot
            .messages
            .iter()
            .any(|m| m.content == "Yes, 7 left.")
    );
}

#[tokio::test]
async fn runner_lists_known_instances() {
    let runner = WorkflowRunner::new(
        stub_assistant().unwrap(),
        Arc::new(InMemoryCheckpointer::new()),
    );
    for id in ["b", "a"] {
        runner
            .run_instance(id, query("Tell me a joke"), &RunOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(runner.list_instances().await.unwrap(), vec!["a", "b"]);
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use stateloom::runtimes::SqliteCheckpointer;

    async fn connect(dir: &tempfile::TempDir) -> SqliteCheckpointer {
        let path = dir.path().join("checkpoints.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        SqliteCheckpointer::connect(&url).await.unwrap()
    }

    #[tokio::test]
    async fn sqlite_roundtrips_an_instance() {
        let dir = tempfile::tempdir().unwrap();
        let cp = connect(&dir).await;

        let state = VersionedState::builder()
            .with_query("what is my balance")
            .with_session("sess-9")
            .build();
        cp.save(WorkflowInstance::new("conv-9", state.clone(), 4))
            .await
            .unwrap();

        let loaded = cp.load("conv-9").await.unwrap().expect("row exists");
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.current_step, 4);
        assert!(cp.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sqlite_upsert_preserves_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let cp = connect(&dir).await;

        cp.save(WorkflowInstance::new("conv", VersionedState::default(), 1))
            .await
            .unwrap();
        let first = cp.load("conv").await.unwrap().unwrap();

        cp.save(WorkflowInstance::new(
            "conv",
            VersionedState::new_with_query("again"),
            2,
        ))
        .await
        .unwrap();
        let second = cp.load("conv").await.unwrap().unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.current_step, 2);
    }

    #[tokio::test]
    async fn sqlite_backed_runner_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instances.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        {
            let cp = SqliteCheckpointer::connect(&url).await.unwrap();
            let runner = WorkflowRunner::new(stub_assistant().unwrap(), Arc::new(cp));
            let report = runner
                .run_instance(
                    "durable-1",
                    query("What is my account balance?"),
                    &RunOptions::default(),
                )
                .await
                .unwrap();
            assert_eq!(report.init, InstanceInit::Fresh);
        }

        // A fresh connection sees the instance and resumes it.
        let cp = SqliteCheckpointer::connect(&url).await.unwrap();
        let runner = WorkflowRunner::new(stub_assistant().unwrap(), Arc::new(cp));
        let report = runner
            .run_instance("durable-1", query("ignored"), &RunOptions::default())
            .await
            .unwrap();
        assert!(matches!(report.init, InstanceInit::Resumed { .. }));
        assert_eq!(
            report.state.snapshot().query,
            "What is my account balance?"
        );
    }
}
