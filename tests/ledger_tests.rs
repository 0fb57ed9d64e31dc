mod common;

use chrono::Utc;
use common::create_test_dir;
use compute_toggle::bridge::{ExecutionLedger, FileLedger, LedgerError};
use compute_toggle::engine::{ExecutionRecord, ExecutionStatus, Invocation};
use compute_toggle::request::Action;

fn invocation(id: &str) -> Invocation {
    Invocation {
        execution_id: id.to_string(),
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_file_ledger_appends_records_in_order() {
    let dir = create_test_dir();
    let ledger = FileLedger::new(dir.path().join("state"), "executions");

    ledger
        .put_record(&ExecutionRecord::succeeded(&invocation("a"), Action::Start, 2))
        .await
        .unwrap();
    ledger
        .put_record(&ExecutionRecord::skipped(&invocation("b"), Action::Stop, "nothing running"))
        .await
        .unwrap();

    let records = ledger.read_records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].execution_id, "a");
    assert_eq!(records[0].status, ExecutionStatus::Success);
    assert_eq!(records[1].execution_id, "b");
    assert_eq!(records[1].status, ExecutionStatus::Skipped);

    let content = std::fs::read_to_string(ledger.path()).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn test_file_ledger_identical_rewrite_is_noop() {
    let dir = create_test_dir();
    let ledger = FileLedger::new(dir.path(), "executions");
    let record = ExecutionRecord::failed(&invocation("a"), "pause", "Invalid action");

    ledger.put_record(&record).await.unwrap();
    ledger.put_record(&record).await.unwrap();

    let records = ledger.read_records().await.unwrap();
    assert_eq!(records, vec![record]);
}

#[tokio::test]
async fn test_file_ledger_never_overwrites() {
    let dir = create_test_dir();
    let ledger = FileLedger::new(dir.path(), "executions");
    let first = ExecutionRecord::failed(&invocation("a"), "pause", "Invalid action");
    let second = ExecutionRecord::critical(&invocation("a"), "something else");

    ledger.put_record(&first).await.unwrap();
    let err = ledger.put_record(&second).await.unwrap_err();

    assert!(matches!(err, LedgerError::Conflict(id) if id == "a"));
    assert_eq!(ledger.read_records().await.unwrap(), vec![first]);
}

#[tokio::test]
async fn test_missing_file_reads_as_empty() {
    let dir = create_test_dir();
    let ledger = FileLedger::new(dir.path(), "never-written");
    assert!(ledger.read_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_line_is_reported() {
    let dir = create_test_dir();
    let ledger = FileLedger::new(dir.path(), "executions");
    std::fs::write(ledger.path(), "{not a record}\n").unwrap();

    let err = ledger.read_records().await.unwrap_err();
    assert!(matches!(err, LedgerError::Serialization(_)));
}

#[tokio::test]
async fn test_file_ledger_indexes_records_written_before_open() {
    let dir = create_test_dir();
    let earlier = FileLedger::new(dir.path(), "executions");
    let stored = ExecutionRecord::succeeded(&invocation("a"), Action::Start, 1);
    earlier.put_record(&stored).await.unwrap();

    let reopened = FileLedger::new(dir.path(), "executions");
    reopened.put_record(&stored).await.unwrap();
    let err = reopened
        .put_record(&ExecutionRecord::critical(&invocation("a"), "late failure"))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(id) if id == "a"));

    reopened
        .put_record(&ExecutionRecord::skipped(&invocation("b"), Action::Stop, "idle"))
        .await
        .unwrap();

    let ids: Vec<String> = reopened
        .read_records()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.execution_id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}
