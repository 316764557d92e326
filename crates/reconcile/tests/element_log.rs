//! File-backed Reconcilers: one log line per accepted element, replay on open.

use std::fs;

use reconcile::sync::FullSync;
use reconcile::{Element, ReconcileError, Reconciler, SyncStrategy};
use reconcile_testkit::{elements, init_tracing, linked_pair, sorted_texts, sync_rounds};
use tempfile::tempdir;

fn log_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[test]
fn each_add_appends_one_line() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("elements.log");

    let mut reconciler = Reconciler::from_file(
        Vec::new(),
        vec![Box::new(FullSync::new()) as Box<dyn SyncStrategy>],
        &path,
    )?;
    assert!(path.exists());
    assert!(reconciler.is_logged());

    reconciler.add_elem(Element::new("alpha"))?;
    reconciler.add_value(&serde_json::json!({ "id": 7 }))?;

    assert_eq!(log_lines(&path), vec!["\"alpha\"", "\"{\\\"id\\\":7}\""]);
    Ok(())
}

#[test]
fn reopen_replays_without_rewriting() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("elements.log");

    {
        let mut reconciler = Reconciler::builder()
            .strategy(FullSync::new())
            .file(&path)
            .build()?;
        reconciler.add_elem(Element::new("one"))?;
        reconciler.add_elem(Element::new("two\nlines"))?;
    }

    let reopened = Reconciler::builder()
        .strategy(FullSync::new())
        .file(&path)
        .build()?;

    let texts: Vec<_> = reopened.dump_elements().iter().map(|e| e.as_str()).collect();
    assert_eq!(texts, vec!["one", "two\nlines"]);
    assert_eq!(reopened.strategy(0).unwrap().num_elem(), 2);
    assert_eq!(log_lines(&path).len(), 2);
    Ok(())
}

#[test]
fn malformed_log_fails_construction() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("elements.log");
    fs::write(&path, "\"fine\"\nnot json\n")?;

    let err = Reconciler::from_file(Vec::new(), Vec::new(), &path).unwrap_err();
    assert!(matches!(err, ReconcileError::Construction(_)));
    Ok(())
}

#[test]
fn removal_is_unimplemented_for_logs() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("elements.log");

    let mut reconciler = Reconciler::builder()
        .file(&path)
        .elements(elements(&["keep"]))
        .build()?;

    let err = reconciler.del_elem(&Element::new("keep")).unwrap_err();
    assert!(matches!(err, ReconcileError::Unimplemented(_)));
    assert_eq!(reconciler.num_elements(), 1);
    assert_eq!(log_lines(&path), vec!["\"keep\""]);
    Ok(())
}

#[tokio::test]
async fn merged_elements_are_logged() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("client.log");
    let (a, b) = linked_pair();

    let mut client = Reconciler::builder()
        .comm(a)
        .strategy(FullSync::new())
        .file(&path)
        .elements(elements(&["local"]))
        .build()?;
    let mut server = Reconciler::builder()
        .comm(b)
        .strategy(FullSync::new())
        .elements(elements(&["remote"]))
        .build()?;

    let (client_ok, server_ok) = sync_rounds(&mut client, &mut server, 0).await?;
    assert!(client_ok && server_ok);

    assert_eq!(sorted_texts(&client), vec!["local", "remote"]);
    assert_eq!(log_lines(&path), vec!["\"local\"", "\"remote\""]);
    Ok(())
}
