//! End-to-end sync rounds between Reconcilers over in-memory and TCP links.

use reconcile::store::MemoryLog;
use reconcile::sync::{Communicant, FullSync, TcpTransport, Transport};
use reconcile::{Reconciler, SyncStrategy};
use reconcile_testkit::{
    elements, faulty_comm, full_sync_reconciler, init_tracing, linked_pair, random_elements,
    sorted_texts, sync_rounds,
};

#[tokio::test]
async fn pairwise_round_trip_reaches_union() -> anyhow::Result<()> {
    init_tracing();
    let (a, b) = linked_pair();
    let mut client = full_sync_reconciler(a, &["a1", "a2"])?;
    let mut server = full_sync_reconciler(b, &["b1"])?;

    let (client_ok, server_ok) = sync_rounds(&mut client, &mut server, 0).await?;

    assert!(client_ok);
    assert!(server_ok);
    assert_eq!(sorted_texts(&client), vec!["a1", "a2", "b1"]);
    assert_eq!(sorted_texts(&server), vec!["a1", "a2", "b1"]);
    assert_eq!(client.strategy(0).unwrap().num_elem(), 3);
    assert_eq!(server.strategy(0).unwrap().num_elem(), 3);
    Ok(())
}

#[tokio::test]
async fn second_round_moves_nothing_new() -> anyhow::Result<()> {
    init_tracing();
    let (a, b) = linked_pair();
    let mut client = full_sync_reconciler(a, &["a1"])?;
    let mut server = full_sync_reconciler(b, &["b1"])?;

    sync_rounds(&mut client, &mut server, 0).await?;
    sync_rounds(&mut client, &mut server, 0).await?;

    assert_eq!(sorted_texts(&client), vec!["a1", "b1"]);
    assert_eq!(sorted_texts(&server), vec!["a1", "b1"]);
    Ok(())
}

#[tokio::test]
async fn failing_peer_does_not_stop_the_round() -> anyhow::Result<()> {
    init_tracing();
    let (c1, s1) = linked_pair();
    let (c3, s3) = linked_pair();

    let mut client = Reconciler::builder()
        .comm(c1)
        .comm(faulty_comm("peer-2"))
        .comm(c3)
        .strategy(FullSync::new())
        .elements(elements(&["mine"]))
        .build()?;
    let mut server1 = full_sync_reconciler(s1, &["first"])?;
    let mut server3 = full_sync_reconciler(s3, &["third"])?;

    let (client_ok, ok1, ok3) = tokio::join!(
        client.start_sync(0),
        server1.listen_sync(0),
        server3.listen_sync(0)
    );

    assert!(!client_ok?);
    assert!(ok1?);
    assert!(ok3?);

    assert_eq!(sorted_texts(&client), vec!["first", "mine", "third"]);
    assert_eq!(sorted_texts(&server1), vec!["first", "mine"]);
    // The third peer is contacted after the first one's elements were merged.
    assert_eq!(sorted_texts(&server3), vec!["first", "mine", "third"]);
    Ok(())
}

#[tokio::test]
async fn counters_cover_only_the_last_attempt() -> anyhow::Result<()> {
    init_tracing();
    let (a, b) = linked_pair();
    let mut client = full_sync_reconciler(a, &["a1", "a2", "a3"])?;
    let mut server = full_sync_reconciler(b, &["b1"])?;

    sync_rounds(&mut client, &mut server, 0).await?;
    let first = client.xmit_bytes(0)?;
    sync_rounds(&mut client, &mut server, 0).await?;
    let second = client.xmit_bytes(0)?;

    // The client sends its whole list every time and now holds one more element.
    assert!(second > first);
    let comm = client.comm(0).unwrap();
    assert_eq!(comm.total_xmit_bytes(), first + second);

    let stats = client.stats(0).unwrap();
    assert_eq!(stats.xmit_bytes, second);
    assert_eq!(stats.recv_bytes, client.recv_bytes(0)?);
    assert_eq!(client.xmit_bytes(0)?, server.recv_bytes(0)?);

    assert!(client.sync_time(0)? < 60.0);
    Ok(())
}

#[tokio::test]
async fn multiset_rounds_leave_the_store_alone() -> anyhow::Result<()> {
    init_tracing();
    let (a, b) = linked_pair();
    let log = MemoryLog::new();
    let mut client = Reconciler::builder()
        .comm(a)
        .strategy(FullSync::multiset())
        .log(log.clone())
        .elements(elements(&["x", "x"]))
        .build()?;
    let mut server = Reconciler::builder()
        .comm(b)
        .strategy(FullSync::multiset())
        .elements(elements(&["x", "y"]))
        .build()?;

    for _ in 0..3 {
        let (client_ok, server_ok) = sync_rounds(&mut client, &mut server, 0).await?;
        assert!(client_ok && server_ok);

        assert_eq!(sorted_texts(&client), vec!["x", "x"]);
        assert_eq!(sorted_texts(&server), vec!["x", "y"]);
        assert_eq!(client.strategy(0).unwrap().num_elem(), 2);
        assert_eq!(server.strategy(0).unwrap().num_elem(), 2);
        assert_eq!(log.lines().len(), 2);
    }
    Ok(())
}

#[tokio::test]
async fn rounds_are_deterministic() -> anyhow::Result<()> {
    init_tracing();

    async fn run() -> anyhow::Result<(Vec<String>, Vec<String>)> {
        let (a, b) = linked_pair();
        let mut client = full_sync_reconciler(a, &["p", "q", "shared"])?;
        let mut server = full_sync_reconciler(b, &["shared", "r", "s"])?;
        sync_rounds(&mut client, &mut server, 0).await?;

        let order = |r: &Reconciler| -> Vec<String> {
            r.dump_elements().iter().map(|e| e.as_str().to_string()).collect()
        };
        Ok((order(&client), order(&server)))
    }

    let first = run().await?;
    let second = run().await?;
    assert_eq!(first, second);
    assert_eq!(first.0, vec!["p", "q", "shared", "r", "s"]);
    Ok(())
}

#[tokio::test]
async fn port_is_reported_only_for_listeners() -> anyhow::Result<()> {
    init_tracing();
    let listener = TcpTransport::listen("127.0.0.1:0").await?;
    let port = listener.listen_port().expect("bound port");
    let dialer = TcpTransport::connect(("127.0.0.1", port)).await?;

    let mut server = full_sync_reconciler(Communicant::new(listener), &["from-server"])?;
    let mut client = full_sync_reconciler(Communicant::new(dialer), &["from-client"])?;

    assert_eq!(server.port(0), Some(port));
    assert_eq!(client.port(0), None);
    assert_eq!(client.port(5), None);

    let (client_ok, server_ok) = sync_rounds(&mut client, &mut server, 0).await?;
    assert!(client_ok && server_ok);
    assert_eq!(sorted_texts(&client), vec!["from-client", "from-server"]);
    assert_eq!(sorted_texts(&server), vec!["from-client", "from-server"]);
    Ok(())
}

#[tokio::test]
async fn large_random_collections_converge_over_tcp() -> anyhow::Result<()> {
    init_tracing();
    let shared = random_elements(100, 16);
    let only_client = random_elements(300, 16);
    let only_server = random_elements(200, 16);

    let listener = TcpTransport::listen("127.0.0.1:0").await?;
    let port = listener.listen_port().expect("bound port");
    let dialer = TcpTransport::connect(("127.0.0.1", port)).await?;

    let mut client = Reconciler::builder()
        .comm(Communicant::new(dialer))
        .strategy(FullSync::new())
        .elements(shared.iter().chain(&only_client).cloned())
        .build()?;
    let mut server = Reconciler::builder()
        .comm(Communicant::new(listener))
        .strategy(FullSync::new())
        .elements(shared.iter().chain(&only_server).cloned())
        .build()?;

    let (client_ok, server_ok) = sync_rounds(&mut client, &mut server, 0).await?;
    assert!(client_ok && server_ok);

    assert_eq!(client.num_elements(), 600);
    assert_eq!(sorted_texts(&client), sorted_texts(&server));
    assert_eq!(server.strategy(0).unwrap().num_elem(), 600);
    Ok(())
}
