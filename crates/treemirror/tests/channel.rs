//! Capture on one task, mirror on another, connected by a channel.

use std::time::Duration;

use treemirror::sync::{channel, replay, MessageSource};
use treemirror::{CaptureConfig, MirrorMessage, TreeMirror, TreeMirrorClient};
use treemirror_testkit::{init_tracing, SampleDocument};

#[tokio::test]
async fn mirror_task_converges_with_source() {
    init_tracing();
    let mut doc = SampleDocument::new().unwrap();
    let root = doc.root();
    let (mut sink, mut source) = channel();

    let mirror_task = tokio::spawn(async move {
        let mut mirror = TreeMirror::default();
        let report = replay(&mut source, &mut mirror).await.unwrap();
        (mirror, report)
    });

    let mut client =
        TreeMirrorClient::connect(&mut doc.tree, root, CaptureConfig::default(), &mut sink)
            .unwrap();

    doc.push_item("three").unwrap();
    client.flush(&mut doc.tree, &mut sink);

    doc.tree.append_child(doc.head, doc.list).unwrap();
    doc.tree.set_character_data(doc.title_text, "Moved").unwrap();
    client.flush(&mut doc.tree, &mut sink);

    doc.tree.detach(doc.comment).unwrap();
    client.flush(&mut doc.tree, &mut sink);

    client.disconnect(&mut doc.tree);
    drop(sink);

    let (mirror, report) = mirror_task.await.unwrap();
    assert_eq!(report.messages, 4);
    assert!(report.is_clean());
    assert!(
        treemirror::verify_convergence(&doc.tree, root, mirror.tree(), mirror.root())
            .is_converged()
    );
}

#[tokio::test]
async fn suppressed_batches_send_nothing() {
    let mut doc = SampleDocument::new().unwrap();
    let root = doc.root();
    let (mut sink, mut source) = channel();

    let mut client =
        TreeMirrorClient::connect(&mut doc.tree, root, CaptureConfig::default(), &mut sink)
            .unwrap();
    assert!(matches!(
        source.recv().await,
        Some(MirrorMessage::Initialize(_))
    ));

    let item = doc.push_item("gone").unwrap();
    doc.tree.detach(item).unwrap();
    assert!(client.flush(&mut doc.tree, &mut sink).is_none());

    let next = source.recv_timeout(Duration::from_millis(20)).await.unwrap();
    assert!(next.is_none());
}
