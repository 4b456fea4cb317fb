use std::time::Duration;

use tokio::sync::mpsc;

use crate::cli::interrupts::Interrupts;

#[tokio::test]
async fn press_before_waiting_is_not_lost() {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut interrupts = Interrupts::from_receiver(rx);
    tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(1), interrupts.next())
        .await
        .expect("queued press should be seen");
}

#[tokio::test]
async fn each_press_is_seen_once() {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut interrupts = Interrupts::from_receiver(rx);
    tx.send(()).unwrap();

    interrupts.next().await;
    let second = tokio::time::timeout(Duration::from_millis(50), interrupts.next()).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn gone_listener_never_interrupts() {
    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let mut interrupts = Interrupts::from_receiver(rx);
    drop(tx);

    let res = tokio::time::timeout(Duration::from_millis(50), interrupts.next()).await;
    assert!(res.is_err());
}
