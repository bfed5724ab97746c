// reporter.rs - Periodic alive-cell reports, independent of turn cadence

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::distributor::Snapshot;
use crate::event::Event;

/// Emits `AliveCellsCount` every `period` until `cancel` fires.
///
/// Each report is a point-in-time read of the latest published snapshot, so
/// the count always belongs to the turn it is reported with.
pub async fn reporter(
    period: Duration,
    progress: watch::Receiver<Snapshot>,
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let (turn, count) = {
                    let snapshot = progress.borrow();
                    (snapshot.turn, snapshot.alive)
                };
                if events.send(Event::AliveCellsCount { turn, count }).is_err() {
                    break;
                }
            }
        }
    }
    debug!("reporter stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::grid::Grid;

    fn snapshot(turn: usize, alive: usize) -> Snapshot {
        Snapshot {
            turn,
            alive,
            world: Arc::new(Grid::new(4, 4)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_on_the_interval() {
        let (progress, rx) = watch::channel(snapshot(0, 5));
        let (events, mut received) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(reporter(
            Duration::from_secs(2),
            rx,
            events,
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(3)).await;
        progress.send_replace(snapshot(7, 12));
        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();
        task.await.unwrap();

        let mut reports = Vec::new();
        while let Some(event) = received.recv().await {
            reports.push(event);
        }
        assert_eq!(
            reports,
            vec![
                Event::AliveCellsCount { turn: 0, count: 5 },
                Event::AliveCellsCount { turn: 7, count: 12 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_cancelled_before_first_report() {
        let (_progress, rx) = watch::channel(snapshot(0, 0));
        let (events, mut received) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();
        reporter(Duration::from_secs(2), rx, events, cancel).await;
        assert!(received.recv().await.is_none());
    }
}
