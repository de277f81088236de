//! Byte-level progress reporting for layer downloads.

use tokio::sync::mpsc;

/// Accumulates bytes written and reports the fraction of a planned total.
///
/// Every [`add`](Self::add) sends `written / total` on the sink. Sending
/// waits for the receiver, so a slow consumer slows the download down.
pub struct WriteCounter<'a> {
    total: i64,
    written: i64,
    sink: &'a mpsc::Sender<f32>,
}

impl<'a> WriteCounter<'a> {
    pub fn new(total: i64, sink: &'a mpsc::Sender<f32>) -> Self {
        Self {
            total,
            written: 0,
            sink,
        }
    }

    /// Records `n` more bytes and reports the new fraction.
    pub async fn add(&mut self, n: usize) {
        self.written += n as i64;
        // A dropped receiver only means nobody is watching.
        let _ = self.sink.send(self.fraction()).await;
    }

    /// Bytes recorded so far.
    pub fn written(&self) -> i64 {
        self.written
    }

    /// Progress in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.total <= 0 {
            return 1.0;
        }
        (self.written as f64 / self.total as f64).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_each_write() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut counter = WriteCounter::new(1000, &tx);

        counter.add(250).await;
        counter.add(250).await;
        counter.add(500).await;

        assert_eq!(rx.recv().await, Some(0.25));
        assert_eq!(rx.recv().await, Some(0.5));
        assert_eq!(rx.recv().await, Some(1.0));
        assert_eq!(counter.written(), 1000);
    }

    #[tokio::test]
    async fn clamps_when_more_than_declared_arrives() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut counter = WriteCounter::new(10, &tx);
        counter.add(15).await;
        assert_eq!(rx.recv().await, Some(1.0));
    }

    #[tokio::test]
    async fn zero_total_is_complete() {
        let (tx, _rx) = mpsc::channel(1);
        let counter = WriteCounter::new(0, &tx);
        assert_eq!(counter.fraction(), 1.0);
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_block() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut counter = WriteCounter::new(100, &tx);
        counter.add(10).await;
        counter.add(10).await;
        assert_eq!(counter.written(), 20);
    }
}
