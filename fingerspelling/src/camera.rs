use std::{
    future::Future,
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::{debug, info};

use crate::error::{FingerspellErr, Result};

/// An open capture device. `stop` must release the hardware and tolerate repeated calls.
pub trait MediaStream {
    fn stop(&mut self);
}

/// Exclusive owner of the session's camera stream.
///
/// The slot is live from creation until `release`. Acquisitions still in flight hold a
/// clone of the liveness flag, so a stream that arrives after release is stopped instead
/// of being kept.
pub struct CameraSlot {
    stream: Option<Box<dyn MediaStream>>,
    live: Arc<AtomicBool>,
}

impl CameraSlot {
    pub fn new() -> Self {
        Self {
            stream: None,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The flag an in-flight acquisition has to check before handing its stream over.
    pub fn liveness(&self) -> Arc<AtomicBool> {
        self.live.clone()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Takes ownership of `stream`.
    ///
    /// # Returns
    /// `false` if the slot was already released, in which case the stream has been stopped.
    pub fn attach(&mut self, mut stream: Box<dyn MediaStream>) -> bool {
        if !self.is_live() {
            stream.stop();
            info!("camera arrived after teardown, stopped");
            return false;
        }

        if let Some(mut previous) = self.stream.replace(stream) {
            previous.stop();
            debug!("replaced camera stream");
        }

        info!("camera attached");
        true
    }

    /// Stops every track of the held stream. Calling it again does nothing.
    pub fn release(&mut self) {
        self.live.store(false, Ordering::Release);

        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("camera released");
        }
    }
}

impl Default for CameraSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CameraSlot {
    fn drop(&mut self) {
        self.release();
    }
}

/// Waits for a pending camera request.
///
/// # Args
/// * `live` - The liveness flag of the slot the stream is meant for.
/// * `open` - The platform request.
///
/// # Returns
/// The stream, or `None` if the slot was released while waiting. A late stream is
/// stopped before returning.
///
/// # Errors
/// `CameraAccess` if the request failed. The caller may retry.
pub async fn acquire<F>(live: Arc<AtomicBool>, open: F) -> Result<Option<Box<dyn MediaStream>>>
where
    F: Future<Output = io::Result<Box<dyn MediaStream>>>,
{
    let mut stream = open
        .await
        .map_err(|e| FingerspellErr::CameraAccess(e.to_string()))?;

    if !live.load(Ordering::Acquire) {
        stream.stop();
        info!("camera request resolved after teardown, stopped");
        return Ok(None);
    }

    Ok(Some(stream))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::oneshot;

    use super::*;

    struct FakeStream(Arc<AtomicUsize>);

    impl MediaStream for FakeStream {
        fn stop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fake() -> (Box<dyn MediaStream>, Arc<AtomicUsize>) {
        let stops = Arc::new(AtomicUsize::new(0));
        (Box::new(FakeStream(stops.clone())), stops)
    }

    #[test]
    fn release_is_idempotent() {
        let (stream, stops) = fake();
        let mut slot = CameraSlot::new();

        assert!(slot.attach(stream));
        slot.release();
        slot.release();
        drop(slot);

        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_attach_stops_the_stream() {
        let (stream, stops) = fake();
        let mut slot = CameraSlot::new();
        slot.release();

        assert!(!slot.attach(stream));
        assert!(!slot.has_stream());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attach_keeps_a_single_stream() {
        let (first, first_stops) = fake();
        let (second, second_stops) = fake();
        let mut slot = CameraSlot::new();

        slot.attach(first);
        slot.attach(second);

        assert_eq!(first_stops.load(Ordering::SeqCst), 1);
        assert_eq!(second_stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn teardown_during_acquisition_stops_the_late_stream() {
        let (stream, stops) = fake();
        let mut slot = CameraSlot::new();
        let (tx, rx) = oneshot::channel::<Box<dyn MediaStream>>();

        let pending = acquire(slot.liveness(), async move {
            rx.await.map_err(|e| io::Error::other(e))
        });
        let teardown = async {
            slot.release();
            let _ = tx.send(stream);
        };

        let (acquired, ()) = tokio::join!(pending, teardown);

        assert!(acquired.unwrap().is_none());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_request_is_recoverable() {
        let slot = CameraSlot::new();
        let err = acquire(slot.liveness(), async {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        })
        .await
        .err()
        .unwrap();

        assert!(matches!(err, FingerspellErr::CameraAccess(_)));
        assert!(!err.is_fatal());
    }
}
