use std::{future, time::Duration};

use log::{debug, info};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{
    sampler::{LandmarkExtractor, VideoSource},
    session::Session,
};

/// Roughly one display refresh.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Drives `session` until it is cancelled or `video` runs out.
///
/// A single task multiplexes three wake-ups: the frame tick, the stabilization deadline
/// and the session's cancellation token. At most one detection cycle is in flight, and
/// the session is stopped before returning whatever ended the loop.
pub async fn run<E, V>(session: &mut Session<E>, video: &V)
where
    V: VideoSource,
    E: LandmarkExtractor<V::Frame>,
{
    let cancel = session.cancellation_token();
    let mut frames = time::interval(FRAME_INTERVAL);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("recognition loop started");
    loop {
        let deadline = session.deadline();

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("recognition loop cancelled");
                break;
            }

            _ = wait_for(deadline) => {
                session.on_timer(Instant::now());
            }

            _ = frames.tick() => {
                if video.ended() {
                    debug!("video source ended");
                    break;
                }
                // A late tick reports when it was due, not when it ran.
                session.on_frame(video, Instant::now());
            }
        }
    }

    session.stop();
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
