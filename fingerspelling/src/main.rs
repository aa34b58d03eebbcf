use std::{env, path::PathBuf};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use tokio::{signal, time::Instant};

use fingerspelling::{
    classifier::{Classifier, ModelPaths},
    config::RecognizerConfig,
    driver,
    replay::{RecordedExtractor, ReplaySource},
    session::Session,
};

fn var(name: &str) -> Result<PathBuf> {
    env::var(name)
        .map(PathBuf::from)
        .with_context(|| format!("{name} is not set"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let model_dir = var("MODEL_DIR")?;
    let capture = var("CAPTURE")?;

    let config = match env::var("CONFIG") {
        Ok(path) => RecognizerConfig::from_file(&PathBuf::from(path))?,
        Err(_) => RecognizerConfig::default(),
    };

    let auto_mode = match env::var("MODE").as_deref() {
        Ok("auto") | Err(_) => true,
        Ok("manual") => false,
        Ok(other) => bail!("MODE must be auto or manual, got {other:?}"),
    };

    let classifier = Classifier::load(&ModelPaths::in_dir(&model_dir))
        .with_context(|| format!("loading model from {}", model_dir.display()))?;

    let video = ReplaySource::from_file(&capture)
        .with_context(|| format!("reading capture {}", capture.display()))?;
    info!("replaying {} frames from {}", video.len(), capture.display());

    let mut session = Session::new(config, RecordedExtractor, Instant::now());
    session.set_model(Box::new(classifier));
    session.set_auto_mode(auto_mode);

    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("received SIGINT");
                cancel.cancel();
            }
            Err(e) => warn!("cannot listen for SIGINT: {e}"),
        }
    });

    driver::run(&mut session, &video).await;

    println!("{}", session.text());
    Ok(())
}
