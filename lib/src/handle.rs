// Copyright (c) 2023 The mfc-attack Authors

use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use mfc_attack_core::{
    card::CardData,
    engine::{Driver, Engine, Outcome, ProgressModel, ReadResult, Signal},
};

use crate::{
    session::{Done, Request},
    DictConfig, Error, HostDriver, Session};

/// Request channel depth
const REQUEST_QUEUE: usize = 16;

/// Progress callback, invoked after card and progress signals
pub type ProgressFn = Box<dyn FnMut(&ProgressModel) + Send>;

/// Attack completion report
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Report {
    /// Read confidence
    pub result: ReadResult,
    /// Sectors with at least one known key
    pub sectors_read: u8,
    /// Known keys
    pub keys_found: u8,
    /// Recovered card data
    pub card: CardData,
}

/// Handle for skipping the current attack phase
#[derive(Clone, Debug)]
pub struct SkipHandle(mpsc::UnboundedSender<()>);

impl SkipHandle {
    /// Request a skip of the current attack phase
    pub fn skip(&self) {
        if self.0.send(()).is_err() {
            debug!("Skip requested with no attack running");
        }
    }
}

/// Attack handle, owns an [Engine] for the lifetime of an attack
///
/// The engine is only touched from [AttackHandle::run], which serialises
/// session requests and skip inputs. Dropping the handle tears the attack down.
pub struct AttackHandle {
    engine: Engine<HostDriver>,
    rx: mpsc::Receiver<Request>,
    done_rx: mpsc::UnboundedReceiver<Done>,

    skip_tx: mpsc::UnboundedSender<()>,
    skip_rx: mpsc::UnboundedReceiver<()>,

    on_progress: Option<ProgressFn>,
}

impl AttackHandle {
    /// Create a new attack handle using the provided dictionaries, card session
    /// and device record
    pub fn new(config: &DictConfig, session: impl Session, record: CardData) -> Result<Self, Error> {
        let paths = config.paths()?;

        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (skip_tx, skip_rx) = mpsc::unbounded_channel();

        let drv = HostDriver::new(Arc::new(session), tx, done_tx, record);

        Ok(Self {
            engine: Engine::new(drv, paths),
            rx,
            done_rx,
            skip_tx,
            skip_rx,
            on_progress: None,
        })
    }

    /// Set a progress callback
    pub fn with_progress(mut self, f: impl FnMut(&ProgressModel) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Fetch a handle for skipping attack phases
    pub fn skip_handle(&self) -> SkipHandle {
        SkipHandle(self.skip_tx.clone())
    }

    /// Fetch the current progress model
    pub fn model(&self) -> &ProgressModel {
        self.engine.model()
    }

    /// Run the attack to completion
    pub async fn run(mut self) -> Result<Report, Error> {
        info!("Starting dictionary attack");

        self.engine.start()?;
        self.progress();

        loop {
            let r = tokio::select! {
                req = self.rx.recv() => match req {
                    Some(req) => self.request(req)?,
                    None => return Err(Error::SessionClosed),
                },
                Some((id, r)) = self.done_rx.recv() => self.session_done(id, r)?,
                Some(_) = self.skip_rx.recv() => {
                    info!("Skipping {}", self.engine.phase());
                    self.signal(Signal::Skip)?
                },
            };

            if let Some(r) = r {
                return Ok(self.finish(r));
            }
        }
    }

    /// Handle a session request
    fn request(&mut self, req: Request) -> Result<Option<ReadResult>, Error> {
        // Drop requests from sessions that have been torn down
        if Some(req.session) != self.engine.driver().session_id() {
            debug!(
                "Dropping {} from stale session {}",
                req.event, req.session
            );
            return Ok(None);
        }

        let out = self.engine.update(&req.event)?;

        if req.resp.send(out).is_err() {
            warn!("Session {} closed before response", req.session);
        }

        // Process signals raised while handling the event
        while let Some(s) = self.engine.driver_mut().take_signal() {
            if let Some(r) = self.signal(s)? {
                return Ok(Some(r));
            }
        }

        Ok(None)
    }

    /// Handle completion of a card session
    ///
    /// Sessions replaced by a phase transition are ignored. The current session
    /// ending without [Event::Success][mfc_attack_core::engine::Event::Success]
    /// leaves nothing to drive the attack, so this fails with the session error
    /// or [Error::SessionClosed].
    fn session_done(
        &mut self,
        id: u64,
        r: Result<(), Error>,
    ) -> Result<Option<ReadResult>, Error> {
        if Some(id) != self.engine.driver().session_id() {
            debug!("Session {} finished after replacement", id);
            return Ok(None);
        }

        match r {
            Ok(_) => {
                warn!("Session {} ended before completing the attack", id);
                Err(Error::SessionClosed)
            }
            Err(e) => {
                warn!("Session {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Handle an owner-context signal
    fn signal(&mut self, s: Signal) -> Result<Option<ReadResult>, Error> {
        match self.engine.on_signal(s)? {
            Outcome::Finished(r) => return Ok(Some(r)),
            Outcome::Restarted => {
                info!("Restarted with {}", self.engine.phase());
                self.engine.driver_mut().clear_signals();
            }
            Outcome::None => (),
        }

        match s {
            Signal::CardDetected | Signal::CardLost | Signal::DataUpdate => self.progress(),
            _ => (),
        }

        Ok(None)
    }

    fn progress(&mut self) {
        if let Some(f) = self.on_progress.as_mut() {
            f(self.engine.model());
        }
    }

    /// Build the completion report and tear down the engine
    fn finish(&mut self, result: ReadResult) -> Report {
        let card = self.engine.driver().device_data();
        let (sectors_read, keys_found) = card.read_sectors_and_keys();

        info!(
            "Attack complete ({}): {} sectors, {} keys",
            result, sectors_read, keys_found
        );

        self.engine.exit();

        Report {
            result,
            sectors_read,
            keys_found,
            card,
        }
    }
}

impl Drop for AttackHandle {
    fn drop(&mut self) {
        self.engine.exit();
    }
}
