// Copyright (c) 2023 The mfc-attack Authors

use std::{
    collections::VecDeque,
    fs, io,
    path::Path,
    sync::{Arc, Mutex},
};

use log::{debug, error, warn};
use tokio::{sync::mpsc, task::JoinHandle};

use mfc_attack_core::{
    card::CardData,
    dict::OpenMode,
    engine::{Driver, Error, Signal},
};

use crate::{
    session::{Done, Request, Session, SessionLink},
    FileDict,
};

/// Active card session
struct Active {
    id: u64,
    task: JoinHandle<()>,
    data: Arc<Mutex<Option<CardData>>>,
}

/// Host [Driver] implementation using the filesystem and tokio tasks
pub struct HostDriver {
    session: Arc<dyn Session>,
    tx: mpsc::Sender<Request>,
    done: mpsc::UnboundedSender<Done>,

    next_id: u64,
    active: Option<Active>,

    record: CardData,
    signals: VecDeque<Signal>,
}

impl HostDriver {
    /// Create a new host driver with the provided session, request and
    /// completion channels and device record
    pub fn new(
        session: Arc<dyn Session>,
        tx: mpsc::Sender<Request>,
        done: mpsc::UnboundedSender<Done>,
        record: CardData,
    ) -> Self {
        Self {
            session,
            tx,
            done,
            next_id: 0,
            active: None,
            record,
            signals: VecDeque::new(),
        }
    }

    /// Identifier of the active session, if any
    pub fn session_id(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.id)
    }

    /// Fetch the next pending signal
    pub fn take_signal(&mut self) -> Option<Signal> {
        self.signals.pop_front()
    }

    /// Discard pending signals
    pub fn clear_signals(&mut self) {
        self.signals.clear();
    }
}

impl Driver for HostDriver {
    type Dict = FileDict;

    fn remove(&mut self, path: &str) -> Result<(), Error> {
        match fs::remove_file(path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to remove '{}': {}", path, e);
                Err(Error::StagingFailed)
            }
        }
    }

    fn copy(&mut self, src: &str, dst: &str) -> Result<(), Error> {
        debug!("Staging '{}' to '{}'", src, dst);

        match fs::copy(src, dst) {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to copy '{}' to '{}': {}", src, dst, e);
                Err(Error::StagingFailed)
            }
        }
    }

    fn dict_present(&self, path: &str) -> bool {
        FileDict::is_present(Path::new(path))
    }

    fn dict_open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Dict, Error> {
        FileDict::open(path, mode).map_err(|e| {
            warn!("Failed to open dictionary '{}': {}", path, e);
            Error::DictOpenFailed
        })
    }

    fn session_start(&mut self) -> Result<(), Error> {
        let rt = tokio::runtime::Handle::try_current().map_err(|e| {
            error!("No runtime available for card session: {}", e);
            Error::SessionStartFailed
        })?;

        // Replace any existing session
        self.session_stop();

        self.next_id += 1;
        let id = self.next_id;

        let data = Arc::new(Mutex::new(None));
        let link = SessionLink::new(id, self.tx.clone(), data.clone());
        let session = self.session.clone();
        let done = self.done.clone();

        debug!("Starting card session {}", id);

        // Aborted sessions never report completion
        let task = rt.spawn(async move {
            let r = session.run(link).await;
            match &r {
                Ok(_) => debug!("Card session {} complete", id),
                Err(e) => warn!("Card session {} failed: {}", id, e),
            }
            let _ = done.send((id, r));
        });

        self.active = Some(Active { id, task, data });

        Ok(())
    }

    fn session_stop(&mut self) {
        if let Some(a) = self.active.take() {
            debug!("Stopping card session {}", a.id);
            a.task.abort();
        }
    }

    fn session_data(&self) -> Option<CardData> {
        let a = self.active.as_ref()?;
        let d = a.data.lock().ok()?;
        d.clone()
    }

    fn device_data(&self) -> CardData {
        self.record.clone()
    }

    fn set_device_data(&mut self, data: &CardData) {
        self.record = data.clone();
    }

    fn notify(&mut self, signal: Signal) {
        self.signals.push_back(signal);
    }
}
