#![allow(unused)]

use std::collections::HashMap;

use log::debug;

use mfc_attack_core::{
    card::{CardData, CardType, Key, KeyType},
    dict::{MemDict, OpenMode},
    engine::{DictPaths, Driver, Engine, Error, Signal},
};

pub const USER: &str = "mf_classic_dict_user.nfc";
pub const USER_NESTED: &str = "mf_classic_dict_user_nested.nfc";
pub const SYSTEM: &str = "mf_classic_dict.nfc";
pub const SYSTEM_NESTED: &str = "mf_classic_dict_nested.nfc";

/// Build a list of distinct test keys
pub fn keys(n: usize, seed: u8) -> Vec<Key> {
    (0..n)
        .map(|i| {
            let mut k = [seed; 6];
            k[4..].copy_from_slice(&(i as u16).to_be_bytes());
            Key(k)
        })
        .collect()
}

/// In-memory driver with a virtual file store
#[derive(Default)]
pub struct TestDriver {
    pub files: HashMap<String, Vec<Key>>,
    pub signals: Vec<Signal>,
    pub sessions_started: usize,
    pub sessions_stopped: usize,
    pub session: Option<CardData>,
    pub record: CardData,
    pub fail_copy: bool,
}

impl TestDriver {
    pub fn new(user: Option<Vec<Key>>, system: Option<Vec<Key>>, card_type: CardType) -> Self {
        let mut files = HashMap::new();
        if let Some(k) = user {
            files.insert(USER.to_string(), k);
        }
        if let Some(k) = system {
            files.insert(SYSTEM.to_string(), k);
        }

        Self {
            files,
            record: CardData::new(card_type),
            ..Default::default()
        }
    }

    /// Count notifications for a given signal
    pub fn count(&self, s: Signal) -> usize {
        self.signals.iter().filter(|v| **v == s).count()
    }

    /// Check whether a session is running
    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    /// Record a key in the active session card data
    pub fn session_found(&mut self, sector: u8, key_type: KeyType, key: Key) {
        if let Some(d) = self.session.as_mut() {
            d.set_key(sector, key_type, key);
        }
    }
}

impl Driver for TestDriver {
    type Dict = MemDict;

    fn remove(&mut self, path: &str) -> Result<(), Error> {
        self.files.remove(path);
        Ok(())
    }

    fn copy(&mut self, src: &str, dst: &str) -> Result<(), Error> {
        if self.fail_copy {
            return Err(Error::StagingFailed);
        }
        let k = self.files.get(src).cloned().ok_or(Error::StagingFailed)?;
        self.files.insert(dst.to_string(), k);
        Ok(())
    }

    fn dict_present(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn dict_open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Dict, Error> {
        debug!("open {} ({})", path, mode);

        match (self.files.get(path), mode) {
            (Some(k), _) => Ok(MemDict::new(k)),
            (None, OpenMode::CreateIfAbsent) => Ok(MemDict::default()),
            (None, OpenMode::MustExist) => Err(Error::DictOpenFailed),
        }
    }

    fn session_start(&mut self) -> Result<(), Error> {
        self.sessions_started += 1;
        self.session = Some(self.record.clone());
        Ok(())
    }

    fn session_stop(&mut self) {
        if self.session.take().is_some() {
            self.sessions_stopped += 1;
        }
    }

    fn session_data(&self) -> Option<CardData> {
        self.session.clone()
    }

    fn device_data(&self) -> CardData {
        self.record.clone()
    }

    fn set_device_data(&mut self, data: &CardData) {
        self.record = data.clone();
    }

    fn notify(&mut self, signal: Signal) {
        self.signals.push(signal);
    }
}

/// Create an engine using the default dictionary file names
pub fn engine(drv: TestDriver) -> Engine<TestDriver> {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());

    let paths = DictPaths::new(USER, USER_NESTED, SYSTEM, SYSTEM_NESTED).unwrap();
    Engine::new(drv, paths)
}
