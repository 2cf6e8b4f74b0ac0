// Copyright (c) 2023 The mfc-attack Authors

//! The [Engine] orchestrates MIFARE Classic dictionary attacks.
//!
//! This handles [Event] inputs from a card session and returns [Output] responses,
//! with platform collaborators provided by a [Driver]. Owner-context [Signal]s
//! (raised via [Driver::notify] or by the presentation layer) are handled by
//! [Engine::on_signal], which performs phase transitions and completion.

use strum::{Display, EnumIter, EnumString};

use crate::{
    card::{CardData, KeyType},
    dict::{Dictionary, OpenMode},
};

mod error;
pub use error::Error;

mod event;
pub use event::Event;

mod output;
pub use output::{Command, Output};

mod progress;
pub use progress::{Backdoor, DataUpdate, KeyState, NestedPhase, PrngType, Progress};

mod model;
pub use model::{ProgressModel, HEADER_SYSTEM_DICT, HEADER_USER_DICT};

mod signal;
pub use signal::{Outcome, ReadResult, Signal};

mod paths;
pub use paths::{DictPaths, PATH_MAX};

/// Progress notifications are raised once per this many dictionary keys
pub const KEY_NOTIFY_INTERVAL: u32 = 10;

/// Attack phase
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, EnumString, Display, EnumIter)]
pub enum Phase {
    /// Iterating the user dictionary
    #[default]
    UserDict,
    /// Iterating the system dictionary
    SystemDict,
}

/// [`Driver`] trait provides platform collaborators for [`Engine`] instances
pub trait Driver {
    /// Open dictionary handle
    type Dict: Dictionary;

    /// Remove a file, succeeding if the file does not exist
    fn remove(&mut self, path: &str) -> Result<(), Error>;

    /// Copy a file, replacing any existing destination
    fn copy(&mut self, src: &str, dst: &str) -> Result<(), Error>;

    /// Check whether a dictionary exists
    fn dict_present(&self, path: &str) -> bool;

    /// Open a dictionary with the provided mode
    fn dict_open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Dict, Error>;

    /// Start a new card session
    fn session_start(&mut self) -> Result<(), Error>;

    /// Stop the active card session, if any
    fn session_stop(&mut self);

    /// Fetch card data from the active session
    fn session_data(&self) -> Option<CardData>;

    /// Fetch card data stored in the device record
    fn device_data(&self) -> CardData;

    /// Store card data in the device record
    fn set_device_data(&mut self, data: &CardData);

    /// Raise a signal to the engine owner
    fn notify(&mut self, signal: Signal);
}

impl<T: Driver> Driver for &mut T {
    type Dict = T::Dict;

    fn remove(&mut self, path: &str) -> Result<(), Error> {
        T::remove(self, path)
    }

    fn copy(&mut self, src: &str, dst: &str) -> Result<(), Error> {
        T::copy(self, src, dst)
    }

    fn dict_present(&self, path: &str) -> bool {
        T::dict_present(self, path)
    }

    fn dict_open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Dict, Error> {
        T::dict_open(self, path, mode)
    }

    fn session_start(&mut self) -> Result<(), Error> {
        T::session_start(self)
    }

    fn session_stop(&mut self) {
        T::session_stop(self)
    }

    fn session_data(&self) -> Option<CardData> {
        T::session_data(self)
    }

    fn device_data(&self) -> CardData {
        T::device_data(self)
    }

    fn set_device_data(&mut self, data: &CardData) {
        T::set_device_data(self, data)
    }

    fn notify(&mut self, signal: Signal) {
        T::notify(self, signal)
    }
}

/// [Engine] provides platform-independent orchestration of dictionary attacks
pub struct Engine<DRV: Driver> {
    phase: Phase,
    paths: DictPaths,

    dict: Option<DRV::Dict>,

    progress: Progress,
    keys: KeyState,
    model: ProgressModel,

    drv: DRV,
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance with the provided driver and dictionary paths
    pub fn new(drv: DRV, paths: DictPaths) -> Self {
        Self {
            phase: Phase::UserDict,
            paths,
            dict: None,
            progress: Progress::default(),
            keys: KeyState::default(),
            model: ProgressModel::new(),
            drv,
        }
    }

    /// Start an attack, entering the user dictionary phase (where available)
    /// and starting a card session
    pub fn start(&mut self) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::debug!("starting dictionary attack");

        self.phase = Phase::UserDict;
        self.prepare()?;

        self.model.set_card_state(true);

        if let Err(e) = self.drv.session_start() {
            self.release_dict();
            return Err(e);
        }

        Ok(())
    }

    /// Handle incoming card session events
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        match evt {
            Event::RequestKey => log::trace!("event: {:?}", evt),
            _ => log::debug!("event: {:?}", evt),
        }

        let r = match evt {
            Event::CardDetected => {
                self.progress.is_card_present = true;
                self.drv.notify(Signal::CardDetected);
                Output::None
            }
            Event::CardLost => {
                self.progress.is_card_present = false;
                self.drv.notify(Signal::CardLost);
                Output::None
            }
            Event::RequestMode => {
                let data = self.drv.device_data();
                self.load_keys(&data);

                self.drv.notify(Signal::DataUpdate);
                Output::Mode(data)
            }
            Event::RequestKey => {
                let dict = self.dict.as_mut().ok_or(Error::InvalidState)?;

                match dict.next_key() {
                    Some(k) => {
                        self.progress.dict_keys_current += 1;

                        // Throttle progress notifications
                        if self.progress.dict_keys_current % KEY_NOTIFY_INTERVAL == 0 {
                            self.drv.notify(Signal::DataUpdate);
                        }

                        Output::Key(k)
                    }
                    None => Output::NoKey,
                }
            }
            Event::NextSector { current_sector } => {
                self.rewind();
                self.progress.set_current_sector(*current_sector);

                self.drv.notify(Signal::DataUpdate);
                Output::None
            }
            Event::FoundKeyA { sector, .. } => {
                self.found_key(*sector, KeyType::A);
                Output::None
            }
            Event::FoundKeyB { sector, .. } => {
                self.found_key(*sector, KeyType::B);
                Output::None
            }
            Event::DataUpdate(u) => {
                self.progress.merge(u);

                self.drv.notify(Signal::DataUpdate);
                Output::None
            }
            Event::KeyAttackStart { current_sector } => {
                self.progress.key_attack_current_sector = *current_sector;
                self.progress.is_key_attack = true;

                self.drv.notify(Signal::DataUpdate);
                Output::None
            }
            Event::KeyAttackStop => {
                self.rewind();
                self.progress.is_key_attack = false;

                self.drv.notify(Signal::DataUpdate);
                Output::None
            }
            Event::Success => {
                // Persist recovered data so follow-on sessions resume from found keys
                if let Some(d) = self.drv.session_data() {
                    self.drv.set_device_data(&d);
                }

                self.drv.notify(Signal::AttackComplete);
                Output::Stop
            }
        };

        Ok(r)
    }

    /// Handle owner-context signals
    pub fn on_signal(&mut self, signal: Signal) -> Result<Outcome, Error> {
        #[cfg(feature = "log")]
        log::debug!("signal: {:?} (phase: {})", signal, self.phase);

        match signal {
            Signal::CardDetected => self.model.set_card_state(true),
            Signal::CardLost => self.model.set_card_state(false),
            Signal::DataUpdate => self.update_model(),
            Signal::AttackComplete => match self.phase {
                // User dictionary pass complete, continue with the system dictionary
                Phase::UserDict => {
                    self.advance()?;
                    return Ok(Outcome::Restarted);
                }
                Phase::SystemDict => return Ok(Outcome::Finished(self.read_result())),
            },
            Signal::Skip => {
                if let Some(d) = self.drv.session_data() {
                    self.drv.set_device_data(&d);
                }

                match (self.phase, self.progress.is_card_present) {
                    (Phase::UserDict, true) => {
                        self.advance()?;
                        return Ok(Outcome::Restarted);
                    }
                    _ => return Ok(Outcome::Finished(self.read_result())),
                }
            }
        }

        Ok(Outcome::None)
    }

    /// Tear down the attack, stopping any session, releasing the dictionary
    /// and resetting progress. Safe to call repeatedly.
    pub fn exit(&mut self) {
        #[cfg(feature = "log")]
        log::debug!("exit (phase: {})", self.phase);

        self.drv.session_stop();
        self.release_dict();

        self.model.reset();
        self.phase = Phase::UserDict;

        self.progress.reset();
        self.keys = KeyState::default();
    }

    /// Fetch the current attack phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Fetch current attack progress
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Fetch the presentation model
    pub fn model(&self) -> &ProgressModel {
        &self.model
    }

    /// Check whether a dictionary is open
    pub fn is_dict_open(&self) -> bool {
        self.dict.is_some()
    }

    /// Fetch the engine driver
    pub fn driver(&self) -> &DRV {
        &self.drv
    }

    /// Fetch the engine driver (mutable)
    pub fn driver_mut(&mut self) -> &mut DRV {
        &mut self.drv
    }

    /// Move from the user to the system dictionary phase, restarting the session
    fn advance(&mut self) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::info!("user dictionary pass complete, switching to system dictionary");

        // Session must be stopped before the dictionary is released,
        // and the dictionary released before working copies are restaged
        self.drv.session_stop();
        self.release_dict();

        self.phase = Phase::SystemDict;
        self.prepare()?;

        if let Err(e) = self.drv.session_start() {
            self.release_dict();
            return Err(e);
        }

        Ok(())
    }

    /// Phase entry: stage working copies, open the dictionary and reset dictionary progress
    fn prepare(&mut self) -> Result<(), Error> {
        self.release_dict();

        // Both phases depend on the system dictionary
        if !self.drv.dict_present(self.paths.system()) {
            #[cfg(feature = "log")]
            log::error!("system dictionary missing: {}", self.paths.system());

            return Err(Error::SystemDictMissing);
        }

        stage(&mut self.drv, self.paths.system(), self.paths.system_nested())?;

        if self.phase == Phase::UserDict {
            match self.open_user()? {
                Some(d) => {
                    self.dict = Some(d);
                    self.model.set_header(HEADER_USER_DICT);
                }
                None => {
                    #[cfg(feature = "log")]
                    log::info!("user dictionary unavailable, using system dictionary");

                    self.phase = Phase::SystemDict;
                }
            }
        }

        if self.phase == Phase::SystemDict {
            let d = self.drv.dict_open(self.paths.system(), OpenMode::MustExist)?;
            self.dict = Some(d);
            self.model.set_header(HEADER_SYSTEM_DICT);
        }

        let total = self.dict.as_ref().map(|d| d.total_keys()).unwrap_or(0);

        #[cfg(feature = "log")]
        log::debug!("entered {} with {} keys", self.phase, total);

        // Card size is known from the device record before any session event
        let card = self.drv.device_data();
        self.load_keys(&card);

        self.progress.dict_keys_total = total;
        self.progress.dict_keys_current = 0;
        self.model.set_total_dict_keys(total);
        self.update_model();

        Ok(())
    }

    /// Open the user dictionary, returning `None` where absent, unreadable or empty
    fn open_user(&mut self) -> Result<Option<DRV::Dict>, Error> {
        if !self.drv.dict_present(self.paths.user()) {
            return Ok(None);
        }

        stage(&mut self.drv, self.paths.user(), self.paths.user_nested())?;

        let d = match self
            .drv
            .dict_open(self.paths.user(), OpenMode::CreateIfAbsent)
        {
            Ok(d) => d,
            Err(_e) => {
                #[cfg(feature = "log")]
                log::warn!("failed to open user dictionary: {:?}", _e);

                return Ok(None);
            }
        };

        if d.total_keys() == 0 {
            d.release();
            return Ok(None);
        }

        Ok(Some(d))
    }

    /// Seed card size and key state from card data
    fn load_keys(&mut self, data: &CardData) {
        self.keys = KeyState::from_card(data);

        self.progress.sectors_total = self.keys.sectors();
        self.progress.sectors_read = self.keys.sectors_read();
        self.progress.keys_found = self.keys.keys_found();
    }

    /// Release the active dictionary, if any
    fn release_dict(&mut self) {
        if let Some(d) = self.dict.take() {
            d.release();
        }
    }

    /// Rewind the active dictionary and reset the key counter
    fn rewind(&mut self) {
        if let Some(d) = self.dict.as_mut() {
            d.rewind();
        }
        self.progress.dict_keys_current = 0;
    }

    /// Update key state for a found key, including keys known to the session
    fn found_key(&mut self, sector: u8, key_type: KeyType) {
        if let Some(d) = self.drv.session_data() {
            self.keys.merge(&KeyState::from_card(&d));
        }
        self.keys.set(sector, key_type);

        self.progress.sectors_read = self.keys.sectors_read();
        self.progress.keys_found = self.keys.keys_found();

        self.drv.notify(Signal::DataUpdate);
    }

    /// Project progress into the presentation model
    fn update_model(&mut self) {
        let p = &self.progress;
        let m = &mut self.model;

        if p.is_key_attack {
            m.set_key_attack(p.key_attack_current_sector);
            return;
        }

        m.reset_key_attack();
        m.set_sectors_total(p.sectors_total);
        m.set_sectors_read(p.sectors_read);
        m.set_keys_found(p.keys_found);
        m.set_current_dict_key(p.dict_keys_current);
        m.set_current_sector(p.current_sector);
        m.set_nested_phase(p.nested_phase);
        m.set_prng_type(p.prng_type);
        m.set_backdoor(p.backdoor);
        m.set_nested_target_key(p.nested_target_key);
        m.set_msb_count(p.msb_count);
    }

    /// Determine read confidence from the device record
    fn read_result(&self) -> ReadResult {
        match self.drv.device_data().is_card_read() {
            true => ReadResult::Full,
            false => ReadResult::Partial,
        }
    }
}

/// Stage a fresh working copy of a dictionary
fn stage<DRV: Driver>(drv: &mut DRV, src: &str, dst: &str) -> Result<(), Error> {
    drv.remove(dst)?;
    drv.copy(src, dst)
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::{collections::HashMap, string::String, vec, vec::Vec};

    use super::*;
    use crate::{
        card::{CardType, Key},
        dict::MemDict,
    };

    /// Recorded driver operations
    #[derive(Clone, PartialEq, Debug)]
    enum Op {
        Remove(String),
        Copy(String, String),
        Open(String, OpenMode),
        Release,
        Start,
        Stop,
    }

    /// Dictionary wrapper recording release
    struct TestDict {
        inner: MemDict,
        released: std::rc::Rc<std::cell::RefCell<Vec<Op>>>,
    }

    impl Dictionary for TestDict {
        fn total_keys(&self) -> u32 {
            self.inner.total_keys()
        }

        fn next_key(&mut self) -> Option<Key> {
            self.inner.next_key()
        }

        fn rewind(&mut self) {
            self.inner.rewind()
        }

        fn release(self) {
            self.released.borrow_mut().push(Op::Release);
        }
    }

    /// Driver implementation for test use
    #[derive(Default)]
    struct TestDriver {
        files: HashMap<String, Vec<Key>>,
        ops: std::rc::Rc<std::cell::RefCell<Vec<Op>>>,
        signals: Vec<Signal>,
        fail_copy: bool,
        session: Option<CardData>,
        record: CardData,
    }

    impl TestDriver {
        fn new(user: Option<&[Key]>, system: Option<&[Key]>) -> Self {
            let mut d = Self::default();
            if let Some(k) = user {
                d.files.insert("user".into(), k.to_vec());
            }
            if let Some(k) = system {
                d.files.insert("system".into(), k.to_vec());
            }
            d
        }

        fn ops(&self) -> Vec<Op> {
            self.ops.borrow().clone()
        }
    }

    impl Driver for TestDriver {
        type Dict = TestDict;

        fn remove(&mut self, path: &str) -> Result<(), Error> {
            self.ops.borrow_mut().push(Op::Remove(path.into()));
            self.files.remove(path);
            Ok(())
        }

        fn copy(&mut self, src: &str, dst: &str) -> Result<(), Error> {
            self.ops.borrow_mut().push(Op::Copy(src.into(), dst.into()));
            if self.fail_copy {
                return Err(Error::StagingFailed);
            }
            let k = self.files.get(src).cloned().ok_or(Error::StagingFailed)?;
            self.files.insert(dst.into(), k);
            Ok(())
        }

        fn dict_present(&self, path: &str) -> bool {
            self.files.contains_key(path)
        }

        fn dict_open(&mut self, path: &str, mode: OpenMode) -> Result<Self::Dict, Error> {
            self.ops.borrow_mut().push(Op::Open(path.into(), mode));
            let keys = match (self.files.get(path), mode) {
                (Some(k), _) => k.clone(),
                (None, OpenMode::CreateIfAbsent) => vec![],
                (None, OpenMode::MustExist) => return Err(Error::DictOpenFailed),
            };
            Ok(TestDict {
                inner: MemDict::new(&keys),
                released: self.ops.clone(),
            })
        }

        fn session_start(&mut self) -> Result<(), Error> {
            self.ops.borrow_mut().push(Op::Start);
            self.session = Some(self.record.clone());
            Ok(())
        }

        fn session_stop(&mut self) {
            self.ops.borrow_mut().push(Op::Stop);
            self.session = None;
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

    fn paths() -> DictPaths {
        DictPaths::new("user", "user_nested", "system", "system_nested").unwrap()
    }

    const K1: Key = Key([0x01; 6]);
    const K2: Key = Key([0x02; 6]);
    const K3: Key = Key([0x03; 6]);

    #[test]
    fn start_user_phase() {
        let drv = TestDriver::new(Some(&[K1, K2]), Some(&[K3]));
        let mut e = Engine::new(drv, paths());

        e.start().unwrap();

        assert_eq!(e.phase(), Phase::UserDict);
        assert_eq!(e.progress().dict_keys_total, 2);
        assert_eq!(e.model().header(), HEADER_USER_DICT);
        assert!(e.model().card_present());

        assert_eq!(
            e.driver().ops(),
            vec![
                Op::Remove("system_nested".into()),
                Op::Copy("system".into(), "system_nested".into()),
                Op::Remove("user_nested".into()),
                Op::Copy("user".into(), "user_nested".into()),
                Op::Open("user".into(), OpenMode::CreateIfAbsent),
                Op::Start,
            ]
        );
    }

    #[test]
    fn empty_user_dict_falls_through() {
        let drv = TestDriver::new(Some(&[]), Some(&[K3]));
        let mut e = Engine::new(drv, paths());

        e.start().unwrap();

        assert_eq!(e.phase(), Phase::SystemDict);
        assert_eq!(e.progress().dict_keys_total, 1);
        assert_eq!(e.model().header(), HEADER_SYSTEM_DICT);

        // Empty user dictionary is released before the system dictionary is opened
        let ops = e.driver().ops();
        let release = ops.iter().position(|o| *o == Op::Release).unwrap();
        let open = ops
            .iter()
            .position(|o| *o == Op::Open("system".into(), OpenMode::MustExist))
            .unwrap();
        assert!(release < open);
    }

    #[test]
    fn staging_failure_is_fatal() {
        let mut drv = TestDriver::new(Some(&[K1]), Some(&[K3]));
        drv.fail_copy = true;
        let mut e = Engine::new(drv, paths());

        assert_eq!(e.start(), Err(Error::StagingFailed));
        assert!(!e.is_dict_open());
        assert!(!e.driver().ops().contains(&Op::Start));
    }

    #[test]
    fn missing_system_dict_is_fatal() {
        let drv = TestDriver::new(Some(&[K1]), None);
        let mut e = Engine::new(drv, paths());

        assert_eq!(e.start(), Err(Error::SystemDictMissing));
        assert!(!e.is_dict_open());
        assert!(e.driver().ops().is_empty());
    }

    #[test]
    fn transition_ordering() {
        let drv = TestDriver::new(Some(&[K1]), Some(&[K2, K3]));
        let mut e = Engine::new(drv, paths());
        e.start().unwrap();
        e.driver().ops.borrow_mut().clear();

        let r = e.update(&Event::Success).unwrap();
        assert_eq!(r, Output::Stop);
        assert_eq!(r.command(), Command::Stop);
        assert_eq!(e.driver().signals.last(), Some(&Signal::AttackComplete));

        let r = e.on_signal(Signal::AttackComplete).unwrap();
        assert_eq!(r, Outcome::Restarted);
        assert_eq!(e.phase(), Phase::SystemDict);

        assert_eq!(
            e.driver().ops(),
            vec![
                Op::Stop,
                Op::Release,
                Op::Remove("system_nested".into()),
                Op::Copy("system".into(), "system_nested".into()),
                Op::Open("system".into(), OpenMode::MustExist),
                Op::Start,
            ]
        );
    }

    #[test]
    fn key_attack_suppresses_dict_progress() {
        let drv = TestDriver::new(None, Some(&[K1, K2, K3]));
        let mut e = Engine::new(drv, paths());
        e.start().unwrap();

        e.update(&Event::RequestKey).unwrap();
        e.update(&Event::KeyAttackStart { current_sector: 4 }).unwrap();
        e.on_signal(Signal::DataUpdate).unwrap();

        assert_eq!(e.model().key_attack(), Some(4));
        assert_eq!(e.model().dict_keys_current(), 0);

        e.update(&Event::KeyAttackStop).unwrap();
        e.on_signal(Signal::DataUpdate).unwrap();

        assert_eq!(e.model().key_attack(), None);
        assert_eq!(e.progress().dict_keys_current, 0);

        // Dictionary restarts from the first key
        assert_eq!(e.update(&Event::RequestKey).unwrap(), Output::Key(K1));
    }

    #[test]
    fn found_keys_update_counts() {
        let drv = TestDriver::new(None, Some(&[K1]));
        let mut e = Engine::new(drv, paths());
        e.driver_mut().record = CardData::new(CardType::Mini);
        e.start().unwrap();

        let r = e.update(&Event::RequestMode).unwrap();
        assert_eq!(r, Output::Mode(CardData::new(CardType::Mini)));
        assert_eq!(e.progress().sectors_total, 5);

        e.update(&Event::FoundKeyA { sector: 1, key: K1 }).unwrap();
        e.update(&Event::FoundKeyB { sector: 1, key: K1 }).unwrap();
        e.update(&Event::FoundKeyA { sector: 2, key: K1 }).unwrap();

        assert_eq!(e.progress().sectors_read, 2);
        assert_eq!(e.progress().keys_found, 3);

        // Sectors beyond the card are ignored
        for sector in 0..8 {
            e.update(&Event::FoundKeyA { sector, key: K1 }).unwrap();
        }
        assert_eq!(e.progress().sectors_read, 5);
        assert_eq!(e.progress().keys_found, 6);
    }

    #[test]
    fn card_size_known_on_start() {
        let drv = TestDriver::new(None, Some(&[K1]));
        let mut e = Engine::new(drv, paths());
        e.driver_mut().record = CardData::new(CardType::Mini);
        e.start().unwrap();

        assert_eq!(e.progress().sectors_total, 5);

        // Progress arriving ahead of the mode request is clamped
        e.update(&Event::DataUpdate(DataUpdate {
            sectors_read: 7,
            keys_found: 14,
            current_sector: 9,
            ..Default::default()
        }))
        .unwrap();

        assert_eq!(e.progress().sectors_read, 5);
        assert_eq!(e.progress().keys_found, 10);
        assert_eq!(e.progress().current_sector, 4);

        e.update(&Event::FoundKeyB { sector: 6, key: K1 }).unwrap();
        e.update(&Event::FoundKeyB { sector: 1, key: K1 }).unwrap();
        assert_eq!(e.progress().sectors_read, 1);
        assert_eq!(e.progress().keys_found, 1);
    }
}
