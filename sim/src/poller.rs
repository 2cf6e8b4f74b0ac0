// Copyright (c) 2023 The mfc-attack Authors

//! Simulated dictionary attack session against a [VirtualCard]

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, info, warn};

use mfc_attack::{
    engine::{Command, DataUpdate, Event, NestedPhase, Output},
    Error, Session, SessionLink,
};
use mfc_attack_core::card::{CardData, Key, KeyType};

use crate::VirtualCard;

/// Poller simulation options
#[derive(Clone, PartialEq, Debug, Default, clap::Args)]
pub struct PollerOptions {
    /// Delay per key attempt (milliseconds)
    #[clap(long, default_value = "0")]
    pub key_delay_ms: u64,

    /// Remove the card from the field after this many key attempts (once)
    #[clap(long)]
    pub lost_after: Option<u32>,

    /// Time the card stays out of the field (milliseconds)
    #[clap(long, default_value = "100")]
    pub lost_for_ms: u64,
}

/// Virtual card poller, running dictionary attack sessions against a [VirtualCard]
pub struct VirtualPoller {
    card: VirtualCard,
    opts: PollerOptions,
    lost: AtomicBool,
}

impl VirtualPoller {
    /// Create a new poller for the provided card
    pub fn new(card: VirtualCard, opts: PollerOptions) -> Self {
        Self {
            card,
            opts,
            lost: AtomicBool::new(false),
        }
    }

    /// Report bulk progress
    async fn data_update(
        &self,
        link: &SessionLink,
        data: &CardData,
        sector: u8,
    ) -> Result<(), Error> {
        let (sectors_read, keys_found) = data.read_sectors_and_keys();

        link.send(Event::DataUpdate(DataUpdate {
            sectors_read,
            keys_found,
            current_sector: sector,
            nested_phase: NestedPhase::None,
            prng_type: self.card.prng,
            backdoor: self.card.backdoor,
            ..Default::default()
        }))
        .await?;

        Ok(())
    }

    /// Try a key against remaining sectors, returning `false` if the session should stop
    async fn key_attack(
        &self,
        link: &SessionLink,
        data: &mut CardData,
        sector: u8,
        key: Key,
    ) -> Result<bool, Error> {
        if link.send(Event::KeyAttackStart { current_sector: sector }).await? == Output::Stop {
            return Ok(false);
        }

        for s in sector + 1..self.card.total_sectors() {
            for t in [KeyType::A, KeyType::B] {
                if !data.is_key_found(s, t) && self.card.authenticate(s, t, &key) {
                    debug!("Key reuse hit: sector {} key {}", s, t);

                    data.set_key(s, t, key);
                    link.set_data(data);
                    link.send(Event::found_key(s, t, key)).await?;
                }
            }
        }

        Ok(link.send(Event::KeyAttackStop).await? != Output::Stop)
    }

    /// Simulate the card leaving and re-entering the field (once per poller)
    async fn card_loss(&self, link: &SessionLink) -> Result<(), Error> {
        if self.lost.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Card removed from field");
        link.send(Event::CardLost).await?;

        tokio::time::sleep(Duration::from_millis(self.opts.lost_for_ms)).await;

        info!("Card returned to field");
        link.send(Event::CardDetected).await?;

        Ok(())
    }
}

#[async_trait]
impl Session for VirtualPoller {
    async fn run(&self, link: SessionLink) -> Result<(), Error> {
        debug!("Session {} started", link.id());

        link.send(Event::CardDetected).await?;

        // Seed card data from the device record
        let known = match link.send(Event::RequestMode).await? {
            Output::Mode(d) => d,
            Output::Stop => return Ok(()),
            o => {
                warn!("Unexpected mode response: {:?}", o);
                return Ok(());
            }
        };

        let mut data = CardData::new(self.card.card_type);
        for s in 0..data.total_sectors() {
            for t in [KeyType::A, KeyType::B] {
                if let Some(k) = known.key(s, t) {
                    data.set_key(s, t, k);
                }
            }
        }
        link.set_data(&data);

        self.data_update(&link, &data, 0).await?;

        let mut attempts = 0u32;

        for sector in 0..self.card.total_sectors() {
            if link.send(Event::NextSector { current_sector: sector }).await? == Output::Stop {
                return Ok(());
            }

            while !(data.is_key_found(sector, KeyType::A) && data.is_key_found(sector, KeyType::B))
            {
                let out = link.send(Event::RequestKey).await?;
                if out.command() == Command::Stop {
                    return Ok(());
                }

                // Dictionary exhausted for this sector
                let key = match out.key() {
                    Some(k) => k,
                    None => break,
                };

                attempts += 1;
                if Some(attempts) == self.opts.lost_after {
                    self.card_loss(&link).await?;
                }

                if self.opts.key_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.opts.key_delay_ms)).await;
                }

                for t in [KeyType::A, KeyType::B] {
                    if data.is_key_found(sector, t) || !self.card.authenticate(sector, t, &key) {
                        continue;
                    }

                    debug!("Found sector {} key {}: {}", sector, t, key);

                    data.set_key(sector, t, key);
                    link.set_data(&data);
                    link.send(Event::found_key(sector, t, key)).await?;

                    if !self.key_attack(&link, &mut data, sector, key).await? {
                        return Ok(());
                    }
                }
            }

            self.data_update(&link, &data, sector).await?;
        }

        debug!("Session {} complete after {} attempts", link.id(), attempts);

        link.send(Event::Success).await?;

        Ok(())
    }
}
