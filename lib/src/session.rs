// Copyright (c) 2023 The mfc-attack Authors

//! Card session plumbing
//!
//! A [Session] runs as a tokio task for the duration of one card interaction,
//! raising [Event]s to the owner loop via a [SessionLink]. Each event is a
//! [Request] carrying a reply channel, so key and mode requests block the session
//! until the owner responds.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use mfc_attack_core::{
    card::CardData,
    engine::{Event, Output},
};

use crate::Error;

/// Session event request, tagged with the originating session
#[derive(Debug)]
pub struct Request {
    /// Session identifier
    pub session: u64,
    /// Session event
    pub event: Event,
    /// Response channel
    pub resp: oneshot::Sender<Output>,
}

/// Session completion, reported with the originating session identifier
pub type Done = (u64, Result<(), Error>);

/// Card session, driven by the host for each attack phase
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Run a card session to completion, raising events via the provided link
    async fn run(&self, link: SessionLink) -> Result<(), Error>;
}

/// Link from a running [Session] to the owner loop
#[derive(Clone, Debug)]
pub struct SessionLink {
    id: u64,
    tx: mpsc::Sender<Request>,
    data: Arc<Mutex<Option<CardData>>>,
}

impl SessionLink {
    pub(crate) fn new(
        id: u64,
        tx: mpsc::Sender<Request>,
        data: Arc<Mutex<Option<CardData>>>,
    ) -> Self {
        Self { id, tx, data }
    }

    /// Session identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Raise an event, awaiting the owner response
    ///
    /// Returns [Error::SessionClosed] if the owner has stopped listening or
    /// has dropped this (stale) session.
    pub async fn send(&self, event: Event) -> Result<Output, Error> {
        let (resp, rx) = oneshot::channel();

        self.tx
            .send(Request {
                session: self.id,
                event,
                resp,
            })
            .await
            .map_err(|_| Error::SessionClosed)?;

        rx.await.map_err(|_| Error::SessionClosed)
    }

    /// Publish the session card data snapshot
    pub fn set_data(&self, data: &CardData) {
        if let Ok(mut d) = self.data.lock() {
            *d = Some(data.clone());
        }
    }
}
