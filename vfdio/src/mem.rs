// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{error::*, Clock, FlashStore, OtaToken, OtaWriter, PartitionId, PartitionKind};

/// A named flash partition backed by an owned buffer.
#[derive(Debug, Clone)]
pub struct MemPartition {
    name: String,
    kind: PartitionKind,
    data: Vec<u8>,
}

impl MemPartition {
    /// An application image slot of `size` bytes, zero-filled.
    pub fn app(name: &str, size: usize) -> Self {
        Self {
            name: name.into(),
            kind: PartitionKind::App,
            data: vec![0u8; size],
        }
    }

    /// An app slot pre-loaded with `data` (e.g. the "running" image).
    pub fn app_with_data(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: PartitionKind::App,
            data,
        }
    }

    /// A data partition holding `data`.
    pub fn data(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: PartitionKind::Data,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug)]
struct OtaSession {
    token: u32,
    part: usize,
    offset: u64,
}

/// In-memory implementation of [`FlashStore`] + [`OtaWriter`].
///
/// Useful for tests and host tooling: partitions live in RAM, OTA
/// transfers write straight into the target slot, and the completed /
/// aborted transfer history stays inspectable.
#[derive(Debug, Default)]
pub struct MemFlashStore {
    partitions: Vec<MemPartition>,
    running: Option<usize>,
    boot: Option<usize>,
    session: Option<OtaSession>,
    next_token: u32,
    completed: Vec<(PartitionId, u64)>,
    aborted: usize,
}

impl MemFlashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a partition and returns its handle.
    pub fn add_partition(&mut self, part: MemPartition) -> PartitionId {
        self.partitions.push(part);
        PartitionId::new((self.partitions.len() - 1) as u32)
    }

    /// Marks `part` as the currently-executing app slot.
    pub fn set_running(&mut self, part: PartitionId) {
        self.running = Some(part.raw() as usize);
    }

    /// The slot `set_boot_partition` last selected, if any.
    pub fn boot_partition(&self) -> Option<PartitionId> {
        self.boot.map(|i| PartitionId::new(i as u32))
    }

    /// Raw bytes of a partition, for assertions.
    pub fn partition_data(&self, part: PartitionId) -> FlashIoResult<&[u8]> {
        self.slot(part).map(|p| p.data.as_slice())
    }

    /// Finalized OTA transfers as `(target, bytes_written)` pairs.
    pub fn completed_transfers(&self) -> &[(PartitionId, u64)] {
        &self.completed
    }

    /// Number of transfers discarded via `abort`.
    pub fn aborted_transfers(&self) -> usize {
        self.aborted
    }

    /// Whether an OTA transfer is currently open.
    pub fn transfer_open(&self) -> bool {
        self.session.is_some()
    }

    fn slot(&self, part: PartitionId) -> FlashIoResult<&MemPartition> {
        self.partitions
            .get(part.raw() as usize)
            .ok_or(FlashIoError::NotFound)
    }
}

impl FlashStore for MemFlashStore {
    fn find_partition(&self, name: &str) -> Option<PartitionId> {
        // App slots take precedence, then data partitions.
        for kind in [PartitionKind::App, PartitionKind::Data] {
            if let Some(idx) = self
                .partitions
                .iter()
                .position(|p| p.kind == kind && p.name == name)
            {
                return Some(PartitionId::new(idx as u32));
            }
        }
        None
    }

    fn partition_size(&self, part: PartitionId) -> FlashIoResult<u64> {
        self.slot(part).map(|p| p.data.len() as u64)
    }

    fn read_at(&mut self, part: PartitionId, offset: u64, buf: &mut [u8]) -> FlashIoResult {
        let p = self.slot(part)?;
        let end = offset
            .checked_add(buf.len() as u64)
            .ok_or(FlashIoError::OutOfBounds)?;
        if end > p.data.len() as u64 {
            return Err(FlashIoError::OutOfBounds);
        }
        buf.copy_from_slice(&p.data[offset as usize..end as usize]);
        Ok(())
    }

    fn running_partition(&self) -> FlashIoResult<PartitionId> {
        self.running
            .map(|i| PartitionId::new(i as u32))
            .ok_or(FlashIoError::NotFound)
    }

    fn next_update_partition(&self) -> Option<PartitionId> {
        // First app slot that is not the running one.
        self.partitions
            .iter()
            .enumerate()
            .find(|(i, p)| p.kind == PartitionKind::App && Some(*i) != self.running)
            .map(|(i, _)| PartitionId::new(i as u32))
    }
}

impl OtaWriter for MemFlashStore {
    fn begin(&mut self, part: PartitionId, size_hint: Option<u64>) -> FlashIoResult<OtaToken> {
        if self.session.is_some() {
            return Err(FlashIoError::Error("OTA transfer already open"));
        }
        let size = self.partition_size(part)?;
        if let Some(hint) = size_hint {
            if hint > size {
                return Err(FlashIoError::OutOfBounds);
            }
        }
        self.next_token += 1;
        self.session = Some(OtaSession {
            token: self.next_token,
            part: part.raw() as usize,
            offset: 0,
        });
        Ok(OtaToken::new(self.next_token))
    }

    fn write(&mut self, token: &OtaToken, data: &[u8]) -> FlashIoResult {
        let session = self.session.as_mut().ok_or(FlashIoError::NoTransfer)?;
        if session.token != token.raw() {
            return Err(FlashIoError::NoTransfer);
        }
        let part = &mut self.partitions[session.part];
        let end = session.offset + data.len() as u64;
        if end > part.data.len() as u64 {
            return Err(FlashIoError::OutOfBounds);
        }
        part.data[session.offset as usize..end as usize].copy_from_slice(data);
        session.offset = end;
        Ok(())
    }

    fn end(&mut self, token: OtaToken) -> FlashIoResult {
        match self.session.take() {
            Some(s) if s.token == token.raw() => {
                self.completed
                    .push((PartitionId::new(s.part as u32), s.offset));
                Ok(())
            }
            other => {
                self.session = other;
                Err(FlashIoError::NoTransfer)
            }
        }
    }

    fn abort(&mut self, token: OtaToken) -> FlashIoResult {
        match self.session.take() {
            Some(s) if s.token == token.raw() => {
                self.aborted += 1;
                Ok(())
            }
            other => {
                self.session = other;
                Err(FlashIoError::NoTransfer)
            }
        }
    }

    fn set_boot_partition(&mut self, part: PartitionId) -> FlashIoResult {
        self.slot(part)?;
        self.boot = Some(part.raw() as usize);
        Ok(())
    }
}

/// Manually-advanced monotonic clock for tests and host tooling.
///
/// Clones share the same underlying counter, so a test can hold one clone
/// while the disk owns another.
#[derive(Debug, Clone, Default)]
pub struct MemClock {
    now: Arc<AtomicU64>,
}

impl MemClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for MemClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_slots() -> (MemFlashStore, PartitionId, PartitionId) {
        let mut store = MemFlashStore::new();
        let ota0 = store.add_partition(MemPartition::app("ota_0", 4096));
        let ota1 = store.add_partition(MemPartition::app("ota_1", 4096));
        store.set_running(ota0);
        (store, ota0, ota1)
    }

    #[test]
    fn lookup_prefers_app_slots() {
        let mut store = MemFlashStore::new();
        store.add_partition(MemPartition::data("cfg", vec![1, 2, 3]));
        let app = store.add_partition(MemPartition::app("cfg", 16));
        assert_eq!(store.find_partition("cfg"), Some(app));
        assert_eq!(store.find_partition("missing"), None);
    }

    #[test]
    fn next_update_skips_running_slot() {
        let (store, ota0, ota1) = store_with_slots();
        assert_eq!(store.running_partition().unwrap(), ota0);
        assert_eq!(store.next_update_partition(), Some(ota1));
    }

    #[test]
    fn ota_round_trip_lands_in_target() {
        let (mut store, _ota0, ota1) = store_with_slots();
        let token = store.begin(ota1, None).unwrap();
        store.write(&token, &[0xE9; 100]).unwrap();
        store.write(&token, &[0x55; 28]).unwrap();
        store.end(token).unwrap();

        assert_eq!(store.completed_transfers(), &[(ota1, 128)]);
        assert_eq!(&store.partition_data(ota1).unwrap()[..100], &[0xE9; 100]);
        store.set_boot_partition(ota1).unwrap();
        assert_eq!(store.boot_partition(), Some(ota1));
    }

    #[test]
    fn write_past_slot_end_is_rejected() {
        let (mut store, _ota0, ota1) = store_with_slots();
        let token = store.begin(ota1, None).unwrap();
        assert_eq!(
            store.write(&token, &vec![0u8; 5000]),
            Err(FlashIoError::OutOfBounds)
        );
        store.abort(token).unwrap();
        assert_eq!(store.aborted_transfers(), 1);
        assert!(!store.transfer_open());
    }

    #[test]
    fn clock_clones_share_time() {
        let clock = MemClock::new();
        let other = clock.clone();
        other.advance(250);
        assert_eq!(clock.now_ms(), 250);
    }
}
