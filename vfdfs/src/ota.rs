// SPDX-License-Identifier: MIT

use core::mem;

use log::{debug, info, trace, warn};
use vfdio::{FlashStore, OtaToken, OtaWriter, PartitionId};

use crate::{
    constant::*,
    errors::{DiskIoError, DiskIoResult, OtaError},
    image::{parse_firmware, AppDescriptor, FirmwareRejection},
};

/// Application-facing update callbacks.
///
/// The defaults accept every image and log the outcome; an embedding
/// application overrides `update_finished` to schedule its reboot.
pub trait UpdateHooks {
    /// Called once per attempt, before any flash write. Returning
    /// `false` vetoes the update.
    fn update_started(&mut self, desc: &AppDescriptor) -> bool {
        let _ = desc;
        true
    }

    /// Called once per attempt after commit or failure.
    fn update_finished(&mut self, received: u64, result: Result<(), OtaError>) {
        match result {
            Ok(()) => info!("OTA update committed: {} bytes received", received),
            Err(e) => warn!("OTA update failed after {} bytes: {}", received, e),
        }
    }
}

/// Hooks used until the application installs its own.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl UpdateHooks for DefaultHooks {}

/// OTA stream state. One transfer at a time.
#[derive(Debug)]
pub enum OtaState {
    Idle,
    Receiving {
        token: OtaToken,
        partition: PartitionId,
        bytes_received: u64,
    },
    Committing,
    Failed(OtaError),
}

/// Firmware write pipeline: detects an image on the first data write,
/// streams it through the backend's OTA writer and commits after the
/// host has been silent for [`OTA_IDLE_TIMEOUT_MS`].
#[derive(Debug)]
pub struct OtaPipeline {
    expected_chip_id: u16,
    state: OtaState,
    deadline_ms: Option<u64>,
}

impl OtaPipeline {
    pub fn new(expected_chip_id: u16) -> Self {
        Self {
            expected_chip_id,
            state: OtaState::Idle,
            deadline_ms: None,
        }
    }

    pub fn state(&self) -> &OtaState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, OtaState::Idle)
    }

    pub fn bytes_received(&self) -> Option<u64> {
        match self.state {
            OtaState::Receiving { bytes_received, .. } => Some(bytes_received),
            _ => None,
        }
    }

    /// Deadline of the pending inactivity check, if a write armed one.
    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// Feeds one host write targeting a writable file-data span.
    pub fn on_data_write<B>(
        &mut self,
        backend: &mut B,
        hooks: &mut dyn UpdateHooks,
        buf: &[u8],
        now_ms: u64,
    ) -> DiskIoResult
    where
        B: FlashStore + OtaWriter,
    {
        self.deadline_ms = Some(now_ms + OTA_IDLE_TIMEOUT_MS);

        if let OtaState::Failed(err) = &self.state {
            debug!("clearing failed OTA state ({})", err);
            self.state = OtaState::Idle;
        }

        if matches!(self.state, OtaState::Idle) {
            match parse_firmware(buf, self.expected_chip_id) {
                Ok(desc) => self.start_transfer(backend, hooks, &desc)?,
                Err(rejection) => {
                    // Not the start of a firmware stream; tolerate and
                    // discard the write.
                    match rejection {
                        FirmwareRejection::NotAnImage => {
                            trace!("data write without image magic, discarding")
                        }
                        FirmwareRejection::Truncated => {
                            debug!("image magic but header incomplete, discarding")
                        }
                        FirmwareRejection::WrongChip { expected, found } => warn!(
                            "firmware image for chip {:#06x}, this device is {:#06x}",
                            found, expected
                        ),
                        FirmwareRejection::BadDescriptor => {
                            warn!("firmware image without app descriptor, discarding")
                        }
                    }
                    return Ok(());
                }
            }
        }

        self.write_chunk(backend, hooks, buf)
    }

    /// Runs the inactivity check against the owning task's clock.
    /// Commits (or cleans up) once the deadline has passed.
    pub fn poll<B>(&mut self, backend: &mut B, hooks: &mut dyn UpdateHooks, now_ms: u64)
    where
        B: FlashStore + OtaWriter,
    {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {}
            _ => return,
        }
        self.deadline_ms = None;

        match mem::replace(&mut self.state, OtaState::Committing) {
            OtaState::Receiving {
                token,
                partition,
                bytes_received,
            } => {
                info!(
                    "OTA stream quiescent after {} bytes, finalizing",
                    bytes_received
                );
                let result = backend
                    .end(token)
                    .and_then(|_| backend.set_boot_partition(partition))
                    .map_err(OtaError::Io);
                hooks.update_finished(bytes_received, result);
                self.state = OtaState::Idle;
            }
            OtaState::Failed(err) => {
                debug!("discarding failed OTA state ({})", err);
                self.state = OtaState::Idle;
            }
            _ => self.state = OtaState::Idle,
        }
    }

    fn start_transfer<B>(
        &mut self,
        backend: &mut B,
        hooks: &mut dyn UpdateHooks,
        desc: &AppDescriptor,
    ) -> DiskIoResult
    where
        B: FlashStore + OtaWriter,
    {
        info!(
            "firmware image detected: {} {} ({})",
            desc.project_name, desc.version, desc.idf_version
        );

        if !hooks.update_started(desc) {
            warn!("update vetoed by application");
            return Err(OtaError::Validation("update vetoed by application").into());
        }

        let running = backend.running_partition().ok();
        let target = backend
            .next_update_partition()
            .filter(|p| Some(*p) != running)
            .ok_or(OtaError::Validation("no free update slot"))?;

        let token = match backend.begin(target, None) {
            Ok(token) => token,
            Err(e) => {
                let err = OtaError::Io(e);
                hooks.update_finished(0, Err(err));
                return Err(err.into());
            }
        };

        self.state = OtaState::Receiving {
            token,
            partition: target,
            bytes_received: 0,
        };
        Ok(())
    }

    fn write_chunk<B>(
        &mut self,
        backend: &mut B,
        hooks: &mut dyn UpdateHooks,
        buf: &[u8],
    ) -> DiskIoResult
    where
        B: OtaWriter,
    {
        let OtaState::Receiving {
            token,
            bytes_received,
            ..
        } = &mut self.state
        else {
            return Ok(());
        };

        match backend.write(token, buf) {
            Ok(()) => {
                *bytes_received += buf.len() as u64;
                Ok(())
            }
            Err(e) => {
                let err = OtaError::Io(e);
                if let OtaState::Receiving {
                    token,
                    bytes_received,
                    ..
                } = mem::replace(&mut self.state, OtaState::Failed(err))
                {
                    if let Err(abort_err) = backend.abort(token) {
                        warn!("OTA abort failed: {}", abort_err);
                    }
                    hooks.update_finished(bytes_received, Err(err));
                }
                Err(DiskIoError::Ota(err))
            }
        }
    }
}
