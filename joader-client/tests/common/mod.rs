//! In-process stand-in for the dataloader server
//!
//! Lays records out in a temp-file region the way the server lays them out
//! in shared memory and answers the `LoaderService` calls from it. Record
//! `i` lives in header slot `i` and its payload is `i` in decimal.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use joader_client::error::{LoaderError, Result};
use joader_client::loader::{Connector, LoaderHandle, LoaderService};
use joader_client::protocol::dataloader::DeleteDataloaderResponse;
use joader_client::shm::{RecordHeader, SlotRef, HEADER_SIZE, READ_FLAG_OFFSET};
use memmap2::MmapMut;
use parking_lot::Mutex;
use tempfile::NamedTempFile;

/// First loader id handed out; host `h` gets `LOADER_ID_BASE + h`
pub const LOADER_ID_BASE: u64 = 7;

/// Knobs controlling how the mock answers
#[derive(Debug, Clone)]
pub struct Behaviour {
    /// Upper bound on records per `Next`
    pub max_per_next: usize,
    /// Answer empty instead of `OutOfRange` once a host has nothing left
    pub idle_when_empty: bool,
    /// Codes returned by upcoming `Next` calls, one per call
    pub fail_next: VecDeque<tonic::Code>,
    /// Codes returned by upcoming `CreateDataloader` calls, one per call
    pub fail_create: VecDeque<tonic::Code>,
    /// Delay before answering `CreateDataloader`
    pub create_delay: Option<Duration>,
    /// Delay before answering `Next`
    pub next_delay: Option<Duration>,
    /// Code returned by `DeleteDataloader`
    pub fail_delete: Option<tonic::Code>,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            max_per_next: usize::MAX,
            idle_when_empty: false,
            fail_next: VecDeque::new(),
            fail_create: VecDeque::new(),
            create_delay: None,
            next_delay: None,
            fail_delete: None,
        }
    }
}

struct State {
    behaviour: Behaviour,
    pending: Vec<VecDeque<u64>>,
    next_host: usize,
}

pub struct MockServer {
    file: NamedTempFile,
    map: Mutex<MmapMut>,
    state: Mutex<State>,
    length: u64,
    nums: u32,
    pub next_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub reset_calls: AtomicUsize,
}

impl MockServer {
    /// Region holding `length` records split across `nums` hosts
    pub fn new(length: u64, nums: u32) -> Arc<Self> {
        let header_bytes = length * HEADER_SIZE;
        let payloads: Vec<String> = (0..length).map(|i| i.to_string()).collect();
        let data_bytes: u64 = payloads.iter().map(|p| p.len() as u64).sum();
        let total = (header_bytes + data_bytes).max(1);

        let file = NamedTempFile::new().unwrap();
        file.as_file().set_len(total).unwrap();
        let mut map = unsafe { MmapMut::map_mut(file.as_file()).unwrap() };

        let mut data_offset = header_bytes;
        for (i, payload) in payloads.iter().enumerate() {
            let start = i * HEADER_SIZE as usize;
            RecordHeader::new(payload.len() as u32, data_offset)
                .encode(&mut map[start..start + HEADER_SIZE as usize])
                .unwrap();
            let flags = start + READ_FLAG_OFFSET as usize;
            map[flags..flags + nums as usize].fill(0xff);
            let end = data_offset as usize + payload.len();
            map[data_offset as usize..end].copy_from_slice(payload.as_bytes());
            data_offset = end as u64;
        }
        map.flush().unwrap();

        Arc::new(Self {
            file,
            map: Mutex::new(map),
            state: Mutex::new(State {
                behaviour: Behaviour::default(),
                pending: (0..nums).map(|h| Self::records_of(length, nums, h)).collect(),
                next_host: 0,
            }),
            length,
            nums,
            next_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            reset_calls: AtomicUsize::new(0),
        })
    }

    fn records_of(length: u64, nums: u32, host: u32) -> VecDeque<u64> {
        (0..length).filter(|i| i % u64::from(nums) == u64::from(host)).collect()
    }

    pub fn configure(&self, f: impl FnOnce(&mut Behaviour)) {
        f(&mut self.state.lock().behaviour);
    }

    pub fn connector(self: &Arc<Self>) -> MockConnector {
        MockConnector {
            server: self.clone(),
        }
    }

    pub fn shm_path(&self) -> String {
        self.file.path().to_str().unwrap().to_string()
    }

    /// Reader flag of record `index` for partition `read_offset`
    pub fn read_flag(&self, index: u64, read_offset: u32) -> u8 {
        let offset = index * HEADER_SIZE + READ_FLAG_OFFSET + u64::from(read_offset);
        self.map.lock()[offset as usize]
    }

    /// Overwrite the header of record `index`
    pub fn corrupt_header(&self, index: u64, length: u32, payload_offset: u64) {
        let start = (index * HEADER_SIZE) as usize;
        let mut map = self.map.lock();
        RecordHeader::new(length, payload_offset)
            .encode(&mut map[start..start + HEADER_SIZE as usize])
            .unwrap();
    }

    pub fn region_len(&self) -> u64 {
        self.map.lock().len() as u64
    }

    fn injected(method: &'static str, code: tonic::Code) -> LoaderError {
        LoaderError::from_status(method, tonic::Status::new(code, "injected by mock"))
    }
}

pub struct MockConnector {
    server: Arc<MockServer>,
}

#[tonic::async_trait]
impl Connector for MockConnector {
    type Service = MockService;

    async fn connect(&self) -> Result<MockService> {
        Ok(MockService {
            server: self.server.clone(),
        })
    }

    fn endpoint(&self) -> String {
        "mock://dataloader".into()
    }
}

pub struct MockService {
    server: Arc<MockServer>,
}

#[tonic::async_trait]
impl LoaderService for MockService {
    async fn create_loader(
        &mut self,
        _dataset_name: &str,
        _name: &str,
        _nums: u32,
    ) -> Result<LoaderHandle> {
        let (delay, failure) = {
            let mut state = self.server.state.lock();
            (
                state.behaviour.create_delay,
                state.behaviour.fail_create.pop_front(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(code) = failure {
            return Err(MockServer::injected("CreateDataloader", code));
        }

        let mut state = self.server.state.lock();
        let host = state.next_host as u64;
        state.next_host = (state.next_host + 1) % self.server.nums as usize;
        Ok(LoaderHandle {
            loader_id: LOADER_ID_BASE + host,
            length: self.server.length,
            shm_path: self.server.shm_path(),
        })
    }

    async fn next(&mut self, loader_id: u64, batch_size: i32) -> Result<Vec<SlotRef>> {
        self.server.next_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.server.state.lock().behaviour.next_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.server.state.lock();
        if let Some(code) = state.behaviour.fail_next.pop_front() {
            return Err(MockServer::injected("Next", code));
        }

        let host = loader_id
            .checked_sub(LOADER_ID_BASE)
            .filter(|h| *h < u64::from(self.server.nums))
            .ok_or_else(|| MockServer::injected("Next", tonic::Code::NotFound))?;
        let mut limit = state.behaviour.max_per_next;
        if batch_size > 0 {
            limit = limit.min(batch_size as usize);
        }
        let idle = state.behaviour.idle_when_empty;

        let pending = &mut state.pending[host as usize];
        if pending.is_empty() {
            if idle {
                return Ok(Vec::new());
            }
            return Err(MockServer::injected("Next", tonic::Code::OutOfRange));
        }
        let take = limit.min(pending.len());
        Ok(pending
            .drain(..take)
            .map(|index| SlotRef::new(index, host as u32))
            .collect())
    }

    async fn delete_loader(
        &mut self,
        _dataset_name: &str,
        _name: &str,
    ) -> Result<DeleteDataloaderResponse> {
        self.server.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.server.state.lock().behaviour.fail_delete {
            return Err(MockServer::injected("DeleteDataloader", code));
        }
        Ok(DeleteDataloaderResponse::default())
    }

    async fn reset_loader(&mut self, _dataset_name: &str, _name: &str) -> Result<()> {
        self.server.reset_calls.fetch_add(1, Ordering::SeqCst);
        let nums = self.server.nums;
        let length = self.server.length;
        {
            let mut map = self.server.map.lock();
            for index in 0..length {
                let flags = (index * HEADER_SIZE + READ_FLAG_OFFSET) as usize;
                map[flags..flags + nums as usize].fill(0xff);
            }
        }
        let mut state = self.server.state.lock();
        state.pending = (0..nums)
            .map(|h| MockServer::records_of(length, nums, h))
            .collect();
        Ok(())
    }
}
