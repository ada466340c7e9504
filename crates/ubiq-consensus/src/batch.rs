//! Concurrent batch header verification.
//!
//! Work fans out to a pool of verifier threads and fans back in through a
//! coordinator that releases results strictly in input order, however the
//! workers finish. An abort handle stops dispatch and emission; in-flight
//! indices drain without being emitted.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use tracing::debug;
use ubiq_chain_types::Header;

use crate::chain::ChainHeaderReader;
use crate::engine::{Mode, Ubqhash};
use crate::error::{ConsensusError, ConsensusResult};

/// Cancels an in-progress batch verification.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    fn new() -> Self {
        Self {
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop dispatching new work and emitting further results.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }

    /// Whether the batch has been aborted.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }
}

impl Ubqhash {
    /// Verify a batch of headers concurrently, emitting one result per
    /// header in input order on the returned channel.
    pub(crate) fn verify_headers_inner(
        &self,
        chain: Arc<dyn ChainHeaderReader>,
        headers: Vec<Header>,
        seals: Vec<bool>,
    ) -> (AbortHandle, mpsc::Receiver<ConsensusResult<()>>) {
        let abort = AbortHandle::new();

        // Nothing to do, or a fully faked engine: answer straight away.
        if self.mode() == Mode::FullFake || headers.is_empty() {
            let (results_tx, results_rx) = mpsc::sync_channel(headers.len().max(1));
            for _ in 0..headers.len() {
                let _ = results_tx.send(Ok(()));
            }
            return (abort, results_rx);
        }
        assert_eq!(
            headers.len(),
            seals.len(),
            "one seal flag is required per header"
        );

        let workers = num_cpus::get().min(headers.len()).max(1);
        debug!(workers, headers = headers.len(), "spawning verification workers");

        let headers = Arc::new(headers);
        let seals = Arc::new(seals);
        let next = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = mpsc::channel::<(usize, ConsensusResult<()>)>();

        for id in 0..workers {
            let engine = self.clone();
            let chain = Arc::clone(&chain);
            let headers = Arc::clone(&headers);
            let seals = Arc::clone(&seals);
            let next = Arc::clone(&next);
            let done_tx = done_tx.clone();
            let abort = abort.clone();
            thread::Builder::new()
                .name(format!("header-verify-{id}"))
                .spawn(move || {
                    loop {
                        if abort.is_aborted() {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        if index >= headers.len() {
                            break;
                        }
                        let result =
                            engine.verify_header_worker(chain.as_ref(), &headers, &seals, index);
                        if done_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                })
                .expect("failed to spawn header verification worker");
        }
        // Workers hold the only senders now; the coordinator's recv ends
        // when the last of them exits.
        drop(done_tx);

        let total = headers.len();
        let (results_tx, results_rx) = mpsc::sync_channel(total);
        let abort_flag = abort.clone();
        thread::Builder::new()
            .name("header-verify-coordinator".to_string())
            .spawn(move || {
                let mut completed: Vec<Option<ConsensusResult<()>>> = vec![None; total];
                let mut out = 0;
                while out < total {
                    if abort_flag.is_aborted() {
                        return;
                    }
                    let Ok((index, result)) = done_rx.recv() else {
                        return;
                    };
                    completed[index] = Some(result);
                    // Flush the contiguous prefix of finished indices.
                    while out < total {
                        let Some(result) = completed[out].take() else {
                            break;
                        };
                        if results_tx.send(result).is_err() {
                            return;
                        }
                        out += 1;
                    }
                }
            })
            .expect("failed to spawn header verification coordinator");

        (abort, results_rx)
    }

    /// Verify one batch index against its parent: the previous header in the
    /// batch when it chains, otherwise whatever the chain knows. Headers
    /// already on chain pass without re-verification.
    fn verify_header_worker(
        &self,
        chain: &dyn ChainHeaderReader,
        headers: &[Header],
        seals: &[bool],
        index: usize,
    ) -> ConsensusResult<()> {
        let header = &headers[index];
        let parent = if index > 0 && headers[index - 1].hash() == header.parent_hash {
            Some(headers[index - 1].clone())
        } else {
            chain.get_header(header.parent_hash, header.number.wrapping_sub(1))
        };
        let Some(parent) = parent else {
            return Err(ConsensusError::UnknownAncestor);
        };
        if chain.get_header(header.hash(), header.number).is_some() {
            return Ok(());
        }
        self.verify_header_against(chain, header, &parent, false, seals[index])
    }
}
