#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use hoist_core::error::{Error, Result};
use hoist_core::ledger::{
    ExecutionResult, ExecutionStatus, GasCoin, LedgerClient, Network, ObjectChange,
};
use hoist_core::signer::hardware::apdu::{INS_GET_PUBLIC_KEY, INS_SIGN};
use hoist_core::signer::hardware::{DeviceConnector, DeviceTransport};
use hoist_core::signer::{Signature, Signer, SoftwareSigner};
use hoist_core::types::{Address, Identity, ObjectDigest, ObjectId, ObjectRef};

pub const GAS_PRICE: u64 = 1_000;

pub fn object_ref(id: u8, version: u64) -> ObjectRef {
    ObjectRef {
        object_id: Address::from_short(id),
        version,
        digest: ObjectDigest::new([id; 32]),
    }
}

pub fn gas_coin(id: u8, balance: u64) -> GasCoin {
    GasCoin {
        object_ref: object_ref(id, 1),
        balance,
    }
}

pub fn published(package_id: &str) -> ObjectChange {
    ObjectChange::Published {
        package_id: package_id.to_string(),
        version: 1,
        modules: vec!["arca".to_string()],
    }
}

pub fn created_upgrade_cap(id: u8) -> ObjectChange {
    ObjectChange::Created {
        object_id: Address::from_short(id),
        object_type: "0x2::package::UpgradeCap".to_string(),
        version: 2,
    }
}

pub fn success(changes: Vec<ObjectChange>) -> ExecutionResult {
    ExecutionResult {
        digest: "7Pv3sC5yB8kGxqZr".to_string(),
        status: ExecutionStatus::success(),
        object_changes: changes,
    }
}

pub fn software_signer(seed: u8) -> SoftwareSigner {
    SoftwareSigner::from_seed([seed; 32], Network::Devnet)
}

/// In-memory ledger that records every submission.
pub struct MockLedger {
    coins: Vec<GasCoin>,
    objects: Mutex<HashMap<ObjectId, ObjectRef>>,
    result: Mutex<ExecutionResult>,
    pub executed: Mutex<Vec<(Vec<u8>, Vec<Signature>)>>,
}

impl MockLedger {
    pub fn new(result: ExecutionResult) -> Self {
        Self {
            coins: vec![gas_coin(0x60, 10_000_000_000)],
            objects: Mutex::new(HashMap::new()),
            result: Mutex::new(result),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_coins(mut self, coins: Vec<GasCoin>) -> Self {
        self.coins = coins;
        self
    }

    pub fn with_object(self, object: ObjectRef) -> Self {
        self.objects.lock().unwrap().insert(object.object_id, object);
        self
    }

    pub fn coins(&self) -> &[GasCoin] {
        &self.coins
    }

    pub fn execution_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn last_tx_bytes(&self) -> Option<Vec<u8>> {
        self.executed.lock().unwrap().last().map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn reference_gas_price(&self) -> Result<u64> {
        Ok(GAS_PRICE)
    }

    async fn gas_coins(&self, _owner: &Identity) -> Result<Vec<GasCoin>> {
        Ok(self.coins.clone())
    }

    async fn object_ref(&self, id: &ObjectId) -> Result<ObjectRef> {
        self.objects
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .ok_or_else(|| Error::ObjectNotFound(id.to_string()))
    }

    async fn execute(&self, tx_bytes: &[u8], signatures: &[Signature]) -> Result<ExecutionResult> {
        self.executed
            .lock()
            .unwrap()
            .push((tx_bytes.to_vec(), signatures.to_vec()));
        Ok(self.result.lock().unwrap().clone())
    }
}

/// How the emulated device answers sign requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceBehavior {
    Approve,
    Reject,
    /// Never answers the final sign chunk.
    Hang,
    /// Signing app not open: every exchange fails with 0x6e00.
    AppClosed,
}

/// Emulated signing device holding one ed25519 key.
pub struct MockDevice {
    key: SoftwareSigner,
    behavior: Mutex<DeviceBehavior>,
    in_use: AtomicBool,
    pub connects: AtomicUsize,
    pub releases: AtomicUsize,
}

impl MockDevice {
    pub fn new(seed: u8) -> Arc<Self> {
        Arc::new(Self {
            key: software_signer(seed),
            behavior: Mutex::new(DeviceBehavior::Approve),
            in_use: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        })
    }

    pub fn set_behavior(&self, behavior: DeviceBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn in_use(&self) -> bool {
        self.in_use.load(Ordering::SeqCst)
    }

    pub fn key(&self) -> &SoftwareSigner {
        &self.key
    }
}

/// Connector handing out exclusive transports to a [`MockDevice`].
pub struct MockConnector(pub Arc<MockDevice>);

#[async_trait]
impl DeviceConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn DeviceTransport>> {
        if self.0.in_use.swap(true, Ordering::SeqCst) {
            return Err(Error::DeviceUnavailable("device busy".to_string()));
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport {
            device: Arc::clone(&self.0),
            pending: Vec::new(),
        }))
    }

    fn describe(&self) -> String {
        "mock://device".to_string()
    }
}

struct MockTransport {
    device: Arc<MockDevice>,
    pending: Vec<u8>,
}

const SW_OK: [u8; 2] = [0x90, 0x00];

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        let behavior = *self.device.behavior.lock().unwrap();
        if behavior == DeviceBehavior::AppClosed {
            return Ok(vec![0x6e, 0x00]);
        }

        let (ins, p2, data) = (apdu[1], apdu[3], &apdu[5..]);
        self.pending.extend_from_slice(data);
        if p2 == 0x80 {
            return Ok(SW_OK.to_vec());
        }
        let payload = std::mem::take(&mut self.pending);
        let path_len = 1 + payload[0] as usize * 4;

        match ins {
            INS_GET_PUBLIC_KEY => {
                let key = self.device.key.public_key_sync();
                let mut response = vec![32u8];
                response.extend_from_slice(key.as_bytes());
                response.extend_from_slice(&SW_OK);
                Ok(response)
            }
            INS_SIGN => match behavior {
                DeviceBehavior::Reject => Ok(vec![0x69, 0x85]),
                DeviceBehavior::Hang => std::future::pending().await,
                _ => {
                    let signature = self.device.key.sign(&payload[path_len..]).await?;
                    let mut response = signature.signature_bytes().to_vec();
                    response.extend_from_slice(&SW_OK);
                    Ok(response)
                }
            },
            _ => Ok(vec![0x6d, 0x00]),
        }
    }

    fn release(&mut self) {
        self.device.in_use.store(false, Ordering::SeqCst);
        self.device.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Write an executable shell script standing in for the package compiler.
///
/// The script records its arguments in `args.txt` next to itself, then
/// prints `stdout` and exits with `exit_code`.
#[cfg(unix)]
pub fn stub_compiler(dir: &Path, stdout: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-sui");
    let args_file = dir.join("args.txt");
    let body = format!(
        "#!/bin/sh\necho \"$@\" > '{}'\ncat <<'HOIST_EOF'\n{}\nHOIST_EOF\necho 'error[E02001]: stub diagnostics' >&2\nexit {}\n",
        args_file.display(),
        stdout,
        exit_code
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Write a compiler stand-in that records its arguments, sleeps for
/// `seconds`, then touches `finished` next to itself.
#[cfg(unix)]
pub fn slow_compiler(dir: &Path, seconds: u32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("slow-sui");
    let body = format!(
        "#!/bin/sh\necho \"$@\" > '{}'\nsleep {}\ntouch '{}'\n",
        dir.join("args.txt").display(),
        seconds,
        dir.join("finished").display()
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Arguments the stub compiler was last invoked with.
pub fn recorded_args(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("args.txt"))
        .unwrap()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

pub const BUILD_OUTPUT: &str = r#"{"modules":["oRzrCwYAAAAK","oRzrCwYAAAAL"],"dependencies":["0x1","0x2"],"digest":[7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7]}"#;

/// A directory that looks like a Move package.
pub fn package_dir(root: &Path) -> PathBuf {
    let dir = root.join("arca");
    std::fs::create_dir_all(dir.join("sources")).unwrap();
    std::fs::write(
        dir.join("Move.toml"),
        "[package]\nname = \"arca\"\nedition = \"2024.beta\"\n",
    )
    .unwrap();
    dir
}
