//! In-memory `ObjectClient` double with failure and latency injection.

use async_trait::async_trait;
use bytes::Bytes;
use ferry_core::{ByteRange, CompletedPart, Error, Result};
use ferry_transfer::{
    ChecksumHint, Locator, ObjectClient, ObjectInfo, ObjectStat, UploadId, UploadParams,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A finalized object held by the mock store.
#[derive(Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub checksum: Option<ChecksumHint>,
}

struct Session {
    locator: String,
    parts: HashMap<u32, (Bytes, String)>,
}

/// Mock object store.
///
/// Records every remote call in `calls` (as `"<op>:<detail>"` strings) so
/// tests can assert on call counts and session ids. Latency and failure
/// injection are opt-in via the builder methods.
#[derive(Default)]
pub struct MockObjectClient {
    objects: Mutex<HashMap<String, StoredObject>>,
    sessions: Mutex<HashMap<String, Session>>,
    pub calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
    range_calls: AtomicU64,
    fail_part: Option<u32>,
    fail_abort: bool,
    scramble: bool,
    hang_transfers: bool,
}

impl MockObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a finalized object, as if uploaded earlier.
    pub fn with_object(self, locator: &Locator, data: Bytes, checksum: Option<ChecksumHint>) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(locator.to_string(), StoredObject { data, checksum });
        self
    }

    /// Every attempt to upload part `number` fails.
    pub fn fail_on_part(mut self, number: u32) -> Self {
        self.fail_part = Some(number);
        self
    }

    /// The abort call itself fails.
    pub fn fail_abort(mut self) -> Self {
        self.fail_abort = true;
        self
    }

    /// Delay part transfers so that earlier calls finish later, reversing
    /// the completion order relative to dispatch order.
    pub fn scramble_completion(mut self) -> Self {
        self.scramble = true;
        self
    }

    /// Part transfers never complete; only cancellation frees the caller.
    pub fn hang_transfers(mut self) -> Self {
        self.hang_transfers = true;
        self
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.recorded_calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn stored(&self, locator: &Locator) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(&locator.to_string()).cloned()
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn inject_latency(&self) {
        if self.hang_transfers {
            std::future::pending::<()>().await;
        }
        if self.scramble {
            // Earlier calls sleep longer, so completions come back in
            // roughly reverse dispatch order.
            let k = self.range_calls.fetch_add(1, Ordering::SeqCst);
            let delay = 200u64.saturating_sub(k.saturating_mul(40));
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
}

#[async_trait]
impl ObjectClient for MockObjectClient {
    async fn head_object(&self, locator: &Locator) -> Result<ObjectStat> {
        self.record(format!("head:{locator}"));
        let objects = self.objects.lock().unwrap();
        let object = objects
            .get(&locator.to_string())
            .ok_or_else(|| Error::Remote(format!("no such object: {locator}")))?;
        Ok(ObjectStat {
            size: object.data.len() as u64,
            checksum: object.checksum.clone(),
        })
    }

    async fn create_multipart(
        &self,
        locator: &Locator,
        _params: &UploadParams,
    ) -> Result<UploadId> {
        let id = format!("upload-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.record(format!("create:{id}"));
        self.sessions.lock().unwrap().insert(
            id.clone(),
            Session {
                locator: locator.to_string(),
                parts: HashMap::new(),
            },
        );
        Ok(UploadId(id))
    }

    async fn upload_part(
        &self,
        _locator: &Locator,
        upload_id: &UploadId,
        part_number: u32,
        data: Bytes,
        _checksum: &ChecksumHint,
    ) -> Result<CompletedPart> {
        self.record(format!("upload_part:{part_number}"));
        self.inject_latency().await;
        if self.fail_part == Some(part_number) {
            return Err(Error::Remote(format!(
                "injected failure on part {part_number}"
            )));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&upload_id.0)
            .ok_or_else(|| Error::Remote(format!("no such upload: {upload_id}")))?;
        let etag = format!("etag-{part_number}");
        session.parts.insert(part_number, (data, etag.clone()));
        Ok(CompletedPart {
            number: part_number,
            etag,
        })
    }

    async fn complete_multipart(
        &self,
        locator: &Locator,
        upload_id: &UploadId,
        parts: Vec<CompletedPart>,
        checksum: Option<&ChecksumHint>,
    ) -> Result<ObjectInfo> {
        self.record(format!("complete:{upload_id}"));
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .remove(&upload_id.0)
            .ok_or_else(|| Error::Remote(format!("no such upload: {upload_id}")))?;

        // Like the real API, refuse part lists that are not strictly
        // ascending.
        for pair in parts.windows(2) {
            if pair[1].number <= pair[0].number {
                return Err(Error::Remote("part list not ascending".to_string()));
            }
        }

        // Assemble in the order the caller supplied, byte for byte.
        let mut data = Vec::new();
        for part in &parts {
            let (bytes, etag) = session
                .parts
                .get(&part.number)
                .ok_or_else(|| Error::Remote(format!("part {} never uploaded", part.number)))?;
            if *etag != part.etag {
                return Err(Error::Remote(format!("etag mismatch on part {}", part.number)));
            }
            data.extend_from_slice(bytes);
        }

        self.objects.lock().unwrap().insert(
            session.locator,
            StoredObject {
                data: Bytes::from(data),
                checksum: checksum.cloned(),
            },
        );
        Ok(ObjectInfo {
            locator: locator.clone(),
            etag: Some(format!("{}-{}", upload_id.0, parts.len())),
        })
    }

    async fn abort_multipart(&self, _locator: &Locator, upload_id: &UploadId) -> Result<()> {
        self.record(format!("abort:{upload_id}"));
        if self.fail_abort {
            return Err(Error::Remote("injected abort failure".to_string()));
        }
        self.sessions.lock().unwrap().remove(&upload_id.0);
        Ok(())
    }

    async fn get_range(&self, locator: &Locator, range: ByteRange) -> Result<Bytes> {
        self.record(format!("get_range:{range}"));
        self.inject_latency().await;
        let objects = self.objects.lock().unwrap();
        let object = objects
            .get(&locator.to_string())
            .ok_or_else(|| Error::Remote(format!("no such object: {locator}")))?;
        let len = object.data.len() as u64;
        if range.end >= len {
            return Err(Error::Remote(format!(
                "range {range} out of bounds for {len}-byte object"
            )));
        }
        Ok(object
            .data
            .slice(range.start as usize..=range.end as usize))
    }
}
