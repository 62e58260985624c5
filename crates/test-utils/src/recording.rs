//! Encoders and sinks for observing the GML feature-info bridge.

use std::io::{self, Write};
use std::sync::Mutex;

use wms_common::FeatureCollection;
use wms_protocol::{EncodeError, FeatureCollectionEncoder, FeatureCollectionResponse, Operation};

/// What one `encode` call received.
#[derive(Debug, Clone)]
pub struct EncodeCall {
    pub operation_id: String,
    pub service_id: String,
    pub base_url: String,
    pub srs_names: Vec<Option<String>>,
    pub collection_names: Vec<String>,
    /// Addresses of the collections handed over, for identity checks
    pub collection_addrs: Vec<usize>,
}

impl EncodeCall {
    /// Whether collection `index` is the very object `fc`.
    pub fn is_same_collection(&self, index: usize, fc: &FeatureCollection) -> bool {
        self.collection_addrs.get(index) == Some(&(fc as *const FeatureCollection as usize))
    }
}

/// Records every call and writes a fixed marker to the sink.
#[derive(Debug, Default)]
pub struct RecordingEncoder {
    calls: Mutex<Vec<EncodeCall>>,
}

/// Bytes written by [`RecordingEncoder`] per call.
pub const RECORDED_MARKER: &[u8] = b"<recorded/>";

impl RecordingEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EncodeCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

impl FeatureCollectionEncoder for RecordingEncoder {
    fn encode(
        &self,
        collection: &FeatureCollectionResponse<'_>,
        out: &mut dyn Write,
        operation: &Operation<'_>,
    ) -> Result<(), EncodeError> {
        let call = EncodeCall {
            operation_id: operation.id.clone(),
            service_id: operation.service.id.clone(),
            base_url: operation.request.base_url.clone(),
            srs_names: operation
                .request
                .queries
                .iter()
                .map(|q| q.srs_name.as_ref().map(|s| s.as_str().to_string()))
                .collect(),
            collection_names: collection.features.iter().map(|fc| fc.name.clone()).collect(),
            collection_addrs: collection
                .features
                .iter()
                .map(|fc| *fc as *const FeatureCollection as usize)
                .collect(),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        out.write_all(RECORDED_MARKER)?;
        Ok(())
    }
}

/// Encoder that always fails with a broken pipe.
#[derive(Debug, Default)]
pub struct FailingEncoder;

impl FeatureCollectionEncoder for FailingEncoder {
    fn encode(
        &self,
        _collection: &FeatureCollectionResponse<'_>,
        _out: &mut dyn Write,
        _operation: &Operation<'_>,
    ) -> Result<(), EncodeError> {
        Err(EncodeError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "client went away",
        )))
    }
}

/// Sink that accepts `limit` bytes and then fails every write.
#[derive(Debug)]
pub struct FailingSink {
    limit: usize,
    pub written: Vec<u8>,
}

impl FailingSink {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            written: Vec::new(),
        }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit.saturating_sub(self.written.len());
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "sink full"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
