//! Drag-and-drop host
//!
//! Models the drop-zone page: the user drops one file, its bytes go through
//! virtual stdin, and the result comes back as a download named after the
//! input. A drop with several items or a non-file item does nothing.
//!
//! The page itself (DOM events, blob URLs) is outside this crate; a front end
//! feeds [`DropZone::on_drop`] and offers the returned [`Download`].

use super::ModePolicy;
use crate::bridge::{Bridge, Host};
use crate::error::BridgeError;
use crate::invocation::{Invocation, Output};
use std::path::Path;
use wzip_format::{decide_output_name, name_collides, output_name, Mode};

/// One entry of a drop event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropItem {
    File(DroppedFile),
    /// Dragged text, links and the like
    Text(String),
}

/// A dropped file: its name and full contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Load a file from disk the way a browser reads a dropped file
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            BridgeError::input_unavailable(format!("cannot read '{}'", path.display()), Some(e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// The result offered to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub name: String,
    pub bytes: Vec<u8>,
    /// The download would replace the dropped file
    pub name_collides: bool,
}

/// Drop target bound to a bridge
#[derive(Debug, Clone)]
pub struct DropZone {
    bridge: Bridge,
    policy: ModePolicy,
}

impl DropZone {
    /// Drop zone that infers the operation from the dropped content
    pub fn new(bridge: Bridge) -> Self {
        Self::with_policy(bridge, ModePolicy::Infer)
    }

    pub fn with_policy(bridge: Bridge, policy: ModePolicy) -> Self {
        Self { bridge, policy }
    }

    /// Handle a drop event
    ///
    /// Returns `Ok(None)` when the drop is ignored.
    pub async fn on_drop(&self, items: Vec<DropItem>) -> Result<Option<Download>, BridgeError> {
        let Some(file) = single_file(items) else {
            tracing::debug!("Ignoring drop without exactly one file");
            return Ok(None);
        };

        tracing::info!(name = %file.name, len = file.bytes.len(), "File dropped");
        let host = DropHost::new(file, self.policy);
        self.bridge.dispatch(host).await.map(Some)
    }
}

fn single_file(items: Vec<DropItem>) -> Option<DroppedFile> {
    let [item] = <[DropItem; 1]>::try_from(items).ok()?;
    match item {
        DropItem::File(file) => Some(file),
        DropItem::Text(_) => None,
    }
}

/// [`Host`] for one dropped file
#[derive(Debug)]
pub struct DropHost {
    input_name: String,
    output_name: String,
    bytes: Option<Vec<u8>>,
    policy: ModePolicy,
}

impl DropHost {
    pub fn new(file: DroppedFile, policy: ModePolicy) -> Self {
        Self {
            output_name: file.name.clone(),
            input_name: file.name,
            bytes: Some(file.bytes),
            policy,
        }
    }
}

impl Host for DropHost {
    type Delivery = Download;
    const NAME: &'static str = "browser";

    fn collect(&mut self) -> Result<Invocation, BridgeError> {
        let bytes = self
            .bytes
            .take()
            .ok_or_else(|| BridgeError::input_unavailable("dropped file already consumed", None))?;

        let mode = self.policy.resolve(&bytes);
        self.output_name = match mode {
            Mode::Unspecified => decide_output_name(&self.input_name, &bytes),
            mode => output_name(mode, &self.input_name),
        };

        Ok(Invocation::from_bytes(mode, bytes))
    }

    fn deliver(self, output: Output) -> Result<Download, BridgeError> {
        let Output::Bytes(bytes) = output else {
            return Err(BridgeError::UnexpectedOutput { host: Self::NAME });
        };

        let name_collides = name_collides(&self.input_name, &self.output_name);
        if name_collides {
            tracing::warn!(name = %self.output_name, "Download name matches the dropped file");
        }

        Ok(Download {
            name: self.output_name,
            bytes,
            name_collides,
        })
    }
}
