use grab_logging::{grab_error, grab_info, grab_warn};

use crate::EngineEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Turns engine events into log records. This is what the binary uses.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::SeedScanned { seed, links } => {
                if links == 0 {
                    grab_warn!("No media links found on {}", seed);
                } else {
                    grab_info!("Found {} media links on {}", links, seed);
                }
            }
            EngineEvent::Saved { url, path, bytes } => {
                grab_info!("File was downloaded: {} -> {:?} ({} bytes)", url, path, bytes);
            }
            EngineEvent::AlreadyPresent { url, path } => {
                grab_info!("File already present: {} at {:?}", url, path);
            }
            EngineEvent::Retrying {
                url,
                attempt,
                reason,
            } => {
                grab_warn!("Retrying {} (attempt {}): {}", url, attempt, reason);
            }
            EngineEvent::Failed {
                url,
                attempts,
                reason,
            } => {
                grab_error!(
                    "Downloading err: {} gave up after {} attempts: {}",
                    url,
                    attempts,
                    reason
                );
            }
        }
    }
}
