use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::model::{Problem, Verdict};

/// Messages delivered to whatever displays results (a webview, a terminal, a test).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum ExtensionMessage {
    RunSingleResult { result: Verdict, problem: Problem },
}

pub trait ReportSink: Send + Sync {
    fn deliver(&self, message: ExtensionMessage);
}

/// User-visible notifications that are not tied to a verdict, e.g. archival failures.
pub trait Notifier: Send + Sync {
    fn show_error(&self, message: &str);
}

/// Writes one JSON document per line.
pub struct JsonLineSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> ReportSink for JsonLineSink<W> {
    fn deliver(&self, message: ExtensionMessage) {
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let res = serde_json::to_writer(&mut *w, &message)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(w))
            .and_then(|_| w.flush());
        if let Err(e) = res {
            log::error!("Failed to write result message: {}", e);
        }
    }
}

/// Forwards messages to a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ExtensionMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExtensionMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReportSink for ChannelSink {
    fn deliver(&self, message: ExtensionMessage) {
        if self.tx.send(message).is_err() {
            log::warn!("Result receiver has been dropped");
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl Notifier for CollectingNotifier {
    fn show_error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_owned());
    }
}

impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    fn deliver(&self, message: ExtensionMessage) {
        (**self).deliver(message)
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn show_error(&self, message: &str) {
        (**self).show_error(message)
    }
}
