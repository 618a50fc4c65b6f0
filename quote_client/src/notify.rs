//! Toast-style notifications raised by the mutation controller.
//!
//! Delivery is fire-and-forget: a notifier never reports back and never fails
//! the operation that raised the notification.
use std::time::Duration;

use crossbeam_channel::Sender;
use log::{error, info, warn};
use strum_macros::Display;

/// How long a toast stays on screen.
pub const TOAST_LIFE: Duration = Duration::from_millis(3000);

/// Severity of a notification.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

/// A `(severity, summary, detail)` message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Toast color and icon.
    pub severity: Severity,
    /// Short title.
    pub summary: String,
    /// Human-readable detail.
    pub detail: String,
    /// Display duration.
    pub life: Duration,
}

impl Notification {
    /// Builds a notification with the default toast life.
    pub fn new(severity: Severity, summary: &str, detail: &str) -> Self {
        Self {
            severity,
            summary: summary.to_string(),
            detail: detail.to_string(),
            life: TOAST_LIFE,
        }
    }

    /// Confirmation of a saved edit.
    pub fn updated() -> Self {
        Self::new(
            Severity::Success,
            "Actualizado",
            "Los datos se actualizaron correctamente",
        )
    }

    /// A failed edit that was reverted.
    pub fn update_reverted() -> Self {
        Self::new(
            Severity::Error,
            "Error",
            "Error al actualizar los datos, se revirtió el cambio",
        )
    }

    /// Confirmation of a created record.
    pub fn created() -> Self {
        Self::new(Severity::Success, "Creado", "La cotización se creó correctamente")
    }

    /// A failed creation.
    pub fn create_failed() -> Self {
        Self::new(Severity::Error, "Error", "No se pudo crear la cotización")
    }
}

/// Receiver of user-facing notifications.
pub trait Notifier: Send + Sync {
    /// Delivers `notification`; must not block.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => error!("[{}] {}: {}", n.severity, n.summary, n.detail),
            Severity::Warn => warn!("[{}] {}: {}", n.severity, n.summary, n.detail),
            Severity::Success | Severity::Info => {
                info!("[{}] {}: {}", n.severity, n.summary, n.detail)
            }
        }
    }
}

/// Forwards notifications to a UI thread over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<Notification>,
}

impl ChannelNotifier {
    /// Forwards every notification to `tx`.
    pub fn new(tx: Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            warn!("Notification dropped, toast receiver is gone: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn channel_notifier_forwards_and_survives_closed_receiver() {
        let (tx, rx) = unbounded();
        let notifier = ChannelNotifier::new(tx);
        notifier.notify(Notification::updated());
        let got = rx.recv().unwrap();
        assert_eq!(got.severity, Severity::Success);
        assert_eq!(got.life, TOAST_LIFE);

        drop(rx);
        notifier.notify(Notification::update_reverted());
    }

    #[test]
    fn severity_renders_lowercase() {
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
