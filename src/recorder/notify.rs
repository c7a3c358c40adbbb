//! Status notifications for the UI boundary

/// Fire-and-forget status text ("Recording", "Saved to 3.txt", ...).
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, text: &str);
}

/// Default notifier: status text goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl StatusNotifier for TracingNotifier {
    fn notify(&self, text: &str) {
        tracing::info!(status = text, "Status");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::StatusNotifier;
    use parking_lot::Mutex as ParkingMutex;

    /// Keeps every status text for assertions.
    #[derive(Debug, Default)]
    pub struct CollectingNotifier {
        pub messages: ParkingMutex<Vec<String>>,
    }

    impl CollectingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().clone()
        }
    }

    impl StatusNotifier for CollectingNotifier {
        fn notify(&self, text: &str) {
            self.messages.lock().push(text.to_string());
        }
    }
}
