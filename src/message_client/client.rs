use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use super::ClientConfig;
use crate::{scheduler::Scheduler, sink::OutputSink, subscribe::Teardown};

/// Raw messages the mock client picks from. The first one is not valid JSON and
/// the last one is valid JSON but not a message.
pub const MESSAGES: [&str; 4] = [
    "{",
    r#"{"type":"number","data":42}"#,
    r#"{"type":"string","data":"six times nine"}"#,
    "{}",
];

type Callback = Box<dyn FnMut(String)>;

struct ClientInner {
    scheduler: Rc<dyn Scheduler>,
    sink: Rc<dyn OutputSink>,
    interval: std::time::Duration,
    rng: RefCell<StdRng>,
    running: Cell<bool>,
    callback: RefCell<Option<Callback>>,
    timer: RefCell<Teardown>,
    sent: Cell<usize>,
}

impl ClientInner {
    fn tick(self: &Rc<Self>) {
        if !self.running.get() {
            return;
        }
        let index = self.rng.borrow_mut().random_range(0..MESSAGES.len());
        self.deliver(MESSAGES[index].to_string());
        if !self.running.get() {
            return;
        }

        let inner = Rc::clone(self);
        let timer = self
            .scheduler
            .schedule(self.interval, Box::new(move || inner.tick()));
        *self.timer.borrow_mut() = timer;
    }

    fn deliver(&self, message: String) {
        // Take the callback out while it runs: it may stop the client.
        let Some(mut callback) = self.callback.borrow_mut().take() else {
            return;
        };
        self.sent.set(self.sent.get() + 1);
        callback(message);
        if self.running.get() {
            *self.callback.borrow_mut() = Some(callback);
        }
    }
}

/// Mocked message source.
///
/// Sends one of [`MESSAGES`] to its callback immediately on start and then once
/// every [`ClientConfig::interval`], until [`stop`](MockMessageClient::stop) is
/// called.
pub struct MockMessageClient {
    inner: Rc<ClientInner>,
}

impl MockMessageClient {
    pub fn start(
        config: &ClientConfig,
        scheduler: Rc<dyn Scheduler>,
        sink: Rc<dyn OutputSink>,
        callback: impl FnMut(String) + 'static,
    ) -> Self {
        sink.write_line("Starting message client");
        info!(interval = ?config.interval, seed = ?config.seed, "starting message client");

        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let inner = Rc::new(ClientInner {
            scheduler,
            sink,
            interval: config.interval,
            rng: RefCell::new(rng),
            running: Cell::new(true),
            callback: RefCell::new(Some(Box::new(callback))),
            timer: RefCell::new(Teardown::Nil),
            sent: Cell::new(0),
        });
        inner.tick();

        MockMessageClient { inner }
    }

    /// Stops sending messages. Calling it again does nothing.
    pub fn stop(&self) {
        if !self.inner.running.replace(false) {
            return;
        }
        self.inner.sink.write_line("stopping message client");
        debug!(sent = self.inner.sent.get(), "stopping message client");

        self.inner.callback.borrow_mut().take();
        let timer = self.inner.timer.replace(Teardown::Nil);
        timer.run();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of messages delivered so far.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.inner.sent.get()
    }
}
