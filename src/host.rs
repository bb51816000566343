// Copyright (c) 2018 Fabian Schuiki

//! Hosting compiles for interactive callers.
//!
//! A workspace holds the most recent compilation of a grammar. Compiles may
//! run on a background thread; the result is built completely before it is
//! published, and readers access it under the same lock that guards its
//! replacement. Every compile draws a ticket when it is requested. A result
//! is only published if no compile requested later has published already.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use crate::config::Options;
use crate::{compile, Compilation};

/// The state shared between a host and its background compiles.
#[derive(Debug)]
pub struct Workspace {
    options: Options,
    tickets: AtomicU64,
    current: Mutex<Option<Published>>,
}

#[derive(Debug)]
struct Published {
    ticket: u64,
    compilation: Arc<Compilation>,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new(options: Options) -> Workspace {
        Workspace {
            options,
            tickets: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<Option<Published>> {
        // A reader that panicked leaves the published value intact.
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a compilation unless a newer one is already visible.
    fn publish(&self, ticket: u64, compilation: &Arc<Compilation>) -> bool {
        let mut current = self.lock();
        if let Some(ref published) = *current {
            if published.ticket > ticket {
                debug!(
                    "dropping compilation #{} of {}; #{} is newer",
                    ticket, compilation.file, published.ticket
                );
                return false;
            }
        }
        *current = Some(Published {
            ticket,
            compilation: compilation.clone(),
        });
        debug!("published compilation #{} of {}", ticket, compilation.file);
        true
    }

    fn compile_with_ticket(&self, ticket: u64, text: &str, file: &str) -> Arc<Compilation> {
        let compilation = Arc::new(compile(text, file, &self.options));
        self.publish(ticket, &compilation);
        compilation
    }

    /// Compile a grammar and publish the result.
    ///
    /// The returned compilation is the one just built, even if a newer
    /// compile has been published in the meantime.
    pub fn compile(&self, text: &str, file: &str) -> Arc<Compilation> {
        let ticket = self.ticket();
        self.compile_with_ticket(ticket, text, file)
    }

    /// Compile a grammar on a separate thread.
    ///
    /// The compile is ordered by the time of this call, not by the time it
    /// finishes. The result becomes visible to `current` and `with_current`
    /// once the compile has finished and no later request got there first.
    pub fn compile_in_background(
        workspace: &Arc<Workspace>,
        text: String,
        file: String,
    ) -> thread::JoinHandle<Arc<Compilation>> {
        let ticket = workspace.ticket();
        let workspace = workspace.clone();
        thread::spawn(move || workspace.compile_with_ticket(ticket, &text, &file))
    }

    /// The most recently published compilation.
    pub fn current(&self) -> Option<Arc<Compilation>> {
        self.lock().as_ref().map(|p| p.compilation.clone())
    }

    /// Run a closure on the most recently published compilation while no
    /// other compile can replace it.
    pub fn with_current<R, F: FnOnce(Option<&Compilation>) -> R>(&self, f: F) -> R {
        let guard = self.lock();
        f(guard.as_ref().map(|p| &*p.compilation))
    }
}
