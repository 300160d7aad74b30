use std::{cell::RefCell, rc::Rc};

use rxlite::subscribe::Subscriber;

/// Everything a recording subscriber has seen.
#[derive(Clone)]
pub struct Emissions<T> {
    pub nexts: Rc<RefCell<Vec<T>>>,
    pub errors: Rc<RefCell<Vec<String>>>,
    pub completes: Rc<RefCell<usize>>,
}

impl<T: Clone> Emissions<T> {
    pub fn nexts(&self) -> Vec<T> {
        self.nexts.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn completes(&self) -> usize {
        *self.completes.borrow()
    }
}

/// Returns a subscriber that records every notification, and the record.
pub fn register_emissions_subscriber<T: 'static>() -> (Subscriber<T>, Emissions<T>) {
    let emissions = Emissions {
        nexts: Rc::new(RefCell::new(Vec::with_capacity(5))),
        errors: Rc::new(RefCell::new(Vec::new())),
        completes: Rc::new(RefCell::new(0)),
    };
    let nexts_c = Rc::clone(&emissions.nexts);
    let errors_c = Rc::clone(&emissions.errors);
    let completes_c = Rc::clone(&emissions.completes);

    let subscriber = Subscriber::new(
        move |n| {
            // Track next() calls.
            nexts_c.borrow_mut().push(n);
        },
        move |e| {
            // Track error() calls.
            errors_c.borrow_mut().push(e.to_string());
        },
        move || {
            // Track complete() calls.
            *completes_c.borrow_mut() += 1;
        },
    );
    (subscriber, emissions)
}
