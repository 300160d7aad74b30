use std::rc::Rc;

use serde_json::Value;

use super::{is_message, is_valid_json, parse_message, ClientConfig, Message, MockMessageClient};
use crate::{
    scheduler::Scheduler,
    sink::OutputSink,
    subscribe::{Subscriber, Subscription, Teardown},
    Observable, ObservableExt, Subscribeable,
};

/// Observable of raw client messages.
///
/// Every subscription starts its own [`MockMessageClient`]; unsubscribing stops it.
/// Each message is logged to `sink` as `clientObservable: <raw>`, preceded by a
/// blank line.
pub fn client_observable(
    config: ClientConfig,
    scheduler: Rc<dyn Scheduler>,
    sink: Rc<dyn OutputSink>,
) -> Observable<String> {
    let client_sink = Rc::clone(&sink);
    let blank_sink = Rc::clone(&sink);

    Observable::new(move |o: Subscriber<String>| {
        let client = MockMessageClient::start(
            &config,
            Rc::clone(&scheduler),
            Rc::clone(&client_sink),
            move |message| o.next(message),
        );
        Teardown::from_fn(move || client.stop())
    })
    .tap(move |_| blank_sink.write_line(""))
    .tap(move |v| sink.write_line(&format!("clientObservable: {v}")))
}

/// The message processing pipeline.
///
/// Every stage logs what passes through it to the sink, the way the stages are
/// named here (`validJsonObservable: ...`, `parsedJsonObservable: ...`,
/// `validMessageObservable: ...`).
#[derive(Clone, Debug)]
pub struct MessagePipeline {
    /// Valid messages, shared by both branches below.
    pub shared: Observable<Message>,
    /// The first `string_limit` messages carrying a string payload.
    pub first_strings: Observable<Message>,
    /// The first `number_limit` messages carrying a number payload.
    pub first_numbers: Observable<Message>,
}

impl MessagePipeline {
    pub fn build(
        source: Observable<String>,
        config: &ClientConfig,
        sink: Rc<dyn OutputSink>,
    ) -> Self {
        let (s1, s2, s3) = (Rc::clone(&sink), Rc::clone(&sink), sink);

        let valid_json = source
            .filter(|raw| is_valid_json(raw))
            .tap(move |raw| s1.write_line(&format!("validJsonObservable: {raw}")));

        let parsed_json = valid_json
            .try_map(|raw| serde_json::from_str::<Value>(&raw))
            .tap(move |value| s2.write_line(&format!("parsedJsonObservable: {value}")));

        let valid_message = parsed_json
            .filter(is_message)
            .tap(move |value| s3.write_line(&format!("validMessageObservable: {value}")))
            .try_map(parse_message);

        let shared = valid_message.share();

        let first_strings = shared
            .clone()
            .filter(|m| m.string_data().is_some())
            .take(config.string_limit);

        let first_numbers = shared
            .clone()
            .filter(|m| m.number_data().is_some())
            .take(config.number_limit);

        MessagePipeline {
            shared,
            first_strings,
            first_numbers,
        }
    }

    /// Subscribes the string and number observers, which report to `sink`.
    ///
    /// Returns the string subscription and the number subscription, in that order.
    pub fn run(&self, sink: Rc<dyn OutputSink>) -> (Subscription, Subscription) {
        let (s1, s2, s3, s4) = (Rc::clone(&sink), Rc::clone(&sink), Rc::clone(&sink), sink);

        let mut string_observer = Subscriber::on_next(move |m: Message| {
            s1.write_line(&format!(
                "string observer: {}",
                m.string_data().unwrap_or_default()
            ));
        });
        string_observer.on_complete(move || s2.write_line("string observer complete"));

        let mut number_observer = Subscriber::on_next(move |m: Message| {
            let data = m.number_data().map(ToString::to_string).unwrap_or_default();
            s3.write_line(&format!("number observer: {data}"));
        });
        number_observer.on_complete(move || s4.write_line("number observer complete"));

        (
            self.first_strings.subscribe(string_observer),
            self.first_numbers.subscribe(number_observer),
        )
    }
}
