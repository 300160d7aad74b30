use std::{rc::Rc, time::Duration};

use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tracing::info;

use rxlite::{
    message_client::{client_observable, ClientConfig, MessagePipeline},
    scheduler::{Scheduler, TokioScheduler},
    sink::{OutputSink, StdoutSink},
    sources::{from_iter, poll_every},
    subscribe::{Subscriber, Teardown},
    Observable, Subscribeable, Unsubscribeable,
};

#[derive(Parser, Debug)]
#[command(name = "rxlite-demo", version, about = "Runs the rxlite demo pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Subscribe to an observable emitting 1, 2 and 3.
    Basic,
    /// Emit a random number every period, unsubscribe after a while.
    Polling {
        #[arg(long, default_value_t = 1000)]
        period_ms: u64,
        #[arg(long, default_value_t = 5000)]
        duration_ms: u64,
    },
    /// Run the mock message client through the message pipeline.
    Messages {
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Give up after this long even if the pipeline has not completed.
        #[arg(long, default_value_t = 60_000)]
        timeout_ms: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting rxlite demo v{}", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(cli.command))
}

async fn run(command: Command) -> anyhow::Result<()> {
    let sink: Rc<dyn OutputSink> = Rc::new(StdoutSink);
    let scheduler: Rc<dyn Scheduler> = Rc::new(TokioScheduler::new());

    match command {
        Command::Basic => basic(sink),
        Command::Polling {
            period_ms,
            duration_ms,
        } => {
            polling(
                scheduler,
                sink,
                Duration::from_millis(period_ms),
                Duration::from_millis(duration_ms),
            )
            .await;
        }
        Command::Messages {
            interval_ms,
            seed,
            timeout_ms,
        } => {
            let config = ClientConfig {
                interval: Duration::from_millis(interval_ms),
                seed,
                ..ClientConfig::default()
            };
            messages(config, scheduler, sink, Duration::from_millis(timeout_ms)).await;
        }
    }
    Ok(())
}

fn observer_for<T: std::fmt::Display + 'static>(sink: &Rc<dyn OutputSink>) -> Subscriber<T> {
    let (s_next, s_error, s_complete) = (Rc::clone(sink), Rc::clone(sink), Rc::clone(sink));
    Subscriber::new(
        move |v: T| s_next.write_line(&v.to_string()),
        move |e| s_error.write_line(&e.to_string()),
        move || s_complete.write_line("complete"),
    )
}

fn basic(sink: Rc<dyn OutputSink>) {
    from_iter([1, 2, 3]).subscribe(observer_for(&sink));
}

async fn polling(
    scheduler: Rc<dyn Scheduler>,
    sink: Rc<dyn OutputSink>,
    period: Duration,
    duration: Duration,
) {
    let subscribing_sink = Rc::clone(&sink);
    let unsubscribe_sink = Rc::clone(&sink);

    let random_numbers = poll_every(scheduler, period, rand::random::<f64>);
    let observable = Observable::new(move |o: Subscriber<f64>| {
        subscribing_sink.write_line("subscribing");
        // `o` keeps its subscription, so the polling teardown joins this one.
        random_numbers.subscribe(o);

        let sink = Rc::clone(&unsubscribe_sink);
        Teardown::from_fn(move || sink.write_line("unsubscribe"))
    });

    let subscription = observable.subscribe(observer_for(&sink));
    tokio::time::sleep(duration).await;
    subscription.unsubscribe();
}

async fn messages(
    config: ClientConfig,
    scheduler: Rc<dyn Scheduler>,
    sink: Rc<dyn OutputSink>,
    timeout: Duration,
) {
    let source = client_observable(config.clone(), scheduler, Rc::clone(&sink));
    let pipeline = MessagePipeline::build(source, &config, Rc::clone(&sink));
    let (strings, numbers) = pipeline.run(sink);

    // Both teardowns run when their branch closes, completed or not.
    let closed = Rc::new(Notify::new());
    for subscription in [&strings, &numbers] {
        let closed = Rc::clone(&closed);
        subscription.add(Teardown::from_fn(move || closed.notify_one()));
    }

    let finished = tokio::time::timeout(timeout, async {
        while !(strings.is_closed() && numbers.is_closed()) {
            closed.notified().await;
        }
    })
    .await;

    if finished.is_err() {
        info!("message pipeline did not complete in {:?}, unsubscribing", timeout);
        strings.unsubscribe();
        numbers.unsubscribe();
    }
}
