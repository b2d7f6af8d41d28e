use getopts::Options;
use hdrhistogram::Histogram as HdrHistogram;
use log::{error, info};
use metrics_views::{
    Aggregation, BucketBoundaries, MeasureDouble, Registry, Tag, ViewDescriptor, ViewHandle,
};
use portable_atomic::AtomicU64;
use quanta::{Clock, Instant as QuantaInstant};
use std::{
    env,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

const LOOP_SAMPLE: u64 = 1000;
const REGIONS: [&str; 4] = ["us", "eu", "ap", "sa"];

static STATIC_TAGS: [[Tag; 2]; 4] = [
    [Tag::from_static_parts("region", "us"), Tag::from_static_parts("method", "GET")],
    [Tag::from_static_parts("region", "eu"), Tag::from_static_parts("method", "GET")],
    [Tag::from_static_parts("region", "ap"), Tag::from_static_parts("method", "PUT")],
    [Tag::from_static_parts("region", "sa"), Tag::from_static_parts("method", "PUT")],
];

/// Reads back every view on a fixed cadence, the way an exporter would.
pub struct Controller {
    registry: Arc<Registry>,
    handles: Vec<ViewHandle>,
}

impl Controller {
    /// Takes a snapshot of every view, returning the total number of rows seen.
    pub fn snapshot(&self) -> usize {
        self.handles
            .iter()
            .filter_map(|handle| self.registry.view_data(*handle))
            .map(|data| data.values().len())
            .sum()
    }
}

/// Builds `count` structurally distinct views over `measure`.
fn views(measure: MeasureDouble, count: usize) -> Vec<ViewDescriptor> {
    (0..count)
        .map(|idx| {
            let builder =
                ViewDescriptor::builder().name(format!("latency_{}", idx)).measure(measure);
            let builder = match idx % 4 {
                0 => builder.aggregation(Aggregation::Sum).column("region"),
                1 => builder.aggregation(Aggregation::Count).columns(["region", "method"]),
                2 => {
                    let bounds = BucketBoundaries::exponential(16, 1.0, 2.0)
                        .expect("exponential boundaries should be valid");
                    builder.aggregation(Aggregation::Distribution(bounds)).column("method")
                }
                _ => builder.aggregation(Aggregation::LastValue).column("region"),
            };
            // Later rounds differ by window length so that no two views are shared.
            let builder = match idx / 4 {
                0 => builder,
                round => builder.interval(Duration::from_secs(round as u64)),
            };
            builder.build().expect("benchmark views should be valid")
        })
        .collect()
}

struct Generator {
    t0: Option<QuantaInstant>,
    registry: Arc<Registry>,
    measure: MeasureDouble,
    hist: HdrHistogram<u64>,
    done: Arc<AtomicBool>,
    rate_counter: Arc<AtomicU64>,
}

impl Generator {
    fn new(
        registry: Arc<Registry>,
        measure: MeasureDouble,
        done: Arc<AtomicBool>,
        rate_counter: Arc<AtomicU64>,
    ) -> Generator {
        Generator {
            t0: None,
            registry,
            measure,
            hist: HdrHistogram::<u64>::new_with_bounds(1, u64::MAX, 3).unwrap(),
            done,
            rate_counter,
        }
    }

    fn run_slow(&mut self) {
        let clock = Clock::new();
        let mut loop_counter = 0;

        loop {
            loop_counter += 1;

            let t1 = clock.now();

            if let Some(t0) = self.t0 {
                let start = if loop_counter % LOOP_SAMPLE == 0 { Some(clock.now()) } else { None };

                let region = REGIONS[(loop_counter % 4) as usize];
                let tags = vec![Tag::new("region", region.to_owned()), Tag::new("method", "GET")];
                let elapsed = (t1 - t0).as_nanos() as f64;
                self.registry.record(&[self.measure.measurement(elapsed)], &tags, t1);

                if let Some(val) = start {
                    let delta = clock.now() - val;
                    self.hist.saturating_record(delta.as_nanos() as u64);

                    // We also increment our global counter for the sample rate here.
                    self.rate_counter.fetch_add(LOOP_SAMPLE, Ordering::AcqRel);

                    if self.done.load(Ordering::Relaxed) {
                        break;
                    }
                }
            }

            self.t0 = Some(t1);
        }
    }

    fn run_fast(&mut self) {
        let clock = Clock::new();
        let mut loop_counter = 0;

        loop {
            loop_counter += 1;

            let t1 = clock.now();

            if let Some(t0) = self.t0 {
                let start = if loop_counter % LOOP_SAMPLE == 0 { Some(clock.now()) } else { None };

                let tags = &STATIC_TAGS[(loop_counter % 4) as usize];
                let elapsed = (t1 - t0).as_nanos() as f64;
                self.registry.record(&[self.measure.measurement(elapsed)], tags, t1);

                if let Some(val) = start {
                    let delta = clock.now() - val;
                    self.hist.saturating_record(delta.as_nanos() as u64);

                    // We also increment our global counter for the sample rate here.
                    self.rate_counter.fetch_add(LOOP_SAMPLE, Ordering::AcqRel);

                    if self.done.load(Ordering::Relaxed) {
                        break;
                    }
                }
            }

            self.t0 = Some(t1);
        }
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        info!(
            "    sender latency: min: {:8} p50: {:8} p95: {:8} p99: {:8} p999: {:8} max: {:8}",
            nanos_to_readable(self.hist.min()),
            nanos_to_readable(self.hist.value_at_percentile(50.0)),
            nanos_to_readable(self.hist.value_at_percentile(95.0)),
            nanos_to_readable(self.hist.value_at_percentile(99.0)),
            nanos_to_readable(self.hist.value_at_percentile(99.9)),
            nanos_to_readable(self.hist.max())
        );
    }
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options]", program);
    print!("{}", opts.usage(&brief));
}

pub fn opts() -> Options {
    let mut opts = Options::new();

    opts.optopt("d", "duration", "number of seconds to run the benchmark", "INTEGER");
    opts.optopt(
        "m",
        "mode",
        "whether to run the benchmark in slow or fast mode (owned vs static tags)",
        "STRING",
    );
    opts.optopt("p", "producers", "number of producers", "INTEGER");
    opts.optopt("v", "views", "number of distinct views on the measure", "INTEGER");
    opts.optflag("h", "help", "print this help menu");

    opts
}

fn parse_opt(matches: &getopts::Matches, name: &str, default: usize) -> Option<usize> {
    match matches.opt_str(name) {
        None => Some(default),
        Some(value) => match value.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Invalid value for --{}: {}", name, e);
                None
            }
        },
    }
}

fn main() {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = &args[0];
    let opts = opts();

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            error!("Failed to parse command line args: {}", f);
            return;
        }
    };

    if matches.opt_present("help") {
        print_usage(program, &opts);
        return;
    }

    info!("metrics-views benchmark");

    let (seconds, producers, view_count) = match (
        parse_opt(&matches, "duration", 60),
        parse_opt(&matches, "producers", 1),
        parse_opt(&matches, "views", 4),
    ) {
        (Some(seconds), Some(producers), Some(views)) => (seconds, producers, views),
        _ => return,
    };
    let mode = matches
        .opt_str("mode")
        .map(|s| if s.to_ascii_lowercase() == "fast" { "fast" } else { "slow" })
        .unwrap_or("slow")
        .to_owned();

    info!("duration: {}s", seconds);
    info!("producers: {}", producers);
    info!("views: {}", view_count);
    info!("mode: {}", mode);

    let registry = Arc::new(Registry::new());
    let latency: MeasureDouble = registry
        .register_measure("loop_latency", "time between producer loop iterations", "ns")
        .expect("failed to register measure");
    let handles = views(latency, view_count)
        .iter()
        .filter_map(|descriptor| registry.add_consumer(descriptor))
        .collect::<Vec<_>>();
    let controller = Controller { registry: registry.clone(), handles };

    info!("registry configured with {} views", registry.num_views(latency));

    // Spin up our sample producers.
    let done = Arc::new(AtomicBool::new(false));
    let rate_counter = Arc::new(AtomicU64::new(0));
    let mut handles = Vec::new();

    for _ in 0..producers {
        let reg = registry.clone();
        let d = done.clone();
        let r = rate_counter.clone();
        let mode = mode.clone();
        let handle = thread::spawn(move || {
            let mut gen = Generator::new(reg, latency, d, r);
            if mode == "fast" {
                gen.run_fast();
            } else {
                gen.run_slow();
            }
        });

        handles.push(handle);
    }

    // Poll the controller to figure out the sample rate.
    let mut total = 0;
    let mut t0 = Instant::now();

    let mut snapshot_hist = HdrHistogram::<u64>::new_with_bounds(1, u64::MAX, 3).unwrap();
    for _ in 0..seconds {
        let t1 = Instant::now();

        let start = Instant::now();
        let rows = controller.snapshot();
        let end = Instant::now();
        snapshot_hist.saturating_record(duration_as_nanos(end - start) as u64);

        let turn_total = rate_counter.load(Ordering::Acquire);
        let turn_delta = turn_total - total;
        total = turn_total;
        let rate = turn_delta as f64 / (duration_as_nanos(t1 - t0) / 1_000_000_000.0);

        info!("sample ingest rate: {:.0} samples/sec ({} rows)", rate, rows);
        t0 = t1;
        thread::sleep(Duration::new(1, 0));
    }

    info!("--------------------------------------------------------------------------------");
    info!(" ingested samples total: {}", total);
    info!(
        "   view snapshots: min: {:8} p50: {:8} p95: {:8} p99: {:8} p999: {:8} max: {:8}",
        nanos_to_readable(snapshot_hist.min()),
        nanos_to_readable(snapshot_hist.value_at_percentile(50.0)),
        nanos_to_readable(snapshot_hist.value_at_percentile(95.0)),
        nanos_to_readable(snapshot_hist.value_at_percentile(99.0)),
        nanos_to_readable(snapshot_hist.value_at_percentile(99.9)),
        nanos_to_readable(snapshot_hist.max())
    );

    // Wait for the producers to finish so we can get their stats too.
    done.store(true, Ordering::SeqCst);
    for handle in handles {
        let _ = handle.join();
    }

    for handle in controller.handles.iter() {
        let _ = registry.remove_consumer(*handle);
    }
    info!("views left after detaching: {}", registry.num_views(latency));
}

fn duration_as_nanos(d: Duration) -> f64 {
    (d.as_secs() as f64 * 1e9) + d.subsec_nanos() as f64
}

fn nanos_to_readable(t: u64) -> String {
    let f = t as f64;
    if f < 1_000.0 {
        format!("{}ns", f)
    } else if f < 1_000_000.0 {
        format!("{:.0}μs", f / 1_000.0)
    } else if f < 2_000_000_000.0 {
        format!("{:.2}ms", f / 1_000_000.0)
    } else {
        format!("{:.3}s", f / 1_000_000_000.0)
    }
}
