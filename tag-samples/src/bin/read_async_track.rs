//! Reads tags in the background and tracks which have been seen,
//! printing only the tags that have not been seen before.

use std::time::Duration;

use clap::Parser;
use tag_protocol::{ReadPlan, TagReadRecord};
use tag_samples::cli::{self, SampleArgs};
use tag_session::{ReaderSession, TagTracker};

#[tokio::main]
async fn main() {
    cli::init_tracing();
    let args = SampleArgs::parse();

    let mut session = match cli::connect(&args).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error connecting reader: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = run(&mut session, &args).await;
    session.close().await;
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(session: &mut ReaderSession, args: &SampleArgs) -> anyhow::Result<()> {
    session.ensure_region().await?;

    let plan = ReadPlan::new(args.antennas(), session.default_protocol());
    session.apply_plan(&plan).await?;

    let mut tracker = TagTracker::new();
    let mut stream = session.start_reading().await?;

    // Run for a while so we see some tags repeatedly
    let window = tokio::time::sleep(Duration::from_millis(1000));
    tokio::pin!(window);
    loop {
        tokio::select! {
            _ = &mut window => break,
            record = stream.recv() => match record {
                Some(record) => observe(&mut tracker, &record),
                None => break,
            },
        }
    }

    // Whatever was still in flight at stop time counts as well
    for record in session.stop_reading(stream).await? {
        observe(&mut tracker, &record);
    }

    println!(
        "Unique Tags: {} Total Tags: {}",
        tracker.unique_count(),
        tracker.total_count()
    );
    Ok(())
}

fn observe(tracker: &mut TagTracker, record: &TagReadRecord) {
    if tracker.observe(record) {
        println!("New tag: {}", record.epc_hex());
    }
}
