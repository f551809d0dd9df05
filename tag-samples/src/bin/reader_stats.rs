//! Reads tags, then fetches and prints the reader statistics snapshot.

use std::time::Duration;

use clap::Parser;
use tag_protocol::{ReadPlan, ReaderFamily, StatsFlags, TagProtocol};
use tag_samples::cli::{self, SampleArgs};
use tag_session::ReaderSession;

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

    // The contactless family searches vicinity cards here, everything
    // else searches Gen2
    let protocol = match session.model().map(|m| m.family()) {
        Some(ReaderFamily::ContactlessHfLf) => TagProtocol::Iso15693,
        _ => TagProtocol::Gen2,
    };
    let plan = ReadPlan::new(args.antennas(), protocol);
    session.apply_plan(&plan).await?;

    // Request everything; the device forces temperature and antenna
    // status on regardless
    session.enable_stats(StatsFlags::ALL).await?;

    let records = session.read_for(Duration::from_millis(500)).await?;
    for record in &records {
        println!("{}", record.summary());
    }

    let stats = session.collect_stats().await?;
    print!("{}", stats.render());

    // Return loss sits outside the stats snapshot and only exists on
    // the UHF family
    if session.supports_return_loss() {
        for (antenna, centi_db) in session.antenna_return_loss().await? {
            println!("Antenna [{}] return loss: {} cdB", antenna, centi_db);
        }
    }
    Ok(())
}
