//! Reads tags for a fixed window and prints every record seen.

use std::time::Duration;

use clap::Parser;
use tag_protocol::ReadPlan;
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
    println!("connected to {}", session.model_name());

    let plan = ReadPlan::new(args.antennas(), session.default_protocol());
    session.apply_plan(&plan).await?;

    let records = session.read_for(Duration::from_millis(500)).await?;
    for record in &records {
        println!("{}", record.summary());
    }
    println!("{} tag read(s)", records.len());
    Ok(())
}
