//! Performs an embedded tag operation during a read: every tag the
//! search finds also has its TID memory read, with per-tag faults
//! reported inline instead of aborting the batch.

use std::time::Duration;

use clap::Parser;
use tag_protocol::{bytes_to_hex, fault_message, EmbeddedResult, Gen2Bank, ReadPlan, TagOp};
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

    // M6e-class modules expand a zero-length TID read to the bank's
    // full variable-length content; lesser modules need the explicit
    // two-word minimum
    let word_count = if session.supports_full_bank_read() { 0 } else { 2 };
    let op = TagOp::ReadData {
        bank: Gen2Bank::Tid,
        word_address: 0,
        word_count,
    };
    let plan = ReadPlan::new(args.antennas(), session.default_protocol()).with_op(op);
    session.apply_plan(&plan).await?;

    let records = session.read_for(Duration::from_millis(500)).await?;
    for record in &records {
        println!("{}", record.epc_hex());
        match &record.data {
            EmbeddedResult::Data(tid) => {
                println!("  data({}): {}", tid.len(), bytes_to_hex(tid));
            }
            EmbeddedResult::Error(code) => {
                println!(
                    "  embedded tagop failed: 0x{:04X} ({})",
                    code,
                    fault_message(*code)
                );
            }
            EmbeddedResult::None => {}
        }
    }
    Ok(())
}
