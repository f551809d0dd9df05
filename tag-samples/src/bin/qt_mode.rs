//! Demonstrates QT mode transitions on Monza-class tags: flip between
//! the public and private memory maps under an access password, reading
//! back the population with TID filters along the way.

use std::time::Duration;

use clap::Parser;
use tag_protocol::{
    bytes_to_hex, EmbeddedResult, Gen2Bank, Gen2Session, QtControl, QtPayload, RadioConfig,
    ReadPlan, TagFilter, TagOp, TagProtocol,
};
use tag_samples::cli::{self, SampleArgs};
use tag_session::ReaderSession;

/// Vendor TID header the filters select on
const TID_HEADER: [u8; 4] = [0xE2, 0x80, 0x11, 0x05];

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

fn qt_write(access_password: u32, public_map: bool) -> TagOp {
    TagOp::QtReadWrite {
        access_password,
        payload: QtPayload {
            public_map,
            short_range: false,
        },
        control: QtControl {
            read_write: true,
            persistence: true,
        },
    }
}

async fn read_and_print(session: &mut ReaderSession, heading: &str) -> anyhow::Result<()> {
    println!("{}", heading);
    let records = session.read_for(Duration::from_millis(1000)).await?;
    for record in &records {
        println!("  epc: {}", record.epc_hex());
    }
    if records.is_empty() {
        println!("  (no tags)");
    }
    Ok(())
}

async fn run(session: &mut ReaderSession, args: &SampleArgs) -> anyhow::Result<()> {
    session.ensure_region().await?;

    // Radio setup: full power, first antenna for tag operations, S0
    let power = session.max_power_cdbm().await?;
    let antennas = args.antennas();
    let tagop_antenna = antennas.first().copied().unwrap_or(1);
    let access_password = 0;

    session
        .set_radio_config(RadioConfig {
            tagop_antenna: Some(tagop_antenna),
            session: Gen2Session::S0,
            read_power_cdbm: power,
            write_power_cdbm: power,
        })
        .await?;

    session
        .apply_plan(&ReadPlan::new(antennas.clone(), TagProtocol::Gen2))
        .await?;
    read_and_print(session, "Reading the tag population before any QT change").await?;

    println!("Changing to private mode");
    session
        .execute(&qt_write(access_password, false), None)
        .await?;

    // The private map exposes the serialized TID; select on the vendor
    // header with the tags quiet between rounds
    session
        .set_radio_config(RadioConfig {
            tagop_antenna: Some(tagop_antenna),
            session: Gen2Session::S2,
            read_power_cdbm: power,
            write_power_cdbm: power,
        })
        .await?;
    let tid_filter = TagFilter::select(false, Gen2Bank::Tid, 0, 32, TID_HEADER.to_vec());
    session
        .apply_plan(
            &ReadPlan::new(antennas.clone(), TagProtocol::Gen2).with_filter(tid_filter.clone()),
        )
        .await?;
    read_and_print(session, "Reading tags in private mode with session S2").await?;

    // Inverted filter: everything outside the vendor TID space
    session
        .set_radio_config(RadioConfig {
            tagop_antenna: Some(tagop_antenna),
            session: Gen2Session::S0,
            read_power_cdbm: power,
            write_power_cdbm: power,
        })
        .await?;
    let inverted = TagFilter::select(true, Gen2Bank::Tid, 0, 32, TID_HEADER.to_vec());
    session
        .apply_plan(&ReadPlan::new(antennas.clone(), TagProtocol::Gen2).with_filter(inverted))
        .await?;
    read_and_print(session, "Reading tags outside the vendor TID space").await?;

    println!("Converting to public mode");
    session
        .execute(&qt_write(access_password, true), None)
        .await?;

    session
        .apply_plan(&ReadPlan::new(antennas.clone(), TagProtocol::Gen2).with_filter(tid_filter))
        .await?;
    read_and_print(
        session,
        "Reading with the TID filter after the change (the converted tag hides its TID)",
    )
    .await?;

    // Non-persistent QT read: report the control word without changing it
    let records = session
        .execute(
            &TagOp::QtReadWrite {
                access_password,
                payload: QtPayload::default(),
                control: QtControl {
                    read_write: false,
                    persistence: false,
                },
            },
            None,
        )
        .await?;
    if let Some(EmbeddedResult::Data(word)) = records.first().map(|r| &r.data) {
        println!("QT control word: {}", bytes_to_hex(word));
    }
    Ok(())
}
