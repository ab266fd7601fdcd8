//! Encode a few commands, then replay a synthetic Behavior event stream
//! through a pipeline and print what comes out.
//!
//! Usage: RUST_LOG=harpwire=trace cargo run --example replay

use std::process;

use harpwire::device::{BehaviorCommand, BehaviorEvent, LedArrayCommand, SyringePumpCommand, behavior, led_array};
use harpwire::{Command, Event, Message, PayloadType, Pipeline, Timestamp};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    let commands = [
        Command::Behavior(BehaviorCommand::SetOutput(behavior::PORT0 | behavior::DIGITAL1)),
        Command::Behavior(BehaviorCommand::ColorsRgb {
            selector: behavior::RGB0,
            rgb: vec![0x20, 0x00, 0x40],
        }),
        Command::SyringePump(SyringePumpCommand::ProtocolVolume(12.5)),
        // Clamped to 120, logged at debug.
        Command::LedArray(LedArrayCommand::Intensity {
            selector: led_array::INDEX0,
            value: 200,
        }),
    ];
    for cmd in &commands {
        println!("{}", cmd.debug_hex()?);
    }

    // Rejected before any frame exists.
    let bad = Command::SyringePump(SyringePumpCommand::ProtocolVolume(0.3));
    if let Err(e) = bad.encode() {
        println!("rejected: {e}");
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    let mut pipe = Pipeline::new();
    let port0 = pipe.subscribe(Event::Behavior(BehaviorEvent::Input(behavior::PORT0)).subscription()?);
    let analog = pipe.subscribe(Event::Behavior(BehaviorEvent::AnalogInput).subscription()?);
    pipe.set_on_emit(|e| tracing::info!(subscription = %e.id, value = %e.value, "event"));

    let mut stream = Vec::new();
    for (i, inputs) in [0u8, 1, 1, 1, 0, 0, 1].into_iter().enumerate() {
        let ts = Timestamp::new(10, (i as u16) * 1000);
        stream.push(Message::event(behavior::REG_INPUTS, PayloadType::U8, ts, vec![inputs])?.encode());
        let counts = 1986u16 + i as u16;
        let mut payload = counts.to_le_bytes().to_vec();
        payload.extend_from_slice(&0i16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        stream.push(Message::event(behavior::REG_ANALOG, PayloadType::S16, ts, payload)?.encode());
    }
    // One frame damaged in transit; the pipeline logs it and moves on.
    if let Some(frame) = stream.get_mut(3) {
        frame[2] ^= 0xFF;
    }

    let mut edges = 0;
    let mut samples = 0;
    for raw in &stream {
        for emission in pipe.push_raw(raw) {
            if emission.id == port0 {
                edges += 1;
            } else if emission.id == analog {
                samples += 1;
            }
        }
    }
    println!(
        "{} frames in, {} port0 edges, {} analog samples, {} dropped",
        stream.len(),
        edges,
        samples,
        pipe.dropped_frames()
    );
    Ok(())
}
