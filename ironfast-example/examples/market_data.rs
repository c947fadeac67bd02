//! FAST market data example.
//!
//! Builds an incremental-refresh template, encodes a synthetic stream of
//! book updates, decodes it again with an independent decoder and reports
//! how many bytes the operators saved.

mod common;

use common::{ExampleConfig, init_logging, wire_hex};
use ironfast::prelude::*;
use tracing::{debug, info};

const REFRESH_TEMPLATE_ID: u32 = 1;

/// Incremental refresh: sequence number, send time and a list of entries.
fn refresh_template() -> Result<MessageTemplate> {
    let seq_num = Scalar::new("MsgSeqNum", FastType::U32, Operator::Increment, None, false)?;
    let sending_time = Scalar::new("SendingTime", FastType::U64, Operator::Delta, None, false)?;

    let action = Scalar::new(
        "MDUpdateAction",
        FastType::U32,
        Operator::Copy,
        Some(ScalarValue::Integer(1)),
        false,
    )?;
    let symbol = Scalar::new("Symbol", FastType::Ascii, Operator::Copy, None, false)?;
    let price = ComposedScalar::decimal(
        "MDEntryPx",
        (Operator::Copy, Some(-2)),
        (Operator::Delta, None),
        false,
    )?;
    let size = Scalar::new("MDEntrySize", FastType::U64, Operator::Delta, None, false)?;
    let level = Scalar::new("MDPriceLevel", FastType::U32, Operator::Increment, None, true)?;
    let entries = Sequence::new(
        "MDEntries",
        vec![
            action.into(),
            symbol.into(),
            price.into(),
            size.into(),
            level.into(),
        ],
        false,
    )?;

    MessageTemplate::new(
        "MDIncRefresh",
        REFRESH_TEMPLATE_ID,
        vec![seq_num.into(), sending_time.into(), entries.into()],
    )
}

fn entry(symbol: &str, mantissa: i64, size: i64, level: i64) -> GroupValue {
    GroupValue::with_values(vec![
        Some(FieldValue::from(1)),
        Some(FieldValue::from(symbol)),
        Some(ScalarValue::decimal(-2, mantissa).into()),
        Some(FieldValue::from(size)),
        Some(FieldValue::from(level)),
    ])
}

/// Generates a deterministic stream of book updates.
fn generate(config: &ExampleConfig) -> Vec<Message> {
    let mut messages = Vec::with_capacity(config.messages);
    let mut time: i64 = 20_261_019_093_000_000;

    for i in 0..config.messages {
        let step = i64::try_from(i).unwrap_or(i64::MAX);
        time += 250 + step % 7;
        let symbol = &config.symbols[i % config.symbols.len()];
        let base = 594_225 + (step % 40) - 20;

        let entries: SequenceValue = (0..3)
            .map(|level| entry(symbol, base + level, 10 + (step + level) % 25, level + 1))
            .collect();

        let mut message = Message::new(REFRESH_TEMPLATE_ID, 3);
        message.set(0, step + 1);
        message.set(1, time);
        message.set(2, entries);
        messages.push(message);
    }
    messages
}

/// Size of the same data as fixed-width binary, for comparison.
fn fixed_width_size(message: &Message) -> usize {
    let entries = message
        .get(2)
        .and_then(FieldValue::as_sequence)
        .map_or(0, SequenceValue::len);
    4 + 8 + 4 + entries * (4 + 8 + 4 + 8 + 8 + 4)
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = ExampleConfig::from_env();
    info!(
        messages = config.messages,
        symbols = ?config.symbols,
        "generating market data"
    );

    let mut encoder = FastEncoder::with_config(config.context.clone());
    encoder.register_template(refresh_template()?)?;
    let mut decoder = FastDecoder::with_config(config.context.clone());
    decoder.register_template(refresh_template()?)?;

    let messages = generate(&config);
    let mut stream = Vec::new();
    let mut fixed = 0;
    for (i, message) in messages.iter().enumerate() {
        let bytes = encoder.encode(message)?;
        if i < 3 {
            info!(seq = i + 1, bytes = bytes.len(), "encoded {}", wire_hex(&bytes));
        }
        fixed += fixed_width_size(message);
        stream.extend_from_slice(&bytes);
    }

    let mut input = bytes::Bytes::from(stream.clone());
    let decoded = decoder.decode_all(&mut input)?;
    anyhow::ensure!(decoded == messages, "decoded stream differs from input");
    debug!(decoded = decoded.len(), "stream verified");

    info!(
        messages = messages.len(),
        fast_bytes = stream.len(),
        fixed_bytes = fixed,
        "ratio {:.2}",
        fixed as f64 / stream.len().max(1) as f64
    );

    // A new stream segment starts from empty dictionaries on both sides.
    encoder.reset();
    decoder.reset();
    let first = encoder.encode(&messages[0])?;
    let again = decoder.decode(&mut first.as_slice())?;
    anyhow::ensure!(again == messages[0], "decoded message differs after reset");
    info!(bytes = first.len(), "re-encoded first message after reset");

    Ok(())
}
