//! FAST field operators example.
//!
//! Encodes the same short value series under each operator and logs what
//! reaches the wire, showing when a value is elided, copied or sent as a
//! delta.

mod common;

use common::{init_logging, wire_hex};
use ironfast::prelude::*;
use tracing::{info, warn};

fn single_field_template(id: u32, field: Scalar) -> Result<MessageTemplate> {
    MessageTemplate::new(format!("{}Demo", field.operator().name()), id, vec![field.into()])
}

fn run(id: u32, build: impl Fn() -> Result<Scalar>, values: &[ScalarValue]) -> Result<()> {
    let mut encoder = FastEncoder::new();
    encoder.register_template(single_field_template(id, build()?)?)?;
    let mut decoder = FastDecoder::new();
    decoder.register_template(single_field_template(id, build()?)?)?;

    let operator = build()?.operator();
    for value in values {
        let mut message = Message::new(id, 1);
        message.set(0, value.clone());
        let bytes = encoder.encode(&message)?;
        let decoded = decoder.decode(&mut bytes.as_slice())?;
        if decoded != message {
            warn!(operator = operator.name(), %value, "round trip mismatch");
        }
        info!(
            operator = operator.name(),
            %value,
            bytes = bytes.len(),
            "{}",
            wire_hex(&bytes)
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let prices: Vec<ScalarValue> = [942, 942, 943, 945, 945]
        .into_iter()
        .map(ScalarValue::Integer)
        .collect();
    let symbols: Vec<ScalarValue> = ["GEH6", "GEM6", "GEM6", "GEU6"]
        .into_iter()
        .map(ScalarValue::from)
        .collect();

    run(1, || Scalar::new("px", FastType::U32, Operator::None, None, false), &prices)?;
    run(2, || Scalar::new("px", FastType::U32, Operator::Copy, None, false), &prices)?;
    run(
        3,
        || {
            Scalar::new(
                "px",
                FastType::U32,
                Operator::Default,
                Some(ScalarValue::Integer(942)),
                false,
            )
        },
        &prices,
    )?;
    run(4, || Scalar::new("px", FastType::U32, Operator::Increment, None, false), &prices)?;
    run(5, || Scalar::new("px", FastType::I64, Operator::Delta, None, false), &prices)?;
    run(6, || Scalar::new("sym", FastType::Ascii, Operator::Delta, None, false), &symbols)?;
    run(7, || Scalar::new("sym", FastType::Ascii, Operator::Tail, None, false), &symbols)?;

    let registry = TypeRegistry::standard();
    if let Err(e) = registry.get("float") {
        info!(error = %e, "type lookup");
    }

    Ok(())
}
