use std::{
    io::{Read, Seek},
    path::Path,
};

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::layout::{
    power_key, ALL_POWER, ENDIANNESS, FOCUSED, HEADER, NUM_POWER_LEVELS, NUM_SHOOTERSETS,
    NUM_STATIC_OPTIONS, OPTION, SHOOTER, STATIC_OPTIONS_FLAG, STATIC_OPTIONS_MASK, UNFOCUSED,
};
use crate::{
    binary::{BinaryReader, PrimitiveType},
    error::Result,
    schema::StructSchema,
};

/// Decodes the `.sht` file at `path` into a document.
pub fn decode_file(path: &Path) -> Result<Value> {
    let mut reader: BinaryReader = BinaryReader::new(ENDIANNESS);
    reader.open(path)?;

    let document = decode(&mut reader);
    reader.close();
    document
}

/// Decodes one `.sht` file from the reader's cursor.
///
/// The binary is trusted: nothing is validated beyond what reading needs.
pub fn decode<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<Value> {
    let mut header = HEADER.read_from(reader)?;
    let power_levels = header_byte(&header, NUM_POWER_LEVELS);
    let static_options = header_byte(&header, NUM_STATIC_OPTIONS);

    let options = read_options(reader, static_options, power_levels)?;

    let stored = header.get(NUM_SHOOTERSETS).and_then(Value::as_i64);
    if stored != Some(2 * power_levels as i64) {
        warn!(
            ?stored,
            power_levels, "shooterset count disagrees with power levels, using 2 per level"
        );
    }
    let shootersets = read_shootersets(reader, power_levels)?;

    if let Value::Object(fields) = &mut header {
        fields.retain(|name, _| name != NUM_SHOOTERSETS && name != NUM_STATIC_OPTIONS);
    }
    debug!(bytes = reader.position(), "decoded");

    Ok(json!({
        "header": header,
        "options": options,
        "shootersets": shootersets,
    }))
}

fn header_byte(header: &Value, name: &str) -> u8 {
    header
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or_default()
}

fn read_records<R: Read + Seek>(
    reader: &mut BinaryReader<R>,
    schema: &StructSchema,
    count: usize,
) -> Result<Vec<Value>> {
    (0..count).map(|_| schema.read_from(reader)).collect()
}

fn set(unfocused: Vec<Value>, focused: Vec<Value>) -> Value {
    let mut set = Map::new();
    set.insert(UNFOCUSED.to_owned(), unfocused.into());
    set.insert(FOCUSED.to_owned(), focused.into());
    Value::Object(set)
}

/// Options are grouped by focus state first, power level second.
fn read_options<R: Read + Seek>(
    reader: &mut BinaryReader<R>,
    static_options: u8,
    power_levels: u8,
) -> Result<Map<String, Value>> {
    let mut options = Map::new();

    if static_options & STATIC_OPTIONS_FLAG != 0 {
        let count = (static_options & STATIC_OPTIONS_MASK) as usize;
        debug!(count, "static option layout");

        let unfocused = read_records(reader, &OPTION, count)?;
        let focused = read_records(reader, &OPTION, count)?;
        options.insert(ALL_POWER.to_owned(), set(unfocused, focused));
    } else {
        debug!(power_levels, "per-power option layout");

        let unfocused = (1..=power_levels)
            .map(|level| read_records(reader, &OPTION, level as usize))
            .collect::<Result<Vec<_>>>()?;
        let focused = (1..=power_levels)
            .map(|level| read_records(reader, &OPTION, level as usize))
            .collect::<Result<Vec<_>>>()?;

        for ((level, unfocused), focused) in (1..=power_levels).zip(unfocused).zip(focused) {
            options.insert(power_key(level), set(unfocused, focused));
        }
    }

    Ok(options)
}

/// Count table first, then every unfocused set in level order, then every focused set.
fn read_shootersets<R: Read + Seek>(
    reader: &mut BinaryReader<R>,
    power_levels: u8,
) -> Result<Map<String, Value>> {
    let mut counts = Vec::with_capacity(power_levels as usize);
    for _ in 0..power_levels {
        let unfocused = read_count(reader)?;
        let focused = read_count(reader)?;
        counts.push((unfocused, focused));
    }
    debug!(?counts, "shooter counts");

    let unfocused = counts
        .iter()
        .map(|(count, _)| read_records(reader, &SHOOTER, *count))
        .collect::<Result<Vec<_>>>()?;
    let focused = counts
        .iter()
        .map(|(_, count)| read_records(reader, &SHOOTER, *count))
        .collect::<Result<Vec<_>>>()?;

    let mut shootersets = Map::new();
    for ((level, unfocused), focused) in (1..=power_levels).zip(unfocused).zip(focused) {
        shootersets.insert(power_key(level), set(unfocused, focused));
    }

    Ok(shootersets)
}

fn read_count<R: Read + Seek>(reader: &mut BinaryReader<R>) -> Result<usize> {
    let count = reader.read(PrimitiveType::U16)?;
    Ok(count.as_u64().unwrap_or_default() as usize)
}
