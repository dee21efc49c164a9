use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::layout::{
    power_key, ALL_POWER, ENDIANNESS, FOCUSED, HEADER, NUM_POWER_LEVELS, NUM_SHOOTERSETS,
    NUM_STATIC_OPTIONS, OPTION, SHOOTER, STATIC_OPTIONS_FLAG, STATIC_OPTIONS_MASK, UNFOCUSED,
};
use crate::{
    binary::{BinaryWriter, PrimitiveType},
    error::Result,
    schema::{StructSchema, ValidationError},
};

/// Validates an authored document and encodes it.
///
/// Nothing is produced unless the whole document validates. The two derived
/// header fields are always recomputed, whatever the document says.
pub fn encode(document: &Value) -> Result<Bytes> {
    let prepared = Prepared::from_document(document)?;

    let mut writer = BinaryWriter::with_capacity(prepared.byte_size(), ENDIANNESS);
    prepared.write(&mut writer)?;
    debug!(bytes = writer.position(), "encoded");
    Ok(writer.finalize())
}

/// Records of one power level (or of `all_power`), split by focus state.
#[derive(Debug, Clone, Copy)]
struct Set<'a> {
    unfocused: &'a [Value],
    focused: &'a [Value],
}

#[derive(Debug)]
enum OptionLayout<'a> {
    Static(Set<'a>),
    PerPower(Vec<Set<'a>>),
}

/// A validated view of an authored document, with the derived header fields filled in.
#[derive(Debug)]
struct Prepared<'a> {
    header: Value,
    options: OptionLayout<'a>,
    shootersets: Vec<Set<'a>>,
}

impl<'a> Prepared<'a> {
    fn from_document(document: &'a Value) -> Result<Self, ValidationError> {
        let mut header = document
            .get("header")
            .cloned()
            .ok_or_else(|| ValidationError::new("header", "header data is missing"))
            .map_err(|e| e.in_section("sht header"))?;

        // Derived fields only need to exist for the schema check.
        if let Value::Object(fields) = &mut header {
            fields.insert(NUM_SHOOTERSETS.to_owned(), 0.into());
            fields.insert(NUM_STATIC_OPTIONS.to_owned(), 0.into());
        }
        HEADER
            .validate(&header)
            .map_err(|e| e.in_section("sht header"))?;

        let power_levels = header
            .get(NUM_POWER_LEVELS)
            .and_then(Value::as_f64)
            .unwrap_or_default() as u8;

        let options = Self::options(document, power_levels)
            .map_err(|e| e.in_section("sht options"))?;

        let static_options = match &options {
            OptionLayout::Static(set) => set.unfocused.len() as u8 | STATIC_OPTIONS_FLAG,
            OptionLayout::PerPower(_) => 0,
        };
        let num_shootersets = 2 * power_levels as i16;
        debug!(static_options, num_shootersets, "derived header fields");

        if let Value::Object(fields) = &mut header {
            fields.insert(NUM_STATIC_OPTIONS.to_owned(), static_options.into());
            fields.insert(NUM_SHOOTERSETS.to_owned(), num_shootersets.into());
        }

        let shootersets = Self::shootersets(document, power_levels)
            .map_err(|e| e.in_section("sht shootersets"))?;

        Ok(Self {
            header,
            options,
            shootersets,
        })
    }

    fn options(document: &'a Value, power_levels: u8) -> Result<OptionLayout<'a>, ValidationError> {
        let Some(Value::Object(options)) = document.get("options") else {
            return Err(ValidationError::new("options", "option data is missing"));
        };

        if options.contains_key(ALL_POWER) {
            if options.len() != 1 {
                return Err(ValidationError::new(
                    ALL_POWER,
                    "all_power forbids other keys in the option object",
                ));
            }

            let set = validate_set(options, ALL_POWER, &OPTION, "sht options", true)?;
            if set.unfocused.len() > STATIC_OPTIONS_MASK as usize {
                return Err(ValidationError::new(
                    ALL_POWER,
                    format!("at most {STATIC_OPTIONS_MASK} static options are allowed"),
                ));
            }
            return Ok(OptionLayout::Static(set));
        }

        let mut sets = Vec::with_capacity(power_levels as usize);
        for level in 1..=power_levels {
            let key = power_key(level);
            let set = validate_set(options, &key, &OPTION, "sht options", true)?;

            if set.focused.len() != level as usize {
                warn!("error in sht options: {key}: exactly {level} options are required");
            }
            sets.push(set);
        }

        Ok(OptionLayout::PerPower(sets))
    }

    fn shootersets(document: &'a Value, power_levels: u8) -> Result<Vec<Set<'a>>, ValidationError> {
        let Some(Value::Object(shootersets)) = document.get("shootersets") else {
            return Err(ValidationError::new(
                "shootersets",
                "shooterset data is missing",
            ));
        };

        (1..=power_levels)
            .map(|level| {
                let key = power_key(level);
                let set = validate_set(shootersets, &key, &SHOOTER, "sht shootersets", false)?;

                for (name, records) in [(UNFOCUSED, set.unfocused), (FOCUSED, set.focused)] {
                    if records.len() > u16::MAX as usize {
                        return Err(ValidationError::new(
                            format!("{key}.{name}"),
                            format!("at most {} shooters are allowed", u16::MAX),
                        ));
                    }
                }
                Ok(set)
            })
            .collect()
    }

    fn option_sets(&self) -> &[Set<'a>] {
        match &self.options {
            OptionLayout::Static(set) => core::slice::from_ref(set),
            OptionLayout::PerPower(sets) => sets.as_slice(),
        }
    }

    /// Size of the encoded file.
    fn byte_size(&self) -> usize {
        let count = |sets: &[Set<'_>]| -> usize {
            sets.iter().map(|set| set.unfocused.len() + set.focused.len()).sum()
        };

        HEADER.byte_size()
            + count(self.option_sets()) * OPTION.byte_size()
            + self.shootersets.len() * 2 * PrimitiveType::U16.width()
            + count(&self.shootersets) * SHOOTER.byte_size()
    }

    fn write(&self, writer: &mut BinaryWriter) -> Result<(), ValidationError> {
        HEADER
            .write_to(writer, &self.header)
            .map_err(|e| e.in_section("sht header"))?;

        write_grouped(writer, self.option_sets(), &OPTION).map_err(|e| e.in_section("sht options"))?;

        for set in &self.shootersets {
            for records in [set.unfocused, set.focused] {
                writer
                    .write(PrimitiveType::U16, &records.len().into())
                    .map_err(|e| ValidationError::new("shooter counts", e.to_string()))?;
            }
        }
        write_grouped(writer, &self.shootersets, &SHOOTER)
            .map_err(|e| e.in_section("sht shootersets"))
    }
}

/// Every unfocused list in order, then every focused list.
fn write_grouped(
    writer: &mut BinaryWriter,
    sets: &[Set<'_>],
    schema: &StructSchema,
) -> Result<(), ValidationError> {
    let unfocused = sets.iter().flat_map(|set| set.unfocused);
    let focused = sets.iter().flat_map(|set| set.focused);

    unfocused
        .chain(focused)
        .try_for_each(|record| schema.write_to(writer, record))
}

fn validate_set<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    schema: &StructSchema,
    section: &str,
    paired: bool,
) -> Result<Set<'a>, ValidationError> {
    let Some(Value::Object(set)) = parent.get(key) else {
        return Err(ValidationError::new(
            key,
            "does not exist or is an invalid value",
        ));
    };

    let records = |name: &str| -> Result<&'a [Value], ValidationError> {
        let Some(Value::Array(records)) = set.get(name) else {
            return Err(ValidationError::new(format!("{key}.{name}"), "is not an array"));
        };

        for (i, record) in records.iter().enumerate() {
            schema
                .validate(record)
                .map_err(|e| e.at_index(i).in_section(format!("{section} in {key}.{name}")))?;
        }
        Ok(records.as_slice())
    };

    let set = Set {
        unfocused: records(UNFOCUSED)?,
        focused: records(FOCUSED)?,
    };

    if paired && set.unfocused.len() != set.focused.len() {
        return Err(ValidationError::new(
            key,
            "focused and unfocused count does not match",
        ));
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{encode, Prepared};

    #[test]
    fn byte_size_matches_output() {
        let option = json!({"x": 1.0, "y": -1.0});
        let shooter = json!({
            "fire_rate": 4, "start_delay": 0, "damage": 12,
            "off_x": 0.0, "off_y": 0.0, "hitbox": 3.0, "angle": 270.0, "speed": 10.0, "size": 1.0,
            "option": 0, "anim": 0, "anim_hit": 0, "sfx": 0,
            "func_init": 0, "func_tick": 0, "func_draw": 0, "func_hit": 0,
        });
        let header = json!({
            "version_num": 1, "dmg_cap_type": 0, "dmg_cap_val": 0,
            "hitbox": 2.0, "grazebox": 20.0, "itembox": 40.0, "move_uf": 5.0, "move_f": 2.0,
            "option_behavior": 0, "num_power_levels": 2, "deathbomb_window": 15, "option_move_type": 0,
        });

        let per_power = json!({
            "header": header,
            "options": {
                "power_1": {"unfocused": [option], "focused": [option]},
                "power_2": {"unfocused": [option, option], "focused": [option, option]},
            },
            "shootersets": {
                "power_1": {"unfocused": [shooter, shooter], "focused": []},
                "power_2": {"unfocused": [], "focused": [shooter]},
            },
        });
        let mut static_options = per_power.clone();
        static_options["options"] = json!({"all_power": {"unfocused": [], "focused": []}});

        for (document, size) in [
            (per_power, 56 + 6 * 16 + 4 * 2 + 3 * 80),
            (static_options, 56 + 4 * 2 + 3 * 80),
        ] {
            let prepared = Prepared::from_document(&document).unwrap();
            assert_eq!(prepared.byte_size(), size);
            assert_eq!(encode(&document).unwrap().len(), size);
        }
    }
}
