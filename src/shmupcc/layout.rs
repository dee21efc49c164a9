//! Record layouts of the shmupcc `.sht` file. All values are big-endian.
//!
//! File order: [HEADER], option records, a table of `2 * num_power_levels`
//! shooter counts (u16, unfocused/focused per level), shooter records.

use std::sync::LazyLock;

use crate::{
    binary::{Endianness, PrimitiveType::*},
    schema::{FieldSpec, StructSchema},
};

pub const ENDIANNESS: Endianness = Endianness::Big;

pub const NUM_SHOOTERSETS: &str = "num_shootersets";
pub const NUM_STATIC_OPTIONS: &str = "num_static_options";
pub const NUM_POWER_LEVELS: &str = "num_power_levels";

pub const ALL_POWER: &str = "all_power";
pub const UNFOCUSED: &str = "unfocused";
pub const FOCUSED: &str = "focused";

/// High bit of `num_static_options`: one option set shared by every power level.
pub const STATIC_OPTIONS_FLAG: u8 = 0x80;
pub const STATIC_OPTIONS_MASK: u8 = 0x7F;

pub static HEADER: LazyLock<StructSchema> = LazyLock::new(|| {
    StructSchema::new(vec![
        FieldSpec::primitive("version_num", I16),
        FieldSpec::primitive(NUM_SHOOTERSETS, I16),
        FieldSpec::primitive("dmg_cap_type", I16),
        FieldSpec::primitive("dmg_cap_val", I16),
        FieldSpec::primitive("hitbox", F64),
        FieldSpec::primitive("grazebox", F64),
        FieldSpec::primitive("itembox", F64),
        FieldSpec::primitive("move_uf", F64),
        FieldSpec::primitive("move_f", F64),
        FieldSpec::primitive("option_behavior", U16),
        FieldSpec::primitive(NUM_POWER_LEVELS, U8),
        FieldSpec::primitive("deathbomb_window", U8),
        FieldSpec::primitive("option_move_type", U8),
        FieldSpec::primitive(NUM_STATIC_OPTIONS, U8),
        FieldSpec::primitive("unused1", U8).reserved(),
        FieldSpec::primitive("unused2", U8).reserved(),
    ])
});

pub static OPTION: LazyLock<StructSchema> = LazyLock::new(|| {
    StructSchema::new(vec![
        FieldSpec::primitive("x", F64),
        FieldSpec::primitive("y", F64),
    ])
});

pub static SHOOTER: LazyLock<StructSchema> = LazyLock::new(|| {
    StructSchema::new(vec![
        FieldSpec::primitive("fire_rate", I16),
        FieldSpec::primitive("start_delay", I16),
        FieldSpec::primitive("damage", I32),
        FieldSpec::primitive("off_x", F64),
        FieldSpec::primitive("off_y", F64),
        FieldSpec::primitive("hitbox", F64),
        FieldSpec::primitive("angle", F64),
        FieldSpec::primitive("speed", F64),
        FieldSpec::primitive("size", F64),
        FieldSpec::primitive("option", U8),
        FieldSpec::primitive("anim", U8),
        FieldSpec::primitive("anim_hit", U8),
        FieldSpec::primitive("sfx", U8),
        FieldSpec::primitive("func_init", U32),
        FieldSpec::primitive("func_tick", U32),
        FieldSpec::primitive("func_draw", U32),
        FieldSpec::primitive("func_hit", U32),
        FieldSpec::primitive("unused3", I32).reserved(),
    ])
});

pub fn power_key(level: u8) -> String {
    format!("power_{level}")
}
