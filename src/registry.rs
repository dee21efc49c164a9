use std::{collections::BTreeMap, path::Path};

use bytes::Bytes;
use serde_json::Value;

use crate::{error::Result, shmupcc};

pub type DecodeFn = fn(&Path) -> Result<Value>;
pub type EncodeFn = fn(&Value) -> Result<Bytes>;

/// Decoder and encoder of one file version.
#[derive(Clone, Copy)]
pub struct Codec {
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

/// Version names selectable from the command line.
#[derive(Default)]
pub struct Registry {
    codecs: BTreeMap<&'static str, Codec>,
}

impl Registry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(
            shmupcc::VERSION_NAME,
            Codec {
                decode: shmupcc::decode_file,
                encode: shmupcc::encode,
            },
        );
        registry
    }

    pub fn register(&mut self, name: &'static str, codec: Codec) -> Option<Codec> {
        self.codecs.insert(name, codec)
    }

    pub fn get(&self, name: &str) -> Option<Codec> {
        self.codecs.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.codecs.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;

    #[test]
    fn builtin_versions() {
        let registry = Registry::new();
        assert!(registry.get("shmupcc").is_some());
        assert!(registry.get("th06").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), ["shmupcc"]);
    }

    #[test]
    fn empty_by_default() {
        assert_eq!(Registry::default().names().count(), 0);
    }
}
