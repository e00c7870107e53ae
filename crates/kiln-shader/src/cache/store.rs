// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::entry::{decode_entry, encode_entry, MicrocodeEntry};
use super::{cache_read_config, wire_config, CacheError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

fn truncated_hash(hasher: &blake3::Hasher) -> u64 {
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

/// A stable 64-bit hash of a program source.
pub fn source_hash(source: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source.as_bytes());
    truncated_hash(&hasher)
}

/// Identifies one compilation: the target profile and the hash of the
/// source it was compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MicrocodeKey(pub u64);

impl MicrocodeKey {
    pub fn new(profile: &str, source_hash: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(profile.as_bytes());
        hasher.update(&[0]);
        hasher.update(&source_hash.to_le_bytes());
        Self(truncated_hash(&hasher))
    }

    pub fn for_source(profile: &str, source: &str) -> Self {
        Self::new(profile, source_hash(source))
    }

    /// Key for a compiler invocation. The entry point and every argument
    /// take part, so programs sharing one source file get separate slots.
    pub fn for_compilation(
        profile: &str,
        source: &str,
        entry_point: &str,
        args: &[String],
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(profile.as_bytes());
        hasher.update(&[0]);
        hasher.update(&source_hash(source).to_le_bytes());
        hasher.update(entry_point.as_bytes());
        hasher.update(&[0]);
        for arg in args {
            hasher.update(arg.as_bytes());
            hasher.update(&[0]);
        }
        Self(truncated_hash(&hasher))
    }
}

/// In-memory store of encoded microcode blobs.
///
/// Entries are kept encoded so a saved cache can be reloaded without
/// decoding every program up front.
#[derive(Debug, Clone, Default)]
pub struct MicrocodeCache {
    entries: AHashMap<MicrocodeKey, Vec<u8>>,
}

impl MicrocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes and stores `entry`, replacing any previous blob for `key`.
    pub fn add(&mut self, key: MicrocodeKey, entry: &MicrocodeEntry) -> Result<(), CacheError> {
        let blob = encode_entry(entry)?;
        log::debug!(
            "MicrocodeCache: storing {:016x} ({} bytes)",
            key.0,
            blob.len()
        );
        self.entries.insert(key, blob);
        Ok(())
    }

    /// Stores an already encoded blob.
    pub fn add_raw(&mut self, key: MicrocodeKey, blob: Vec<u8>) {
        self.entries.insert(key, blob);
    }

    pub fn get_raw(&self, key: MicrocodeKey) -> Option<&[u8]> {
        self.entries.get(&key).map(Vec::as_slice)
    }

    /// Decodes the blob stored for `key`.
    pub fn get(&self, key: MicrocodeKey) -> Result<Option<MicrocodeEntry>, CacheError> {
        self.get_raw(key).map(decode_entry).transpose()
    }

    /// Like [`get`](Self::get), but a blob that fails to decode counts as a
    /// miss.
    pub fn get_or_decode(&self, key: MicrocodeKey) -> Option<MicrocodeEntry> {
        match self.get(key) {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!(
                    "MicrocodeCache: discarding entry {:016x}: {}",
                    key.0,
                    err
                );
                None
            }
        }
    }

    pub fn contains(&self, key: MicrocodeKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn remove(&mut self, key: MicrocodeKey) -> bool {
        self.entries.remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Writes every entry, sorted by key, to `writer`.
    pub fn save_to<W: Write>(&self, writer: &mut W) -> Result<(), CacheError> {
        let mut sorted: Vec<(&MicrocodeKey, &Vec<u8>)> = self.entries.iter().collect();
        sorted.sort_by_key(|(key, _)| **key);
        let written = bincode::serde::encode_into_std_write(&sorted, writer, wire_config())?;
        log::info!(
            "MicrocodeCache: saved {} entries ({} bytes)",
            sorted.len(),
            written
        );
        Ok(())
    }

    /// Reads a cache written by [`save_to`](Self::save_to).
    pub fn load_from<R: Read>(reader: &mut R) -> Result<Self, CacheError> {
        let entries: Vec<(MicrocodeKey, Vec<u8>)> =
            bincode::serde::decode_from_std_read(reader, cache_read_config())?;
        log::info!("MicrocodeCache: loaded {} entries", entries.len());
        Ok(Self {
            entries: entries.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str) -> MicrocodeEntry {
        MicrocodeEntry {
            program_source: source.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_key_depends_on_profile_and_source() {
        let a = MicrocodeKey::for_source("glsl150", "void main() {}");
        assert_eq!(a, MicrocodeKey::for_source("glsl150", "void main() {}"));
        assert_ne!(a, MicrocodeKey::for_source("arbfp1", "void main() {}"));
        assert_ne!(a, MicrocodeKey::for_source("glsl150", "void main() { }"));
    }

    #[test]
    fn test_compilation_key_covers_entry_point_and_args() {
        let source = "float4 a() {} float4 b() {}";
        let args = vec!["-O3".to_owned()];
        let a = MicrocodeKey::for_compilation("glslv", source, "a", &args);
        assert_eq!(a, MicrocodeKey::for_compilation("glslv", source, "a", &args));
        assert_ne!(a, MicrocodeKey::for_compilation("glslv", source, "b", &args));
        assert_ne!(a, MicrocodeKey::for_compilation("glslv", source, "a", &[]));
        assert_ne!(
            MicrocodeKey::for_compilation("glslv", source, "a", &["-O3 x".to_owned()]),
            MicrocodeKey::for_compilation("glslv", source, "a", &["-O3".to_owned(), "x".to_owned()])
        );
    }

    #[test]
    fn test_add_get_remove() {
        let mut cache = MicrocodeCache::new();
        let key = MicrocodeKey(7);
        assert!(cache.get(key).unwrap().is_none());

        cache.add(key, &entry("a")).unwrap();
        assert!(cache.contains(key));
        assert_eq!(cache.get(key).unwrap(), Some(entry("a")));

        cache.add(key, &entry("b")).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_or_decode(key), Some(entry("b")));

        assert!(cache.remove(key));
        assert!(!cache.remove(key));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_blob_is_a_miss() {
        let mut cache = MicrocodeCache::new();
        cache.add_raw(MicrocodeKey(1), vec![0xFF; 3]);
        assert!(cache.get(MicrocodeKey(1)).is_err());
        assert_eq!(cache.get_or_decode(MicrocodeKey(1)), None);
    }

    #[test]
    fn test_save_and_load() {
        let mut cache = MicrocodeCache::new();
        cache.add(MicrocodeKey(2), &entry("two")).unwrap();
        cache.add(MicrocodeKey(1), &entry("one")).unwrap();

        let mut bytes = Vec::new();
        cache.save_to(&mut bytes).unwrap();
        assert_eq!(&bytes[..8], &2u64.to_le_bytes());
        assert_eq!(&bytes[8..16], &1u64.to_le_bytes());

        let loaded = MicrocodeCache::load_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(MicrocodeKey(2)).unwrap(), Some(entry("two")));
    }

    #[test]
    fn test_huge_length_prefix_in_file_is_an_error() {
        // One entry whose blob claims u64::MAX bytes.
        let bytes = [1u64, 5, u64::MAX].map(u64::to_le_bytes).concat();
        assert!(MicrocodeCache::load_from(&mut bytes.as_slice()).is_err());

        // An entry count far beyond the file.
        let bytes = [u64::MAX, 5].map(u64::to_le_bytes).concat();
        assert!(MicrocodeCache::load_from(&mut bytes.as_slice()).is_err());
    }

    #[test]
    fn test_loaded_blob_with_huge_prefix_is_a_miss() {
        let mut blob = u64::MAX.to_le_bytes().to_vec();
        blob.extend_from_slice(b"abc");
        let mut cache = MicrocodeCache::new();
        cache.add_raw(MicrocodeKey(9), blob);

        let mut bytes = Vec::new();
        cache.save_to(&mut bytes).unwrap();
        let loaded = MicrocodeCache::load_from(&mut bytes.as_slice()).unwrap();
        assert!(loaded.get(MicrocodeKey(9)).is_err());
        assert_eq!(loaded.get_or_decode(MicrocodeKey(9)), None);
    }
}
