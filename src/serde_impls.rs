use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt::{self, Formatter};
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;

use crate::{HashMap, HashMultiMap, HashMultiSet, HashSet};

struct MapVisitor<K, V, S> {
    _marker: PhantomData<(K, V, S)>,
}

impl<K, V, S> Serialize for HashMap<K, V, S>
where
    K: Serialize + Hash + Eq,
    V: Serialize,
    S: BuildHasher,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_map(self)
    }
}

impl<'de, K, V, S> Deserialize<'de> for HashMap<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: Default + BuildHasher,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MapVisitor::new())
    }
}

impl<K, V, S> MapVisitor<K, V, S> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<'de, K, V, S> Visitor<'de> for MapVisitor<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: Default + BuildHasher,
{
    type Value = HashMap<K, V, S>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut values = match access.size_hint() {
            Some(size) => HashMap::with_capacity_and_hasher(size, S::default()),
            None => HashMap::default(),
        };

        while let Some((key, value)) = access.next_entry()? {
            values.insert(key, value);
        }

        Ok(values)
    }
}

struct MultiMapVisitor<K, V, S> {
    _marker: PhantomData<(K, V, S)>,
}

// Duplicate keys are written out as repeated map entries. Formats that
// stream entries to the visitor, like serde_json, hand every copy back
// on the way in.
impl<K, V, S> Serialize for HashMultiMap<K, V, S>
where
    K: Serialize + Hash + Eq,
    V: Serialize,
    S: BuildHasher,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_map(self)
    }
}

impl<'de, K, V, S> Deserialize<'de> for HashMultiMap<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: Default + BuildHasher,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(MultiMapVisitor::new())
    }
}

impl<K, V, S> MultiMapVisitor<K, V, S> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<'de, K, V, S> Visitor<'de> for MultiMapVisitor<K, V, S>
where
    K: Deserialize<'de> + Hash + Eq,
    V: Deserialize<'de>,
    S: Default + BuildHasher,
{
    type Value = HashMultiMap<K, V, S>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut values = match access.size_hint() {
            Some(size) => HashMultiMap::with_capacity_and_hasher(size, S::default()),
            None => HashMultiMap::default(),
        };

        while let Some((key, value)) = access.next_entry()? {
            values.insert(key, value);
        }

        Ok(values)
    }
}

struct SetVisitor<K, S> {
    _marker: PhantomData<(K, S)>,
}

impl<K, S> Serialize for HashSet<K, S>
where
    K: Serialize + Hash + Eq,
    S: BuildHasher,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_seq(self)
    }
}

impl<'de, K, S> Deserialize<'de> for HashSet<K, S>
where
    K: Deserialize<'de> + Hash + Eq,
    S: Default + BuildHasher,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(SetVisitor::new())
    }
}

impl<K, S> SetVisitor<K, S> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<'de, K, S> Visitor<'de> for SetVisitor<K, S>
where
    K: Deserialize<'de> + Hash + Eq,
    S: Default + BuildHasher,
{
    type Value = HashSet<K, S>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a set")
    }

    fn visit_seq<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: SeqAccess<'de>,
    {
        let mut values = match access.size_hint() {
            Some(size) => HashSet::with_capacity_and_hasher(size, S::default()),
            None => HashSet::default(),
        };

        while let Some(key) = access.next_element()? {
            values.insert(key);
        }

        Ok(values)
    }
}

struct MultiSetVisitor<K, S> {
    _marker: PhantomData<(K, S)>,
}

impl<K, S> Serialize for HashMultiSet<K, S>
where
    K: Serialize + Hash + Eq,
    S: BuildHasher,
{
    fn serialize<Sr>(&self, serializer: Sr) -> Result<Sr::Ok, Sr::Error>
    where
        Sr: Serializer,
    {
        serializer.collect_seq(self)
    }
}

impl<'de, K, S> Deserialize<'de> for HashMultiSet<K, S>
where
    K: Deserialize<'de> + Hash + Eq,
    S: Default + BuildHasher,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(MultiSetVisitor::new())
    }
}

impl<K, S> MultiSetVisitor<K, S> {
    pub(crate) fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<'de, K, S> Visitor<'de> for MultiSetVisitor<K, S>
where
    K: Deserialize<'de> + Hash + Eq,
    S: Default + BuildHasher,
{
    type Value = HashMultiSet<K, S>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a set")
    }

    fn visit_seq<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: SeqAccess<'de>,
    {
        let mut values = match access.size_hint() {
            Some(size) => HashMultiSet::with_capacity_and_hasher(size, S::default()),
            None => HashMultiSet::default(),
        };

        while let Some(key) = access.next_element()? {
            values.insert(key);
        }

        Ok(values)
    }
}

#[cfg(test)]
mod test {
    use crate::{HashMap, HashMultiMap, HashMultiSet, HashSet};

    #[test]
    fn test_map() {
        let mut map: HashMap<u8, u8> = HashMap::new();

        map.insert(0, 4);
        map.insert(1, 3);
        map.insert(2, 2);
        map.insert(3, 1);
        map.insert(4, 0);

        let serialized = serde_json::to_string(&map).unwrap();
        let deserialized = serde_json::from_str(&serialized).unwrap();

        assert_eq!(map, deserialized);
    }

    #[test]
    fn test_multi_map() {
        let mut map: HashMultiMap<String, u8> = HashMultiMap::new();

        map.insert("a".to_owned(), 1);
        map.insert("a".to_owned(), 2);
        map.insert("b".to_owned(), 3);

        let serialized = serde_json::to_string(&map).unwrap();
        let deserialized: HashMultiMap<String, u8> = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.count("a"), 2);
        assert_eq!(map, deserialized);
    }

    #[test]
    fn test_set() {
        let mut set: HashSet<u8> = HashSet::new();

        set.insert(0);
        set.insert(1);
        set.insert(2);
        set.insert(3);
        set.insert(4);

        let serialized = serde_json::to_string(&set).unwrap();
        let deserialized = serde_json::from_str(&serialized).unwrap();

        assert_eq!(set, deserialized);
    }

    #[test]
    fn test_multi_set() {
        let mut set: HashMultiSet<u8> = HashMultiSet::new();

        set.insert(7);
        set.insert(7);
        set.insert(9);

        let serialized = serde_json::to_string(&set).unwrap();
        let deserialized: HashMultiSet<u8> = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized.count(&7), 2);
        assert_eq!(set, deserialized);
    }
}
