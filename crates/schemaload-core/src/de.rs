use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Unexpected, Visitor};

/// Deserialize a string-keyed map, rejecting empty and repeated keys.
pub(crate) fn unique_keys<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V> Visitor<'de> for UniqueKeys<V>
    where
        V: Deserialize<'de>,
    {
        type Value = IndexMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique, non-empty keys")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(key) = access.next_key::<String>()? {
                if key.is_empty() {
                    return Err(de::Error::custom("empty name is not allowed"));
                }
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate key `{key}`")));
                }
                let value = access.next_value()?;
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

/// Deserialize a column list; names must be unique and non-empty.
pub(crate) fn unique_columns<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let columns = Vec::<String>::deserialize(deserializer)?;
    let mut seen = HashSet::with_capacity(columns.len());
    for column in &columns {
        if column.is_empty() {
            return Err(de::Error::custom("empty column name is not allowed"));
        }
        if !seen.insert(column.as_str()) {
            return Err(de::Error::custom(format!("duplicate column `{column}`")));
        }
    }
    Ok(columns)
}

pub(crate) fn port_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let port = u16::deserialize(deserializer)?;
    if port == 0 {
        return Err(de::Error::invalid_value(
            Unexpected::Unsigned(0),
            &"a port between 1 and 65535",
        ));
    }
    Ok(port)
}
