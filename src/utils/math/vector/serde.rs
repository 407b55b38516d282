use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::TermVector;

impl Serialize for TermVector {
    /// (term, weight) の列として term 昇順に出力する
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.nnz()))?;
        for entry in self.iter() {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for TermVector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<(String, f64)> = Vec::deserialize(deserializer)?;
        let mut entries: IndexMap<Box<str>, f64> = IndexMap::with_capacity(raw.len());
        for (term, weight) in raw {
            if entries.insert(term.into_boxed_str(), weight).is_some() {
                return Err(D::Error::custom("duplicate term in term vector"));
            }
        }
        // 並び順と値はそのまま信用せず検証する
        let vector = TermVector { entries };
        vector.check().map_err(D::Error::custom)?;
        Ok(vector)
    }
}
